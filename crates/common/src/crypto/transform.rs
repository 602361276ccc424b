//! Text-safe payload transforms applied before a payload is boxed
//!
//! Browser wallets implementing `eth_decrypt` hand the opened box to the page as a
//! UTF-8 string, so anything boxed for them has to be valid text. Arbitrary secret
//! bytes are run through Ascii85 first and decoded again after opening. The
//! alphabet and grouping must match Python's `base64.a85encode` defaults exactly,
//! otherwise grants issued by other tooling won't open here and vice versa.

use serde::{Deserialize, Serialize};

/// First character of the Ascii85 alphabet
const A85_OFFSET: u8 = b'!';
/// Last character of the Ascii85 alphabet
const A85_LAST: u8 = b'u';
/// Shorthand for a full group of four zero bytes
const A85_ZERO_GROUP: u8 = b'z';

/// Errors that can occur while reversing a payload transform
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(String),
}

/// A reversible byte-to-byte encoding applied to payloads before boxing
pub trait PayloadTransform: Send + Sync {
    /// Encode a payload before it is sealed
    fn encode(&self, data: &[u8]) -> Vec<u8>;

    /// Reverse [`PayloadTransform::encode`] after the box has been opened
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, TransformError>;
}

/// Ascii85 without Adobe framing, `z` folding enabled, no padding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ascii85;

/// Identity transform, for peers that never route payloads through a wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Raw;

/// Transform selected at runtime, e.g. from a config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    #[default]
    Ascii85,
    Raw,
}

impl std::str::FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii85" => Ok(TransformKind::Ascii85),
            "raw" => Ok(TransformKind::Raw),
            other => Err(format!("unknown transform: {} (expected ascii85 or raw)", other)),
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformKind::Ascii85 => write!(f, "ascii85"),
            TransformKind::Raw => write!(f, "raw"),
        }
    }
}

impl PayloadTransform for TransformKind {
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        match self {
            TransformKind::Ascii85 => Ascii85.encode(data),
            TransformKind::Raw => Raw.encode(data),
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        match self {
            TransformKind::Ascii85 => Ascii85.decode(data),
            TransformKind::Raw => Raw.decode(data),
        }
    }
}

impl PayloadTransform for Raw {
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(data.to_vec())
    }
}

impl PayloadTransform for Ascii85 {
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len().div_ceil(4) * 5);

        for chunk in data.chunks(4) {
            if chunk.len() == 4 && chunk.iter().all(|b| *b == 0) {
                out.push(A85_ZERO_GROUP);
                continue;
            }

            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            let mut acc = u32::from_be_bytes(word);

            let mut digits = [0u8; 5];
            for digit in digits.iter_mut().rev() {
                *digit = (acc % 85) as u8 + A85_OFFSET;
                acc /= 85;
            }

            // a trailing group of n bytes keeps n + 1 characters
            out.extend_from_slice(&digits[..chunk.len() + 1]);
        }

        out
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut out = Vec::with_capacity(data.len() / 5 * 4 + 4);
        let mut group = [0u8; 5];
        let mut filled = 0usize;

        for &c in data {
            match c {
                A85_OFFSET..=A85_LAST => {
                    group[filled] = c;
                    filled += 1;
                    if filled == 5 {
                        out.extend_from_slice(&decode_group(&group)?);
                        filled = 0;
                    }
                }
                A85_ZERO_GROUP => {
                    if filled != 0 {
                        return Err(TransformError::InvalidEncoding(
                            "'z' inside Ascii85 5-tuple".to_string(),
                        ));
                    }
                    out.extend_from_slice(&[0u8; 4]);
                }
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b => continue,
                other => {
                    return Err(TransformError::InvalidEncoding(format!(
                        "non-Ascii85 byte 0x{:02x}",
                        other
                    )));
                }
            }
        }

        // a partial group is padded with 'u' and yields n - 1 bytes, so a lone
        // trailing character contributes nothing but still has to fit in 32 bits
        match filled {
            0 => {}
            n => {
                for slot in group.iter_mut().skip(n) {
                    *slot = A85_LAST;
                }
                let word = decode_group(&group)?;
                out.extend_from_slice(&word[..n - 1]);
            }
        }

        Ok(out)
    }
}

fn decode_group(group: &[u8; 5]) -> Result<[u8; 4], TransformError> {
    let acc = group
        .iter()
        .fold(0u64, |acc, c| acc * 85 + u64::from(c - A85_OFFSET));
    let word = u32::try_from(acc)
        .map_err(|_| TransformError::InvalidEncoding("Ascii85 overflow".to_string()))?;
    Ok(word.to_be_bytes())
}
