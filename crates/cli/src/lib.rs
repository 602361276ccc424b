// Process setup (logging, panic hook)
pub mod process;

// App state (configuration, member key)
pub mod state;

pub use state::{AppConfig, AppState, StateError};
