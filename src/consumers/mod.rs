//! Встроенные потребители событий.

pub mod config_store;
pub mod progress;

pub use config_store::ConfigStore;
pub use progress::{Progress, ProgressEvent};
