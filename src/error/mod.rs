use std::any::Any;

pub use eventree_error::{
    bail, DispatchError, ErrorExt, EventreeResult, GenericError, LogLevel,
    OptionError, ResultExt, StackError, StatusCode, TopicError,
};
use thiserror::Error;

/// Ошибки загрузки и проверки настроек.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid log level '{0}'")]
    LogLevel(String),

    #[error("invalid log format '{0}'")]
    LogFormat(String),

    #[error("invalid log filter directive '{directive}': {reason}")]
    Directive { directive: String, reason: String },
}

impl ErrorExt for SettingsError {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidConfig
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
