use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode, TopicError};

/// Ошибки разбора опций вызова, переданных через именованные аргументы.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// Ключ с зарезервированным префиксом, но неизвестным именем опции
    #[error("unknown dispatcher option '{key}'")]
    Unknown { key: String },
    /// Значение опции не распознано
    #[error("invalid value '{value}' for dispatcher option '{key}'")]
    InvalidValue { key: String, value: String },
}

/// Ошибки операций диспетчера.
///
/// Неизвестные топики и отсутствующие обработчики ошибками не являются.
/// `publish` прерывает только ошибка самого обработчика.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidTopic(#[from] TopicError),

    #[error(transparent)]
    InvalidOption(#[from] OptionError),

    /// Обработчик вернул ошибку; оставшиеся вызовы не выполнялись
    #[error("handler {handler} failed on topic '{topic}': {source}")]
    Handler {
        topic: String,
        handler: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Топик, через который был достигнут упавший обработчик.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Handler { topic, .. } => Some(topic),
            _ => None,
        }
    }
}

impl ErrorExt for OptionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unknown { .. } => StatusCode::UnknownOption,
            Self::InvalidValue { .. } => StatusCode::InvalidOptionValue,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ErrorExt for DispatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTopic(e) => e.status_code(),
            Self::InvalidOption(e) => e.status_code(),
            Self::Handler { .. } => StatusCode::HandlerFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::Handler { topic, handler, .. } => {
                format!("handler {handler} failed on topic '{topic}'")
            }
            other => other.to_string(),
        }
    }
}
