use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки построения имени топика.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    /// Пустое имя (в том числе строка из одних пробелов)
    #[error("topic name cannot be empty")]
    Empty,
    /// Литеральный топик содержит маркер `*` или `~`
    #[error("literal topic '{topic}' contains a wildcard marker")]
    Wildcard { topic: String },
    /// Шаблон не удалось скомпилировать (например, превышен лимит размера)
    #[error("pattern '{pattern}' cannot be compiled: {reason}")]
    Pattern { pattern: String, reason: String },
}

impl ErrorExt for TopicError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Empty => StatusCode::EmptyTopic,
            Self::Wildcard { .. } => StatusCode::WildcardTopic,
            Self::Pattern { .. } => StatusCode::InvalidPattern,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_error_display() {
        assert_eq!(TopicError::Empty.to_string(), "topic name cannot be empty");
        assert_eq!(
            TopicError::Wildcard {
                topic: "a:~".into()
            }
            .to_string(),
            "literal topic 'a:~' contains a wildcard marker"
        );
    }

    #[test]
    fn test_topic_error_status() {
        assert_eq!(TopicError::Empty.status_code(), StatusCode::EmptyTopic);
        let err = TopicError::Pattern {
            pattern: "r:~".into(),
            reason: "too big".into(),
        };
        assert_eq!(err.status_code(), StatusCode::InvalidPattern);
        assert!(err.to_string().contains("r:~"));
    }
}
