pub mod dispatch;
pub mod topic;

// Публичный экспорт всех типов ошибок из вложенных модулей, чтобы упростить
// доступ к ним из внешнего кода.
pub use dispatch::*;
pub use topic::*;

use crate::{ErrorExt, StatusCode};

/// Универсальная ошибка с кодом и сообщением.
#[derive(Debug, Clone)]
pub struct GenericError {
    code: StatusCode,
    message: String,
}

impl GenericError {
    pub fn new(
        code: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for GenericError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GenericError {}

impl ErrorExt for GenericError {
    fn status_code(&self) -> StatusCode {
        self.code
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Конвертация из std::io::Error
impl From<std::io::Error> for crate::StackError {
    fn from(err: std::io::Error) -> Self {
        crate::StackError::new(GenericError::new(StatusCode::Io, err.to_string()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
