use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок библиотеки (object-safe).
///
/// Даёт статус-код ошибки и безопасное сообщение для пользователя.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки.
    ///
    /// По умолчанию возвращает [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any),
    /// чтобы можно было выполнить downcast к конкретному типу.
    fn as_any(&self) -> &dyn Any;

    /// Безопасное сообщение для пользователя.
    ///
    /// Для внутренних ошибок возвращает строку `"Internal error"`.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }
}
