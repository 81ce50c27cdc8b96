use std::{fmt, panic::Location, sync::Arc};

use crate::{ErrorExt, LogLevel, StatusCode};

/// Основная структура ошибки с поддержкой контекста и трассировки.
///
/// Позволяет добавлять контекстную информацию по мере распространения ошибки
/// вверх по стеку вызовов.
#[derive(Clone)]
pub struct StackError {
    inner: Arc<dyn ErrorExt>,
    contexts: Arc<Vec<ErrorContext>>,
}

/// Контекст ошибки с location tracking.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub message: String,
    pub location: Option<&'static Location<'static>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StackError {
    /// Создаёт новую ошибку.
    #[track_caller]
    pub fn new<E: ErrorExt>(err: E) -> Self {
        Self {
            inner: Arc::new(err),
            contexts: Arc::new(Vec::new()),
        }
    }

    /// Добавляет контекст к ошибке.
    #[track_caller]
    pub fn context(
        mut self,
        msg: impl Into<String>,
    ) -> Self {
        let mut new_contexts = (*self.contexts).clone();
        new_contexts.push(ErrorContext {
            message: msg.into(),
            location: Some(Location::caller()),
        });
        self.contexts = Arc::new(new_contexts);
        self
    }

    /// Возвращает код статуса
    pub fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    /// Возвращает сообщение для пользователя.
    pub fn client_message(&self) -> String {
        self.inner.client_message()
    }

    /// Возвращает корневую ошибку.
    pub fn root(&self) -> &dyn ErrorExt {
        self.inner.as_ref()
    }

    /// Возвращает все контексты
    pub fn contexts(&self) -> &[ErrorContext] {
        &self.contexts
    }

    /// Попытка downcast к конкретному типу ошибки
    pub fn downcast_ref<T: ErrorExt + 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Возвращает уровень логирования.
    pub fn log_level(&self) -> LogLevel {
        self.status_code().log_level()
    }

    fn format_contexts(&self) -> Vec<String> {
        self.contexts
            .iter()
            .map(|ctx| {
                if let Some(loc) = ctx.location {
                    format!("{} ({}:{})", ctx.message, loc.file(), loc.line())
                } else {
                    ctx.message.clone()
                }
            })
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StackError
////////////////////////////////////////////////////////////////////////////////

impl fmt::Debug for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut debug = f.debug_struct("StackError");
        debug.field("inner", &self.inner.to_string());
        debug.field("status_code", &self.status_code());

        if !self.contexts.is_empty() {
            debug.field("contexts", &self.format_contexts());
        }

        debug.finish()
    }
}

impl fmt::Display for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if !self.contexts.is_empty() {
            let contexts: Vec<&str> = self.contexts.iter().map(|c| c.message.as_str()).collect();
            write!(f, "{}: {}", contexts.join(" → "), self.inner)
        } else {
            write!(f, "{}", self.inner)
        }
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl<E: ErrorExt> From<E> for StackError {
    #[track_caller]
    fn from(e: E) -> Self {
        StackError::new(e)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
