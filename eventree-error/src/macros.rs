/// Немедленно возвращает ошибку (аналогично `anyhow::bail!`).
///
/// Макрос возвращает `Err(StackError)` из текущей функции. Поддерживает три
/// формы:
/// - `bail!(err)`: принимает уже готовый тип ошибки или
///   `StackError`-совместимый тип;
/// - `bail!(code, "msg")`: создаёт `GenericError` с кодом и сообщением;
/// - `bail!(code, "fmt {}", arg)`: форматирует сообщение.
///
/// Пример:
///
/// ```ignore
/// use eventree_error::{bail, StatusCode};
///
/// fn parse_handler(name: &str) -> Result<(), eventree_error::StackError> {
///     if name.is_empty() {
///         bail!(StatusCode::InvalidArgs, "handler name is missing");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $msg:expr) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, $msg)
        ))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, format!($fmt, $($arg)*))
        ))
    };
}

/// Трейт-расширение для `Result`, добавляющее удобные методы контекстирования.
///
/// Позволяет вызывать `.context(...)` и `.with_context(...)` на результатах,
/// превращая ошибку в [`StackError`](crate::StackError) и приклеивая к ней
/// контекст.
pub trait ResultExt<T> {
    /// Если `self` равен `Err`, оборачивает ошибку в `StackError` и добавляет
    /// указанный контекст.
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>;

    /// Ленивый вариант `context` (строка строится только в случае ошибки).
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<crate::StackError>,
{
    #[track_caller]
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.into().context(ctx))
    }

    #[track_caller]
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventreeResult, GenericError, StatusCode, TopicError};

    #[test]
    fn test_bail_simple() {
        fn example() -> EventreeResult<()> {
            bail!(TopicError::Empty);
        }

        let err = example().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::EmptyTopic);
    }

    #[test]
    fn test_bail_with_format() {
        fn example(cmd: &str) -> EventreeResult<()> {
            bail!(StatusCode::InvalidArgs, "unknown command: {}", cmd);
        }

        let err = example("fire").unwrap_err();
        assert!(err.to_string().contains("unknown command: fire"));
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
    }

    #[test]
    fn test_result_ext() {
        fn inner() -> Result<(), GenericError> {
            Err(GenericError::new(StatusCode::Internal, "inner error"))
        }

        fn outer() -> EventreeResult<()> {
            inner().context("outer context")?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.contexts().len(), 1);
        assert_eq!(err.contexts()[0].message, "outer context");
    }

    #[test]
    fn test_with_context_lazy() {
        fn example(success: bool) -> EventreeResult<()> {
            let result: Result<(), TopicError> = if success {
                Ok(())
            } else {
                Err(TopicError::Empty)
            };

            result.with_context(|| format!("line {}", 7))?;
            Ok(())
        }

        assert!(example(true).is_ok());
        let err = example(false).unwrap_err();
        assert_eq!(err.contexts()[0].message, "line 7");
    }
}
