pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
use eventree_error::{GenericError, StackError, StatusCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Инициализация логирования с конфигурацией.
///
/// Повторный вызов в одном процессе возвращает ошибку: глобальный subscriber
/// устанавливается один раз.
pub fn init_logging(mut config: LoggingConfig) -> Result<(), StackError> {
    config.apply_env_overrides();
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config);
    let formatter = formatter::build_formatter_from_config(&config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatter)
        .try_init()
        .map_err(|e| {
            StackError::new(GenericError::new(
                StatusCode::Internal,
                format!("logging already initialized: {e}"),
            ))
        })?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        log_format = %config.format,
        "Logging system initialized"
    );
    Ok(())
}
