use std::io::{self, Stderr};

use tracing_subscriber::{fmt, layer::Layer as LayerTrait, registry::LookupSpan};

use crate::logging::config::{LogFormat, LoggingConfig};

/// Слой форматирования по настройкам.
///
/// Возвращаем boxed trait-объект, чтобы стереть конкретный тип формата
/// (json/pretty/compact). Логи пишутся в stderr: stdout остаётся за
/// результатами команд CLI.
pub fn build_formatter_from_config<S>(config: &LoggingConfig) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stderr = io::stderr;

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .event_format(fmt::format().json().with_current_span(true))
                .with_writer(writer)
                .with_ansi(false)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_line_number(config.with_line_numbers);
            Box::new(layer)
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .event_format(fmt::format().pretty())
                .with_writer(writer)
                .with_ansi(config.ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_line_number(config.with_line_numbers);
            Box::new(layer)
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .event_format(fmt::format().compact())
                .with_writer(writer)
                .with_ansi(config.ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_line_number(config.with_line_numbers);
            Box::new(layer)
        }
    }
}
