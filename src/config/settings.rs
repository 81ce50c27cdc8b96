use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use super::DispatcherConfig;
use crate::{error::SettingsError, logging::LoggingConfig};

/// Настройки приложения.
///
/// Источники в порядке приоритета (последний побеждает): значения по
/// умолчанию, файл `eventree.toml` (или явно указанный), переменные
/// окружения `EVENTREE_<SECTION>__<KEY>`, например
/// `EVENTREE_DISPATCHER__LITERAL_PASSTHROUGH=false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dispatcher: DispatcherConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    pub const DEFAULT_FILE: &'static str = "eventree";

    /// Загружает настройки. Явно указанный файл обязателен, файл по
    /// умолчанию нет.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(Self::DEFAULT_FILE).required(false),
        };

        let cfg = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("dispatcher.hierarchy", true)?
            .set_default("dispatcher.literal_passthrough", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")?
            .add_source(file)
            // Переменные окружения с префиксом EVENTREE_
            .add_source(
                Environment::with_prefix("EVENTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.logging.validate()?;
        Ok(settings)
    }
}
