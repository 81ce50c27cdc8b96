use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Формат вывода логов.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(SettingsError::LogFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: `trace`, `debug`, `info`, `warn`, `error`, `off`.
    pub level: String,
    pub format: LogFormat,
    /// Дополнительные директивы `EnvFilter`, например
    /// `eventree::dispatch=trace`.
    pub directives: Vec<String>,
    pub ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directives: Vec::new(),
            ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

impl LoggingConfig {
    pub const ENV_LEVEL: &'static str = "EVENTREE_LOG_LEVEL";
    pub const ENV_FORMAT: &'static str = "EVENTREE_LOG_FORMAT";

    /// Перекрывает уровень и формат значениями `EVENTREE_LOG_LEVEL` и
    /// `EVENTREE_LOG_FORMAT`. Некорректный формат игнорируется.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(Self::ENV_LEVEL) {
            self.level = level.trim().to_ascii_lowercase();
        }
        if let Ok(format) = env::var(Self::ENV_FORMAT) {
            if let Ok(format) = format.parse() {
                self.format = format;
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(SettingsError::LogLevel(self.level.clone()));
        }
        for directive in &self.directives {
            directive
                .parse::<tracing_subscriber::filter::Directive>()
                .map_err(|e| SettingsError::Directive {
                    directive: directive.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Строка для `EnvFilter`: базовый уровень и дополнительные директивы.
    pub fn build_filter_directive(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}
