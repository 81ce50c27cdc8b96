use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки топиков и шаблонов
/// - 3xxx: Ошибки конфигурации
/// - 6xxx: Ошибки диспетчеризации (вызов обработчиков)
///
/// `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`,
/// опционально `strum` добавляет `AsRefStr`/`EnumIter` (feature = "strum").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Internal = 1003,
    InvalidArgs = 1004,

    // === 2xxx: Топики ===
    EmptyTopic = 2000,
    WildcardTopic = 2001,
    UnknownOption = 2002,
    InvalidOptionValue = 2003,
    InvalidPattern = 2004,

    // === 3xxx: Конфигурация ===
    InvalidConfig = 3000,
    Io = 3001,

    // === 6xxx: Диспетчеризация ===
    HandlerFailed = 6000,
}

/// Уровень, с которым ошибку с данным кодом стоит писать в лог.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::EmptyTopic | Self::WildcardTopic | Self::InvalidPattern => LogLevel::Debug,
            Self::InvalidArgs
            | Self::UnknownOption
            | Self::InvalidOptionValue
            | Self::InvalidConfig => LogLevel::Info,
            Self::HandlerFailed | Self::Io => LogLevel::Warn,
            Self::Internal | Self::Unknown => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
