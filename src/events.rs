//! Имена событий, которыми обмениваются встроенные потребители.

/// Настройки изменились. Именованный аргумент `config`: снимок всех значений.
pub const CONFIG_CHANGED: &str = "config:changed";

/// Изменился один параметр; `*` заменяется ключом. Именованные аргументы
/// `key` и `value`.
pub const CONFIG_PARAMETER_CHANGED: &str = "config:*:changed";

/// Запрос на слияние настроек. Именованный аргумент `config`: объект.
pub const DO_UPDATE_CONFIG: &str = "config:do:update";

/// Запрос на установку одного параметра. Аргументы `key` и `value`
/// (именованные или позиционные).
pub const DO_SET_PARAMETER: &str = "config:do:set";

/// Топик изменения конкретного параметра.
///
/// ```
/// assert_eq!(
///     eventree::events::config_parameter_changed("theme"),
///     "config:theme:changed"
/// );
/// ```
pub fn config_parameter_changed(key: &str) -> String {
    CONFIG_PARAMETER_CHANGED.replacen('*', key, 1)
}
