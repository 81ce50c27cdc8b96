use eventree_error::OptionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PublishOptions;

/// Аргументы вызова обработчиков: позиционные и именованные значения.
///
/// Опции диспетчера можно передать среди именованных аргументов только под
/// префиксом [`PublishOptions::KEY_PREFIX`]; такие ключи снимаются до вызова
/// обработчиков.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keywords: Map<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет позиционный аргумент.
    pub fn arg(
        mut self,
        value: impl Into<Value>,
    ) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Добавляет именованный аргумент.
    pub fn kwarg(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.keywords.insert(key.into(), value.into());
        self
    }

    /// Кладёт опции вызова в именованные аргументы.
    pub fn with_options(
        mut self,
        options: PublishOptions,
    ) -> Self {
        self.keywords.extend(options.into_keywords());
        self
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn kw(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.keywords.get(key)
    }

    /// Именованный аргумент, а если его нет, то позиционный с номером `index`.
    pub fn kw_or_arg(
        &self,
        key: &str,
        index: usize,
    ) -> Option<&Value> {
        self.kw(key).or_else(|| self.get(index))
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Снимает опции диспетчера с именованных аргументов.
    pub fn take_options(
        &mut self,
        defaults: PublishOptions,
    ) -> Result<PublishOptions, OptionError> {
        PublishOptions::extract(&mut self.keywords, defaults)
    }
}
