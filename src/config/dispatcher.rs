use serde::{Deserialize, Serialize};

use crate::dispatch::PublishOptions;

/// Параметры диспетчера, общие для всех вызовов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Включает подъём к предкам (`TO_TOP`). При `false` топики
    /// рассматриваются как плоский набор имён.
    pub hierarchy: bool,
    /// Добавлять ли сам шаблон с `*`/`~` к результату его разворачивания.
    pub literal_passthrough: bool,
    /// Опции для `emit` и для недостающих ключей в `publish_args`.
    pub defaults: PublishOptions,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            hierarchy: true,
            literal_passthrough: true,
            defaults: PublishOptions::default(),
        }
    }
}
