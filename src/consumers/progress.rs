use std::sync::Arc;

use eventree_error::DispatchError;
use serde_json::{json, Value};

use super::ConfigStore;
use crate::{
    dispatch::{Args, Dispatcher, HandlerRef},
    events::{self, config_parameter_changed},
};

pub const PROGRESS_MAX: &str = "main_progress_max";
pub const PROGRESS_POSITION: &str = "main_progress_position";
pub const PROGRESS_VISIBLE: &str = "main_progress_visible";

const DEFAULT_MAX: u64 = 100;

/// Изменение состояния индикатора прогресса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Max(u64),
    Position(u64),
    Visible(bool),
}

impl ProgressEvent {
    /// Разбирает аргументы `config:<key>:changed`.
    pub fn from_change(args: &Args) -> Option<Self> {
        let key = args.kw("key")?.as_str()?;
        let value = args.kw("value")?;
        match key {
            PROGRESS_MAX => value.as_u64().map(Self::Max),
            PROGRESS_POSITION => value.as_u64().map(Self::Position),
            PROGRESS_VISIBLE => value.as_bool().map(Self::Visible),
            _ => None,
        }
    }
}

/// Индикатор прогресса поверх [`ConfigStore`].
///
/// Ничего не рисует: только пишет `main_progress_*` в хранилище, а
/// отображение подписывается на изменения через [`Progress::watch`].
pub struct Progress {
    store: Arc<ConfigStore>,
}

impl Progress {
    /// Записывает значения по умолчанию через `config:do:update`, если их ещё
    /// нет в хранилище.
    pub fn new(store: Arc<ConfigStore>) -> Result<Self, DispatchError> {
        let mut defaults = serde_json::Map::new();
        for (key, value) in [
            (PROGRESS_MAX, json!(DEFAULT_MAX)),
            (PROGRESS_POSITION, json!(0)),
            (PROGRESS_VISIBLE, json!(false)),
        ] {
            if !store.contains(key) {
                defaults.insert(key.to_string(), value);
            }
        }
        if !defaults.is_empty() {
            store.events().publish_args(
                events::DO_UPDATE_CONFIG,
                Args::new().kwarg("config", Value::Object(defaults)),
            )?;
        }
        Ok(Self { store })
    }

    pub fn max(&self) -> u64 {
        self.read_u64(PROGRESS_MAX).unwrap_or(DEFAULT_MAX)
    }

    pub fn position(&self) -> u64 {
        self.read_u64(PROGRESS_POSITION).unwrap_or(0)
    }

    pub fn is_visible(&self) -> bool {
        self.store
            .get(PROGRESS_VISIBLE)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn read_u64(
        &self,
        key: &str,
    ) -> Option<u64> {
        self.store.get(key).and_then(|v| v.as_u64())
    }

    /// Меняет максимум.
    pub fn set_max(
        &self,
        max: u64,
    ) -> Result<(), DispatchError> {
        self.store.set(PROGRESS_MAX, json!(max)).map(drop)
    }

    /// Начинает новый прогон: максимум (если задан), позиция 0, индикатор
    /// виден.
    pub fn new_run(
        &self,
        max: Option<u64>,
    ) -> Result<(), DispatchError> {
        if let Some(max) = max {
            self.set_max(max)?;
        }
        self.store.set(PROGRESS_POSITION, json!(0))?;
        self.store.set(PROGRESS_VISIBLE, json!(true))?;
        Ok(())
    }

    /// Сдвигает позицию на `n`.
    pub fn tick(
        &self,
        n: u64,
    ) -> Result<(), DispatchError> {
        let position = self.position().saturating_add(n);
        self.store.set(PROGRESS_POSITION, json!(position)).map(drop)
    }

    pub fn release(&self) -> Result<(), DispatchError> {
        self.store.set(PROGRESS_VISIBLE, json!(false)).map(drop)
    }

    /// Подписывает `callback` на изменения трёх ключей прогресса.
    ///
    /// Возвращённый обработчик можно передать в `unsubscribe_everywhere`.
    pub fn watch<F>(
        events: &Dispatcher,
        callback: F,
    ) -> Result<HandlerRef, DispatchError>
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        let handler = HandlerRef::named("progress.watch", move |args: &Args| {
            if let Some(event) = ProgressEvent::from_change(args) {
                callback(event);
            }
            Ok(Value::Null)
        });
        let topics: Vec<String> = [PROGRESS_MAX, PROGRESS_POSITION, PROGRESS_VISIBLE]
            .iter()
            .map(|key| config_parameter_changed(key))
            .collect();
        events.subscribe(topics, &handler)?;
        Ok(handler)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    fn setup() -> (Arc<Dispatcher>, Arc<ConfigStore>) {
        let events = Arc::new(Dispatcher::new());
        let store = ConfigStore::attach(events.clone()).unwrap();
        (events, store)
    }

    #[test]
    fn test_defaults_written_once() {
        let (_events, store) = setup();
        store.set(PROGRESS_MAX, json!(7)).unwrap();

        let progress = Progress::new(store.clone()).unwrap();
        assert_eq!(progress.max(), 7);
        assert_eq!(progress.position(), 0);
        assert!(!progress.is_visible());
        assert_eq!(store.get(PROGRESS_VISIBLE), Some(json!(false)));
    }

    #[test]
    fn test_run_tick_release() {
        let (events, store) = setup();
        let progress = Progress::new(store).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        Progress::watch(&events, move |event| sink.lock().push(event)).unwrap();

        progress.new_run(Some(10)).unwrap();
        progress.tick(3).unwrap();
        progress.tick(2).unwrap();
        progress.release().unwrap();

        assert_eq!(progress.position(), 5);
        assert_eq!(
            *seen.lock(),
            [
                ProgressEvent::Max(10),
                ProgressEvent::Visible(true),
                ProgressEvent::Position(3),
                ProgressEvent::Position(5),
                ProgressEvent::Visible(false),
            ]
        );
    }

    #[test]
    fn test_watch_can_be_removed() {
        let (events, store) = setup();
        let progress = Progress::new(store).unwrap();

        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();
        let handler = Progress::watch(&events, move |_| *sink.lock() += 1).unwrap();
        progress.tick(1).unwrap();
        events.unsubscribe_everywhere(&handler).unwrap();
        progress.tick(1).unwrap();

        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_event_from_unrelated_key() {
        let args = Args::new().kwarg("key", "theme").kwarg("value", 1);
        assert_eq!(ProgressEvent::from_change(&args), None);
    }
}
