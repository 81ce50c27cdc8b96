use std::sync::{Arc, Weak};

use anyhow::Context;
use eventree_error::{DispatchError, TopicError};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    dispatch::{Args, Dispatcher, HandlerRef},
    events::{self, config_parameter_changed},
    topic::Topic,
};

/// Хранилище настроек, связанное с диспетчером.
///
/// Слушает [`events::DO_UPDATE_CONFIG`] и [`events::DO_SET_PARAMETER`]. Каждое
/// изменение значения (или появление нового ключа) публикует
/// [`events::CONFIG_CHANGED`] со снимком всех значений, а затем
/// `config:<key>:changed` с ключом и новым значением. Запись того же значения
/// ничего не публикует.
///
/// Обработчики держат слабую ссылку на хранилище: после его удаления они
/// снимаются с диспетчера.
pub struct ConfigStore {
    values: RwLock<Map<String, Value>>,
    events: Arc<Dispatcher>,
    handlers: Vec<HandlerRef>,
}

impl ConfigStore {
    /// Создаёт пустое хранилище и подписывает его на команды.
    pub fn attach(events: Arc<Dispatcher>) -> Result<Arc<Self>, DispatchError> {
        Self::attach_with(events, Map::new())
    }

    /// Как [`ConfigStore::attach`], но с начальными значениями. Начальные
    /// значения не публикуются.
    pub fn attach_with(
        events: Arc<Dispatcher>,
        initial: Map<String, Value>,
    ) -> Result<Arc<Self>, DispatchError> {
        let store = Arc::new_cyclic(|weak: &Weak<Self>| {
            let on_update = {
                let weak = weak.clone();
                HandlerRef::named("config_store.update", move |args: &Args| {
                    let Some(store) = weak.upgrade() else {
                        return Ok(Value::Null);
                    };
                    let config = args
                        .kw_or_arg("config", 0)
                        .and_then(Value::as_object)
                        .context("`config` must be an object")?;
                    Ok(Value::Bool(store.update(config.clone())?))
                })
            };
            let on_set = {
                let weak = weak.clone();
                HandlerRef::named("config_store.set", move |args: &Args| {
                    let Some(store) = weak.upgrade() else {
                        return Ok(Value::Null);
                    };
                    let key = args
                        .kw_or_arg("key", 0)
                        .and_then(Value::as_str)
                        .context("`key` must be a string")?;
                    let value = args.kw_or_arg("value", 1).cloned().unwrap_or(Value::Null);
                    Ok(Value::Bool(store.set(key, value)?))
                })
            };

            Self {
                values: RwLock::new(initial),
                events: events.clone(),
                handlers: vec![on_update, on_set],
            }
        });

        store
            .events
            .subscribe(events::DO_UPDATE_CONFIG, &store.handlers[0])?;
        store
            .events
            .subscribe(events::DO_SET_PARAMETER, &store.handlers[1])?;
        debug!(keys = store.values.read().len(), "config store attached");
        Ok(store)
    }

    pub fn events(&self) -> &Arc<Dispatcher> {
        &self.events
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.values.read().contains_key(key)
    }

    /// Копия всех значений.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().clone()
    }

    /// Записывает значение и возвращает `true`, если оно изменилось.
    ///
    /// Ключ должен быть непустым и без `*`/`~`: он становится частью имени
    /// топика. Ошибка слушателя возвращается после того, как значение уже
    /// записано.
    pub fn set(
        &self,
        key: &str,
        value: Value,
    ) -> Result<bool, DispatchError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TopicError::Empty.into());
        }
        let topic = Topic::new(&config_parameter_changed(key))?;

        let snapshot = {
            let mut values = self.values.write();
            if values.get(key) == Some(&value) {
                return Ok(false);
            }
            values.insert(key.to_string(), value.clone());
            values.clone()
        };

        debug!(key, "config parameter changed");
        let changed = Args::new().kwarg("config", Value::Object(snapshot));
        self.events.emit(events::CONFIG_CHANGED, &changed)?;
        let parameter = Args::new().kwarg("key", key).kwarg("value", value);
        self.events.emit(&topic, &parameter)?;
        Ok(true)
    }

    /// Записывает все пары по очереди; `true`, если изменилась хотя бы одна.
    pub fn update(
        &self,
        config: Map<String, Value>,
    ) -> Result<bool, DispatchError> {
        let mut changed = false;
        for (key, value) in config {
            changed |= self.set(&key, value)?;
        }
        Ok(changed)
    }

    /// Снимает обработчики хранилища с диспетчера.
    pub fn detach(&self) {
        if let Err(e) = self.events.unsubscribe_everywhere(self.handlers.as_slice()) {
            tracing::warn!(error = %e, "failed to detach config store");
        }
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::dispatch::PublishOptions;

    fn recorder(
        events: &Dispatcher,
        pattern: &str,
    ) -> Arc<Mutex<Vec<Args>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        events
            .subscribe(
                pattern,
                HandlerRef::new(move |args: &Args| {
                    sink.lock().push(args.clone());
                    Ok(Value::Null)
                }),
            )
            .unwrap();
        seen
    }

    #[test]
    fn test_set_publishes_changes() {
        let events = Arc::new(Dispatcher::new());
        let store = ConfigStore::attach(events.clone()).unwrap();
        let all = recorder(&events, events::CONFIG_CHANGED);
        let theme = recorder(&events, "config:theme:changed");

        assert!(store.set("theme", json!("dark")).unwrap());
        assert!(!store.set("theme", json!("dark")).unwrap());
        assert!(store.set("theme", json!("light")).unwrap());

        assert_eq!(all.lock().len(), 2);
        assert_eq!(all.lock()[1].kw("config"), Some(&json!({ "theme": "light" })));
        let theme = theme.lock();
        assert_eq!(theme.len(), 2);
        assert_eq!(theme[0].kw("key"), Some(&json!("theme")));
        assert_eq!(theme[0].kw("value"), Some(&json!("dark")));
    }

    #[test]
    fn test_commands_through_dispatcher() {
        let events = Arc::new(Dispatcher::new());
        let store = ConfigStore::attach(events.clone()).unwrap();

        events
            .publish_args(
                events::DO_UPDATE_CONFIG,
                Args::new().kwarg("config", json!({ "a": 1, "b": [true] })),
            )
            .unwrap();
        events
            .publish_args(events::DO_SET_PARAMETER, Args::new().arg("c").arg("x"))
            .unwrap();

        assert_eq!(store.get("a"), Some(json!(1)));
        assert_eq!(store.get("b"), Some(json!([true])));
        assert_eq!(store.get("c"), Some(json!("x")));
        assert!(!store.contains("d"));
    }

    #[test]
    fn test_bad_command_arguments_fail_the_publish() {
        let events = Arc::new(Dispatcher::new());
        let _store = ConfigStore::attach(events.clone()).unwrap();

        let err = events
            .publish_args(events::DO_UPDATE_CONFIG, Args::new().kwarg("config", 5))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
    }

    #[test]
    fn test_wildcard_key_is_rejected() {
        let events = Arc::new(Dispatcher::new());
        let store = ConfigStore::attach(events).unwrap();
        assert!(matches!(
            store.set("main_*", json!(1)),
            Err(DispatchError::InvalidTopic(TopicError::Wildcard { .. }))
        ));
        assert!(store.set(" ", json!(1)).is_err());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_initial_values_are_silent() {
        let events = Arc::new(Dispatcher::new());
        let all = recorder(&events, events::CONFIG_CHANGED);
        let mut initial = Map::new();
        initial.insert("lang".into(), json!("en"));

        let store = ConfigStore::attach_with(events, initial).unwrap();
        assert_eq!(store.get("lang"), Some(json!("en")));
        assert!(all.lock().is_empty());
        assert!(!store.set("lang", json!("en")).unwrap());
    }

    #[test]
    fn test_drop_detaches_handlers() {
        let events = Arc::new(Dispatcher::new());
        let store = ConfigStore::attach(events.clone()).unwrap();
        assert_eq!(events.handler_count(events::DO_SET_PARAMETER), Some(1));

        drop(store);
        assert_eq!(events.handler_count(events::DO_SET_PARAMETER), Some(0));
        let out = events
            .publish(
                events::DO_SET_PARAMETER,
                &Args::new().arg("k").arg(1),
                &PublishOptions::default(),
            )
            .unwrap();
        assert!(out.is_empty());
    }
}
