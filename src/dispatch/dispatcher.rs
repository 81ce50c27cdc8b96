use std::collections::{BTreeMap, HashSet};

use eventree_error::{DispatchError, TopicError};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::{plan, Args, HandlerRef, IntoHandlers, PublishOptions, UniqueCall};
use crate::{
    config::DispatcherConfig,
    topic::{resolve, IntoPatterns, Pattern, Topic},
};

type Registry<A, R> = BTreeMap<Topic, Vec<HandlerRef<A, R>>>;

/// Иерархический диспетчер событий.
///
/// Хранит для каждого топика упорядоченный список обработчиков без
/// повторов. Топик появляется при первой подписке и исчезает только при
/// явной отписке всего топика: снятие последнего обработчика оставляет
/// пустой список, и топик продолжает участвовать в поиске потомков и
/// разворачивании шаблонов.
///
/// Набор топиков и обработчиков для `publish` фиксируется под блокировкой
/// до первого вызова; сами обработчики вызываются без блокировки, поэтому
/// могут подписываться, отписываться и публиковать. Такие изменения видны
/// только следующим вызовам.
///
/// ```
/// use eventree::{Args, Dispatcher, HandlerRef, PublishOptions};
/// use serde_json::json;
///
/// let events = Dispatcher::new();
/// for name in ["r", "r:a", "r:a:aa"] {
///     events
///         .subscribe(name, HandlerRef::new(move |_: &Args| Ok(json!(name))))
///         .unwrap();
/// }
/// let out = events
///     .publish("r:a:aa", &Args::new(), &PublishOptions::default())
///     .unwrap();
/// assert_eq!(out, [json!("r:a:aa"), json!("r:a"), json!("r")]);
/// ```
pub struct Dispatcher<A = Args, R = Value> {
    registry: RwLock<Registry<A, R>>,
    config: DispatcherConfig,
}

impl<A: 'static, R: 'static> Default for Dispatcher<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static, R: 'static> Dispatcher<A, R> {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            registry: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Разворачивает шаблоны по текущему набору топиков.
    fn expand(
        &self,
        registry: &Registry<A, R>,
        patterns: &[Pattern],
    ) -> Result<Vec<Topic>, TopicError> {
        let mut topics = Vec::new();
        for pattern in patterns {
            topics.extend(resolve(
                pattern,
                registry.keys(),
                self.config.literal_passthrough,
            )?);
        }
        Ok(topics)
    }

    /// Привязывает обработчики ко всем топикам, в которые разворачиваются
    /// шаблоны.
    ///
    /// Шаблон с `*`/`~` видит только уже существующие топики: подписка
    /// `"r:~"` не сработает для `"r:c"`, созданного позже.
    pub fn subscribe<P, H>(
        &self,
        patterns: P,
        handlers: H,
    ) -> Result<(), DispatchError>
    where
        P: IntoPatterns,
        H: IntoHandlers<A, R>,
    {
        let patterns = patterns.into_patterns()?;
        let handlers = handlers.into_handlers();

        let mut registry = self.registry.write();
        let topics = self.expand(&registry, &patterns)?;
        for topic in &topics {
            let list = registry.entry(topic.clone()).or_default();
            for handler in &handlers {
                if !list.contains(handler) {
                    list.push(handler.clone());
                }
            }
        }

        debug!(
            patterns = patterns.len(),
            topics = topics.len(),
            handlers = handlers.len(),
            "subscribed"
        );
        Ok(())
    }

    /// Общая форма отписки.
    ///
    /// | `patterns` | `handlers` | эффект                                        |
    /// |------------|------------|-----------------------------------------------|
    /// | `None`     | `None`     | удаляет все топики                            |
    /// | `Some`     | `None`     | удаляет найденные топики целиком              |
    /// | `Some`     | `Some`     | снимает обработчики с найденных топиков       |
    /// | `None`     | `Some`     | снимает обработчики со всех топиков           |
    pub fn unsubscribe<P, H>(
        &self,
        patterns: Option<P>,
        handlers: Option<H>,
    ) -> Result<(), DispatchError>
    where
        P: IntoPatterns,
        H: IntoHandlers<A, R>,
    {
        let patterns = patterns.map(IntoPatterns::into_patterns).transpose()?;
        let handlers = handlers.map(IntoHandlers::into_handlers);

        let mut registry = self.registry.write();
        match (patterns, handlers) {
            (None, None) => {
                debug!(topics = registry.len(), "unsubscribed everything");
                registry.clear();
            }
            (Some(patterns), None) => {
                let topics = self.expand(&registry, &patterns)?;
                let removed = topics
                    .iter()
                    .filter(|topic| registry.remove(*topic).is_some())
                    .count();
                debug!(removed, "unsubscribed topics");
            }
            (patterns, Some(handlers)) => {
                let topics = match patterns {
                    Some(patterns) => self.expand(&registry, &patterns)?,
                    None => registry.keys().cloned().collect(),
                };
                let mut detached = 0usize;
                for topic in &topics {
                    if let Some(list) = registry.get_mut(topic) {
                        let before = list.len();
                        list.retain(|h| !handlers.contains(h));
                        detached += before - list.len();
                    }
                }
                debug!(topics = topics.len(), detached, "unsubscribed handlers");
            }
        }
        Ok(())
    }

    /// Удаляет все топики и обработчики.
    pub fn reset(&self) {
        let mut registry = self.registry.write();
        debug!(topics = registry.len(), "unsubscribed everything");
        registry.clear();
    }

    /// Удаляет топики, в которые разворачиваются шаблоны.
    pub fn unsubscribe_topics<P: IntoPatterns>(
        &self,
        patterns: P,
    ) -> Result<(), DispatchError> {
        self.unsubscribe(Some(patterns), None::<Vec<HandlerRef<A, R>>>)
    }

    /// Снимает обработчики с топиков, в которые разворачиваются шаблоны.
    pub fn unsubscribe_handlers<P, H>(
        &self,
        patterns: P,
        handlers: H,
    ) -> Result<(), DispatchError>
    where
        P: IntoPatterns,
        H: IntoHandlers<A, R>,
    {
        self.unsubscribe(Some(patterns), Some(handlers))
    }

    /// Снимает обработчики со всех топиков.
    pub fn unsubscribe_everywhere<H: IntoHandlers<A, R>>(
        &self,
        handlers: H,
    ) -> Result<(), DispatchError> {
        self.unsubscribe(None::<&str>, Some(handlers))
    }

    /// Строит полный порядок вызова под блокировкой чтения.
    fn snapshot(
        &self,
        patterns: &[Pattern],
        options: &PublishOptions,
    ) -> Result<Vec<(Topic, Vec<HandlerRef<A, R>>)>, TopicError> {
        let registry = self.registry.read();
        let mut calls = Vec::new();
        for name in self.expand(&registry, patterns)? {
            let planned = plan(
                &name,
                options.propagate,
                options.call_order,
                registry.keys(),
                self.config.hierarchy,
            );
            for topic in planned {
                let handlers = registry.get(&topic).cloned().unwrap_or_default();
                calls.push((topic, handlers));
            }
        }
        Ok(calls)
    }

    /// Публикует событие и возвращает результаты обработчиков в порядке
    /// вызова.
    ///
    /// Первая ошибка обработчика прерывает вызов: следующие обработчики не
    /// вызываются, а ошибка возвращается как [`DispatchError::Handler`].
    pub fn publish<P: IntoPatterns>(
        &self,
        patterns: P,
        args: &A,
        options: &PublishOptions,
    ) -> Result<Vec<R>, DispatchError> {
        let patterns = patterns.into_patterns()?;
        let calls = self.snapshot(&patterns, options)?;

        debug!(
            patterns = patterns.len(),
            topics = calls.len(),
            unique_call = options.unique_call.as_str(),
            call_order = options.call_order.as_str(),
            propagate = %options.propagate,
            "publishing"
        );

        let mut invoked = HashSet::new();
        let mut results = Vec::new();
        for (topic, handlers) in &calls {
            for handler in handlers {
                let first = invoked.insert(handler.id());
                if !first && options.unique_call == UniqueCall::Once {
                    continue;
                }
                trace!(topic = %topic, handler = %handler.label(), "calling handler");
                match handler.call(args) {
                    Ok(value) => results.push(value),
                    Err(source) => {
                        warn!(
                            topic = %topic,
                            handler = %handler.label(),
                            error = %source,
                            "handler failed, publish aborted"
                        );
                        return Err(DispatchError::Handler {
                            topic: topic.to_string(),
                            handler: handler.label(),
                            source,
                        });
                    }
                }
            }
        }
        Ok(results)
    }

    /// `publish` с опциями из конфигурации диспетчера.
    pub fn emit<P: IntoPatterns>(
        &self,
        patterns: P,
        args: &A,
    ) -> Result<Vec<R>, DispatchError> {
        let options = self.config.defaults;
        self.publish(patterns, args, &options)
    }

    /// Зарегистрированные топики по возрастанию.
    pub fn topics(&self) -> Vec<Topic> {
        self.registry.read().keys().cloned().collect()
    }

    /// Зарегистрирован ли топик (даже с пустым списком обработчиков).
    pub fn contains(
        &self,
        topic: &str,
    ) -> bool {
        self.registry.read().contains_key(topic)
    }

    /// Количество обработчиков топика; `None`, если топик не зарегистрирован.
    pub fn handler_count(
        &self,
        topic: &str,
    ) -> Option<usize> {
        self.registry.read().get(topic).map(Vec::len)
    }

    /// Обработчики топика в порядке подписки.
    pub fn handlers(
        &self,
        topic: &str,
    ) -> Vec<HandlerRef<A, R>> {
        self.registry
            .read()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }
}

impl<R: 'static> Dispatcher<Args, R> {
    /// Публикация, в которой опции приходят среди именованных аргументов
    /// под префиксом [`PublishOptions::KEY_PREFIX`].
    ///
    /// Отсутствующие опции берутся из конфигурации; обработчики получают
    /// аргументы уже без служебных ключей.
    pub fn publish_args<P: IntoPatterns>(
        &self,
        patterns: P,
        mut args: Args,
    ) -> Result<Vec<R>, DispatchError> {
        let options = args.take_options(self.config.defaults)?;
        self.publish(patterns, &args, &options)
    }
}
