use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde_json::Value;

use super::Args;

/// Обработчик события.
///
/// Реализован для любых замыканий `Fn(&A) -> anyhow::Result<R>`.
pub trait Handler<A, R>: Send + Sync {
    fn call(
        &self,
        args: &A,
    ) -> anyhow::Result<R>;
}

impl<A, R, F> Handler<A, R> for F
where
    F: Fn(&A) -> anyhow::Result<R> + Send + Sync,
{
    fn call(
        &self,
        args: &A,
    ) -> anyhow::Result<R> {
        self(args)
    }
}

/// Идентичность обработчика: адрес общей аллокации.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(usize);

/// Разделяемая ссылка на обработчик.
///
/// Клоны одного `HandlerRef` считаются одним и тем же обработчиком: повторная
/// подписка клона на тот же топик ничего не меняет, а отписка клоном
/// снимает оригинал. Два `HandlerRef`, созданные из одинаковых замыканий,
/// различны.
pub struct HandlerRef<A = Args, R = Value> {
    inner: Arc<dyn Handler<A, R>>,
    name: Option<Arc<str>>,
}

impl<A: 'static, R: 'static> HandlerRef<A, R> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&A) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self::from_handler(f)
    }

    /// Обработчик с именем для логов и сообщений об ошибках.
    pub fn named<F>(
        name: impl Into<Arc<str>>,
        f: F,
    ) -> Self
    where
        F: Fn(&A) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self::from_handler(f).with_name(name)
    }

    /// Оборачивает собственную реализацию [`Handler`].
    pub fn from_handler<H>(handler: H) -> Self
    where
        H: Handler<A, R> + 'static,
    {
        Self {
            inner: Arc::new(handler),
            name: None,
        }
    }

    /// Имя не участвует в сравнении: клон с другим именем остаётся тем же
    /// обработчиком.
    pub fn with_name(
        mut self,
        name: impl Into<Arc<str>>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<A, R> HandlerRef<A, R> {
    pub fn id(&self) -> HandlerId {
        HandlerId(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Имя обработчика или его идентификатор.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("`{name}`"),
            None => format!("#{:x}", self.id().0),
        }
    }

    pub fn call(
        &self,
        args: &A,
    ) -> anyhow::Result<R> {
        self.inner.call(args)
    }
}

impl<A, R> Clone for HandlerRef<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            name: self.name.clone(),
        }
    }
}

impl<A, R> PartialEq for HandlerRef<A, R> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id() == other.id()
    }
}

impl<A, R> Eq for HandlerRef<A, R> {}

impl<A, R> Hash for HandlerRef<A, R> {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.id().hash(state);
    }
}

impl<A, R> fmt::Debug for HandlerRef<A, R> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("HandlerRef")
            .field("id", &self.id())
            .field("name", &self.name)
            .finish()
    }
}

/// Всё, что можно передать как один или несколько обработчиков.
pub trait IntoHandlers<A, R> {
    fn into_handlers(self) -> Vec<HandlerRef<A, R>>;
}

impl<A, R> IntoHandlers<A, R> for HandlerRef<A, R> {
    fn into_handlers(self) -> Vec<HandlerRef<A, R>> {
        vec![self]
    }
}

impl<A, R> IntoHandlers<A, R> for &HandlerRef<A, R> {
    fn into_handlers(self) -> Vec<HandlerRef<A, R>> {
        vec![self.clone()]
    }
}

impl<A, R> IntoHandlers<A, R> for Vec<HandlerRef<A, R>> {
    fn into_handlers(self) -> Vec<HandlerRef<A, R>> {
        self
    }
}

impl<A, R> IntoHandlers<A, R> for &[HandlerRef<A, R>] {
    fn into_handlers(self) -> Vec<HandlerRef<A, R>> {
        self.to_vec()
    }
}

impl<A, R, const N: usize> IntoHandlers<A, R> for [HandlerRef<A, R>; N] {
    fn into_handlers(self) -> Vec<HandlerRef<A, R>> {
        self.into()
    }
}

impl<A, R, const N: usize> IntoHandlers<A, R> for &[HandlerRef<A, R>; N] {
    fn into_handlers(self) -> Vec<HandlerRef<A, R>> {
        self.to_vec()
    }
}
