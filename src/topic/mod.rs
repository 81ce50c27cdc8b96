//! Модель дерева топиков.
//!
//! Топик это строка из сегментов, разделённых [`DELIMITER`]. Иерархия неявная:
//! `"r:a"` является предком `"r:a:aa"`, а `"r:a:aa"` является потомком `"r:a"`,
//! если такой топик зарегистрирован.
//!
//! - `Topic`: проверенное литеральное имя топика (ключ реестра).
//! - `Pattern`: имя или шаблон с маркерами `*` и `~`, как его передаёт
//!   вызывающая сторона.
//! - `wildcard`: компиляция шаблонов и разворачивание их в
//!   зарегистрированные топики.

pub mod wildcard;

use std::{borrow::Borrow, fmt, str::FromStr, sync::Arc};

use eventree_error::TopicError;

pub use wildcard::{resolve, WildcardMatcher};

/// Разделитель сегментов топика.
pub const DELIMITER: char = ':';
/// Один и более любых символов (может пересекать разделители).
pub const WILD_CARD: char = '*';
/// Один и более символов, кроме разделителя (в пределах сегмента).
pub const SOFT_WILD_CARD: char = '~';

/// Содержит ли строка хотя бы один маркер шаблона.
#[inline]
pub fn is_wildcard(name: &str) -> bool {
    name.contains([WILD_CARD, SOFT_WILD_CARD])
}

/// Имя топика в реестре диспетчера.
///
/// Публичный конструктор [`Topic::new`] принимает только литеральные имена.
/// Топик с маркером внутри получается только разворачиванием
/// шаблона, когда сырая строка шаблона добавляется к результату
/// (см. `DispatcherConfig::literal_passthrough`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Topic(Arc<str>);

impl Topic {
    /// Создаёт топик из литерального имени. Пробелы по краям отбрасываются.
    pub fn new(name: impl AsRef<str>) -> Result<Self, TopicError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(TopicError::Empty);
        }
        if is_wildcard(name) {
            return Err(TopicError::Wildcard {
                topic: name.to_string(),
            });
        }
        Ok(Self(Arc::from(name)))
    }

    /// Без проверок: вызывающая сторона гарантирует непустое имя.
    pub(crate) fn raw(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Сегменты топика слева направо.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(DELIMITER)
    }

    /// Количество сегментов.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Ближайший предок: имя без последнего сегмента.
    pub fn parent(&self) -> Option<Topic> {
        let (head, _) = self.0.rsplit_once(DELIMITER)?;
        if head.is_empty() {
            None
        } else {
            Some(Topic::raw(head))
        }
    }

    /// Строгие предки, начиная с ближайшего.
    ///
    /// Последний сегмент отрезается, пока в имени остаётся разделитель.
    /// Пустые префиксы (имя начинается с разделителя) пропускаются.
    ///
    /// ```
    /// use eventree::Topic;
    ///
    /// let t = Topic::new("r:a:aa").unwrap();
    /// let names: Vec<_> = t.ancestors().iter().map(|a| a.to_string()).collect();
    /// assert_eq!(names, ["r:a", "r"]);
    /// ```
    pub fn ancestors(&self) -> Vec<Topic> {
        let mut out = Vec::new();
        let mut rest: &str = &self.0;
        while let Some((head, _)) = rest.rsplit_once(DELIMITER) {
            if !head.is_empty() {
                out.push(Topic::raw(head));
            }
            rest = head;
        }
        out
    }

    /// Является ли `self` строгим предком `other`.
    pub fn is_ancestor_of(
        &self,
        other: &Topic,
    ) -> bool {
        other
            .as_str()
            .strip_prefix(self.as_str())
            .is_some_and(|tail| tail.starts_with(DELIMITER))
    }
}

/// Строгие потомки `topic` среди зарегистрированных имён: всё, что
/// начинается с `topic` + [`DELIMITER`]. Порядок совпадает с порядком обхода `registered`.
pub fn descendants<'a, I>(
    topic: &Topic,
    registered: I,
) -> Vec<Topic>
where
    I: IntoIterator<Item = &'a Topic>,
{
    registered
        .into_iter()
        .filter(|candidate| topic.is_ancestor_of(candidate))
        .cloned()
        .collect()
}

impl fmt::Display for Topic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Topic {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::new(s)
    }
}

impl TryFrom<&str> for Topic {
    type Error = TopicError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Topic::new(value)
    }
}

/// Имя топика или шаблон, переданный в `subscribe`/`unsubscribe`/`publish`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern(Arc<str>);

impl Pattern {
    /// Пробелы по краям отбрасываются; пустой шаблон считается ошибкой.
    pub fn new(pattern: impl AsRef<str>) -> Result<Self, TopicError> {
        let pattern = pattern.as_ref().trim();
        if pattern.is_empty() {
            return Err(TopicError::Empty);
        }
        Ok(Self(Arc::from(pattern)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        is_wildcard(&self.0)
    }

    /// Сам шаблон как имя топика.
    pub fn to_topic(&self) -> Topic {
        Topic(self.0.clone())
    }
}

impl fmt::Display for Pattern {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Pattern {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Pattern {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::new(s)
    }
}

/// Всё, что можно передать как один или несколько шаблонов.
pub trait IntoPatterns {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError>;
}

fn collect_patterns<I, S>(items: I) -> Result<Vec<Pattern>, TopicError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().map(Pattern::new).collect()
}

impl IntoPatterns for &str {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        Ok(vec![Pattern::new(self)?])
    }
}

impl IntoPatterns for String {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        Ok(vec![Pattern::new(self)?])
    }
}

impl IntoPatterns for &String {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        Ok(vec![Pattern::new(self)?])
    }
}

impl IntoPatterns for Pattern {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        Ok(vec![self])
    }
}

impl IntoPatterns for &Topic {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        Ok(vec![Pattern(self.0.clone())])
    }
}

impl IntoPatterns for Topic {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        Ok(vec![Pattern(self.0)])
    }
}

impl<S: AsRef<str>> IntoPatterns for Vec<S> {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        collect_patterns(self)
    }
}

impl<S: AsRef<str>> IntoPatterns for &[S] {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        collect_patterns(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoPatterns for [S; N] {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        collect_patterns(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoPatterns for &[S; N] {
    fn into_patterns(self) -> Result<Vec<Pattern>, TopicError> {
        collect_patterns(self)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn names(topics: &[Topic]) -> Vec<&str> {
        topics.iter().map(Topic::as_str).collect()
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let t = Topic::new("r:a:aa").unwrap();
        assert_eq!(names(&t.ancestors()), ["r:a", "r"]);
        assert_eq!(t.parent().unwrap().as_str(), "r:a");
        assert_eq!(t.depth(), 3);
    }

    #[test]
    fn test_root_has_no_ancestors() {
        let t = Topic::new("r").unwrap();
        assert!(t.ancestors().is_empty());
        assert!(t.parent().is_none());
    }

    /// Проверяет, что пустые префиксы не попадают в список предков.
    #[test]
    fn test_leading_and_double_delimiters() {
        let t = Topic::new(":a").unwrap();
        assert!(t.ancestors().is_empty());

        let t = Topic::new("a::b").unwrap();
        assert_eq!(names(&t.ancestors()), ["a:", "a"]);
    }

    #[rstest]
    #[case("", TopicError::Empty)]
    #[case("   ", TopicError::Empty)]
    #[case("r:*", TopicError::Wildcard { topic: "r:*".into() })]
    #[case(" ~:b ", TopicError::Wildcard { topic: "~:b".into() })]
    fn test_topic_rejects(
        #[case] input: &str,
        #[case] expected: TopicError,
    ) {
        assert_eq!(Topic::new(input).unwrap_err(), expected);
    }

    #[test]
    fn test_topic_trims() {
        assert_eq!(Topic::new("  data:loaded ").unwrap().as_str(), "data:loaded");
        assert_eq!(Pattern::new(" r:* ").unwrap().as_str(), "r:*");
    }

    #[test]
    fn test_descendants_are_strict() {
        let registered: Vec<Topic> = ["r", "r:a", "r:a:aa", "ra", "r:b", "x:r:a"]
            .iter()
            .map(|s| Topic::new(s).unwrap())
            .collect();
        let r = Topic::new("r").unwrap();
        assert_eq!(names(&descendants(&r, &registered)), ["r:a", "r:a:aa", "r:b"]);

        let ra = Topic::new("r:a").unwrap();
        assert_eq!(names(&descendants(&ra, &registered)), ["r:a:aa"]);
    }

    #[test]
    fn test_is_ancestor_of() {
        let r = Topic::new("r").unwrap();
        assert!(r.is_ancestor_of(&Topic::new("r:a").unwrap()));
        assert!(!r.is_ancestor_of(&Topic::new("r").unwrap()));
        assert!(!r.is_ancestor_of(&Topic::new("rr:a").unwrap()));
    }

    #[test]
    fn test_into_patterns_variants() {
        assert_eq!("r".into_patterns().unwrap().len(), 1);
        assert_eq!(["r", "r:*"].into_patterns().unwrap().len(), 2);
        assert_eq!(vec!["a".to_string()].into_patterns().unwrap().len(), 1);
        assert_eq!(["a", " "].into_patterns().unwrap_err(), TopicError::Empty);
        assert!(Pattern::new("~:b").unwrap().is_wildcard());
        assert!(!Pattern::new("a:b").unwrap().is_wildcard());
    }
}
