use regex::Regex;

use super::{is_wildcard, Pattern, Topic, DELIMITER, SOFT_WILD_CARD, WILD_CARD};
use crate::error::TopicError;

/// Скомпилированный шаблон, привязанный к началу и концу имени.
///
/// Шаблон переводится в регулярное выражение: `*` становится `.+`,
/// `~` становится `[^:]+`, остальные символы экранируются и сравниваются
/// буквально.
///
/// | шаблон | совпадает с                       |
/// |--------|-----------------------------------|
/// | `r:*`  | `r:a`, `r:b`, `r:a:aa`, `r:b:bb`  |
/// | `r:~`  | `r:a`, `r:b`                      |
/// | `*:bb` | `r:b:bb`                          |
/// | `~:b`  | `r:b`                             |
/// | `~:bb` | (нет)                             |
#[derive(Debug, Clone)]
pub struct WildcardMatcher {
    regex: Regex,
}

impl WildcardMatcher {
    pub fn new(pattern: &str) -> Result<Self, TopicError> {
        let segment = format!("[^{}]+", regex::escape(&DELIMITER.to_string()));
        let mut source = String::with_capacity(pattern.len() * 2 + 2);
        let mut literal = String::new();

        source.push('^');
        for ch in pattern.chars() {
            let marker = match ch {
                WILD_CARD => ".+",
                SOFT_WILD_CARD => segment.as_str(),
                _ => {
                    literal.push(ch);
                    continue;
                }
            };
            source.push_str(&regex::escape(&literal));
            source.push_str(marker);
            literal.clear();
        }
        source.push_str(&regex::escape(&literal));
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| TopicError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    /// Текст скомпилированного выражения.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Совпадает ли имя целиком.
    pub fn is_match(
        &self,
        name: &str,
    ) -> bool {
        self.regex.is_match(name)
    }
}

/// Разворачивает шаблон в список топиков.
///
/// Литеральное имя возвращается как есть, даже если оно не
/// зарегистрировано. Шаблон с маркерами даёт все совпавшие
/// зарегистрированные литеральные топики по возрастанию; ключи, которые
/// сами являются шаблонами (их оставляет `literal_passthrough`), в
/// результат не попадают. Если `literal_passthrough` включён, за
/// совпадениями следует сама строка шаблона.
pub fn resolve<'a, I>(
    pattern: &Pattern,
    registered: I,
    literal_passthrough: bool,
) -> Result<Vec<Topic>, TopicError>
where
    I: IntoIterator<Item = &'a Topic>,
{
    if !pattern.is_wildcard() {
        return Ok(vec![pattern.to_topic()]);
    }

    let matcher = WildcardMatcher::new(pattern.as_str())?;
    let mut matches: Vec<Topic> = registered
        .into_iter()
        .filter(|topic| !is_wildcard(topic.as_str()))
        .filter(|topic| matcher.is_match(topic.as_str()))
        .cloned()
        .collect();
    matches.sort();

    if literal_passthrough {
        matches.push(pattern.to_topic());
    }
    Ok(matches)
}
