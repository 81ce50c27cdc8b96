use std::{fmt, str::FromStr};

use eventree_error::OptionError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

bitflags::bitflags! {
    /// Какие топики дерева участвуют в вызове `publish`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Propagate: u8 {
        /// Все строгие предки топика.
        const TO_TOP = 1 << 0;
        /// Сам топик.
        const CURRENT = 1 << 1;
        /// Все зарегистрированные строгие потомки топика.
        const TO_DEEP = 1 << 2;
    }
}

impl Default for Propagate {
    fn default() -> Self {
        Propagate::TO_TOP | Propagate::CURRENT
    }
}

impl FromStr for Propagate {
    type Err = String;

    /// Принимает число (`3`) или список имён через `,` или `|`:
    /// `top`, `current`, `deep` (а также `to_top`, `to_deep`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(bits) = s.parse::<u8>() {
            return Propagate::from_bits(bits).ok_or_else(|| s.to_string());
        }
        let mut out = Propagate::empty();
        for part in s.split([',', '|']).map(str::trim).filter(|p| !p.is_empty()) {
            out |= match part.to_ascii_lowercase().as_str() {
                "top" | "to_top" => Propagate::TO_TOP,
                "current" => Propagate::CURRENT,
                "deep" | "to_deep" => Propagate::TO_DEEP,
                _ => return Err(part.to_string()),
            };
        }
        Ok(out)
    }
}

impl fmt::Display for Propagate {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let parts: Vec<&str> = [
            (Propagate::TO_TOP, "top"),
            (Propagate::CURRENT, "current"),
            (Propagate::TO_DEEP, "deep"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        f.write_str(&parts.join("|"))
    }
}

impl Serialize for Propagate {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Propagate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bits(u8),
            Text(String),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Bits(bits) => bits.to_string(),
            Repr::Text(text) => text,
        };
        text.parse()
            .map_err(|bad| serde::de::Error::custom(format!("invalid propagate flag '{bad}'")))
    }
}

/// Порядок, в котором топики плана отдают своих обработчиков.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOrder {
    /// Сначала сам топик, затем предки от ближайшего, затем потомки по
    /// возрастанию.
    #[default]
    FromCurrent,
    /// Все топики плана по возрастанию.
    FromBegin,
    /// Все топики плана по убыванию.
    FromEnd,
}

impl CallOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FromCurrent => "from_current",
            Self::FromBegin => "from_begin",
            Self::FromEnd => "from_end",
        }
    }
}

impl FromStr for CallOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "from_current" | "current" => Ok(Self::FromCurrent),
            "from_begin" | "begin" => Ok(Self::FromBegin),
            "from_end" | "end" => Ok(Self::FromEnd),
            other => Err(other.to_string()),
        }
    }
}

/// Политика повторных вызовов одного обработчика в рамках `publish`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueCall {
    /// Уже вызванный обработчик пропускается.
    #[default]
    Once,
    /// Обработчик вызывается для каждого топика, к которому он привязан.
    Every,
}

impl UniqueCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Every => "every",
        }
    }
}

impl FromStr for UniqueCall {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "every" => Ok(Self::Every),
            other => Err(other.to_string()),
        }
    }
}

/// Опции одного вызова `publish`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptions {
    pub unique_call: UniqueCall,
    pub call_order: CallOrder,
    pub propagate: Propagate,
}

/// Собирает опции; пропущенные значения берутся по умолчанию
/// (`Once`, `FromCurrent`, `TO_TOP | CURRENT`).
pub fn make_options(
    unique_call: Option<UniqueCall>,
    call_order: Option<CallOrder>,
    propagate: Option<Propagate>,
) -> PublishOptions {
    PublishOptions {
        unique_call: unique_call.unwrap_or_default(),
        call_order: call_order.unwrap_or_default(),
        propagate: propagate.unwrap_or_default(),
    }
}

impl PublishOptions {
    /// Префикс, под которым опции передаются среди именованных аргументов.
    /// Ключи без префикса всегда считаются данными обработчиков.
    pub const KEY_PREFIX: &'static str = "__eventree_";

    const UNIQUE_CALL: &'static str = "unique_call";
    const CALL_ORDER: &'static str = "call_order";
    const PROPAGATE: &'static str = "propagate";

    pub fn with_unique_call(
        mut self,
        unique_call: UniqueCall,
    ) -> Self {
        self.unique_call = unique_call;
        self
    }

    pub fn with_call_order(
        mut self,
        call_order: CallOrder,
    ) -> Self {
        self.call_order = call_order;
        self
    }

    pub fn with_propagate(
        mut self,
        propagate: Propagate,
    ) -> Self {
        self.propagate = propagate;
        self
    }

    fn key(name: &str) -> String {
        format!("{}{name}", Self::KEY_PREFIX)
    }

    /// Опции в виде именованных аргументов с зарезервированным префиксом.
    pub fn into_keywords(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            Self::key(Self::UNIQUE_CALL),
            Value::from(self.unique_call.as_str()),
        );
        map.insert(
            Self::key(Self::CALL_ORDER),
            Value::from(self.call_order.as_str()),
        );
        map.insert(
            Self::key(Self::PROPAGATE),
            Value::from(self.propagate.bits()),
        );
        map
    }

    /// Забирает из `keywords` все ключи с префиксом [`Self::KEY_PREFIX`].
    ///
    /// Отсутствующие опции берутся из `defaults`. Остальные ключи не
    /// трогаются, даже если называются `propagate` или `call_order`.
    pub fn extract(
        keywords: &mut Map<String, Value>,
        defaults: PublishOptions,
    ) -> Result<PublishOptions, OptionError> {
        let namespaced: Vec<String> = keywords
            .keys()
            .filter(|k| k.starts_with(Self::KEY_PREFIX))
            .cloned()
            .collect();

        let mut options = defaults;
        for key in namespaced {
            let Some(value) = keywords.remove(&key) else {
                continue;
            };
            let invalid = || OptionError::InvalidValue {
                key: key.clone(),
                value: value.to_string(),
            };
            let text = match &value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return Err(invalid()),
            };
            match &key[Self::KEY_PREFIX.len()..] {
                Self::UNIQUE_CALL => options.unique_call = text.parse().map_err(|_| invalid())?,
                Self::CALL_ORDER => options.call_order = text.parse().map_err(|_| invalid())?,
                Self::PROPAGATE => options.propagate = text.parse().map_err(|_| invalid())?,
                _ => return Err(OptionError::Unknown { key: key.clone() }),
            }
        }
        Ok(options)
    }
}
