//! Keyed configuration with lazily generated values.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::ConfigError;
use crate::model::DelimiterSet;

/// Well-known configuration keys.
pub mod keys {
    /// [`DelimiterSet`](crate::DelimiterSet) used to write the interchange.
    pub const DELIMITERS: &str = "delimiters";
    /// Interchange control reference carried by UNB and UNZ.
    pub const INTERCHANGE_REFERENCE: &str = "interchange_reference";
    /// Preparation time (Unix seconds) carried by UNB.
    pub const PREPARED_AT: &str = "prepared_at";
}

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Text(String),
    Integer(i64),
    Flag(bool),
    Delimiters(DelimiterSet),
    /// Seconds since the Unix epoch.
    Timestamp(i64),
}

impl ConfigValue {
    fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Text(_) => "text",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Flag(_) => "flag",
            ConfigValue::Delimiters(_) => "delimiters",
            ConfigValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ConfigValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_delimiters(&self) -> Option<DelimiterSet> {
        match self {
            ConfigValue::Delimiters(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            ConfigValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Flag(value)
    }
}

impl From<DelimiterSet> for ConfigValue {
    fn from(value: DelimiterSet) -> Self {
        ConfigValue::Delimiters(value)
    }
}

/// A configuration entry: a literal, or a generator run once on first read.
pub enum Setting<T> {
    Literal(T),
    Lazy(Box<dyn FnOnce() -> T + Send>),
}

impl<T> Setting<T> {
    pub fn literal(value: impl Into<T>) -> Self {
        Setting::Literal(value.into())
    }

    pub fn lazy<F, V>(generate: F) -> Self
    where
        F: FnOnce() -> V + Send + 'static,
        V: Into<T>,
    {
        Setting::Lazy(Box::new(move || generate().into()))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Setting::Literal(_))
    }

    /// Consumes the setting, running the generator if needed.
    pub fn into_value(self) -> T {
        match self {
            Setting::Literal(value) => value,
            Setting::Lazy(generate) => generate(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Setting::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// A map of configuration entries. Lazy entries are cached once read.
#[derive(Debug, Default)]
pub struct Configuration {
    entries: FxHashMap<String, Setting<ConfigValue>>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn set(&mut self, key: impl Into<String>, setting: Setting<ConfigValue>) {
        self.entries.insert(key.into(), setting);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True if the entry exists and has been generated (or was a literal).
    pub fn is_resolved(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(Setting::is_resolved)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an entry, running and caching its generator on first read.
    pub fn get(&mut self, key: &str) -> Result<&ConfigValue, ConfigError> {
        if matches!(self.entries.get(key), Some(Setting::Lazy(_))) {
            if let Some(setting) = self.entries.remove(key) {
                self.entries.insert(key.to_string(), Setting::Literal(setting.into_value()));
            }
        }
        match self.entries.get(key) {
            Some(Setting::Literal(value)) => Ok(value),
            _ => Err(ConfigError::NotSet { key: key.to_string() }),
        }
    }

    pub fn get_text(&mut self, key: &str) -> Result<&str, ConfigError> {
        let value = self.get(key)?;
        value.as_text().ok_or_else(|| wrong_type(key, "text", value))
    }

    pub fn get_delimiters(&mut self, key: &str) -> Result<DelimiterSet, ConfigError> {
        let value = self.get(key)?;
        value.as_delimiters().ok_or_else(|| wrong_type(key, "delimiters", value))
    }

    pub fn get_timestamp(&mut self, key: &str) -> Result<i64, ConfigError> {
        let value = self.get(key)?;
        value.as_timestamp().ok_or_else(|| wrong_type(key, "timestamp", value))
    }

    /// Consumes the configuration, yielding its entries unresolved.
    pub fn into_entries(self) -> impl Iterator<Item = (String, Setting<ConfigValue>)> {
        self.entries.into_iter()
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &ConfigValue) -> ConfigError {
    ConfigError::WrongType {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}
