//! Lookup conditions and their split into page-row and translation-row parts.

use refinery_shared::{
    ConditionValue, GlobalizedQuery, PageColumn, RefineryError, Result, ResultOrder,
    TranslationColumn,
};

/// Insertion-ordered field-name → value mapping built per lookup.
///
/// Setting a key that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<(String, ConditionValue)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Conditions::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConditionValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Overlay `other` on `self`; keys in `other` win.
    pub fn merge(mut self, other: Conditions) -> Self {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConditionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConditionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Split into translated and direct conditions.
    ///
    /// The first pass claims every key naming a translation column (`locale`
    /// included); the second pass maps what is left onto page columns. A key
    /// that names neither is rejected. Both halves keep insertion order.
    pub fn partition(self, order: ResultOrder) -> Result<GlobalizedQuery> {
        let (translated, rest): (Vec<_>, Vec<_>) = self
            .entries
            .into_iter()
            .partition(|(key, _)| TranslationColumn::from_name(key).is_some());

        let translated = translated
            .into_iter()
            .filter_map(|(key, value)| TranslationColumn::from_name(&key).map(|c| (c, value)))
            .collect();

        let direct = rest
            .into_iter()
            .map(|(key, value)| match PageColumn::from_name(&key) {
                Some(column) => Ok((column, value)),
                None => Err(RefineryError::validation(format!(
                    "unknown condition key '{key}'"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GlobalizedQuery {
            direct,
            translated,
            order,
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Conditions
where
    K: Into<String>,
    V: Into<ConditionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut conditions = Conditions::new();
        for (key, value) in iter {
            conditions.insert(key, value);
        }
        conditions
    }
}
