//! Store query model: typed columns, condition values, and the partitioned
//! query the page store executes.

use serde::{Deserialize, Serialize};

/// Expected value for one lookup condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionValue {
    /// Column equals this text.
    Text(String),
    /// Column equals any of these texts. An empty list matches nothing.
    AnyText(Vec<String>),
    /// Column equals this integer.
    Int(i64),
    /// Column equals this flag.
    Bool(bool),
    /// Column is NULL.
    Null,
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(value: Vec<String>) -> Self {
        Self::AnyText(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<ConditionValue>> From<Option<T>> for ConditionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Columns stored on the page row itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageColumn {
    Id,
    ParentId,
    Position,
    Draft,
    LinkUrl,
}

impl PageColumn {
    pub const ALL: [PageColumn; 5] = [
        PageColumn::Id,
        PageColumn::ParentId,
        PageColumn::Position,
        PageColumn::Draft,
        PageColumn::LinkUrl,
    ];

    /// Column name as used in conditions and SQL.
    pub fn name(self) -> &'static str {
        match self {
            PageColumn::Id => "id",
            PageColumn::ParentId => "parent_id",
            PageColumn::Position => "position",
            PageColumn::Draft => "draft",
            PageColumn::LinkUrl => "link_url",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Columns stored on the per-locale translation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationColumn {
    Locale,
    Title,
    MenuTitle,
    CustomSlug,
    Slug,
}

impl TranslationColumn {
    pub const ALL: [TranslationColumn; 5] = [
        TranslationColumn::Locale,
        TranslationColumn::Title,
        TranslationColumn::MenuTitle,
        TranslationColumn::CustomSlug,
        TranslationColumn::Slug,
    ];

    /// Column name as used in conditions and SQL.
    pub fn name(self) -> &'static str {
        match self {
            TranslationColumn::Locale => "locale",
            TranslationColumn::Title => "title",
            TranslationColumn::MenuTitle => "menu_title",
            TranslationColumn::CustomSlug => "custom_slug",
            TranslationColumn::Slug => "slug",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Ordering of matched rows when a lookup hits more than one translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrder {
    /// Rows whose locale comes earlier in the `locale` condition list win,
    /// then sibling `position`, then page id.
    #[default]
    LocalePreference,
    /// Lowest page id wins, then locale preference.
    PageId,
}

/// A lookup split into page-row and translation-row conditions.
///
/// The store joins pages to their translations, applies both condition
/// sets, orders by [`ResultOrder`] and returns each page at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalizedQuery {
    pub direct: Vec<(PageColumn, ConditionValue)>,
    pub translated: Vec<(TranslationColumn, ConditionValue)>,
    pub order: ResultOrder,
}

impl GlobalizedQuery {
    /// Locales from the `locale` condition, in the order given.
    pub fn locale_preference(&self) -> Vec<&str> {
        self.translated
            .iter()
            .find(|(column, _)| *column == TranslationColumn::Locale)
            .map(|(_, value)| match value {
                ConditionValue::Text(locale) => vec![locale.as_str()],
                ConditionValue::AnyText(locales) => locales.iter().map(String::as_str).collect(),
                _ => Vec::new(),
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_roundtrip() {
        for column in PageColumn::ALL {
            assert_eq!(PageColumn::from_name(column.name()), Some(column));
        }
        for column in TranslationColumn::ALL {
            assert_eq!(TranslationColumn::from_name(column.name()), Some(column));
        }
        assert_eq!(PageColumn::from_name("slug"), None);
        assert_eq!(TranslationColumn::from_name("parent_id"), None);
    }

    #[test]
    fn option_condition_maps_none_to_null() {
        let none: Option<i64> = None;
        assert_eq!(ConditionValue::from(none), ConditionValue::Null);
        assert_eq!(ConditionValue::from(Some(3_i64)), ConditionValue::Int(3));
    }

    #[test]
    fn locale_preference_follows_condition_order() {
        let query = GlobalizedQuery {
            direct: vec![],
            translated: vec![
                (TranslationColumn::Slug, "about".into()),
                (
                    TranslationColumn::Locale,
                    vec!["fr".to_string(), "en".to_string()].into(),
                ),
            ],
            order: ResultOrder::LocalePreference,
        };
        assert_eq!(query.locale_preference(), vec!["fr", "en"]);
    }

    #[test]
    fn result_order_serde_names() {
        #[derive(Deserialize)]
        struct Wrap {
            order: ResultOrder,
        }
        let parsed: Wrap = toml::from_str("order = \"page_id\"").expect("parse");
        assert_eq!(parsed.order, ResultOrder::PageId);
    }
}
