//! Builds the joined page/translation SELECT for a [`GlobalizedQuery`].
//!
//! Column names come from the typed column enums, never from caller input;
//! every value is bound as a positional parameter.

use libsql::Value;
use refinery_shared::{ConditionValue, GlobalizedQuery, ResultOrder};

/// Columns selected for a page row joined to one translation row.
pub(crate) const PAGE_COLUMNS: &str = "p.id, p.parent_id, p.position, p.draft, p.link_url, \
     p.created_at, p.updated_at, t.locale, t.title, t.menu_title, t.custom_slug, t.slug";

/// SQL text plus its positional parameters, in binding order.
#[derive(Debug)]
pub(crate) struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

pub(crate) fn build_globalized(query: &GlobalizedQuery) -> BuiltQuery {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    for (column, value) in &query.direct {
        clauses.push(clause(&format!("p.{}", column.name()), value, &mut params));
    }
    for (column, value) in &query.translated {
        clauses.push(clause(&format!("t.{}", column.name()), value, &mut params));
    }

    let mut sql = format!(
        "SELECT {PAGE_COLUMNS} FROM pages p JOIN page_translations t ON t.page_id = p.id"
    );
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    let rank = locale_rank(&query.locale_preference(), &mut params);
    let order = match query.order {
        ResultOrder::LocalePreference => [rank, Some("p.position, p.id".to_string())],
        ResultOrder::PageId => [Some("p.id".to_string()), rank],
    };
    let order: Vec<String> = order.into_iter().flatten().collect();
    sql.push_str(" ORDER BY ");
    sql.push_str(&order.join(", "));

    BuiltQuery { sql, params }
}

fn clause(column: &str, value: &ConditionValue, params: &mut Vec<Value>) -> String {
    match value {
        ConditionValue::Null => format!("{column} IS NULL"),
        ConditionValue::Text(text) => {
            params.push(Value::Text(text.clone()));
            format!("{column} = ?")
        }
        ConditionValue::Int(n) => {
            params.push(Value::Integer(*n));
            format!("{column} = ?")
        }
        ConditionValue::Bool(flag) => {
            params.push(Value::Integer(i64::from(*flag)));
            format!("{column} = ?")
        }
        ConditionValue::AnyText(texts) if texts.is_empty() => "0".to_string(),
        ConditionValue::AnyText(texts) => {
            params.extend(texts.iter().cloned().map(Value::Text));
            let placeholders = vec!["?"; texts.len()].join(", ");
            format!("{column} IN ({placeholders})")
        }
    }
}

/// `CASE t.locale WHEN ? THEN 0 ... END`, or `None` with no locale list.
fn locale_rank(locales: &[&str], params: &mut Vec<Value>) -> Option<String> {
    if locales.is_empty() {
        return None;
    }
    let mut case = String::from("CASE t.locale");
    for (rank, locale) in locales.iter().enumerate() {
        params.push(Value::Text((*locale).to_string()));
        case.push_str(&format!(" WHEN ? THEN {rank}"));
    }
    case.push_str(&format!(" ELSE {} END", locales.len()));
    Some(case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refinery_shared::{PageColumn, TranslationColumn};

    fn slug_query(order: ResultOrder) -> GlobalizedQuery {
        GlobalizedQuery {
            direct: vec![(PageColumn::ParentId, ConditionValue::Null)],
            translated: vec![
                (
                    TranslationColumn::Locale,
                    ConditionValue::AnyText(vec!["en".into(), "fr".into()]),
                ),
                (TranslationColumn::Slug, ConditionValue::from("about")),
            ],
            order,
        }
    }

    fn rendered(params: &[Value]) -> Vec<String> {
        params
            .iter()
            .map(|value| match value {
                Value::Text(text) => text.clone(),
                Value::Integer(n) => n.to_string(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn builds_where_and_locale_order() {
        let built = build_globalized(&slug_query(ResultOrder::LocalePreference));
        assert!(built.sql.contains(
            "WHERE p.parent_id IS NULL AND t.locale IN (?, ?) AND t.slug = ?"
        ));
        assert!(built.sql.ends_with(
            "ORDER BY CASE t.locale WHEN ? THEN 0 WHEN ? THEN 1 ELSE 2 END, p.position, p.id"
        ));
        // where params first, then the CASE params
        assert_eq!(rendered(&built.params), vec!["en", "fr", "about", "en", "fr"]);
    }

    #[test]
    fn page_id_order_puts_id_first() {
        let built = build_globalized(&slug_query(ResultOrder::PageId));
        assert!(built.sql.contains("ORDER BY p.id, CASE t.locale"));
    }

    #[test]
    fn empty_locale_list_matches_nothing() {
        let query = GlobalizedQuery {
            direct: vec![(PageColumn::Draft, ConditionValue::Bool(false))],
            translated: vec![(TranslationColumn::Locale, ConditionValue::AnyText(vec![]))],
            order: ResultOrder::LocalePreference,
        };
        let built = build_globalized(&query);
        assert!(built.sql.contains("WHERE p.draft = ? AND 0 ORDER BY p.position, p.id"));
        assert_eq!(rendered(&built.params), vec!["0"]);
    }
}
