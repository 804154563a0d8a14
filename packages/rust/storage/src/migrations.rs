//! SQL migration definitions for the Refinery pages database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: pages, page_translations",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Content tree
CREATE TABLE IF NOT EXISTS pages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id  INTEGER REFERENCES pages(id) ON DELETE CASCADE,
    position   INTEGER NOT NULL DEFAULT 0,
    draft      INTEGER NOT NULL DEFAULT 0,
    link_url   TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_parent_id ON pages(parent_id);

-- Per-locale translatable fields
CREATE TABLE IF NOT EXISTS page_translations (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id     INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    locale      TEXT NOT NULL,
    title       TEXT NOT NULL,
    menu_title  TEXT,
    custom_slug TEXT,
    slug        TEXT NOT NULL,
    UNIQUE(page_id, locale)
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Index translation slugs and titles for lookups",
            sql: r#"
CREATE INDEX IF NOT EXISTS idx_page_translations_slug ON page_translations(slug, locale);
CREATE INDEX IF NOT EXISTS idx_page_translations_title ON page_translations(title, locale);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
