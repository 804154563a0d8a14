//! libSQL storage layer for the Refinery content tree.
//!
//! The [`Storage`] struct wraps a local libSQL database holding pages and
//! their per-locale translations. It answers the queries the page finder
//! needs: the translated join, lookup by id, and children of a page.
//!
//! **Access rules:**
//! - CLI write commands: read-write via [`Storage::open`]
//! - Lookups only: read-only via [`Storage::open_readonly`]

mod migrations;
mod sql;

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Transaction, params};
use refinery_shared::{
    GlobalizedQuery, NewPage, Page, PageId, PageTranslation, RefineryError, Result,
};

use crate::sql::PAGE_COLUMNS;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

fn storage_err(e: libsql::Error) -> RefineryError {
    RefineryError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RefineryError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` for lookups only.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RefineryError::NotFound(format!(
                "database {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        RefineryError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(RefineryError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Page writes
    // -----------------------------------------------------------------------

    /// Insert a page row. Returns its generated id.
    pub async fn create_page(&self, page: &NewPage) -> Result<PageId> {
        self.check_writable()?;
        let position = self.position_for(page).await?;

        let id = insert_page(&self.conn, page, position).await?;
        tracing::info!(%id, parent = ?page.parent_id, position, "created page");
        Ok(id)
    }

    /// Insert a page row together with its first translation.
    ///
    /// Either both rows are written or neither is.
    pub async fn create_page_with_translation(
        &self,
        page: &NewPage,
        translation: &PageTranslation,
    ) -> Result<PageId> {
        self.check_writable()?;
        let position = self.position_for(page).await?;
        self.ensure_slug_free(None, page.parent_id, &translation.locale, &translation.slug)
            .await?;

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        let result: Result<PageId> = async {
            let id = insert_page(&tx, page, position).await?;
            write_translation(&tx, id, translation).await?;
            Ok(id)
        }
        .await;
        let id = finish(tx, result).await?;

        tracing::info!(%id, parent = ?page.parent_id, position, slug = %translation.slug, "created page");
        Ok(id)
    }

    /// Insert or replace the translation of `page_id` for `translation.locale`.
    ///
    /// Rejects a slug already used by a sibling in the same locale.
    pub async fn upsert_translation(
        &self,
        page_id: PageId,
        translation: &PageTranslation,
    ) -> Result<()> {
        self.check_writable()?;
        let page = self.require_page(page_id).await?;
        self.ensure_slug_free(
            Some(page_id),
            page.parent_id,
            &translation.locale,
            &translation.slug,
        )
        .await?;

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        let result = write_translation(&tx, page_id, translation).await;
        finish(tx, result).await?;

        tracing::info!(%page_id, locale = %translation.locale, slug = %translation.slug, "saved translation");
        Ok(())
    }

    /// Persist changes to a page returned by a lookup, including its translation.
    ///
    /// A move is checked against the new parent before anything is written:
    /// the parent must exist and must not be the page or one of its
    /// descendants, and none of the page's translations (in any locale) may
    /// reuse a slug already taken under the new parent.
    pub async fn update_page(&self, page: &Page) -> Result<()> {
        self.check_writable()?;
        let current = self.require_page(page.id).await?;

        if page.parent_id != current.parent_id {
            if let Some(parent) = page.parent_id {
                self.ensure_not_within(page.id, parent).await?;
            }
        }

        let mut slugs = self.translation_slugs(page.id).await?;
        if let Some(translation) = &page.translation {
            slugs.retain(|(locale, _)| *locale != translation.locale);
            slugs.push((translation.locale.clone(), translation.slug.clone()));
        }
        for (locale, slug) in &slugs {
            self.ensure_slug_free(Some(page.id), page.parent_id, locale, slug)
                .await?;
        }

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        let result: Result<()> = async {
            let now = Utc::now().to_rfc3339();
            tx.execute(
                "UPDATE pages SET parent_id = ?1, position = ?2, draft = ?3, link_url = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    page.parent_id.map(|p| p.0),
                    page.position,
                    i64::from(page.draft),
                    page.link_url.as_deref(),
                    now.as_str(),
                    page.id.0
                ],
            )
            .await
            .map_err(storage_err)?;

            if let Some(translation) = &page.translation {
                write_translation(&tx, page.id, translation).await?;
            }
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        tracing::info!(id = %page.id, parent = ?page.parent_id, "updated page");
        Ok(())
    }

    async fn position_for(&self, page: &NewPage) -> Result<i64> {
        if let Some(parent) = page.parent_id {
            self.require_page(parent).await?;
        }
        match page.position {
            Some(position) => Ok(position),
            None => self.next_position(page.parent_id.map(|p| p.0)).await,
        }
    }

    async fn next_position(&self, parent: Option<i64>) -> Result<i64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM pages WHERE parent_id IS ?1",
                params![parent],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => row.get::<i64>(0).map_err(storage_err),
            None => Ok(0),
        }
    }

    /// Reject `parent` when it is `page` itself or sits below it.
    async fn ensure_not_within(&self, page: PageId, parent: PageId) -> Result<()> {
        if parent == page {
            return Err(RefineryError::validation("a page cannot be its own parent"));
        }

        let mut visited = HashSet::new();
        let mut next = Some(parent);
        while let Some(current) = next {
            if current == page {
                return Err(RefineryError::validation(format!(
                    "cannot move page {page} under its descendant {parent}"
                )));
            }
            if !visited.insert(current) {
                break;
            }
            next = self.require_page(current).await?.parent_id;
        }
        Ok(())
    }

    /// `(locale, slug)` of every stored translation of `page_id`.
    async fn translation_slugs(&self, page_id: PageId) -> Result<Vec<(String, String)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT locale, slug FROM page_translations WHERE page_id = ?1 ORDER BY locale",
                params![page_id.0],
            )
            .await
            .map_err(storage_err)?;

        let mut slugs = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            slugs.push((
                row.get::<String>(0).map_err(storage_err)?,
                row.get::<String>(1).map_err(storage_err)?,
            ));
        }
        Ok(slugs)
    }

    /// Fail unless `slug` is non-empty and unused among the children of
    /// `parent_id` in `locale`, ignoring `page_id`'s own rows.
    async fn ensure_slug_free(
        &self,
        page_id: Option<PageId>,
        parent_id: Option<PageId>,
        locale: &str,
        slug: &str,
    ) -> Result<()> {
        if slug.is_empty() {
            return Err(RefineryError::validation("slug must not be empty"));
        }

        let mut rows = self
            .conn
            .query(
                "SELECT t.page_id FROM page_translations t JOIN pages p ON p.id = t.page_id
                 WHERE p.parent_id IS ?1 AND t.locale = ?2 AND t.slug = ?3 AND t.page_id IS NOT ?4
                 LIMIT 1",
                params![parent_id.map(|p| p.0), locale, slug, page_id.map(|p| p.0)],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => {
                let sibling = PageId(row.get::<i64>(0).map_err(storage_err)?);
                Err(RefineryError::validation(format!(
                    "slug '{slug}' is already used by page {sibling} in locale '{locale}'"
                )))
            }
            None => Ok(()),
        }
    }

    async fn require_page(&self, id: PageId) -> Result<Page> {
        self.find_page(id, "")
            .await?
            .ok_or_else(|| RefineryError::NotFound(format!("page {id}")))
    }

    // -----------------------------------------------------------------------
    // Page reads
    // -----------------------------------------------------------------------

    /// Get a page by id, with its translation for `locale` when one exists.
    pub async fn find_page(&self, id: PageId, locale: &str) -> Result<Option<Page>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {PAGE_COLUMNS} FROM pages p
                     LEFT JOIN page_translations t ON t.page_id = p.id AND t.locale = ?2
                     WHERE p.id = ?1"
                ),
                params![id.0, locale],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_page(&row)?)),
            None => Ok(None),
        }
    }

    /// Children of `parent` ordered by position, with their `locale` translation.
    pub async fn children(&self, parent: PageId, locale: &str) -> Result<Vec<Page>> {
        self.pages_where_parent(Some(parent), locale).await
    }

    /// Root pages ordered by position, with their `locale` translation.
    pub async fn roots(&self, locale: &str) -> Result<Vec<Page>> {
        self.pages_where_parent(None, locale).await
    }

    async fn pages_where_parent(&self, parent: Option<PageId>, locale: &str) -> Result<Vec<Page>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {PAGE_COLUMNS} FROM pages p
                     LEFT JOIN page_translations t ON t.page_id = p.id AND t.locale = ?2
                     WHERE p.parent_id IS ?1
                     ORDER BY p.position, p.id"
                ),
                params![parent.map(|p| p.0), locale],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_page(&row)?);
        }
        Ok(results)
    }

    /// Run a translated join query. Each page appears once, at its first
    /// matching row in the query's [`refinery_shared::ResultOrder`].
    pub async fn query_pages(&self, query: &GlobalizedQuery) -> Result<Vec<Page>> {
        let built = sql::build_globalized(query);
        tracing::trace!(sql = %built.sql, params = built.params.len(), "globalized query");

        let mut rows = self
            .conn
            .query(&built.sql, libsql::params::Params::Positional(built.params))
            .await
            .map_err(storage_err)?;

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let page = row_to_page(&row)?;
            if seen.insert(page.id) {
                results.push(page);
            }
        }
        Ok(results)
    }

    /// The `/`-joined slug chain from the root down to `id` in `locale`.
    ///
    /// `None` when the page is missing or an ancestor has no translation in
    /// that locale.
    pub async fn nested_path(&self, id: PageId, locale: &str) -> Result<Option<String>> {
        let mut slugs = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(id);

        while let Some(current) = next {
            if !visited.insert(current) {
                return Err(RefineryError::Storage(format!(
                    "cycle in page ancestry at page {current}"
                )));
            }
            let Some(page) = self.find_page(current, locale).await? else {
                return Ok(None);
            };
            let Some(translation) = page.translation else {
                return Ok(None);
            };
            slugs.push(translation.slug);
            next = page.parent_id;
        }

        slugs.reverse();
        Ok(Some(slugs.join("/")))
    }
}

/// Commit `tx` when `result` is `Ok`, otherwise roll it back and return the error.
async fn finish<T>(tx: Transaction, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(storage_err)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

async fn insert_page(conn: &Connection, page: &NewPage, position: i64) -> Result<PageId> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO pages (parent_id, position, draft, link_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            page.parent_id.map(|p| p.0),
            position,
            i64::from(page.draft),
            page.link_url.as_deref(),
            now.as_str(),
            now.as_str()
        ],
    )
    .await
    .map_err(storage_err)?;

    Ok(PageId(conn.last_insert_rowid()))
}

/// Upsert one translation row and bump the page's `updated_at`.
async fn write_translation(
    conn: &Connection,
    page_id: PageId,
    translation: &PageTranslation,
) -> Result<()> {
    conn.execute(
        "INSERT INTO page_translations (page_id, locale, title, menu_title, custom_slug, slug)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(page_id, locale) DO UPDATE SET
           title = excluded.title,
           menu_title = excluded.menu_title,
           custom_slug = excluded.custom_slug,
           slug = excluded.slug",
        params![
            page_id.0,
            translation.locale.as_str(),
            translation.title.as_str(),
            translation.menu_title.as_deref(),
            translation.custom_slug.as_deref(),
            translation.slug.as_str()
        ],
    )
    .await
    .map_err(storage_err)?;

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE pages SET updated_at = ?1 WHERE id = ?2",
        params![now.as_str(), page_id.0],
    )
    .await
    .map_err(storage_err)?;
    Ok(())
}

/// Convert a page row (see [`PAGE_COLUMNS`]) to a [`Page`].
fn row_to_page(row: &libsql::Row) -> Result<Page> {
    let translation = match row.get::<String>(7).ok() {
        Some(locale) => Some(PageTranslation {
            locale,
            title: row.get::<String>(8).map_err(storage_err)?,
            menu_title: row.get::<String>(9).ok(),
            custom_slug: row.get::<String>(10).ok(),
            slug: row.get::<String>(11).map_err(storage_err)?,
        }),
        None => None,
    };

    Ok(Page {
        id: PageId(row.get::<i64>(0).map_err(storage_err)?),
        parent_id: row.get::<i64>(1).ok().map(PageId),
        position: row.get::<i64>(2).map_err(storage_err)?,
        draft: row.get::<i64>(3).map_err(storage_err)? != 0,
        link_url: row.get::<String>(4).ok(),
        created_at: parse_timestamp(row.get::<String>(5).map_err(storage_err)?)?,
        updated_at: parse_timestamp(row.get::<String>(6).map_err(storage_err)?)?,
        translation,
    })
}

fn parse_timestamp(s: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RefineryError::Storage(format!("invalid date: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refinery_shared::{ConditionValue, PageColumn, ResultOrder, TranslationColumn};
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("refinery_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn translation(locale: &str, title: &str, slug: &str) -> PageTranslation {
        PageTranslation {
            locale: locale.into(),
            title: title.into(),
            menu_title: None,
            custom_slug: None,
            slug: slug.into(),
        }
    }

    async fn page(storage: &Storage, parent: Option<PageId>, locale: &str, slug: &str) -> PageId {
        storage
            .create_page_with_translation(
                &NewPage {
                    parent_id: parent,
                    ..NewPage::default()
                },
                &translation(locale, slug, slug),
            )
            .await
            .expect("create page")
    }

    fn child_slugs(pages: &[Page]) -> Vec<Option<&str>> {
        pages.iter().map(|p| p.slug()).collect()
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("refinery_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn positions_append_per_parent() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        let contact = page(&storage, None, "en", "contact").await;
        let team = page(&storage, Some(about), "en", "team").await;

        let roots = storage.roots("en").await.unwrap();
        assert_eq!(
            roots.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![about, contact]
        );
        assert_eq!(roots[1].position, 1);

        let children = storage.children(about, "en").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, team);
        assert_eq!(children[0].position, 0);
    }

    #[tokio::test]
    async fn find_page_without_translation_in_locale() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;

        let found = storage.find_page(about, "fr").await.unwrap().unwrap();
        assert!(found.translation.is_none());
        let found = storage.find_page(about, "en").await.unwrap().unwrap();
        assert_eq!(found.slug(), Some("about"));
        assert!(storage.find_page(PageId(999), "en").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sibling_slug_collision_rejected() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        let other = storage.create_page(&NewPage::default()).await.unwrap();

        let err = storage
            .upsert_translation(other, &translation("en", "About", "about"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already used by page"));

        // Same slug under a different parent, or in another locale, is fine.
        page(&storage, Some(about), "en", "about").await;
        storage
            .upsert_translation(other, &translation("fr", "A propos", "about"))
            .await
            .expect("other locale");
    }

    #[tokio::test]
    async fn translation_upsert_replaces_row() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        storage
            .upsert_translation(about, &translation("en", "About us", "about-us"))
            .await
            .unwrap();

        let found = storage.find_page(about, "en").await.unwrap().unwrap();
        assert_eq!(found.title(), Some("About us"));
        assert_eq!(found.slug(), Some("about-us"));
    }

    #[tokio::test]
    async fn query_pages_dedupes_and_orders_by_locale() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        storage
            .upsert_translation(about, &translation("fr", "A propos", "about"))
            .await
            .unwrap();

        let query = GlobalizedQuery {
            direct: vec![(PageColumn::ParentId, ConditionValue::Null)],
            translated: vec![
                (
                    TranslationColumn::Locale,
                    ConditionValue::AnyText(vec!["fr".into(), "en".into()]),
                ),
                (TranslationColumn::Slug, ConditionValue::from("about")),
            ],
            order: ResultOrder::LocalePreference,
        };
        let pages = storage.query_pages(&query).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].translation.as_ref().unwrap().locale, "fr");
    }

    #[tokio::test]
    async fn update_page_persists_changes() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;

        let mut found = storage.find_page(about, "en").await.unwrap().unwrap();
        found.draft = true;
        found.link_url = Some("https://example.com".into());
        if let Some(t) = found.translation.as_mut() {
            t.menu_title = Some("Us".into());
        }
        storage.update_page(&found).await.expect("update");

        let reloaded = storage.find_page(about, "en").await.unwrap().unwrap();
        assert!(reloaded.draft);
        assert_eq!(reloaded.link_url.as_deref(), Some("https://example.com"));
        assert_eq!(
            reloaded.translation.unwrap().menu_title.as_deref(),
            Some("Us")
        );
    }

    #[tokio::test]
    async fn nested_path_walks_ancestors() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        let team = page(&storage, Some(about), "en", "team").await;
        let alice = page(&storage, Some(team), "en", "alice").await;

        assert_eq!(
            storage.nested_path(alice, "en").await.unwrap().as_deref(),
            Some("about/team/alice")
        );
        assert_eq!(storage.nested_path(alice, "fr").await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_under_missing_parent_fails() {
        let storage = test_storage().await;
        let err = storage
            .create_page(&NewPage {
                parent_id: Some(PageId(41)),
                ..NewPage::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RefineryError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_with_translation_is_atomic() {
        let storage = test_storage().await;
        page(&storage, None, "en", "about").await;

        let err = storage
            .create_page_with_translation(&NewPage::default(), &translation("en", "About", "about"))
            .await
            .unwrap_err();
        assert!(matches!(err, RefineryError::Validation { .. }));
        assert_eq!(storage.roots("en").await.unwrap().len(), 1);

        let err = storage
            .create_page_with_translation(&NewPage::default(), &translation("en", "Blank", ""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
        assert_eq!(storage.roots("en").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_transaction_rolls_back() {
        let storage = test_storage().await;
        let tx = storage.conn.transaction().await.unwrap();
        let inserted = insert_page(&tx, &NewPage::default(), 0).await;
        assert!(inserted.is_ok());

        let result: Result<()> = Err(RefineryError::validation("abort"));
        assert!(finish(tx, result).await.is_err());
        assert!(storage.roots("en").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reparent_checks_untranslated_page_slugs() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        page(&storage, Some(about), "en", "team").await;
        let root_team = page(&storage, None, "en", "team").await;

        // loaded in a locale it has no translation for
        let mut moved = storage.find_page(root_team, "fr").await.unwrap().unwrap();
        assert!(moved.translation.is_none());
        moved.parent_id = Some(about);

        let err = storage.update_page(&moved).await.unwrap_err();
        assert!(err.to_string().contains("slug 'team' is already used"));
        let children = storage.children(about, "en").await.unwrap();
        assert_eq!(child_slugs(&children), vec![Some("team")]);
    }

    #[tokio::test]
    async fn reparent_checks_slugs_in_other_locales() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        page(&storage, Some(about), "en", "team").await;
        let root_team = page(&storage, None, "en", "team").await;
        storage
            .upsert_translation(root_team, &translation("fr", "Equipe", "equipe"))
            .await
            .unwrap();

        let mut moved = storage.find_page(root_team, "fr").await.unwrap().unwrap();
        moved.parent_id = Some(about);
        assert!(storage.update_page(&moved).await.is_err());

        let reloaded = storage.find_page(root_team, "fr").await.unwrap().unwrap();
        assert_eq!(reloaded.parent_id, None);
    }

    #[tokio::test]
    async fn failed_update_leaves_page_untouched() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        page(&storage, Some(about), "en", "history").await;
        let root_history = page(&storage, None, "en", "history").await;

        let mut moved = storage.find_page(root_history, "en").await.unwrap().unwrap();
        moved.parent_id = Some(about);
        moved.draft = true;
        storage.update_page(&moved).await.unwrap_err();

        let reloaded = storage.find_page(root_history, "en").await.unwrap().unwrap();
        assert_eq!(reloaded.parent_id, None);
        assert!(!reloaded.draft);
    }

    #[tokio::test]
    async fn reparent_under_descendant_rejected() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        let team = page(&storage, Some(about), "en", "team").await;
        let alice = page(&storage, Some(team), "en", "alice").await;

        let mut moved = storage.find_page(about, "en").await.unwrap().unwrap();
        moved.parent_id = Some(alice);
        let err = storage.update_page(&moved).await.unwrap_err();
        assert!(err.to_string().contains("descendant"));

        moved.parent_id = Some(about);
        let err = storage.update_page(&moved).await.unwrap_err();
        assert!(err.to_string().contains("its own parent"));

        assert_eq!(
            storage.nested_path(alice, "en").await.unwrap().as_deref(),
            Some("about/team/alice")
        );
    }

    #[tokio::test]
    async fn reparent_moves_page_and_its_path() {
        let storage = test_storage().await;
        let about = page(&storage, None, "en", "about").await;
        let contact = page(&storage, None, "en", "contact").await;

        let mut moved = storage.find_page(contact, "en").await.unwrap().unwrap();
        moved.parent_id = Some(about);
        storage.update_page(&moved).await.expect("move under about");
        assert_eq!(
            storage.nested_path(contact, "en").await.unwrap().as_deref(),
            Some("about/contact")
        );

        moved.parent_id = Some(PageId(404));
        let err = storage.update_page(&moved).await.unwrap_err();
        assert!(matches!(err, RefineryError::NotFound(_)));
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("refinery_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.create_page(&NewPage::default()).await.unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        let result = ro.create_page(&NewPage::default()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
        assert_eq!(ro.roots("en").await.unwrap().len(), 1);
    }
}
