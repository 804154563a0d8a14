//! Page lookup by path, id, slug and title.
//!
//! [`PageFinder`] is stateless: every operation reads from the store through
//! [`PageStore`] and returns `Ok(None)` (or an empty list) when nothing
//! matches. Store failures are passed through untouched.

use refinery_shared::{AppConfig, ConditionValue, Page, PageId, PagesConfig, Result, ResultOrder};
use tracing::{debug, instrument};

use crate::conditions::Conditions;
use crate::locale::LocaleProvider;
use crate::store::PageStore;

/// Lookup policy, usually taken from the `[pages]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinderOptions {
    /// Resolve paths segment by segment from a root page.
    pub scope_slug_by_parent: bool,
    /// Tie-break when several translation rows match.
    pub result_order: ResultOrder,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            scope_slug_by_parent: true,
            result_order: ResultOrder::default(),
        }
    }
}

impl From<&PagesConfig> for FinderOptions {
    fn from(config: &PagesConfig) -> Self {
        Self {
            scope_slug_by_parent: config.scope_slug_by_parent,
            result_order: config.result_order,
        }
    }
}

impl From<&AppConfig> for FinderOptions {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.pages)
    }
}

/// One lookup, consumed by [`PageFinder::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageQuery {
    ByTitle { title: String },
    BySlug { slug: String, conditions: Conditions },
    ByPath { path: String },
    ByPathOrId { path: Option<String>, id: Option<PageId> },
}

/// Resolves paths, ids, slugs and titles to pages.
pub struct PageFinder<'a, S, L> {
    store: &'a S,
    locales: &'a L,
    options: FinderOptions,
}

impl<'a, S: PageStore, L: LocaleProvider> PageFinder<'a, S, L> {
    pub fn new(store: &'a S, locales: &'a L, options: FinderOptions) -> Self {
        Self {
            store,
            locales,
            options,
        }
    }

    pub fn options(&self) -> FinderOptions {
        self.options
    }

    /// Run `query` and return its first page.
    pub async fn resolve(&self, query: PageQuery) -> Result<Option<Page>> {
        match query {
            PageQuery::ByTitle { title } => Ok(self.by_title(&title).await?.into_iter().next()),
            PageQuery::BySlug { slug, conditions } => {
                Ok(self.by_slug(&slug, conditions).await?.into_iter().next())
            }
            PageQuery::ByPath { path } => self.find_by_path(&path).await,
            PageQuery::ByPathOrId { path, id } => {
                self.find_by_path_or_id(path.as_deref(), id).await
            }
        }
    }

    /// Resolve a `/`-delimited path.
    ///
    /// With slugs scoped by parent, the first segment must be a root page and
    /// each later segment a child of the previous match, by slug or else by
    /// id. Any miss fails the whole path. Otherwise the path is one slug.
    #[instrument(skip(self), fields(scoped = self.options.scope_slug_by_parent))]
    pub async fn find_by_path(&self, path: &str) -> Result<Option<Page>> {
        if self.options.scope_slug_by_parent {
            self.find_scoped(path).await
        } else {
            Ok(self.by_slug(path, Conditions::new()).await?.into_iter().next())
        }
    }

    async fn find_scoped(&self, path: &str) -> Result<Option<Page>> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        let Some(first) = segments.next() else {
            debug!("empty path");
            return Ok(None);
        };
        let root_scope = Conditions::new().with("parent_id", ConditionValue::Null);
        let Some(mut page) = self.by_slug(first, root_scope).await?.into_iter().next() else {
            debug!(segment = first, "no root page");
            return Ok(None);
        };

        for segment in segments {
            match self.find_child(&page, segment).await? {
                Some(child) => page = child,
                None => {
                    debug!(parent = %page.id, segment, "no child matches segment");
                    return Ok(None);
                }
            }
        }

        debug!(id = %page.id, "path resolved");
        Ok(Some(page))
    }

    async fn find_child(&self, parent: &Page, segment: &str) -> Result<Option<Page>> {
        let scope = Conditions::new().with("parent_id", parent.id.0);
        if let Some(child) = self.by_slug(segment, scope).await?.into_iter().next() {
            return Ok(Some(child));
        }

        let Ok(id) = segment.parse::<PageId>() else {
            return Ok(None);
        };
        let page = self.find(id).await?;
        Ok(page.filter(|child| child.parent_id == Some(parent.id)))
    }

    /// Resolve a path when present and non-blank, else an id.
    ///
    /// A path that is not a friendly id is tried as an id first, falling back
    /// to path resolution when no page has that id.
    #[instrument(skip(self))]
    pub async fn find_by_path_or_id(
        &self,
        path: Option<&str>,
        id: Option<PageId>,
    ) -> Result<Option<Page>> {
        match path.filter(|p| !p.trim().is_empty()) {
            Some(path) if self.store.is_friendly_id(path) => self.find_by_path(path).await,
            Some(path) => {
                let by_id = match path.parse::<PageId>() {
                    Ok(id) => self.find(id).await?,
                    Err(_) => None,
                };
                match by_id {
                    Some(page) => Ok(Some(page)),
                    None => {
                        debug!(path, "no page with that id, resolving as path");
                        self.find_by_path(path).await
                    }
                }
            }
            None => match id {
                Some(id) => self.find(id).await,
                None => Ok(None),
            },
        }
    }

    /// Page by id, with its translation in the active locale.
    pub async fn find(&self, id: PageId) -> Result<Option<Page>> {
        self.store.find(id, self.locales.current_locale()).await
    }

    /// Pages whose title matches in the active locale only.
    #[instrument(skip(self))]
    pub async fn by_title(&self, title: &str) -> Result<Vec<Page>> {
        self.with_globalize(Conditions::new().with("title", title))
            .await
    }

    /// Pages whose slug matches in any frontend locale, narrowed by `conditions`.
    ///
    /// Entries in `conditions` override the defaults, `locale` included.
    #[instrument(skip(self, conditions), fields(extra = conditions.len()))]
    pub async fn by_slug(&self, slug: &str, conditions: Conditions) -> Result<Vec<Page>> {
        let defaults = Conditions::new()
            .with("locale", self.locales.frontend_locales().to_vec())
            .with("slug", slug);
        self.with_globalize(defaults.merge(conditions)).await
    }

    /// Run `conditions` as a translated join, defaulting `locale` to the
    /// active locale.
    pub async fn with_globalize(&self, conditions: Conditions) -> Result<Vec<Page>> {
        let query = Conditions::new()
            .with("locale", self.locales.current_locale())
            .merge(conditions)
            .partition(self.options.result_order)?;
        let pages = self.store.query(&query).await?;
        debug!(matches = pages.len(), "globalized lookup");
        Ok(pages)
    }
}
