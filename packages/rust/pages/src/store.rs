//! The content store the finder reads from.

use refinery_shared::{GlobalizedQuery, Page, PageId, Result};
use refinery_storage::Storage;

use crate::slug;

/// Read access to pages and their translations.
///
/// Implementations return owned pages, so a caller may modify a result and
/// write it back through the store's own write API.
#[allow(async_fn_in_trait)]
pub trait PageStore {
    /// Pages matching a translated join, each at most once, in `query.order`.
    async fn query(&self, query: &GlobalizedQuery) -> Result<Vec<Page>>;

    /// Page by id, carrying its translation for `locale` if it has one.
    async fn find(&self, id: PageId, locale: &str) -> Result<Option<Page>>;

    /// Children of `parent` in sibling order.
    async fn children(&self, parent: PageId, locale: &str) -> Result<Vec<Page>>;

    /// Whether `input` addresses a page by slug rather than by id.
    fn is_friendly_id(&self, input: &str) -> bool {
        slug::is_friendly_id(input)
    }
}

impl PageStore for Storage {
    async fn query(&self, query: &GlobalizedQuery) -> Result<Vec<Page>> {
        self.query_pages(query).await
    }

    async fn find(&self, id: PageId, locale: &str) -> Result<Option<Page>> {
        self.find_page(id, locale).await
    }

    async fn children(&self, parent: PageId, locale: &str) -> Result<Vec<Page>> {
        Storage::children(self, parent, locale).await
    }
}
