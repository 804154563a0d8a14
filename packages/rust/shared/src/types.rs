//! Core domain types for Refinery pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PageId
// ---------------------------------------------------------------------------

/// Integer primary key of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub i64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// One addressable page in the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// `None` for root pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PageId>,
    /// Ordering among siblings.
    pub position: i64,
    pub draft: bool,
    /// Redirect target; the page is a menu link rather than content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The translation row the lookup matched, or the requested locale's row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<PageTranslation>,
}

impl Page {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn slug(&self) -> Option<&str> {
        self.translation.as_ref().map(|t| t.slug.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.translation.as_ref().map(|t| t.title.as_str())
    }
}

/// Locale-specific copy of a page's translatable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTranslation {
    pub locale: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_slug: Option<String>,
    pub slug: String,
}

/// Fields for creating a page.
#[derive(Debug, Clone, Default)]
pub struct NewPage {
    pub parent_id: Option<PageId>,
    /// `None` appends after the last sibling.
    pub position: Option<i64>,
    pub draft: bool,
    pub link_url: Option<String>,
}
