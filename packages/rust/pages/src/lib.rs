//! Page lookup for the Refinery content tree.
//!
//! [`PageFinder`] resolves URL paths, ids, slugs and titles to pages. It reads
//! through two seams:
//! - [`PageStore`] — translated join queries, id lookup, children
//!   (implemented for [`refinery_storage::Storage`])
//! - [`LocaleProvider`] — the active locale and the frontend locales
//!
//! Lookups never write and hold no state between calls.

pub mod conditions;
pub mod finder;
pub mod locale;
pub mod slug;
pub mod store;

pub use conditions::Conditions;
pub use finder::{FinderOptions, PageFinder, PageQuery};
pub use locale::{LocaleProvider, Locales};
pub use slug::{is_friendly_id, normalize, slug_for};
pub use store::PageStore;
