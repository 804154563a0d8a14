//! Shared types, error model, and configuration for Refinery.
//!
//! This crate is the foundation depended on by all other Refinery crates.
//! It provides:
//! - [`RefineryError`] — the unified error type
//! - Domain types ([`Page`], [`PageTranslation`], [`PageId`])
//! - The store query model ([`GlobalizedQuery`], [`ConditionValue`], [`ResultOrder`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod query;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, I18nConfig, PagesConfig, StorageConfig, config_dir, config_file_path, init_config,
    init_config_at, load_config, load_config_from,
};
pub use error::{RefineryError, Result};
pub use query::{ConditionValue, GlobalizedQuery, PageColumn, ResultOrder, TranslationColumn};
pub use types::{NewPage, Page, PageId, PageTranslation};
