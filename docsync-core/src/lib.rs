//! docsync core library: domain types, locale table, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes shared by every crate in the workspace
//! - [`locale`]: the injectable locale equivalence table
//! - [`config`]: YAML + environment configuration
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod locale;
pub mod types;

pub use config::{FrontMatterConfig, MissingContentStrategy, StoreConfig, SyncConfig};
pub use error::ConfigError;
pub use locale::{LocaleSet, LocaleTable};
pub use types::{Document, FrontMatter, Locale, ReferenceId, TagId};
