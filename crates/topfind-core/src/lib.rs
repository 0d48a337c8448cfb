//! Shared vocabulary for topFIND: resource kinds, normalized records and
//! tables, taxonomies, filter specifications, export metadata, saved search
//! configurations, and application configuration.

pub mod app_config;
pub mod config;
pub mod error;
pub mod filter_spec;
pub mod metadata;
pub mod resource;
pub mod search_config;
pub mod table;
pub mod taxonomy;
pub mod value;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ValidationError};
pub use filter_spec::{FilterSpec, FilterValue, FilterValueType};
pub use metadata::{allowed_export_fields, export_fields, validate_export_fields};
pub use resource::ResourceKind;
pub use search_config::{ConfigStore, SearchConfig};
pub use table::{Record, ResourceTable};
pub use taxonomy::{load_taxonomy, Taxonomy};
pub use value::{Value, DATE_FORMAT, MISSING_SENTINEL};
