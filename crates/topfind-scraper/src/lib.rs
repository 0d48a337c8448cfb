//! Provider adapters for topFIND.
//!
//! Each adapter implements [`ProviderAdapter`]: `search` pages through one
//! external source for a query string, and `parse` turns each raw result
//! into a [`ProviderRow`] keyed by the provider's native field names.
//! [`collect`] drives an adapter over a query list with cancellation and
//! bounded parse concurrency; [`build_adapters`] assembles the adapter set
//! for a resource kind from application config.

pub mod collect;
pub mod credentials;
pub mod enrich;
pub mod error;
pub mod http;
pub mod provider;
pub mod providers;
mod rate_limit;
pub mod registry;
pub mod types;

pub use collect::{collect, CancelFlag, CollectOptions, ProviderOutcome, ProviderReport};
pub use credentials::{Credential, CredentialRing};
pub use error::ScraperError;
pub use http::HttpSettings;
pub use provider::{ProviderAdapter, ProviderKind, ProviderRow, RawItem, SearchContext};
pub use registry::build_adapters;
