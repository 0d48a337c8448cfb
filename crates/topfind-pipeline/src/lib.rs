//! Turns provider results into filtered, tagged resource tables.
//!
//! A search flows through query expansion, concurrent collection, schema
//! normalization, taxonomy tagging, deduplication, and the filter engine
//! before being exported to CSV. [`run_search`] drives the whole sequence.

pub mod dedup;
pub mod error;
pub mod export;
pub mod filter;
pub mod matcher;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod text;

pub use dedup::{dedupe, dedupe_by_natural_key};
pub use error::{PipelineError, SchemaError};
pub use export::{export_table, write_csv, ExportLayout};
pub use filter::{
    default_spec, FilterChain, FilterContext, FilterEngine, FilterOutcome, FilterStep,
};
pub use matcher::{tag, Tags, TaxonomyMatcher};
pub use pipeline::{
    run_search, run_searches, SearchJob, SearchOptions, SearchReport, SearchRequest, StageCount,
};
pub use query::expand;
pub use schema::{concat, normalize, validate_mappings, NormalizeContext};
