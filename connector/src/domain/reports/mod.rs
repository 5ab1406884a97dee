//! Report retrieval
//!
//! - `types` - Report definitions, rows and page contents
//! - `query` - Report request building
//! - `parse` - Defensive page decoding
//! - `catalog` - Report definitions and their storage levels
//! - `fetcher` - Paginated fetch feeding the record store

mod catalog;
mod fetcher;
mod parse;
mod query;
mod types;

pub use catalog::{CatalogError, LevelMap, ReportCatalog, required_dimensions};
pub use fetcher::{FetchError, FetchSettings, ReportFetcher};
pub use parse::{MalformedPage, decode_page, next_page_token, parse_page};
pub use query::{API_NAME_PREFIX, DateRange, DimensionSpec, MetricSpec, QueryParams};
pub use types::{MetaDescriptor, MetricValue, PageResult, ReportDefinition, RowRecord};
