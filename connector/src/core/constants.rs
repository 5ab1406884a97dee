// =============================================================================
// Application Identity
// =============================================================================

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".ga-connector";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "ga-connector.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "GA_CONNECTOR_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "GA_CONNECTOR_LOG";

/// Filter used when neither ENV_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info,ga_connector=info";

// =============================================================================
// Environment Variables - Run
// =============================================================================

/// Day to extract, `YYYY-MM-DD`
pub const ENV_DAY_OF_DATA_CAPTURE: &str = "DAY_OF_DATA_CAPTURE";

/// Reporting view to query
pub const ENV_VIEW_ID: &str = "VIEW_ID";

/// Service-account key file
pub const ENV_KEY_FILE_LOCATION: &str = "KEY_FILE_LOCATION";

/// Courtesy delay between page requests in milliseconds
pub const ENV_PAGE_DELAY_MS: &str = "GA_CONNECTOR_PAGE_DELAY_MS";

/// Consecutive rowless pages tolerated before a fetch aborts
pub const ENV_MAX_EMPTY_PAGES: &str = "GA_CONNECTOR_MAX_EMPTY_PAGES";

// =============================================================================
// Environment Variables - Store
// =============================================================================

pub const ENV_STORE_BACKEND: &str = "GA_CONNECTOR_STORE";
pub const ENV_CLICKHOUSE_URL: &str = "GA_CONNECTOR_CLICKHOUSE_URL";
pub const ENV_CLICKHOUSE_DATABASE: &str = "GA_CONNECTOR_CLICKHOUSE_DATABASE";
pub const ENV_CLICKHOUSE_USER: &str = "GA_CONNECTOR_CLICKHOUSE_USER";
pub const ENV_CLICKHOUSE_PASSWORD: &str = "GA_CONNECTOR_CLICKHOUSE_PASSWORD";

/// Per-write timeout in seconds
pub const ENV_WRITE_TIMEOUT_SECS: &str = "GA_CONNECTOR_WRITE_TIMEOUT_SECS";

// =============================================================================
// Reporting API
// =============================================================================

/// Batch report endpoint
pub const ANALYTICS_REPORTING_ENDPOINT: &str =
    "https://analyticsreporting.googleapis.com/v4/reports:batchGet";

/// OAuth scope for read-only report access
pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

/// Rows per page
pub const DEFAULT_PAGE_SIZE: u32 = 10_000;

/// Largest page size the API accepts
pub const MAX_PAGE_SIZE: u32 = 100_000;

/// Courtesy delay before each page request
pub const DEFAULT_PAGE_DELAY_MS: u64 = 100;

/// HTTP timeout for one page request
pub const SOURCE_REQUEST_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Store Defaults
// =============================================================================

/// Fixed per-write timeout
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 3600;

pub const DEFAULT_CLICKHOUSE_URL: &str = "http://localhost:8123";
pub const DEFAULT_CLICKHOUSE_DATABASE: &str = "default";
