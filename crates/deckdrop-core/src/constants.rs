/// Retention applied to stored decks when `FILE_RETENTION_DAYS` is not set.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Upper bound for `FILE_RETENTION_DAYS`, roughly a century.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Prefix for object keys and public ids on remote backends.
pub const DEFAULT_KEY_PREFIX: &str = "presentations";

/// Route under `BASE_URL` that serves locally stored decks.
pub const LOCAL_DOWNLOAD_ROUTE: &str = "api/download";

/// Default Salesforce REST API version, interpolated as `/services/data/v{version}`.
pub const DEFAULT_SALESFORCE_API_VERSION: &str = "59.0";

pub const DEFAULT_SALESFORCE_LOGIN_URL: &str = "https://login.salesforce.com";

pub const DEFAULT_CLOUDINARY_API_URL: &str = "https://api.cloudinary.com";
