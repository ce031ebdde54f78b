//! Environment variable names read by [`crate::config::LoggerConfig::from_env`].
//!
//! The logger itself never touches the environment after initialization.

/// Cloud project id. Empty or unset selects local console output.
pub const CTXLOG_PROJECT_ID_ENV: &str = "CTXLOG_PROJECT_ID";

/// Threshold level, by name (`info`) or ordinal (`4`).
pub const CTXLOG_LEVEL_ENV: &str = "CTXLOG_LEVEL";

/// `true`/`false`, switches to the development output format.
pub const CTXLOG_DEVELOPMENT_ENV: &str = "CTXLOG_DEVELOPMENT";

/// Field name for the request id label.
pub const CTXLOG_KEY_REQUEST_ID_ENV: &str = "CTXLOG_KEY_REQUEST_ID";

/// Field name for the user id label.
pub const CTXLOG_KEY_USER_ID_ENV: &str = "CTXLOG_KEY_USER_ID";

/// Field name for error messages.
pub const CTXLOG_KEY_ERROR_ENV: &str = "CTXLOG_KEY_ERROR";

/// Field name for the scope label.
pub const CTXLOG_KEY_SCOPE_ENV: &str = "CTXLOG_KEY_SCOPE";

