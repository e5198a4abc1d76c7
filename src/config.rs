use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Healova";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default backend base URL; override with HEALOVA_API_URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Env var that overrides the backend base URL.
pub const API_URL_ENV: &str = "HEALOVA_API_URL";

/// Both session cookies expire after 7 days.
pub const COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// Delay between a successful submission and the dashboard redirect, long
/// enough for the success message to be read.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Language tag attached to consultation payloads when the patient has not
/// picked one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Backend base URL, from the environment or the default. A trailing slash
/// is accepted and trimmed by the API client.
pub fn api_base_url() -> String {
    std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
}

/// Tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "healova_core=info"
}

/// Get the application data directory
/// ~/Healova/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Healova")
}

/// File holding the persisted session cookies.
pub fn cookie_store_path() -> PathBuf {
    app_data_dir().join("session_cookies.json")
}
