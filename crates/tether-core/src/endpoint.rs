//! Endpoint URLs and instance classification.
//!
//! The platform has one well-known public instance and a local desktop app
//! reachable on loopback. Everything else is an enterprise instance, which
//! follows a different identity-verification path.

use url::Url;

/// Canonical URL of the public instance.
pub const DOTCOM_URL: &str = "https://tether.dev/";

/// Canonical URL of the local desktop app instance.
pub const LOCAL_APP_URL: &str = "http://localhost:3080/";

/// Port the local desktop app listens on.
const LOCAL_APP_PORT: u16 = 3080;

/// Normalizes a user-supplied endpoint: adds an `https://` scheme when none
/// is present and guarantees a single trailing slash.
///
/// Endpoints are used as storage keys, so every write path normalizes first.
pub fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    if with_scheme.ends_with('/') {
        with_scheme
    } else {
        format!("{with_scheme}/")
    }
}

/// Returns true when the endpoint is the public instance.
pub fn is_dotcom(endpoint: &str) -> bool {
    normalize_endpoint(endpoint) == DOTCOM_URL
}

/// Returns true when the endpoint is the local desktop app: `localhost` or
/// `127.0.0.1` on the app port.
pub fn is_local_app(endpoint: &str) -> bool {
    let Ok(url) = Url::parse(&normalize_endpoint(endpoint)) else {
        return false;
    };
    let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1"));
    loopback && url.port() == Some(LOCAL_APP_PORT)
}
