use std::env;

/// Application-level constants
pub const APP_NAME: &str = "MedTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The single patient every call is made for in this build.
pub const DEMO_PATIENT_ID: &str = "demo_patient_123";

/// Remote medication service used when `MEDTRACK_API_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// TCP connect bound. Requests themselves are never timed out.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const API_URL_ENV: &str = "MEDTRACK_API_URL";
const CONNECT_TIMEOUT_ENV: &str = "MEDTRACK_CONNECT_TIMEOUT_SECS";

/// Tracing filter applied when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medtrack=info,medtrack_lib=info,reqwest=warn"
}

/// Base URL of the remote medication service, without a trailing slash.
pub fn api_base_url() -> String {
    let raw = env::var(API_URL_ENV).unwrap_or_else(|_| {
        tracing::debug!("{API_URL_ENV} not set, using default: {DEFAULT_API_BASE_URL}");
        DEFAULT_API_BASE_URL.to_string()
    });
    normalize_base_url(&raw)
}

/// Connect timeout in seconds. Falls back to the default on a malformed value.
pub fn connect_timeout_secs() -> u64 {
    match env::var(CONNECT_TIMEOUT_ENV) {
        Ok(value) => value.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {CONNECT_TIMEOUT_ENV} value {value:?}: {e}");
            DEFAULT_CONNECT_TIMEOUT_SECS
        }),
        Err(_) => DEFAULT_CONNECT_TIMEOUT_SECS,
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slashes_trimmed() {
        assert_eq!(normalize_base_url("http://svc:3000//"), "http://svc:3000");
    }

    #[test]
    fn blank_base_url_falls_back_to_default() {
        assert_eq!(normalize_base_url("   "), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn demo_identity_is_fixed() {
        assert_eq!(DEMO_PATIENT_ID, "demo_patient_123");
    }

    #[test]
    fn app_name_is_medtrack() {
        assert_eq!(APP_NAME, "MedTrack");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn log_filter_covers_crate() {
        assert!(default_log_filter().contains("medtrack_lib=info"));
    }
}
