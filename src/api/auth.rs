//! Shared-secret header checks for the trigger endpoints.
//!
//! Two independent secrets guard the surface: the cron scheduler secret
//! (`x-cron-secret`) for sync triggers and the admin API key
//! (`x-admin-key`) for manual operations. Rejections use a single
//! generic message so a caller cannot tell which secret an endpoint
//! expects.

use axum::http::HeaderMap;

use crate::error::SyncError;

/// Header carrying the cron scheduler secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Header carrying the admin API key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Verifies the `x-cron-secret` header against the configured secret.
///
/// # Errors
///
/// [`SyncError::Unauthorized`] when the header is missing, unreadable,
/// or does not match.
pub fn require_cron_secret(headers: &HeaderMap, expected: &str) -> Result<(), SyncError> {
    require_header(headers, CRON_SECRET_HEADER, expected)
}

/// Verifies the `x-admin-key` header against the configured key.
///
/// # Errors
///
/// [`SyncError::Unauthorized`] when the header is missing, unreadable,
/// or does not match.
pub fn require_admin_key(headers: &HeaderMap, expected: &str) -> Result<(), SyncError> {
    require_header(headers, ADMIN_KEY_HEADER, expected)
}

fn require_header(headers: &HeaderMap, name: &str, expected: &str) -> Result<(), SyncError> {
    let presented = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(SyncError::Unauthorized)?;
    if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(SyncError::Unauthorized)
    }
}

/// Length-leaking-only comparison: the secret bytes themselves are
/// compared without short-circuiting.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
