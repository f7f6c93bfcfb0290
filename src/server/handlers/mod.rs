//! HTTP handlers, grouped by API surface.

pub mod jobs;
pub mod mockup;
pub mod templates;

use axum::http::HeaderMap;

/// Header carrying the caller identity. Identity issuance (sessions, JWT)
/// lives outside this service; ownership checks only compare strings.
pub const USER_HEADER: &str = "x-maqueta-user";

/// Extract the caller identity, if any.
pub fn caller(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Ownership check: a record with an owner is only visible to that owner.
pub fn owner_allows(record_owner: &Option<String>, caller: &Option<String>) -> bool {
    match record_owner {
        None => true,
        Some(owner) => caller.as_deref() == Some(owner.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_allows() {
        assert!(owner_allows(&None, &None));
        assert!(owner_allows(&None, &Some("bob".into())));
        assert!(owner_allows(&Some("bob".into()), &Some("bob".into())));
        assert!(!owner_allows(&Some("bob".into()), &Some("eve".into())));
        assert!(!owner_allows(&Some("bob".into()), &None));
    }
}
