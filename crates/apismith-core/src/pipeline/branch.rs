//! Branch rule and credential merge.

use crate::types::{ApiDescription, Route};

/// Whether any endpoint needs a credential.
///
/// An API with no endpoints needs none.
#[must_use]
pub fn requires_credential(api: &ApiDescription) -> bool {
    api.endpoints.iter().any(|endpoint| endpoint.requires_api_key)
}

/// Choose the stage that follows extraction.
///
/// ```rust
/// use apismith_core::pipeline::select_route;
/// use apismith_core::{ApiDescription, Endpoint, Route};
///
/// let open = ApiDescription::new("Open", "", vec![Endpoint::new("GET", "/status")]);
/// assert_eq!(select_route(&open), Route::CodeGen);
///
/// let locked = ApiDescription::new(
///     "Locked",
///     "",
///     vec![Endpoint::new("POST", "/timer/").with_requires_api_key(true)],
/// );
/// assert_eq!(select_route(&locked), Route::Credential);
/// ```
#[must_use]
pub fn select_route(api: &ApiDescription) -> Route {
    if requires_credential(api) {
        Route::Credential
    } else {
        Route::CodeGen
    }
}

/// Copy the collected credential onto every endpoint that requires one.
///
/// Endpoints that do not require a credential are left untouched, and nothing
/// changes when no credential was collected. Returns the number of endpoints
/// updated.
pub fn merge_credential(api: &mut ApiDescription, credential: Option<&str>) -> usize {
    let Some(credential) = credential else {
        return 0;
    };

    let mut merged = 0;
    for endpoint in api.endpoints.iter_mut().filter(|e| e.requires_api_key) {
        endpoint.api_key = Some(credential.to_string());
        merged += 1;
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Endpoint;
    use proptest::prelude::*;

    fn api_with_flags(flags: &[bool]) -> ApiDescription {
        let endpoints = flags
            .iter()
            .enumerate()
            .map(|(i, &flag)| Endpoint::new("GET", format!("/e{i}")).with_requires_api_key(flag))
            .collect();
        ApiDescription::new("Test API", "https://api.example.com", endpoints)
    }

    #[test]
    fn test_empty_endpoints_select_code_gen() {
        let api = api_with_flags(&[]);
        assert!(!requires_credential(&api));
        assert_eq!(select_route(&api), Route::CodeGen);
    }

    #[test]
    fn test_single_locked_endpoint_selects_credential() {
        let api = api_with_flags(&[false, false, true]);
        assert_eq!(select_route(&api), Route::Credential);
    }

    #[test]
    fn test_merge_only_touches_locked_endpoints() {
        let mut api = api_with_flags(&[true, false, true]);

        let merged = merge_credential(&mut api, Some("key-123"));

        assert_eq!(merged, 2);
        assert_eq!(api.endpoints[0].api_key.as_deref(), Some("key-123"));
        assert!(api.endpoints[1].api_key.is_none());
        assert_eq!(api.endpoints[2].api_key.as_deref(), Some("key-123"));
    }

    #[test]
    fn test_merge_without_credential_is_noop() {
        let mut api = api_with_flags(&[true, false]);
        let before = api.clone();

        assert_eq!(merge_credential(&mut api, None), 0);
        assert_eq!(api, before);
    }

    #[test]
    fn test_merge_accepts_empty_credential() {
        let mut api = api_with_flags(&[true]);
        merge_credential(&mut api, Some(""));
        assert_eq!(api.endpoints[0].api_key.as_deref(), Some(""));
    }

    proptest! {
        #[test]
        fn test_route_iff_any_flag(flags in prop::collection::vec(any::<bool>(), 0..16)) {
            let api = api_with_flags(&flags);
            let expected = if flags.iter().any(|&f| f) { Route::Credential } else { Route::CodeGen };
            prop_assert_eq!(select_route(&api), expected);
            // evaluation has no side effects
            prop_assert_eq!(select_route(&api), expected);
        }

        #[test]
        fn test_merge_broadcast(flags in prop::collection::vec(any::<bool>(), 0..16), key in "[a-zA-Z0-9]{0,12}") {
            let mut api = api_with_flags(&flags);
            merge_credential(&mut api, Some(&key));

            for (endpoint, &flag) in api.endpoints.iter().zip(&flags) {
                if flag {
                    prop_assert_eq!(endpoint.api_key.as_deref(), Some(key.as_str()));
                } else {
                    prop_assert!(endpoint.api_key.is_none());
                }
            }
        }
    }
}
