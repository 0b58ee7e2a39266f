//! The `redirect=<path>` query parameter shared by the guard and sign-in view.
//!
//! The guard encodes the original location once; the sign-in view decodes it
//! exactly once. Only local absolute paths are honored as targets.

pub const REDIRECT_PARAM: &str = "redirect";
pub const DEFAULT_TARGET: &str = "/";

/// Sign-in URL carrying `original` as the return target.
#[must_use]
pub fn signin_url(signin_path: &str, original: &str) -> String {
    format!("{signin_path}?{REDIRECT_PARAM}={}", urlencoding::encode(original))
}

/// The decoded `redirect` value from a query string (leading `?` optional).
#[must_use]
pub fn redirect_param(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| *key == REDIRECT_PARAM)
        .and_then(|(_, value)| decode_component(value))
        .filter(|value| !value.is_empty())
}

/// Where to go after a successful sign-in: the redirect parameter wins over `/`.
#[must_use]
pub fn post_signin_target(query: &str) -> String {
    match redirect_param(query) {
        Some(target) if is_local_path(&target) => target,
        Some(target) => {
            tracing::warn!(%target, "ignoring non-local redirect target");
            DEFAULT_TARGET.to_owned()
        }
        None => DEFAULT_TARGET.to_owned(),
    }
}

/// Query portion of a location, without the `?` and any fragment.
#[must_use]
pub fn query_of(location: &str) -> &str {
    let Some(start) = location.find('?') else {
        return "";
    };
    let query = &location[start + 1..];
    match query.find('#') {
        Some(end) => &query[..end],
        None => query,
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

fn decode_component(value: &str) -> Option<String> {
    // Form encoding may carry spaces as '+'.
    let value = value.replace('+', " ");
    match urlencoding::decode(&value) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            tracing::warn!(error = %e, "redirect parameter is not valid UTF-8");
            None
        }
    }
}

#[cfg(test)]
#[path = "redirect_test.rs"]
mod tests;
