//! Carrying a connection code in a URL fragment as `#join=<code>`.
//!
//! Codes only contain base64 characters, `:` and the id alphabet, all of
//! which are legal in a fragment, so no percent-encoding is needed.

const JOIN_KEY: &str = "join=";

/// Splits a URL into the part before `#` and the fragment (without `#`).
fn split_fragment(url: &str) -> (&str, &str) {
    url.split_once('#').unwrap_or((url, ""))
}

fn other_params(fragment: &str) -> impl Iterator<Item = &str> {
    fragment
        .split('&')
        .filter(|param| !param.is_empty() && !param.starts_with(JOIN_KEY))
}

/// Extracts the code from a URL or bare fragment (`#join=...` or
/// `join=...`). Returns `None` when there is no non-empty `join` value.
pub fn join_code_from_fragment(url_or_fragment: &str) -> Option<&str> {
    let fragment = match url_or_fragment.split_once('#') {
        Some((_, fragment)) => fragment,
        None => url_or_fragment,
    };
    fragment
        .split('&')
        .find_map(|param| param.strip_prefix(JOIN_KEY))
        .filter(|code| !code.is_empty())
}

/// Returns `url` with its fragment's `join` value set to `code`, keeping
/// any other fragment parameters.
pub fn with_join_code(url: &str, code: &str) -> String {
    let (base, fragment) = split_fragment(url);
    let mut params: Vec<&str> = other_params(fragment).collect();
    let join = format!("{JOIN_KEY}{code}");
    params.push(&join);
    format!("{base}#{}", params.join("&"))
}

/// Returns `url` without a `join` fragment parameter. The `#` is dropped
/// when nothing else remains in the fragment.
pub fn without_join_code(url: &str) -> String {
    let (base, fragment) = split_fragment(url);
    let params: Vec<&str> = other_params(fragment).collect();
    if params.is_empty() {
        base.to_string()
    } else {
        format!("{base}#{}", params.join("&"))
    }
}
