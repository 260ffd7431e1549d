//! Flat key/value decoder for query strings and `#!` fragments.

use crate::context::Params;

/// Decodes `k=v&k2=v2;k3` into a flat map.
///
/// Segments are separated by `&` or `;`; empty ones are ignored. The first
/// `=` splits key from value, a segment without one maps to itself. `+` is a
/// space, then percent-escapes are decoded (invalid UTF-8 is replaced, never
/// rejected). A repeated key keeps its last value.
///
/// ```rust
/// use tsugi::parse_params;
///
/// let p = parse_params("a+b=c+d&&x=%E2%9C%93");
/// assert_eq!(p["a b"], "c d");
/// assert_eq!(p["x"], "✓");
/// ```
pub fn parse_params(query: &str) -> Params {
    let mut params = Params::new();
    for pair in query.split(['&', ';']) {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, pair));
        params.insert(decode(key), decode(value));
    }
    params
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
