//! Shared request parsing and HTML helpers for route handlers.

use crate::error::{TrackerError, TrackerResult};

/// Parse URL-encoded form body into key-value pairs.
/// Handles `key=value&key2=value2` format (from HTMX POST bodies).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((percent_decode(key), percent_decode(val)))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Multi-byte UTF-8 sequences are
/// reassembled; invalid sequences become U+FFFD.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match hex_pair(bytes[i + 1], bytes[i + 2]) {
                    Some(val) => {
                        out.push(val);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Helper to get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Non-empty parameter, or `MissingField`.
pub fn require_param<'a>(
    params: &'a [(String, String)],
    key: &'static str,
) -> TrackerResult<&'a str> {
    match get_param(params, key) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TrackerError::MissingField(key)),
    }
}

/// Required integer parameter.
pub fn require_int<T: std::str::FromStr>(
    params: &[(String, String)],
    key: &'static str,
) -> TrackerResult<T> {
    let raw = require_param(params, key)?;
    raw.trim()
        .parse()
        .map_err(|_| TrackerError::invalid(key, raw))
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a string as a JavaScript literal safe to embed in a `<script>`.
pub fn js_string(input: &str) -> String {
    serde_json::to_string(input)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

/// Red inline error fragment.
pub fn error_fragment(err: &TrackerError) -> String {
    log::warn!("request rejected: {}", err);
    format!(
        r#"<span class="text-red-700 tracker-error">{}</span>"#,
        escape_html(&err.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_form_body_works() {
        let pairs = parse_form_body("name=Goblin+1&button=damage_button&value=4");
        assert_eq!(pairs.len(), 3);
        assert_eq!(get_param(&pairs, "name"), Some("Goblin 1"));
        assert_eq!(get_param(&pairs, "value"), Some("4"));
    }

    #[test]
    fn parse_form_body_empty() {
        assert!(parse_form_body("").is_empty());
        assert!(parse_form_body("&&").is_empty());
    }

    #[test]
    fn percent_decode_hex_and_utf8() {
        assert_eq!(percent_decode("hello%20world"), "hello world");
        assert_eq!(percent_decode("Bj%C3%B6rn"), "Björn");
        assert_eq!(percent_decode("%7B%22a%22%3A1%7D"), r#"{"a":1}"#);
    }

    #[test]
    fn percent_decode_keeps_stray_percent() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("50%zz"), "50%zz");
    }

    #[test]
    fn parse_query_strips_prefix() {
        let pairs = parse_query("?name=Aria");
        assert_eq!(get_param(&pairs, "name"), Some("Aria"));
    }

    #[test]
    fn required_params() {
        let pairs = parse_form_body("value=12&empty=&bad=x");
        assert_eq!(require_int::<i32>(&pairs, "value"), Ok(12));
        assert_eq!(
            require_param(&pairs, "empty"),
            Err(TrackerError::MissingField("empty"))
        );
        assert_eq!(
            require_int::<i32>(&pairs, "bad"),
            Err(TrackerError::invalid("bad", "x"))
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Orc" & 'Elf'</b>"#),
            "&lt;b&gt;&quot;Orc&quot; &amp; &#39;Elf&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn js_string_is_script_safe() {
        assert_eq!(js_string("a\"b"), r#""a\"b""#);
        assert_eq!(js_string("</script>"), r#""<\/script>""#);
    }
}
