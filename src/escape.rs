//! The escape/unescape codec (§4.4): entity encoding on serialization,
//! entity decoding on parse.

/// Entity-encodes `text` for use in element/comment content.
///
/// Escapes `&`, `<`, `>`. Quotes are left alone -- only attribute values
/// additionally escape `"` (§4.4, §6.4).
pub fn escape_content(text: &str) -> String {
    escape_impl(text, false)
}

/// Entity-encodes `text` for use inside a double-quoted attribute value.
///
/// Escapes `&`, `<`, `>`, `"`.
pub fn escape_attribute(text: &str) -> String {
    escape_impl(text, true)
}

fn escape_impl(text: &str, is_attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if is_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Entity-decodes `text`, recognizing `&amp; &lt; &gt; &quot; &apos;` and
/// numeric decimal (`&#NNN;`) and hex (`&#xHHH;`) character references.
///
/// Unknown entity references are left verbatim -- this never fails (§4.4).
pub fn unescape(text: &str) -> String {
    if !text.as_bytes().contains(&b'&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            if let Some((decoded, consumed)) = decode_one(&text[i..]) {
                out.push_str(&decoded);
                i += consumed;
                continue;
            }
        }
        // Advance by one full `char`, not one byte, to stay UTF-8 safe.
        let ch = text[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Attempts to decode a single entity or character reference starting at
/// the `&` of `s`. Returns the decoded text and the number of bytes of `s`
/// it consumed, or `None` if `s` does not start with a recognized,
/// terminated reference.
fn decode_one(s: &str) -> Option<(String, usize)> {
    let rest = &s[1..];
    let semi = rest.find(';')?;
    let body = &rest[..semi];
    let consumed = 1 + semi + 1;

    let decoded = match body {
        "amp" => '&'.to_string(),
        "lt" => '<'.to_string(),
        "gt" => '>'.to_string(),
        "quot" => '"'.to_string(),
        "apos" => '\''.to_string(),
        _ if body.starts_with("#x") || body.starts_with("#X") => {
            let code = u32::from_str_radix(&body[2..], 16).ok()?;
            char::from_u32(code)?.to_string()
        }
        _ if body.starts_with('#') => {
            let code = body[1..].parse::<u32>().ok()?;
            char::from_u32(code)?.to_string()
        }
        _ => return None,
    };

    Some((decoded, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_content_handles_reserved_chars() {
        assert_eq!(escape_content("a & b < c > d"), "a &amp; b &lt; c &gt; d");
        assert_eq!(escape_content("quote \" stays"), "quote \" stays");
    }

    #[test]
    fn escape_attribute_also_escapes_quotes() {
        assert_eq!(escape_attribute("a \"b\" & c"), "a &quot;b&quot; &amp; c");
    }

    #[test]
    fn unescape_named_and_numeric_refs() {
        assert_eq!(unescape("&amp;&lt;&gt;&quot;&apos;"), "&<>\"'");
        assert_eq!(unescape("&#65;&#x42;"), "AB");
    }

    #[test]
    fn unescape_leaves_unknown_refs_verbatim() {
        assert_eq!(unescape("a &bogus; b"), "a &bogus; b");
        assert_eq!(unescape("a & b"), "a & b");
    }

    #[test]
    fn round_trip_escape_unescape() {
        let original = "He said \"hi & bye < now > then\"";
        assert_eq!(unescape(&escape_attribute(original)), original);
    }
}
