//! HTML escaping for text content and attribute values (spec.md §4.6).

/// Escapes `&`, `<` and `>` for safe placement in element/text content.
pub fn html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes `&`, `<`, `>` and `"` for safe placement inside a double-quoted
/// attribute value (spec.md §4.6).
pub fn attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_special_characters() {
        assert_eq!(html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn escapes_attribute_quotes() {
        assert_eq!(attr(r#"say "hi" & bye"#), "say &quot;hi&quot; &amp; bye");
    }

    #[test]
    fn escapes_attribute_angle_brackets() {
        assert_eq!(attr("a < b > c"), "a &lt; b &gt; c");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(html("plain text"), "plain text");
        assert_eq!(attr("plain text"), "plain text");
    }
}
