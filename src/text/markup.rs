/// Inline tags the extractor may leave in a line and that survive into XHTML.
const INLINE_TAGS: [&str; 5] = ["b", "i", "em", "strong", "u"];

/// Remove `<...>` tags from a line. An unterminated `<` is kept as text.
pub fn strip_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        result.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    result.push_str(rest);
    result
}

/// Tag-stripped, trimmed form of a line, used only for classification.
pub fn clean_line(line: &str) -> String {
    strip_tags(line.trim()).trim().to_string()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Escape text for an XHTML body while keeping simple inline formatting tags.
///
/// Only `<b>`, `<i>`, `<em>`, `<strong>` and `<u>` (without attributes) pass
/// through. Closing tags that do not match the innermost open tag are escaped
/// as text, and tags still open at the end are closed so the fragment stays
/// well-formed.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut open: Vec<&'static str> = Vec::new();
    let mut rest = text;

    while let Some(pos) = rest.find('<') {
        out.push_str(&escape_xml(&rest[..pos]));
        rest = &rest[pos..];

        match parse_inline_tag(rest) {
            Some((name, closing, len)) => {
                if !closing {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                    open.push(name);
                } else if open.last() == Some(&name) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                    open.pop();
                } else {
                    out.push_str(&escape_xml(&rest[..len]));
                }
                rest = &rest[len..];
            }
            None => {
                out.push_str("&lt;");
                rest = &rest[1..];
            }
        }
    }
    out.push_str(&escape_xml(rest));

    while let Some(name) = open.pop() {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
    out
}

/// Recognize `<name>` or `</name>` for a whitelisted inline tag at the start of `s`.
fn parse_inline_tag(s: &str) -> Option<(&'static str, bool, usize)> {
    let close = s.find('>')?;
    let inner = &s[1..close];
    let (closing, name) = match inner.strip_prefix('/') {
        Some(name) => (true, name),
        None => (false, inner),
    };
    INLINE_TAGS
        .iter()
        .find(|tag| tag.eq_ignore_ascii_case(name))
        .map(|tag| (*tag, closing, close + 1))
}
