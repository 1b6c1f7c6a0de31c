/// Split a chapter body into paragraphs.
///
/// A line opens a new paragraph when the open paragraph's last fragment ends
/// with a period and the line begins with a character that is its own upper
/// case. Everything else is joined to the open paragraph with one space.
pub fn detect_paragraphs<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in lines {
        let stripped = line.as_ref().trim();
        if stripped.is_empty() {
            continue;
        }

        if starts_paragraph(stripped, &current) {
            paragraphs.push(current.join(" "));
            current.clear();
        }
        current.push(stripped);
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

fn starts_paragraph(line: &str, current: &[&str]) -> bool {
    let Some(last) = current.last() else {
        return false;
    };
    let Some(first) = line.chars().next() else {
        return false;
    };
    last.ends_with('.') && first.to_uppercase().eq(std::iter::once(first))
}
