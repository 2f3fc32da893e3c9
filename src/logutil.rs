//! Single-line previews of response bodies for the log.

const MAX_PREVIEW: usize = 200;

/// Escape control characters and cut long bodies so one response is one log line.
pub fn preview(body: &str) -> String {
    let mut out = String::with_capacity(body.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in body.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn escapes_and_truncates() {
        assert_eq!(preview("<h1>\nOops</h1>"), "<h1>\\nOops</h1>");
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 201);
        assert!(p.ends_with('…'));
    }
}
