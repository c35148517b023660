/// Escape `<` and `>` to their named entities, leaving everything else alone.
///
/// Indexed content and query terms both go through this, so match offsets
/// computed against normalized content can be rendered without re-escaping.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Length in characters, the unit match ranges are expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_angle_brackets() {
        assert_eq!(normalize("<script>"), "&lt;script&gt;");
        assert_eq!(normalize("a < b > c"), "a &lt; b &gt; c");
    }

    #[test]
    fn leaves_other_markup_characters() {
        assert_eq!(normalize("Tom & \"Jerry\" 'x'"), "Tom & \"Jerry\" 'x'");
    }

    #[test]
    fn is_idempotent() {
        for s in ["", "<>", "&lt;", "Vec<Option<T>>", "中文 <b>粗体</b>"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
            assert!(!once.contains('<') && !once.contains('>'));
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(char_len("héllo"), 5);
        assert_eq!(char_len("，。"), 2);
    }
}
