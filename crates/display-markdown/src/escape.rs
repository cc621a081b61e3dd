/// Characters that need a backslash to appear literally in markdown input.
pub const CONTROL_CHARACTERS: &[u8] = b"[]()*_-\\";

pub fn is_control_character(byte: u8) -> bool {
    CONTROL_CHARACTERS.contains(&byte)
}

/// Escapes untrusted text so that [`crate::parse_markdown`] renders it verbatim.
pub fn escaped_plaintext_for_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() && is_control_character(c as u8) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Drops the backslash in front of every escaped control character.
pub(crate) fn unescape(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut result = String::with_capacity(text.len());
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1).is_some_and(|b| is_control_character(*b)) {
            result.push_str(&text[plain_start..i]);
            plain_start = i + 1;
            i += 2;
        } else {
            i += 1;
        }
    }

    result.push_str(&text[plain_start..]);
    result
}

/// Finds `pattern` at or after `from`, skipping escaped characters.
pub(crate) fn find_unescaped(text: &str, from: usize, pattern: &[u8]) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1).is_some_and(|b| is_control_character(*b)) {
            i += 2;
        } else if bytes[i..].starts_with(pattern) {
            return Some(i);
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_control_character() {
        assert_eq!(
            escaped_plaintext_for_markdown("[a](b) *c* _d_ -e \\"),
            "\\[a\\]\\(b\\) \\*c\\* \\_d\\_ \\-e \\\\"
        );
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(escaped_plaintext_for_markdown("héllo wörld!"), "héllo wörld!");
        assert_eq!(escaped_plaintext_for_markdown(""), "");
    }

    #[test]
    fn unescape_keeps_non_control_escapes() {
        assert_eq!(unescape("a\\*b\\nc\\"), "a*b\\nc\\");
    }

    #[test]
    fn find_skips_escaped() {
        assert_eq!(find_unescaped("a\\**b**", 0, b"**"), Some(5));
        assert_eq!(find_unescaped("a\\*", 0, b"*"), None);
    }
}
