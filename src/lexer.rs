//! Line classification and whitespace tokenizing (spec section 4.1 / 6.2).

/// Matches the C tokenizer's notion of whitespace: space, tab, newline.
pub fn is_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r'
}

/// True for a line that is all whitespace (including the empty string).
pub fn is_blank_line(line: &str) -> bool {
    line.chars().all(is_whitespace)
}

/// True for a line whose first non-whitespace character is `;`.
pub fn is_comment_line(line: &str) -> bool {
    line.trim_start_matches(is_whitespace).starts_with(';')
}

/// A line that contributes nothing to parsing: blank, or a comment.
pub fn is_skippable_line(line: &str) -> bool {
    is_blank_line(line) || is_comment_line(line)
}

/// Split a line into whitespace-separated tokens, the way
/// `tokens_init`/`is_whitespace` does in the original tool. Used by the
/// preassembler to decide whether a line is a single bare macro-name
/// invocation.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(is_whitespace).filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines() {
        assert!(is_blank_line(""));
        assert!(is_blank_line("   \t"));
        assert!(!is_blank_line("mov r1, r2"));
    }

    #[test]
    fn comment_lines() {
        assert!(is_comment_line("; a comment"));
        assert!(is_comment_line("   ; indented comment"));
        assert!(!is_comment_line("mov r1, r2 ; trailing comment is not a comment line"));
    }

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("  mov   r1, r2  "), vec!["mov", "r1,", "r2"]);
    }

    #[test]
    fn tokenize_single_token() {
        assert_eq!(tokenize("MY_MACRO"), vec!["MY_MACRO"]);
    }
}
