//! Statement parser (spec section 4.1) and the reserved-word set used to
//! validate labels and macro names.

use std::collections::HashSet;

use lazy_static::lazy_static;

use crate::lexer::is_whitespace;

const MAX_LABEL_LENGTH: usize = 31;

lazy_static! {
    /// Opcodes, register names, macro keywords, and directive stems
    /// (without the leading dot) — none of these may be used as a label
    /// or macro name.
    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        for word in [
            "mov", "cmp", "add", "sub", "lea", "clr", "not", "inc", "dec",
            "jmp", "bne", "red", "prn", "jsr", "rts", "stop",
            "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7",
            "macr", "endmacr",
            "data", "string", "entry", "extern",
        ] {
            set.insert(word);
        }
        set
    };
}

const DIRECTIVES: [&str; 4] = [".data", ".string", ".entry", ".extern"];

pub fn is_directive(word: &str) -> bool {
    DIRECTIVES.contains(&word)
}

/// Validates a label (or macro) name against spec section 6.2's
/// identifier rule and the reserved-word set. Returns the offending
/// reason on failure.
pub fn validate_label_name(label: &str) -> Result<(), &'static str> {
    if label.is_empty() {
        return Err("empty label not allowed");
    }
    if label.len() > MAX_LABEL_LENGTH {
        return Err("label too long");
    }
    let mut chars = label.chars();
    let first = chars.next().unwrap();
    if !first.is_ascii_alphabetic() {
        return Err("label must start with a letter");
    }
    if !label.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("label contains invalid characters");
    }
    if RESERVED_WORDS.contains(label) {
        return Err("label cannot be a reserved word");
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub instruction: String,
    pub operands: Vec<String>,
}

impl ParsedLine {
    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }
}

/// Split a comma-separated operand list, mirroring `parse_params`:
/// whitespace around commas and operands is ignored, but an empty
/// operand (leading, trailing, or doubled comma) is a syntax error, as
/// is two operand tokens with no comma between them.
pub fn split_operands(text: &str) -> Result<Vec<String>, &'static str> {
    let mut operands = Vec::new();
    let mut rest = text;

    loop {
        rest = rest.trim_start_matches(is_whitespace);
        if rest.is_empty() {
            break;
        }

        let end = rest
            .find(|c: char| c == ',' || is_whitespace(c))
            .unwrap_or(rest.len());
        let token = &rest[..end];
        if token.is_empty() {
            return Err("invalid parameter structure");
        }
        operands.push(token.to_string());
        rest = &rest[end..];
        rest = rest.trim_start_matches(is_whitespace);

        if rest.is_empty() {
            break;
        }
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma;
            continue;
        }
        return Err("invalid parameter structure");
    }

    Ok(operands)
}

/// Parse one logical line (already known non-blank, non-comment) into a
/// [`ParsedLine`]. Returns the diagnostic message on failure.
pub fn parse_line(line: &str) -> Result<ParsedLine, &'static str> {
    let trimmed = line.trim_start_matches(is_whitespace);

    let first_end = trimmed
        .find(is_whitespace)
        .unwrap_or(trimmed.len());
    let first_token = &trimmed[..first_end];
    let mut rest = &trimmed[first_end..];

    let (label, instruction) = if let Some(name) = first_token.strip_suffix(':') {
        validate_label_name(name)?;

        rest = rest.trim_start_matches(is_whitespace);
        let instr_end = rest.find(is_whitespace).unwrap_or(rest.len());
        let instruction = &rest[..instr_end];
        if instruction.is_empty() {
            return Err("no instruction or directive found");
        }
        rest = &rest[instr_end..];
        (Some(name.to_string()), instruction.to_string())
    } else {
        (None, first_token.to_string())
    };

    rest = rest.trim_start_matches(is_whitespace);
    let operands = if rest.is_empty() {
        Vec::new()
    } else if instruction == ".string" {
        // A string payload may contain whitespace or commas, which the
        // generic splitter can't tell apart from operand separators:
        // take the remainder verbatim instead (spec §9 open question b).
        vec![rest.trim_end_matches(is_whitespace).to_string()]
    } else {
        split_operands(rest)?
    };

    Ok(ParsedLine { label, instruction, operands })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_instruction_no_operands() {
        let parsed = parse_line("rts").unwrap();
        assert_eq!(parsed.label, None);
        assert_eq!(parsed.instruction, "rts");
        assert!(parsed.operands.is_empty());
    }

    #[test]
    fn labeled_instruction_with_operands() {
        let parsed = parse_line("LOOP: mov r1, r2").unwrap();
        assert_eq!(parsed.label.as_deref(), Some("LOOP"));
        assert_eq!(parsed.instruction, "mov");
        assert_eq!(parsed.operands, vec!["r1", "r2"]);
    }

    #[test]
    fn label_without_instruction_is_error() {
        assert_eq!(parse_line("LOOP:").unwrap_err(), "no instruction or directive found");
    }

    #[test]
    fn two_tokens_without_comma_is_error() {
        assert!(split_operands("a b c").is_err());
    }

    #[test]
    fn trailing_comma_is_error() {
        assert!(split_operands("7, -1,").is_err());
    }

    #[test]
    fn doubled_comma_is_error() {
        assert!(split_operands("7,,8").is_err());
    }

    #[test]
    fn reserved_word_cannot_be_a_label() {
        assert!(validate_label_name("mov").is_err());
        assert!(validate_label_name("r3").is_err());
    }

    #[test]
    fn label_must_start_with_letter() {
        assert!(validate_label_name("3abc").is_err());
    }

    #[test]
    fn string_directive_keeps_embedded_whitespace_and_commas() {
        let parsed = parse_line(r#"greeting: .string "hi, world""#).unwrap();
        assert_eq!(parsed.operands, vec![r#""hi, world""#]);
    }

    #[test]
    fn directive_recognition() {
        assert!(is_directive(".data"));
        assert!(!is_directive(".foo"));
    }
}
