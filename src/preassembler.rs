//! Macro preassembler (Supplemented Features in `SPEC_FULL.md`): expands
//! `macr NAME` .. `endmacr` blocks inline wherever `NAME` appears alone
//! on a line.

use std::collections::HashMap;

use crate::diagnostics::Diagnostic;
use crate::lexer::{is_comment_line, tokenize};
use crate::parser::validate_label_name;

/// Longest logical line accepted before the text is even tokenized.
const MAX_LINE_SIZE: usize = 80;

#[derive(Default)]
struct MacroTable {
    macros: HashMap<String, String>,
}

impl MacroTable {
    fn new() -> Self {
        MacroTable::default()
    }

    fn add(&mut self, name: &str, content: String) -> Result<(), ()> {
        if self.macros.contains_key(name) {
            return Err(());
        }
        self.macros.insert(name.to_string(), content);
        Ok(())
    }

    fn content(&self, name: &str) -> Option<&str> {
        self.macros.get(name).map(|s| s.as_str())
    }
}

fn diag(file: &str, line: usize, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        file: file.to_string(),
        line,
        message: message.into(),
    }
}

fn validate_macro_name(name: &str, file: &str, line: usize) -> Result<(), Diagnostic> {
    let first = name.chars().next();
    if !first.map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        return Err(diag(file, line, "macro name must start with a letter"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(diag(file, line, "macro name contains invalid characters"));
    }
    // The reserved-word check doubles as the label validity check minus
    // the length cap; macro names share the identifier rule with labels.
    if validate_label_name(name) == Err("label cannot be a reserved word") {
        return Err(diag(file, line, format!("macro name cannot be a reserved word: {name}")));
    }
    Ok(())
}

/// Expand macros in `source`, returning the macro-expanded lines in
/// order. A line that is exactly one bare macro-name token is replaced
/// by the macro's captured body (itself possibly multiple lines); every
/// other line (including comments and blank lines, which this crate
/// drops here rather than during parsing) passes through unchanged.
pub fn preassemble(source: &str, file: &str) -> Result<Vec<String>, Diagnostic> {
    let mut output = Vec::new();
    let mut table = MacroTable::new();

    let mut current_macro_name: Option<String> = None;
    let mut current_macro_lines: Vec<String> = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;

        if raw_line.len() > MAX_LINE_SIZE {
            return Err(diag(file, line_number, "line too long"));
        }

        if is_comment_line(raw_line) {
            continue;
        }

        let tokens = tokenize(raw_line);
        if tokens.is_empty() {
            continue;
        }

        if tokens[0] == "macr" {
            if current_macro_name.is_some() {
                return Err(diag(file, line_number, "nested macro definition"));
            }
            if tokens.len() != 2 {
                return Err(diag(file, line_number, "invalid macro definition"));
            }
            validate_macro_name(tokens[1], file, line_number)?;
            current_macro_name = Some(tokens[1].to_string());
            current_macro_lines = Vec::new();
            continue;
        }

        if tokens[0] == "endmacr" {
            let name = match current_macro_name.take() {
                Some(name) => name,
                None => {
                    return Err(diag(file, line_number, "endmacr encountered without macro definition"));
                }
            };
            if tokens.len() != 1 {
                return Err(diag(file, line_number, "endmacr must be on a separate line"));
            }
            let content = current_macro_lines.join("\n");
            if table.add(&name, content).is_err() {
                return Err(diag(file, line_number, format!("macro '{name}' already defined")));
            }
            current_macro_lines = Vec::new();
            continue;
        }

        if current_macro_name.is_some() {
            current_macro_lines.push(raw_line.to_string());
            continue;
        }

        if tokens.len() != 1 {
            output.push(raw_line.to_string());
            continue;
        }

        match table.content(tokens[0]) {
            Some(content) => {
                for expanded_line in content.lines() {
                    output.push(expanded_line.to_string());
                }
            }
            None => output.push(raw_line.to_string()),
        }
    }

    if current_macro_name.is_some() {
        return Err(diag(file, source.lines().count(), "unterminated macro"));
    }

    Ok(output)
}
