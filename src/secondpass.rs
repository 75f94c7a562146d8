//! Second-pass engine (spec section 4.4-4.5).

use crate::assemble::{Assembler, CachedLine};
use crate::diagnostics::Diagnostics;
use crate::opcode::{self, Operand};
use crate::parser::{self, ParsedLine};
use crate::symbol::{Kind, Origin};
use crate::word::{self, LOADING_BASE};

fn is_valid_label(text: &str) -> bool {
    parser::validate_label_name(text).is_ok()
}

fn classify(text: &str) -> Option<Operand> {
    opcode::classify_operand(text, is_valid_label)
}

/// Re-walk every cached line, resolving Direct operand words and
/// marking `.entry` symbols. IC is reset by the caller before this runs.
pub fn run(lines: &[CachedLine], file: &str, assembler: &mut Assembler, diagnostics: &mut Diagnostics) {
    for cached in lines {
        let parsed = match &cached.parsed {
            Ok(parsed) => parsed,
            // Already diagnosed in pass one; re-diagnosing here would
            // just duplicate the message, and the line emitted no words
            // so there is nothing for this pass to step past.
            Err(_) => continue,
        };

        if parser::is_directive(&parsed.instruction) {
            if let Err(message) = handle_directive(parsed, assembler) {
                diagnostics.push(file, cached.line_number, message);
            }
        } else if let Err(message) = handle_instruction(parsed, assembler) {
            diagnostics.push(file, cached.line_number, message);
        }
    }
}

fn handle_directive(parsed: &ParsedLine, assembler: &mut Assembler) -> Result<(), String> {
    if parsed.instruction != ".entry" {
        return Ok(());
    }
    if parsed.operands.len() != 1 {
        return Err(".entry directive must have exactly one parameter".to_string());
    }
    assembler
        .symbols
        .mark_entry(&parsed.operands[0])
        .map_err(|message| message.to_string())
}

/// Resolve a Direct (symbol) operand into its final word, recording an
/// extern-reference-table entry if the symbol is external.
fn resolve_label(assembler: &mut Assembler, label: &str) -> Result<u16, String> {
    let symbol = assembler
        .symbols
        .get(label)
        .ok_or_else(|| "label not found".to_string())?;

    if symbol.kind == Kind::Extern {
        let used_at = assembler.ic + LOADING_BASE;
        assembler.externs.push(label, used_at);
        return Ok(word::direct_extern_word());
    }

    let loaded = match symbol.origin {
        Origin::Code => symbol.address + LOADING_BASE,
        Origin::Data => symbol.address + LOADING_BASE + assembler.code_section_size,
    };
    Ok(word::direct_internal_word(loaded))
}

fn handle_instruction(parsed: &ParsedLine, assembler: &mut Assembler) -> Result<(), String> {
    assembler.ic += 1; // instruction word, already correct from pass one

    match parsed.operands.len() {
        2 => {
            let src = classify(&parsed.operands[0]);
            let dst = classify(&parsed.operands[1]);

            let src_is_register = matches!(src, Some(Operand::IndirectReg(_)) | Some(Operand::DirectReg(_)));
            let dst_is_register = matches!(dst, Some(Operand::IndirectReg(_)) | Some(Operand::DirectReg(_)));

            if src_is_register && dst_is_register {
                assembler.ic += 1;
                return Ok(());
            }

            if let Some(Operand::Direct(label)) = &src {
                let word = resolve_label(assembler, label)?;
                let ic = assembler.ic as usize;
                assembler.code[ic] = word;
            }
            assembler.ic += 1;

            if let Some(Operand::Direct(label)) = &dst {
                let word = resolve_label(assembler, label)?;
                let ic = assembler.ic as usize;
                assembler.code[ic] = word;
            }
            assembler.ic += 1;
        }
        1 => {
            let dst = classify(&parsed.operands[0]);
            if let Some(Operand::Direct(label)) = &dst {
                let word = resolve_label(assembler, label)?;
                let ic = assembler.ic as usize;
                assembler.code[ic] = word;
            }
            assembler.ic += 1;
        }
        0 => {}
        _ => return Err("unexpected number of parameters".to_string()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble, Outcome};

    fn run_source(lines: &[&str]) -> Outcome {
        let expanded: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assemble(&expanded, "prog.am").unwrap()
    }

    #[test]
    fn extern_reference_resolves_to_are_external() {
        match run_source(&[".extern EXT", "jmp EXT"]) {
            Outcome::Assembled { object, externs, .. } => {
                assert!(object.starts_with("2 0\n"));
                assert_eq!(externs.unwrap().trim_end(), "EXT 101");
            }
            Outcome::Diagnosed(diags) => panic!("unexpected diagnostics: {diags:?}"),
        }
    }

    #[test]
    fn entry_on_unknown_label_fails() {
        match run_source(&[".entry MISSING", "rts"]) {
            Outcome::Diagnosed(diags) => assert!(!diags.is_empty()),
            Outcome::Assembled { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn entry_on_extern_label_fails() {
        match run_source(&[".extern X", ".entry X", "jmp X"]) {
            Outcome::Diagnosed(diags) => assert!(!diags.is_empty()),
            Outcome::Assembled { .. } => panic!("expected failure"),
        }
    }
}
