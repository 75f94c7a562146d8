//! First-pass engine (spec section 4.3).

use crate::assemble::{Assembler, CachedLine};
use crate::diagnostics::Diagnostics;
use crate::opcode::{self, Operand};
use crate::parser::{self, ParsedLine};
use crate::symbol::{Kind, Origin};
use crate::word::{self, Modes, DATA_MAX, DATA_MIN, IMMEDIATE_MAX, IMMEDIATE_MIN};

fn is_valid_label(text: &str) -> bool {
    parser::validate_label_name(text).is_ok()
}

fn classify(text: &str) -> Option<Operand> {
    opcode::classify_operand(text, is_valid_label)
}

/// Walk every cached line once, updating `assembler` and recording any
/// failures into `diagnostics`. A failing line does not stop the walk.
pub fn run(lines: &[CachedLine], file: &str, assembler: &mut Assembler, diagnostics: &mut Diagnostics) {
    for cached in lines {
        let parsed = match &cached.parsed {
            Ok(parsed) => parsed,
            Err(message) => {
                diagnostics.push(file, cached.line_number, *message);
                continue;
            }
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
    if let Some(label) = &parsed.label {
        if parsed.instruction != ".data" && parsed.instruction != ".string" {
            return Err("labels only allowed for .data or .string directives".to_string());
        }
        add_label(assembler, label, Kind::Plain, Origin::Data)?;
    }

    match parsed.instruction.as_str() {
        ".data" => handle_data(parsed, assembler),
        ".string" => handle_string(parsed, assembler),
        ".extern" => handle_extern(parsed, assembler),
        ".entry" => Ok(()), // deferred to pass two
        other => Err(format!("unknown directive '{other}'")),
    }
}

fn add_label(assembler: &mut Assembler, name: &str, kind: Kind, origin: Origin) -> Result<(), String> {
    if assembler.symbols.contains(name) {
        return Err("duplicate label".to_string());
    }
    let address = match origin {
        Origin::Data => assembler.dc,
        Origin::Code => assembler.ic,
    };
    assembler.symbols.insert(name, kind, origin, address);
    Ok(())
}

fn handle_data(parsed: &ParsedLine, assembler: &mut Assembler) -> Result<(), String> {
    for param in &parsed.operands {
        let value: i32 = param
            .parse()
            .map_err(|_| format!("number out of range or invalid '{param}'"))?;
        if !(DATA_MIN..=DATA_MAX).contains(&value) {
            return Err(format!("number out of range or invalid '{param}'"));
        }
        assembler.data.push(word::twos_complement(value, 15));
        assembler.dc += 1;
    }
    Ok(())
}

fn handle_string(parsed: &ParsedLine, assembler: &mut Assembler) -> Result<(), String> {
    if parsed.operands.len() != 1 {
        return Err(
            "a string must receive only a single parameter. the parameter must not contain spaces or commas".to_string(),
        );
    }
    let raw = &parsed.operands[0];
    if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
        return Err("invalid string format".to_string());
    }
    let inner = &raw[1..raw.len() - 1];
    for ch in inner.chars() {
        assembler.data.push(ch as u16 & word::WORD_MASK);
        assembler.dc += 1;
    }
    assembler.data.push(0);
    assembler.dc += 1;
    Ok(())
}

fn handle_extern(parsed: &ParsedLine, assembler: &mut Assembler) -> Result<(), String> {
    if parsed.operands.len() != 1 {
        return Err(".extern directive must have exactly one parameter".to_string());
    }
    let name = &parsed.operands[0];
    if assembler.symbols.contains(name) {
        return Err(format!("extern label '{name}' already defined"));
    }
    assembler.symbols.insert(name, Kind::Extern, Origin::Code, 0);
    Ok(())
}

fn check_immediate(value: i32, text: &str) -> Result<(), String> {
    if !(IMMEDIATE_MIN..=IMMEDIATE_MAX).contains(&value) {
        return Err(format!("number out of range or invalid '{text}'"));
    }
    Ok(())
}

/// Encode one already-classified operand into its first-pass word. A
/// `Direct` operand is always a placeholder here; pass two patches it.
fn operand_word(operand: &Operand, is_source: bool, text: &str) -> Result<u16, String> {
    match operand {
        Operand::Immediate(raw) => {
            let value: i32 = raw
                .parse()
                .map_err(|_| format!("number out of range or invalid '{text}'"))?;
            check_immediate(value, text)?;
            Ok(word::immediate_word(value))
        }
        Operand::Direct(_) => Ok(word::direct_placeholder_word()),
        Operand::IndirectReg(reg) | Operand::DirectReg(reg) => Ok(word::register_word(*reg, is_source)),
    }
}

fn handle_instruction(parsed: &ParsedLine, assembler: &mut Assembler) -> Result<(), String> {
    if let Some(label) = &parsed.label {
        add_label(assembler, label, Kind::Plain, Origin::Code)?;
    }

    let op = opcode::lookup(&parsed.instruction)
        .ok_or_else(|| format!("invalid operation '{}'", parsed.instruction))?;

    if parsed.operands.len() as u8 != op.arity {
        return Err(format!("unexpected number of operands for opcode {}", op.name));
    }

    match parsed.operands.len() {
        2 => {
            let src = classify(&parsed.operands[0])
                .ok_or_else(|| format!("unsupported addressing method for opcode {}", op.name))?;
            let dst = classify(&parsed.operands[1])
                .ok_or_else(|| format!("unsupported addressing method for opcode {}", op.name))?;

            if !op.allowed_src.intersects(src.mode()) || !op.allowed_dst.intersects(dst.mode()) {
                return Err(format!("unsupported addressing method for opcode {}", op.name));
            }

            assembler.code.push(word::instruction_word(op.code, src.mode(), dst.mode()));
            assembler.ic += 1;

            if src.mode().is_register_class() && dst.mode().is_register_class() {
                let src_reg = register_number(&src);
                let dst_reg = register_number(&dst);
                assembler.code.push(word::shared_register_word(src_reg, dst_reg));
                assembler.ic += 1;
            } else {
                let src_word = operand_word(&src, true, &parsed.operands[0])?;
                let dst_word = operand_word(&dst, false, &parsed.operands[1])?;
                assembler.code.push(src_word);
                assembler.ic += 1;
                assembler.code.push(dst_word);
                assembler.ic += 1;
            }
        }
        1 => {
            let dst = classify(&parsed.operands[0])
                .ok_or_else(|| format!("unsupported addressing method for opcode {}", op.name))?;

            if !op.allowed_dst.intersects(dst.mode()) {
                return Err(format!("unsupported addressing method for opcode {}", op.name));
            }

            let dst_word = operand_word(&dst, false, &parsed.operands[0])?;

            assembler
                .code
                .push(word::instruction_word(op.code, Modes::empty(), dst.mode()));
            assembler.ic += 1;
            assembler.code.push(dst_word);
            assembler.ic += 1;
        }
        0 => {
            assembler
                .code
                .push(word::instruction_word(op.code, Modes::empty(), Modes::empty()));
            assembler.ic += 1;
        }
        _ => return Err("unexpected number of parameters".to_string()),
    }

    Ok(())
}

fn register_number(operand: &Operand) -> u8 {
    match operand {
        Operand::IndirectReg(r) | Operand::DirectReg(r) => *r,
        _ => unreachable!("register_number called on a non-register operand"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::CachedLine;

    fn run_source(lines: &[&str]) -> (Assembler, Diagnostics) {
        let cached: Vec<CachedLine> = lines
            .iter()
            .enumerate()
            .map(|(i, l)| CachedLine {
                line_number: i + 1,
                parsed: parser::parse_line(l),
            })
            .collect();
        let mut assembler = Assembler::new();
        let mut diagnostics = Diagnostics::new();
        run(&cached, "prog.am", &mut assembler, &mut diagnostics);
        (assembler, diagnostics)
    }

    #[test]
    fn rts_emits_one_word() {
        let (assembler, diagnostics) = run_source(&["rts"]);
        assert!(diagnostics.is_empty());
        assert_eq!(assembler.code, vec![28676]);
        assert_eq!(assembler.ic, 1);
    }

    #[test]
    fn stop_emits_one_word() {
        let (assembler, diagnostics) = run_source(&["stop"]);
        assert!(diagnostics.is_empty());
        assert_eq!(assembler.code, vec![30724]);
    }

    #[test]
    fn two_registers_share_one_word() {
        let (assembler, diagnostics) = run_source(&["mov r3, r5"]);
        assert!(diagnostics.is_empty());
        assert_eq!(assembler.code, vec![1092, 236]);
        assert_eq!(assembler.ic, 2);
    }

    #[test]
    fn immediate_to_register() {
        let (assembler, diagnostics) = run_source(&["mov #-1, r2"]);
        assert!(diagnostics.is_empty());
        assert_eq!(assembler.code.len(), 3);
        assert_eq!(assembler.code[1], 0x7ffc);
        assert_eq!(assembler.code[2], 20);
    }

    #[test]
    fn data_directive_packs_values() {
        let (assembler, diagnostics) = run_source(&["arr: .data 7, -1, 16383"]);
        assert!(diagnostics.is_empty());
        assert_eq!(assembler.data, vec![7, 0x7fff, 0x3fff]);
        assert_eq!(assembler.symbols.get("arr").unwrap().address, 0);
    }

    #[test]
    fn unknown_opcode_is_diagnosed() {
        let (_assembler, diagnostics) = run_source(&["foo r1"]);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn wrong_arity_is_diagnosed() {
        let (_assembler, diagnostics) = run_source(&["rts r1"]);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn label_on_extern_is_diagnosed() {
        let (_assembler, diagnostics) = run_source(&["BAD: .extern X"]);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn malformed_immediate_is_diagnosed_as_invalid_number_not_bad_addressing() {
        let (_assembler, diagnostics) = run_source(&["mov #abc, r1"]);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["number out of range or invalid '#abc'"]);
    }
}
