//! Opcode catalog and addressing-mode classifier (spec section 4.2).

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::word::Modes;

/// One catalog entry: numeric code, allowed source/destination mode
/// masks, and declared operand arity.
#[derive(Debug)]
pub struct OpCode {
    pub name: &'static str,
    pub code: u8,
    pub allowed_src: Modes,
    pub allowed_dst: Modes,
    pub arity: u8,
}

impl OpCode {
    fn new(name: &'static str, code: u8, allowed_src: Modes, allowed_dst: Modes, arity: u8) -> Self {
        OpCode { name, code, allowed_src, allowed_dst, arity }
    }
}

lazy_static! {
    static ref NONE: Modes = Modes::empty();
    static ref ALL: Modes = Modes::IMMEDIATE | Modes::DIRECT | Modes::INDIRECT_REG | Modes::DIRECT_REG;
    static ref OPERAND_CLASS: Modes = Modes::DIRECT | Modes::INDIRECT_REG | Modes::DIRECT_REG;
    static ref JUMP_TARGET: Modes = Modes::DIRECT | Modes::INDIRECT_REG;

    pub static ref OPCODES: Vec<OpCode> = vec![
        OpCode::new("mov",   0, *ALL,  *OPERAND_CLASS, 2),
        OpCode::new("cmp",   1, *ALL,  *ALL,           2),
        OpCode::new("add",   2, *ALL,  *OPERAND_CLASS, 2),
        OpCode::new("sub",   3, *ALL,  *OPERAND_CLASS, 2),
        OpCode::new("lea",   4, Modes::DIRECT, *OPERAND_CLASS, 2),
        OpCode::new("clr",   5, *NONE, *OPERAND_CLASS, 1),
        OpCode::new("not",   6, *NONE, *OPERAND_CLASS, 1),
        OpCode::new("inc",   7, *NONE, *OPERAND_CLASS, 1),
        OpCode::new("dec",   8, *NONE, *OPERAND_CLASS, 1),
        OpCode::new("jmp",   9, *NONE, *JUMP_TARGET,   1),
        OpCode::new("bne",  10, *NONE, *JUMP_TARGET,   1),
        OpCode::new("red",  11, *NONE, *OPERAND_CLASS, 1),
        OpCode::new("prn",  12, *NONE, *ALL,           1),
        OpCode::new("jsr",  13, *NONE, *JUMP_TARGET,   1),
        OpCode::new("rts",  14, *NONE, *NONE,          0),
        OpCode::new("stop", 15, *NONE, *NONE,          0),
    ];

    pub static ref OPCODES_MAP: HashMap<&'static str, &'static OpCode> = {
        let mut map = HashMap::new();
        for op in OPCODES.iter() {
            map.insert(op.name, op);
        }
        map
    };
}

pub fn lookup(name: &str) -> Option<&'static OpCode> {
    OPCODES_MAP.get(name).copied()
}

/// A classified operand: the addressing mode plus the payload needed to
/// encode or resolve it later. `Immediate` carries the raw text after
/// `#` rather than a parsed value — classification always succeeds for
/// a `#`-prefixed operand, and the numeric range/format check happens
/// downstream where the failure can be reported against the operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Immediate(String),
    Direct(String),
    IndirectReg(u8),
    DirectReg(u8),
}

impl Operand {
    pub fn mode(&self) -> Modes {
        match self {
            Operand::Immediate(_) => Modes::IMMEDIATE,
            Operand::Direct(_) => Modes::DIRECT,
            Operand::IndirectReg(_) => Modes::INDIRECT_REG,
            Operand::DirectReg(_) => Modes::DIRECT_REG,
        }
    }
}

/// Parse a register token (`r0`..`r7`), the part after an optional
/// leading `*`. Returns `None` if it isn't a well-formed register name.
fn parse_register(text: &str) -> Option<u8> {
    let rest = text.strip_prefix('r')?;
    if rest.len() != 1 {
        return None;
    }
    let n: u8 = rest.parse().ok()?;
    if n <= 7 {
        Some(n)
    } else {
        None
    }
}

/// Classify an operand string. Label validation (for the Direct case) is
/// delegated to the caller via `is_valid_label`, since it depends on the
/// reserved-word set owned by [`crate::parser`]. A leading `#` always
/// classifies as Immediate, even if the suffix is not a valid number —
/// that check is deferred to encoding time.
pub fn classify_operand<F>(text: &str, is_valid_label: F) -> Option<Operand>
where
    F: Fn(&str) -> bool,
{
    if let Some(rest) = text.strip_prefix('#') {
        return Some(Operand::Immediate(rest.to_string()));
    }
    if let Some(rest) = text.strip_prefix('*') {
        return parse_register(rest).map(Operand::IndirectReg);
    }
    if let Some(reg) = parse_register(text) {
        return Some(Operand::DirectReg(reg));
    }
    if is_valid_label(text) {
        return Some(Operand::Direct(text.to_string()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_valid(_: &str) -> bool {
        true
    }

    #[test]
    fn mov_has_two_operands_and_no_dest_immediate() {
        let mov = lookup("mov").unwrap();
        assert_eq!(mov.code, 0);
        assert_eq!(mov.arity, 2);
        assert!(!mov.allowed_dst.contains(Modes::IMMEDIATE));
    }

    #[test]
    fn rts_and_stop_take_no_operands() {
        assert_eq!(lookup("rts").unwrap().arity, 0);
        assert_eq!(lookup("stop").unwrap().arity, 0);
    }

    #[test]
    fn lea_only_allows_direct_source() {
        let lea = lookup("lea").unwrap();
        assert_eq!(lea.allowed_src, Modes::DIRECT);
    }

    #[test]
    fn unknown_mnemonic_is_not_an_opcode() {
        assert!(lookup("foo").is_none());
    }

    #[test]
    fn classify_immediate() {
        assert_eq!(classify_operand("#-1", always_valid), Some(Operand::Immediate("-1".to_string())));
    }

    #[test]
    fn classify_immediate_defers_numeric_validation() {
        // A malformed suffix still classifies; only encoding later rejects it.
        assert_eq!(classify_operand("#abc", always_valid), Some(Operand::Immediate("abc".to_string())));
    }

    #[test]
    fn classify_indirect_register() {
        assert_eq!(classify_operand("*r3", always_valid), Some(Operand::IndirectReg(3)));
    }

    #[test]
    fn classify_direct_register() {
        assert_eq!(classify_operand("r7", always_valid), Some(Operand::DirectReg(7)));
    }

    #[test]
    fn classify_register_out_of_range_falls_back_to_label() {
        // r8 is not a register; it may still be a valid label.
        assert_eq!(classify_operand("r8", always_valid), Some(Operand::Direct("r8".to_string())));
    }

    #[test]
    fn classify_invalid_label_is_none() {
        assert_eq!(classify_operand("1bad", |_| false), None);
    }
}
