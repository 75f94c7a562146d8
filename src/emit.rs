//! `.ob`/`.ent`/`.ext` text emitters (spec section 6.3-6.5).

use crate::assemble::Assembler;
use crate::symbol::{Kind, Origin};
use crate::word::LOADING_BASE;

/// The object file: header line `<code_size> <data_size>`, then one
/// `<address:4 digits> <word:5 octal digits>` line per word, code
/// first, then data immediately following at `LOADING_BASE + code_size`.
pub fn object_file(assembler: &Assembler) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", assembler.code_section_size, assembler.dc));

    for (i, word) in assembler.code.iter().enumerate() {
        out.push_str(&format!("{:04} {:05o}\n", i as i32 + LOADING_BASE, word));
    }
    for (i, word) in assembler.data.iter().enumerate() {
        out.push_str(&format!(
            "{:04} {:05o}\n",
            i as i32 + LOADING_BASE + assembler.code_section_size,
            word
        ));
    }
    out
}

/// The entry listing, or `None` if no symbol was marked `.entry`.
pub fn entry_file(assembler: &Assembler) -> Option<String> {
    let mut out = String::new();
    let mut any = false;
    for symbol in assembler.symbols.entries() {
        any = true;
        let address = match symbol.origin {
            Origin::Code => symbol.address + LOADING_BASE,
            Origin::Data => symbol.address + LOADING_BASE + assembler.code_section_size,
        };
        out.push_str(&format!("{} {}\n", symbol.name, address));
    }
    any.then_some(out)
}

/// The extern-reference listing, or `None` if nothing referenced an
/// extern symbol.
pub fn extern_file(assembler: &Assembler) -> Option<String> {
    if assembler.externs.is_empty() {
        return None;
    }
    let mut out = String::new();
    for reference in assembler.externs.iter() {
        out.push_str(&format!("{} {}\n", reference.name, reference.used_at));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{ExternTable, SymbolTable};

    fn empty_assembler() -> Assembler {
        Assembler {
            code: Vec::new(),
            data: Vec::new(),
            ic: 0,
            dc: 0,
            code_section_size: 0,
            symbols: SymbolTable::new(),
            externs: ExternTable::new(),
        }
    }

    #[test]
    fn object_header_and_octal_words() {
        let mut assembler = empty_assembler();
        assembler.code = vec![28676];
        assembler.code_section_size = 1;
        let rendered = object_file(&assembler);
        assert_eq!(rendered, "1 0\n0100 70004\n");
    }

    #[test]
    fn no_entries_means_no_entry_file() {
        let assembler = empty_assembler();
        assert!(entry_file(&assembler).is_none());
    }

    #[test]
    fn entry_file_includes_code_section_offset_for_data_symbols() {
        let mut assembler = empty_assembler();
        assembler.code_section_size = 2;
        assembler.symbols.insert("arr", Kind::Entry, Origin::Data, 0);
        let rendered = entry_file(&assembler).unwrap();
        assert_eq!(rendered, "arr 102\n");
    }

    #[test]
    fn no_extern_refs_means_no_extern_file() {
        let assembler = empty_assembler();
        assert!(extern_file(&assembler).is_none());
    }
}
