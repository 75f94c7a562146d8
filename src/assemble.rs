//! Per-file assembly state machine (spec section 4.7):
//! `Start -> PreassembleOK -> Pass1OK -> CapacityOK -> Pass2OK -> Emitted`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::emit;
use crate::error::AssemblerError;
use crate::firstpass;
use crate::parser::ParsedLine;
use crate::secondpass;
use crate::symbol::{ExternTable, SymbolTable};
use crate::word::{LOADING_BASE, MAX_MEMORY_SIZE};

/// All per-file mutable state: the two word arenas, the IC/DC counters,
/// the symbol table, and the extern-reference table. Recreated fresh
/// for every input file — nothing survives across files.
pub struct Assembler {
    pub code: Vec<u16>,
    pub data: Vec<u16>,
    pub ic: i32,
    pub dc: i32,
    pub code_section_size: i32,
    pub symbols: SymbolTable,
    pub externs: ExternTable,
}

impl Assembler {
    pub fn new() -> Self {
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
}

/// One statement from the macro-expanded source, already parsed once so
/// both passes can share the result (spec §9: "An implementation may
/// cache the parsed-line vector between passes").
pub struct CachedLine {
    pub line_number: usize,
    pub parsed: Result<ParsedLine, &'static str>,
}

fn cache_lines(expanded: &[String]) -> Vec<CachedLine> {
    expanded
        .iter()
        .enumerate()
        .map(|(idx, line)| CachedLine {
            line_number: idx + 1,
            parsed: crate::parser::parse_line(line),
        })
        .collect()
}

/// The outcome of assembling one file: either the emitted artifacts, or
/// the diagnostics collected along the way.
pub enum Outcome {
    Assembled {
        object: String,
        entries: Option<String>,
        externs: Option<String>,
    },
    Diagnosed(Vec<Diagnostic>),
}

/// Assemble one `.as` source file in memory, from its macro-expanded
/// text, returning the outcome per spec §4.7. `file_label` is the name
/// used in diagnostic messages (conventionally the `.am` path).
pub fn assemble(expanded: &[String], file_label: &str) -> Result<Outcome, AssemblerError> {
    let cached = cache_lines(expanded);

    let mut assembler = Assembler::new();
    let mut diagnostics = Diagnostics::new();

    firstpass::run(&cached, file_label, &mut assembler, &mut diagnostics);
    if !diagnostics.is_empty() {
        warn!("{file_label}: first pass failed with {} diagnostic(s)", diagnostics.iter().count());
        return Ok(Outcome::Diagnosed(diagnostics.into_vec()));
    }
    debug!("{file_label}: first pass ok, ic={} dc={}", assembler.ic, assembler.dc);

    if assembler.ic + assembler.dc + LOADING_BASE > MAX_MEMORY_SIZE {
        return Err(AssemblerError::CapacityExceeded { ic: assembler.ic, dc: assembler.dc });
    }

    assembler.code_section_size = assembler.ic;
    assembler.ic = 0;

    secondpass::run(&cached, file_label, &mut assembler, &mut diagnostics);
    if !diagnostics.is_empty() {
        warn!("{file_label}: second pass failed with {} diagnostic(s)", diagnostics.iter().count());
        return Ok(Outcome::Diagnosed(diagnostics.into_vec()));
    }
    debug_assert_eq!(assembler.ic, assembler.code_section_size);

    let object = emit::object_file(&assembler);
    let entries = emit::entry_file(&assembler);
    let externs = emit::extern_file(&assembler);

    info!(
        "{file_label}: assembled ok, code_size={} data_size={}",
        assembler.code_section_size, assembler.dc
    );

    Ok(Outcome::Assembled { object, entries, externs })
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Assemble one named `.as` file on disk, writing the `.ob`/`.ent`/`.ext`
/// siblings on success. Returns `true` if the file assembled cleanly.
/// `keep_intermediate` additionally writes the expanded `.am` file,
/// matching the original tool's on-disk artifact for debugging parity.
pub fn assemble_file(source_path: &Path, keep_intermediate: bool) -> Result<bool, AssemblerError> {
    let source = fs::read_to_string(source_path).map_err(|e| AssemblerError::Io {
        path: source_path.display().to_string(),
        source: e,
    })?;

    let am_path = with_extension(source_path, "am");
    let expanded = match crate::preassembler::preassemble(&source, &source_path.display().to_string()) {
        Ok(lines) => lines,
        Err(diag) => {
            eprintln!("{diag}");
            return Ok(false);
        }
    };

    if keep_intermediate {
        let joined = expanded.join("\n");
        fs::write(&am_path, joined).map_err(|e| AssemblerError::Io {
            path: am_path.display().to_string(),
            source: e,
        })?;
    }

    let file_label = am_path.display().to_string();
    match assemble(&expanded, &file_label)? {
        Outcome::Diagnosed(diags) => {
            for d in diags {
                eprintln!("{d}");
            }
            Ok(false)
        }
        Outcome::Assembled { object, entries, externs } => {
            fs::write(with_extension(source_path, "ob"), object).map_err(|e| AssemblerError::Io {
                path: source_path.with_extension("ob").display().to_string(),
                source: e,
            })?;
            if let Some(entries) = entries {
                fs::write(with_extension(source_path, "ent"), entries).map_err(|e| AssemblerError::Io {
                    path: source_path.with_extension("ent").display().to_string(),
                    source: e,
                })?;
            }
            if let Some(externs) = externs {
                fs::write(with_extension(source_path, "ext"), externs).map_err(|e| AssemblerError::Io {
                    path: source_path.with_extension("ext").display().to_string(),
                    source: e,
                })?;
            }
            Ok(true)
        }
    }
}
