use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::error;

use asm15::assemble_file;

/// An assembler for a pedagogical 15-bit word-addressed machine.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source files to assemble (conventionally named `<name>.as`).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Also write the macro-expanded `<name>.am` file next to the source.
    #[arg(long)]
    keep_intermediate: bool,
}

/// Assemble a single file, turning the fatal `AssemblerError` path into
/// an `anyhow` chain with the source path attached for context.
fn try_assemble_one(path: &PathBuf, keep_intermediate: bool) -> anyhow::Result<bool> {
    assemble_file(path, keep_intermediate).with_context(|| format!("{}", path.display()))
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let mut any_failed = false;

    for path in &args.files {
        match try_assemble_one(path, args.keep_intermediate) {
            Ok(true) => {}
            Ok(false) => any_failed = true,
            Err(err) => {
                error!("{err:#}");
                any_failed = true;
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
