//! Disassembler/lister for linked POFF images (§4.6).
//!
//! [`list`] always prints the disassembly listing; [`Flags`] selects which
//! supplemental raw-section dumps (`-ahlSsrdH`) ride alongside it.

use poff::Container;

pub mod disasm;
pub mod error;
pub mod sections;

pub use error::{Error, ErrorKind, Result};

/// Which supplemental sections `plist` should dump, alongside the
/// disassembly listing it always prints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    pub header: bool,
    pub lines: bool,
    pub symbols: bool,
    pub section_summary: bool,
    pub relocations: bool,
    pub debug_functions: bool,
    pub hex: bool,
}

impl Flags {
    pub fn all() -> Flags {
        Flags {
            header: true,
            lines: true,
            symbols: true,
            section_summary: true,
            relocations: true,
            debug_functions: true,
            hex: true,
        }
    }
}

/// Produce `plist`'s full textual listing for `container`.
pub fn list(container: &Container<'_>, flags: Flags) -> Result<String> {
    let mut out = String::new();

    if flags.header || flags.section_summary {
        out.push_str(&sections::header(container)?);
        out.push('\n');
    }
    if flags.symbols {
        out.push_str("symbols:\n");
        out.push_str(&sections::symbols(container)?);
        out.push('\n');
    }
    if flags.relocations {
        out.push_str("relocations:\n");
        out.push_str(&sections::relocations(container)?);
        out.push('\n');
    }
    if flags.lines {
        out.push_str("lines:\n");
        out.push_str(&sections::lines(container)?);
        out.push('\n');
    }
    if flags.debug_functions {
        out.push_str("debug functions:\n");
        out.push_str(&sections::debug_functions(container)?);
        out.push('\n');
    }
    if flags.hex {
        out.push_str(&sections::hex_dump(container)?);
        out.push('\n');
    }

    out.push_str("disassembly:\n");
    let lines = disasm::line_table(container);
    out.push_str(&disasm::disassemble(container.program(), &lines)?);

    Ok(out)
}
