//! Raw section dumps (§6.1, §6.4): the supplemental views `plist`'s
//! `-ahlSsrdH` flags select, alongside the disassembly listing that is
//! always printed.

use std::fmt::Write as _;

use poff::endian::BigEndian;
use poff::poff::SymbolKind;
use poff::{Container, RelocationBase};

use crate::error::Result;

/// The file header and section-descriptor summary (`-h`/`-s`).
pub fn header(container: &Container<'_>) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "file type:    {:?}", container.file_type());
    let _ = writeln!(out, "architecture: {:?}", container.architecture());
    let _ = writeln!(out, "entry point:  {:08x}", container.entry_point());
    let _ = writeln!(out, "name:         {}", container.name().unwrap_or("<unnamed>"));
    let _ = writeln!(out, "program:      {} bytes", container.program().len());
    let _ = writeln!(out, "rodata:       {} bytes", container.rodata().len());
    let _ = writeln!(out, "symbols:      {} entries", container.symbols().len());
    let _ = writeln!(out, "relocations:  {} entries", container.relocations().len());
    let _ = writeln!(out, "lines:        {} entries", container.lines().len());
    let _ = writeln!(
        out,
        "debug funcs:  {} entries",
        container.debug_functions().len()
    );
    Ok(out)
}

/// The symbol table (`-S`).
pub fn symbols(container: &Container<'_>) -> Result<String> {
    let mut out = String::new();
    for sym in container.symbols() {
        let name = container
            .string_at(sym.name_offset.get(BigEndian))
            .map_err(|_| crate::error::Error::malformed("symbol name offset out of range"))?;
        let kind = SymbolKind::from_u8(sym.kind)
            .map(|k| format!("{:?}", k))
            .unwrap_or_else(|| format!("<unassigned:{}>", sym.kind));
        let _ = writeln!(
            out,
            "{:08x} level={:<3} {:<10} {}",
            sym.value.get(BigEndian),
            sym.level.get(BigEndian),
            kind,
            name,
        );
    }
    Ok(out)
}

/// The relocation table (`-r`).
pub fn relocations(container: &Container<'_>) -> Result<String> {
    let mut out = String::new();
    for reloc in container.relocations() {
        let base = RelocationBase::from_u8(reloc.base)
            .map(|b| format!("{:?}", b))
            .unwrap_or_else(|| format!("<unassigned:{}>", reloc.base));
        let _ = writeln!(out, "{:08x}: base={}", reloc.program_offset.get(BigEndian), base);
    }
    Ok(out)
}

/// The line-number table (`-l`).
pub fn lines(container: &Container<'_>) -> Result<String> {
    let mut out = String::new();
    for entry in container.lines() {
        let _ = writeln!(
            out,
            "{:08x}: line {}",
            entry.program_offset.get(BigEndian),
            entry.line_number.get(BigEndian),
        );
    }
    Ok(out)
}

/// The debug-function-info table (`-d`).
pub fn debug_functions(container: &Container<'_>) -> Result<String> {
    let mut out = String::new();
    for entry in container.debug_functions() {
        let name = container
            .string_at(entry.name_offset.get(BigEndian))
            .map_err(|_| crate::error::Error::malformed("debug function name offset out of range"))?;
        let _ = writeln!(
            out,
            "{:08x}-{:08x} level={} params={}w locals={}w {}",
            entry.start_offset.get(BigEndian),
            entry.end_offset.get(BigEndian),
            entry.level.get(BigEndian),
            entry.param_words.get(BigEndian),
            entry.local_words.get(BigEndian),
            name,
        );
    }
    Ok(out)
}

/// A raw hex dump of the program and read-only-data sections (`-H`).
pub fn hex_dump(container: &Container<'_>) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "program:");
    hex_lines(&mut out, container.program());
    let _ = writeln!(out, "rodata:");
    hex_lines(&mut out, container.rodata());
    Ok(out)
}

fn hex_lines(out: &mut String, data: &[u8]) {
    for (i, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}: ", i * 16);
        for byte in chunk {
            let _ = write!(out, "{:02x} ", byte);
        }
        let _ = writeln!(out);
    }
}
