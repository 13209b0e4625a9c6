//! The disassembly listing itself (§4.6): one mnemonic line per opcode,
//! `Lxxxx:` label prefixes, `LINE` pseudo-ops as comments, sub-opcode
//! arguments rendered as symbolic names.

use std::collections::HashMap;
use std::fmt::Write as _;

use poff::endian::BigEndian;
use poff::{LogicalOp, Opcode};
use poff_interp::subop::{FloatOp, LibOp, OsOp, SetOp, SysIoOp};

use crate::error::Result;

/// Disassemble `program`, annotating with `lines` (program offset -> source
/// line number, from the container's line-number table) where available.
pub fn disassemble(program: &[u8], lines: &[(u32, u32)]) -> Result<String> {
    let line_at: HashMap<u32, u32> = lines.iter().copied().collect();

    let mut out = String::new();
    let mut offset: usize = 0;
    let mut pending_label: Option<i32> = None;

    loop {
        let (opcode, len) = Opcode::decode(&program[offset..]);
        if opcode.is_end() {
            break;
        }
        if opcode.is_invalid() {
            let _ = writeln!(out, "{:08x}: <invalid byte 0x{:02x}>", offset, opcode.arg1);
            offset += len.max(1);
            continue;
        }

        if let Some(line) = line_at.get(&(offset as u32)) {
            let _ = writeln!(out, "        ; line {}", line);
        }

        match opcode.op {
            LogicalOp::Line => {
                let _ = writeln!(out, "        ; line {}", opcode.arg2);
            }
            LogicalOp::Label => {
                pending_label = Some(opcode.arg2);
            }
            _ => {
                if let Some(label) = pending_label.take() {
                    let _ = writeln!(out, "L{:04}:", label);
                }
                let _ = writeln!(out, "{:08x}: {}", offset, render(opcode)?);
            }
        }

        offset += len;
    }

    Ok(out)
}

fn render(opcode: Opcode) -> Result<String> {
    use poff::ArgForm::*;

    let mnemonic = opcode.op.mnemonic();
    let rendered = match opcode.op.arg_form() {
        None => mnemonic.to_string(),
        Arg1 => format!("{:<7}{}", mnemonic, render_sub_opcode(opcode)?),
        Arg2 => format!("{:<7}{}", mnemonic, opcode.arg2),
        Both => format!("{:<7}{}, {}", mnemonic, opcode.arg1, opcode.arg2),
    };
    Ok(rendered)
}

/// `SYSIO`/`LIB`/`SETOP`/`FLOAT`/`OSOP` carry their sub-opcode in `arg1`;
/// render it as the symbolic name rather than a bare integer (§4.6).
fn render_sub_opcode(opcode: Opcode) -> Result<String> {
    let name = match opcode.op {
        LogicalOp::SysIo => SysIoOp::from_u8(opcode.arg1).map(|op| op.mnemonic()),
        LogicalOp::Lib => LibOp::from_u8(opcode.arg1).map(|op| op.mnemonic()),
        LogicalOp::SetOp => SetOp::from_u8(opcode.arg1).map(|op| op.mnemonic()),
        LogicalOp::Float => FloatOp::from_u8(opcode.arg1).map(|op| op.mnemonic()),
        LogicalOp::OsOp => OsOp::from_u8(opcode.arg1).map(|op| op.mnemonic()),
        // PUSHB carries a signed 8-bit constant, UPUSHB an unsigned one;
        // print the value it pushes, not the raw byte.
        LogicalOp::PushB => return Ok((opcode.arg1 as i8).to_string()),
        LogicalOp::UPushB => return Ok(opcode.arg1.to_string()),
        // The LONGOP escape's `arg1` is a `DOp` code; print it numerically,
        // the lister doesn't carry its own mnemonic table for it.
        _ => return Ok(opcode.arg1.to_string()),
    };
    match name {
        Some(n) => Ok(n.to_string()),
        None => Ok(format!("<unassigned:{}>", opcode.arg1)),
    }
}

/// Build the `(program_offset, line_number)` pairs [`disassemble`] wants
/// from a container's line-number table.
pub fn line_table(container: &poff::Container<'_>) -> Vec<(u32, u32)> {
    container
        .lines()
        .iter()
        .map(|e| (e.program_offset.get(BigEndian), e.line_number.get(BigEndian)))
        .collect()
}
