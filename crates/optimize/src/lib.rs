//! Multi-pass local peephole optimizer for P-code bytecode (§3, §4.4).
//!
//! [`optimize`] runs a parsed POFF container through Pass 0 (stub), Pass 1
//! (fixed-point peephole, `pass::pass1`) and Pass 2 (finalize,
//! `pass::pass2`), then rebuilds a container around the result. The rule
//! tables themselves live in `fold` and `pass`; `window` builds the pointer
//! list the rules scan.

use std::collections::HashMap;

use poff::endian::{BigEndian, U16Be, U32Be};
use poff::poff::{DebugFunctionEntry, RelocationEntry, Symbol};
use poff::reloc::Relocation;
use poff::Container;

pub mod error;
pub mod fold;
pub mod pass;
pub mod window;

pub use error::{Error, ErrorKind, Result};

fn resolve(label_offsets: &HashMap<i32, u32>, v: u32) -> u32 {
    label_offsets.get(&(v as i32)).copied().unwrap_or(v)
}

/// Optimize a parsed container, returning the bytes of the rewritten
/// container (§4.4, §6.2).
pub fn optimize(container: &Container<'_>) -> Result<Vec<u8>> {
    let stream0 = pass::decode_stream(container.program());
    let stream0 = pass::pass0(stream0);

    let relocs0 = container
        .relocations()
        .iter()
        .map(Relocation::from_entry)
        .collect::<poff::Result<Vec<_>>>()
        .map_err(Error::relocation)?;

    let (stream1, relocs1) = pass::pass1(stream0, relocs0)?;
    let (opcodes, relocs2, lines, label_offsets) = pass::pass2(stream1, relocs1)?;

    let mut program_bytes = Vec::new();
    let mut buf = [0u8; 4];
    for op in &opcodes {
        if op.is_end() {
            break;
        }
        let len = op
            .encode(&mut buf)
            .map_err(|e| Error::invariant(format!("failed to encode opcode: {e}")))?;
        program_bytes.extend_from_slice(&buf[..len]);
    }

    let mut builder = Container::builder(container.file_type(), container.architecture());
    builder.set_entry_point(resolve(&label_offsets, container.entry_point()));

    let name = container.name().map_err(Error::parse)?;
    if !name.is_empty() {
        builder.set_name(name);
    }

    builder.push_program(&program_bytes);
    builder.push_rodata(container.rodata());

    for symbol in container.symbols() {
        let name = container
            .string_at(symbol.name_offset.get(BigEndian))
            .map_err(Error::parse)?;
        let name_offset = builder.add_string(name);
        // A symbol's `value` may be a label id (procedures/functions point
        // at their entry `LABEL`) or a frame-relative offset unrelated to
        // the label space (variables, constants); `resolve` is a no-op for
        // the latter since such values never collide with an id Pass 2
        // actually defined.
        let value = resolve(&label_offsets, symbol.value.get(BigEndian));
        builder.add_symbol(Symbol {
            name_offset: U32Be::new(BigEndian, name_offset),
            value: U32Be::new(BigEndian, value),
            level: symbol.level,
            kind: symbol.kind,
            reserved: symbol.reserved,
        });
    }

    for r in &relocs2 {
        builder.add_relocation(RelocationEntry {
            program_offset: U32Be::new(BigEndian, r.program_offset),
            base: r.base.to_u8(),
            reserved: [0; 3],
            pass: U16Be::new(BigEndian, 0),
            reserved2: U16Be::new(BigEndian, 0),
        });
    }

    for (offset, line) in &lines {
        builder.add_line(*offset, *line);
    }

    for d in container.debug_functions() {
        let name = container
            .string_at(d.name_offset.get(BigEndian))
            .map_err(Error::parse)?;
        let name_offset = builder.add_string(name);
        builder.add_debug_function(DebugFunctionEntry {
            name_offset: U32Be::new(BigEndian, name_offset),
            start_offset: U32Be::new(BigEndian, resolve(&label_offsets, d.start_offset.get(BigEndian))),
            end_offset: U32Be::new(BigEndian, resolve(&label_offsets, d.end_offset.get(BigEndian))),
            level: d.level,
            param_words: d.param_words,
            local_words: d.local_words,
            reserved: d.reserved,
        });
    }

    Ok(builder.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use poff::poff::read::parse;
    use poff::{Architecture, FileType, LogicalOp, Opcode};

    #[test]
    fn optimizes_a_constant_addition_end_to_end() {
        let mut b = Container::builder(FileType::Program, Architecture::PMACHINE16);
        b.set_name("hello");
        let push3 = Opcode::narrow_push_constant(3);
        let push4 = Opcode::narrow_push_constant(4);
        let add = Opcode::bare(LogicalOp::Add);
        let mut buf = [0u8; 4];
        let mut program = Vec::new();
        for op in [push3, push4, add] {
            let len = op.encode(&mut buf).unwrap();
            program.extend_from_slice(&buf[..len]);
        }
        b.push_program(&program);
        let input_bytes = b.to_vec();
        let input = parse(&input_bytes).expect("parse input");

        let output_bytes = optimize(&input).expect("optimize");
        let output = parse(&output_bytes).expect("parse output");

        let decoded = pass::decode_stream(output.program());
        let live: Vec<_> = decoded.iter().filter(|s| !s.op.is_end()).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].op.push_constant_value(), Some(7));
        assert_eq!(output.name().unwrap(), "hello");
    }
}
