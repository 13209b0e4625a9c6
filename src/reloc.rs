//! The relocation engine (§4.3): final section-base relocation, and
//! cross-pass relocation tracking for the optimizer.

use alloc::vec::Vec;

#[cfg(feature = "logging")]
use log::debug;

use crate::endian::BigEndian;
use crate::error::{Error, ErrorKind, Result};
use crate::opcode::Opcode;
use crate::poff::section::{RelocationBase, RelocationEntry};

/// A single pending relocation: an opcode whose `arg2` still needs a
/// section base added before it is a final program offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// Offset, in the program-text section, of the opcode to relocate.
    pub program_offset: u32,
    pub base: RelocationBase,
}

impl Relocation {
    pub fn from_entry(entry: &RelocationEntry) -> Result<Relocation> {
        let base = RelocationBase::from_u8(entry.base)
            .ok_or_else(|| Error::new(ErrorKind::Relocation, "unknown relocation base"))?;
        Ok(Relocation {
            program_offset: entry.program_offset.get(BigEndian),
            base,
        })
    }
}

/// Walk a decoded instruction stream once, applying every relocation in
/// `relocs` (which must be in strictly ascending `program_offset` order) by
/// adding the matching section base to the opcode's `arg2` field, and
/// stopping at the `END` sentinel (§4.3, §4.5).
///
/// This is the *final* relocation pass: it runs once, after the optimizer
/// has finished, and turns every still-relative `arg2` into an absolute
/// program or rodata offset. It is not used between optimizer passes;
/// see [`RelocationTracker`] for that.
pub fn finalize_relocations(
    instructions: &mut [Opcode],
    relocs: &[Relocation],
    program_base: u32,
    rodata_base: u32,
) -> Result<()> {
    let mut reloc_iter = relocs.iter().peekable();
    let mut last_offset: Option<u32> = None;
    let mut program_offset: u32 = 0;

    for insn in instructions.iter_mut() {
        if insn.is_end() {
            break;
        }
        while let Some(r) = reloc_iter.peek() {
            if r.program_offset > program_offset {
                break;
            }
            if r.program_offset < program_offset {
                return Err(Error::new(
                    ErrorKind::Relocation,
                    "relocation offset does not match any instruction boundary",
                ));
            }
            if let Some(last) = last_offset {
                if r.program_offset <= last {
                    return Err(Error::new(
                        ErrorKind::Relocation,
                        "relocations are not in strictly ascending order",
                    ));
                }
            }
            let base = match r.base {
                RelocationBase::ProgramText => program_base,
                RelocationBase::ReadOnlyData => rodata_base,
            };
            let cur = insn.arg2 as i64;
            let relocated = cur + base as i64;
            if relocated < i32::from(i16::MIN) as i64 || relocated > u16::MAX as i64 {
                return Err(Error::new(ErrorKind::Relocation, "relocated arg2 overflowed"));
            }
            insn.arg2 = relocated as i32;
            last_offset = Some(r.program_offset);
            reloc_iter.next();
        }
        program_offset += insn.len() as u32;
    }

    if reloc_iter.peek().is_some() {
        return Err(Error::new(
            ErrorKind::Relocation,
            "relocations left over after the instruction stream ended",
        ));
    }
    #[cfg(feature = "logging")]
    debug!(
        "finalize_relocations: rewrote {} relocation(s) against program_base={program_base:#x}, rodata_base={rodata_base:#x}",
        relocs.len()
    );
    Ok(())
}

/// Tracks relocations across one optimizer pass (§4.3, §9 open question).
///
/// Each pass consumes the relocations recorded against the *previous*
/// pass's output offsets (in strictly ascending order) and emits new ones
/// against its own output offsets. A pass that leaves previous-pass
/// relocations unconsumed, or consumes them out of order, is a bug in that
/// pass's offset bookkeeping, not a tolerable case — `take_for_input_offset`
/// and `swap_for_next_pass` enforce that intentionally, the way the
/// compiler's own peephole optimizer was specified to.
#[derive(Debug, Default)]
pub struct RelocationTracker {
    previous: Vec<Relocation>,
    previous_cursor: usize,
    current: Vec<Relocation>,
}

impl RelocationTracker {
    pub fn new(initial: Vec<Relocation>) -> RelocationTracker {
        RelocationTracker {
            previous: initial,
            previous_cursor: 0,
            current: Vec::new(),
        }
    }

    /// Consume every relocation recorded at or before `input_offset` in the
    /// previous pass's coordinate space. Returns an error if the next
    /// unconsumed relocation is strictly less than `input_offset` (it
    /// should have been consumed by an earlier call, and the pass skipped
    /// over its instruction without accounting for it).
    pub fn take_for_input_offset(&mut self, input_offset: u32) -> Result<Vec<Relocation>> {
        let mut taken = Vec::new();
        while let Some(r) = self.previous.get(self.previous_cursor) {
            if r.program_offset > input_offset {
                break;
            }
            taken.push(*r);
            self.previous_cursor += 1;
        }
        if let Some(r) = self.previous.get(self.previous_cursor) {
            if r.program_offset < input_offset {
                return Err(Error::new(
                    ErrorKind::Relocation,
                    "a previous-pass relocation was skipped over",
                ));
            }
        }
        Ok(taken)
    }

    /// Record a relocation against the pass currently being built.
    pub fn emit(&mut self, program_offset: u32, base: RelocationBase) {
        self.current.push(Relocation {
            program_offset,
            base,
        });
    }

    /// Finish this pass: verify every previous-pass relocation was
    /// consumed, and hand back the tracker ready for the next pass.
    pub fn swap_for_next_pass(mut self) -> Result<RelocationTracker> {
        if self.previous_cursor != self.previous.len() {
            return Err(Error::new(
                ErrorKind::Relocation,
                "relocations were left unconsumed at the end of a pass",
            ));
        }
        self.current.sort_by_key(|r| r.program_offset);
        #[cfg(feature = "logging")]
        debug!(
            "RelocationTracker: pass emitted {} relocation(s) for the next pass",
            self.current.len()
        );
        Ok(RelocationTracker {
            previous: core::mem::take(&mut self.current),
            previous_cursor: 0,
            current: Vec::new(),
        })
    }

    /// The relocations recorded so far for the pass under construction.
    pub fn current(&self) -> &[Relocation] {
        &self.current
    }

    /// Finish tracking and return the final pass's relocations, to be
    /// written into the container's relocation table (§4.3) or consumed by
    /// [`finalize_relocations`].
    pub fn into_relocations(self) -> Vec<Relocation> {
        self.current
    }
}
