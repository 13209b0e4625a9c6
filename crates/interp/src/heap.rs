//! The explicit allocate/dispose heap used by `OSOP new`/`OSOP dispose`
//! (§3.3, §4.5). No garbage collection (spec.md §1 Non-goals): a block is
//! only reclaimed when the program disposes it, and a disposed block is
//! simply pushed onto a free list keyed by size class rather than merged
//! with its neighbors — good enough for the allocation patterns a Pascal
//! heap sees, not a general-purpose allocator.

use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Heap {
    base: usize,
    top: usize,
    bump: usize,
    free: HashMap<usize, Vec<usize>>,
}

impl Heap {
    pub fn new(base: usize, size: usize) -> Heap {
        Heap {
            base,
            top: base + size,
            bump: base,
            free: HashMap::new(),
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn bump(&self) -> usize {
        self.bump
    }

    /// Allocate `size` bytes, returning the offset into the interpreter's
    /// memory buffer. Reuses a disposed block of the same size before
    /// growing the bump pointer.
    pub fn allocate(&mut self, size: usize) -> Result<usize> {
        if let Some(blocks) = self.free.get_mut(&size) {
            if let Some(offset) = blocks.pop() {
                return Ok(offset);
            }
        }
        let offset = self.bump;
        let end = offset
            .checked_add(size)
            .ok_or_else(|| Error::heap("heap allocation size overflow"))?;
        if end > self.top {
            return Err(Error::heap("heap exhausted"));
        }
        self.bump = end;
        Ok(offset)
    }

    /// Return a previously allocated block to the free list for its size
    /// class. `size` must match the size passed to the `allocate` call that
    /// produced `offset` — the interpreter tracks this per §4.5's "heap is
    /// explicit allocate/dispose" model, not by a header on the block.
    pub fn dispose(&mut self, offset: usize, size: usize) {
        self.free.entry(size).or_default().push(offset);
    }
}
