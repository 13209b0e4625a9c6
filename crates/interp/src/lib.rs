//! A P-machine interpreter (§3.3, §4.5) for linked POFF executable images.
//!
//! The core here only implements opcodes that touch interpreter-owned
//! state (the data/string stack, the heap, the frame chain). File I/O,
//! the string library, set operations and floating point are treated as
//! external collaborators behind the [`Host`] trait — see its module doc
//! comment for why.

pub mod dispatch;
pub mod error;
pub mod heap;
pub mod host;
pub mod machine;
pub mod subop;

pub use error::{Error, ErrorKind, Result};
pub use host::{Host, UnsupportedHost};
pub use machine::{Machine, DEFAULT_GLOBALS, DEFAULT_HEAP, DEFAULT_STACK, DEFAULT_STRSTACK};

/// Region sizes for a [`Machine`], in bytes. Defaults mirror `prun`'s
/// `-a`/`-s`/`-t`/`-n` flags (§6.4).
#[derive(Debug, Clone, Copy)]
pub struct Regions {
    pub globals: usize,
    pub stack: usize,
    pub string_stack: usize,
    pub heap: usize,
}

impl Default for Regions {
    fn default() -> Self {
        Regions {
            globals: DEFAULT_GLOBALS,
            stack: DEFAULT_STACK,
            string_stack: DEFAULT_STRSTACK,
            heap: DEFAULT_HEAP,
        }
    }
}

/// Parse `image` as a linked POFF executable and run it to completion
/// against `host`, returning the Pascal program's exit code (`0` if it
/// never called `OSOP exit`).
pub fn run(image: &[u8], regions: Regions, host: &mut impl Host) -> Result<i32> {
    let container = poff::poff::read::parse(image).map_err(Error::parse)?;
    let mut machine = Machine::new(
        container.program(),
        container.rodata(),
        container.entry_point() as usize,
        regions.globals,
        regions.stack,
        regions.string_stack,
        regions.heap,
    );
    dispatch::run(&mut machine, host)
}
