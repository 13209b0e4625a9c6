//! The collaborators spec.md §1 calls out of core scope: the standard
//! library implementations (file I/O, string library, set operations,
//! floating point) and environment access. The interpreter only decodes a
//! `SYSIO`/`LIB`/`SETOP`/`FLOAT`/`OSOP getenv` sub-opcode and hands
//! dispatch to a [`Host`] implementation, which is responsible for
//! popping its own arguments from the data/string stack and pushing its
//! own results — the order and position is documented per-namespace in
//! SPEC_FULL.md's external-interface tables, mirrored by [`crate::subop`].

use crate::error::Result;
use crate::machine::Machine;
use crate::subop::{FloatOp, LibOp, SetOp, SysIoOp};

/// Implemented by the embedder to supply the behavior of every namespace
/// spec.md §1 treats as an external collaborator.
pub trait Host {
    fn sysio(&mut self, op: SysIoOp, machine: &mut Machine<'_>) -> Result<()>;
    fn lib(&mut self, op: LibOp, machine: &mut Machine<'_>) -> Result<()>;
    fn setop(&mut self, op: SetOp, machine: &mut Machine<'_>) -> Result<()>;
    fn float(&mut self, op: FloatOp, machine: &mut Machine<'_>) -> Result<()>;

    /// `OSOP getenv`: read an environment variable named by the string at
    /// `TOS(0)` and leave the result string in its place. The rest of the
    /// `OSOP` namespace (`exit`, `new`, `dispose`, `spawn`) touches memory
    /// the core interpreter itself owns (the exit code, the heap, and
    /// sub-interpreter creation) and is handled directly by [`Machine`]
    /// rather than delegated here.
    fn getenv(&mut self, machine: &mut Machine<'_>) -> Result<()>;
}

/// A [`Host`] that fails every call. Useful for tests and for `prun`
/// runs where the program under test never exercises one of these
/// namespaces.
#[derive(Debug, Default)]
pub struct UnsupportedHost;

impl Host for UnsupportedHost {
    fn sysio(&mut self, _op: SysIoOp, _machine: &mut Machine<'_>) -> Result<()> {
        Err(crate::error::Error::runtime("SYSIO: no host I/O backend configured"))
    }

    fn lib(&mut self, _op: LibOp, _machine: &mut Machine<'_>) -> Result<()> {
        Err(crate::error::Error::runtime("LIB: no host string library configured"))
    }

    fn setop(&mut self, _op: SetOp, _machine: &mut Machine<'_>) -> Result<()> {
        Err(crate::error::Error::runtime("SETOP: no host set-operations backend configured"))
    }

    fn float(&mut self, _op: FloatOp, _machine: &mut Machine<'_>) -> Result<()> {
        Err(crate::error::Error::runtime("FLOAT: no host floating-point backend configured"))
    }

    fn getenv(&mut self, _machine: &mut Machine<'_>) -> Result<()> {
        Err(crate::error::Error::runtime("OSOP getenv: no host environment backend configured"))
    }
}
