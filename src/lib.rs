//! Instruction encoding, object file format and relocation engine for a
//! 16-bit P-machine bytecode toolchain.
//!
//! This crate implements the pieces shared by the toolchain's optimizer,
//! interpreter and lister: the opcode encoder/decoder (`opcode`), the POFF
//! object container (`poff`), and the relocation engine used both to
//! finalize a container and to track relocations across optimizer passes
//! (`reloc`).
//!
//! # Features
//!
//! - `read_core`/`read`: parse POFF containers and decode opcodes.
//! - `write_core`/`write_std`/`write`: build and serialize POFF containers.
//! - `std`: enables `std::error::Error` impls and other std-only glue.
//! - `unaligned`: treat all structures as unaligned reads (on by default
//!   via `read`; POFF's own layout has no type with an alignment
//!   requirement above 1, but this covers hosts that hand back misaligned
//!   buffers).
//! - `logging`: emit `log` diagnostics from the relocation engine and
//!   container I/O.

#![cfg_attr(not(feature = "std"), no_std)]

#[allow(unused_extern_crates)]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "rustc-dep-of-std")]
extern crate rustc_std_workspace_core as core;
#[cfg(feature = "rustc-dep-of-std")]
extern crate rustc_std_workspace_alloc as alloc;

pub mod endian;
pub mod error;
pub mod opcode;
pub mod pod;
pub mod poff;
pub mod reloc;

pub use error::{Error, ErrorKind, Result};
pub use opcode::{ArgForm, DOp, LogicalOp, Opcode};
pub use poff::{
    Architecture, Container, ContainerBuilder, FileType, RelocationBase, SectionKind,
};
