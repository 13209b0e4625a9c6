//! POFF on-disk structures (§6.1).
//!
//! Big-endian throughout, regardless of host byte order. Every struct here
//! is `#[repr(C)]` and built only from the `endian` wrapper types so it can
//! be cast directly to/from bytes with [`crate::pod`].

use crate::endian::{BigEndian, U16Be, U32Be};
use crate::pod::Pod;

/// `"POFF"` read as a big-endian `u32`.
pub const MAGIC: u32 = 0x504f_4646;

/// The current on-disk format version.
pub const VERSION: u16 = 1;

/// File type tag (§3.2, §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileType {
    /// A compiled Pascal `PROGRAM`.
    Program,
    /// A compiled Pascal `UNIT`.
    Unit,
    /// A linked, directly executable image (a `.pex` file).
    Executable,
}

impl FileType {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            FileType::Program => 0,
            FileType::Unit => 1,
            FileType::Executable => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<FileType> {
        match v {
            0 => Some(FileType::Program),
            1 => Some(FileType::Unit),
            2 => Some(FileType::Executable),
            _ => None,
        }
    }
}

/// Target architecture tag. Only one target exists today (the 16-bit
/// P-machine), but the field is kept distinct from `FileType` so a later
/// 32-bit P-machine variant doesn't need a format break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Architecture(pub u8);

impl Architecture {
    /// The only architecture this crate's interpreter implements.
    pub const PMACHINE16: Architecture = Architecture(1);
}

/// The kind of a POFF section (§3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SectionKind {
    ProgramText,
    ReadOnlyData,
    SymbolTable,
    StringTable,
    RelocationTable,
    LineNumberTable,
    DebugFunctionTable,
}

impl SectionKind {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            SectionKind::ProgramText => 0,
            SectionKind::ReadOnlyData => 1,
            SectionKind::SymbolTable => 2,
            SectionKind::StringTable => 3,
            SectionKind::RelocationTable => 4,
            SectionKind::LineNumberTable => 5,
            SectionKind::DebugFunctionTable => 6,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<SectionKind> {
        match v {
            0 => Some(SectionKind::ProgramText),
            1 => Some(SectionKind::ReadOnlyData),
            2 => Some(SectionKind::SymbolTable),
            3 => Some(SectionKind::StringTable),
            4 => Some(SectionKind::RelocationTable),
            5 => Some(SectionKind::LineNumberTable),
            6 => Some(SectionKind::DebugFunctionTable),
            _ => None,
        }
    }

    /// The number of section kinds that can appear in a file header.
    pub(crate) const COUNT: usize = 7;
}

/// The fixed-size file header (§6.1): magic, version, file type,
/// architecture, entry point, file-name string index, and one section
/// descriptor per kind that is present.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct FileHeader {
    pub magic: U32Be,
    pub version: U16Be,
    pub file_type: u8,
    pub architecture: u8,
    pub entry_point: U32Be,
    pub name_offset: U32Be,
    pub section_count: U16Be,
    pub reserved: U16Be,
}

unsafe impl Pod for FileHeader {}

impl FileHeader {
    pub const SIZE: usize = core::mem::size_of::<FileHeader>();

    pub fn new(file_type: FileType, architecture: Architecture) -> FileHeader {
        FileHeader {
            magic: U32Be::new(BigEndian, MAGIC),
            version: U16Be::new(BigEndian, VERSION),
            file_type: file_type.to_u8(),
            architecture: architecture.0,
            entry_point: U32Be::new(BigEndian, 0),
            name_offset: U32Be::new(BigEndian, 0),
            section_count: U16Be::new(BigEndian, 0),
            reserved: U16Be::new(BigEndian, 0),
        }
    }
}

/// One section descriptor following the file header (§6.1).
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SectionDescriptor {
    pub kind: u8,
    pub reserved: [u8; 3],
    /// Size of one record, for fixed-record sections (symbols, relocations,
    /// line numbers, debug-function records). `0` for byte-stream sections
    /// (program text, read-only data).
    pub entry_size: U32Be,
    /// Total size in bytes of this section's data on disk.
    pub total_size: U32Be,
    /// Absolute file offset of the first byte of this section's data.
    pub file_offset: U32Be,
}

unsafe impl Pod for SectionDescriptor {}

impl SectionDescriptor {
    pub const SIZE: usize = core::mem::size_of::<SectionDescriptor>();
}

unsafe impl Pod for [u8; 3] {}
