//! The in-memory POFF container (§3.2, §6.1): the parsed form produced by
//! [`read::parse`](crate::poff::read::parse), borrowing its input buffer,
//! and the owned builder produced by [`Container::builder`].

use alloc::vec::Vec;

use crate::endian::{BigEndian, U16Be, U32Be};
use crate::error::{Error, ErrorKind, Result};
use crate::pod::bytes_of;
use crate::poff::header::{Architecture, FileHeader, FileType, SectionDescriptor, SectionKind};
use crate::poff::section::{DebugFunctionEntry, LineEntry, RelocationEntry, Symbol};

/// A parsed, borrowed view of a POFF file (§6.1). Every accessor returns a
/// slice borrowed from the original buffer; nothing is copied on read.
#[derive(Debug, Clone, Copy)]
pub struct Container<'data> {
    pub(crate) file_type: FileType,
    pub(crate) architecture: Architecture,
    pub(crate) entry_point: u32,
    pub(crate) name_offset: u32,
    pub(crate) program: &'data [u8],
    pub(crate) rodata: &'data [u8],
    pub(crate) symbols: &'data [Symbol],
    pub(crate) strings: &'data [u8],
    pub(crate) relocations: &'data [RelocationEntry],
    pub(crate) lines: &'data [LineEntry],
    pub(crate) debug_functions: &'data [DebugFunctionEntry],
}

impl<'data> Container<'data> {
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    /// The program-text section: the sequence of encoded opcodes (§4.1).
    pub fn program(&self) -> &'data [u8] {
        self.program
    }

    /// The read-only data section (string literals, set constants, etc).
    pub fn rodata(&self) -> &'data [u8] {
        self.rodata
    }

    pub fn symbols(&self) -> &'data [Symbol] {
        self.symbols
    }

    pub fn relocations(&self) -> &'data [RelocationEntry] {
        self.relocations
    }

    pub fn lines(&self) -> &'data [LineEntry] {
        self.lines
    }

    pub fn debug_functions(&self) -> &'data [DebugFunctionEntry] {
        self.debug_functions
    }

    /// Look up a NUL-terminated string in the string table by its offset,
    /// the way symbol and file names are stored (§3.2).
    pub fn string_at(&self, offset: u32) -> Result<&'data str> {
        let start = offset as usize;
        let bytes = self
            .strings
            .get(start..)
            .ok_or_else(|| Error::new(ErrorKind::Structural, "string offset out of range"))?;
        let end = memchr::memchr(0, bytes)
            .ok_or_else(|| Error::new(ErrorKind::Structural, "unterminated string"))?;
        core::str::from_utf8(&bytes[..end])
            .map_err(|_| Error::new(ErrorKind::Structural, "string table entry is not utf-8"))
    }

    /// The file's own name, if one was recorded.
    pub fn name(&self) -> Result<&'data str> {
        self.string_at(self.name_offset)
    }

    /// Find the source line number covering `program_offset`, by the last
    /// line-table entry at or before it (§6.4's `LINE` pseudo-op origin).
    pub fn line_for_offset(&self, program_offset: u32) -> Option<u32> {
        let idx = self
            .lines
            .partition_point(|e| e.program_offset.get(BigEndian) <= program_offset);
        if idx == 0 {
            None
        } else {
            Some(self.lines[idx - 1].line_number.get(BigEndian))
        }
    }

    /// Start building a new container (§6.2 write path).
    pub fn builder(file_type: FileType, architecture: Architecture) -> ContainerBuilder {
        ContainerBuilder::new(file_type, architecture)
    }
}

/// Accumulates sections in memory, then lays them out at fixed file
/// offsets and serializes them in a single pass via [`ContainerBuilder::
/// to_vec`].
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    file_type: FileType,
    architecture: Architecture,
    entry_point: u32,
    name_offset: u32,
    program: Vec<u8>,
    rodata: Vec<u8>,
    symbols: Vec<Symbol>,
    strings: Vec<u8>,
    relocations: Vec<RelocationEntry>,
    lines: Vec<LineEntry>,
    debug_functions: Vec<DebugFunctionEntry>,
}

impl ContainerBuilder {
    fn new(file_type: FileType, architecture: Architecture) -> ContainerBuilder {
        let mut strings = Vec::new();
        strings.push(0); // offset 0 is always the empty string.
        ContainerBuilder {
            file_type,
            architecture,
            entry_point: 0,
            name_offset: 0,
            program: Vec::new(),
            rodata: Vec::new(),
            symbols: Vec::new(),
            strings,
            relocations: Vec::new(),
            lines: Vec::new(),
            debug_functions: Vec::new(),
        }
    }

    pub fn set_entry_point(&mut self, offset: u32) -> &mut Self {
        self.entry_point = offset;
        self
    }

    /// Intern a string, returning its offset. Identical strings are not
    /// deduplicated; callers that want deduplication (e.g. the optimizer
    /// when it merges string-constant rodata) should do so themselves.
    pub fn add_string(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        offset
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name_offset = self.add_string(name);
        self
    }

    /// Append bytes to the program-text section, returning the offset they
    /// were written at.
    pub fn push_program(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.program.len() as u32;
        self.program.extend_from_slice(bytes);
        offset
    }

    /// Append bytes to the read-only data section, returning the offset
    /// they were written at.
    pub fn push_rodata(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.rodata.len() as u32;
        self.rodata.extend_from_slice(bytes);
        offset
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> &mut Self {
        self.symbols.push(symbol);
        self
    }

    pub fn add_relocation(&mut self, entry: RelocationEntry) -> &mut Self {
        self.relocations.push(entry);
        self
    }

    pub fn add_line(&mut self, program_offset: u32, line_number: u32) -> &mut Self {
        self.lines.push(LineEntry {
            program_offset: U32Be::new(BigEndian, program_offset),
            line_number: U32Be::new(BigEndian, line_number),
        });
        self
    }

    pub fn add_debug_function(&mut self, entry: DebugFunctionEntry) -> &mut Self {
        self.debug_functions.push(entry);
        self
    }

    /// Serialize to a byte vector (§6.1, §6.2): header, then section
    /// descriptors, then section payloads, in that fixed order.
    pub fn to_vec(&self) -> Vec<u8> {
        let sections: [(SectionKind, &[u8], u32); 2] = [
            (SectionKind::ProgramText, &self.program, 0),
            (SectionKind::ReadOnlyData, &self.rodata, 0),
        ];
        let typed_sections: [(SectionKind, usize, u32); 5] = [
            (
                SectionKind::SymbolTable,
                self.symbols.len() * Symbol::SIZE,
                Symbol::SIZE as u32,
            ),
            (
                SectionKind::StringTable,
                self.strings.len(),
                0,
            ),
            (
                SectionKind::RelocationTable,
                self.relocations.len() * RelocationEntry::SIZE,
                RelocationEntry::SIZE as u32,
            ),
            (
                SectionKind::LineNumberTable,
                self.lines.len() * LineEntry::SIZE,
                LineEntry::SIZE as u32,
            ),
            (
                SectionKind::DebugFunctionTable,
                self.debug_functions.len() * DebugFunctionEntry::SIZE,
                DebugFunctionEntry::SIZE as u32,
            ),
        ];

        let section_count = sections.len() + typed_sections.len();
        let mut offset = FileHeader::SIZE + section_count * SectionDescriptor::SIZE;
        let mut descriptors = Vec::with_capacity(section_count);

        for (kind, data, entry_size) in &sections {
            descriptors.push(SectionDescriptor {
                kind: kind.to_u8(),
                reserved: [0; 3],
                entry_size: U32Be::new(BigEndian, *entry_size),
                total_size: U32Be::new(BigEndian, data.len() as u32),
                file_offset: U32Be::new(BigEndian, offset as u32),
            });
            offset += data.len();
        }
        for (kind, len, entry_size) in &typed_sections {
            descriptors.push(SectionDescriptor {
                kind: kind.to_u8(),
                reserved: [0; 3],
                entry_size: U32Be::new(BigEndian, *entry_size),
                total_size: U32Be::new(BigEndian, *len as u32),
                file_offset: U32Be::new(BigEndian, offset as u32),
            });
            offset += len;
        }

        let mut out = Vec::with_capacity(offset);
        let header = FileHeader {
            magic: U32Be::new(BigEndian, crate::poff::header::MAGIC),
            version: U16Be::new(BigEndian, crate::poff::header::VERSION),
            file_type: self.file_type.to_u8(),
            architecture: self.architecture.0,
            entry_point: U32Be::new(BigEndian, self.entry_point),
            name_offset: U32Be::new(BigEndian, self.name_offset),
            section_count: U16Be::new(BigEndian, section_count as u16),
            reserved: U16Be::new(BigEndian, 0),
        };
        out.extend_from_slice(bytes_of(&header));
        for d in &descriptors {
            out.extend_from_slice(bytes_of(d));
        }
        out.extend_from_slice(&self.program);
        out.extend_from_slice(&self.rodata);
        for s in &self.symbols {
            out.extend_from_slice(bytes_of(s));
        }
        out.extend_from_slice(&self.strings);
        for r in &self.relocations {
            out.extend_from_slice(bytes_of(r));
        }
        for l in &self.lines {
            out.extend_from_slice(bytes_of(l));
        }
        for d in &self.debug_functions {
            out.extend_from_slice(bytes_of(d));
        }
        out
    }
}
