//! Parsing a POFF byte buffer into a [`Container`] (§6.1, §4.2 read path).

#[cfg(feature = "logging")]
use log::debug;

use crate::endian::BigEndian;
use crate::error::{Error, ErrorKind, Result};
use crate::pod::{from_bytes, slice_from_bytes};
use crate::poff::container::Container;
use crate::poff::header::{Architecture, FileHeader, FileType, SectionDescriptor, SectionKind, MAGIC};
use crate::poff::section::{DebugFunctionEntry, LineEntry, RelocationEntry, Symbol};

fn section_bytes<'data>(data: &'data [u8], d: &SectionDescriptor) -> Result<&'data [u8]> {
    let start = d.file_offset.get(BigEndian) as usize;
    let len = d.total_size.get(BigEndian) as usize;
    let end = start
        .checked_add(len)
        .ok_or_else(|| Error::new(ErrorKind::Structural, "section extends past usize range"))?;
    data.get(start..end)
        .ok_or_else(|| Error::new(ErrorKind::Structural, "section out of bounds"))
}

fn typed_section<'data, T: crate::pod::Pod>(
    data: &'data [u8],
    d: &SectionDescriptor,
) -> Result<&'data [T]> {
    let bytes = section_bytes(data, d)?;
    let size = core::mem::size_of::<T>();
    if size == 0 || bytes.len() % size != 0 {
        return Err(Error::new(
            ErrorKind::Structural,
            "section size is not a multiple of its record size",
        ));
    }
    let count = bytes.len() / size;
    let (slice, _) = slice_from_bytes(bytes, count)
        .map_err(|()| Error::new(ErrorKind::Structural, "misaligned section"))?;
    Ok(slice)
}

/// Parse a complete POFF file from `data` (§4.2). Every field returned by
/// the resulting [`Container`] borrows directly from `data`; nothing is
/// copied.
pub fn parse(data: &[u8]) -> Result<Container<'_>> {
    let (header, _): (&FileHeader, _) =
        from_bytes(data).map_err(|()| Error::new(ErrorKind::Structural, "file too short for header"))?;
    if header.magic.get(BigEndian) != MAGIC {
        return Err(Error::new(ErrorKind::Structural, "bad POFF magic"));
    }
    let file_type = FileType::from_u8(header.file_type)
        .ok_or_else(|| Error::new(ErrorKind::Structural, "unknown file type"))?;
    let architecture = Architecture(header.architecture);
    let section_count = header.section_count.get(BigEndian) as usize;

    let descriptors_offset = FileHeader::SIZE;
    let descriptors_end = descriptors_offset
        .checked_add(section_count * SectionDescriptor::SIZE)
        .ok_or_else(|| Error::new(ErrorKind::Structural, "section table overflows usize"))?;
    let descriptor_bytes = data
        .get(descriptors_offset..descriptors_end)
        .ok_or_else(|| Error::new(ErrorKind::Structural, "truncated section table"))?;
    let (descriptors, _): (&[SectionDescriptor], _) = slice_from_bytes(descriptor_bytes, section_count)
        .map_err(|()| Error::new(ErrorKind::Structural, "misaligned section table"))?;

    let mut program: &[u8] = &[];
    let mut rodata: &[u8] = &[];
    let mut symbols: &[Symbol] = &[];
    let mut strings: &[u8] = &[];
    let mut relocations: &[RelocationEntry] = &[];
    let mut lines: &[LineEntry] = &[];
    let mut debug_functions: &[DebugFunctionEntry] = &[];

    for d in descriptors {
        let kind = SectionKind::from_u8(d.kind)
            .ok_or_else(|| Error::new(ErrorKind::Structural, "unknown section kind"))?;
        match kind {
            SectionKind::ProgramText => program = section_bytes(data, d)?,
            SectionKind::ReadOnlyData => rodata = section_bytes(data, d)?,
            SectionKind::SymbolTable => symbols = typed_section(data, d)?,
            SectionKind::StringTable => strings = section_bytes(data, d)?,
            SectionKind::RelocationTable => relocations = typed_section(data, d)?,
            SectionKind::LineNumberTable => lines = typed_section(data, d)?,
            SectionKind::DebugFunctionTable => debug_functions = typed_section(data, d)?,
        }
    }

    #[cfg(feature = "logging")]
    debug!(
        "parse: {section_count} section(s), {} byte(s) program text, {} symbol(s), {} relocation(s)",
        program.len(),
        symbols.len(),
        relocations.len()
    );

    Ok(Container {
        file_type,
        architecture,
        entry_point: header.entry_point.get(BigEndian),
        name_offset: header.name_offset.get(BigEndian),
        program,
        rodata,
        symbols,
        strings,
        relocations,
        lines,
        debug_functions,
    })
}
