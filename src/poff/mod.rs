//! The POFF container format (§3.2, §6.1): file header, section
//! descriptors, and the seven section kinds a compiled program, unit, or
//! linked executable may carry.

pub mod container;
pub mod header;
#[cfg(feature = "read_core")]
pub mod read;
pub mod section;
#[cfg(feature = "write_core")]
pub mod write;

pub use container::{Container, ContainerBuilder};
pub use header::{Architecture, FileHeader, FileType, SectionDescriptor, SectionKind};
pub use section::{
    DebugFunctionEntry, LineEntry, RelocationBase, RelocationEntry, Symbol, SymbolKind,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poff::read::parse;

    #[test]
    fn round_trip_empty_program() {
        let mut b = Container::builder(FileType::Program, Architecture::PMACHINE16);
        b.set_name("hello");
        b.set_entry_point(0);
        let bytes = b.to_vec();

        let c = parse(&bytes).expect("parse");
        assert_eq!(c.file_type(), FileType::Program);
        assert_eq!(c.architecture(), Architecture::PMACHINE16);
        assert_eq!(c.name().unwrap(), "hello");
        assert_eq!(c.program().len(), 0);
    }

    #[test]
    fn round_trip_program_bytes_and_symbol() {
        let mut b = Container::builder(FileType::Program, Architecture::PMACHINE16);
        let off = b.push_program(&[0x01, 0x02, 0x03]);
        assert_eq!(off, 0);
        let name = b.add_string("main");
        b.add_symbol(Symbol {
            name_offset: crate::endian::U32Be::new(crate::endian::BigEndian, name),
            value: crate::endian::U32Be::new(crate::endian::BigEndian, 0),
            level: crate::endian::U16Be::new(crate::endian::BigEndian, 0),
            kind: SymbolKind::Procedure.to_u8(),
            reserved: 0,
        });
        let bytes = b.to_vec();

        let c = parse(&bytes).expect("parse");
        assert_eq!(c.program(), &[0x01, 0x02, 0x03]);
        assert_eq!(c.symbols().len(), 1);
        assert_eq!(
            c.string_at(c.symbols()[0].name_offset.get(crate::endian::BigEndian))
                .unwrap(),
            "main"
        );
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = Container::builder(FileType::Program, Architecture::PMACHINE16).to_vec();
        bytes[0] = 0;
        assert!(parse(&bytes).is_err());
    }

    #[test]
    fn line_lookup_finds_nearest_preceding_entry() {
        let mut b = Container::builder(FileType::Program, Architecture::PMACHINE16);
        b.add_line(0, 1);
        b.add_line(10, 2);
        b.add_line(20, 5);
        let bytes = b.to_vec();
        let c = parse(&bytes).expect("parse");
        assert_eq!(c.line_for_offset(0), Some(1));
        assert_eq!(c.line_for_offset(5), Some(1));
        assert_eq!(c.line_for_offset(10), Some(2));
        assert_eq!(c.line_for_offset(25), Some(5));
    }
}
