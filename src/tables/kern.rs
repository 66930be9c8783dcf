#![deny(missing_docs)]

//! `kern` table parsing.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/kern>

use bitflags::bitflags;
use log::warn;
use rustc_hash::FxHashMap;

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::{I16Be, U16Be};
use crate::error::ParseError;
use crate::size;

bitflags! {
    /// Orientation and interpretation flags from the low byte of a
    /// subtable's coverage field. The upper nibble is reserved but retained.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct CoverageFlags: u8 {
        /// Bit 0: Horizontal data if set, vertical otherwise.
        const HORIZONTAL = 0b0001;
        /// Bit 1: The table has minimum values rather than kerning values.
        const MINIMUM = 0b0010;
        /// Bit 2: Kerning is perpendicular to the flow of the text.
        const CROSS_STREAM = 0b0100;
        /// Bit 3: Values replace the accumulated value instead of adding to it.
        const OVERRIDE = 0b1000;
    }
}

/// `kern` Kerning Table.
pub struct KernTable {
    /// Table version. Only version 0 is decoded.
    pub version: u16,
    /// The decoded format-0 subtables. Subtables in other formats are
    /// skipped during decoding.
    pub subtables: Vec<KernSubtable>,
}

/// Sub-table within the `kern` table.
pub struct KernSubtable {
    /// Subtable version.
    pub version: u16,
    /// Declared length of the subtable in bytes, including its header.
    pub length: u16,
    /// Decoded coverage field.
    pub coverage: Coverage,
    /// Format 0 kerning data.
    pub data: KernFormat0,
}

/// The decoded 16-bit coverage field of a kerning subtable.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Coverage {
    /// Flags from the low byte.
    pub flags: CoverageFlags,
    /// Subtable format selector from the high byte.
    pub format: u8,
}

/// Format 0 kerning data (pairs).
pub struct KernFormat0 {
    /// Number of pair records in the subtable.
    pub n_pairs: u16,
    /// The largest power of two less than or equal to the value of nPairs, multiplied by the size
    /// in bytes of an entry in the table.
    pub search_range: u16,
    /// log2 of the largest power of two less than or equal to the value of nPairs.
    pub entry_selector: u16,
    /// The value of nPairs minus the largest power of two less than or equal to nPairs, and then
    /// multiplied by the size in bytes of an entry in the table.
    pub range_shift: u16,
    /// Adjustments in font design units, keyed by glyph pair. Negative
    /// values move the pair closer together.
    pub pairs: FxHashMap<KernPair, i16>,
}

/// A glyph pair used as a kerning key.
///
/// The pair is ordered: `(left, right)` and `(right, left)` are distinct keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct KernPair {
    /// The glyph index for the left-hand glyph in the kerning pair.
    pub left: u16,
    /// The glyph index for the right-hand glyph in the kerning pair.
    pub right: u16,
}

impl KernSubtable {
    /// Size in bytes of a subtable header (version, length, coverage).
    pub const HEADER_SIZE: usize = 3 * size::U16;
}

impl ReadBinary for KernTable {
    type HostType<'a> = KernTable;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = ctxt.read_u16be()?;

        let mut subtables = Vec::with_capacity(usize::from(num_tables));
        for _ in 0..num_tables {
            let sub_version = ctxt.read_u16be()?;
            let length = ctxt.read_u16be()?;
            let coverage = Coverage::from(ctxt.read_u16be()?);
            // The declared length bounds the body, which also locates the
            // next subtable when this one can't be decoded.
            let body =
                ctxt.read_slice(usize::from(length).saturating_sub(KernSubtable::HEADER_SIZE))?;
            match KernFormat0::read_format(coverage.format, body) {
                Ok(data) => subtables.push(KernSubtable {
                    version: sub_version,
                    length,
                    coverage,
                    data,
                }),
                Err(ParseError::UnsupportedKernFormat(format)) => {
                    warn!("skipping kern subtable with unsupported format {}", format);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(KernTable { version, subtables })
    }
}

impl KernFormat0 {
    // Format 0 is the only subtable format supported by Windows.
    fn read_format(format: u8, body: &[u8]) -> Result<KernFormat0, ParseError> {
        if format != 0 {
            return Err(ParseError::UnsupportedKernFormat(format));
        }

        let mut ctxt = ReadScope::new(body).ctxt();
        let n_pairs = ctxt.read_u16be()?;
        let search_range = ctxt.read_u16be()?;
        let entry_selector = ctxt.read_u16be()?;
        let range_shift = ctxt.read_u16be()?;
        let records = ctxt.read_array::<(U16Be, U16Be, I16Be)>(usize::from(n_pairs))?;

        let mut pairs =
            FxHashMap::with_capacity_and_hasher(usize::from(n_pairs), Default::default());
        for (left, right, value) in &records {
            pairs.insert(KernPair { left, right }, value);
        }

        Ok(KernFormat0 {
            n_pairs,
            search_range,
            entry_selector,
            range_shift,
            pairs,
        })
    }

    /// Lookup the kerning adjustment for a pair of glyphs.
    pub fn lookup(&self, left: u16, right: u16) -> Option<i16> {
        self.pairs.get(&KernPair { left, right }).copied()
    }
}

impl From<u16> for Coverage {
    fn from(raw: u16) -> Coverage {
        Coverage {
            flags: CoverageFlags::from_bits_retain((raw & 0xFF) as u8),
            format: (raw >> 8) as u8,
        }
    }
}

impl Coverage {
    /// True if table has horizontal data, false if vertical.
    pub fn is_horizontal(self) -> bool {
        self.flags.contains(CoverageFlags::HORIZONTAL)
    }

    /// If true the table has minimum values, otherwise the table has kerning values.
    pub fn is_minimum(self) -> bool {
        self.flags.contains(CoverageFlags::MINIMUM)
    }

    /// Is kerning perpendicular to the flow of the text.
    pub fn is_cross_stream(self) -> bool {
        self.flags.contains(CoverageFlags::CROSS_STREAM)
    }

    /// True if the value in this table should replace the value currently being accumulated.
    pub fn is_override(self) -> bool {
        self.flags.contains(CoverageFlags::OVERRIDE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};

    fn write_subtable(ctxt: &mut WriteBuffer, coverage: u16, pairs: &[(u16, u16, i16)]) {
        let length = u16::try_from(KernSubtable::HEADER_SIZE + 8 + pairs.len() * 6).unwrap();
        U16Be::write(ctxt, 0u16).unwrap(); // version
        U16Be::write(ctxt, length).unwrap();
        U16Be::write(ctxt, coverage).unwrap();
        U16Be::write(ctxt, u16::try_from(pairs.len()).unwrap()).unwrap();
        U16Be::write(ctxt, 6u16).unwrap(); // search_range
        U16Be::write(ctxt, 0u16).unwrap(); // entry_selector
        U16Be::write(ctxt, 0u16).unwrap(); // range_shift
        for &(left, right, value) in pairs {
            U16Be::write(ctxt, left).unwrap();
            U16Be::write(ctxt, right).unwrap();
            I16Be::write(ctxt, value).unwrap();
        }
    }

    fn write_table(subtables: &[(u16, &[(u16, u16, i16)])]) -> Vec<u8> {
        let mut ctxt = WriteBuffer::new();
        U16Be::write(&mut ctxt, 0u16).unwrap(); // version
        U16Be::write(&mut ctxt, u16::try_from(subtables.len()).unwrap()).unwrap();
        for &(coverage, pairs) in subtables {
            write_subtable(&mut ctxt, coverage, pairs);
        }
        ctxt.into_inner()
    }

    #[test]
    fn test_pairs_are_order_sensitive() {
        let data = write_table(&[(0x0001, &[(65, 66, -50)])]);
        let kern = ReadScope::new(&data).read::<KernTable>().unwrap();

        assert_eq!(kern.subtables.len(), 1);
        let subtable = &kern.subtables[0];
        assert!(subtable.coverage.is_horizontal());
        assert_eq!(subtable.coverage.format, 0);
        assert_eq!(subtable.data.lookup(65, 66), Some(-50));
        assert_eq!(subtable.data.lookup(66, 65), None);
    }

    #[test]
    fn test_coverage_flags() {
        let coverage = Coverage::from(0x0205);
        assert!(coverage.is_horizontal());
        assert!(!coverage.is_minimum());
        assert!(coverage.is_cross_stream());
        assert!(!coverage.is_override());
        assert_eq!(coverage.format, 2);
    }

    #[test]
    fn test_unsupported_format_is_skipped() {
        // A format-2 subtable followed by a format-0 subtable. The first is
        // skipped over using its declared length.
        let mut ctxt = WriteBuffer::new();
        U16Be::write(&mut ctxt, 0u16).unwrap(); // version
        U16Be::write(&mut ctxt, 2u16).unwrap(); // num_tables
        U16Be::write(&mut ctxt, 0u16).unwrap(); // subtable version
        U16Be::write(&mut ctxt, 10u16).unwrap(); // length
        U16Be::write(&mut ctxt, 0x0201u16).unwrap(); // format 2, horizontal
        ctxt.write_zeros(4).unwrap(); // opaque format 2 body
        write_subtable(&mut ctxt, 0x0001, &[(1, 2, 10)]);

        let data = ctxt.into_inner();
        let kern = ReadScope::new(&data).read::<KernTable>().unwrap();
        assert_eq!(kern.subtables.len(), 1);
        assert_eq!(kern.subtables[0].data.lookup(1, 2), Some(10));
    }

    #[test]
    fn test_bad_table_version() {
        let mut ctxt = WriteBuffer::new();
        U16Be::write(&mut ctxt, 1u16).unwrap();
        U16Be::write(&mut ctxt, 0u16).unwrap();
        let data = ctxt.into_inner();

        assert!(matches!(
            ReadScope::new(&data).read::<KernTable>(),
            Err(ParseError::BadVersion)
        ));
    }
}
