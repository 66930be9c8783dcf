//! Parsing of the `loca` table.
//!
//! > The indexToLoc table stores the offsets to the locations of the glyphs in the font, relative
//! > to the beginning of the glyphData table.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>

use crate::binary::read::{ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>
#[derive(Clone, Debug)]
pub struct LocaTable {
    pub offsets: LocaOffsets,
}

#[derive(Clone, Debug)]
pub enum LocaOffsets {
    Short(Vec<u16>),
    Long(Vec<u32>),
}

impl ReadBinaryDep for LocaTable {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = LocaTable;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font. The value for `num_glyphs` is found in
    ///   the 'maxp' table.
    /// * `index_to_loc_format` specifies whether the offsets in the `loca` table are short or
    ///   long. This value can be read from the `head` table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let num_glyphs = usize::from(num_glyphs);
        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => {
                // The actual local offset divided by 2 is stored. The value of n is numGlyphs + 1.
                LocaOffsets::Short(ctxt.read_array::<U16Be>(num_glyphs + 1)?.to_vec())
            }
            IndexToLocFormat::Long => {
                // The actual local offset is stored. The value of n is numGlyphs + 1.
                LocaOffsets::Long(ctxt.read_array::<U32Be>(num_glyphs + 1)?.to_vec())
            }
        };

        Ok(LocaTable { offsets })
    }
}

impl LocaOffsets {
    /// Iterate the resolved byte offsets in this table.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        // NOTE(unwrap): Safe as iteration is bounded by len
        (0..self.len()).map(move |index| self.get(index).unwrap())
    }

    /// Returns the number of offsets in the table.
    pub fn len(&self) -> usize {
        match self {
            LocaOffsets::Short(offsets) => offsets.len(),
            LocaOffsets::Long(offsets) => offsets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the byte offset stored at `index`.
    ///
    /// Short format entries hold half the true byte offset and are doubled here.
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            LocaOffsets::Short(offsets) => {
                offsets.get(index).map(|&offset| u32::from(offset) * 2)
            }
            LocaOffsets::Long(offsets) => offsets.get(index).copied(),
        }
    }

    /// Get the last offset in the table.
    ///
    /// Returns `None` if the table is empty.
    pub fn last(&self) -> Option<u32> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::binary::write::{WriteBuffer, WriteContext};

    #[test]
    fn test_short_offsets_are_doubled() {
        let mut ctxt = WriteBuffer::new();
        ctxt.write_vec::<U16Be, _>(vec![0u16, 100]).unwrap();
        let loca = ReadScope::new(ctxt.bytes())
            .read_dep::<LocaTable>((1, IndexToLocFormat::Short))
            .unwrap();

        assert_eq!(loca.offsets.len(), 2);
        assert_eq!(loca.offsets.get(1), Some(200));
    }

    #[test]
    fn test_long_offsets_are_stored_directly() {
        let mut ctxt = WriteBuffer::new();
        ctxt.write_vec::<U32Be, _>(vec![0u32, 200]).unwrap();
        let loca = ReadScope::new(ctxt.bytes())
            .read_dep::<LocaTable>((1, IndexToLocFormat::Long))
            .unwrap();

        assert_eq!(loca.offsets.get(1), Some(200));
        assert_eq!(loca.offsets.last(), Some(200));
    }

    #[test]
    fn test_truncated_table() {
        let data = [0u8, 0, 0];
        let result = ReadScope::new(&data).read_dep::<LocaTable>((1, IndexToLocFormat::Short));
        assert_eq!(result.err(), Some(ParseError::BadEof));
    }
}
