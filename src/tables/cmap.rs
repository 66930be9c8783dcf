//! Parsing of the `cmap` table.
//!
//! Decoding walks the Windows Unicode encoding records and merges their
//! format 4 (segment mapping) and format 12 (sequential group) subtables
//! into a single glyph-to-character association.

use std::convert::TryFrom;

use log::warn;
use rustc_hash::FxHashMap;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::ParseError;
use crate::size;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
    pub const CUSTOM: PlatformId = PlatformId(4);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);

    pub const MACINTOSH_APPLE_ROMAN: EncodingId = EncodingId(0);
}

/// The encoding records whose subtables contribute to the character map.
const SUPPORTED_ENCODINGS: [(PlatformId, EncodingId); 3] = [
    (PlatformId::WINDOWS, EncodingId::WINDOWS_SYMBOL),
    (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2),
    (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_UCS4),
];

/// `cmap` table header and encoding record list.
pub struct Cmap<'a> {
    scope: ReadScope<'a>,
    encoding_records: ReadArray<'a, EncodingRecord>,
}

pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    /// Subtable offset in bytes from the start of the cmap table.
    pub offset: u32,
}

/// A decoded character map subtable.
pub enum CmapSubtable<'a> {
    Format4 {
        language: u16,
        end_codes: ReadArray<'a, U16Be>,
        start_codes: ReadArray<'a, U16Be>,
        id_deltas: ReadArray<'a, I16Be>,
        id_range_offsets: ReadArray<'a, U16Be>,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format12 {
        language: u32,
        groups: ReadArray<'a, SequentialMapGroup>,
    },
}

pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

/// Association from glyph identifier to the character code it renders.
///
/// When several character codes resolve to one glyph the last one decoded
/// is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterMap {
    map: FxHashMap<u16, u32>,
}

impl ReadBinary for Cmap<'_> {
    type HostType<'a> = Cmap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?;
        Ok(Cmap {
            scope,
            encoding_records,
        })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);
    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

impl ReadBinary for CmapSubtable<'_> {
    type HostType<'a> = CmapSubtable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let subtable_format = ctxt.read_u16be()?;
        match subtable_format {
            4 => {
                let length = usize::from(ctxt.read_u16be()?);
                let language = ctxt.read_u16be()?;
                let seg_count_x2 = usize::from(ctxt.read_u16be()?);
                ctxt.check((seg_count_x2 & 1) == 0)?;
                let seg_count = seg_count_x2 >> 1;
                let _search_range = ctxt.read_u16be()?;
                let _entry_selector = ctxt.read_u16be()?;
                let _range_shift = ctxt.read_u16be()?;
                let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let reserved_pad = ctxt.read_u16be()?;
                if reserved_pad != 0 && end_codes.last() != Some(0xFFFF) {
                    return Err(ParseError::MalformedCmap);
                }
                let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
                let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
                ctxt.check(length >= (8 + (4 * seg_count)) * size::U16)?;
                let remaining = length - ((8 + (4 * seg_count)) * size::U16);
                ctxt.check((remaining & 1) == 0)?;
                let num_indices = remaining >> 1;
                let glyph_id_array = ctxt.read_array::<U16Be>(num_indices)?;
                Ok(CmapSubtable::Format4 {
                    language,
                    end_codes,
                    start_codes,
                    id_deltas,
                    id_range_offsets,
                    glyph_id_array,
                })
            }
            12 => {
                let reserved = ctxt.read_u16be()?;
                ctxt.check(reserved == 0)?;
                let _length = ctxt.read_u32be()?;
                let language = ctxt.read_u32be()?;
                let num_groups = usize::try_from(ctxt.read_u32be()?)?;
                let groups = ctxt.read_array::<SequentialMapGroup>(num_groups)?;
                Ok(CmapSubtable::Format12 { language, groups })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReadFrom for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);
    fn read_from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

impl<'a> Cmap<'a> {
    /// Find the first encoding record for the given `platform_id` and `encoding_id`
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<EncodingRecord> {
        self.encoding_records.iter().find(|record| {
            record.platform_id == platform_id.0 && record.encoding_id == encoding_id.0
        })
    }

    /// Build the glyph-to-character association from the Windows Unicode
    /// subtables of this table.
    ///
    /// Subtables in unsupported formats and subtables that fail to decode
    /// are skipped. If no subtable contributes,
    /// [`ParseError::UnsuitableCmap`] is returned; tables decoded earlier in
    /// the pipeline are unaffected.
    pub fn character_map(&self) -> Result<CharacterMap, ParseError> {
        let mut char_map = CharacterMap::default();
        let mut decoded_any = false;
        for record in self.encoding_records.iter().filter(|record| {
            SUPPORTED_ENCODINGS
                .iter()
                .any(|&(platform, encoding)| {
                    record.platform_id == platform.0 && record.encoding_id == encoding.0
                })
        }) {
            let offset = usize::try_from(record.offset)?;
            let result = self
                .scope
                .offset(offset)
                .read::<CmapSubtable<'_>>()
                .and_then(|subtable| subtable.collect_mappings(&mut char_map));
            match result {
                Ok(()) => decoded_any = true,
                Err(err) => warn!(
                    "skipping cmap subtable for platform {} encoding {}: {}",
                    record.platform_id, record.encoding_id, err
                ),
            }
        }

        if decoded_any {
            Ok(char_map)
        } else {
            Err(ParseError::UnsuitableCmap)
        }
    }
}

impl<'a> CmapSubtable<'a> {
    /// Record every (glyph, character) association of this subtable.
    fn collect_mappings(&self, char_map: &mut CharacterMap) -> Result<(), ParseError> {
        match self {
            CmapSubtable::Format4 {
                end_codes,
                start_codes,
                id_deltas,
                id_range_offsets,
                glyph_id_array,
                ..
            } => {
                for i in 0..end_codes.len() {
                    let end = end_codes.get_item(i).ok_or(ParseError::BadIndex)?;
                    let start = start_codes.get_item(i).ok_or(ParseError::BadIndex)?;
                    let id_delta = id_deltas.get_item(i).ok_or(ParseError::BadIndex)?;
                    let id_range_offset =
                        usize::from(id_range_offsets.get_item(i).ok_or(ParseError::BadIndex)?);
                    if start > end {
                        return Err(ParseError::BadValue);
                    }
                    for code in start..=end {
                        let glyph_id = if id_range_offset == 0 {
                            (i32::from(code) + i32::from(id_delta)) as u16
                        } else {
                            // The offset is relative to the location of the
                            // idRangeOffset value itself, which sits i
                            // entries into the idRangeOffset array, directly
                            // before the glyph id array.
                            let glyph_id_offset = id_range_offset
                                + i * 2
                                + usize::from(code - start) * 2;
                            if glyph_id_offset >= id_range_offsets.len() * 2
                                && (glyph_id_offset & 1) == 0
                            {
                                let index = (glyph_id_offset >> 1) - id_range_offsets.len();
                                glyph_id_array
                                    .get_item(index)
                                    .ok_or(ParseError::BadIndex)?
                            } else {
                                return Err(ParseError::BadIndex);
                            }
                        };
                        char_map.map.insert(glyph_id, u32::from(code));
                    }
                }
                Ok(())
            }
            CmapSubtable::Format12 { groups, .. } => {
                for group in groups {
                    if group.start_char_code > group.end_char_code {
                        return Err(ParseError::BadValue);
                    }
                    for (index, code) in
                        (group.start_char_code..=group.end_char_code).enumerate()
                    {
                        let glyph_id = group
                            .start_glyph_id
                            .checked_add(u32::try_from(index)?)
                            .ok_or(ParseError::BadValue)?;
                        char_map.map.insert(u16::try_from(glyph_id)?, code);
                    }
                }
                Ok(())
            }
        }
    }
}

impl CharacterMap {
    /// The character code the given glyph renders, if the glyph is mapped.
    pub fn character(&self, glyph_id: u16) -> Option<u32> {
        self.map.get(&glyph_id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate the (glyph id, character code) associations.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
        self.map.iter().map(|(&glyph_id, &code)| (glyph_id, code))
    }
}
