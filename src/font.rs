//! The decoded font and its decode pipeline.

use std::fs;
use std::path::Path;

use crate::binary::read::ReadScope;
use crate::error::{FontError, ParseError};
use crate::tables::cmap::{CharacterMap, Cmap};
use crate::tables::glyf::{GlyfTable, GlyphRecord};
use crate::tables::kern::KernTable;
use crate::tables::loca::LocaTable;
use crate::tables::{HeadTable, MaxpTable, TableDirectory};
use crate::tag;

/// A fully decoded font.
///
/// All decoded structures are owned; nothing borrows from the input buffer
/// once `decode` returns.
pub struct Font {
    directory: TableDirectory,
    head: HeadTable,
    maxp: MaxpTable,
    /// One record per glyph id, `num_glyphs + 1` entries in total.
    glyphs: Vec<GlyphRecord>,
    char_map: CharacterMap,
    kern: Option<KernTable>,
}

impl Font {
    /// Read the font file at `path` and decode it.
    ///
    /// Loading the bytes is the only I/O this crate performs; decoding is a
    /// pure function of the loaded buffer.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Font, FontError> {
        let buffer = fs::read(path)?;
        Font::from_buffer(&buffer)
    }

    /// Decode a font from an already-loaded buffer, such as a bundled asset.
    pub fn from_buffer(data: &[u8]) -> Result<Font, FontError> {
        Font::decode(ReadScope::new(data)).map_err(FontError::from)
    }

    /// Decode a font from a scope over the sfnt container.
    ///
    /// The table directory is decoded first, then `head` and `maxp` (which
    /// supply the loca entry width and the glyph count), then `loca` and
    /// `glyf`, then the optional `kern` table, and finally the character
    /// map. `head`, `maxp`, `glyf`, `loca` and `cmap` are required;
    /// structural failures in any of them abort the decode. A present but
    /// unusable `cmap` fails with [`ParseError::UnsuitableCmap`].
    pub fn decode(scope: ReadScope<'_>) -> Result<Font, ParseError> {
        let directory = scope.read::<TableDirectory>()?;

        let head = directory
            .read_table(&scope, tag::HEAD)?
            .ok_or(ParseError::MissingTable(tag::HEAD))?
            .read::<HeadTable>()?;
        let maxp = directory
            .read_table(&scope, tag::MAXP)?
            .ok_or(ParseError::MissingTable(tag::MAXP))?
            .read::<MaxpTable>()?;

        let loca = directory
            .read_table(&scope, tag::LOCA)?
            .ok_or(ParseError::MissingTable(tag::LOCA))?
            .read_dep::<LocaTable>((maxp.num_glyphs, head.index_to_loc_format))?;
        let glyf = directory
            .read_table(&scope, tag::GLYF)?
            .ok_or(ParseError::MissingTable(tag::GLYF))?
            .read_dep::<GlyfTable>(&loca)?;

        let kern = match directory.read_table(&scope, tag::KERN)? {
            Some(kern_scope) => Some(kern_scope.read::<KernTable>()?),
            None => None,
        };

        let char_map = directory
            .read_table(&scope, tag::CMAP)?
            .ok_or(ParseError::MissingTable(tag::CMAP))?
            .read::<Cmap<'_>>()?
            .character_map()?;

        Ok(Font {
            directory,
            head,
            maxp,
            glyphs: glyf.records,
            char_map,
            kern,
        })
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    pub fn head(&self) -> &HeadTable {
        &self.head
    }

    pub fn maxp(&self) -> &MaxpTable {
        &self.maxp
    }

    /// The number of glyphs in the font, from `maxp`.
    pub fn num_glyphs(&self) -> u16 {
        self.maxp.num_glyphs
    }

    /// The glyph with the given id.
    ///
    /// Valid ids run from 0 to `num_glyphs` inclusive; the final id is the
    /// trailing body-less entry of the glyph sequence.
    pub fn glyph(&self, glyph_id: u16) -> Option<&GlyphRecord> {
        self.glyphs.get(usize::from(glyph_id))
    }

    /// All glyph records, indexed by glyph id.
    pub fn glyphs(&self) -> &[GlyphRecord] {
        &self.glyphs
    }

    /// The glyph-to-character association decoded from `cmap`.
    pub fn character_map(&self) -> &CharacterMap {
        &self.char_map
    }

    /// The decoded `kern` table, if the font has one.
    pub fn kern(&self) -> Option<&KernTable> {
        self.kern.as_ref()
    }

    /// The horizontal kerning adjustment for a glyph pair, in font design
    /// units.
    ///
    /// The first horizontal, non-cross-stream subtable holding the pair
    /// wins. The pair is ordered; `(left, right)` and `(right, left)` are
    /// looked up independently.
    pub fn horizontal_kerning(&self, left: u16, right: u16) -> Option<i16> {
        let kern = self.kern.as_ref()?;
        kern.subtables
            .iter()
            .filter(|subtable| {
                subtable.coverage.is_horizontal() && !subtable.coverage.is_cross_stream()
            })
            .find_map(|subtable| subtable.data.lookup(left, right))
    }
}
