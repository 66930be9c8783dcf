//! Parsing of the `glyf` table.
//!
//! > This table contains information that describes the glyphs in the font in the TrueType outline
//! > format.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/glyf>

use std::convert::TryFrom;
use std::iter;

use bitflags::bitflags;
use itertools::Itertools;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be, U8};
use crate::error::{ParseError, WriteError};
use crate::tables::loca::LocaTable;

bitflags! {
    #[rustfmt::skip]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT                       = 0b00000001;
        const X_SHORT_VECTOR                       = 0b00000010;
        const Y_SHORT_VECTOR                       = 0b00000100;
        const REPEAT_FLAG                          = 0b00001000;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0b00010000;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0b00100000;
    }
}

/// `glyf` table
///
/// Holds one record per `loca` entry: the `num_glyphs` real glyphs followed
/// by the trailing sentinel entry, which never carries a body.
#[derive(Debug, PartialEq)]
pub struct GlyfTable {
    pub records: Vec<GlyphRecord>,
}

/// One glyph slot in the font.
///
/// `glyph` is `None` when the glyph's `loca` extent is zero bytes.
#[derive(Debug, PartialEq, Clone)]
pub struct GlyphRecord {
    pub id: u16,
    pub glyph: Option<Glyph>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Glyph {
    /// Positive for simple glyphs. Zero and negative values mark empty and
    /// composite glyphs, whose bodies are not decoded.
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox,
    pub outline: Option<SimpleGlyph>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SimpleGlyph {
    pub end_pts_of_contours: Vec<u16>,
    /// Hinting bytecode, carried but not interpreted.
    pub instructions: Vec<u8>,
    pub points: Vec<ContourPoint>,
}

/// An outline vertex with its flag byte and reconstructed absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourPoint {
    pub flags: SimpleGlyphFlag,
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BoundingBox {
    pub x_min: i16,
    pub x_max: i16,
    pub y_min: i16,
    pub y_max: i16,
}

impl ReadBinaryDep for GlyfTable {
    type Args<'a> = &'a LocaTable;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, loca: Self::Args<'a>) -> Result<Self, ParseError> {
        if loca.offsets.len() < 2 {
            return Err(ParseError::BadIndex);
        }

        let mut records = Vec::with_capacity(loca.offsets.len());
        for (start, end) in loca.offsets.iter().tuple_windows() {
            let id = u16::try_from(records.len())?;
            let glyph = match end.checked_sub(start) {
                Some(0) => None,
                Some(length) => {
                    let offset = usize::try_from(start)?;
                    let scope = ctxt
                        .scope()
                        .offset_length(offset, usize::try_from(length)?)?;
                    Some(scope.read::<Glyph>()?)
                }
                None => return Err(ParseError::BadOffset),
            };
            records.push(GlyphRecord { id, glyph });
        }

        // The final loca entry marks the end of glyph storage. It still
        // occupies a glyph id, so it contributes a record without a body.
        let id = u16::try_from(records.len())?;
        records.push(GlyphRecord { id, glyph: None });

        Ok(GlyfTable { records })
    }
}

impl ReadBinary for Glyph {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox>()?;

        let outline = if number_of_contours > 0 {
            // Cast is safe as we've checked the value is positive above
            Some(ctxt.read_dep::<SimpleGlyph>(number_of_contours as u16)?)
        } else {
            // Composite glyph component records are not decoded
            None
        };

        Ok(Glyph {
            number_of_contours,
            bounding_box,
            outline,
        })
    }
}

impl SimpleGlyph {
    /// The number of points in the glyph, taken from the last contour end index.
    pub fn number_of_points(&self) -> usize {
        self.end_pts_of_contours
            .last()
            .map_or(0, |&last| usize::from(last) + 1)
    }

    /// Iterate the contours of the glyph as slices of points in rendering order.
    pub fn contours(&self) -> impl Iterator<Item = &[ContourPoint]> {
        self.end_pts_of_contours.iter().scan(0, move |i, &end| {
            let start = *i;
            let end = usize::from(end);
            *i = end + 1;
            self.points.get(start..=end)
        })
    }
}

impl ReadBinaryDep for SimpleGlyph {
    type Args<'a> = u16;
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        number_of_contours: Self::Args<'a>,
    ) -> Result<Self, ParseError> {
        let number_of_contours = usize::from(number_of_contours);
        let end_pts_of_contours = ctxt.read_array::<U16Be>(number_of_contours)?.to_vec();
        let instruction_length = ctxt.read::<U16Be>()?;
        let instructions = ctxt.read_slice(usize::from(instruction_length))?.to_vec();
        // end_pts_of_contours stores the index of the end points.
        // Therefore the number of coordinates is the last index + 1
        let number_of_coordinates = end_pts_of_contours
            .last()
            .map_or(0, |&last| usize::from(last) + 1);

        // Read all the flags. A repeated flag consumes one extra count byte
        // but produces count + 1 entries, so the loop is driven by the number
        // of flags produced rather than a fixed iteration bound.
        let mut flags = Vec::with_capacity(number_of_coordinates);
        while flags.len() < number_of_coordinates {
            let flag = ctxt.read::<SimpleGlyphFlag>()?;
            if flag.is_repeated() {
                let count = usize::from(ctxt.read::<U8>()?) + 1; // + 1 to include the current entry
                let repeat = iter::repeat(flag).take(count);
                flags.extend(repeat)
            } else {
                flags.push(flag);
            }
        }

        // Read the x coordinates. The y stream begins immediately after, so
        // the deltas are held in `x` until they're resolved below.
        let mut points = flags
            .iter()
            .map(|&flag| {
                if flag.x_is_short() {
                    ctxt.read::<U8>()
                        .map(|val| i16::from(val) * flag.x_short_sign())
                } else if flag.x_is_same_or_positive() {
                    Ok(0)
                } else {
                    ctxt.read::<I16Be>()
                }
                .map(|x| ContourPoint { flags: flag, x, y: 0 })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Read y coordinates, resolving both delta streams into absolute
        // values. The x and y coordinates are stored as deltas against the
        // previous point, with the first one being implicitly against (0, 0).
        let mut prev = (0i16, 0i16);
        for point in points.iter_mut() {
            let y = if point.flags.y_is_short() {
                ctxt.read::<U8>()
                    .map(|val| i16::from(val) * point.flags.y_short_sign())?
            } else if point.flags.y_is_same_or_positive() {
                0
            } else {
                ctxt.read::<I16Be>()?
            };

            prev = (prev.0 + point.x, prev.1 + y);
            point.x = prev.0;
            point.y = prev.1;
        }

        Ok(SimpleGlyph {
            end_pts_of_contours,
            instructions,
            points,
        })
    }
}

impl WriteBinary for Glyph {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, glyph: Glyph) -> Result<(), WriteError> {
        I16Be::write(ctxt, glyph.number_of_contours)?;
        BoundingBox::write(ctxt, glyph.bounding_box)?;
        if let Some(outline) = glyph.outline {
            SimpleGlyph::write(ctxt, outline)?;
        }

        Ok(())
    }
}

impl WriteBinary for SimpleGlyph {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, glyph: SimpleGlyph) -> Result<(), WriteError> {
        ctxt.write_vec::<U16Be, _>(glyph.end_pts_of_contours)?;
        U16Be::write(ctxt, u16::try_from(glyph.instructions.len())?)?;
        ctxt.write_bytes(&glyph.instructions)?;

        // Flags and coordinates are written without any attempt to compact
        // them using smaller representations, use of REPEAT, or X/Y_IS_SAME.

        // flags
        let mask = SimpleGlyphFlag::ON_CURVE_POINT; // ON_CURVE_POINT is the only flag that needs to carry through
        for point in &glyph.points {
            U8::write(ctxt, (point.flags & mask).bits())?;
        }

        // x coordinates
        let mut prev_x = 0;
        for point in &glyph.points {
            I16Be::write(ctxt, point.x - prev_x)?;
            prev_x = point.x;
        }

        // y coordinates
        let mut prev_y = 0;
        for point in &glyph.points {
            I16Be::write(ctxt, point.y - prev_y)?;
            prev_y = point.y;
        }

        Ok(())
    }
}

impl ReadFrom for SimpleGlyphFlag {
    type ReadType = U8;

    fn read_from(flag: u8) -> Self {
        SimpleGlyphFlag::from_bits_retain(flag)
    }
}

impl ContourPoint {
    pub fn is_on_curve(self) -> bool {
        self.flags.is_on_curve()
    }
}

impl SimpleGlyphFlag {
    pub fn is_on_curve(self) -> bool {
        self & Self::ON_CURVE_POINT == Self::ON_CURVE_POINT
    }

    pub fn x_is_short(self) -> bool {
        self & Self::X_SHORT_VECTOR == Self::X_SHORT_VECTOR
    }

    pub fn y_is_short(self) -> bool {
        self & Self::Y_SHORT_VECTOR == Self::Y_SHORT_VECTOR
    }

    pub fn is_repeated(self) -> bool {
        self & Self::REPEAT_FLAG == Self::REPEAT_FLAG
    }

    pub fn x_short_sign(self) -> i16 {
        if self.x_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn y_short_sign(self) -> i16 {
        if self.y_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn x_is_same_or_positive(self) -> bool {
        self & Self::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR
            == Self::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR
    }

    pub fn y_is_same_or_positive(self) -> bool {
        self & Self::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR
            == Self::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR
    }
}

impl ReadBinary for BoundingBox {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;

        Ok(BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }
}

impl WriteBinary for BoundingBox {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, bbox: BoundingBox) -> Result<(), WriteError> {
        I16Be::write(ctxt, bbox.x_min)?;
        I16Be::write(ctxt, bbox.y_min)?;
        I16Be::write(ctxt, bbox.x_max)?;
        I16Be::write(ctxt, bbox.y_max)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::binary::write::WriteBuffer;

    fn point(flags: u8, x: i16, y: i16) -> ContourPoint {
        ContourPoint {
            flags: SimpleGlyphFlag::from_bits_retain(flags),
            x,
            y,
        }
    }

    #[test]
    fn test_flag_repeat_expansion() {
        // 4 points: one explicit flag then a repeated flag with count 2,
        // then one more explicit flag. Coordinates are all "same" deltas.
        let mut ctxt = WriteBuffer::new();
        U16Be::write(&mut ctxt, 3u16).unwrap(); // end point of single contour
        U16Be::write(&mut ctxt, 0u16).unwrap(); // instruction length
        ctxt.write_bytes(&[
            0x31, // on curve, x and y same/positive
            0x39, // repeat
            2,    // repeat count, producing 3 flags
        ])
        .unwrap();

        let glyph = ReadScope::new(ctxt.bytes())
            .read_dep::<SimpleGlyph>(1u16)
            .unwrap();

        assert_eq!(glyph.points.len(), 4);
        assert_eq!(glyph.number_of_points(), 4);
        assert!(glyph.points[1..]
            .iter()
            .all(|point| point.flags == SimpleGlyphFlag::from_bits_retain(0x39)));
    }

    #[test]
    fn test_short_vector_signs() {
        // Two points: first at (10, -10) using short vectors, second moved by
        // signed 16-bit deltas.
        let mut ctxt = WriteBuffer::new();
        U16Be::write(&mut ctxt, 1u16).unwrap();
        U16Be::write(&mut ctxt, 0u16).unwrap();
        ctxt.write_bytes(&[
            0x17, // on curve, x short positive, y short negative
            0x01, // on curve, x and y long deltas
        ])
        .unwrap();
        ctxt.write_bytes(&[10]).unwrap(); // x1: +10
        I16Be::write(&mut ctxt, -300i16).unwrap(); // x2 delta
        ctxt.write_bytes(&[10]).unwrap(); // y1: -10
        I16Be::write(&mut ctxt, 20i16).unwrap(); // y2 delta

        let glyph = ReadScope::new(ctxt.bytes())
            .read_dep::<SimpleGlyph>(1u16)
            .unwrap();

        assert_eq!((glyph.points[0].x, glyph.points[0].y), (10, -10));
        assert_eq!((glyph.points[1].x, glyph.points[1].y), (-290, 10));
    }

    #[test]
    fn test_coordinate_round_trip() {
        let points = vec![
            point(1, 10, 20),
            point(0, -5, 700),
            point(1, -5, -300),
            point(1, 0, -300),
        ];
        let glyph = SimpleGlyph {
            end_pts_of_contours: vec![3],
            instructions: vec![0xAB, 0xCD],
            points: points.clone(),
        };

        let mut ctxt = WriteBuffer::new();
        SimpleGlyph::write(&mut ctxt, glyph).unwrap();
        let decoded = ReadScope::new(ctxt.bytes())
            .read_dep::<SimpleGlyph>(1u16)
            .unwrap();

        assert_eq!(decoded.instructions, vec![0xAB, 0xCD]);
        let coordinates = decoded
            .points
            .iter()
            .map(|point| (point.x, point.y))
            .collect::<Vec<_>>();
        let expected = points
            .iter()
            .map(|point| (point.x, point.y))
            .collect::<Vec<_>>();
        assert_eq!(coordinates, expected);
        assert_eq!(
            decoded
                .points
                .iter()
                .map(|point| point.is_on_curve())
                .collect::<Vec<_>>(),
            vec![true, false, true, true]
        );
    }

    #[test]
    fn test_contours_iterator() {
        let glyph = SimpleGlyph {
            end_pts_of_contours: vec![1, 3],
            instructions: Vec::new(),
            points: vec![
                point(1, 0, 0),
                point(1, 1, 0),
                point(1, 2, 0),
                point(1, 3, 0),
            ],
        };
        let contours = glyph.contours().collect::<Vec<_>>();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].len(), 2);
        assert_eq!(contours[1].len(), 2);
    }

    #[test]
    fn test_composite_glyph_header_only() {
        let mut ctxt = WriteBuffer::new();
        I16Be::write(&mut ctxt, -1i16).unwrap(); // number of contours
        BoundingBox::write(
            &mut ctxt,
            BoundingBox {
                x_min: 1,
                y_min: 2,
                x_max: 3,
                y_max: 4,
            },
        )
        .unwrap();

        let glyph = ReadScope::new(ctxt.bytes()).read::<Glyph>().unwrap();
        assert_eq!(glyph.number_of_contours, -1);
        assert_eq!(glyph.bounding_box.x_max, 3);
        assert!(glyph.outline.is_none());
    }
}
