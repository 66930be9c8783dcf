//! End-to-end decoding of synthetic font buffers.

use std::fs;

use sfnt_decode::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use sfnt_decode::binary::{I16Be, U16Be, U32Be};
use sfnt_decode::tables::glyf::{BoundingBox, ContourPoint, Glyph, SimpleGlyph, SimpleGlyphFlag};
use sfnt_decode::tables::{
    Fixed, HeadTable, IndexToLocFormat, MaxpTable, TableRecord, TTF_MAGIC,
};
use sfnt_decode::{tag, Font, FontError, ParseError};

fn build_font(tables: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut header = WriteBuffer::new();
    U32Be::write(&mut header, TTF_MAGIC).unwrap();
    U16Be::write(&mut header, u16::try_from(tables.len()).unwrap()).unwrap();
    U16Be::write(&mut header, 16u16).unwrap(); // search_range
    U16Be::write(&mut header, 0u16).unwrap(); // entry_selector
    U16Be::write(&mut header, 0u16).unwrap(); // range_shift

    let mut offset = 12 + 16 * tables.len();
    for (table_tag, data) in tables {
        let record = TableRecord {
            table_tag: *table_tag,
            checksum: 0,
            offset: u32::try_from(offset).unwrap(),
            length: u32::try_from(data.len()).unwrap(),
        };
        TableRecord::write(&mut header, &record).unwrap();
        offset += data.len();
    }

    let mut font = header.into_inner();
    for (_, data) in tables {
        font.extend_from_slice(data);
    }
    font
}

fn head_table() -> Vec<u8> {
    let head = HeadTable {
        major_version: 1,
        minor_version: 0,
        font_revision: Fixed::new(0x00010000),
        check_sum_adjustment: 0,
        magic_number: 0x5F0F3CF5,
        flags: 0,
        units_per_em: 1000,
        created: 3562553396,
        modified: 3562553396,
        x_min: 0,
        y_min: 0,
        x_max: 100,
        y_max: 100,
        mac_style: 0,
        lowest_rec_ppem: 8,
        font_direction_hint: 2,
        index_to_loc_format: IndexToLocFormat::Short,
        glyph_data_format: 0,
    };
    let mut ctxt = WriteBuffer::new();
    HeadTable::write(&mut ctxt, &head).unwrap();
    ctxt.into_inner()
}

fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let maxp = MaxpTable {
        num_glyphs,
        version1_sub_table: None,
    };
    let mut ctxt = WriteBuffer::new();
    MaxpTable::write(&mut ctxt, &maxp).unwrap();
    ctxt.into_inner()
}

/// A square outline: one contour of four on-curve points.
fn glyf_table() -> Vec<u8> {
    let points = [(0, 0), (100, 0), (100, 100), (0, 100)]
        .iter()
        .map(|&(x, y)| ContourPoint {
            flags: SimpleGlyphFlag::ON_CURVE_POINT,
            x,
            y,
        })
        .collect::<Vec<_>>();
    let glyph = Glyph {
        number_of_contours: 1,
        bounding_box: BoundingBox {
            x_min: 0,
            y_min: 0,
            x_max: 100,
            y_max: 100,
        },
        outline: Some(SimpleGlyph {
            end_pts_of_contours: vec![3],
            instructions: Vec::new(),
            points,
        }),
    };
    let mut ctxt = WriteBuffer::new();
    Glyph::write(&mut ctxt, glyph).unwrap();
    ctxt.into_inner()
}

fn loca_table(glyf_len: u16) -> Vec<u8> {
    let mut ctxt = WriteBuffer::new();
    ctxt.write_vec::<U16Be, _>(vec![0u16, glyf_len / 2]).unwrap();
    ctxt.into_inner()
}

/// A format 4 cmap with a single direct segment mapping code 65 to glyph 0.
fn cmap_table() -> Vec<u8> {
    let mut ctxt = WriteBuffer::new();
    U16Be::write(&mut ctxt, 0u16).unwrap(); // version
    U16Be::write(&mut ctxt, 1u16).unwrap(); // num_tables
    U16Be::write(&mut ctxt, 3u16).unwrap(); // platform: Windows
    U16Be::write(&mut ctxt, 1u16).unwrap(); // encoding: Unicode BMP
    U32Be::write(&mut ctxt, 12u32).unwrap(); // subtable offset

    U16Be::write(&mut ctxt, 4u16).unwrap(); // format
    U16Be::write(&mut ctxt, 24u16).unwrap(); // length
    U16Be::write(&mut ctxt, 0u16).unwrap(); // language
    U16Be::write(&mut ctxt, 2u16).unwrap(); // seg_count_x2
    U16Be::write(&mut ctxt, 2u16).unwrap(); // search_range
    U16Be::write(&mut ctxt, 0u16).unwrap(); // entry_selector
    U16Be::write(&mut ctxt, 0u16).unwrap(); // range_shift
    U16Be::write(&mut ctxt, 65u16).unwrap(); // end code
    U16Be::write(&mut ctxt, 0u16).unwrap(); // reserved pad
    U16Be::write(&mut ctxt, 65u16).unwrap(); // start code
    I16Be::write(&mut ctxt, -65i16).unwrap(); // id delta, mapping code 65 to glyph 0
    U16Be::write(&mut ctxt, 0u16).unwrap(); // id range offset
    ctxt.into_inner()
}

/// A single format 0 subtable with one horizontal pair.
fn kern_table(left: u16, right: u16, value: i16) -> Vec<u8> {
    let mut ctxt = WriteBuffer::new();
    U16Be::write(&mut ctxt, 0u16).unwrap(); // version
    U16Be::write(&mut ctxt, 1u16).unwrap(); // num_tables
    U16Be::write(&mut ctxt, 0u16).unwrap(); // subtable version
    U16Be::write(&mut ctxt, 20u16).unwrap(); // length
    U16Be::write(&mut ctxt, 0x0001u16).unwrap(); // coverage: horizontal, format 0
    U16Be::write(&mut ctxt, 1u16).unwrap(); // n_pairs
    U16Be::write(&mut ctxt, 6u16).unwrap(); // search_range
    U16Be::write(&mut ctxt, 0u16).unwrap(); // entry_selector
    U16Be::write(&mut ctxt, 0u16).unwrap(); // range_shift
    U16Be::write(&mut ctxt, left).unwrap();
    U16Be::write(&mut ctxt, right).unwrap();
    I16Be::write(&mut ctxt, value).unwrap();
    ctxt.into_inner()
}

fn minimal_font() -> Vec<u8> {
    let glyf = glyf_table();
    let glyf_len = u16::try_from(glyf.len()).unwrap();
    build_font(&[
        (tag::HEAD, head_table()),
        (tag::MAXP, maxp_table(1)),
        (tag::LOCA, loca_table(glyf_len)),
        (tag::CMAP, cmap_table()),
        (tag::GLYF, glyf),
    ])
}

#[test]
fn test_decode_minimal_font() {
    let data = minimal_font();
    let font = Font::from_buffer(&data).unwrap();

    assert_eq!(font.num_glyphs(), 1);
    // One record per glyph plus the trailing body-less entry
    assert_eq!(font.glyphs().len(), 2);

    let glyph = font.glyph(0).unwrap().glyph.as_ref().unwrap();
    assert_eq!(glyph.number_of_contours, 1);
    assert_eq!(glyph.bounding_box.x_max, 100);
    let outline = glyph.outline.as_ref().unwrap();
    assert_eq!(outline.end_pts_of_contours, vec![3]);
    assert_eq!(outline.points.len(), outline.number_of_points());
    assert_eq!(
        (outline.points[2].x, outline.points[2].y),
        (100, 100)
    );
    assert!(outline.points.iter().all(|point| point.is_on_curve()));

    assert!(font.glyph(1).unwrap().glyph.is_none());
    assert!(font.glyph(2).is_none());

    assert_eq!(font.character_map().len(), 1);
    assert_eq!(font.character_map().character(0), Some(65));

    assert!(font.kern().is_none());
    assert_eq!(font.horizontal_kerning(0, 1), None);

    assert_eq!(font.directory().num_tables, 5);
    assert_eq!(font.head().index_to_loc_format, IndexToLocFormat::Short);
}

#[test]
fn test_decode_font_with_kerning() {
    let glyf = glyf_table();
    let glyf_len = u16::try_from(glyf.len()).unwrap();
    let data = build_font(&[
        (tag::HEAD, head_table()),
        (tag::MAXP, maxp_table(1)),
        (tag::LOCA, loca_table(glyf_len)),
        (tag::CMAP, cmap_table()),
        (tag::KERN, kern_table(0, 1, -50)),
        (tag::GLYF, glyf),
    ]);
    let font = Font::from_buffer(&data).unwrap();

    let kern = font.kern().unwrap();
    assert_eq!(kern.subtables.len(), 1);
    assert_eq!(font.horizontal_kerning(0, 1), Some(-50));
    // Kerning pairs are ordered
    assert_eq!(font.horizontal_kerning(1, 0), None);
}

#[test]
fn test_decode_truncated_font() {
    let data = minimal_font();
    // Cut into the glyf table, which is last in the buffer
    let truncated = &data[..data.len() - 10];

    match Font::from_buffer(truncated) {
        Err(FontError::Parse(ParseError::BadEof)) => {}
        other => panic!("expected BadEof, got {:?}", other.err()),
    }
}

#[test]
fn test_decode_missing_required_table() {
    let glyf = glyf_table();
    let glyf_len = u16::try_from(glyf.len()).unwrap();
    let data = build_font(&[
        (tag::HEAD, head_table()),
        (tag::MAXP, maxp_table(1)),
        (tag::LOCA, loca_table(glyf_len)),
        (tag::GLYF, glyf),
    ]);

    match Font::from_buffer(&data) {
        Err(FontError::Parse(ParseError::MissingTable(tag))) => assert_eq!(tag, tag::CMAP),
        other => panic!("expected missing cmap, got {:?}", other.err()),
    }
}

#[test]
fn test_decode_from_path() {
    let path = std::env::temp_dir().join("sfnt-decode-test-font.ttf");
    fs::write(&path, minimal_font()).unwrap();

    let font = Font::from_path(&path).unwrap();
    assert_eq!(font.glyphs().len(), 2);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_decode_from_missing_path() {
    let path = std::env::temp_dir().join("sfnt-decode-no-such-font.ttf");
    assert!(matches!(Font::from_path(&path), Err(FontError::Io(_))));
}
