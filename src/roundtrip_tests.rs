//! End-to-end write/read tests over in-memory files.
//!
//! Every test builds a file in a `Vec<u8>`, reads it back through a
//! `Cursor`, and checks the reconstructed records (and, where it matters,
//! the raw bytes of the envelope and the pages) against the input.

use std::io::Cursor;

use crate::column::{Column, OptionalColumn, RequiredColumn};
use crate::config::WriterOptions;
use crate::error::ParqError;
use crate::format::{MAGIC, PAGE_HEADER_LEN};
use crate::kernels::snappy;
use crate::reader::FileReader;
use crate::writer::FileWriter;

//==================================================================================
// 1. Test Records & Helpers
//==================================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct IdRec {
    id: i32,
}

fn id_columns() -> Vec<Box<dyn Column<IdRec>>> {
    vec![Box::new(RequiredColumn::<IdRec, i32>::new(
        "id",
        |r| r.id,
        |r, v| r.id = v,
    ))]
}

#[derive(Debug, Default, Clone, PartialEq)]
struct NameRec {
    name: Option<String>,
}

fn name_columns() -> Vec<Box<dyn Column<NameRec>>> {
    vec![Box::new(OptionalColumn::<NameRec, String>::new(
        "name",
        |r| r.name.clone(),
        |r, v| r.name = v,
    ))]
}

#[derive(Debug, Default, Clone, PartialEq)]
struct FlagRec {
    flag: bool,
}

fn flag_columns() -> Vec<Box<dyn Column<FlagRec>>> {
    vec![Box::new(RequiredColumn::<FlagRec, bool>::new(
        "flag",
        |r| r.flag,
        |r, v| r.flag = v,
    ))]
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Reading {
    id: i64,
    tag: Option<String>,
    score: f32,
}

fn reading_columns() -> Vec<Box<dyn Column<Reading>>> {
    vec![
        Box::new(RequiredColumn::<Reading, i64>::new(
            "id",
            |r| r.id,
            |r, v| r.id = v,
        )),
        Box::new(OptionalColumn::<Reading, String>::new(
            "tag",
            |r| r.tag.clone(),
            |r, v| r.tag = v,
        )),
        Box::new(RequiredColumn::<Reading, f32>::new(
            "score",
            |r| r.score,
            |r, v| r.score = v,
        )),
    ]
}

fn sample_readings(n: usize) -> Vec<Reading> {
    (0..n)
        .map(|i| Reading {
            id: i as i64,
            tag: if i % 3 == 0 {
                None
            } else {
                Some(format!("tag-{i}"))
            },
            score: i as f32 * 0.25,
        })
        .collect()
}

fn write_file<R: 'static>(
    records: &[R],
    columns_fn: fn() -> Vec<Box<dyn Column<R>>>,
    opts: WriterOptions,
) -> Vec<u8> {
    let mut writer = FileWriter::new(Vec::new(), columns_fn, opts).unwrap();
    for rec in records {
        writer.add(rec);
    }
    writer.write().unwrap();
    writer.close().unwrap()
}

fn read_file<R: Default + 'static>(
    bytes: Vec<u8>,
    columns_fn: fn() -> Vec<Box<dyn Column<R>>>,
) -> Vec<R> {
    let mut reader = FileReader::new(Cursor::new(bytes), columns_fn()).unwrap();
    let mut out = Vec::with_capacity(reader.rows() as usize);
    while reader.next() {
        let mut rec = R::default();
        reader.scan(&mut rec);
        out.push(rec);
    }
    out
}

/// Walks the data section and returns `(num_values, decompressed payload)`
/// for every page, in file order.
fn data_pages(bytes: &[u8]) -> Vec<(usize, Vec<u8>)> {
    let n = bytes.len();
    let footer_len = i32::from_le_bytes(bytes[n - 8..n - 4].try_into().unwrap()) as usize;
    let data_end = n - 8 - footer_len;

    let mut pages = Vec::new();
    let mut off = MAGIC.len();
    while off < data_end {
        let uncompressed =
            i32::from_le_bytes(bytes[off..off + 4].try_into().unwrap()) as usize;
        let compressed =
            i32::from_le_bytes(bytes[off + 4..off + 8].try_into().unwrap()) as usize;
        let num_values =
            i32::from_le_bytes(bytes[off + 8..off + 12].try_into().unwrap()) as usize;

        let start = off + PAGE_HEADER_LEN;
        let payload = snappy::decompress(&bytes[start..start + compressed]).unwrap();
        assert_eq!(payload.len(), uncompressed);
        pages.push((num_values, payload));
        off = start + compressed;
    }
    assert_eq!(off, data_end);
    pages
}

//==================================================================================
// 2. End-to-End Scenarios
//==================================================================================

#[test]
fn test_empty_file() {
    let bytes = write_file::<IdRec>(&[], id_columns, WriterOptions::default());
    assert_eq!(&bytes[..4], MAGIC);
    assert_eq!(&bytes[bytes.len() - 4..], MAGIC);
    assert!(data_pages(&bytes).is_empty());

    let mut reader = FileReader::new(Cursor::new(bytes), id_columns()).unwrap();
    assert_eq!(reader.rows(), 0);
    assert!(!reader.next());
}

#[test]
fn test_required_int32_two_row_groups() {
    let records: Vec<IdRec> = (1..=3).map(|id| IdRec { id }).collect();
    let bytes = write_file(
        &records,
        id_columns,
        WriterOptions::default().with_max_page_size(2),
    );

    let pages = data_pages(&bytes);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].0, 2);
    assert_eq!(pages[1].0, 1);

    assert_eq!(read_file(bytes, id_columns), records);
}

#[test]
fn test_optional_string_preserves_absent_vs_empty() {
    let records = vec![
        NameRec { name: Some("a".into()) },
        NameRec { name: None },
        NameRec { name: Some(String::new()) },
        NameRec { name: Some("bcd".into()) },
    ];
    let bytes = write_file(&records, name_columns, WriterOptions::default());
    assert_eq!(read_file(bytes, name_columns), records);
}

#[test]
fn test_bool_bitpacked_page_payload() {
    let records: Vec<FlagRec> = (0..17).map(|i| FlagRec { flag: i % 2 == 0 }).collect();
    let bytes = write_file(&records, flag_columns, WriterOptions::default());

    let pages = data_pages(&bytes);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].0, 17);
    assert_eq!(pages[0].1, vec![0x55, 0x55, 0x01]);

    assert_eq!(read_file(bytes, flag_columns), records);
}

#[test]
fn test_mixed_schema_multiple_row_groups() {
    let records = sample_readings(2500);
    let bytes = write_file(
        &records,
        reading_columns,
        WriterOptions::default().with_max_page_size(1000),
    );
    assert_eq!(&bytes[..4], MAGIC);
    assert_eq!(&bytes[bytes.len() - 4..], MAGIC);

    // Three pages per column, grouped per column in file order.
    let pages = data_pages(&bytes);
    assert_eq!(pages.len(), 9);
    for col in 0..3 {
        let counts: Vec<usize> = pages[col * 3..col * 3 + 3].iter().map(|p| p.0).collect();
        assert_eq!(counts, vec![1000, 1000, 500]);
    }

    let decoded = read_file(bytes, reading_columns);
    assert_eq!(decoded.len(), records.len());
    for (got, want) in decoded.iter().zip(&records) {
        assert_eq!(got.id, want.id);
        assert_eq!(got.tag, want.tag);
        assert_eq!(got.score.to_bits(), want.score.to_bits());
    }
}

#[test]
fn test_unknown_column_fails_construction() {
    let bytes = write_file(&[IdRec { id: 7 }], id_columns, WriterOptions::default());

    fn mismatched_columns() -> Vec<Box<dyn Column<IdRec>>> {
        vec![Box::new(RequiredColumn::<IdRec, i32>::new(
            "uid",
            |r| r.id,
            |r, v| r.id = v,
        ))]
    }

    let err = match FileReader::new(Cursor::new(bytes), mismatched_columns()) {
        Ok(_) => panic!("reader construction should fail before any page is read"),
        Err(e) => e,
    };
    assert!(matches!(err, ParqError::UnknownColumn(name) if name == "id"));
}

//==================================================================================
// 3. Properties
//==================================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Pair {
    a: i32,
    b: Option<i64>,
}

fn pair_columns() -> Vec<Box<dyn Column<Pair>>> {
    vec![
        Box::new(RequiredColumn::<Pair, i32>::new("a", |r| r.a, |r, v| r.a = v)),
        Box::new(OptionalColumn::<Pair, i64>::new("b", |r| r.b, |r, v| r.b = v)),
    ]
}

#[test]
fn test_row_group_segmentation_is_invisible() {
    for &page_size in &[1usize, 2, 1000, 10_000] {
        for &n in &[0usize, 1, page_size - 1, page_size, page_size + 1, 3 * page_size + 5] {
            let records: Vec<Pair> = (0..n)
                .map(|i| Pair {
                    a: i as i32,
                    b: if i % 3 == 0 { None } else { Some(i as i64 * 10) },
                })
                .collect();

            let bytes = write_file(
                &records,
                pair_columns,
                WriterOptions::default().with_max_page_size(page_size),
            );

            let expected_pages = if n == 0 { 0 } else { 2 * ((n + page_size - 1) / page_size) };
            assert_eq!(
                data_pages(&bytes).len(),
                expected_pages,
                "page count for page_size={page_size} n={n}"
            );
            assert_eq!(
                read_file(bytes, pair_columns),
                records,
                "roundtrip for page_size={page_size} n={n}"
            );
        }
    }
}

#[test]
fn test_bool_pages_survive_unaligned_boundaries() {
    // Five records with two rows per page: page payloads of 1 byte each,
    // none of them byte-aligned to the record stream as a whole.
    let records: Vec<FlagRec> = (0..5).map(|i| FlagRec { flag: i % 2 == 0 }).collect();
    let bytes = write_file(
        &records,
        flag_columns,
        WriterOptions::default().with_max_page_size(2),
    );
    assert_eq!(data_pages(&bytes).len(), 3);
    assert_eq!(read_file(bytes, flag_columns), records);
}

#[test]
fn test_determinism() {
    let records = sample_readings(123);
    let opts = WriterOptions::default().with_max_page_size(50);
    let a = write_file(&records, reading_columns, opts);
    let b = write_file(&records, reading_columns, opts);
    assert_eq!(a, b);
}

#[test]
fn test_multiple_flushes_resume_accumulation() {
    let records = sample_readings(5);
    let mut writer =
        FileWriter::new(Vec::new(), reading_columns, WriterOptions::default()).unwrap();
    for rec in &records[..3] {
        writer.add(rec);
    }
    writer.write().unwrap();
    for rec in &records[3..] {
        writer.add(rec);
    }
    writer.write().unwrap();
    let bytes = writer.close().unwrap();

    let reader = FileReader::new(Cursor::new(bytes.clone()), reading_columns()).unwrap();
    assert_eq!(reader.metadata().row_groups().len(), 2);
    assert_eq!(reader.rows(), 5);

    assert_eq!(read_file(bytes, reading_columns), records);
}

#[test]
fn test_flush_per_thousand_makes_one_row_group_each() {
    let records = sample_readings(2500);
    let mut writer = FileWriter::new(
        Vec::new(),
        reading_columns,
        WriterOptions::default().with_max_page_size(1000),
    )
    .unwrap();
    for (i, rec) in records.iter().enumerate() {
        writer.add(rec);
        if (i + 1) % 1000 == 0 {
            writer.write().unwrap();
        }
    }
    writer.write().unwrap();
    let bytes = writer.close().unwrap();

    let reader = FileReader::new(Cursor::new(bytes.clone()), reading_columns()).unwrap();
    assert_eq!(reader.metadata().row_groups().len(), 3);
    assert_eq!(read_file(bytes, reading_columns), records);
}

#[test]
fn test_nan_floats_roundtrip_bitwise() {
    let records = vec![
        Reading { id: 0, tag: None, score: f32::NAN },
        Reading { id: 1, tag: Some("x".into()), score: -0.0 },
    ];
    let bytes = write_file(&records, reading_columns, WriterOptions::default());

    let mut reader = FileReader::new(Cursor::new(bytes), reading_columns()).unwrap();
    for want in &records {
        assert!(reader.next());
        let mut got = Reading::default();
        reader.scan(&mut got);
        assert_eq!(got.id, want.id);
        assert_eq!(got.score.to_bits(), want.score.to_bits());
    }
    assert!(!reader.next());
}

//==================================================================================
// 4. Full Type Coverage
//==================================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct AllTypes {
    b: bool,
    i: i32,
    u: u32,
    l: i64,
    ul: u64,
    f: f32,
    d: f64,
    s: String,
    ob: Option<bool>,
    oi: Option<i32>,
    ou: Option<u32>,
    ol: Option<i64>,
    oul: Option<u64>,
    of: Option<f32>,
    od: Option<f64>,
    os: Option<String>,
}

fn all_type_columns() -> Vec<Box<dyn Column<AllTypes>>> {
    vec![
        Box::new(RequiredColumn::<AllTypes, bool>::new("b", |r| r.b, |r, v| r.b = v)),
        Box::new(RequiredColumn::<AllTypes, i32>::new("i", |r| r.i, |r, v| r.i = v)),
        Box::new(RequiredColumn::<AllTypes, u32>::new("u", |r| r.u, |r, v| r.u = v)),
        Box::new(RequiredColumn::<AllTypes, i64>::new("l", |r| r.l, |r, v| r.l = v)),
        Box::new(RequiredColumn::<AllTypes, u64>::new("ul", |r| r.ul, |r, v| r.ul = v)),
        Box::new(RequiredColumn::<AllTypes, f32>::new("f", |r| r.f, |r, v| r.f = v)),
        Box::new(RequiredColumn::<AllTypes, f64>::new("d", |r| r.d, |r, v| r.d = v)),
        Box::new(RequiredColumn::<AllTypes, String>::new(
            "s",
            |r| r.s.clone(),
            |r, v| r.s = v,
        )),
        Box::new(OptionalColumn::<AllTypes, bool>::new("ob", |r| r.ob, |r, v| r.ob = v)),
        Box::new(OptionalColumn::<AllTypes, i32>::new("oi", |r| r.oi, |r, v| r.oi = v)),
        Box::new(OptionalColumn::<AllTypes, u32>::new("ou", |r| r.ou, |r, v| r.ou = v)),
        Box::new(OptionalColumn::<AllTypes, i64>::new("ol", |r| r.ol, |r, v| r.ol = v)),
        Box::new(OptionalColumn::<AllTypes, u64>::new("oul", |r| r.oul, |r, v| r.oul = v)),
        Box::new(OptionalColumn::<AllTypes, f32>::new("of", |r| r.of, |r, v| r.of = v)),
        Box::new(OptionalColumn::<AllTypes, f64>::new("od", |r| r.od, |r, v| r.od = v)),
        Box::new(OptionalColumn::<AllTypes, String>::new(
            "os",
            |r| r.os.clone(),
            |r, v| r.os = v,
        )),
    ]
}

#[test]
fn test_all_types_roundtrip() {
    let records: Vec<AllTypes> = (0..37)
        .map(|i| {
            let present = i % 4 != 0;
            AllTypes {
                b: i % 2 == 0,
                i: i - 18,
                u: i as u32 * 3,
                l: (i as i64) << 33,
                ul: u64::MAX - i as u64,
                f: i as f32 / 7.0,
                d: i as f64 * 1e-9,
                s: format!("row {i}"),
                ob: present.then(|| i % 3 == 0),
                oi: present.then(|| -i),
                ou: present.then(|| i as u32),
                ol: present.then(|| i as i64 * 1_000_000),
                oul: present.then(|| i as u64),
                of: present.then(|| i as f32),
                od: present.then(|| i as f64),
                os: present.then(|| "x".repeat(i as usize % 5)),
            }
        })
        .collect();

    let bytes = write_file(
        &records,
        all_type_columns,
        WriterOptions::default().with_max_page_size(10),
    );
    assert_eq!(read_file(bytes, all_type_columns), records);
}
