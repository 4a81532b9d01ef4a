//! End-to-end database behavior over both index kinds.

use phashdb::{Db, Error, Fingerprint, IndexKind};
use std::io::Cursor;

const GOPHER_1: Fingerprint = Fingerprint(0x3c7e_ffe7_c381_8100);
const GOPHER_2: Fingerprint = Fingerprint(0x3c7e_ffe7_c381_8101);
const GOPHER_QUERY: Fingerprint = Fingerprint(0x3c7e_ffe7_c381_8103);

const GRADIENTS: [Fingerprint; 3] = [
    Fingerprint(0x0000_0000_0000_0000),
    Fingerprint(0xffff_ffff_ffff_ffff),
    Fingerprint(0x00ff_00ff_00ff_00ff),
];

fn populated(kind: IndexKind) -> Db {
    let mut db = Db::with_kind(kind);
    for (i, gradient) in GRADIENTS.iter().enumerate() {
        db.add(format!("gradient-{}.pgm", i), *gradient).unwrap();
    }
    db.add("gopher-1.pgm", GOPHER_1).unwrap();
    db.add("gopher-2.pgm", GOPHER_2).unwrap();
    db
}

fn sorted(mut locations: Vec<String>) -> Vec<String> {
    locations.sort();
    locations
}

/// 9x8 binary PGM whose columns step by 30 levels
fn gradient_pgm(ascending: bool) -> Vec<u8> {
    let mut data = b"P5\n9 8\n255\n".to_vec();
    for _ in 0..8 {
        for x in 0..9u8 {
            let level = x * 30;
            data.push(if ascending { level } else { 255 - level });
        }
    }
    data
}

#[test]
fn test_near_duplicates_found_without_unrelated_images() {
    for kind in [IndexKind::Radix, IndexKind::Linear] {
        let db = populated(kind);
        let found = sorted(db.search(GOPHER_QUERY, 5).unwrap());
        assert_eq!(found, ["gopher-1.pgm", "gopher-2.pgm"], "{} index", kind);
    }
}

#[test]
fn test_exact_search_and_full_search() {
    for kind in [IndexKind::Radix, IndexKind::Linear] {
        let db = populated(kind);
        assert_eq!(db.search(GOPHER_1, 0).unwrap(), ["gopher-1.pgm"]);
        assert_eq!(db.search(GOPHER_QUERY, 64).unwrap().len(), 5);
    }
}

#[test]
fn test_find_keeps_insertion_order() {
    let mut db = Db::new();
    db.add("b.pgm", GOPHER_1).unwrap();
    db.add("a.pgm", GOPHER_1).unwrap();
    db.add("b.pgm", GOPHER_1).unwrap();

    assert_eq!(db.find(GOPHER_1).unwrap(), ["b.pgm", "a.pgm", "b.pgm"]);
    assert_eq!(db.len(), 1);
    assert_eq!(db.location_count(), 3);
    assert_eq!(db.index().len(), 1);
}

#[test]
fn test_find_missing_fingerprint() {
    let db = populated(IndexKind::Radix);
    match db.find(GOPHER_QUERY) {
        Err(Error::NotFound(hash)) => assert_eq!(hash, GOPHER_QUERY),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_search_matches_reports_distance() {
    let db = populated(IndexKind::Radix);
    let mut matches = db.search_matches(GOPHER_QUERY, 5).unwrap();
    matches.sort_by_key(|m| m.distance);

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].hash, GOPHER_2);
    assert_eq!(matches[0].distance, 1);
    assert_eq!(matches[1].hash, GOPHER_1);
    assert_eq!(matches[1].distance, 2);
}

#[test]
fn test_add_and_search_encoded_images() {
    let mut db = Db::new();
    let ascending = db.add_bytes("ascending.pgm", &gradient_pgm(true)).unwrap();
    let descending = db.add_file("descending.pgm", &gradient_pgm(false)[..]).unwrap();

    assert_eq!(ascending, Fingerprint(0));
    assert_eq!(descending, Fingerprint(u64::MAX));
    assert_eq!(db.search_bytes(&gradient_pgm(true), 0).unwrap(), ["ascending.pgm"]);
    assert_eq!(
        db.search_file(&gradient_pgm(false)[..], 3).unwrap(),
        ["descending.pgm"]
    );
}

/// 90x80 horizontal gradient encoded as PNG
fn gradient_png(ascending: bool) -> Vec<u8> {
    let image = image::GrayImage::from_fn(90, 80, |x, _| {
        let level = (x * 255 / 89) as u8;
        image::Luma([if ascending { level } else { 255 - level }])
    });
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[test]
fn test_add_and_search_png_files() {
    let mut db = Db::new();
    let ascending = db.add_file("ascending.png", Cursor::new(gradient_png(true))).unwrap();
    let descending = db.add_file("descending.png", Cursor::new(gradient_png(false))).unwrap();

    assert_eq!(ascending, Fingerprint(0));
    assert_eq!(descending, Fingerprint(u64::MAX));
    assert_eq!(db.search_file(Cursor::new(gradient_png(true)), 0).unwrap(), ["ascending.png"]);
    assert_eq!(
        db.search_file(Cursor::new(gradient_png(false)), 0).unwrap(),
        ["descending.png"]
    );
}

#[test]
fn test_undecodable_image_is_rejected() {
    let mut db = Db::new();
    assert!(matches!(
        db.add_bytes("broken.png", b"\x89PNG\r\n"),
        Err(Error::Hash(_))
    ));
    assert!(db.is_empty());
}

#[test]
fn test_linear_index_is_not_persistable() {
    let db = populated(IndexKind::Linear);
    assert!(matches!(
        db.save_index(&mut Vec::<u8>::new()),
        Err(Error::NotSupported)
    ));
}
