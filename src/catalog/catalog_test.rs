use std::io::Cursor;

use super::{Catalog, CatalogError, load_entry};

fn build_catalog(entries: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut header = Vec::new();
    let mut body = Vec::new();
    let table_len = entries.len() * 8;
    for (name, data) in entries {
        let offset = (table_len + body.len()) as u32;
        header.extend_from_slice(&offset.to_le_bytes());
        header.extend_from_slice(&(data.len() as u32).to_le_bytes());
        body.push(name.len() as u8);
        body.extend_from_slice(name);
        body.extend_from_slice(data);
    }
    header.extend_from_slice(&body);
    header
}

#[test]
fn test_read_entries() {
    let bytes = build_catalog(&[(b"GM_TT00.GM", &[1, 2, 3]), (b"GM_TT01.GM", &[4, 5])]);
    let mut catalog = Catalog::new(Cursor::new(bytes)).expect("catalog");

    assert_eq!(catalog.len(), 2);
    let entry = catalog.entry(1).expect("entry");
    assert_eq!(entry.name, "GM_TT01.GM");
    assert_eq!(entry.offset, 16 + 11 + 3);
    assert_eq!(entry.length, 2);

    assert_eq!(catalog.read_data(0).expect("data"), vec![1, 2, 3]);
    assert_eq!(catalog.read_data(1).expect("data"), vec![4, 5]);
    // out of order reads seek back
    assert_eq!(catalog.read_data(0).expect("data"), vec![1, 2, 3]);
}

#[test]
fn test_latin1_names() {
    let bytes = build_catalog(&[(&[b'T', 0xe9, b'1'], &[9])]);
    let mut catalog = Catalog::new(Cursor::new(bytes)).expect("catalog");
    assert_eq!(catalog.entries()[0].name, "Té1");
    assert_eq!(catalog.read_data(0).expect("data"), vec![9]);
}

#[test]
fn test_entry_out_of_range() {
    let bytes = build_catalog(&[(b"A", &[1])]);
    let mut catalog = Catalog::new(Cursor::new(bytes)).expect("catalog");
    assert!(matches!(
        catalog.read_data(1),
        Err(CatalogError::EntryOutOfRange { index: 1, count: 1 })
    ));
}

#[test]
fn test_truncated_data() {
    let mut bytes = build_catalog(&[(b"A", &[1, 2, 3, 4])]);
    bytes.truncate(bytes.len() - 2);
    let mut catalog = Catalog::new(Cursor::new(bytes)).expect("catalog");
    assert!(matches!(
        catalog.read_data(0),
        Err(CatalogError::Truncated { index: 0 })
    ));
}

#[test]
fn test_truncated_header() {
    let result = Catalog::new(Cursor::new(vec![16, 0]));
    assert!(matches!(result, Err(CatalogError::TruncatedHeader)));

    // claims two entries, holds one header
    let result = Catalog::new(Cursor::new(vec![16, 0, 0, 0, 0, 0, 0, 0]));
    assert!(matches!(result, Err(CatalogError::TruncatedHeader)));
}

#[test]
fn test_truncated_name() {
    let bytes = vec![8, 0, 0, 0, 0, 0, 0, 0, 5, b'a'];
    let result = Catalog::new(Cursor::new(bytes));
    assert!(matches!(result, Err(CatalogError::Truncated { index: 0 })));
}

#[test]
fn test_missing_file() {
    let result = load_entry(std::path::Path::new("/nonexistent/gm.cat"), 0);
    assert!(matches!(result, Err(CatalogError::Io(_))));
}
