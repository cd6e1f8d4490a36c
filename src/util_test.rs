use super::DataReader;

#[test]
fn test_reads_little_endian() {
    let data = [0x01, 0x34, 0x12, 0xff];
    let mut reader = DataReader::new(&data);
    assert_eq!(reader.read_u8(), Some(0x01));
    assert_eq!(reader.read_u16(), Some(0x1234));
    assert_eq!(reader.offset(), 3);
    assert_eq!(reader.read_u8(), Some(0xff));
    assert_eq!(reader.read_u8(), None);
}

#[test]
fn test_short_read_keeps_offset() {
    let data = [0x01, 0x02, 0x03];
    let mut reader = DataReader::new(&data);
    reader.seek(2);
    assert_eq!(reader.read_u16(), None);
    assert_eq!(reader.offset(), 2);
    assert_eq!(reader.read_bytes(2), None);
    assert_eq!(reader.read_bytes(1), Some(&data[2..]));
}

#[test]
fn test_seek_past_end() {
    let data = [0x01];
    let mut reader = DataReader::new(&data);
    reader.seek(usize::MAX);
    assert_eq!(reader.read_u8(), None);
    assert_eq!(reader.read_bytes(1), None);
}
