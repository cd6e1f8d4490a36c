use super::*;

#[test]
fn test_note_lookup() {
    assert_eq!(NOTE_FREQUENCY[0], 0x0b5);
    assert_eq!(NOTE_FREQUENCY[59], 0x2ae);
    assert_eq!(NOTE_BLOCK[59], 3);
    assert_eq!(NOTE_BLOCK[60], 4);
    assert_eq!(PITCHBEND_SCALE[59], 5);
}

#[test]
fn test_tables_are_zero_padded() {
    assert!(NOTE_FREQUENCY[108..].iter().all(|&f| f == 0));
    assert!(PITCHBEND_SCALE[108..].iter().all(|&s| s == 0));
    assert!(NOTE_BLOCK[120..].iter().all(|&b| b == 0));
    assert_eq!(NOTE_BLOCK[119], 8);
}

#[test]
fn test_percussion_notes_reference_known_patches() {
    for (i, note) in PERCUSSION_NOTES.iter().enumerate() {
        match note {
            None => assert_eq!(i, 23),
            Some(note) => assert!((note.patch as usize) < PERCUSSION_PATCHES.len()),
        }
    }
}

#[test]
fn test_carrier_follows_modulator() {
    for pair in CHANNEL_OPERATORS.iter() {
        assert_eq!(pair.carrier, pair.modulator + 3);
    }
}
