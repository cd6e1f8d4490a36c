use crate::test_support::SongBuilder;
use crate::{Chip, Player, Status};

const RATE: u32 = 44100;
const CHUNK: usize = 1024;

// sine carrier, modulator silent, short release
const TONE: [u8; 11] = [0x01, 0x21, 0x01, 0x00, 0xf0, 0xf0, 0x00, 0x0f, 0x00, 0x00, 0x01];

#[test]
fn test_song_renders_through_chip() {
    let song = SongBuilder::new(150)
        .patch(TONE)
        .track(
            0,
            &[
                0x00, 0xc0, 0x00, 0x00, // program 0
                0x90, 0x3d, 0x7f, 0x08, // note on, held for 8 steps
                0x80, 0x3d, 0x00, 0x64, // note off, then 100 steps of release
                0xff,
            ],
        )
        .build();

    let mut player = Player::new(Chip::new(RATE), RATE);
    player.load_song(song).expect("load");

    let mut chunks = Vec::new();
    for _ in 0..1000 {
        let mut buffer = vec![0i16; CHUNK * 2];
        player.render(&mut buffer);
        chunks.push(buffer);
        if !player.is_playing() {
            break;
        }
    }
    assert_eq!(player.status(), Status::Finished);
    // 108 track steps, at 60/148 track steps per render step of 294 frames
    assert!(chunks.len() * CHUNK > 60_000);
    assert!(chunks.len() * CHUNK < 100_000);

    assert!(chunks[0].iter().any(|&s| s > 0));
    assert!(chunks[0].iter().any(|&s| s < 0));
    for frame in chunks[0].chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }

    // released long before the end marker
    let last = chunks.len() - 1;
    assert!(chunks[last - 5..].iter().flatten().all(|&s| s == 0));
}
