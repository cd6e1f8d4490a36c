use super::{MAX_VOLUME, Player};
use crate::sequencer::Status;
use crate::song::SongError;
use crate::test_support::{RecordingSynth, SongBuilder};

const RATE: u32 = 15000;

fn end_only_song() -> Vec<u8> {
    SongBuilder::new(150).track(9, &[0x00, 0xff]).build()
}

fn long_song() -> Vec<u8> {
    SongBuilder::new(150).track(0, &[0x7f, 0xff]).build()
}

#[test]
fn test_end_marker_finishes_in_first_render() {
    let mut player = Player::new(RecordingSynth::default(), RATE);
    player.load_song(end_only_song()).expect("load");
    assert_eq!(player.status(), Status::BeginPlay);
    assert!(player.is_playing());

    let mut buffer = vec![7i16; 128];
    player.render(&mut buffer);
    assert_eq!(player.status(), Status::Finished);
    assert!(!player.is_playing());
    assert!(buffer.iter().all(|&s| s == 0));

    // a finished song leaves the buffer to the caller
    let mut buffer = vec![5i16; 128];
    player.render(&mut buffer);
    assert!(buffer.iter().all(|&s| s == 5));
}

#[test]
fn test_frames_after_song_end_are_silent() {
    let mut player = Player::new(RecordingSynth::with_fill(1000), RATE);
    player.load_song(end_only_song()).expect("load");

    // one step covers 100 frames, the song ends with it
    let mut buffer = vec![0i16; 512];
    player.render(&mut buffer);
    assert!(buffer[..200].iter().all(|&s| s == 1000));
    assert!(buffer[200..].iter().all(|&s| s == 0));
}

#[test]
fn test_volume_scales_output() {
    let mut player = Player::new(RecordingSynth::with_fill(1000), RATE);
    player.load_song(long_song()).expect("load");

    let mut buffer = vec![0i16; 64];
    player.render(&mut buffer);
    assert!(buffer.iter().all(|&s| s == 1000));

    player.set_volume(64);
    player.render(&mut buffer);
    assert!(buffer.iter().all(|&s| s == 503));

    player.set_volume(0);
    player.render(&mut buffer);
    assert!(buffer.iter().all(|&s| s == 0));

    player.set_volume(200);
    assert_eq!(player.volume().load(std::sync::atomic::Ordering::Relaxed), MAX_VOLUME);
    player.render(&mut buffer);
    assert!(buffer.iter().all(|&s| s == 1000));
    assert_eq!(player.status(), Status::Playing);
}

#[test]
fn test_shared_volume_handle() {
    let player = Player::new(RecordingSynth::default(), RATE);
    let volume = player.volume();
    player.set_volume(12);
    assert_eq!(volume.load(std::sync::atomic::Ordering::Relaxed), 12);
}

#[test]
fn test_unload_resets_device() {
    let mut player = Player::new(RecordingSynth::default(), RATE);
    player.unload_song();
    let writes = player.synth_mut().take_writes();
    assert_eq!(writes.len(), 0xf5 + 6);
    assert_eq!(writes[0], (0x01, 0));
    assert_eq!(writes[0xf4], (0xf5, 0));
    assert_eq!(
        writes[0xf5..],
        [
            (0x04, 0x60),
            (0x04, 0x80),
            (0x01, 0x20),
            (0xa8, 0x01),
            (0x08, 0x40),
            (0xbd, 0xc0)
        ]
    );
}

#[test]
fn test_unload_twice() {
    let mut player = Player::new(RecordingSynth::default(), RATE);
    player.load_song(long_song()).expect("load");
    player.unload_song();
    assert_eq!(player.status(), Status::Stopped);
    player.unload_song();
    assert_eq!(player.status(), Status::Stopped);
    assert!(player.sequencer().song().is_none());
}

#[test]
fn test_invalid_song_keeps_current() {
    let mut player = Player::new(RecordingSynth::default(), RATE);
    player.load_song(long_song()).expect("load");
    player.synth_mut().take_writes();

    assert_eq!(player.load_song(Vec::new()), Err(SongError::Empty));
    assert_eq!(player.status(), Status::BeginPlay);
    assert!(player.sequencer().song().is_some());
    assert!(player.synth().writes.is_empty());
}

#[test]
fn test_reload_replaces_tracks() {
    let mut player = Player::new(RecordingSynth::default(), RATE);
    player
        .load_song(SongBuilder::new(150).track(3, &[0x00, 0xff]).build())
        .expect("load");
    let mut buffer = vec![0i16; 64];
    player.render(&mut buffer);
    assert_eq!(player.status(), Status::Finished);

    player.load_song(long_song()).expect("load");
    assert_eq!(player.status(), Status::BeginPlay);
    let tracks = player.sequencer().tracks();
    assert_eq!(tracks[3].start, None);
    assert!(tracks[0].start.is_some());

    player.render(&mut buffer);
    assert_eq!(player.status(), Status::Playing);
}

#[test]
fn test_zero_rate_render_returns() {
    // tempo 0 never lets the tracks step, the song plays forever
    let mut player = Player::new(RecordingSynth::with_fill(1000), 0);
    player
        .load_song(SongBuilder::new(0).track(0, &[0x00, 0xff]).build())
        .expect("load");

    let mut buffer = vec![0i16; 64];
    player.render(&mut buffer);
    assert_eq!(player.status(), Status::Playing);
    assert!(buffer.iter().all(|&s| s == 1000));
}
