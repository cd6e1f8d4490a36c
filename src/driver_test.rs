use std::fs;

use super::{AdlibDriver, DriverError, Mixer, MusicSource, SongInfo};
use crate::catalog::CatalogError;
use crate::song::SongError;
use crate::test_support::SongBuilder;

const RATE: u32 = 44100;

// sine carrier, modulator silent, short release
const TONE: [u8; 11] = [0x01, 0x21, 0x01, 0x00, 0xf0, 0xf0, 0x00, 0x0f, 0x00, 0x00, 0x01];

struct TestMixer {
    rate: u32,
    source: Option<MusicSource>,
    fail: bool,
}

impl TestMixer {
    fn new(rate: u32) -> TestMixer {
        TestMixer {
            rate,
            source: None,
            fail: false,
        }
    }

    fn pull(&mut self, frames: usize) -> Vec<i16> {
        let mut buffer = vec![0; frames * 2];
        if let Some(source) = self.source.as_mut() {
            source(&mut buffer);
        }
        buffer
    }
}

impl Mixer for TestMixer {
    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn set_music_source(&mut self, source: Option<MusicSource>) -> Result<(), DriverError> {
        if self.fail {
            return Err(DriverError::Device("no audio".to_string()));
        }
        self.source = source;
        Ok(())
    }
}

fn tone_song() -> Vec<u8> {
    SongBuilder::new(150)
        .patch(TONE)
        .track(
            0,
            &[0x00, 0xc0, 0x00, 0x00, 0x90, 0x3d, 0x7f, 0x40, 0x80, 0x3d, 0x00, 0x7f, 0xff],
        )
        .build()
}

fn started() -> AdlibDriver<TestMixer> {
    let mut driver = AdlibDriver::new(TestMixer::new(RATE));
    driver.start().expect("start");
    driver
}

#[test]
fn test_name() {
    let driver = AdlibDriver::new(TestMixer::new(RATE));
    assert_eq!(driver.name(), "adlib");
}

#[test]
fn test_requires_start() {
    let mut driver = AdlibDriver::new(TestMixer::new(RATE));
    assert!(matches!(
        driver.play_song_data(tone_song()),
        Err(DriverError::NotStarted)
    ));
    assert!(!driver.is_song_playing());
    driver.stop_song();
}

#[test]
fn test_start_failures() {
    let mut driver = AdlibDriver::new(TestMixer::new(0));
    assert!(matches!(driver.start(), Err(DriverError::Device(_))));

    let mut mixer = TestMixer::new(RATE);
    mixer.fail = true;
    let mut driver = AdlibDriver::new(mixer);
    assert!(matches!(driver.start(), Err(DriverError::Device(_))));
    assert!(driver.mixer().source.is_none());
    driver.mixer_mut().fail = false;
}

#[test]
fn test_plays_through_mixer() {
    let mut driver = started();
    assert!(driver.mixer().source.is_some());
    assert!(driver.mixer_mut().pull(512).iter().all(|&s| s == 0));

    driver.play_song_data(tone_song()).expect("play");
    assert!(driver.is_song_playing());
    let out = driver.mixer_mut().pull(2048);
    assert!(out.iter().any(|&s| s != 0));

    driver.stop_song();
    assert!(!driver.is_song_playing());
    assert!(driver.mixer_mut().pull(512).iter().all(|&s| s == 0));
}

#[test]
fn test_volume_is_shared_with_player() {
    let mut driver = started();
    driver.play_song_data(tone_song()).expect("play");
    driver.set_volume(0);
    assert!(driver.mixer_mut().pull(2048).iter().all(|&s| s == 0));

    driver.set_volume(255);
    assert_eq!(driver.volume(), 127);
    assert!(driver.mixer_mut().pull(2048).iter().any(|&s| s != 0));
}

#[test]
fn test_invalid_song_stops_playback() {
    let mut driver = started();
    driver.play_song_data(tone_song()).expect("play");

    let result = driver.play_song_data(vec![150, 3]);
    assert!(matches!(
        result,
        Err(DriverError::Song(SongError::Truncated { .. }))
    ));
    assert!(!driver.is_song_playing());
}

#[test]
fn test_play_song_from_catalog() {
    let song = tone_song();
    let name = b"GM_TT00.GM";
    let mut cat = Vec::new();
    cat.extend_from_slice(&8u32.to_le_bytes());
    cat.extend_from_slice(&(song.len() as u32).to_le_bytes());
    cat.push(name.len() as u8);
    cat.extend_from_slice(name);
    cat.extend_from_slice(&song);

    let path = std::env::temp_dir().join(format!("adlib-driver-{}.cat", std::process::id()));
    fs::write(&path, &cat).expect("write catalog");

    let mut driver = started();
    let info = SongInfo {
        filename: path.clone(),
        cat_index: 0,
    };
    driver.play_song(&info).expect("play");
    assert!(driver.is_song_playing());

    let missing = SongInfo {
        filename: path.clone(),
        cat_index: 3,
    };
    assert!(matches!(
        driver.play_song(&missing),
        Err(DriverError::Catalog(CatalogError::EntryOutOfRange { index: 3, count: 1 }))
    ));
    assert!(!driver.is_song_playing());

    fs::remove_file(&path).expect("remove catalog");
}

#[test]
fn test_stop_detaches_source() {
    let mut driver = started();
    driver.play_song_data(tone_song()).expect("play");
    driver.stop().expect("stop");
    assert!(driver.mixer().source.is_none());
    assert!(!driver.is_song_playing());
    assert!(matches!(
        driver.play_song_data(tone_song()),
        Err(DriverError::NotStarted)
    ));

    driver.start().expect("restart");
    assert!(driver.mixer().source.is_some());
}
