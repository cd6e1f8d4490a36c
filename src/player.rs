//! Render loop tying the sequencer to a synthesizer.
//!
//! The player is pulled from the audio callback. Each [`Player::render`]
//! call interleaves synthesizer output with sequencer steps, 150 steps per
//! second of audio.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::Synth;
use crate::sequencer::{Sequencer, Status};
use crate::song::{Song, SongError};

/// Sequencer steps per second of rendered audio.
pub const STEPS_PER_SECOND: f64 = 150.0;
pub const MAX_VOLUME: u8 = 127;

// register values written after clearing 0x01-0xF5
const RESET_SEQUENCE: [(u32, u8); 6] = [
    (0x04, 0x60),
    (0x04, 0x80),
    (0x01, 0x20),
    (0xa8, 0x01),
    (0x08, 0x40),
    (0xbd, 0xc0),
];

pub struct Player<S: Synth> {
    synth: S,
    sequencer: Sequencer,
    volume: Arc<AtomicU8>,
    /// Samples emulated so far, including the fraction of the next one.
    sample_time: f64,
    samples_step: f64,
    last_sample_written: u64,
    render_buffer: Vec<i16>,
}

impl<S: Synth> Player<S> {
    pub fn new(synth: S, sample_rate: u32) -> Player<S> {
        Player::with_volume(synth, sample_rate, Arc::new(AtomicU8::new(MAX_VOLUME)))
    }

    /// Creates a player that reads its gain from a shared volume.
    pub fn with_volume(synth: S, sample_rate: u32, volume: Arc<AtomicU8>) -> Player<S> {
        Player {
            synth,
            sequencer: Sequencer::new(),
            volume,
            sample_time: 0.0,
            // at least one frame per step, so a render call always fills up
            samples_step: (sample_rate as f64 / STEPS_PER_SECOND).max(1.0),
            last_sample_written: 0,
            render_buffer: Vec::new(),
        }
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn status(&self) -> Status {
        self.sequencer.status()
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    /// Handle to the gain applied to every rendered sample, 0 to 127.
    pub fn volume(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.volume)
    }

    pub fn set_volume(&self, volume: u8) {
        self.volume.store(volume.min(MAX_VOLUME), Ordering::Relaxed);
    }

    /// Parses `data` and replaces the current song with it. Playback starts
    /// with the next [`Player::render`] call.
    ///
    /// On a parse error the current song keeps playing.
    pub fn load_song(&mut self, data: Vec<u8>) -> Result<(), SongError> {
        let song = Song::parse(data)?;
        self.unload_song();
        log::info!(
            "loaded song: {} bytes, {} patches, {} segments",
            song.data().len(),
            song.patches().len(),
            song.segment_count()
        );
        self.sample_time = 0.0;
        self.sequencer.load(song);
        Ok(())
    }

    /// Drops the song and silences the synthesizer.
    pub fn unload_song(&mut self) {
        if self.sequencer.song().is_some() {
            log::info!("unloading song");
        }
        self.sequencer.unload();
        self.reset_device();
    }

    fn reset_device(&mut self) {
        for reg in 0x01..=0xf5 {
            self.synth.write_reg(reg, 0);
        }
        for (reg, val) in RESET_SEQUENCE {
            self.synth.write_reg(reg, val);
        }
    }

    fn restart_song(&mut self) {
        self.last_sample_written = 0;
        self.sample_time = 0.0;
        self.sequencer.restart();
    }

    /// Fills `buffer` with interleaved stereo frames of the playing song.
    ///
    /// Leaves `buffer` untouched when nothing plays. Frames after the end of
    /// the song are silent.
    pub fn render(&mut self, buffer: &mut [i16]) {
        if !self.is_playing() {
            return;
        }
        if self.sequencer.status() == Status::BeginPlay {
            self.restart_song();
        }

        let samples = buffer.len() / 2;
        self.render_buffer.clear();
        self.render_buffer.resize(samples * 2, 0);

        let mut buf_pos = 0;
        loop {
            let due = (self.sample_time as u64).saturating_sub(self.last_sample_written);
            let to_write = due.min((samples - buf_pos) as u64) as usize;
            if to_write > 0 {
                self.synth
                    .render(&mut self.render_buffer[buf_pos * 2..(buf_pos + to_write) * 2]);
            }
            self.last_sample_written += to_write as u64;
            buf_pos += to_write;
            if buf_pos == samples {
                break;
            }
            if !self.play_step() {
                break;
            }
        }

        let volume = self.volume.load(Ordering::Relaxed).min(MAX_VOLUME) as i32;
        for (out, &sample) in buffer.iter_mut().zip(self.render_buffer.iter()) {
            *out = (sample as i32 * volume / MAX_VOLUME as i32) as i16;
        }
    }

    /// Advances the song by one step, false once the song no longer plays.
    pub fn play_step(&mut self) -> bool {
        if self.sequencer.status() != Status::Playing {
            return false;
        }
        self.sample_time += self.samples_step;
        if self.sequencer.tempo_tick() {
            self.sequencer.play_tracks(&mut self.synth);
        }
        true
    }
}

#[cfg(test)]
#[path = "./player_test.rs"]
mod player_test;
