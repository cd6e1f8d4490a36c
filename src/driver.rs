//! Music driver facade: owns the player while started and feeds it to an
//! audio mixer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::Chip;
use crate::catalog::{self, CatalogError};
use crate::player::{MAX_VOLUME, Player};
use crate::song::SongError;

/// Render callback installed into a mixer. Called with interleaved stereo
/// frames to fill.
pub type MusicSource = Box<dyn FnMut(&mut [i16]) + Send>;

/// Audio output pulling music on demand.
pub trait Mixer {
    /// Negotiated output rate in Hz.
    fn sample_rate(&self) -> u32;
    /// Installs `source`, or removes the current one with `None`.
    fn set_music_source(&mut self, source: Option<MusicSource>) -> Result<(), DriverError>;
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver is not started")]
    NotStarted,
    #[error("audio device: {0}")]
    Device(String),
    #[error("invalid song: {0}")]
    Song(#[from] SongError),
    #[error("song lookup failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Location of a song in a music catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    pub filename: PathBuf,
    pub cat_index: usize,
}

pub struct AdlibDriver<M: Mixer> {
    mixer: M,
    player: Option<Arc<Mutex<Player<Chip>>>>,
    volume: Arc<AtomicU8>,
}

impl<M: Mixer> AdlibDriver<M> {
    pub fn new(mixer: M) -> AdlibDriver<M> {
        AdlibDriver {
            mixer,
            player: None,
            volume: Arc::new(AtomicU8::new(MAX_VOLUME)),
        }
    }

    pub fn name(&self) -> &'static str {
        "adlib"
    }

    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut M {
        &mut self.mixer
    }

    /// Builds a player for the mixer rate and installs it as music source.
    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.player.is_some() {
            self.stop()?;
        }
        let rate = self.mixer.sample_rate();
        if rate == 0 {
            return Err(DriverError::Device(
                "mixer reports a sample rate of 0".to_string(),
            ));
        }

        let player = Arc::new(Mutex::new(Player::with_volume(
            Chip::new(rate),
            rate,
            Arc::clone(&self.volume),
        )));
        let source_player = Arc::clone(&player);
        let source: MusicSource = Box::new(move |buffer: &mut [i16]| {
            lock(&source_player).render(buffer);
        });
        self.mixer.set_music_source(Some(source))?;
        self.player = Some(player);
        log::info!("adlib driver started at {rate} Hz");
        Ok(())
    }

    /// Removes the music source and drops the player with its song.
    pub fn stop(&mut self) -> Result<(), DriverError> {
        if self.player.take().is_some() {
            self.mixer.set_music_source(None)?;
            log::info!("adlib driver stopped");
        }
        Ok(())
    }

    /// Looks up `song` in its catalog and plays it. On failure the current
    /// song is stopped.
    pub fn play_song(&mut self, song: &SongInfo) -> Result<(), DriverError> {
        if self.player.is_none() {
            return Err(DriverError::NotStarted);
        }
        match catalog::load_entry(&song.filename, song.cat_index) {
            Ok(data) => self.play_song_data(data),
            Err(e) => {
                self.stop_song();
                Err(e.into())
            }
        }
    }

    /// Plays raw song bytes. Invalid data stops the current song.
    pub fn play_song_data(&mut self, data: Vec<u8>) -> Result<(), DriverError> {
        let player = self.player.as_ref().ok_or(DriverError::NotStarted)?;
        let mut player = lock(player);
        if let Err(e) = player.load_song(data) {
            player.unload_song();
            return Err(e.into());
        }
        Ok(())
    }

    pub fn stop_song(&mut self) {
        if let Some(player) = self.player.as_ref() {
            lock(player).unload_song();
        }
    }

    pub fn is_song_playing(&self) -> bool {
        self.player
            .as_ref()
            .is_some_and(|player| lock(player).is_playing())
    }

    /// Sets the music volume, 0 to 127. Takes effect with the next render.
    pub fn set_volume(&self, volume: u8) {
        self.volume.store(volume.min(MAX_VOLUME), Ordering::Relaxed);
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }
}

impl<M: Mixer> Drop for AdlibDriver<M> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("stopping the adlib driver failed: {e}");
        }
    }
}

// a panic inside a render call leaves the player usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "./driver_test.rs"]
mod driver_test;
