//! AdLib music playback for Transport Tycoon DOS music catalogs.
//!
//! Songs are a pseudo-MIDI bytecode interpreted by [`Player`], which drives
//! an emulated OPL2 [`Chip`] and renders interleaved stereo PCM on demand.
//! [`AdlibDriver`] wires a player into an audio [`Mixer`].

#[cfg(test)]
#[path = "./lib_test.rs"]
mod lib_test;

#[cfg(test)]
mod test_support;

pub mod catalog;
pub mod chip;
pub mod driver;
pub mod player;
pub mod sequencer;
pub mod song;
pub mod tables;
pub mod voice;

mod util;

#[cfg(feature = "sdl")]
pub mod backend_sdl;

pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use chip::Chip;
pub use driver::{AdlibDriver, DriverError, Mixer, MusicSource, SongInfo};
pub use player::Player;
pub use sequencer::Status;
pub use song::{Patch, Song, SongError};

/// Number of pseudo-MIDI tracks in a song.
pub const NUM_TRACKS: usize = 16;
/// The track whose notes select percussion patches.
pub const PERCUSSION_TRACK: usize = 9;
/// Number of two-operator synthesizer channels available to the player.
pub const NUM_VOICES: usize = 9;

/// Register interface of an FM synthesizer.
pub trait Synth {
    fn write_reg(&mut self, reg: u32, val: u8);
    /// Fills `out` with interleaved stereo frames.
    fn render(&mut self, out: &mut [i16]);
}

/// Creates a driver playing through the default SDL audio device.
#[cfg(feature = "sdl")]
pub fn new(mixer_rate: u32) -> Result<AdlibDriver<backend_sdl::SdlMixer>, DriverError> {
    let mixer = backend_sdl::SdlMixer::new(mixer_rate)?;
    Ok(AdlibDriver::new(mixer))
}
