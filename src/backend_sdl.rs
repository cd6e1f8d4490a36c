use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};
use sdl2::{self, AudioSubsystem};

use crate::driver::{DriverError, Mixer, MusicSource};

/// Mixer playing through the default SDL audio device.
pub struct SdlMixer {
    // keeps the subsystem alive while the device plays
    _audio_subsystem: AudioSubsystem,
    device: AudioDevice<MusicCallback>,
    rate: u32,
}

// According to the SDL documentation the audio system is thread-safe.
// But the SDL API does not mark is as Send and without the 'Send' marker
// it is impossible to use this in an asynchronous context.
unsafe impl Send for SdlMixer {}

impl SdlMixer {
    /// Opens a stereo 16 bit device, asking for `mixer_rate`. The device
    /// may negotiate another rate, see [`Mixer::sample_rate`].
    pub fn new(mixer_rate: u32) -> Result<SdlMixer, DriverError> {
        let sdl_context = sdl2::init().map_err(DriverError::Device)?;
        let audio_subsystem = sdl_context.audio().map_err(DriverError::Device)?;

        let desired_spec = AudioSpecDesired {
            freq: Some(mixer_rate as i32),
            channels: Some(2),
            samples: Some(((mixer_rate * 2048) / 44100) as u16),
        };
        let device = audio_subsystem
            .open_playback(None, &desired_spec, |_| MusicCallback { source: None })
            .map_err(DriverError::Device)?;

        let rate = device.spec().freq as u32;
        log::info!(
            "opened SDL audio device at {rate} Hz, {} frames per buffer",
            device.spec().samples
        );
        Ok(SdlMixer {
            _audio_subsystem: audio_subsystem,
            device,
            rate,
        })
    }
}

impl Mixer for SdlMixer {
    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn set_music_source(&mut self, source: Option<MusicSource>) -> Result<(), DriverError> {
        let playing = source.is_some();
        {
            let mut cb = self.device.lock();
            cb.source = source;
        }
        if playing {
            self.device.resume();
        } else {
            self.device.pause();
        }
        Ok(())
    }
}

struct MusicCallback {
    source: Option<MusicSource>,
}

impl AudioCallback for MusicCallback {
    type Channel = i16;

    fn callback(&mut self, out: &mut [i16]) {
        out.fill(0);
        if let Some(source) = self.source.as_mut() {
            source(out);
        }
    }
}
