//! Allocation of the nine synthesizer channels to sounding notes.

use crate::NUM_VOICES;

/// Instrument loaded into a synthesizer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Index into the song's patches.
    Melodic(u8),
    /// Index into the built-in percussion patches.
    Percussion(u8),
}

/// State of one synthesizer channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Voice {
    /// Note currently sounding, `None` when the channel is free.
    pub note: Option<u8>,
    /// Track that started the note.
    pub owner: usize,
    pub program: Option<Program>,
    pub freq: u16,
    /// Last block/F-number byte written to 0xB0 with key-on clear.
    pub block_fnum: u8,
    pub velocity: u8,
    /// Note-ons survived since this channel was last claimed.
    pub contest: u16,
}

impl Voice {
    pub fn is_free(&self) -> bool {
        self.note.is_none()
    }
}

#[derive(Debug, Default)]
pub struct VoicePool {
    voices: [Voice; NUM_VOICES],
}

impl VoicePool {
    pub fn new() -> VoicePool {
        VoicePool::default()
    }

    pub fn reset(&mut self) {
        self.voices = [Voice::default(); NUM_VOICES];
    }

    pub fn voices(&self) -> &[Voice; NUM_VOICES] {
        &self.voices
    }

    pub fn get_mut(&mut self, channel: usize) -> Option<&mut Voice> {
        self.voices.get_mut(channel)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Voice)> {
        self.voices.iter_mut().enumerate()
    }

    pub fn any_free(&self) -> bool {
        self.voices.iter().any(Voice::is_free)
    }

    /// Claims a channel for a note played with `program`.
    ///
    /// The first free channel wins. Without one, the channel with the
    /// highest contest is stolen, the lowest index on ties. The returned
    /// flag tells whether the channel held a different program and its
    /// operators must be reprogrammed.
    pub fn select(&mut self, program: Program) -> (usize, bool) {
        for voice in self.voices.iter_mut() {
            voice.contest = voice.contest.wrapping_add(1);
        }

        let mut max_contest = 0;
        let mut best = 0;
        for (ch, voice) in self.voices.iter().enumerate() {
            if voice.contest > max_contest {
                max_contest = voice.contest;
                best = ch;
            }
            if voice.is_free() {
                best = ch;
                break;
            }
        }
        let best = best.min(NUM_VOICES - 1);

        let voice = &mut self.voices[best];
        let needs_program = voice.program != Some(program);
        voice.program = Some(program);
        voice.contest = 0;
        (best, needs_program)
    }
}

#[cfg(test)]
#[path = "./voice_test.rs"]
mod voice_test;
