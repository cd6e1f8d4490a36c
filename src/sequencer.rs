//! Interpreter for the pseudo-MIDI track bytecode.
//!
//! Every track is a stream of events separated by variable length delays.
//! Events are dispatched on the running status: note off (0x80), note
//! on (0x90), controller (0xB0), program change (0xC0) and pitch bend
//! (0xE0). Three bytes are special wherever a status may appear: 0xFE
//! calls a segment, 0xFD returns from it and 0xFF ends the song.

use core::cmp::Ordering;

use thiserror::Error;

use crate::song::Song;
use crate::tables::{
    CHANNEL_OPERATORS, NOTE_BLOCK, NOTE_FREQUENCY, PERCUSSION_BASE_NOTE, PERCUSSION_NOTES,
    PERCUSSION_PATCHES, PITCHBEND_SCALE,
};
use crate::voice::{Program, VoicePool};
use crate::{NUM_TRACKS, PERCUSSION_TRACK, Synth};

/// Events a track may execute in one step before it is considered stuck.
pub const MAX_EVENTS_PER_STEP: usize = 1024;

/// Percussion goes last so it wins channels over the melodic tracks.
const TRACK_ORDER: [usize; NUM_TRACKS] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 14, 15, 9];

const TEMPO_TICKS_RELOAD: i16 = 0x94;
const TEMPO_TICKS_START: i16 = 60;

const CONTROLLER_TEMPO: u8 = 0x00;
const CONTROLLER_VOLUME: u8 = 0x07;
const CONTROLLER_DUAL_ON: u8 = 0x7e;
const CONTROLLER_DUAL_OFF: u8 = 0x7f;
const PROGRAM_REPEAT_MARK: u8 = 0x7e;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Stopped,
    Playing,
    Finished,
    /// A song is loaded, playback starts with the next render.
    BeginPlay,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum BytecodeError {
    #[error("bytecode ends unexpectedly at offset {0}")]
    UnexpectedEnd(usize),
    #[error("more than 1024 events without a delay")]
    Runaway,
}

/// Playback state of one pseudo-MIDI track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    pub program: Option<u8>,
    pub running_status: u8,
    /// 0 to 128, scales note velocities.
    pub volume: u8,
    pub pitchbend: i8,
    /// Steps until the next event.
    pub delay: u16,
    /// Offset of the next event, `None` for tracks that do not play.
    pub position: Option<usize>,
    pub start: Option<usize>,
    /// Where to continue after the current segment, one level only.
    pub call_return: Option<usize>,
    /// Track that doubles the notes of this one.
    pub dual: Option<usize>,
}

impl Default for Track {
    fn default() -> Track {
        Track {
            program: None,
            running_status: 0,
            volume: 127,
            pitchbend: 0,
            delay: 0,
            position: None,
            start: None,
            call_return: None,
            dual: None,
        }
    }
}

pub struct Sequencer {
    song: Option<Song>,
    tracks: [Track; NUM_TRACKS],
    voices: VoicePool,
    status: Status,
    song_tempo: i16,
    tempo_ticks: i16,
    active_notes: u16,
}

impl Default for Sequencer {
    fn default() -> Sequencer {
        Sequencer::new()
    }
}

impl Sequencer {
    pub fn new() -> Sequencer {
        Sequencer {
            song: None,
            tracks: [Track::default(); NUM_TRACKS],
            voices: VoicePool::new(),
            status: Status::Stopped,
            song_tempo: 0,
            tempo_ticks: 0,
            active_notes: 0,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.status, Status::Playing | Status::BeginPlay)
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn tracks(&self) -> &[Track; NUM_TRACKS] {
        &self.tracks
    }

    pub fn voices(&self) -> &VoicePool {
        &self.voices
    }

    pub fn song_tempo(&self) -> i16 {
        self.song_tempo
    }

    pub fn active_notes(&self) -> u16 {
        self.active_notes
    }

    /// Takes ownership of `song`, dropping the previous one, and resets all
    /// track and channel state. Playback begins with [`Sequencer::restart`].
    pub fn load(&mut self, song: Song) {
        self.tracks = [Track::default(); NUM_TRACKS];
        self.voices.reset();
        for (i, track) in self.tracks.iter_mut().enumerate() {
            track.start = song.track_start(i);
        }
        self.song_tempo = song.initial_tempo();
        self.active_notes = 0;
        self.song = Some(song);
        self.status = Status::BeginPlay;
    }

    pub fn unload(&mut self) {
        self.song = None;
        self.active_notes = 0;
        self.status = Status::Stopped;
    }

    /// Rewinds every track to its start and reads the initial delays.
    pub fn restart(&mut self) {
        let Some(song) = self.song.as_ref() else {
            self.status = Status::Stopped;
            return;
        };
        for (i, track) in self.tracks.iter_mut().enumerate() {
            track.pitchbend = 0;
            track.dual = None;
            track.position = None;
            track.delay = 0;
            if let Some(mut pos) = track.start {
                match song.read_delay(&mut pos) {
                    Some(delay) => {
                        track.position = Some(pos);
                        track.delay = delay;
                    }
                    None => log::warn!("track {i} has no initial delay, it will not play"),
                }
            }
        }
        self.tempo_ticks = TEMPO_TICKS_START;
        self.song_tempo = song.initial_tempo();
        self.status = Status::Playing;
    }

    /// Advances the tempo countdown, true when the tracks are due for a step.
    pub fn tempo_tick(&mut self) -> bool {
        self.tempo_ticks = self.tempo_ticks.wrapping_sub(self.song_tempo);
        if self.tempo_ticks > 0 {
            return false;
        }
        self.tempo_ticks = self.tempo_ticks.wrapping_add(TEMPO_TICKS_RELOAD);
        true
    }

    /// Runs the events of every track whose delay has expired and counts
    /// down the others.
    pub fn play_tracks<S: Synth>(&mut self, synth: &mut S) {
        let Some(song) = self.song.take() else {
            return;
        };
        for tr in TRACK_ORDER {
            if self.tracks[tr].position.is_none() {
                continue;
            }
            if self.tracks[tr].delay == 0 {
                if let Err(err) = self.play_track_step(&song, synth, tr) {
                    log::warn!("track {tr} halted: {err}");
                    self.tracks[tr].position = None;
                }
            }
            self.tracks[tr].delay = self.tracks[tr].delay.wrapping_sub(1);
        }
        if self.status == Status::Playing && self.tracks.iter().all(|t| t.position.is_none()) {
            log::info!("no track left playing, song finished");
            self.status = Status::Finished;
        }
        self.song = Some(song);
    }

    fn play_track_step<S: Synth>(
        &mut self,
        song: &Song,
        synth: &mut S,
        tr: usize,
    ) -> Result<(), BytecodeError> {
        let Some(mut pos) = self.tracks[tr].position else {
            return Ok(());
        };
        let result = self.run_events(song, synth, tr, &mut pos);
        self.tracks[tr].position = Some(pos);
        result
    }

    fn run_events<S: Synth>(
        &mut self,
        song: &Song,
        synth: &mut S,
        tr: usize,
        pos: &mut usize,
    ) -> Result<(), BytecodeError> {
        let mut events = 0;
        while self.tracks[tr].delay == 0 {
            events += 1;
            if events > MAX_EVENTS_PER_STEP {
                return Err(BytecodeError::Runaway);
            }

            let mut b1 = next_byte(song, pos)?;
            match b1 {
                0xfe => {
                    let segment = next_byte(song, pos)?;
                    match song.segment_start(segment) {
                        Some(start) => {
                            log::trace!("track {tr} calls segment {segment}");
                            self.tracks[tr].call_return = Some(*pos);
                            *pos = start;
                        }
                        None => log::warn!("track {tr} calls missing segment {segment}"),
                    }
                    self.tracks[tr].delay = next_delay(song, pos)?;
                    continue;
                }
                0xfd => {
                    match self.tracks[tr].call_return.take() {
                        Some(ret) => *pos = ret,
                        None => log::warn!("track {tr} returns without a segment call"),
                    }
                    self.tracks[tr].delay = next_delay(song, pos)?;
                    continue;
                }
                0xff => {
                    log::debug!("track {tr} ends the song");
                    self.status = Status::Finished;
                    return Ok(());
                }
                0x80.. => {
                    self.tracks[tr].running_status = b1;
                    b1 = next_byte(song, pos)?;
                }
                _ => {}
            }

            match self.tracks[tr].running_status & 0xf0 {
                0x80 => {
                    // velocity, unused for note off
                    next_byte(song, pos)?;
                    self.active_notes = self.active_notes.saturating_sub(1);
                    self.play_note(song, synth, tr, 0, b1);
                    if let Some(dual) = self.tracks[tr].dual {
                        self.play_note(song, synth, dual, 0, b1);
                    }
                }
                0x90 => {
                    let b2 = next_byte(song, pos)?;
                    let track = self.tracks[tr];
                    if b2 != 0 {
                        let velocity = (b2 as u32 * track.volume as u32 / 128) as u8;
                        if let Some(dual) = track.dual {
                            if self.voices.any_free() {
                                self.tracks[dual].program = track.program;
                                self.tracks[dual].pitchbend = track.pitchbend;
                                self.play_note(song, synth, dual, velocity, b1);
                            }
                        }
                        self.play_note(song, synth, tr, velocity, b1);
                        self.active_notes = self.active_notes.wrapping_add(1);
                    } else {
                        self.active_notes = self.active_notes.saturating_sub(1);
                        if let Some(dual) = track.dual {
                            self.play_note(song, synth, dual, 0, b1);
                        }
                        self.play_note(song, synth, tr, 0, b1);
                    }
                }
                0xb0 => {
                    let b2 = next_byte(song, pos)?;
                    self.controller(tr, b1, b2);
                }
                0xc0 => {
                    if b1 == PROGRAM_REPEAT_MARK {
                        log::debug!("track {tr} reached the repeat mark");
                        self.status = Status::Finished;
                        return Ok(());
                    }
                    log::debug!("track {tr} program {b1}");
                    self.tracks[tr].program = Some(b1);
                }
                0xe0 => {
                    let amount = b1.wrapping_sub(16) as i8;
                    self.pitch_bend(synth, tr, amount);
                    if let Some(dual) = self.tracks[tr].dual {
                        self.pitch_bend(synth, dual, amount);
                    }
                }
                _ => {}
            }

            self.tracks[tr].delay = next_delay(song, pos)?;
        }
        Ok(())
    }

    fn controller(&mut self, tr: usize, controller: u8, value: u8) {
        let track = &mut self.tracks[tr];
        match controller {
            CONTROLLER_VOLUME => {
                track.volume = if value != 0 { value.wrapping_add(1) } else { 0 };
                log::debug!("track {tr} volume {}", track.volume);
            }
            CONTROLLER_TEMPO => {
                if value != 0 {
                    self.song_tempo = (value as i32 * 48 / 60) as i16;
                    log::debug!("track {tr} tempo {}", self.song_tempo);
                }
            }
            CONTROLLER_DUAL_ON => {
                // stored off by one, 1 and below mean no doubling
                track.dual = match value {
                    2..=16 => Some(value as usize - 1),
                    0 | 1 => None,
                    _ => {
                        log::warn!("track {tr} doubles onto missing track {}", value - 1);
                        None
                    }
                };
                log::debug!("track {tr} dual {:?}", track.dual);
            }
            CONTROLLER_DUAL_OFF => {
                track.dual = None;
                log::debug!("track {tr} dual off");
            }
            _ => {}
        }
    }

    fn calc_frequency(&self, tr: usize, note: u8) -> u16 {
        let bend = self.tracks[tr].pitchbend as i16;
        let freq = NOTE_FREQUENCY[note as usize] as i16;
        let scaled = match bend.cmp(&0) {
            Ordering::Equal => freq,
            Ordering::Greater => (PITCHBEND_SCALE[note as usize] as i16)
                .wrapping_mul(bend)
                .wrapping_add(freq),
            // downward bends raise the pitch as well
            Ordering::Less => (PITCHBEND_SCALE[note.saturating_sub(1) as usize] as i16)
                .wrapping_mul(-bend)
                .wrapping_add(freq),
        };
        scaled as u16
    }

    fn play_note<S: Synth>(&mut self, song: &Song, synth: &mut S, tr: usize, velocity: u8, note: u8) {
        // notes are stored one above the table index
        let Some(note) = note.checked_sub(1).filter(|&n| n < 128) else {
            log::trace!("track {tr} plays invalid note {note}");
            return;
        };
        // uninitialized tracks, typically dual targets, stay silent
        let Some(program) = self.tracks[tr].program else {
            return;
        };

        let (patch, program, note) = if tr == PERCUSSION_TRACK {
            let Some(index) = note
                .checked_sub(PERCUSSION_BASE_NOTE)
                .filter(|&index| index <= 30)
            else {
                return;
            };
            let Some(sound) = PERCUSSION_NOTES[index as usize] else {
                log::trace!("percussion note {note} has no sound");
                return;
            };
            (
                &PERCUSSION_PATCHES[sound.patch as usize],
                Program::Percussion(sound.patch),
                sound.note.saturating_sub(1),
            )
        } else {
            let Some(patch) = song.patch(program) else {
                log::warn!("track {tr} plays missing program {program}");
                return;
            };
            (patch, Program::Melodic(program), note)
        };

        if velocity == 0 {
            for (ch, voice) in self.voices.iter_mut() {
                if voice.note == Some(note) && voice.owner == tr {
                    log::trace!("track {tr} note off {note} on channel {ch}");
                    voice.note = None;
                    synth.write_reg(0xb0 + ch as u32, voice.block_fnum);
                }
            }
            return;
        }

        let (ch, needs_program) = self.voices.select(program);
        let freq = self.calc_frequency(tr, note);
        let block = NOTE_BLOCK[note as usize];
        let Some(voice) = self.voices.get_mut(ch) else {
            return;
        };
        log::trace!("track {tr} note on {note} velocity {velocity} on channel {ch}");
        voice.velocity = velocity;
        voice.note = Some(note);
        voice.owner = tr;

        let chan = ch as u32;
        let op1 = CHANNEL_OPERATORS[ch].modulator as u32;
        let op2 = CHANNEL_OPERATORS[ch].carrier as u32;

        if needs_program {
            synth.write_reg(0x20 + op1, patch.op1_flags);
            synth.write_reg(0x20 + op2, patch.op2_flags);
            let key_scale = patch.op1_level & 0xc0;
            let attenuation = patch.op1_level.wrapping_neg() & 0x3f;
            synth.write_reg(0x40 + op1, key_scale | attenuation);
        }

        synth.write_reg(0xb0 + chan, voice.block_fnum);
        let level = (((velocity as u32 * 127) >> 8) as u8 ^ 0xff) & 0x3f;
        synth.write_reg(0x40 + op2, level);

        if needs_program {
            synth.write_reg(0x60 + op1, patch.op1_attack_decay);
            synth.write_reg(0x60 + op2, patch.op2_attack_decay);
            synth.write_reg(0x80 + op1, patch.op1_sustain_release);
            synth.write_reg(0x80 + op2, patch.op2_sustain_release);
            synth.write_reg(0xe0 + op1, patch.op1_waveform);
            synth.write_reg(0xe0 + op2, patch.op2_waveform);
            synth.write_reg(0xc0 + chan, patch.connection ^ 1);
        }

        voice.freq = freq;
        voice.block_fnum = (block << 2) | (freq >> 8) as u8;
        synth.write_reg(0xa0 + chan, (freq & 0xff) as u8);
        synth.write_reg(0xb0 + chan, voice.block_fnum | 0x20);
    }

    fn pitch_bend<S: Synth>(&mut self, synth: &mut S, tr: usize, amount: i8) {
        self.tracks[tr].pitchbend = amount;
        for ch in 0..self.voices.voices().len() {
            let voice = self.voices.voices()[ch];
            let Some(note) = voice.note else {
                continue;
            };
            if voice.owner != tr {
                continue;
            }
            let freq = self.calc_frequency(tr, note);
            if let Some(voice) = self.voices.get_mut(ch) {
                voice.freq = freq;
            }
            let chan = ch as u32;
            synth.write_reg(0xa0 + chan, (freq & 0xff) as u8);
            synth.write_reg(
                0xb0 + chan,
                0x20 | (NOTE_BLOCK[note as usize] << 2) | (freq >> 8) as u8,
            );
        }
    }
}

fn next_byte(song: &Song, pos: &mut usize) -> Result<u8, BytecodeError> {
    let b = song.byte_at(*pos).ok_or(BytecodeError::UnexpectedEnd(*pos))?;
    *pos += 1;
    Ok(b)
}

fn next_delay(song: &Song, pos: &mut usize) -> Result<u16, BytecodeError> {
    let start = *pos;
    song.read_delay(pos).ok_or(BytecodeError::UnexpectedEnd(start))
}

#[cfg(test)]
#[path = "./sequencer_test.rs"]
mod sequencer_test;
