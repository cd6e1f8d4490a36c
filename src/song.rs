use thiserror::Error;

use crate::NUM_TRACKS;
use crate::util::DataReader;

/// Size of a patch record in the song file. Only the first 11 bytes are used.
pub const PATCH_LEN: usize = 24;

const SEGMENT_HEADER_LEN: usize = 4;
const TRACK_HEADER_LEN: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SongError {
    #[error("song data is empty")]
    Empty,
    #[error("song data ends inside the {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },
    #[error("{what} record at offset {offset} has invalid length {length}")]
    RecordLength {
        what: &'static str,
        offset: usize,
        length: u16,
    },
    #[error("track record at offset {offset} targets track {track}, valid tracks are 0-15")]
    TrackIndex { offset: usize, track: u8 },
}

/// Two-operator instrument definition, raw register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Patch {
    /// Tremolo, vibrato, sustain, KSR and frequency multiplier (0x20).
    pub op1_flags: u8,
    pub op2_flags: u8,
    /// Key scale in the top two bits, volume (inverted attenuation) below.
    pub op1_level: u8,
    pub unused: u8,
    pub op1_attack_decay: u8,
    pub op2_attack_decay: u8,
    pub op1_sustain_release: u8,
    pub op2_sustain_release: u8,
    pub op1_waveform: u8,
    pub op2_waveform: u8,
    /// Feedback and connection, with the connection bit inverted.
    pub connection: u8,
}

impl Patch {
    pub const fn from_raw(raw: [u8; 11]) -> Patch {
        Patch {
            op1_flags: raw[0],
            op2_flags: raw[1],
            op1_level: raw[2],
            unused: raw[3],
            op1_attack_decay: raw[4],
            op2_attack_decay: raw[5],
            op1_sustain_release: raw[6],
            op2_sustain_release: raw[7],
            op1_waveform: raw[8],
            op2_waveform: raw[9],
            connection: raw[10],
        }
    }
}

/// A parsed song. Owns the raw song bytes, bytecode positions are offsets
/// into them.
#[derive(Debug, Clone)]
pub struct Song {
    data: Vec<u8>,
    patches: Vec<Patch>,
    segments: Vec<usize>,
    tracks: [Option<usize>; NUM_TRACKS],
}

impl Song {
    pub fn parse(data: Vec<u8>) -> Result<Song, SongError> {
        if data.is_empty() {
            return Err(SongError::Empty);
        }
        let mut reader = DataReader::new(&data);
        // tempo, validated by the emptiness check
        reader.seek(1);

        let num_patches = read_count(&mut reader, "patch count")?;
        let mut patches = Vec::with_capacity(num_patches as usize);
        for _ in 0..num_patches {
            let offset = reader.offset();
            let record = reader
                .read_bytes(PATCH_LEN)
                .ok_or(SongError::Truncated {
                    what: "patch table",
                    offset,
                })?;
            let mut raw = [0; 11];
            raw.copy_from_slice(&record[..11]);
            patches.push(Patch::from_raw(raw));
        }

        let num_segments = read_count(&mut reader, "segment count")?;
        let mut segments = Vec::with_capacity(num_segments as usize);
        for _ in 0..num_segments {
            let (start, length) = read_record(&mut reader, "segment", SEGMENT_HEADER_LEN)?;
            segments.push(start + SEGMENT_HEADER_LEN);
            reader.seek(start + length as usize);
        }

        let num_tracks = read_count(&mut reader, "track count")?;
        let mut tracks = [None; NUM_TRACKS];
        for _ in 0..num_tracks {
            let (start, length) = read_record(&mut reader, "track", TRACK_HEADER_LEN)?;
            let track = data[start + 4];
            if track as usize >= NUM_TRACKS {
                return Err(SongError::TrackIndex {
                    offset: start,
                    track,
                });
            }
            if tracks[track as usize].is_some() {
                log::warn!("song assigns track {track} twice, the later record wins");
            }
            tracks[track as usize] = Some(start + TRACK_HEADER_LEN);
            reader.seek(start + length as usize);
        }

        log::debug!(
            "parsed song: {} bytes, {} patches, {} segments, {} tracks",
            data.len(),
            patches.len(),
            segments.len(),
            tracks.iter().flatten().count()
        );

        Ok(Song {
            data,
            patches,
            segments,
            tracks,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Tempo at song start, from the first byte of the song.
    pub fn initial_tempo(&self) -> i16 {
        self.data[0] as i16 * 24 / 60
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn patch(&self, program: u8) -> Option<&Patch> {
        self.patches.get(program as usize)
    }

    pub fn segment_start(&self, segment: u8) -> Option<usize> {
        self.segments.get(segment as usize).copied()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Start of the bytecode of `track`, `None` if the song does not use it.
    pub fn track_start(&self, track: usize) -> Option<usize> {
        self.tracks.get(track).copied().flatten()
    }

    pub(crate) fn byte_at(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    /// Reads a variable length delay starting at `pos`: 7 bits per byte,
    /// most significant first, high bit set on all but the last byte.
    pub(crate) fn read_delay(&self, pos: &mut usize) -> Option<u16> {
        let mut res: u16 = 0;
        loop {
            let b = self.byte_at(*pos)?;
            *pos += 1;
            res = (res << 7).wrapping_add((b & 0x7f) as u16);
            if (b & 0x80) == 0 {
                return Some(res);
            }
        }
    }
}

fn read_count(reader: &mut DataReader, what: &'static str) -> Result<u8, SongError> {
    let offset = reader.offset();
    reader.read_u8().ok_or(SongError::Truncated { what, offset })
}

// Reads the length of a segment or track record and checks that the whole
// header lies inside the song.
fn read_record(
    reader: &mut DataReader,
    what: &'static str,
    header_len: usize,
) -> Result<(usize, u16), SongError> {
    let start = reader.offset();
    let length = reader
        .read_u16()
        .ok_or(SongError::Truncated { what, offset: start })?;
    if (length as usize) < header_len {
        return Err(SongError::RecordLength {
            what,
            offset: start,
            length,
        });
    }
    reader.seek(start);
    if reader.read_bytes(header_len).is_none() {
        return Err(SongError::Truncated { what, offset: start });
    }
    Ok((start, length))
}

#[cfg(test)]
#[path = "./song_test.rs"]
mod song_test;
