use crate::Synth;
use crate::song::PATCH_LEN;

/// Synth that records register writes and renders a constant sample.
#[derive(Default)]
pub struct RecordingSynth {
    pub writes: Vec<(u32, u8)>,
    pub fill: i16,
}

impl RecordingSynth {
    pub fn with_fill(fill: i16) -> RecordingSynth {
        RecordingSynth {
            writes: Vec::new(),
            fill,
        }
    }

    pub fn take_writes(&mut self) -> Vec<(u32, u8)> {
        std::mem::take(&mut self.writes)
    }
}

impl Synth for RecordingSynth {
    fn write_reg(&mut self, reg: u32, val: u8) {
        self.writes.push((reg, val));
    }

    fn render(&mut self, out: &mut [i16]) {
        out.fill(self.fill);
    }
}

/// Assembles song files in the on-disk layout.
pub struct SongBuilder {
    tempo: u8,
    patches: Vec<[u8; 11]>,
    segments: Vec<Vec<u8>>,
    tracks: Vec<(u8, Vec<u8>)>,
}

impl SongBuilder {
    pub fn new(tempo: u8) -> SongBuilder {
        SongBuilder {
            tempo,
            patches: Vec::new(),
            segments: Vec::new(),
            tracks: Vec::new(),
        }
    }

    pub fn patch(mut self, raw: [u8; 11]) -> SongBuilder {
        self.patches.push(raw);
        self
    }

    pub fn segment(mut self, code: &[u8]) -> SongBuilder {
        self.segments.push(code.to_vec());
        self
    }

    pub fn track(mut self, track: u8, code: &[u8]) -> SongBuilder {
        self.tracks.push((track, code.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![self.tempo, self.patches.len() as u8];
        for patch in &self.patches {
            data.extend_from_slice(patch);
            data.resize(data.len() + PATCH_LEN - patch.len(), 0);
        }
        data.push(self.segments.len() as u8);
        for code in &self.segments {
            data.extend_from_slice(&((code.len() + 4) as u16).to_le_bytes());
            data.extend_from_slice(&[0, 0]);
            data.extend_from_slice(code);
        }
        data.push(self.tracks.len() as u8);
        for (track, code) in &self.tracks {
            data.extend_from_slice(&((code.len() + 5) as u16).to_le_bytes());
            data.extend_from_slice(&[0, 0, *track]);
            data.extend_from_slice(code);
        }
        data
    }
}
