//! Constant data of the player: note frequencies, percussion mapping and
//! the channel to operator register layout.

use crate::NUM_VOICES;
use crate::song::Patch;

// The note tables are indexed with any 7 bit note, unlisted notes read 0.
macro_rules! pad_128 {
    ($ty:ty, [$($v:expr),* $(,)?]) => {{
        let values: &[$ty] = &[$($v),*];
        let mut table: [$ty; 128] = [0; 128];
        let mut i = 0;
        while i < values.len() {
            table[i] = values[i];
            i += 1;
        }
        table
    }};
}

/// F-number of every note, the octave comes from [`NOTE_BLOCK`].
pub static NOTE_FREQUENCY: [u16; 128] = pad_128!(
    u16,
    [
        0x0b5, 0x0c0, 0x0cc, 0x0d8, 0x0e5, 0x0f2, 0x101, 0x110,
        0x120, 0x131, 0x143, 0x157, 0x16b, 0x181, 0x198, 0x1b0,
        0x1ca, 0x1e5, 0x202, 0x220, 0x241, 0x263, 0x287, 0x2ae,
        0x16b, 0x181, 0x198, 0x1b0, 0x1ca, 0x1e5, 0x202, 0x220,
        0x241, 0x263, 0x287, 0x2ae, 0x16b, 0x181, 0x198, 0x1b0,
        0x1ca, 0x1e5, 0x202, 0x220, 0x241, 0x263, 0x287, 0x2ae,
        0x16b, 0x181, 0x198, 0x1b0, 0x1ca, 0x1e5, 0x202, 0x220,
        0x241, 0x263, 0x287, 0x2ae, 0x16b, 0x181, 0x198, 0x1b0,
        0x1ca, 0x1e5, 0x202, 0x220, 0x241, 0x263, 0x287, 0x2ae,
        0x16b, 0x181, 0x198, 0x1b0, 0x1ca, 0x1e5, 0x202, 0x220,
        0x241, 0x263, 0x287, 0x2ae, 0x16b, 0x181, 0x198, 0x1b0,
        0x1ca, 0x1e5, 0x202, 0x220, 0x241, 0x263, 0x287, 0x2ae,
        0x16b, 0x181, 0x198, 0x1b0, 0x1ca, 0x1e5, 0x202, 0x220,
        0x241, 0x263, 0x287, 0x2ae,
    ]
);

pub static NOTE_BLOCK: [u8; 128] = pad_128!(
    u8,
    [
        0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0,
        1, 1, 1, 1, 1, 1, 1, 1,
        1, 1, 1, 1, 2, 2, 2, 2,
        2, 2, 2, 2, 2, 2, 2, 2,
        3, 3, 3, 3, 3, 3, 3, 3,
        3, 3, 3, 3, 4, 4, 4, 4,
        4, 4, 4, 4, 4, 4, 4, 4,
        5, 5, 5, 5, 5, 5, 5, 5,
        5, 5, 5, 5, 6, 6, 6, 6,
        6, 6, 6, 6, 6, 6, 6, 6,
        7, 7, 7, 7, 7, 7, 7, 7,
        7, 7, 7, 7, 8, 8, 8, 8,
        8, 8, 8, 8, 8, 8, 8, 8,
    ]
);

/// F-number change per unit of pitch bend.
pub static PITCHBEND_SCALE: [u8; 128] = pad_128!(
    u8,
    [
        3, 3, 3, 3, 4, 4, 4, 4,
        4, 5, 5, 5, 3, 3, 3, 3,
        4, 4, 4, 4, 4, 5, 5, 5,
        3, 3, 3, 3, 4, 4, 4, 4,
        4, 5, 5, 5, 3, 3, 3, 3,
        4, 4, 4, 4, 4, 5, 5, 5,
        3, 3, 3, 3, 4, 4, 4, 4,
        4, 5, 5, 5, 3, 3, 3, 3,
        4, 4, 4, 4, 4, 5, 5, 5,
        3, 3, 3, 3, 4, 4, 4, 4,
        4, 5, 5, 5, 3, 3, 3, 3,
        4, 4, 4, 4, 4, 5, 5, 5,
        3, 3, 3, 3, 4, 4, 4, 4,
        4, 5, 5, 5,
    ]
);

/// Lowest note of the percussion track that maps to a sound.
pub const PERCUSSION_BASE_NOTE: u8 = 34;

/// Sound played for a note on the percussion track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercussionNote {
    /// Index into [`PERCUSSION_PATCHES`].
    pub patch: u8,
    /// Note actually played, before the usual decrement.
    pub note: u8,
    /// Velocity scale, carried in the table but not applied.
    pub velocity: u8,
}

const fn perc(patch: u8, note: u8, velocity: u8) -> Option<PercussionNote> {
    Some(PercussionNote {
        patch,
        note,
        velocity,
    })
}

/// Percussion sounds indexed by note minus [`PERCUSSION_BASE_NOTE`].
/// Only the first 31 entries are reachable. Entry 23 has no sound.
pub static PERCUSSION_NOTES: [Option<PercussionNote>; 32] = [
    perc(3, 0x15, 0x64),
    perc(3, 0x17, 0x64),
    perc(5, 0x31, 0x64),
    perc(10, 0x1c, 0x55),
    perc(6, 0x28, 0x4d),
    perc(9, 0x18, 0x55),
    perc(4, 0x1c, 0x64),
    perc(7, 0x52, 0x4d),
    perc(4, 0x1f, 0x64),
    perc(7, 0x52, 0x4d),
    perc(12, 0x21, 0x64),
    perc(8, 0x52, 0x4d),
    perc(12, 0x25, 0x64),
    perc(12, 0x28, 0x64),
    perc(0, 0x3e, 0x64),
    perc(12, 0x2c, 0x50),
    perc(1, 0x3e, 0x4d),
    perc(0, 0x3e, 0x64),
    perc(1, 0x3f, 0x4d),
    perc(2, 0x3e, 0x4d),
    perc(0, 0x41, 0x64),
    perc(11, 0x0c, 0x4d),
    perc(0, 0x3e, 0x64),
    None,
    perc(1, 0x3f, 0x4d),
    perc(13, 0x43, 0x55),
    perc(13, 0x3d, 0x55),
    perc(14, 0x3e, 0x64),
    perc(15, 0x31, 0x64),
    perc(15, 0x2c, 0x55),
    perc(16, 0x36, 0x4d),
    perc(16, 0x31, 0x4d),
];

pub static PERCUSSION_PATCHES: [Patch; 17] = [
    Patch::from_raw([0x0f, 0x42, 0x3f, 0x3f, 0xfa, 0xfa, 0x41, 0x44, 0x02, 0x03, 0x0f]),
    Patch::from_raw([0x0f, 0x02, 0x3f, 0x3f, 0xfa, 0xfa, 0x51, 0x44, 0x02, 0x03, 0x0f]),
    Patch::from_raw([0x0f, 0x04, 0x3f, 0x3f, 0xe7, 0xdc, 0x51, 0x46, 0x02, 0x00, 0x0f]),
    Patch::from_raw([0x10, 0x00, 0x3e, 0x3f, 0xf8, 0xd5, 0xff, 0xff, 0x00, 0x00, 0x09]),
    Patch::from_raw([0x10, 0x01, 0x32, 0x3f, 0xf8, 0xd5, 0x96, 0x86, 0x00, 0x00, 0x0d]),
    Patch::from_raw([0x11, 0x10, 0x3f, 0x3f, 0x8f, 0xc8, 0xb4, 0x4a, 0x03, 0x00, 0x0d]),
    Patch::from_raw([0x08, 0x0f, 0x3f, 0x3f, 0xf1, 0xf7, 0xff, 0xff, 0x00, 0x00, 0x0f]),
    Patch::from_raw([0x0f, 0x02, 0x3f, 0x3f, 0xea, 0xda, 0x51, 0x46, 0x00, 0x03, 0x0f]),
    Patch::from_raw([0x0f, 0x02, 0x3f, 0x3f, 0xea, 0xda, 0x51, 0x44, 0x00, 0x03, 0x0f]),
    Patch::from_raw([0x02, 0x00, 0x3c, 0x3f, 0xf5, 0xf8, 0x15, 0x47, 0x00, 0x00, 0x0f]),
    Patch::from_raw([0x02, 0x01, 0x39, 0x3f, 0xf5, 0xf8, 0x10, 0x46, 0x00, 0x00, 0x0f]),
    Patch::from_raw([0x28, 0x2f, 0x3f, 0x3f, 0xfa, 0xf8, 0xf7, 0xf4, 0x00, 0x00, 0x0f]),
    Patch::from_raw([0x10, 0x01, 0x32, 0x3f, 0xf8, 0xd5, 0x96, 0x86, 0x00, 0x00, 0x0f]),
    Patch::from_raw([0x10, 0x00, 0x3f, 0x3f, 0xe9, 0xd7, 0xd4, 0xc5, 0x03, 0x00, 0x07]),
    Patch::from_raw([0x10, 0x10, 0x32, 0x3f, 0xf8, 0xd7, 0x96, 0x86, 0x00, 0x00, 0x0f]),
    Patch::from_raw([0x10, 0x10, 0x32, 0x3f, 0xf8, 0xd4, 0x96, 0x86, 0x00, 0x00, 0x0f]),
    Patch::from_raw([0x00, 0x10, 0x32, 0x3f, 0xf8, 0xd4, 0x96, 0x86, 0x02, 0x00, 0x0f]),
];

/// Modulator and carrier register offsets of a synthesizer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorPair {
    pub modulator: u8,
    pub carrier: u8,
}

const fn ops(modulator: u8, carrier: u8) -> OperatorPair {
    OperatorPair { modulator, carrier }
}

pub static CHANNEL_OPERATORS: [OperatorPair; NUM_VOICES] = [
    ops(0x00, 0x03),
    ops(0x01, 0x04),
    ops(0x02, 0x05),
    ops(0x08, 0x0b),
    ops(0x09, 0x0c),
    ops(0x0a, 0x0d),
    ops(0x10, 0x13),
    ops(0x11, 0x14),
    ops(0x12, 0x15),
];

#[cfg(test)]
#[path = "./tables_test.rs"]
mod tables_test;
