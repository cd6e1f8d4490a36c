use core::array::from_fn;
use std::f64::consts::PI;

pub(super) const TREMOLO_TABLE_SIZE: usize = 52;

pub(super) const WAVE_BITS: u32 = 10;
pub(super) const WAVE_SH: u32 = 32 - WAVE_BITS;

pub(super) const LFO_SH: u32 = WAVE_SH - 10;
pub(super) const LFO_MAX: u32 = 256 << LFO_SH;

pub(super) const ENV_BITS: i32 = 9;
pub(super) const ENV_MIN: i32 = 0;
pub(super) const ENV_EXTRA: i32 = ENV_BITS - 9;
pub(super) const ENV_MAX: i32 = 511 << ENV_EXTRA;
pub(super) const ENV_LIMIT: i32 = (12 * 256) >> (3 - ENV_EXTRA);

pub(super) const RATE_SH: u32 = 24;
pub(super) const RATE_MASK: u32 = (1 << RATE_SH) - 1;

//multiplication table entries are scaled by this
pub(super) const MUL_SH: u32 = 16;
const MUL_TABLE_SIZE: usize = 384;

pub(super) const SHIFT_KSLBASE: u32 = 16;
pub(super) const SHIFT_KEYCODE: u32 = 24;

//key scale attenuation per F-number nibble, subtracted from block * 8
static KSL_CREATE_TABLE: [u8; 16] = [
    64, 32, 24, 19, 16, 12, 11, 10, 8, 6, 5, 4, 3, 2, 1, 0,
];

static FREQ_CREATE_TABLE: [u8; 16] = [1, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 20, 24, 24, 30, 30];
static ATTACK_SAMPLES_TABLE: [u8; 13] = [69, 55, 46, 40, 35, 29, 23, 20, 19, 15, 11, 10, 9];
static ENVELOPE_INCREASE_TABLE: [u8; 13] = [4, 5, 6, 7, 8, 10, 12, 14, 16, 20, 24, 28, 32];

//start of each waveform inside the wave table
pub(super) static WAVE_BASE_TABLE: [usize; 8] = [0x000, 0x200, 0x200, 0x800, 0xa00, 0xc00, 0x100, 0x400];

//phase mask per waveform
pub(super) static WAVE_MASK_TABLE: [u16; 8] = [1023, 1023, 511, 511, 1023, 1023, 512, 1023];

//phase offset applied on key-on
pub(super) static WAVE_START_TABLE: [u16; 8] = [512, 0, 0, 0, 0, 512, 512, 256];

//low 3 bits: vibrato shift, sign bit: negate (7 yields 3, 7, 3, 0, -3, -7, -3, 0)
pub(super) static VIBRATO_TABLE: [i8; 8] = [1, 0, 1, 30, -127, -128, -127, -98];

pub(super) static KSL_SHIFT_TABLE: [u8; 4] = [31, 1, 2, 0];

/// Channel and operator slot addressed by an operator register offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct OpOffset {
    pub chan: usize,
    pub op: usize,
}

/// Lookup tables of one chip. Everything that depends on the output
/// rate is computed in [`Tables::new`].
pub(super) struct Tables {
    pub op_offset_table: [Option<OpOffset>; 32],
    pub tremolo_table: [u8; TREMOLO_TABLE_SIZE],

    //phase increment per multiplier setting
    pub freq_mul: [u32; 16],
    //decay and release increments at the output rate
    pub linear_rates: [u32; 76],
    //attack increments fitted to the output rate
    pub attack_rates: [u32; 76],

    //eight waveforms in overlapping 512 entry windows, see WAVE_BASE_TABLE
    pub wave_table: [i16; 8 * 512],
    pub mul_table: [u16; MUL_TABLE_SIZE],
    pub ksl_table: [u8; 8 * 16],
}

impl Tables {
    pub fn new(scale: f64) -> Tables {
        Tables {
            op_offset_table: op_offsets(),
            tremolo_table: tremolo_table(),
            freq_mul: freq_mul_table(scale),
            linear_rates: linear_rate_table(scale),
            attack_rates: attack_rate_table(scale),
            wave_table: wave_table(),
            mul_table: mul_table(),
            ksl_table: ksl_table(),
        }
    }
}

fn wave_table() -> [i16; 8 * 512] {
    let mut table = [0; 8 * 512];
    //sine, negative half first
    for i in 0..512 {
        table[0x0200 + i] = (((i as f64 + 0.5) * (PI / 512.0)).sin() * 4084.0) as i16;
        table[i] = -table[0x0200 + i];
    }
    //exponential wave
    for i in 0..256 {
        table[0x0700 + i] = (0.5
            + (2.0f64).powf(-1.0 + (255.0 - i as f64 * 8.0) * (1.0 / 256.0)) * 4085.0)
            as i16;
        table[0x6ff - i] = -table[0x0700 + i];
    }
    for i in 0..256 {
        //silent halves
        table[0x400 + i] = table[0];
        table[0x500 + i] = table[0];
        table[0x900 + i] = table[0];
        table[0xc00 + i] = table[0];
        table[0xd00 + i] = table[0];
        table[0x800 + i] = table[0x200 + i];
        //double frequency sines
        table[0xa00 + i] = table[0x200 + i * 2];
        table[0xb00 + i] = table[i * 2];
        table[0xe00 + i] = table[0x200 + i * 2];
        table[0xf00 + i] = table[0x200 + i * 2];
    }
    table
}

fn mul_table() -> [u16; MUL_TABLE_SIZE] {
    from_fn(|i| {
        let s = (i * 8) as f64;
        (0.5 + (2.0f64).powf(-1.0 + (255.0 - s) * (1.0 / 256.0)) * (1u32 << MUL_SH) as f64) as u16
    })
}

fn ksl_table() -> [u8; 8 * 16] {
    let mut table = [0; 8 * 16];
    for oct in 0..8 {
        let base = oct * 8;
        for i in 0..16 {
            let val = (base - KSL_CREATE_TABLE[i] as i32).max(0);
            //scaled to envelope units
            table[oct as usize * 16 + i] = (val * 4) as u8;
        }
    }
    table
}

fn freq_mul_table(scale: f64) -> [u32; 16] {
    //FREQ_CREATE_TABLE holds doubled multipliers
    let freq_scale = (0.5 + scale * (1 << (WAVE_SH - 1 - 10)) as f64) as u32;
    from_fn(|i| freq_scale * FREQ_CREATE_TABLE[i] as u32)
}

fn linear_rate_table(scale: f64) -> [u32; 76] {
    //an envelope step spans 8 samples
    from_fn(|i| {
        let (ix, shift_select) = envelope_select(i as u8);
        let shift = RATE_SH + ENV_EXTRA as u32 - shift_select as u32 - 3;
        (scale * ((ENVELOPE_INCREASE_TABLE[ix as usize] as u32) << shift) as f64) as u32
    })
}

//Searches the attack increment whose curve length matches the hardware.
fn attack_rate_table(scale: f64) -> [u32; 76] {
    let mut rates = [0; 76];
    for i in 0..62u8 {
        let (ix, shift_select) = envelope_select(i);
        //attack length on the real chip, in output samples
        let target = ((((ATTACK_SAMPLES_TABLE[ix as usize] as u32) << shift_select) as f64
            / scale) as i32)
            .max(1);

        let mut guess = (scale
            * ((ENVELOPE_INCREASE_TABLE[ix as usize] as u32) << (RATE_SH - shift_select as u32 - 3))
                as f64) as u32;
        let mut best = guess;
        let mut best_diff = 1u32 << 30;

        for _ in 0..16 {
            let mut volume = ENV_MAX;
            let mut samples = 0;
            let mut count = 0u32;
            while volume > 0 && samples < target * 2 {
                count = count.wrapping_add(guess);
                let change = (count >> RATE_SH) as i32;
                count &= RATE_MASK;
                if change != 0 {
                    volume += (!volume * change) >> 3;
                }
                samples += 1;
            }
            let diff = target - samples;
            let abs_diff = diff.unsigned_abs();
            if abs_diff < best_diff {
                best_diff = abs_diff;
                best = guess;
                if best_diff == 0 {
                    break;
                }
            }
            //scale the guess by the length error
            let correct = (target - diff) as f64 / target as f64;
            guess = (guess as f64 * correct) as u32;
            if diff < 0 {
                guess += 1;
            }
        }
        rates[i as usize] = best;
    }
    for rate in rates.iter_mut().skip(62) {
        //rates 15.x attack immediately
        *rate = 8 << RATE_SH;
    }
    rates
}

// triangle wave
fn tremolo_table() -> [u8; TREMOLO_TABLE_SIZE] {
    let mut table = [0; TREMOLO_TABLE_SIZE];
    for i in 0..(TREMOLO_TABLE_SIZE / 2) {
        let val = (i << ENV_EXTRA) as u8;
        table[i] = val;
        table[TREMOLO_TABLE_SIZE - 1 - i] = val;
    }
    table
}

// Operator registers are laid out in groups of 8, of which the first 6 are
// used: 3 modulators followed by 3 carriers of three adjacent channels.
fn op_offsets() -> [Option<OpOffset>; 32] {
    from_fn(|i| {
        if i % 8 >= 6 || i / 8 == 3 {
            return None;
        }
        Some(OpOffset {
            chan: (i / 8) * 3 + (i % 8) % 3,
            op: (i % 8) / 3,
        })
    })
}

pub(super) fn envelope_select(val: u8) -> (u8, u8) {
    if val < 13 * 4 {
        // rate 0 - 12
        (val & 3, 12 - (val >> 2))
    } else if val < 15 * 4 {
        // rate 13 - 14
        (val - 12 * 4, 0)
    } else {
        (12, 0)
    }
}
