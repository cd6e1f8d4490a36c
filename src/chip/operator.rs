use super::tables::{
    ENV_BITS, ENV_EXTRA, ENV_LIMIT, ENV_MAX, ENV_MIN, KSL_SHIFT_TABLE, MUL_SH, RATE_MASK, RATE_SH,
    SHIFT_KEYCODE, SHIFT_KSLBASE, Tables, WAVE_BASE_TABLE, WAVE_MASK_TABLE, WAVE_SH,
    WAVE_START_TABLE,
};

const MASK_KSR: u8 = 0x10;
const MASK_SUSTAIN: u8 = 0x20;
const MASK_VIBRATO: u8 = 0x40;

#[repr(u8)]
#[derive(PartialEq, Debug, Copy, Clone)]
pub(super) enum EnvelopeState {
    Off,
    Release,
    Sustain,
    Decay,
    Attack,
}

impl EnvelopeState {
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// LFO values shared by all operators for one block of samples.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Lfo {
    pub tremolo_value: u8,
    pub vibrato_shift: u8,
    pub vibrato_sign: i8,
}

pub(super) struct Operator {
    wave_base: usize,
    wave_mask: u32,
    wave_start: u32,
    wave_add: u32,
    wave_index: u32,
    wave_current: u32,

    pub(super) chan_data: u32,
    freq_mul: u32,
    vibrato: u32,
    sustain_level: i32,
    total_level: i32,
    current_level: i32,
    volume: i32,

    attack_add: u32,
    decay_add: u32,
    release_add: u32,
    rate_index: u32,

    rate_zero: u8,
    key_on: u8,
    //raw register values, diffed on write
    reg_20: u8,
    reg_40: u8,
    reg_60: u8,
    reg_80: u8,
    reg_e0: u8,
    state: EnvelopeState,
    tremolo_mask: u8,
    vib_strength: u8,
    ksr: u8,
}

impl Operator {
    pub fn new() -> Operator {
        Operator {
            wave_base: WAVE_BASE_TABLE[0],
            wave_mask: WAVE_MASK_TABLE[0] as u32,
            wave_start: (WAVE_START_TABLE[0] as u32) << WAVE_SH,
            wave_add: 0,
            wave_index: 0,
            wave_current: 0,

            chan_data: 0,
            freq_mul: 0,
            vibrato: 0,
            sustain_level: ENV_MAX,
            total_level: ENV_MAX,
            current_level: ENV_MAX,
            volume: ENV_MAX,

            attack_add: 0,
            decay_add: 0,
            release_add: 0,
            rate_index: 0,

            rate_zero: EnvelopeState::Off.bit(),
            key_on: 0,
            reg_20: 0,
            reg_40: 0,
            reg_60: 0,
            reg_80: 0,
            reg_e0: 0,
            state: EnvelopeState::Off,
            tremolo_mask: 0,
            vib_strength: 0,
            ksr: 0,
        }
    }

    pub fn write_20(&mut self, tables: &Tables, val: u8) {
        let change = self.reg_20 ^ val;
        if change == 0 {
            return;
        }
        self.reg_20 = val;
        //shift the tremolo bit over the entire register
        self.tremolo_mask = ((val as i8) >> 7) as u8;
        self.tremolo_mask &= !((1 << ENV_EXTRA) - 1);
        if (change & MASK_KSR) != 0 {
            self.update_rates(tables);
        }
        //sustaining operators hold their level
        if (self.reg_20 & MASK_SUSTAIN) != 0 || self.release_add == 0 {
            self.rate_zero |= EnvelopeState::Sustain.bit();
        } else {
            self.rate_zero &= !EnvelopeState::Sustain.bit();
        }
        //multiplier or vibrato bit
        if (change & (0xf | MASK_VIBRATO)) != 0 {
            self.freq_mul = tables.freq_mul[(val & 0xf) as usize];
            self.update_frequency();
        }
    }

    pub fn write_40(&mut self, val: u8) {
        if (self.reg_40 ^ val) == 0 {
            return;
        }
        self.reg_40 = val;
        self.update_attenuation();
    }

    pub fn write_60(&mut self, tables: &Tables, val: u8) {
        let change = self.reg_60 ^ val;
        self.reg_60 = val;
        if (change & 0x0f) != 0 {
            self.update_decay(tables);
        }
        if (change & 0xf0) != 0 {
            self.update_attack(tables);
        }
    }

    pub fn write_80(&mut self, tables: &Tables, val: u8) {
        let change = self.reg_80 ^ val;
        if change == 0 {
            return;
        }
        self.reg_80 = val;
        let mut sustain = val >> 4;
        //turn 0xf into 0x1f
        sustain |= (sustain + 1) & 0x10;
        self.sustain_level = (sustain as i32) << (ENV_BITS - 5);
        if (change & 0x0f) != 0 {
            self.update_release(tables);
        }
    }

    pub fn write_e0(&mut self, wave_form_mask: u8, val: u8) {
        if (self.reg_e0 ^ val) == 0 {
            return;
        }
        let wave_form = (val & (0x03 & wave_form_mask)) as usize;
        self.reg_e0 = val;
        self.wave_base = WAVE_BASE_TABLE[wave_form];
        self.wave_start = (WAVE_START_TABLE[wave_form] as u32) << WAVE_SH;
        self.wave_mask = WAVE_MASK_TABLE[wave_form] as u32;
    }

    pub fn update_attenuation(&mut self) {
        let ksl_base = ((self.chan_data >> SHIFT_KSLBASE) & 0xff) as i32;
        let tl = (self.reg_40 & 0x3f) as i32;
        let ksl_shift = KSL_SHIFT_TABLE[(self.reg_40 >> 6) as usize];

        //total level goes 2 bits below max
        self.total_level = tl << (ENV_BITS - 7);
        self.total_level += (ksl_base << ENV_EXTRA) >> ksl_shift;
    }

    pub fn update_frequency(&mut self) {
        let freq = self.chan_data & ((1 << 10) - 1);
        let block = (self.chan_data >> 10) & 0xff;

        self.wave_add = (freq << block).wrapping_mul(self.freq_mul);
        if (self.reg_20 & MASK_VIBRATO) != 0 {
            self.vib_strength = (freq >> 7) as u8;
            self.vibrato = ((self.vib_strength as u32) << block).wrapping_mul(self.freq_mul);
        } else {
            self.vib_strength = 0;
            self.vibrato = 0;
        }
    }

    pub fn update_rates(&mut self, tables: &Tables) {
        let mut new_ksr = ((self.chan_data >> SHIFT_KEYCODE) & 0xff) as u8;
        if (self.reg_20 & MASK_KSR) == 0 {
            new_ksr >>= 2;
        }
        if self.ksr == new_ksr {
            return;
        }
        self.ksr = new_ksr;
        self.update_attack(tables);
        self.update_decay(tables);
        self.update_release(tables);
    }

    fn update_attack(&mut self, tables: &Tables) {
        let rate = self.reg_60 >> 4;
        if rate != 0 {
            let val = (rate << 2) + self.ksr;
            self.attack_add = tables.attack_rates[val as usize];
            self.rate_zero &= !EnvelopeState::Attack.bit();
        } else {
            self.attack_add = 0;
            self.rate_zero |= EnvelopeState::Attack.bit();
        }
    }

    fn update_decay(&mut self, tables: &Tables) {
        let rate = self.reg_60 & 0x0f;
        if rate != 0 {
            let val = (rate << 2) + self.ksr;
            self.decay_add = tables.linear_rates[val as usize];
            self.rate_zero &= !EnvelopeState::Decay.bit();
        } else {
            self.decay_add = 0;
            self.rate_zero |= EnvelopeState::Decay.bit();
        }
    }

    fn update_release(&mut self, tables: &Tables) {
        let rate = self.reg_80 & 0x0f;
        if rate != 0 {
            let val = (rate << 2) + self.ksr;
            self.release_add = tables.linear_rates[val as usize];
            self.rate_zero &= !EnvelopeState::Release.bit();
            if (self.reg_20 & MASK_SUSTAIN) == 0 {
                self.rate_zero &= !EnvelopeState::Sustain.bit();
            }
        } else {
            self.rate_zero |= EnvelopeState::Release.bit();
            self.release_add = 0;
            if (self.reg_20 & MASK_SUSTAIN) == 0 {
                self.rate_zero |= EnvelopeState::Sustain.bit();
            }
        }
    }

    pub fn key_on(&mut self, mask: u8) {
        if self.key_on == 0 {
            //restart the frequency generator
            self.wave_index = self.wave_start;
            self.rate_index = 0;
            self.state = EnvelopeState::Attack;
        }
        self.key_on |= mask;
    }

    pub fn key_off(&mut self, mask: u8) {
        self.key_on &= !mask;
        if self.key_on == 0 && self.state != EnvelopeState::Off {
            self.state = EnvelopeState::Release;
        }
    }

    pub fn silent(&self) -> bool {
        if self.total_level + self.volume < ENV_LIMIT {
            return false;
        }
        (self.rate_zero & self.state.bit()) != 0
    }

    pub fn prepare(&mut self, lfo: &Lfo) {
        self.current_level = self.total_level + (lfo.tremolo_value & self.tremolo_mask) as i32;
        self.wave_current = self.wave_add;
        if ((self.vib_strength as u32) >> lfo.vibrato_shift) != 0 {
            let mut add = (self.vibrato >> lfo.vibrato_shift) as i32;
            //sign extend over the shift value
            let neg = lfo.vibrato_sign as i32;
            //negate the add with -1 or 0
            add = (add ^ neg) - neg;
            self.wave_current = self.wave_current.wrapping_add(add as u32);
        }
    }

    pub fn get_sample(&mut self, tables: &Tables, modulation: i32) -> i32 {
        let vol = self.current_level + self.forward_envelope();
        if vol >= ENV_LIMIT {
            //simply forward the wave
            self.wave_index = self.wave_index.wrapping_add(self.wave_current);
            return 0;
        }
        self.wave_index = self.wave_index.wrapping_add(self.wave_current);
        let index = (self.wave_index >> WAVE_SH).wrapping_add(modulation as u32);
        let wave = tables.wave_table[self.wave_base + (index & self.wave_mask) as usize] as i32;
        (wave * tables.mul_table[(vol >> ENV_EXTRA) as usize] as i32) >> MUL_SH
    }

    fn rate_forward(&mut self, add: u32) -> i32 {
        self.rate_index = self.rate_index.wrapping_add(add);
        let ret = (self.rate_index >> RATE_SH) as i32;
        self.rate_index &= RATE_MASK;
        ret
    }

    // Advances the envelope by one sample and returns the attenuation.
    fn forward_envelope(&mut self) -> i32 {
        let mut vol = self.volume;
        match self.state {
            EnvelopeState::Off => return ENV_MAX,
            EnvelopeState::Attack => {
                let change = self.rate_forward(self.attack_add);
                if change == 0 {
                    return vol;
                }
                vol += ((!vol) * change) >> 3;
                if vol < ENV_MIN {
                    self.volume = ENV_MIN;
                    self.rate_index = 0;
                    self.state = EnvelopeState::Decay;
                    return ENV_MIN;
                }
            }
            EnvelopeState::Decay => {
                vol += self.rate_forward(self.decay_add);
                if vol >= self.sustain_level {
                    //check if we didn't overshoot max attenuation, then just go off
                    if vol >= ENV_MAX {
                        self.volume = ENV_MAX;
                        self.state = EnvelopeState::Off;
                        return ENV_MAX;
                    }
                    //continue as sustain
                    self.rate_index = 0;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain | EnvelopeState::Release => {
                if self.state == EnvelopeState::Sustain && (self.reg_20 & MASK_SUSTAIN) != 0 {
                    return vol;
                }
                //in sustain phase, but not sustaining, do regular release
                vol += self.rate_forward(self.release_add);
                if vol >= ENV_MAX {
                    self.volume = ENV_MAX;
                    self.state = EnvelopeState::Off;
                    return ENV_MAX;
                }
            }
        }
        self.volume = vol;
        vol
    }
}
