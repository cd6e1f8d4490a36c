use super::operator::{Lfo, Operator};
use super::tables::{SHIFT_KEYCODE, SHIFT_KSLBASE, Tables};

#[derive(Debug, PartialEq, Clone, Copy)]
pub(super) enum SynthMode {
    /// Operator 0 modulates operator 1.
    Fm,
    /// Both operators are added together.
    Am,
}

pub(super) struct Channel {
    operator: [Operator; 2],
    mode: SynthMode,
    chan_data: u32, //block, F-number, key code and KSL base
    old: [i32; 2],  //last two modulator outputs

    feedback: u8,
    reg_b0: u8,
    reg_c0: u8,
}

impl Channel {
    pub fn new() -> Channel {
        Channel {
            operator: [Operator::new(), Operator::new()],
            mode: SynthMode::Fm,
            chan_data: 0,
            old: [0, 0],
            feedback: 31,
            reg_b0: 0,
            reg_c0: 0,
        }
    }

    pub fn op(&mut self, ix: usize) -> &mut Operator {
        &mut self.operator[ix]
    }

    pub fn write_a0(&mut self, tables: &Tables, reg_08: u8, val: u8) {
        let change = (self.chan_data ^ val as u32) & 0xff;
        if change != 0 {
            self.chan_data ^= change;
            self.update_frequency(tables, reg_08);
        }
    }

    pub fn write_b0(&mut self, tables: &Tables, reg_08: u8, val: u8) {
        let change = (self.chan_data ^ ((val as u32) << 8)) & 0x1f00;
        if change != 0 {
            self.chan_data ^= change;
            self.update_frequency(tables, reg_08);
        }

        //key on edge
        if ((val ^ self.reg_b0) & 0x20) == 0 {
            return;
        }
        self.reg_b0 = val;
        if (val & 0x20) != 0 {
            self.operator[0].key_on(0x1);
            self.operator[1].key_on(0x1);
        } else {
            self.operator[0].key_off(0x1);
            self.operator[1].key_off(0x1);
        }
    }

    pub fn write_c0(&mut self, val: u8) {
        if (val ^ self.reg_c0) == 0 {
            return;
        }
        self.reg_c0 = val;
        self.feedback = (val >> 1) & 7;
        if self.feedback != 0 {
            //we shift the input to the right 10 bit wave index value
            self.feedback = 9 - self.feedback;
        } else {
            self.feedback = 31;
        }
        self.mode = if (val & 1) != 0 {
            SynthMode::Am
        } else {
            SynthMode::Fm
        };
    }

    pub fn update_frequency(&mut self, tables: &Tables, reg_08: u8) {
        //key code from block and the top F-number bit
        let mut data = self.chan_data & 0xffff;
        let ksl_base = tables.ksl_table[(data >> 6) as usize];
        let mut key_code = (data & 0x1c00) >> 9;
        if (reg_08 & 0x40) != 0 {
            //notesel == 1
            key_code |= (data & 0x100) >> 8;
        } else {
            //notesel == 0
            key_code |= (data & 0x200) >> 9;
        }
        //add the keycode and ksl into the highest bits of chan_data
        data |= (key_code << SHIFT_KEYCODE) | ((ksl_base as u32) << SHIFT_KSLBASE);
        self.set_chan_data(tables, data);
    }

    fn set_chan_data(&mut self, tables: &Tables, data: u32) {
        let change = self.chan_data ^ data;
        self.chan_data = data;
        for op in self.operator.iter_mut() {
            op.chan_data = data;
            //the frequency changed, operators need new increments
            op.update_frequency();
            if (change & (0xff << SHIFT_KSLBASE)) != 0 {
                op.update_attenuation();
            }
            if (change & (0xff << SHIFT_KEYCODE)) != 0 {
                op.update_rates(tables);
            }
        }
    }

    /// Adds `output.len()` samples of this channel to `output`.
    pub fn block(&mut self, tables: &Tables, lfo: &Lfo, output: &mut [i32]) {
        let silent = match self.mode {
            SynthMode::Am => self.operator[0].silent() && self.operator[1].silent(),
            SynthMode::Fm => self.operator[1].silent(),
        };
        if silent {
            self.old = [0, 0];
            return;
        }

        self.operator[0].prepare(lfo);
        self.operator[1].prepare(lfo);

        for out in output.iter_mut() {
            let modulation = ((self.old[0].wrapping_add(self.old[1])) as u32 >> self.feedback) as i32;
            self.old[0] = self.old[1];
            self.old[1] = self.operator[0].get_sample(tables, modulation);
            let out0 = self.old[0];
            let sample = match self.mode {
                SynthMode::Fm => self.operator[1].get_sample(tables, out0),
                SynthMode::Am => out0 + self.operator[1].get_sample(tables, 0),
            };
            *out += sample;
        }
    }
}
