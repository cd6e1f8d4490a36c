//! Software OPL2 emulator in the DOSBox DBOPL tradition.
//!
//! Only the two-operator melodic mode is emulated. Rhythm mode and the
//! OPL3 register bank accept writes and ignore them.

mod channel;
mod operator;
mod tables;

use core::array::from_fn;

use channel::Channel;
use operator::{Lfo, Operator};
use tables::{LFO_MAX, LFO_SH, TREMOLO_TABLE_SIZE, Tables, VIBRATO_TABLE};

use crate::Synth;

const OPL_RATE: f64 = 14318180.0 / 288.0;

const NUM_CHANNELS: usize = 9;

//frames generated per call into the mixing buffer
const RENDER_CHUNK: usize = 512;

pub struct Chip {
    channels: [Channel; NUM_CHANNELS],

    //shared counter of the vibrato and tremolo LFO
    lfo_counter: u32,
    lfo_add: u32,
    lfo: Lfo,

    reg_08: u8,
    reg_bd: u8,
    vibrato_index: u8,
    tremolo_index: u8,
    vibrato_strength: u8,
    tremolo_strength: u8,

    wave_form_mask: u8,

    tables: Tables,
    mix_buffer: Vec<i32>,
}

struct ChipValues {
    wave_form_mask: u8,
}

type OperatorWrite = fn(op: &mut Operator, tables: &Tables, chip: &ChipValues, val: u8);

impl Chip {
    pub fn new(rate: u32) -> Chip {
        let scale = OPL_RATE / rate.max(1) as f64;
        let mut chip = Chip {
            channels: from_fn(|_| Channel::new()),
            lfo_counter: 0,
            lfo_add: (0.5 + scale * (1 << LFO_SH) as f64) as u32,
            lfo: Lfo::default(),
            reg_08: 0,
            reg_bd: 0,
            vibrato_index: 0,
            tremolo_index: 0,
            vibrato_strength: 0,
            tremolo_strength: 0,
            wave_form_mask: 0,
            tables: Tables::new(scale),
            mix_buffer: vec![0; RENDER_CHUNK],
        };
        chip.setup();
        chip
    }

    /// Puts every register through a full 0xff/0x00 cycle so all operators
    /// end up released and silent.
    pub fn setup(&mut self) {
        for reg in 0..=0xff {
            self.write_reg(reg, 0xff);
            self.write_reg(reg, 0x0);
        }
    }

    pub fn write_reg(&mut self, reg: u32, val: u8) {
        if reg > 0xff {
            return;
        }
        match reg & 0xf0 {
            0x00 => match reg {
                0x01 => self.wave_form_mask = if (val & 0x20) != 0 { 0x3 } else { 0x0 },
                0x08 => self.reg_08 = val,
                _ => {}
            },
            0x20 | 0x30 => self.regop_write(reg, val, |op, tables, _, val| op.write_20(tables, val)),
            0x40 | 0x50 => self.regop_write(reg, val, |op, _, _, val| op.write_40(val)),
            0x60 | 0x70 => self.regop_write(reg, val, |op, tables, _, val| op.write_60(tables, val)),
            0x80 | 0x90 => self.regop_write(reg, val, |op, tables, _, val| op.write_80(tables, val)),
            0xa0 => {
                if let Some(chan) = self.channels.get_mut((reg & 0xf) as usize) {
                    chan.write_a0(&self.tables, self.reg_08, val);
                }
            }
            0xb0 => {
                if reg == 0xbd {
                    self.write_bd(val);
                } else if let Some(chan) = self.channels.get_mut((reg & 0xf) as usize) {
                    chan.write_b0(&self.tables, self.reg_08, val);
                }
            }
            0xc0 => {
                if let Some(chan) = self.channels.get_mut((reg & 0xf) as usize) {
                    chan.write_c0(val);
                }
            }
            0xe0 | 0xf0 => self.regop_write(reg, val, |op, _, chip, val| {
                op.write_e0(chip.wave_form_mask, val)
            }),
            _ => {}
        }
    }

    fn write_bd(&mut self, val: u8) {
        if (self.reg_bd ^ val) == 0 {
            return;
        }
        self.reg_bd = val;
        self.vibrato_strength = if (val & 0x40) != 0 { 0x00 } else { 0x01 };
        self.tremolo_strength = if (val & 0x80) != 0 { 0x00 } else { 0x02 };
    }

    fn regop_write(&mut self, reg: u32, val: u8, f: OperatorWrite) {
        let ix = (reg & 0x1f) as usize;
        if let Some(offset) = self.tables.op_offset_table[ix] {
            let op = self.channels[offset.chan].op(offset.op);
            let chip_values = ChipValues {
                wave_form_mask: self.wave_form_mask,
            };
            f(op, &self.tables, &chip_values, val);
        }
    }

    /// Mixes `output.len()` mono samples of all channels into `output`,
    /// overwriting what was there.
    pub fn generate_block_2(&mut self, output: &mut [i32]) {
        output.fill(0);
        let mut offset = 0;
        while offset < output.len() {
            let samples = self.forward_lfo((output.len() - offset) as u32) as usize;
            let block = &mut output[offset..offset + samples];
            for chan in self.channels.iter_mut() {
                chan.block(&self.tables, &self.lfo, block);
            }
            offset += samples;
        }
    }

    fn forward_lfo(&mut self, samples: u32) -> u32 {
        //current vibrato value, runs 4x slower than tremolo
        let vibrato = VIBRATO_TABLE[(self.vibrato_index >> 2) as usize];
        self.lfo.vibrato_sign = vibrato >> 7;
        self.lfo.vibrato_shift = (vibrato & 7) as u8 + self.vibrato_strength;
        self.lfo.tremolo_value =
            self.tables.tremolo_table[self.tremolo_index as usize] >> self.tremolo_strength;

        //samples until the LFO counter wraps
        let todo = LFO_MAX - self.lfo_counter;
        let mut count = todo.div_ceil(self.lfo_add);
        if count > samples {
            count = samples;
            self.lfo_counter += count * self.lfo_add;
        } else {
            self.lfo_counter += count * self.lfo_add;
            self.lfo_counter &= LFO_MAX - 1;
            //8 vibrato positions, each held 4 LFO periods
            self.vibrato_index = (self.vibrato_index + 1) & 31;
            //tremolo walks the triangle table
            if (self.tremolo_index as usize + 1) < TREMOLO_TABLE_SIZE {
                self.tremolo_index += 1;
            } else {
                self.tremolo_index = 0;
            }
        }
        count
    }
}

impl Synth for Chip {
    fn write_reg(&mut self, reg: u32, val: u8) {
        Chip::write_reg(self, reg, val);
    }

    fn render(&mut self, out: &mut [i16]) {
        let mut mix_buffer = std::mem::take(&mut self.mix_buffer);
        for frames in out.chunks_mut(RENDER_CHUNK * 2) {
            let len = frames.len() / 2;
            self.generate_block_2(&mut mix_buffer[..len]);
            for (frame, &sample) in frames.chunks_exact_mut(2).zip(mix_buffer.iter()) {
                let sample = (sample << 1).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
                frame[0] = sample;
                frame[1] = sample;
            }
        }
        self.mix_buffer = mix_buffer;
    }
}
