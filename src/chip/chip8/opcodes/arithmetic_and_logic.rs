use log::debug;
use rand::{thread_rng, Rng};
use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        constants::{
            CHIP8_CHARSET_OFFSET, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH, CHIP8_FLAG_REGISTER,
            CHIP8_GLYPH_LEN,
        },
        opcodes::{
            ExecutableOpcode, InstructionWithAddress, InstructionWithOperands,
            InstructionWithRegAndValue, Opcode,
        },
        util, Chip8,
    },
    ExecutionError,
};

define_instruction_with_reg_and_value!(Ldr, LdrInstruction, 0x6);
impl ExecutableOpcode for LdrInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        state.registers[self.reg as usize] = self.value;
        Ok(())
    }
}

define_instruction_with_reg_and_value!(Add, AddInstruction, 0x7);
impl ExecutableOpcode for AddInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        state.registers[self.reg as usize] =
            state.registers[self.reg as usize].wrapping_add(self.value);
        Ok(())
    }
}

define_instruction_with_operands!(Reg, RegInstruction, 0x8);
impl ExecutableOpcode for RegInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        // The flag is written after the result, so it wins if r1 is 0xF.
        fn modify_registers(
            state: &mut Chip8,
            r1: u8,
            r2: u8,
            f: fn(u8, u8) -> (u8, Option<bool>),
        ) {
            let (val, carry) = f(state.registers[r1 as usize], state.registers[r2 as usize]);
            state.registers[r1 as usize] = val;
            if let Some(carry) = carry {
                state.registers[CHIP8_FLAG_REGISTER] = carry as u8;
            }
        }

        match self.op3 {
            0x0 => modify_registers(state, self.op1, self.op2, |_, v2| (v2, None)),
            0x1 => modify_registers(state, self.op1, self.op2, |v1, v2| (v1 | v2, None)),
            0x2 => modify_registers(state, self.op1, self.op2, |v1, v2| (v1 & v2, None)),
            0x3 => modify_registers(state, self.op1, self.op2, |v1, v2| (v1 ^ v2, None)),
            0x4 => modify_registers(state, self.op1, self.op2, |v1, v2| {
                let (result, overflow) = v1.overflowing_add(v2);
                (result, Some(overflow))
            }),
            0x5 => modify_registers(state, self.op1, self.op2, |v1, v2| {
                let (result, borrow) = v1.overflowing_sub(v2);
                (result, Some(!borrow))
            }),
            0x6 => modify_registers(state, self.op1, self.op2, |v1, _| {
                (v1 >> 1, Some(v1 & 0x01 != 0))
            }),
            0x7 => modify_registers(state, self.op1, self.op2, |v1, v2| {
                let (result, borrow) = v2.overflowing_sub(v1);
                (result, Some(!borrow))
            }),
            0xE => modify_registers(state, self.op1, self.op2, |v1, _| {
                (v1 << 1, Some(v1 & 0x80 != 0))
            }),
            op => debug!("ignoring ALU operation 8{:X}{:X}{:X}", self.op1, self.op2, op),
        };
        Ok(())
    }
}

define_instruction_with_address!(Ld, LdInstruction, 0xA);
impl ExecutableOpcode for LdInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        state.index = self.address;
        Ok(())
    }
}

define_instruction_with_reg_and_value!(Rnd, RndInstruction, 0xC);
impl ExecutableOpcode for RndInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        let sample: u8 = thread_rng().gen();
        state.registers[self.reg as usize] = sample & self.value;
        Ok(())
    }
}

define_instruction_with_operands!(Drw, DrwInstruction, 0xD);
impl ExecutableOpcode for DrwInstruction {
    /// XORs an `op3` rows high sprite read from the index register onto the
    /// display at (V`op1`, V`op2`). Rows and columns falling off the display
    /// are clipped, not wrapped.
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        let x = state.registers[self.op1 as usize] as usize;
        let y = state.registers[self.op2 as usize] as usize;
        let n = self.op3;

        state.registers[CHIP8_FLAG_REGISTER] = 0;
        for y_pos in 0..n {
            let row = y + y_pos as usize;
            if row >= CHIP8_DISPLAY_HEIGHT {
                break;
            }

            let pixel_byte = state.memory[util::index_offset(state, y_pos as u16)];

            for x_pos in 0..8 {
                let column = x + x_pos;
                if column >= CHIP8_DISPLAY_WIDTH {
                    break;
                }

                if pixel_byte & (0x80 >> x_pos) == 0 {
                    continue;
                }

                let pixel_pos = column + row * CHIP8_DISPLAY_WIDTH;
                if state.output_pins[pixel_pos] {
                    state.registers[CHIP8_FLAG_REGISTER] = 1;
                }
                state.output_pins[pixel_pos] ^= true;
            }
        }
        state.draw = true;
        Ok(())
    }
}

define_instruction_with_reg_and_value!(Ldu, LduInstruction, 0xF);
impl ExecutableOpcode for LduInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        let reg = self.reg as usize;
        match self.value {
            0x07 => {
                state.registers[reg] = state.delay_timer;
            }
            0x0A => match state.key {
                Some(key) => state.registers[reg] = key,
                // no key is pressed, so we wait by running this instruction again
                None => util::repeat_instruction(state),
            },
            0x15 => {
                state.delay_timer = state.registers[reg];
            }
            0x18 => {
                state.sound_timer = state.registers[reg];
            }
            0x1E => {
                state.index = state.index.wrapping_add(state.registers[reg] as u16);
            }
            0x29 => {
                let character = (state.registers[reg] & 0x0F) as u16;
                state.index = CHIP8_CHARSET_OFFSET + character * CHIP8_GLYPH_LEN;
            }
            0x33 => {
                let a = state.registers[reg];
                let digits = [a / 100, (a / 10) % 10, a % 10];
                for (offset, digit) in digits.iter().enumerate() {
                    let address = util::index_offset(state, offset as u16);
                    state.memory[address] = *digit;
                }
            }
            0x55 => {
                for reg in 0x0..=reg {
                    let address = util::index_offset(state, reg as u16);
                    state.memory[address] = state.registers[reg];
                }
            }
            0x65 => {
                for reg in 0x0..=reg {
                    let address = util::index_offset(state, reg as u16);
                    state.registers[reg] = state.memory[address];
                }
            }
            value => debug!("ignoring transfer instruction F{:X}{:02X}", self.reg, value),
        }
        Ok(())
    }
}
