use log::debug;
use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        constants::CHIP8_STACK_DEPTH,
        opcodes::{
            ExecutableOpcode, InstructionWithAddress, InstructionWithOperands,
            InstructionWithRegAndValue, Opcode,
        },
        util, Chip8,
    },
    ExecutionError,
};

define_instruction_with_address!(Jmp, JmpInstruction, 0x1);
impl ExecutableOpcode for JmpInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        state.program_counter = self.address;
        Ok(())
    }
}

define_instruction_with_address!(Call, CallInstruction, 0x2);
impl ExecutableOpcode for CallInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        if state.stack_pointer as usize >= CHIP8_STACK_DEPTH {
            return Err(ExecutionError::StackOverflow(self.address));
        }
        state.stack[state.stack_pointer as usize] = state.program_counter;
        state.stack_pointer += 1;
        state.program_counter = self.address;
        Ok(())
    }
}

define_instruction_with_reg_and_value!(Se, SeInstruction, 0x3);
impl ExecutableOpcode for SeInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        util::conditional_skip(self, state, |instruction, state| {
            state.registers[instruction.reg as usize] == instruction.value
        });
        Ok(())
    }
}

define_instruction_with_reg_and_value!(Sne, SneInstruction, 0x4);
impl ExecutableOpcode for SneInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        util::conditional_skip(self, state, |instruction, state| {
            state.registers[instruction.reg as usize] != instruction.value
        });
        Ok(())
    }
}

// The low nibble of 5XY0 and 9XY0 is not looked at.
define_instruction_with_operands!(Sre, SreInstruction, 0x5);
impl ExecutableOpcode for SreInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        util::conditional_skip(self, state, |instruction, state| {
            state.registers[instruction.op1 as usize] == state.registers[instruction.op2 as usize]
        });
        Ok(())
    }
}

define_instruction_with_operands!(Srne, SrneInstruction, 0x9);
impl ExecutableOpcode for SrneInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        util::conditional_skip(self, state, |instruction, state| {
            state.registers[instruction.op1 as usize] != state.registers[instruction.op2 as usize]
        });
        Ok(())
    }
}

define_instruction_with_address!(Jmpr, JmprInstruction, 0xB);
impl ExecutableOpcode for JmprInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        state.program_counter = self.address.wrapping_add(state.registers[0] as u16);
        Ok(())
    }
}

define_instruction_with_reg_and_value!(Sk, SkInstruction, 0xE);
impl ExecutableOpcode for SkInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        let pressed = state.key == Some(state.registers[self.reg as usize]);
        let skip = match self.value {
            0x9E => pressed,
            0xA1 => !pressed,
            value => {
                debug!("ignoring key instruction E{:X}{:02X}", self.reg, value);
                false
            }
        };
        if skip {
            util::increment_program_counter(state);
        }
        Ok(())
    }
}
