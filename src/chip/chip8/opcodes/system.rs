use log::debug;
use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        constants::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH},
        opcodes::{ExecutableOpcode, InstructionWithAddress, Opcode},
        Chip8,
    },
    ExecutionError,
};

define_instruction_with_address!(Sys, SysInstruction, 0x0);
impl ExecutableOpcode for SysInstruction {
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError> {
        match self.address {
            0x0E0 => {
                state.output_pins = [false; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT];
                state.draw = true;
            }
            0x0EE => {
                if state.stack_pointer == 0 {
                    return Err(ExecutionError::StackUnderflow(
                        state.program_counter.wrapping_sub(2),
                    ));
                }
                state.stack_pointer -= 1;
                state.program_counter = state.stack[state.stack_pointer as usize];
            }
            address => debug!("ignoring system call {:#05x}", address),
        };
        Ok(())
    }
}
