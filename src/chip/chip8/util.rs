use crate::chip::chip8::{constants::CHIP8_MEMORY_SIZE, Chip8};

pub fn conditional_skip<T>(opcode: &T, state: &mut Chip8, f: fn(&T, &Chip8) -> bool) {
    if f(opcode, state) {
        increment_program_counter(state);
    }
}

pub fn increment_program_counter(state: &mut Chip8) {
    state.program_counter = state.program_counter.wrapping_add(2);
}

/// Makes the instruction that was just fetched run again in the next cycle.
pub fn repeat_instruction(state: &mut Chip8) {
    state.program_counter = state.program_counter.wrapping_sub(2);
}

/// Translates an address relative to the index register into a memory slot.
pub fn index_offset(state: &Chip8, offset: u16) -> usize {
    state.index.wrapping_add(offset) as usize % CHIP8_MEMORY_SIZE
}
