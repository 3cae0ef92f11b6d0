/// CHIP-8 constants.
pub mod constants;
/// Cursive display output.
pub mod cursive_display;
/// Decoding of opcodes and their execution.
mod opcodes;
/// Convenience functions for modification of the CHIP-8 state.
mod util;


use std::path::Path;

use log::{debug, trace};

use crate::chip::{
    chip8::constants::{
        CHIP8_CHARSET, CHIP8_CHARSET_OFFSET, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH,
        CHIP8_FETCH_LIMIT, CHIP8_MAX_PROGRAM_SIZE, CHIP8_MEMORY_SIZE, CHIP8_PROGRAM_OFFSET,
        CHIP8_REGISTER_COUNT, CHIP8_STACK_DEPTH,
    },
    chip8::opcodes::Opcode,
    Chip, ExecutionError, LoadProgramError,
};

/// Represents the state of the CHIP-8.
#[derive(Clone)]
pub struct Chip8 {
    /// 4096 bytes of main memory
    memory: [u8; CHIP8_MEMORY_SIZE],

    /// 16 registers where each can store one byte
    registers: [u8; CHIP8_REGISTER_COUNT],

    /// The address register. It is nominally 12 bits wide, but never range
    /// checked. Memory accesses through it wrap around at the end of memory.
    index: u16,

    /// A program counter
    program_counter: u16,

    /// The output pins, row major. Note that those are usually directly
    /// wired up to the pixels of the display. However, given that this
    /// implementation considers a display as optional, we refer to them as
    /// output_pins for the sake of generality.
    output_pins: [bool; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],

    /// The delay timer, decremented once per cycle while positive.
    delay_timer: u8,

    /// The sound timer, decremented once per cycle while positive. A beep
    /// is triggered whenever it goes from 1 to 0.
    sound_timer: u8,

    /// The key latch. At most one key is pressed at any time.
    key: Option<u8>,

    /// A stack. Note that there are no instructions allowing to modify the
    /// stack and it is only used to store return addresses for the return
    /// opcode.
    stack: [u16; CHIP8_STACK_DEPTH],

    /// A pointer, pointing to the next free slot in the stack.
    stack_pointer: u8,

    /// A flag that indicates whether the output pins changed since it
    /// was last set to false.
    draw: bool,

    /// A flag that indicates whether the sound timer ran out since it was
    /// last set to false.
    beep: bool,
}

impl Chip for Chip8 {
    /// The CHIP-8's pins can actually be addressed by using just half a byte.
    /// However, we use a whole byte here and ignore the upper nibble, because
    /// it is more convenient to handle.
    type PinAddress = u8;

    fn load_program(&mut self, program: &[u8]) -> Result<usize, LoadProgramError> {
        if program.len() > CHIP8_MAX_PROGRAM_SIZE {
            return Err(LoadProgramError::ProgramTooLarge {
                size: program.len(),
                max: CHIP8_MAX_PROGRAM_SIZE,
            });
        }

        self.reset();
        let start = CHIP8_PROGRAM_OFFSET as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        debug!("loaded program of {} bytes", program.len());

        Ok(program.len())
    }

    fn reset(&mut self) {
        *self = Chip8::new();
        debug!("reset");
    }

    fn cycle(&mut self) -> Result<(), ExecutionError> {
        let opcode = self.next_instruction()?;
        trace!("{:#05x}: {}", self.program_counter, opcode);

        // Jump targets are absolute, so the program counter moves on before
        // the instruction is executed.
        util::increment_program_counter(self);
        opcode.execute(self)?;

        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        if self.sound_timer > 0 {
            if self.sound_timer == 1 {
                self.beep = true;
            }
            self.sound_timer -= 1;
        }

        Ok(())
    }

    fn read_output_pins(&self) -> &[bool] {
        &self.output_pins
    }

    fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.draw, false)
    }

    fn take_beep(&mut self) -> bool {
        std::mem::replace(&mut self.beep, false)
    }

    fn set_input_pin(&mut self, pin: u8, value: bool) {
        let pin = pin & 0x0F;
        if value {
            self.key = Some(pin);
        } else if self.key == Some(pin) {
            self.key = None;
        }
    }

    fn reset_input_pins(&mut self) {
        self.key = None;
    }
}

impl Chip8 {
    /// Constructs a new CHIP-8 and appropriately initializes all fields so that
    /// it is ready for the first execution cycle. Essentially this means that
    /// the program counter is set to 0x200 and the default CHIP-8 charset is
    /// loaded at memory address `CHIP8_CHARSET_OFFSET`. Note that no program is
    /// loaded upon initialization.
    pub fn new() -> Self {
        let mut memory = [0; CHIP8_MEMORY_SIZE];
        let start = CHIP8_CHARSET_OFFSET as usize;
        memory[start..start + CHIP8_CHARSET.len()].copy_from_slice(&CHIP8_CHARSET);

        Chip8 {
            memory,
            registers: [0; CHIP8_REGISTER_COUNT],
            index: 0,
            program_counter: CHIP8_PROGRAM_OFFSET,
            output_pins: [false; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; CHIP8_STACK_DEPTH],
            stack_pointer: 0,
            key: None,
            draw: false,
            beep: false,
        }
    }

    /// Reads the program at `path` and loads it, see [`Chip::load_program`].
    pub fn load_program_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, LoadProgramError> {
        let path = path.as_ref();
        let program = std::fs::read(path).map_err(|source| LoadProgramError::CouldNotReadFile {
            path: path.display().to_string(),
            source,
        })?;
        self.load_program(&program)
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    /// Returns the value of register `reg`. Only the lower nibble of `reg`
    /// is taken into account.
    pub fn register(&self, reg: u8) -> u8 {
        self.registers[(reg & 0x0F) as usize]
    }

    /// Returns the byte at `address`, wrapping around at the end of memory.
    pub fn memory_byte(&self, address: u16) -> u8 {
        self.memory[address as usize % CHIP8_MEMORY_SIZE]
    }

    /// Returns whether the pixel at column `x` and row `y` is set. Pixels
    /// outside of the display are never set.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < CHIP8_DISPLAY_WIDTH
            && y < CHIP8_DISPLAY_HEIGHT
            && self.output_pins[x + y * CHIP8_DISPLAY_WIDTH]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Whether the tone is currently active, i.e., the sound timer is running.
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// Fetches the next instruction based on the current state of self.program_counter.
    ///
    /// # Errors
    /// In case `self.program_counter` points to an address which would lead to loading
    /// bytes from invalid memory addresses.
    fn next_instruction(&self) -> Result<Opcode, ExecutionError> {
        if self.program_counter >= CHIP8_FETCH_LIMIT {
            return Err(ExecutionError::OutOfBoundsFetch(self.program_counter));
        }
        let pc = self.program_counter as usize;
        Ok(Opcode::new(&[self.memory[pc], self.memory[pc + 1]]))
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Chip8::new()
    }
}
