pub mod chip8;
pub mod runner;

use thiserror::Error;

/// The control surface of an emulated chip. Everything a front end needs to
/// drive a chip goes through this trait, so the runner and the UI never
/// depend on a concrete machine.
pub trait Chip {
    /// The type used to address a single input pin (i.e., a key).
    type PinAddress;

    /// Resets the chip and loads `program` at the program origin. Returns
    /// the number of bytes loaded.
    ///
    /// The chip is left untouched if the program does not fit into memory.
    fn load_program(&mut self, program: &[u8]) -> Result<usize, LoadProgramError>;

    /// Brings the chip back into its power-on state.
    fn reset(&mut self);

    /// Performs a single fetch, decode and execute step including the timer
    /// updates.
    fn cycle(&mut self) -> Result<(), ExecutionError>;

    /// Returns the current state of the output pins (i.e., the pixels).
    fn read_output_pins(&self) -> &[bool];

    /// Returns whether the output pins changed since the last call and
    /// clears the flag.
    fn take_redraw(&mut self) -> bool;

    /// Returns whether a beep was triggered since the last call and clears
    /// the flag.
    fn take_beep(&mut self) -> bool;

    /// Sets or releases a single input pin.
    fn set_input_pin(&mut self, pin: Self::PinAddress, value: bool);

    /// Releases all input pins.
    fn reset_input_pins(&mut self);
}

/// Errors that can occur while loading a program.
#[derive(Debug, Error)]
pub enum LoadProgramError {
    #[error("could not read program file {path}")]
    CouldNotReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("program is too large ({size} bytes), at most {max} bytes fit into memory")]
    ProgramTooLarge { size: usize, max: usize },
}

/// Fatal errors that stop the execution of a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("program counter {0:#05x} leaves no room to fetch an instruction")]
    OutOfBoundsFetch(u16),

    #[error("call stack overflow when calling {0:#05x}")]
    StackOverflow(u16),

    #[error("return with an empty call stack at {0:#05x}")]
    StackUnderflow(u16),
}
