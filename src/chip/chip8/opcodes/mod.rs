#[macro_use]
mod macros;
mod arithmetic_and_logic;
mod program_flow;
mod system;

use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        opcodes::{
            arithmetic_and_logic::{
                AddInstruction, DrwInstruction, LdInstruction, LdrInstruction, LduInstruction,
                RegInstruction, RndInstruction,
            },
            program_flow::{
                CallInstruction, JmpInstruction, JmprInstruction, SeInstruction, SkInstruction,
                SneInstruction, SreInstruction, SrneInstruction,
            },
            system::SysInstruction,
        },
        Chip8,
    },
    ExecutionError,
};

/// Represents a Chip 8 opcode. A Chip 8 opcode is two bytes long and stored
/// big endian in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Opcode {
    word: u16,
}

impl Opcode {
    /// Constructs a new `Opcode` given its byte representation.
    pub(super) fn new(opcode: &[u8; 2]) -> Opcode {
        Opcode {
            word: u16::from_be_bytes(*opcode),
        }
    }

    /// The instruction class is the most significant nibble of the opcode.
    fn instruction_class(&self) -> u8 {
        (self.word >> 12) as u8
    }

    /// Interprets the lower twelve bits as an address in the range 0x000 to
    /// 0xFFF (inclusive).
    fn address(&self) -> u16 {
        self.word & 0x0FFF
    }

    /// The low byte of the opcode, used as an immediate value.
    fn value(&self) -> u8 {
        (self.word & 0x00FF) as u8
    }

    /// The low nibble of the opcode, e.g., the height of a sprite.
    fn nibble(&self) -> u8 {
        (self.word & 0x000F) as u8
    }

    /// The index of the first register operand.
    fn x(&self) -> u8 {
        ((self.word & 0x0F00) >> 8) as u8
    }

    /// The index of the second register operand.
    fn y(&self) -> u8 {
        ((self.word & 0x00F0) >> 4) as u8
    }

    /// Interprets the payload as a register address in range 0x0 - 0xF
    /// (inclusive) followed by a value in range 0x00 - 0xFF (inclusive).
    fn reg_and_value(&self) -> (u8, u8) {
        (self.x(), self.value())
    }

    /// Interprets the payload as three operands, each of size one nibble.
    fn operands(&self) -> (u8, u8, u8) {
        (self.x(), self.y(), self.nibble())
    }

    pub(super) fn execute(self, state: &mut Chip8) -> Result<(), ExecutionError> {
        let decode = INSTRUCTION_TABLE[self.instruction_class() as usize];
        decode(self).execute(state)
    }
}

type DecodeFn = fn(Opcode) -> Box<dyn ExecutableOpcode>;

fn boxed<T>(opcode: Opcode) -> Box<dyn ExecutableOpcode>
where
    T: ExecutableOpcode + From<Opcode> + 'static,
{
    Box::new(T::from(opcode))
}

/// Maps every instruction class to the instruction handling it.
const INSTRUCTION_TABLE: [DecodeFn; 16] = [
    boxed::<SysInstruction>,
    boxed::<JmpInstruction>,
    boxed::<CallInstruction>,
    boxed::<SeInstruction>,
    boxed::<SneInstruction>,
    boxed::<SreInstruction>,
    boxed::<LdrInstruction>,
    boxed::<AddInstruction>,
    boxed::<RegInstruction>,
    boxed::<SrneInstruction>,
    boxed::<LdInstruction>,
    boxed::<JmprInstruction>,
    boxed::<RndInstruction>,
    boxed::<DrwInstruction>,
    boxed::<SkInstruction>,
    boxed::<LduInstruction>,
];

/// Represents an opcode that can be executed.
trait ExecutableOpcode {
    /// Executes `self` relative to the given state. Note that this
    /// method will in-place modify the given state, and that the program
    /// counter already points to the following instruction.
    fn execute(&self, state: &mut Chip8) -> Result<(), ExecutionError>;
}

/// Represents an opcode that expects the payload to be an address.
struct InstructionWithAddress<T> {
    instruction: PhantomData<T>,
    address: u16,
}

/// Represents an opcode that expects the payload to be three operands.
struct InstructionWithOperands<T> {
    instruction: PhantomData<T>,
    op1: u8,
    op2: u8,
    op3: u8,
}

/// Represents an opcode that expects the payload to be a register pointer and a value.
struct InstructionWithRegAndValue<T> {
    instruction: PhantomData<T>,
    reg: u8,
    value: u8,
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04X}", self.word)
    }
}

#[cfg(test)]
mod tests {
    use super::Opcode;

    #[test]
    fn test_fields() {
        let opcode = Opcode::new(&[0xD1, 0x2F]);
        assert_eq!(opcode.instruction_class(), 0xD);
        assert_eq!(opcode.address(), 0x12F);
        assert_eq!(opcode.value(), 0x2F);
        assert_eq!(opcode.nibble(), 0xF);
        assert_eq!(opcode.x(), 0x1);
        assert_eq!(opcode.y(), 0x2);
    }

    #[test]
    fn test_value_is_low_byte_only() {
        let opcode = Opcode::new(&[0x7A, 0x05]);
        assert_eq!(opcode.reg_and_value(), (0xA, 0x05));
    }

    #[test]
    fn test_operands() {
        let opcode = Opcode::new(&[0x8A, 0xBE]);
        assert_eq!(opcode.operands(), (0xA, 0xB, 0xE));
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::new(&[0x00, 0xE0]).to_string(), "00E0");
    }
}
