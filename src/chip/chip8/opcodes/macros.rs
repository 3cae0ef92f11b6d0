/// Defines a struct `$instruction` and a type alias `$name` for
/// `InstructionWithAddress<$instruction>`. Implements `From<Opcode>` for
/// `InstructionWithAddress<$instruction>`. The instruction table only hands
/// opcodes of class `$instruction_class` to the conversion.
macro_rules! define_instruction_with_address {
    ($instruction:ident, $name:ident, $instruction_class:expr) => {
        pub(super) struct $instruction;
        pub(super) type $name = InstructionWithAddress<$instruction>;
        impl From<Opcode> for $name {
            fn from(opcode: Opcode) -> Self {
                debug_assert_eq!(opcode.instruction_class(), $instruction_class);
                Self {
                    instruction: PhantomData,
                    address: opcode.address(),
                }
            }
        }
    };
}

/// Defines a struct `$instruction` and a type alias `$name` for
/// `InstructionWithRegAndValue<$instruction>`. Implements `From<Opcode>` for
/// `InstructionWithRegAndValue<$instruction>`. The instruction table only
/// hands opcodes of class `$instruction_class` to the conversion.
macro_rules! define_instruction_with_reg_and_value {
    ($instruction:ident, $name:ident, $instruction_class:expr) => {
        pub(super) struct $instruction;
        pub(super) type $name = InstructionWithRegAndValue<$instruction>;
        impl From<Opcode> for $name {
            fn from(opcode: Opcode) -> Self {
                debug_assert_eq!(opcode.instruction_class(), $instruction_class);
                let (reg, value) = opcode.reg_and_value();
                Self {
                    instruction: PhantomData,
                    reg,
                    value,
                }
            }
        }
    };
}

/// Defines a struct `$instruction` and a type alias `$name` for
/// `InstructionWithOperands<$instruction>`. Implements `From<Opcode>` for
/// `InstructionWithOperands<$instruction>`. The instruction table only hands
/// opcodes of class `$instruction_class` to the conversion.
macro_rules! define_instruction_with_operands {
    ($instruction:ident, $name:ident, $instruction_class:expr) => {
        pub(super) struct $instruction;
        pub(super) type $name = InstructionWithOperands<$instruction>;
        impl From<Opcode> for $name {
            fn from(opcode: Opcode) -> Self {
                debug_assert_eq!(opcode.instruction_class(), $instruction_class);
                let (op1, op2, op3) = opcode.operands();
                Self {
                    instruction: PhantomData,
                    op1,
                    op2,
                    op3,
                }
            }
        }
    };
}
