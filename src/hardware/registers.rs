use std::fmt;

/// Power-on program counter, the fixed start address for user programs.
pub const PC_START: u16 = 0x3000;

/// One 16-bit machine register.
///
/// The raw bits can be viewed either as the unsigned binary value stored in
/// hardware or as the two's-complement decimal number those bits encode; all
/// signed/unsigned reinterpretation in the crate goes through these two views.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Register(u16);

impl Register {
    #[must_use]
    pub const fn from_binary(bits: u16) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn from_decimal(value: i16) -> Self {
        Self(value.cast_unsigned())
    }

    #[must_use]
    pub const fn as_binary(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn as_decimal(self) -> i16 {
        self.0.cast_signed()
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Register(0x{:04X} = {})", self.0, self.as_decimal())
    }
}

#[must_use]
pub const fn from_binary(bits: u16) -> Register {
    Register::from_binary(bits)
}

#[must_use]
pub const fn from_decimal(value: i16) -> Register {
    Register::from_decimal(value)
}

/// The register file: R0–R7, the program counter and the condition code.
#[derive(Debug)]
pub struct Registers {
    general_purpose: [Register; 8],
    pc: u16,
    cond: ConditionFlag,
}

impl Registers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            general_purpose: [Register::from_binary(0); 8],
            pc: PC_START,
            cond: ConditionFlag::Zero,
        }
    }

    #[must_use]
    pub fn get(&self, r: u8) -> Register {
        assert!(r <= 7, "invalid general purpose register get");
        self.general_purpose[usize::from(r)]
    }

    pub fn set(&mut self, r: u8, value: Register) {
        assert!(r <= 7, "invalid general purpose register set");
        self.general_purpose[usize::from(r)] = value;
    }

    #[must_use]
    pub const fn pc(&self) -> Register {
        Register::from_binary(self.pc)
    }

    pub const fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    #[must_use]
    pub const fn condition(&self) -> ConditionFlag {
        self.cond
    }

    /// Refreshes the condition code from the value just written to `r`.
    ///
    /// Called after every result-producing write; control transfers and
    /// stores leave the condition code alone.
    pub fn update_condition(&mut self, r: u8) {
        self.cond = ConditionFlag::from(self.get(r).as_binary());
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Exactly one of these holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFlag {
    Pos,
    Zero,
    Neg,
}

impl From<u16> for ConditionFlag {
    fn from(value: u16) -> Self {
        if value == 0 {
            Self::Zero
        } else if value >> 15 == 1 {
            // leftmost bit is 1 for negative numbers
            Self::Neg
        } else {
            Self::Pos
        }
    }
}
