//! Instruction decoder for the CDP1802.
//!
//! Every opcode byte splits into two nibbles: I (high) picks the
//! instruction group and N (low) is either a register number, a device
//! number, or a sub-opcode for groups 3, 6, 7, C and F. Instead of nested
//! dispatch on I then N, the whole instruction set is laid out as one flat
//! 256-entry table built at compile time.

use serde::Serialize;

/// Branch and skip condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    Always,
    Never,
    Q,
    NotQ,
    Zero,
    NonZero,
    Df,
    NotDf,
    /// External flag 1-4 set.
    Ef(u8),
    /// External flag 1-4 clear.
    NotEf(u8),
    InterruptsEnabled,
}

/// The operation an opcode performs.
///
/// Register-numbered groups (0N, 1N, 4N, 8N, ...) take their register
/// from the N nibble at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    // ==================== Memory reference ====================
    /// IDL: wait for an interrupt or DMA.
    Idle,
    /// LDN: D := M(R(N)).
    LoadViaN,
    /// LDA: D := M(R(N)); R(N) += 1.
    LoadAdvance,
    /// STR: M(R(N)) := D.
    Store,
    /// LDX: D := M(R(X)).
    LoadViaX,
    /// LDXA: D := M(R(X)); R(X) += 1.
    LoadViaXAdvance,
    /// LDI: D := M(R(P)); R(P) += 1.
    LoadImmediate,
    /// STXD: M(R(X)) := D; R(X) -= 1.
    StoreViaXDecrement,

    // ==================== Register operations ====================
    Increment,
    Decrement,
    /// IRX: R(X) += 1.
    IncrementX,
    GetLow,
    GetHigh,
    PutLow,
    PutHigh,

    // ==================== Logic ====================
    Or,
    OrImmediate,
    And,
    AndImmediate,
    Xor,
    XorImmediate,
    ShiftRight,
    ShiftRightCarry,
    ShiftLeft,
    ShiftLeftCarry,

    // ==================== Arithmetic ====================
    Add,
    AddImmediate,
    AddCarry,
    AddCarryImmediate,
    /// SD: D := M(R(X)) - D.
    SubtractD,
    SubtractDImmediate,
    SubtractDBorrow,
    SubtractDBorrowImmediate,
    /// SM: D := D - M(R(X)).
    SubtractMemory,
    SubtractMemoryImmediate,
    SubtractMemoryBorrow,
    SubtractMemoryBorrowImmediate,

    // ==================== Branch and skip ====================
    ShortBranch(Condition),
    LongBranch(Condition),
    LongSkip(Condition),

    // ==================== Control ====================
    /// NOP (C4): three-cycle no-op in the long-branch group.
    NoOperation,
    SetP,
    SetX,
    ResetQ,
    SetQ,
    /// SAV: M(R(X)) := T.
    Save,
    /// MARK: T := X:P; M(R(2)) := T; X := P; R(2) -= 1.
    Mark,
    /// RET: X:P := M(R(X)); R(X) += 1; IE := 1.
    Return,
    /// DIS: as RET, with IE := 0.
    Disable,

    // ==================== Input/output ====================
    /// OUT 1-7: bus := M(R(X)); R(X) += 1.
    Output,
    /// INP 1-7: D := bus; M(R(X)) := D.
    Input,
    /// 68: unused on the 1802 (CDP1805 prefix), executes as a no-op.
    Reserved,
}

/// What follows or is embedded in the opcode, for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperandKind {
    None,
    /// N names a scratchpad register.
    Register,
    /// N (low three bits) names an I/O device.
    Device,
    /// One inline byte follows the opcode.
    Byte,
    /// Two inline bytes (high, low) follow the opcode.
    Word,
}

/// Static description of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpcodeInfo {
    pub operation: Operation,
    /// Canonical RCA mnemonic.
    pub mnemonic: &'static str,
    pub operand: OperandKind,
    /// Machine cycles charged for executing this opcode.
    pub cycles: u8,
}

impl OpcodeInfo {
    /// Total bytes occupied, opcode included.
    pub const fn size(&self) -> usize {
        match self.operand {
            OperandKind::Byte => 2,
            OperandKind::Word => 3,
            _ => 1,
        }
    }
}

const fn short(operation: Operation, mnemonic: &'static str, operand: OperandKind) -> OpcodeInfo {
    OpcodeInfo { operation, mnemonic, operand, cycles: 2 }
}

const fn long(operation: Operation, mnemonic: &'static str, operand: OperandKind) -> OpcodeInfo {
    OpcodeInfo { operation, mnemonic, operand, cycles: 3 }
}

const fn short_branch(n: u8) -> OpcodeInfo {
    use Condition::*;
    let (mnemonic, condition) = match n {
        0x0 => ("BR", Always),
        0x1 => ("BQ", Q),
        0x2 => ("BZ", Zero),
        0x3 => ("BDF", Df),
        0x4 => ("B1", Ef(1)),
        0x5 => ("B2", Ef(2)),
        0x6 => ("B3", Ef(3)),
        0x7 => ("B4", Ef(4)),
        // SKP consumes no operand of its own, it steps over the next byte
        0x8 => return short(Operation::ShortBranch(Never), "SKP", OperandKind::None),
        0x9 => ("BNQ", NotQ),
        0xA => ("BNZ", NonZero),
        0xB => ("BNF", NotDf),
        0xC => ("BN1", NotEf(1)),
        0xD => ("BN2", NotEf(2)),
        0xE => ("BN3", NotEf(3)),
        _ => ("BN4", NotEf(4)),
    };
    short(Operation::ShortBranch(condition), mnemonic, OperandKind::Byte)
}

const fn io_group(n: u8) -> OpcodeInfo {
    match n {
        0x0 => short(Operation::IncrementX, "IRX", OperandKind::None),
        0x1..=0x7 => short(Operation::Output, "OUT", OperandKind::Device),
        0x8 => short(Operation::Reserved, "???", OperandKind::None),
        _ => short(Operation::Input, "INP", OperandKind::Device),
    }
}

const fn control_group(n: u8) -> OpcodeInfo {
    use Operation::*;
    match n {
        0x0 => short(Return, "RET", OperandKind::None),
        0x1 => short(Disable, "DIS", OperandKind::None),
        0x2 => short(LoadViaXAdvance, "LDXA", OperandKind::None),
        0x3 => short(StoreViaXDecrement, "STXD", OperandKind::None),
        0x4 => short(AddCarry, "ADC", OperandKind::None),
        0x5 => short(SubtractDBorrow, "SDB", OperandKind::None),
        0x6 => short(ShiftRightCarry, "SHRC", OperandKind::None),
        0x7 => short(SubtractMemoryBorrow, "SMB", OperandKind::None),
        0x8 => short(Save, "SAV", OperandKind::None),
        0x9 => short(Mark, "MARK", OperandKind::None),
        0xA => short(ResetQ, "REQ", OperandKind::None),
        0xB => short(SetQ, "SEQ", OperandKind::None),
        0xC => short(AddCarryImmediate, "ADCI", OperandKind::Byte),
        0xD => short(SubtractDBorrowImmediate, "SDBI", OperandKind::Byte),
        0xE => short(ShiftLeftCarry, "SHLC", OperandKind::None),
        _ => short(SubtractMemoryBorrowImmediate, "SMBI", OperandKind::Byte),
    }
}

const fn long_group(n: u8) -> OpcodeInfo {
    use Condition::*;
    use Operation::{LongBranch, LongSkip, NoOperation};
    match n {
        0x0 => long(LongBranch(Always), "LBR", OperandKind::Word),
        0x1 => long(LongBranch(Q), "LBQ", OperandKind::Word),
        0x2 => long(LongBranch(Zero), "LBZ", OperandKind::Word),
        0x3 => long(LongBranch(Df), "LBDF", OperandKind::Word),
        0x4 => long(NoOperation, "NOP", OperandKind::None),
        0x5 => long(LongSkip(NotQ), "LSNQ", OperandKind::None),
        0x6 => long(LongSkip(NonZero), "LSNZ", OperandKind::None),
        0x7 => long(LongSkip(NotDf), "LSNF", OperandKind::None),
        // not-taken long branch: always steps over two bytes
        0x8 => long(LongBranch(Never), "LSKP", OperandKind::None),
        0x9 => long(LongBranch(NotQ), "LBNQ", OperandKind::Word),
        0xA => long(LongBranch(NonZero), "LBNZ", OperandKind::Word),
        0xB => long(LongBranch(NotDf), "LBNF", OperandKind::Word),
        0xC => long(LongSkip(InterruptsEnabled), "LSIE", OperandKind::None),
        0xD => long(LongSkip(Q), "LSQ", OperandKind::None),
        0xE => long(LongSkip(Zero), "LSZ", OperandKind::None),
        _ => long(LongSkip(Df), "LSDF", OperandKind::None),
    }
}

const fn alu_group(n: u8) -> OpcodeInfo {
    use Operation::*;
    match n {
        0x0 => short(LoadViaX, "LDX", OperandKind::None),
        0x1 => short(Or, "OR", OperandKind::None),
        0x2 => short(And, "AND", OperandKind::None),
        0x3 => short(Xor, "XOR", OperandKind::None),
        0x4 => short(Add, "ADD", OperandKind::None),
        0x5 => short(SubtractD, "SD", OperandKind::None),
        0x6 => short(ShiftRight, "SHR", OperandKind::None),
        0x7 => short(SubtractMemory, "SM", OperandKind::None),
        0x8 => short(LoadImmediate, "LDI", OperandKind::Byte),
        0x9 => short(OrImmediate, "ORI", OperandKind::Byte),
        0xA => short(AndImmediate, "ANI", OperandKind::Byte),
        0xB => short(XorImmediate, "XRI", OperandKind::Byte),
        0xC => short(AddImmediate, "ADI", OperandKind::Byte),
        0xD => short(SubtractDImmediate, "SDI", OperandKind::Byte),
        0xE => short(ShiftLeft, "SHL", OperandKind::None),
        _ => short(SubtractMemoryImmediate, "SMI", OperandKind::Byte),
    }
}

const fn entry(opcode: u8) -> OpcodeInfo {
    use Operation::*;
    let n = opcode & 0x0F;
    match opcode >> 4 {
        0x0 if n == 0 => short(Idle, "IDL", OperandKind::None),
        0x0 => short(LoadViaN, "LDN", OperandKind::Register),
        0x1 => short(Increment, "INC", OperandKind::Register),
        0x2 => short(Decrement, "DEC", OperandKind::Register),
        0x3 => short_branch(n),
        0x4 => short(LoadAdvance, "LDA", OperandKind::Register),
        0x5 => short(Store, "STR", OperandKind::Register),
        0x6 => io_group(n),
        0x7 => control_group(n),
        0x8 => short(GetLow, "GLO", OperandKind::Register),
        0x9 => short(GetHigh, "GHI", OperandKind::Register),
        0xA => short(PutLow, "PLO", OperandKind::Register),
        0xB => short(PutHigh, "PHI", OperandKind::Register),
        0xC => long_group(n),
        0xD => short(SetP, "SEP", OperandKind::Register),
        0xE => short(SetX, "SEX", OperandKind::Register),
        _ => alu_group(n),
    }
}

const fn build_table() -> [OpcodeInfo; 256] {
    let mut table = [short(Operation::Reserved, "???", OperandKind::None); 256];
    let mut opcode = 0;
    while opcode < 256 {
        table[opcode] = entry(opcode as u8);
        opcode += 1;
    }
    table
}

/// The complete instruction set, indexed by opcode byte.
pub static OPCODE_TABLE: [OpcodeInfo; 256] = build_table();

/// A decoded opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    opcode: u8,
}

impl Instruction {
    /// The raw opcode byte.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// High nibble.
    pub fn i(&self) -> u8 {
        self.opcode >> 4
    }

    /// Low nibble.
    pub fn n(&self) -> u8 {
        self.opcode & 0x0F
    }

    pub fn info(&self) -> &'static OpcodeInfo {
        &OPCODE_TABLE[self.opcode as usize]
    }

    pub fn operation(&self) -> Operation {
        self.info().operation
    }

    pub fn cycles(&self) -> u32 {
        self.info().cycles as u32
    }

    pub fn size(&self) -> usize {
        self.info().size()
    }
}

/// Decode an opcode byte. Every byte decodes; reserved slots are no-ops.
#[inline]
pub fn decode(opcode: u8) -> Instruction {
    Instruction { opcode }
}
