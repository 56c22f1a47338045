//! Assembler mnemonic table.
//!
//! Maps every documented CDP1802 mnemonic, aliases included, to its
//! opcode and operand class. Several mnemonics share an opcode (BDF, BPZ
//! and BGE all test DF).

/// How a mnemonic takes its operand and how many bytes it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandClass {
    /// No operand, one byte.
    None,
    /// Register 0-F or'ed into the opcode.
    Register,
    /// Device 1-7 or'ed into the opcode.
    Device,
    /// One inline byte (immediate value or short branch target).
    Byte,
    /// Two inline bytes, high first (long branch target).
    Word,
    /// `DB`: one data byte.
    Data,
    /// `ORG`: pad with zeros up to an address.
    Origin,
}

impl OperandClass {
    /// Bytes emitted, for everything but `ORG`.
    pub fn size(self) -> u16 {
        match self {
            OperandClass::Byte => 2,
            OperandClass::Word => 3,
            OperandClass::Origin => 0,
            _ => 1,
        }
    }
}

/// One row of the mnemonic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mnemonic {
    pub name: &'static str,
    pub opcode: u8,
    pub class: OperandClass,
}

const fn m(name: &'static str, opcode: u8, class: OperandClass) -> Mnemonic {
    Mnemonic { name, opcode, class }
}

use OperandClass::{Byte, Data, Device, Origin, Register, Word};
const NONE: OperandClass = OperandClass::None;

/// Every mnemonic the assembler accepts.
pub static MNEMONICS: &[Mnemonic] = &[
    m("IDL", 0x00, NONE),
    m("LDN", 0x00, Register),
    m("INC", 0x10, Register),
    m("DEC", 0x20, Register),
    m("BR", 0x30, Byte),
    m("BQ", 0x31, Byte),
    m("BZ", 0x32, Byte),
    m("BDF", 0x33, Byte),
    m("BPZ", 0x33, Byte),
    m("BGE", 0x33, Byte),
    m("B1", 0x34, Byte),
    m("B2", 0x35, Byte),
    m("B3", 0x36, Byte),
    m("B4", 0x37, Byte),
    m("NBR", 0x38, NONE),
    m("SKP", 0x38, NONE),
    m("BNQ", 0x39, Byte),
    m("BNZ", 0x3A, Byte),
    m("BNF", 0x3B, Byte),
    m("BM", 0x3B, Byte),
    m("BL", 0x3B, Byte),
    m("BN1", 0x3C, Byte),
    m("BN2", 0x3D, Byte),
    m("BN3", 0x3E, Byte),
    m("BN4", 0x3F, Byte),
    m("LDA", 0x40, Register),
    m("STR", 0x50, Register),
    m("IRX", 0x60, NONE),
    m("OUT", 0x60, Device),
    m("INP", 0x68, Device),
    m("IN", 0x68, Device),
    m("RET", 0x70, NONE),
    m("DIS", 0x71, NONE),
    m("LDXA", 0x72, NONE),
    m("STXD", 0x73, NONE),
    m("ADC", 0x74, NONE),
    m("SDB", 0x75, NONE),
    m("SHRC", 0x76, NONE),
    m("RSHR", 0x76, NONE),
    m("SMB", 0x77, NONE),
    m("SAV", 0x78, NONE),
    m("MARK", 0x79, NONE),
    m("REQ", 0x7A, NONE),
    m("SEQ", 0x7B, NONE),
    m("ADCI", 0x7C, Byte),
    m("SDBI", 0x7D, Byte),
    m("SHLC", 0x7E, NONE),
    m("RSHL", 0x7E, NONE),
    m("SMBI", 0x7F, Byte),
    m("GLO", 0x80, Register),
    m("GHI", 0x90, Register),
    m("PLO", 0xA0, Register),
    m("PHI", 0xB0, Register),
    m("LBR", 0xC0, Word),
    m("LBQ", 0xC1, Word),
    m("LBZ", 0xC2, Word),
    m("LBDF", 0xC3, Word),
    m("NOP", 0xC4, NONE),
    m("LSNQ", 0xC5, NONE),
    m("LSNZ", 0xC6, NONE),
    m("LSNF", 0xC7, NONE),
    m("NLBR", 0xC8, NONE),
    m("LSKP", 0xC8, NONE),
    m("LBNQ", 0xC9, Word),
    m("LBNZ", 0xCA, Word),
    m("LBNF", 0xCB, Word),
    m("LSIE", 0xCC, NONE),
    m("LSQ", 0xCD, NONE),
    m("LSZ", 0xCE, NONE),
    m("LSDF", 0xCF, NONE),
    m("SEP", 0xD0, Register),
    m("SEX", 0xE0, Register),
    m("LDX", 0xF0, NONE),
    m("OR", 0xF1, NONE),
    m("AND", 0xF2, NONE),
    m("XOR", 0xF3, NONE),
    m("ADD", 0xF4, NONE),
    m("SD", 0xF5, NONE),
    m("SHR", 0xF6, NONE),
    m("SM", 0xF7, NONE),
    m("LDI", 0xF8, Byte),
    m("ORI", 0xF9, Byte),
    m("ANI", 0xFA, Byte),
    m("XRI", 0xFB, Byte),
    m("ADI", 0xFC, Byte),
    m("SDI", 0xFD, Byte),
    m("SHL", 0xFE, NONE),
    m("SMI", 0xFF, Byte),
    // Directives
    m("DB", 0x00, Data),
    m("ORG", 0x00, Origin),
];

/// Look a mnemonic up, ignoring case.
pub fn lookup(name: &str) -> Option<&'static Mnemonic> {
    MNEMONICS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}
