//! CDP1802 architectural state.
//!
//! The 1802 has:
//! - D: 8-bit accumulator, with DF as its carry/borrow/shift flag
//! - B: 8-bit auxiliary holding register
//! - R0-RF: sixteen 16-bit scratchpad registers
//! - P, X: 4-bit selectors naming the program counter and data pointer
//! - N, I: the two nibbles of the instruction being executed
//! - T: X and P saved by an interrupt or MARK (X in the high nibble)
//! - IE, Q: interrupt enable and the Q output flip-flop

use serde::Serialize;

/// The 1802 register file.
///
/// Hosts can observe every field but only the CPU mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Registers {
    pub(crate) d: u8,
    pub(crate) df: bool,
    pub(crate) b: u8,
    pub(crate) r: [u16; 16],
    pub(crate) p: u8,
    pub(crate) x: u8,
    pub(crate) n: u8,
    pub(crate) i: u8,
    pub(crate) t: u8,
    pub(crate) ie: bool,
    pub(crate) q: bool,
    pub(crate) idle: bool,
}

impl Registers {
    /// Power-on state: everything clear, interrupts enabled.
    pub fn new() -> Self {
        Self {
            d: 0,
            df: false,
            b: 0,
            r: [0; 16],
            p: 0,
            x: 0,
            n: 0,
            i: 0,
            t: 0,
            ie: true,
            q: false,
            idle: false,
        }
    }

    /// Accumulator.
    pub fn d(&self) -> u8 {
        self.d
    }

    /// Data flag.
    pub fn df(&self) -> bool {
        self.df
    }

    /// Auxiliary register.
    pub fn b(&self) -> u8 {
        self.b
    }

    /// Scratchpad register `index` (only the low nibble is used).
    pub fn r(&self, index: u8) -> u16 {
        self.r[(index & 0x0F) as usize]
    }

    /// All sixteen scratchpad registers.
    pub fn scratchpad(&self) -> &[u16; 16] {
        &self.r
    }

    /// Program counter selector.
    pub fn p(&self) -> u8 {
        self.p
    }

    /// Data pointer selector.
    pub fn x(&self) -> u8 {
        self.x
    }

    /// Low nibble of the last fetched opcode.
    pub fn n(&self) -> u8 {
        self.n
    }

    /// High nibble of the last fetched opcode.
    pub fn i(&self) -> u8 {
        self.i
    }

    /// Saved X:P.
    pub fn t(&self) -> u8 {
        self.t
    }

    /// Interrupt enable.
    pub fn ie(&self) -> bool {
        self.ie
    }

    /// Q output flip-flop.
    pub fn q(&self) -> bool {
        self.q
    }

    /// Whether the CPU is in the IDL wait state.
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Current program counter, R(P).
    pub fn pc(&self) -> u16 {
        self.r[self.p as usize]
    }

    /// Current data pointer, R(X).
    pub fn rx(&self) -> u16 {
        self.r[self.x as usize]
    }

    /// X and P packed the way T, MARK and RET store them.
    pub(crate) fn xp(&self) -> u8 {
        (self.x << 4) | self.p
    }

    pub(crate) fn set_xp(&mut self, packed: u8) {
        self.x = packed >> 4;
        self.p = packed & 0x0F;
    }

    pub(crate) fn inc(&mut self, index: u8) -> u16 {
        let reg = &mut self.r[(index & 0x0F) as usize];
        let old = *reg;
        *reg = old.wrapping_add(1);
        old
    }

    pub(crate) fn dec(&mut self, index: u8) -> u16 {
        let reg = &mut self.r[(index & 0x0F) as usize];
        let old = *reg;
        *reg = old.wrapping_sub(1);
        old
    }

    pub(crate) fn set_r(&mut self, index: u8, value: u16) {
        self.r[(index & 0x0F) as usize] = value;
    }

    pub(crate) fn set_low(&mut self, index: u8, value: u8) {
        let reg = &mut self.r[(index & 0x0F) as usize];
        *reg = (*reg & 0xFF00) | value as u16;
    }

    pub(crate) fn set_high(&mut self, index: u8, value: u8) {
        let reg = &mut self.r[(index & 0x0F) as usize];
        *reg = ((value as u16) << 8) | (*reg & 0x00FF);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
