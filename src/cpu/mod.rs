//! CPU emulation for the RCA CDP1802.
//!
//! This module implements the 1802 programming model:
//! - D (accumulator), DF (carry), B (auxiliary)
//! - sixteen 16-bit scratchpad registers, any of which can be the program
//!   counter (selected by P) or data pointer (selected by X)
//! - the full 91-instruction set, decoded through a flat opcode table
//! - interrupt and DMA side channels
//!
//! All memory and I/O goes through the host-implemented [`Bus`].

pub mod bus;
pub mod registers;
pub mod decode;
pub mod execute;

pub use bus::Bus;
pub use registers::Registers;
pub use decode::{decode, Condition, Instruction, OpcodeInfo, OperandKind, Operation, OPCODE_TABLE};
pub use execute::Cpu;
