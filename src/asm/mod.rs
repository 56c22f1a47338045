//! Assembler and disassembler for CDP1802 programs.
//!
//! This module provides:
//! - A two-pass assembler (text → binary image)
//! - A disassembler (binary image → assembler text)
//! - Raw image loading and saving

pub mod mnemonics;
pub mod symbols;
pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, assemble_program, AssemblerError, Program};
pub use disasm::{disassemble, disassemble_instruction};
pub use image::{load_image, load_program, save_image, ImageError};
pub use symbols::{Symbol, SymbolTable};
