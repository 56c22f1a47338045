//! # COSMAC ELF Emulator
//!
//! An instruction-level emulator of the RCA CDP1802 microprocessor, with a
//! mnemonic assembler and a model of the COSMAC ELF hobby computer.
//!
//! The CPU talks to the outside world only through the [`Bus`] trait, so
//! any host can be attached:
//!
//! ```
//! use cosmac::{assemble, Elf};
//!
//! let program = assemble("START: SEQ\n  BR START").unwrap();
//! let mut elf = Elf::default();
//! elf.load_program(&program).unwrap();
//! elf.set_run(true);
//! elf.frame();
//! assert!(elf.led());
//! ```

pub mod cpu;
pub mod asm;
pub mod elf;
pub mod config;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Bus, Cpu, Instruction, Registers};
pub use asm::{assemble, disassemble, AssemblerError, ImageError, Program};
pub use elf::{Elf, ElfBus, MemoryError, Mode};
pub use config::{ConfigError, MachineConfig};
