//! COSMAC ELF reference host.
//!
//! The 1976 Popular Electronics ELF: a CDP1802 with 256 bytes of RAM,
//! eight data toggle switches, an IN push button on EF4, a two-digit hex
//! display on port 4 and an LED on Q.

pub mod bus;
pub mod panel;

pub use bus::{ElfBus, MemoryError, PANEL_PORT};
pub use panel::{Elf, Mode};
