//! The COSMAC ELF memory and front panel, seen from the CPU.

use crate::cpu::Bus;
use crate::config::DEFAULT_MEMORY_SIZE;
use log::{trace, warn};
use thiserror::Error;

/// Device line wired to the toggle switches and hex display.
pub const PANEL_PORT: u8 = 4;

/// ELF RAM plus the panel latches the CPU can reach.
#[derive(Clone)]
pub struct ElfBus {
    memory: Vec<u8>,
    /// Eight data toggle switches, bit 0 = switch 0.
    switches: u8,
    /// IN push button, wired to EF4.
    in_button: bool,
    /// Memory protect switch.
    memory_protect: bool,
    /// Two-digit hex display latch.
    display: u8,
    /// Q LED.
    led: bool,
}

impl ElfBus {
    /// Create a bus with `memory_size` bytes of zeroed RAM.
    pub fn new(memory_size: usize) -> Self {
        Self {
            memory: vec![0; memory_size],
            switches: 0,
            in_button: false,
            memory_protect: false,
            display: 0,
            led: false,
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    /// Copy bytes straight into RAM, bypassing memory protect.
    pub fn load(&mut self, start: usize, bytes: &[u8]) -> Result<(), MemoryError> {
        let available = self.memory.len().saturating_sub(start);
        if start > self.memory.len() || bytes.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: bytes.len(),
                available,
            });
        }
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Zero all of RAM.
    pub fn clear(&mut self) {
        self.memory.fill(0);
    }

    pub fn switches(&self) -> u8 {
        self.switches
    }

    pub fn set_switches(&mut self, value: u8) {
        self.switches = value;
    }

    /// Flip one data switch (0-7).
    pub fn set_switch(&mut self, index: u8, on: bool) {
        let mask = 1 << (index & 0x07);
        if on {
            self.switches |= mask;
        } else {
            self.switches &= !mask;
        }
    }

    pub fn in_button(&self) -> bool {
        self.in_button
    }

    pub fn set_in_button(&mut self, pressed: bool) {
        self.in_button = pressed;
    }

    pub fn memory_protect(&self) -> bool {
        self.memory_protect
    }

    pub fn set_memory_protect(&mut self, on: bool) {
        self.memory_protect = on;
    }

    /// Value shown on the hex display.
    pub fn display(&self) -> u8 {
        self.display
    }

    pub fn led(&self) -> bool {
        self.led
    }
}

impl Default for ElfBus {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl Bus for ElfBus {
    fn read(&self, addr: u16) -> u8 {
        let value = self.memory.get(addr as usize).copied().unwrap_or(0);
        trace!("read  {:04X} -> {:02X}", addr, value);
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        if self.memory_protect {
            warn!("memory protect: write of {:02X} to {:04X} dropped", value, addr);
        } else if let Some(cell) = self.memory.get_mut(addr as usize) {
            trace!("write {:04X} <- {:02X}", addr, value);
            *cell = value;
        } else {
            warn!("write of {:02X} to {:04X} is outside RAM, dropped", value, addr);
        }
        // The display follows the byte now stored at the address
        self.display = self.read(addr);
    }

    fn input(&mut self, device: u8) -> u8 {
        if device == PANEL_PORT {
            self.switches
        } else {
            0
        }
    }

    fn output(&mut self, device: u8, value: u8) {
        if device == PANEL_PORT {
            self.display = value;
        }
    }

    fn ef4(&self) -> bool {
        self.in_button
    }

    fn set_q(&mut self, q: bool) {
        self.led = q;
    }
}

impl std::fmt::Debug for ElfBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElfBus")
            .field("memory_size", &self.memory.len())
            .field("switches", &format_args!("{:02X}", self.switches))
            .field("in_button", &self.in_button)
            .field("memory_protect", &self.memory_protect)
            .field("display", &format_args!("{:02X}", self.display))
            .field("led", &self.led)
            .finish()
    }
}

/// Errors from direct RAM access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program too large: {size} bytes, {available} available")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range() {
        let mut bus = ElfBus::new(256);
        bus.write(0x0100, 0x55);
        assert_eq!(bus.read(0x0100), 0);
        assert_eq!(bus.display(), 0);
        assert_eq!(bus.memory().len(), 256);
    }

    #[test]
    fn test_write_latches_display() {
        let mut bus = ElfBus::default();
        bus.write(0x10, 0xA5);
        assert_eq!(bus.read(0x10), 0xA5);
        assert_eq!(bus.display(), 0xA5);
    }

    #[test]
    fn test_memory_protect_drops_writes() {
        let mut bus = ElfBus::default();
        bus.write(0x20, 0x11);
        bus.set_memory_protect(true);
        bus.write(0x20, 0x22);
        assert_eq!(bus.read(0x20), 0x11);
        // the display shows what is actually stored
        assert_eq!(bus.display(), 0x11);
    }

    #[test]
    fn test_panel_port() {
        let mut bus = ElfBus::default();
        bus.set_switch(0, true);
        bus.set_switch(7, true);
        assert_eq!(bus.input(4), 0x81);
        assert_eq!(bus.input(3), 0);
        bus.output(4, 0x3C);
        assert_eq!(bus.display(), 0x3C);
        bus.output(2, 0xFF);
        assert_eq!(bus.display(), 0x3C);
        bus.set_switch(0, false);
        assert_eq!(bus.switches(), 0x80);
    }

    #[test]
    fn test_in_button_is_ef4() {
        let mut bus = ElfBus::default();
        assert!(!bus.ef4());
        bus.set_in_button(true);
        assert!(bus.ef4());
        assert!(!bus.ef1());
    }

    #[test]
    fn test_load() {
        let mut bus = ElfBus::new(4);
        bus.set_memory_protect(true);
        bus.load(1, &[1, 2, 3]).unwrap();
        assert_eq!(bus.memory(), &[0, 1, 2, 3]);
        assert_eq!(
            bus.load(2, &[1, 2, 3]),
            Err(MemoryError::ProgramTooLarge { size: 3, available: 2 })
        );
        bus.clear();
        assert_eq!(bus.memory(), &[0; 4]);
    }
}
