//! The bus contract between the CDP1802 core and its host.
//!
//! The core never owns memory or devices. Every memory access, I/O
//! transfer, external flag sample and Q change goes through a [`Bus`]
//! implementation supplied by the host (a test harness, the ELF machine
//! in [`crate::elf`], a terminal front end).

/// Host capabilities consumed by the CPU.
///
/// Only `read` and `write` are mandatory. The remaining methods default
/// to an unconnected pin: inputs read as 0, outputs are ignored and the
/// external flags are low.
pub trait Bus {
    /// Read a byte from memory.
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to memory.
    fn write(&mut self, addr: u16, value: u8);

    /// Input a byte from the device selected by the N lines (0-7).
    fn input(&mut self, _device: u8) -> u8 {
        0
    }

    /// Output a byte to the device selected by the N lines (0-7).
    fn output(&mut self, _device: u8, _value: u8) {}

    /// External flag 1.
    fn ef1(&self) -> bool {
        false
    }

    /// External flag 2.
    fn ef2(&self) -> bool {
        false
    }

    /// External flag 3.
    fn ef3(&self) -> bool {
        false
    }

    /// External flag 4.
    fn ef4(&self) -> bool {
        false
    }

    /// The Q output line changed (or was rewritten with the same value).
    fn set_q(&mut self, _q: bool) {}
}

impl<T: Bus + ?Sized> Bus for &mut T {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        (**self).write(addr, value)
    }

    fn input(&mut self, device: u8) -> u8 {
        (**self).input(device)
    }

    fn output(&mut self, device: u8, value: u8) {
        (**self).output(device, value)
    }

    fn ef1(&self) -> bool {
        (**self).ef1()
    }

    fn ef2(&self) -> bool {
        (**self).ef2()
    }

    fn ef3(&self) -> bool {
        (**self).ef3()
    }

    fn ef4(&self) -> bool {
        (**self).ef4()
    }

    fn set_q(&mut self, q: bool) {
        (**self).set_q(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat([u8; 16]);

    impl Bus for Flat {
        fn read(&self, addr: u16) -> u8 {
            self.0.get(addr as usize).copied().unwrap_or(0)
        }

        fn write(&mut self, addr: u16, value: u8) {
            if let Some(cell) = self.0.get_mut(addr as usize) {
                *cell = value;
            }
        }
    }

    #[test]
    fn test_default_pins_are_unconnected() {
        let mut bus = Flat([0; 16]);
        assert_eq!(bus.input(4), 0);
        assert!(!bus.ef1() && !bus.ef2() && !bus.ef3() && !bus.ef4());
        bus.output(4, 0x55);
        bus.set_q(true);
    }

    fn poke<B: Bus>(mut bus: B, addr: u16, value: u8) -> u8 {
        bus.write(addr, value);
        bus.read(addr)
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut bus = Flat([0; 16]);
        assert_eq!(poke(&mut bus, 3, 0xAB), 0xAB);
        assert_eq!(bus.read(3), 0xAB);
        assert_eq!(bus.read(100), 0);
    }
}
