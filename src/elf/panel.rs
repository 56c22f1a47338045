//! The COSMAC ELF machine: CPU, RAM and front panel.
//!
//! The RUN and LOAD toggles select the machine mode:
//!
//! | RUN | LOAD | Mode                                  |
//! |-----|------|---------------------------------------|
//! | off | off  | reset (entered on the transition)     |
//! | off | on   | load: IN deposits the switches by DMA |
//! | on  | off  | run                                   |
//! | on  | on   | wait                                  |

use crate::config::{ConfigError, MachineConfig};
use crate::cpu::{Cpu, Registers};
use crate::elf::bus::{ElfBus, MemoryError};
use log::debug;

/// Machine mode selected by the RUN and LOAD switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Reset,
    Load,
    Run,
    Wait,
}

impl Mode {
    fn from_switches(run: bool, load: bool) -> Self {
        match (run, load) {
            (false, false) => Mode::Reset,
            (false, true) => Mode::Load,
            (true, false) => Mode::Run,
            (true, true) => Mode::Wait,
        }
    }
}

/// A complete ELF.
#[derive(Debug)]
pub struct Elf {
    cpu: Cpu<ElfBus>,
    config: MachineConfig,
    run: bool,
    load: bool,
}

impl Elf {
    /// Power up an ELF with the given configuration.
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: MachineConfig) -> Self {
        let mut cpu = Cpu::new(ElfBus::new(config.memory_size));
        cpu.reset();
        Self {
            cpu,
            config,
            run: false,
            load: false,
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_switches(self.run, self.load)
    }

    pub fn set_run(&mut self, on: bool) {
        self.set_control(on, self.load);
    }

    pub fn set_load(&mut self, on: bool) {
        self.set_control(self.run, on);
    }

    fn set_control(&mut self, run: bool, load: bool) {
        let before = self.mode();
        self.run = run;
        self.load = load;
        let after = self.mode();
        if before != after {
            debug!("mode {:?} -> {:?}", before, after);
            if after == Mode::Reset {
                self.cpu.reset();
            }
        }
    }

    pub fn set_memory_protect(&mut self, on: bool) {
        self.cpu.bus_mut().set_memory_protect(on);
    }

    pub fn set_switches(&mut self, value: u8) {
        self.cpu.bus_mut().set_switches(value);
    }

    pub fn switches(&self) -> u8 {
        self.cpu.bus().switches()
    }

    /// Push the IN button. In load mode this deposits the switches at R0.
    pub fn press_in(&mut self) {
        self.cpu.bus_mut().set_in_button(true);
        if self.mode() == Mode::Load {
            let byte = self.switches();
            self.cpu.dma_in(byte);
        }
    }

    pub fn release_in(&mut self) {
        self.cpu.bus_mut().set_in_button(false);
    }

    /// Run one frame's worth of machine cycles. Returns cycles consumed,
    /// 0 unless the machine is in run mode.
    pub fn frame(&mut self) -> u32 {
        if self.mode() != Mode::Run {
            return 0;
        }
        self.cpu.run(self.config.cycles_per_frame())
    }

    /// Execute one instruction in run mode.
    pub fn step(&mut self) -> u32 {
        if self.mode() != Mode::Run {
            return 0;
        }
        self.cpu.step()
    }

    /// Toggle a program in from address 0, the way an operator would:
    /// enter load mode, deposit each byte with IN, and leave load mode.
    ///
    /// Memory protect is lifted for the load. The machine ends in reset.
    pub fn load_program(&mut self, bytes: &[u8]) -> Result<(), MemoryError> {
        let available = self.cpu.bus().memory_size();
        if bytes.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: bytes.len(),
                available,
            });
        }

        let protect = self.cpu.bus().memory_protect();
        self.set_memory_protect(false);
        self.set_control(false, false);
        self.set_load(true);
        for &byte in bytes {
            self.set_switches(byte);
            self.press_in();
            self.release_in();
        }
        self.set_load(false);
        self.set_memory_protect(protect);
        debug!("loaded {} bytes", bytes.len());
        Ok(())
    }

    /// Power cycle: clear RAM and the switches, reset the CPU.
    pub fn power_on(&mut self) {
        *self = Self::with_valid_config(self.config);
    }

    /// Q LED.
    pub fn led(&self) -> bool {
        self.cpu.bus().led()
    }

    /// Hex display.
    pub fn display(&self) -> u8 {
        self.cpu.bus().display()
    }

    pub fn memory(&self) -> &[u8] {
        self.cpu.bus().memory()
    }

    pub fn regs(&self) -> &Registers {
        self.cpu.regs()
    }

    pub fn cpu(&self) -> &Cpu<ElfBus> {
        &self.cpu
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }
}

impl Default for Elf {
    fn default() -> Self {
        Self::with_valid_config(MachineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;
    use crate::cpu::bus::Bus;

    fn running(source: &str) -> Elf {
        let mut elf = Elf::default();
        elf.load_program(&assemble(source).unwrap()).unwrap();
        elf.set_run(true);
        elf
    }

    #[test]
    fn test_modes() {
        let mut elf = Elf::default();
        assert_eq!(elf.mode(), Mode::Reset);
        elf.set_load(true);
        assert_eq!(elf.mode(), Mode::Load);
        elf.set_run(true);
        assert_eq!(elf.mode(), Mode::Wait);
        elf.set_load(false);
        assert_eq!(elf.mode(), Mode::Run);
    }

    #[test]
    fn test_load_mode_deposits_switches() {
        let mut elf = Elf::default();
        elf.set_load(true);
        for byte in [0x7B, 0x00] {
            elf.set_switches(byte);
            elf.press_in();
            elf.release_in();
        }
        assert_eq!(&elf.memory()[..2], &[0x7B, 0x00]);
        assert_eq!(elf.regs().r(0), 2);
        assert_eq!(elf.display(), 0x00);
    }

    #[test]
    fn test_in_outside_load_mode_only_sets_ef4() {
        let mut elf = Elf::default();
        elf.set_switches(0x55);
        elf.press_in();
        assert!(elf.cpu().bus().ef4());
        assert_eq!(elf.memory()[0], 0);
        elf.release_in();
        assert!(!elf.cpu().bus().ef4());
    }

    #[test]
    fn test_leaving_run_resets() {
        let mut elf = running("START: SEQ\n  BR START");
        elf.step();
        assert!(elf.led());
        assert_eq!(elf.regs().r(0), 1);
        elf.set_run(false);
        assert_eq!(elf.mode(), Mode::Reset);
        assert!(!elf.led());
        assert_eq!(elf.regs().r(0), 0);
    }

    #[test]
    fn test_frame_runs_configured_cycles() {
        let mut elf = running("LOOP: BR LOOP");
        let cycles = elf.frame();
        assert!(cycles >= 3668 && cycles < 3670);
        elf.set_load(true);
        assert_eq!(elf.frame(), 0);
        assert_eq!(elf.step(), 0);
    }

    #[test]
    fn test_switches_to_display() {
        // Echo the switches to the display until IN is pressed
        let source = "
              LDI 80h
              PLO 2
              SEX 2
        LOOP: INP 4
              OUT 4
              DEC 2
              B4 DONE
              BR LOOP
        DONE: SEQ
              IDL";
        let mut elf = running(source);
        elf.set_switches(0x42);
        for _ in 0..20 {
            elf.step();
        }
        assert_eq!(elf.display(), 0x42);
        assert!(!elf.led());
        elf.press_in();
        elf.frame();
        assert!(elf.led());
        assert!(elf.cpu().is_idle());
    }

    #[test]
    fn test_memory_protect_during_run() {
        let mut elf = running("  LDI 0AAh\n  PLO 3\n  STR 3\n  IDL");
        elf.set_memory_protect(true);
        elf.frame();
        assert_eq!(elf.memory()[0xAA], 0x00);
    }

    #[test]
    fn test_load_program_lifts_memory_protect() {
        let mut elf = Elf::default();
        elf.set_memory_protect(true);
        elf.load_program(&[1, 2, 3]).unwrap();
        assert_eq!(&elf.memory()[..3], &[1, 2, 3]);
        assert!(elf.cpu().bus().memory_protect());
        assert_eq!(elf.mode(), Mode::Reset);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut elf = Elf::default();
        assert!(matches!(
            elf.load_program(&[0; 257]),
            Err(MemoryError::ProgramTooLarge { size: 257, available: 256 })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = MachineConfig {
            memory_size: 0,
            ..MachineConfig::default()
        };
        assert!(Elf::new(config).is_err());
    }

    #[test]
    fn test_power_on_clears_memory() {
        let mut elf = running("  SEQ\n  IDL");
        elf.frame();
        elf.power_on();
        assert!(elf.memory().iter().all(|&b| b == 0));
        assert!(!elf.led());
        assert_eq!(elf.mode(), Mode::Reset);
    }
}
