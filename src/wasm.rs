//! WebAssembly bindings for the COSMAC ELF emulator.
//!
//! This module provides JavaScript-friendly wrappers around the ELF model,
//! enough to drive a front panel from a browser page.

use wasm_bindgen::prelude::*;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_instruction;
use crate::cpu::Bus;
use crate::elf::Elf;
use crate::MachineConfig;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly ELF wrapper.
#[wasm_bindgen]
pub struct WasmElf {
    elf: Elf,
}

#[wasm_bindgen]
impl WasmElf {
    /// Create a stock 256-byte ELF.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { elf: Elf::default() }
    }

    /// Create an ELF from a JSON machine configuration.
    #[wasm_bindgen]
    pub fn with_config(json: &str) -> Result<WasmElf, JsError> {
        let config = MachineConfig::from_json(json)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        let elf = Elf::new(config)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(Self { elf })
    }

    /// Assemble source and toggle it into memory. Returns the byte count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let bytes = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_bytes(&bytes)?;
        Ok(bytes.len())
    }

    /// Toggle a raw image into memory.
    #[wasm_bindgen]
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), JsError> {
        self.elf.load_program(bytes)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Run one animation frame. Returns machine cycles consumed.
    #[wasm_bindgen]
    pub fn frame(&mut self) -> u32 {
        self.elf.frame()
    }

    /// Step one instruction in run mode. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> String {
        let bus = self.elf.cpu().bus();
        let pc = self.elf.cpu().pc();
        let bytes = [bus.read(pc), bus.read(pc.wrapping_add(1)), bus.read(pc.wrapping_add(2))];
        let (text, _) = disassemble_instruction(&bytes);
        self.elf.step();
        text
    }

    #[wasm_bindgen]
    pub fn set_run(&mut self, on: bool) {
        self.elf.set_run(on);
    }

    #[wasm_bindgen]
    pub fn set_load(&mut self, on: bool) {
        self.elf.set_load(on);
    }

    #[wasm_bindgen]
    pub fn set_memory_protect(&mut self, on: bool) {
        self.elf.set_memory_protect(on);
    }

    /// Set the eight data switches at once.
    #[wasm_bindgen]
    pub fn set_switches(&mut self, value: u8) {
        self.elf.set_switches(value);
    }

    #[wasm_bindgen]
    pub fn switches(&self) -> u8 {
        self.elf.switches()
    }

    #[wasm_bindgen]
    pub fn press_in(&mut self) {
        self.elf.press_in();
    }

    #[wasm_bindgen]
    pub fn release_in(&mut self) {
        self.elf.release_in();
    }

    /// Current mode: "reset", "load", "run" or "wait".
    #[wasm_bindgen]
    pub fn mode(&self) -> String {
        format!("{:?}", self.elf.mode()).to_lowercase()
    }

    #[wasm_bindgen]
    pub fn led(&self) -> bool {
        self.elf.led()
    }

    #[wasm_bindgen]
    pub fn display(&self) -> u8 {
        self.elf.display()
    }

    #[wasm_bindgen]
    pub fn is_idle(&self) -> bool {
        self.elf.cpu().is_idle()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.elf.cpu().cycles()
    }

    #[wasm_bindgen]
    pub fn memory_at(&self, address: u16) -> u8 {
        self.elf.cpu().bus().read(address)
    }

    /// Copy of all of RAM.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u8> {
        self.elf.memory().to_vec()
    }

    /// Get registers as JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.elf.regs())
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmElf {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the image size in bytes.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let bytes = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(bytes.len())
}

/// Disassemble the instruction at the start of `bytes`.
#[wasm_bindgen]
pub fn wasm_disassemble(bytes: &[u8]) -> String {
    disassemble_instruction(bytes).0
}
