//! Property-based tests for CPU invariants.
//!
//! These tests use proptest to check the arithmetic flag rules, register
//! wraparound and cycle accounting over the whole input space.

use cosmac::cpu::{Cpu, OPCODE_TABLE};
use cosmac::ElfBus;
use proptest::prelude::*;

/// Load `bytes` at 0 into a full 64K machine, reset, and run `steps`
/// instructions.
fn run_program(bytes: &[u8], steps: usize) -> Cpu<ElfBus> {
    let mut bus = ElfBus::new(0x10000);
    bus.load(0, bytes).unwrap();
    let mut cpu = Cpu::new(bus);
    cpu.reset();
    for _ in 0..steps {
        cpu.step();
    }
    cpu
}

/// Program prefix leaving DF = `carry` (LDI 80h/00h; SHL).
fn set_df(carry: bool) -> Vec<u8> {
    vec![0xF8, if carry { 0x80 } else { 0x00 }, 0xFE]
}

// ========== Arithmetic Flag Rules ==========

proptest! {
    /// Property: ADI leaves the low byte of the sum in D and the carry in DF
    #[test]
    fn prop_add_carry(a in 0u8..=255u8, b in 0u8..=255u8) {
        let cpu = run_program(&[0xF8, a, 0xFC, b], 2);
        let sum = a as u16 + b as u16;
        prop_assert_eq!(cpu.regs().d(), sum as u8);
        prop_assert_eq!(cpu.regs().df(), sum > 0xFF);
    }

    /// Property: ADCI adds DF as carry-in
    #[test]
    fn prop_add_with_carry(a in 0u8..=255u8, b in 0u8..=255u8, carry in any::<bool>()) {
        let mut program = set_df(carry);
        program.extend_from_slice(&[0xF8, a, 0x7C, b]);
        let cpu = run_program(&program, 4);
        let sum = a as u16 + b as u16 + carry as u16;
        prop_assert_eq!(cpu.regs().d(), sum as u8);
        prop_assert_eq!(cpu.regs().df(), sum > 0xFF);
    }

    /// Property: SMI computes D - M with DF set when no borrow occurred
    #[test]
    fn prop_subtract_memory_borrow_flag(a in 0u8..=255u8, b in 0u8..=255u8) {
        let cpu = run_program(&[0xF8, a, 0xFF, b], 2);
        prop_assert_eq!(cpu.regs().d(), a.wrapping_sub(b));
        prop_assert_eq!(cpu.regs().df(), a >= b);
    }

    /// Property: SDI computes M - D
    #[test]
    fn prop_subtract_d(a in 0u8..=255u8, b in 0u8..=255u8) {
        let cpu = run_program(&[0xF8, a, 0xFD, b], 2);
        prop_assert_eq!(cpu.regs().d(), b.wrapping_sub(a));
        prop_assert_eq!(cpu.regs().df(), b >= a);
    }

    /// Property: SMBI subtracts an extra 1 when DF is clear
    #[test]
    fn prop_subtract_with_borrow(a in 0u8..=255u8, b in 0u8..=255u8, carry in any::<bool>()) {
        let mut program = set_df(carry);
        program.extend_from_slice(&[0xF8, a, 0x7F, b]);
        let cpu = run_program(&program, 4);
        let result = a as i16 - b as i16 - (!carry) as i16;
        prop_assert_eq!(cpu.regs().d(), result as u8);
        prop_assert_eq!(cpu.regs().df(), result >= 0);
    }

    /// Property: SHRC rotates DF into bit 7 and bit 0 into DF
    #[test]
    fn prop_ring_shift_right(a in 0u8..=255u8, carry in any::<bool>()) {
        let mut program = set_df(carry);
        program.extend_from_slice(&[0xF8, a, 0x76]);
        let cpu = run_program(&program, 4);
        prop_assert_eq!(cpu.regs().d(), (a >> 1) | ((carry as u8) << 7));
        prop_assert_eq!(cpu.regs().df(), a & 0x01 != 0);
    }

    /// Property: SHLC rotates DF into bit 0 and bit 7 into DF
    #[test]
    fn prop_ring_shift_left(a in 0u8..=255u8, carry in any::<bool>()) {
        let mut program = set_df(carry);
        program.extend_from_slice(&[0xF8, a, 0x7E]);
        let cpu = run_program(&program, 4);
        prop_assert_eq!(cpu.regs().d(), (a << 1) | carry as u8);
        prop_assert_eq!(cpu.regs().df(), a & 0x80 != 0);
    }
}

// ========== Register Wraparound ==========

proptest! {
    /// Property: INC and DEC wrap around 16 bits
    #[test]
    fn prop_inc_dec_wrap(value in 0u16..=0xFFFF, reg in 3u8..=15u8) {
        let [high, low] = value.to_be_bytes();
        // LDI hi; PHI r; LDI lo; PLO r; INC r; INC r; DEC r
        let program = [
            0xF8, high, 0xB0 | reg,
            0xF8, low, 0xA0 | reg,
            0x10 | reg, 0x10 | reg, 0x20 | reg,
        ];
        let cpu = run_program(&program, 7);
        prop_assert_eq!(cpu.regs().r(reg), value.wrapping_add(1));
    }

    /// Property: PHI/PLO assemble a register and GHI reads the high half back
    #[test]
    fn prop_register_halves(value in 0u16..=0xFFFF, reg in 3u8..=15u8) {
        let [high, low] = value.to_be_bytes();
        let program = [0xF8, high, 0xB0 | reg, 0xF8, low, 0xA0 | reg, 0x90 | reg];
        let cpu = run_program(&program, 4);
        prop_assert_eq!(cpu.regs().r(reg), value);
        prop_assert_eq!(cpu.regs().d(), low);
        let cpu = run_program(&program, 5);
        prop_assert_eq!(cpu.regs().d(), high);
    }
}

// ========== Cycle Accounting ==========

proptest! {
    /// Property: a step costs exactly the table cycles, 3 for the C group
    #[test]
    fn prop_step_cost_matches_table(opcode in 0u8..=255u8, op1 in 0u8..=255u8, op2 in 0u8..=255u8) {
        let mut cpu = run_program(&[opcode, op1, op2], 0);
        let cost = cpu.step();
        prop_assert_eq!(cost, OPCODE_TABLE[opcode as usize].cycles as u32);
        prop_assert_eq!(cost, if opcode >> 4 == 0xC { 3 } else { 2 });
        prop_assert_eq!(cpu.cycles(), cost as u64);
    }

    /// Property: run overshoots its budget by less than one instruction
    #[test]
    fn prop_run_overshoot(budget in 0u32..5000, seed in prop::collection::vec(0u8..=255u8, 0..64)) {
        let mut cpu = run_program(&seed, 0);
        let consumed = cpu.run(budget);
        prop_assert!(consumed >= budget);
        prop_assert!(consumed < budget + 3);
        if budget == 0 {
            prop_assert_eq!(consumed, 0);
        }
    }
}
