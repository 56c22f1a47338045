//! Property-based tests for the assembler and disassembler.
//!
//! These tests verify assembler invariants like:
//! - Number format equivalence (decimal, `h` suffix and `0x` give the same bytes)
//! - Label resolution at any address, forward or backward
//! - No panics on arbitrary input
//! - Disassembler output reassembling to the original bytes

use cosmac::asm::{assemble, assemble_program, disassemble, disassemble_instruction};
use proptest::prelude::*;

// ========== Number Format Equivalence Tests ==========

proptest! {
    /// Property: every literal form of a byte assembles identically
    #[test]
    fn prop_byte_formats_equivalent(value in 0u8..=255u8) {
        let dec = assemble(&format!("  LDI {}", value)).unwrap();
        let suffix = assemble(&format!("  LDI 0{:X}h", value)).unwrap();
        let prefix = assemble(&format!("  LDI 0x{:x}", value)).unwrap();
        prop_assert_eq!(&dec, &vec![0xF8, value]);
        prop_assert_eq!(&dec, &suffix);
        prop_assert_eq!(&dec, &prefix);
    }

    /// Property: long branch targets are emitted high byte first
    #[test]
    fn prop_word_operand_big_endian(target in 0u16..=0xFFFF) {
        let bytes = assemble(&format!("  LBNZ 0{:X}h", target)).unwrap();
        let [high, low] = target.to_be_bytes();
        prop_assert_eq!(bytes, vec![0xCA, high, low]);
    }

    /// Property: register operands accept R-prefixed and bare digits
    #[test]
    fn prop_register_forms(reg in 0u8..=15u8) {
        let prefixed = assemble(&format!("  GHI R{:X}", reg)).unwrap();
        let lower = assemble(&format!("  GHI r{:x}", reg)).unwrap();
        let bare = assemble(&format!("  GHI {:X}", reg)).unwrap();
        prop_assert_eq!(&prefixed, &vec![0x90 | reg]);
        prop_assert_eq!(&prefixed, &lower);
        prop_assert_eq!(&prefixed, &bare);
    }
}

// ========== Symbol Resolution Tests ==========

proptest! {
    /// Property: a forward long branch resolves past any amount of padding
    #[test]
    fn prop_forward_label(padding in 0usize..300) {
        let mut source = String::from("  LBR TARGET\n");
        for _ in 0..padding {
            source.push_str("  NOP\n");
        }
        source.push_str("TARGET: IDL\n");

        let program = assemble_program(&source).unwrap();
        let target = 3 + padding as u16;
        prop_assert_eq!(program.symbols.address_of("target"), Some(target));
        let [high, low] = target.to_be_bytes();
        prop_assert_eq!(&program.bytes[..3], &[0xC0, high, low][..]);
        prop_assert_eq!(program.bytes.len(), target as usize + 1);
    }

    /// Property: a backward short branch emits the low byte of the label
    #[test]
    fn prop_backward_short_branch(padding in 0usize..300) {
        let mut source = String::new();
        for _ in 0..padding {
            source.push_str("  NOP\n");
        }
        source.push_str("LOOP: BR LOOP\n");

        let bytes = assemble(&source).unwrap();
        prop_assert_eq!(bytes[padding], 0x30);
        prop_assert_eq!(bytes[padding + 1], padding as u8);
    }
}

// ========== Robustness Tests ==========

proptest! {
    /// Property: arbitrary text never panics and assembles deterministically
    #[test]
    fn prop_no_panic_deterministic(source in ".{0,200}") {
        let first = assemble(&source);
        let second = assemble(&source);
        prop_assert_eq!(first, second);
    }

    /// Property: arbitrary images disassemble to source that reassembles
    #[test]
    fn prop_disassembly_reassembles(image in prop::collection::vec(0u8..=255u8, 1..128)) {
        let mut source = String::new();
        let mut offset = 0;
        while offset < image.len() {
            let (text, size) = disassemble_instruction(&image[offset..]);
            source.push_str("  ");
            source.push_str(&text);
            source.push('\n');
            offset += size;
        }
        prop_assert_eq!(assemble(&source).unwrap(), image.clone());

        // The listing has one line per instruction
        let lines = disassemble(&image, 0).lines().count();
        prop_assert_eq!(lines, source.lines().count());
    }
}
