//! Disassembler for CDP1802 programs.
//!
//! Converts binary images back to assembler source. Every line it produces
//! assembles back to the same bytes.

use crate::cpu::decode::{decode, OperandKind, Operation};

/// Disassemble the instruction at the start of `bytes`.
///
/// Returns the text and the number of bytes consumed. An instruction whose
/// inline operand runs past the end of `bytes` is rendered as a data byte.
pub fn disassemble_instruction(bytes: &[u8]) -> (String, usize) {
    let Some(&opcode) = bytes.first() else {
        return (String::new(), 0);
    };
    let instr = decode(opcode);
    let info = instr.info();

    if instr.operation() == Operation::Reserved || bytes.len() < instr.size() {
        return (format!("DB {}", hex(opcode as u16, 2)), 1);
    }

    let text = match info.operand {
        OperandKind::None => info.mnemonic.to_string(),
        OperandKind::Register => format!("{} R{:X}", info.mnemonic, instr.n()),
        OperandKind::Device => format!("{} {}", info.mnemonic, instr.n() & 0x07),
        OperandKind::Byte => format!("{} {}", info.mnemonic, hex(bytes[1] as u16, 2)),
        OperandKind::Word => {
            let target = u16::from_be_bytes([bytes[1], bytes[2]]);
            format!("{} {}", info.mnemonic, hex(target, 4))
        }
    };
    (text, instr.size())
}

/// Disassemble an image loaded at `origin` into a listing.
///
/// Each line reads `AAAA: BB BB BB  MNEMONIC operand`.
pub fn disassemble(image: &[u8], origin: u16) -> String {
    let mut output = String::new();
    let mut offset = 0;

    while offset < image.len() {
        let (text, size) = disassemble_instruction(&image[offset..]);
        let encoding: Vec<String> = image[offset..offset + size]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        let address = origin.wrapping_add(offset as u16);
        output.push_str(&format!("{:04X}: {:<8}  {}\n", address, encoding.join(" "), text));
        offset += size;
    }

    output
}

/// Hex literal in the assembler's digit-led `h` form.
fn hex(value: u16, width: usize) -> String {
    let digits = format!("{:0width$X}", value, width = width);
    if digits.starts_with(|c: char| c.is_ascii_alphabetic()) {
        format!("0{}h", digits)
    } else {
        format!("{}h", digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    #[test]
    fn test_disassemble_immediate() {
        assert_eq!(disassemble_instruction(&[0xF8, 0xFF]), ("LDI 0FFh".to_string(), 2));
        assert_eq!(disassemble_instruction(&[0xF8, 0x05]), ("LDI 05h".to_string(), 2));
    }

    #[test]
    fn test_disassemble_register_and_device() {
        assert_eq!(disassemble_instruction(&[0x8A]).0, "GLO RA");
        assert_eq!(disassemble_instruction(&[0x64]).0, "OUT 4");
        assert_eq!(disassemble_instruction(&[0x6C]).0, "INP 4");
        assert_eq!(disassemble_instruction(&[0x00]).0, "IDL");
    }

    #[test]
    fn test_disassemble_long_branch() {
        assert_eq!(disassemble_instruction(&[0xC0, 0x12, 0x34]), ("LBR 1234h".to_string(), 3));
        assert_eq!(disassemble_instruction(&[0xC4]), ("NOP".to_string(), 1));
    }

    #[test]
    fn test_reserved_and_truncated() {
        assert_eq!(disassemble_instruction(&[0x68]), ("DB 068h".to_string(), 1));
        assert_eq!(disassemble_instruction(&[0xC0, 0x12]), ("DB 0C0h".to_string(), 1));
        assert_eq!(disassemble_instruction(&[]), (String::new(), 0));
    }

    #[test]
    fn test_listing() {
        let listing = disassemble(&[0xF8, 0x05, 0x30, 0x00, 0xC0, 0x80, 0x00], 0x80);
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "0080: F8 05     LDI 05h");
        assert_eq!(lines[1], "0082: 30 00     BR 00h");
        assert_eq!(lines[2], "0084: C0 80 00  LBR 8000h");
    }

    #[test]
    fn test_every_opcode_reassembles() {
        for opcode in 0..=255u8 {
            let bytes = [opcode, 0x12, 0x34];
            let (text, size) = disassemble_instruction(&bytes);
            let source = format!("  {}", text);
            assert_eq!(assemble(&source).unwrap(), &bytes[..size], "{:02X}: {}", opcode, text);
        }
    }
}
