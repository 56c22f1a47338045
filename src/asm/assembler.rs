//! Two-pass assembler for CDP1802 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! START:  LDI 0FFh    ; hex literals are digit-led with an h suffix
//!         PLO R5      ; register operands: R5, r5 or just 5
//! LOOP    DEC 5       ; a bare word in column 0 is a label too
//!         GLO 5
//!         BNZ LOOP    : a colon word also starts a comment
//!         OUT 4
//!         LBR START
//!
//!         ORG 40h     ; pad with zeros up to an address
//! TABLE:  DB 42
//! ```
//!
//! Pass 1 parses every line, assigns label addresses and sizes each
//! statement. Pass 2 encodes the statements against the complete symbol
//! table, so labels can be referenced before they are defined.

use crate::asm::mnemonics::{self, Mnemonic, OperandClass};
use crate::asm::symbols::SymbolTable;
use log::{debug, trace};
use thiserror::Error;

/// Largest image the 16-bit address space can hold.
pub const MAX_IMAGE_SIZE: usize = 0x10000;

/// Longest label the assembler accepts.
pub const MAX_LABEL_LEN: usize = 6;

/// Assemble source code to a binary image loadable at address 0.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    assemble_program(source).map(|program| program.bytes)
}

/// Assemble source code, keeping the symbol table alongside the image.
pub fn assemble_program(source: &str) -> Result<Program, AssemblerError> {
    let mut asm = Assembler::new();
    asm.first_pass(source)?;
    let bytes = asm.second_pass()?;
    debug!("assembled {} bytes, {} labels", bytes.len(), asm.symbols.len());
    Ok(Program {
        bytes,
        symbols: asm.symbols,
    })
}

/// The output of a successful assembly.
#[derive(Debug, Clone)]
pub struct Program {
    /// Binary image, address 0 first.
    pub bytes: Vec<u8>,
    pub symbols: SymbolTable,
}

/// A parsed operand, before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Number(u16),
    Label(String),
}

/// One instruction or directive, sized and placed by pass 1.
#[derive(Debug)]
struct Statement {
    line: usize,
    address: u16,
    mnemonic: &'static Mnemonic,
    operand: Option<Operand>,
}

/// The words of one source line, comments removed.
#[derive(Debug, Default, PartialEq, Eq)]
struct Words<'a> {
    label: Option<&'a str>,
    mnemonic: Option<&'a str>,
    operand: Option<&'a str>,
}

/// The assembler state.
struct Assembler {
    /// Address of the next emitted byte.
    pc: usize,
    symbols: SymbolTable,
    statements: Vec<Statement>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            pc: 0,
            symbols: SymbolTable::new(),
            statements: Vec::new(),
        }
    }

    fn first_pass(&mut self, source: &str) -> Result<(), AssemblerError> {
        for (index, text) in source.lines().enumerate() {
            let line = index + 1;
            let words = split_line(text, line)?;

            if let Some(label) = words.label {
                self.define_label(label, line)?;
            }

            if let Some(name) = words.mnemonic {
                self.add_statement(name, words.operand, line)?;
            }
        }
        Ok(())
    }

    fn define_label(&mut self, label: &str, line: usize) -> Result<(), AssemblerError> {
        if !is_label(label) {
            return Err(AssemblerError::SyntaxError {
                line,
                message: format!("invalid label `{}`", label),
            });
        }
        if self.pc >= MAX_IMAGE_SIZE {
            return Err(AssemblerError::ProgramTooLarge { line });
        }
        trace!("label {} = {:04X}", label, self.pc);
        self.symbols
            .define(label, self.pc as u16, line)
            .map_err(|_| AssemblerError::DuplicateLabel {
                line,
                label: label.to_ascii_uppercase(),
            })
    }

    fn add_statement(&mut self, name: &str, operand: Option<&str>, line: usize) -> Result<(), AssemblerError> {
        if !is_mnemonic_shaped(name) {
            return Err(AssemblerError::SyntaxError {
                line,
                message: format!("invalid mnemonic `{}`", name),
            });
        }
        let mnemonic = mnemonics::lookup(name).ok_or_else(|| AssemblerError::UnknownMnemonic {
            line,
            mnemonic: name.to_ascii_uppercase(),
        })?;
        let operand = parse_operand(mnemonic, operand, line)?;

        let size = match (mnemonic.class, &operand) {
            (OperandClass::Origin, Some(Operand::Number(target))) => {
                let target = *target as usize;
                if target < self.pc {
                    return Err(AssemblerError::ValueOutOfRange {
                        line,
                        value: format!("{:04X}h is below the current address {:04X}h", target, self.pc),
                    });
                }
                target - self.pc
            }
            (OperandClass::Origin, _) => {
                return Err(AssemblerError::SyntaxError {
                    line,
                    message: "ORG needs a numeric address".into(),
                });
            }
            (class, _) => class.size() as usize,
        };

        if self.pc + size > MAX_IMAGE_SIZE {
            return Err(AssemblerError::ProgramTooLarge { line });
        }

        self.statements.push(Statement {
            line,
            address: self.pc as u16,
            mnemonic,
            operand,
        });
        self.pc += size;
        Ok(())
    }

    fn second_pass(&self) -> Result<Vec<u8>, AssemblerError> {
        let mut output = Vec::with_capacity(self.pc);

        for stmt in &self.statements {
            debug_assert_eq!(output.len(), stmt.address as usize);
            let opcode = stmt.mnemonic.opcode;
            match stmt.mnemonic.class {
                OperandClass::None => output.push(opcode),
                OperandClass::Register | OperandClass::Device => {
                    let nibble = self.resolve(stmt)?;
                    output.push(opcode | (nibble as u8 & 0x0F));
                }
                OperandClass::Byte => {
                    let value = self.resolve(stmt)?;
                    output.push(opcode);
                    output.push(value as u8);
                }
                OperandClass::Word => {
                    let [high, low] = self.resolve(stmt)?.to_be_bytes();
                    output.extend_from_slice(&[opcode, high, low]);
                }
                OperandClass::Data => {
                    let value = self.resolve(stmt)?;
                    output.push(value as u8);
                }
                OperandClass::Origin => {
                    let target = self.resolve(stmt)? as usize;
                    output.resize(target, 0);
                }
            }
        }

        Ok(output)
    }

    /// Value of a statement's operand against the complete symbol table.
    fn resolve(&self, stmt: &Statement) -> Result<u16, AssemblerError> {
        match &stmt.operand {
            Some(Operand::Number(value)) => Ok(*value),
            Some(Operand::Label(label)) => {
                self.symbols
                    .address_of(label)
                    .ok_or_else(|| AssemblerError::UndefinedLabel {
                        line: stmt.line,
                        label: label.to_ascii_uppercase(),
                    })
            }
            None => Err(AssemblerError::MissingOperand {
                line: stmt.line,
                mnemonic: stmt.mnemonic.name.to_string(),
            }),
        }
    }
}

/// Split a line into label, mnemonic and operand.
fn split_line(text: &str, line: usize) -> Result<Words<'_>, AssemblerError> {
    let code = text.split(';').next().unwrap_or("");
    let in_column_zero = code.starts_with(|c: char| !c.is_whitespace());
    let mut words: Vec<&str> = code.split_whitespace().collect();

    // A line starting with `:` is all comment
    if words.first().is_some_and(|w| w.starts_with(':')) {
        words.clear();
    }

    let mut label = None;
    if let Some(&first) = words.first() {
        if let Some((name, rest)) = first.split_once(':') {
            label = Some(name);
            if rest.is_empty() {
                words.remove(0);
            } else {
                words[0] = rest;
            }
        }
    }

    // Past the label, any `:` opens a trailing comment, even inside a word
    if let Some(pos) = words.iter().position(|w| w.contains(':')) {
        let kept = words[pos].split(':').next().unwrap_or("");
        if kept.is_empty() {
            words.truncate(pos);
        } else {
            words[pos] = kept;
            words.truncate(pos + 1);
        }
    }

    if label.is_none()
        && in_column_zero
        && words.len() >= 2
        && mnemonics::lookup(words[0]).is_none()
        && is_mnemonic_shaped(words[1])
    {
        label = Some(words[0]);
        words.remove(0);
    }

    if words.len() > 2 {
        return Err(AssemblerError::SyntaxError {
            line,
            message: format!("unexpected `{}`", words[2]),
        });
    }

    Ok(Words {
        label,
        mnemonic: words.first().copied(),
        operand: words.get(1).copied(),
    })
}

fn parse_operand(mnemonic: &Mnemonic, text: Option<&str>, line: usize) -> Result<Option<Operand>, AssemblerError> {
    let text = match (mnemonic.class, text) {
        (OperandClass::None, None) => return Ok(None),
        (OperandClass::None, Some(text)) => {
            return Err(AssemblerError::SyntaxError {
                line,
                message: format!("{} takes no operand, found `{}`", mnemonic.name, text),
            });
        }
        (_, None) => {
            return Err(AssemblerError::MissingOperand {
                line,
                mnemonic: mnemonic.name.to_string(),
            });
        }
        (_, Some(text)) => text,
    };

    match mnemonic.class {
        OperandClass::Register => {
            let register = parse_register(text, line)?;
            // LDN R0 would encode as 00, which is IDL
            if mnemonic.opcode == 0x00 && register == 0 {
                return Err(AssemblerError::ValueOutOfRange {
                    line,
                    value: format!("{} R0 (00 is IDL)", mnemonic.name),
                });
            }
            Ok(Some(Operand::Number(register as u16)))
        }
        OperandClass::Device => parse_device(text, line).map(|d| Some(Operand::Number(d as u16))),
        _ => parse_value(text, line).map(Some),
    }
}

/// `R5`, `r5`, `5`, `A`: one hex digit with an optional R prefix.
fn parse_register(text: &str, line: usize) -> Result<u8, AssemblerError> {
    let digit = match text.len() {
        2 if text.starts_with(['R', 'r']) => &text[1..],
        _ => text,
    };
    let mut chars = digit.chars();
    match (chars.next().and_then(|c| c.to_digit(16)), chars.next()) {
        (Some(register), None) => Ok(register as u8),
        _ => Err(AssemblerError::SyntaxError {
            line,
            message: format!("register 0-F expected, found `{}`", text),
        }),
    }
}

/// Device lines 1-7.
fn parse_device(text: &str, line: usize) -> Result<u8, AssemblerError> {
    match parse_literal(text, line)? {
        Some(device @ 1..=7) => Ok(device as u8),
        Some(_) => Err(AssemblerError::ValueOutOfRange {
            line,
            value: format!("device `{}` (1-7)", text),
        }),
        None => Err(AssemblerError::SyntaxError {
            line,
            message: format!("device number 1-7 expected, found `{}`", text),
        }),
    }
}

fn parse_value(text: &str, line: usize) -> Result<Operand, AssemblerError> {
    if let Some(value) = parse_literal(text, line)? {
        return Ok(Operand::Number(value));
    }
    if is_label(text) {
        return Ok(Operand::Label(text.to_string()));
    }
    Err(AssemblerError::SyntaxError {
        line,
        message: format!("invalid operand `{}`", text),
    })
}

/// Parse a digit-led literal: decimal, `0FFh` or `0xFF`.
///
/// Returns `Ok(None)` when the text is not digit-led (a label).
fn parse_literal(text: &str, line: usize) -> Result<Option<u16>, AssemblerError> {
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(None);
    }

    let (digits, radix) = if let Some(hex) = text.strip_suffix(['h', 'H']) {
        (hex, 16)
    } else if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else {
        (text, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(AssemblerError::SyntaxError {
            line,
            message: format!("invalid number `{}`", text),
        });
    }

    match u32::from_str_radix(digits, radix) {
        Ok(value) if value <= 0xFFFF => Ok(Some(value as u16)),
        _ => Err(AssemblerError::ValueOutOfRange {
            line,
            value: text.to_string(),
        }),
    }
}

/// Letter first, then up to five letters, digits, `.` or `_`.
fn is_label(text: &str) -> bool {
    text.len() <= MAX_LABEL_LEN
        && text.starts_with(|c: char| c.is_ascii_alphabetic())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

/// Letter first, two to four letters or digits.
fn is_mnemonic_shaped(text: &str) -> bool {
    (2..=4).contains(&text.len())
        && text.starts_with(|c: char| c.is_ascii_alphabetic())
        && text.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Errors that can occur during assembly.
///
/// Every variant carries the 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("missing operand on line {line}: {mnemonic} needs one")]
    MissingOperand { line: usize, mnemonic: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: String },

    #[error("program too large on line {line}: image exceeds 64K")]
    ProgramTooLarge { line: usize },
}

impl AssemblerError {
    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            AssemblerError::SyntaxError { line, .. }
            | AssemblerError::UnknownMnemonic { line, .. }
            | AssemblerError::DuplicateLabel { line, .. }
            | AssemblerError::UndefinedLabel { line, .. }
            | AssemblerError::MissingOperand { line, .. }
            | AssemblerError::ValueOutOfRange { line, .. }
            | AssemblerError::ProgramTooLarge { line } => *line,
        }
    }
}
