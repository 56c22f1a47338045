//! Symbol table for assembler labels.

use std::collections::HashMap;

/// A defined label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: u16,
    /// Source line of the definition (1-based).
    pub line: usize,
}

/// Label -> address map, scoped to one assembly.
///
/// Names are stored upper-cased, so lookups ignore case.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a label.
    ///
    /// Returns the existing definition if the name is already taken.
    pub fn define(&mut self, name: &str, address: u16, line: usize) -> Result<(), &Symbol> {
        let key = name.to_ascii_uppercase();
        if self.symbols.contains_key(&key) {
            return Err(&self.symbols[&key]);
        }
        self.symbols.insert(
            key.clone(),
            Symbol {
                name: key,
                address,
                line,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(&name.to_ascii_uppercase())
    }

    pub fn address_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|s| s.address)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbols sorted by address, then name.
    pub fn sorted(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<_> = self.symbols.values().collect();
        symbols.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.name.cmp(&b.name)));
        symbols
    }
}
