//! Symbols and the symbol table used to intern variable names

use crate::{Result, SymbolicError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Dense index of a symbol inside a [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Assumptions attached to a symbol
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolAttrs {
    pub real: bool,
    pub positive: bool,
    pub integer: bool,
    pub nonnegative: bool,
}

/// A named variable.
///
/// Identity is the name alone: two symbols with the same name and different
/// attributes compare equal, hash equal and order by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub attrs: SymbolAttrs,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            attrs: SymbolAttrs::default(),
        }
    }

    pub fn with_attrs(name: impl Into<String>, attrs: SymbolAttrs) -> Self {
        Symbol {
            name: name.into(),
            attrs,
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Interning table mapping names to symbols
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name with default attributes, returning the existing id if
    /// the name is already known
    pub fn intern(&mut self, name: &str) -> Result<SymbolId> {
        self.intern_with_attrs(name, SymbolAttrs::default())
    }

    /// Intern a name with attributes.
    ///
    /// Re-interning a known name with different attributes is rejected.
    pub fn intern_with_attrs(&mut self, name: &str, attrs: SymbolAttrs) -> Result<SymbolId> {
        if name.is_empty() {
            return Err(SymbolicError::InvalidOperation(
                "symbol names must be non-empty".to_string(),
            ));
        }
        if let Some(&id) = self.by_name.get(name) {
            let existing = &self.symbols[id.0 as usize];
            if existing.attrs != attrs && attrs != SymbolAttrs::default() {
                return Err(SymbolicError::InvalidOperation(format!(
                    "symbol '{}' already declared with different assumptions",
                    name
                )));
            }
            return Ok(id);
        }

        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol::with_attrs(name, attrs));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Resolve a name to its symbol
    pub fn resolve(&self, name: &str) -> Result<&Symbol> {
        self.lookup(name)
            .and_then(|id| self.get(id))
            .ok_or_else(|| SymbolicError::UndefinedSymbol(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }
}
