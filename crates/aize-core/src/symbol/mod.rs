//! Symbols: variables, types (with structural/nominal subtyping) and the
//! namespace tree that scopes them.

pub mod namespace;
pub mod types;

pub use namespace::{
    NamespaceSymbol, NamespaceSymbolId, SymbolError, SymbolKind, SymbolTable, VariableSymbol,
    VariableSymbolId,
};
pub use types::{is_super_of, FieldEntry, TypeSymbol, TypeSymbolId, TypeSymbols};
