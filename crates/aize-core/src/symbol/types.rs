//! Type symbols and structural/nominal subtyping between them.

use crate::source::Position;
use indexmap::IndexMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeSymbolId(u32);

impl TypeSymbolId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A declared field of a struct or a union variant's payload type, recorded
/// in declaration order.
#[derive(Clone, Debug)]
pub struct FieldEntry {
    pub ty: TypeSymbolId,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub enum TypeSymbol {
    /// A builtin or explicitly declared fixed-width integer. `bool` is
    /// represented as `Int { signed: false, bits: 1 }`; there is no
    /// separate single-bit signed type.
    Int { name: String, signed: bool, bits: u32 },
    Struct {
        name: String,
        fields: IndexMap<String, FieldEntry>,
        funcs: IndexMap<String, crate::symbol::namespace::VariableSymbolId>,
        pos: Position,
    },
    Union {
        name: String,
        /// Declaration-ordered map from variant name to its
        /// `UnionVariant` type symbol.
        variants: IndexMap<String, TypeSymbolId>,
        funcs: IndexMap<String, crate::symbol::namespace::VariableSymbolId>,
        pos: Position,
    },
    /// One variant of an enclosing union; reflexively its own subtype only.
    UnionVariant {
        name: String,
        index: u32,
        contains: TypeSymbolId,
        union: TypeSymbolId,
        pos: Position,
    },
    Tuple { items: Vec<TypeSymbolId> },
    Function { params: Vec<TypeSymbolId>, ret: TypeSymbolId },
    /// Stands in for a type that failed to resolve. Reading it never
    /// panics; it exists precisely so a single failure does not cascade
    /// into a wall of follow-on diagnostics.
    Errored,
}

impl TypeSymbol {
    pub fn name(&self) -> &str {
        match self {
            TypeSymbol::Int { name, .. } => name,
            TypeSymbol::Struct { name, .. } => name,
            TypeSymbol::Union { name, .. } => name,
            TypeSymbol::UnionVariant { name, .. } => name,
            TypeSymbol::Tuple { .. } => "<tuple>",
            TypeSymbol::Function { .. } => "<function>",
            TypeSymbol::Errored => "<errored>",
        }
    }
}

/// Minimal read access to the type-symbol arena, enough to drive
/// [`is_super_of`] without pulling in the whole symbol table module.
pub trait TypeSymbols {
    fn type_symbol(&self, id: TypeSymbolId) -> &TypeSymbol;
}

/// Structural subtyping test: is `sup` a supertype of `sub`?
///
/// - An errored `sub` always succeeds (poisoning is silent: once a type
///   failed to resolve, every further check against it is suppressed so a
///   single root-cause diagnostic does not cascade).
/// - An errored `sup` is never a supertype of anything else.
/// - `Int`: same signedness, `sub.bits <= sup.bits`.
/// - `UnionVariant`: reflexive only.
/// - `Union`: reflexive, plus supertype of each of its own variants.
/// - `Struct`: nominal (reflexive only — struct types are not structurally
///   compared).
/// - `Tuple`: structural, same arity, each item pairwise co-variant.
/// - `Function`: structural, same arity, parameters contravariant, return
///   type covariant.
pub fn is_super_of<T: TypeSymbols>(table: &T, sup_id: TypeSymbolId, sub_id: TypeSymbolId) -> bool {
    if matches!(table.type_symbol(sub_id), TypeSymbol::Errored) {
        return true;
    }
    let sup = table.type_symbol(sup_id);
    match sup {
        TypeSymbol::Errored => false,
        TypeSymbol::Int { signed, bits, .. } => match table.type_symbol(sub_id) {
            TypeSymbol::Int {
                signed: s2,
                bits: b2,
                ..
            } => s2 == signed && b2 <= bits,
            _ => false,
        },
        TypeSymbol::UnionVariant { .. } => sup_id == sub_id,
        TypeSymbol::Union { variants, .. } => {
            sup_id == sub_id || variants.values().any(|v| *v == sub_id)
        }
        TypeSymbol::Struct { .. } => sup_id == sub_id,
        TypeSymbol::Tuple { items } => match table.type_symbol(sub_id) {
            TypeSymbol::Tuple { items: items2 } => {
                items.len() == items2.len()
                    && items
                        .iter()
                        .zip(items2)
                        .all(|(a, b)| is_super_of(table, *a, *b))
            }
            _ => false,
        },
        TypeSymbol::Function { params, ret } => match table.type_symbol(sub_id) {
            TypeSymbol::Function {
                params: params2,
                ret: ret2,
            } => {
                params.len() == params2.len()
                    // parameters are contravariant: the sub-function must accept
                    // at least everything the super-function's callers can pass
                    && params
                        .iter()
                        .zip(params2)
                        .all(|(a, b)| is_super_of(table, *b, *a))
                    && is_super_of(table, *ret, *ret2)
            }
            _ => false,
        },
    }
}
