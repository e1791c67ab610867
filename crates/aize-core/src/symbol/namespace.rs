//! Variable symbols and the namespace tree that holds them.
//!
//! A namespace has three disjoint dictionaries (values, types, nested
//! namespaces) and an optional parent. Lookups walk the parent chain
//! outward unless told to stay local. A namespace created for something
//! that should be reachable through a dotted path (e.g. a nested struct's
//! own namespace) is inserted into its parent's `namespaces` dict; one
//! created purely to give a scope somewhere to live (e.g. a function body)
//! is not, even though it still links to that parent for lookups.

use crate::source::Position;
use crate::symbol::types::TypeSymbolId;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VariableSymbolId(u32);

impl VariableSymbolId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NamespaceSymbolId(u32);

impl NamespaceSymbolId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: TypeSymbolId,
    pub pos: Position,
}

/// What kind of thing is being looked up or defined, purely for error
/// messages.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    Value,
    Type,
    Namespace,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SymbolKind::Value => "value",
            SymbolKind::Type => "type",
            SymbolKind::Namespace => "namespace",
        })
    }
}

#[derive(Error, Debug, Clone)]
pub enum SymbolError {
    #[error("{kind} '{name}' is already defined")]
    DuplicateSymbol {
        kind: SymbolKind,
        name: String,
        previous: Position,
        new: Position,
    },
    #[error("no {kind} named '{name}' found")]
    FailedLookup {
        kind: SymbolKind,
        name: String,
        pos: Position,
    },
}

#[derive(Clone, Debug)]
pub struct NamespaceSymbol {
    pub name: String,
    pub pos: Position,
    pub parent: Option<NamespaceSymbolId>,
    values: IndexMap<String, VariableSymbolId>,
    types: IndexMap<String, TypeSymbolId>,
    namespaces: IndexMap<String, NamespaceSymbolId>,
}

impl NamespaceSymbol {
    pub fn new(name: String, pos: Position, parent: Option<NamespaceSymbolId>) -> Self {
        NamespaceSymbol {
            name,
            pos,
            parent,
            values: IndexMap::new(),
            types: IndexMap::new(),
            namespaces: IndexMap::new(),
        }
    }

    pub fn local_value(&self, name: &str) -> Option<VariableSymbolId> {
        self.values.get(name).copied()
    }

    pub fn local_type(&self, name: &str) -> Option<TypeSymbolId> {
        self.types.get(name).copied()
    }

    pub fn local_namespace(&self, name: &str) -> Option<NamespaceSymbolId> {
        self.namespaces.get(name).copied()
    }
}

/// Owns the three symbol arenas (values, types, namespaces) and implements
/// namespace-chain lookup/define. Kept as one struct, rather than three
/// independent arenas, because defining into a namespace needs mutable
/// access to both the namespace's local dict and the arena the new symbol
/// is pushed into.
#[derive(Default)]
pub struct SymbolTable {
    variables: Vec<VariableSymbol>,
    types: Vec<super::types::TypeSymbol>,
    namespaces: Vec<NamespaceSymbol>,
}

impl super::types::TypeSymbols for SymbolTable {
    fn type_symbol(&self, id: TypeSymbolId) -> &super::types::TypeSymbol {
        &self.types[id.index()]
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(&self, id: VariableSymbolId) -> &VariableSymbol {
        &self.variables[id.index()]
    }

    pub fn type_symbol(&self, id: TypeSymbolId) -> &super::types::TypeSymbol {
        &self.types[id.index()]
    }

    pub fn type_symbol_mut(&mut self, id: TypeSymbolId) -> &mut super::types::TypeSymbol {
        &mut self.types[id.index()]
    }

    pub fn namespace(&self, id: NamespaceSymbolId) -> &NamespaceSymbol {
        &self.namespaces[id.index()]
    }

    pub fn push_type(&mut self, ty: super::types::TypeSymbol) -> TypeSymbolId {
        let id = TypeSymbolId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn push_namespace(
        &mut self,
        name: String,
        pos: Position,
        parent: Option<NamespaceSymbolId>,
    ) -> NamespaceSymbolId {
        let id = NamespaceSymbolId::from_raw(self.namespaces.len() as u32);
        self.namespaces.push(NamespaceSymbol::new(name, pos, parent));
        id
    }

    pub fn push_variable(&mut self, var: VariableSymbol) -> VariableSymbolId {
        let id = VariableSymbolId::from_raw(self.variables.len() as u32);
        self.variables.push(var);
        id
    }

    /// Define a value in `ns`. `as_name` lets a symbol be registered under a
    /// different name than its own (used for qualified imports); `visible`
    /// controls whether it is registered in `ns`'s dict at all (an invisible
    /// definition still exists and can be referenced by id, just not found
    /// by name lookup through `ns`).
    pub fn define_value(
        &mut self,
        ns: NamespaceSymbolId,
        as_name: &str,
        name: String,
        ty: TypeSymbolId,
        pos: Position,
        visible: bool,
    ) -> Result<VariableSymbolId, SymbolError> {
        if visible {
            if let Some(existing) = self.namespaces[ns.index()].local_value(as_name) {
                let previous = self.variables[existing.index()].pos.clone();
                return Err(SymbolError::DuplicateSymbol {
                    kind: SymbolKind::Value,
                    name: as_name.to_string(),
                    previous,
                    new: pos,
                });
            }
        }
        let id = self.push_variable(VariableSymbol { name, ty, pos });
        if visible {
            self.namespaces[ns.index()]
                .values
                .insert(as_name.to_string(), id);
        }
        Ok(id)
    }

    pub fn define_type(
        &mut self,
        ns: NamespaceSymbolId,
        as_name: &str,
        ty: super::types::TypeSymbol,
        pos: Position,
        visible: bool,
    ) -> Result<TypeSymbolId, SymbolError> {
        if visible {
            if self.namespaces[ns.index()].local_type(as_name).is_some() {
                // A type symbol carries no declaring position of its own
                // (see `TypeSymbol`), so the duplicate note points at the
                // new definition rather than the earlier one.
                return Err(SymbolError::DuplicateSymbol {
                    kind: SymbolKind::Type,
                    name: as_name.to_string(),
                    previous: pos.clone(),
                    new: pos,
                });
            }
        }
        let id = self.push_type(ty);
        if visible {
            self.namespaces[ns.index()]
                .types
                .insert(as_name.to_string(), id);
        }
        Ok(id)
    }

    /// Create a child namespace of `parent`. `visible` registers it in
    /// `parent`'s namespace dict under `name`; `is_parent` additionally sets
    /// the child's own `.parent` link to `parent` for lookup purposes. Both
    /// default true for ordinary nested namespaces (struct/union bodies);
    /// function-body scopes pass `visible: false` so they remain reachable
    /// only via the IR, never by a dotted path.
    pub fn define_namespace(
        &mut self,
        parent: NamespaceSymbolId,
        name: String,
        pos: Position,
        visible: bool,
        is_parent: bool,
    ) -> Result<NamespaceSymbolId, SymbolError> {
        if visible {
            if let Some(existing) = self.namespaces[parent.index()].local_namespace(&name) {
                let previous = self.namespaces[existing.index()].pos.clone();
                return Err(SymbolError::DuplicateSymbol {
                    kind: SymbolKind::Namespace,
                    name,
                    previous,
                    new: pos,
                });
            }
        }
        let parent_link = if is_parent { Some(parent) } else { None };
        let id = self.push_namespace(name.clone(), pos, parent_link);
        if visible {
            self.namespaces[parent.index()].namespaces.insert(name, id);
        }
        Ok(id)
    }

    /// Register an already-created value symbol under `as_name` inside
    /// `ns`, without allocating a new [`VariableSymbol`]. A function's
    /// parameters exist (and carry a fixed type) from the moment the
    /// function is declared, but are only reachable by name inside its own
    /// body namespace once resolution enters it; this is what makes the
    /// same `VariableSymbolId` show up in both places.
    pub fn bind_value(
        &mut self,
        ns: NamespaceSymbolId,
        as_name: &str,
        id: VariableSymbolId,
        pos: Position,
    ) -> Result<(), SymbolError> {
        if let Some(existing) = self.namespaces[ns.index()].local_value(as_name) {
            let previous = self.variables[existing.index()].pos.clone();
            return Err(SymbolError::DuplicateSymbol {
                kind: SymbolKind::Value,
                name: as_name.to_string(),
                previous,
                new: pos,
            });
        }
        self.namespaces[ns.index()]
            .values
            .insert(as_name.to_string(), id);
        Ok(())
    }

    /// Bind an already-registered namespace under a new name inside `ns`,
    /// without creating a new backing [`NamespaceSymbol`]. Used for import
    /// aliasing: the imported source's namespace already exists, the import
    /// just needs to make it reachable under the name the importer wrote.
    pub fn alias_namespace(
        &mut self,
        ns: NamespaceSymbolId,
        as_name: &str,
        target: NamespaceSymbolId,
        pos: Position,
    ) -> Result<(), SymbolError> {
        if let Some(existing) = self.namespaces[ns.index()].local_namespace(as_name) {
            let previous = self.namespaces[existing.index()].pos.clone();
            return Err(SymbolError::DuplicateSymbol {
                kind: SymbolKind::Namespace,
                name: as_name.to_string(),
                previous,
                new: pos,
            });
        }
        self.namespaces[ns.index()]
            .namespaces
            .insert(as_name.to_string(), target);
        Ok(())
    }

    /// Look up a value by name, starting at `ns` and walking outward
    /// through parent links unless `here_only` is set.
    pub fn lookup_value(
        &self,
        ns: NamespaceSymbolId,
        name: &str,
        here_only: bool,
        pos: Position,
    ) -> Result<VariableSymbolId, SymbolError> {
        let mut current = Some(ns);
        while let Some(cur) = current {
            if let Some(id) = self.namespaces[cur.index()].local_value(name) {
                return Ok(id);
            }
            if here_only {
                break;
            }
            current = self.namespaces[cur.index()].parent;
        }
        Err(SymbolError::FailedLookup {
            kind: SymbolKind::Value,
            name: name.to_string(),
            pos,
        })
    }

    pub fn lookup_type(
        &self,
        ns: NamespaceSymbolId,
        name: &str,
        here_only: bool,
        pos: Position,
    ) -> Result<TypeSymbolId, SymbolError> {
        let mut current = Some(ns);
        while let Some(cur) = current {
            if let Some(id) = self.namespaces[cur.index()].local_type(name) {
                return Ok(id);
            }
            if here_only {
                break;
            }
            current = self.namespaces[cur.index()].parent;
        }
        Err(SymbolError::FailedLookup {
            kind: SymbolKind::Type,
            name: name.to_string(),
            pos,
        })
    }

    pub fn lookup_namespace(
        &self,
        ns: NamespaceSymbolId,
        name: &str,
        here_only: bool,
        pos: Position,
    ) -> Result<NamespaceSymbolId, SymbolError> {
        let mut current = Some(ns);
        while let Some(cur) = current {
            if let Some(id) = self.namespaces[cur.index()].local_namespace(name) {
                return Ok(id);
            }
            if here_only {
                break;
            }
            current = self.namespaces[cur.index()].parent;
        }
        Err(SymbolError::FailedLookup {
            kind: SymbolKind::Namespace,
            name: name.to_string(),
            pos,
        })
    }

    pub fn root_of(&self, mut ns: NamespaceSymbolId) -> NamespaceSymbolId {
        while let Some(parent) = self.namespaces[ns.index()].parent {
            ns = parent;
        }
        ns
    }
}
