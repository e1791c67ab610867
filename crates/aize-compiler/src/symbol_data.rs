//! `SymbolData`: the one extension struct the declaration and resolution
//! passes populate, registered once in [`aize_core::ir::Ir::extensions`].
//!
//! The original design called for one small extension struct per annotated
//! node category (`ExprData`, `StmtData`, `FunctionData`, ...), each its own
//! registry entry. Consolidated here into a single struct with one
//! [`SlotMap`] per category instead: the extension registry's job is to let
//! the scheduler ask "has resolution populated its data yet" as a single
//! type-presence check, which a single `SymbolData` satisfies exactly as
//! well as a dozen scattered ones, with far less boilerplate.

use aize_core::ir::extensions::SlotMap;
use aize_core::ir::{AggFuncId, ExprId, FuncId, IrSourceId, ParamId, StmtId, StructId, UnionId};
use aize_core::symbol::{NamespaceSymbolId, SymbolTable, TypeSymbolId, VariableSymbolId};

/// What created a namespace, so the mangling pass can dispatch on a typed
/// tag instead of pattern-matching the namespace's own name string.
#[derive(Clone, Copy, Debug)]
pub enum NamespaceRole {
    Program,
    Source(IrSourceId),
    Struct(StructId),
    Union(UnionId),
    FunctionBody(FuncId),
    AggFuncBody(AggFuncId),
}

#[derive(Clone, Debug)]
pub struct FunctionData {
    pub symbol: VariableSymbolId,
    pub namespace: NamespaceSymbolId,
    pub attrs: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AggFuncData {
    pub symbol: VariableSymbolId,
    pub namespace: NamespaceSymbolId,
}

/// Payload specific to a handful of expression kinds; everything else is
/// covered by [`ExprData`]'s common `return_type`/`is_lval` pair.
#[derive(Clone, Debug)]
pub enum ExprExtra {
    FieldAccess { field_index: u32 },
    MethodAccess { method: VariableSymbolId },
    Arithmetic { is_signed: bool },
    Compare { is_signed: bool },
    Is { union_ty: TypeSymbolId, variant_ty: TypeSymbolId },
    CastInt { from_bits: u32, to_bits: u32, is_signed: bool },
    CastUnion { from_variant: TypeSymbolId, to_union: TypeSymbolId },
}

#[derive(Clone, Debug)]
pub struct ExprData {
    pub return_type: TypeSymbolId,
    pub is_lval: bool,
    pub extra: Option<ExprExtra>,
}

#[derive(Clone, Copy, Debug)]
pub struct StmtData {
    pub is_terminal: bool,
}

/// The symbol/namespace table plus every per-node-category annotation the
/// declaration and resolution passes write. One instance lives in
/// [`aize_core::ir::Ir::extensions`] per compilation.
pub struct SymbolData {
    pub table: SymbolTable,
    pub program_ns: NamespaceSymbolId,

    namespace_role: SlotMap<NamespaceSymbolId, NamespaceRole>,
    source_ns: SlotMap<IrSourceId, NamespaceSymbolId>,
    struct_ty: SlotMap<StructId, TypeSymbolId>,
    struct_ns: SlotMap<StructId, NamespaceSymbolId>,
    union_ty: SlotMap<UnionId, TypeSymbolId>,
    union_ns: SlotMap<UnionId, NamespaceSymbolId>,
    func_data: SlotMap<FuncId, FunctionData>,
    agg_func_data: SlotMap<AggFuncId, AggFuncData>,
    param_symbol: SlotMap<ParamId, VariableSymbolId>,
    expr_data: SlotMap<ExprId, ExprData>,
    stmt_data: SlotMap<StmtId, StmtData>,
    mangled_value: SlotMap<VariableSymbolId, String>,
    mangled_type: SlotMap<TypeSymbolId, String>,
}

impl SymbolData {
    pub fn new(mut table: SymbolTable) -> Self {
        let program_ns = table.push_namespace(
            "program".to_string(),
            aize_core::source::Position::Builtin,
            None,
        );
        let mut data = SymbolData {
            table,
            program_ns,
            namespace_role: SlotMap::new(),
            source_ns: SlotMap::new(),
            struct_ty: SlotMap::new(),
            struct_ns: SlotMap::new(),
            union_ty: SlotMap::new(),
            union_ns: SlotMap::new(),
            func_data: SlotMap::new(),
            agg_func_data: SlotMap::new(),
            param_symbol: SlotMap::new(),
            expr_data: SlotMap::new(),
            stmt_data: SlotMap::new(),
            mangled_value: SlotMap::new(),
            mangled_type: SlotMap::new(),
        };
        data.namespace_role.set(program_ns, NamespaceRole::Program);
        data
    }

    pub fn namespace_role(&self, ns: NamespaceSymbolId) -> &NamespaceRole {
        self.namespace_role.get(ns)
    }

    pub fn set_source_namespace(&mut self, source: IrSourceId, ns: NamespaceSymbolId) {
        self.source_ns.set(source, ns);
        self.namespace_role.set(ns, NamespaceRole::Source(source));
    }

    pub fn source_namespace(&self, source: IrSourceId) -> NamespaceSymbolId {
        *self.source_ns.get(source)
    }

    pub fn set_struct(&mut self, id: StructId, ty: TypeSymbolId, ns: NamespaceSymbolId) {
        self.struct_ty.set(id, ty);
        self.struct_ns.set(id, ns);
        self.namespace_role.set(ns, NamespaceRole::Struct(id));
    }

    pub fn struct_type(&self, id: StructId) -> TypeSymbolId {
        *self.struct_ty.get(id)
    }

    pub fn struct_namespace(&self, id: StructId) -> NamespaceSymbolId {
        *self.struct_ns.get(id)
    }

    pub fn set_union(&mut self, id: UnionId, ty: TypeSymbolId, ns: NamespaceSymbolId) {
        self.union_ty.set(id, ty);
        self.union_ns.set(id, ns);
        self.namespace_role.set(ns, NamespaceRole::Union(id));
    }

    pub fn union_type(&self, id: UnionId) -> TypeSymbolId {
        *self.union_ty.get(id)
    }

    pub fn union_namespace(&self, id: UnionId) -> NamespaceSymbolId {
        *self.union_ns.get(id)
    }

    pub fn set_function(&mut self, id: FuncId, data: FunctionData) {
        self.func_data.set(id, data);
    }

    pub fn function(&self, id: FuncId) -> &FunctionData {
        self.func_data.get(id)
    }

    pub fn set_function_body_namespace(&mut self, func: FuncId, ns: NamespaceSymbolId) {
        self.namespace_role.set(ns, NamespaceRole::FunctionBody(func));
    }

    pub fn set_agg_func(&mut self, id: AggFuncId, data: AggFuncData) {
        self.agg_func_data.set(id, data);
    }

    pub fn agg_func(&self, id: AggFuncId) -> &AggFuncData {
        self.agg_func_data.get(id)
    }

    pub fn set_agg_func_body_namespace(&mut self, agg_func: AggFuncId, ns: NamespaceSymbolId) {
        self.namespace_role
            .set(ns, NamespaceRole::AggFuncBody(agg_func));
    }

    pub fn set_param(&mut self, id: ParamId, symbol: VariableSymbolId) {
        self.param_symbol.set(id, symbol);
    }

    pub fn param(&self, id: ParamId) -> VariableSymbolId {
        *self.param_symbol.get(id)
    }

    pub fn set_expr(&mut self, id: ExprId, data: ExprData) {
        self.expr_data.set(id, data);
    }

    pub fn expr(&self, id: ExprId) -> &ExprData {
        self.expr_data.get(id)
    }

    pub fn set_stmt(&mut self, id: StmtId, data: StmtData) {
        self.stmt_data.set(id, data);
    }

    pub fn stmt(&self, id: StmtId) -> &StmtData {
        self.stmt_data.get(id)
    }

    pub fn set_mangled_value(&mut self, id: VariableSymbolId, name: String) {
        self.mangled_value.set(id, name);
    }

    pub fn mangled_value(&self, id: VariableSymbolId) -> &str {
        self.mangled_value.get(id)
    }

    pub fn set_mangled_type(&mut self, id: TypeSymbolId, name: String) {
        self.mangled_type.set(id, name);
    }

    pub fn mangled_type(&self, id: TypeSymbolId) -> &str {
        self.mangled_type.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_namespace_is_registered_with_the_program_role() {
        let data = SymbolData::new(SymbolTable::new());
        assert!(matches!(
            data.namespace_role(data.program_ns),
            NamespaceRole::Program
        ));
    }

    #[test]
    #[should_panic(expected = "read before it was set")]
    fn reading_an_unset_expr_slot_panics() {
        let data = SymbolData::new(SymbolTable::new());
        data.expr(ExprId::from_raw(0));
    }
}
