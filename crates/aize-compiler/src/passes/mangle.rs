//! `Mangle`: the last pass in the pipeline. Walks the IR in program order
//! and gives every externally-visible declaration a stable, flat name —
//! functions, methods, their parameters, and struct/union types and
//! variants — by concatenating length-prefixed segments outward from
//! `"aize"`.
//!
//! Runs last because the scheme folds in each source's position in
//! [`Ir::program`] (`_S{n}`, assigned by first-sight order), which is only
//! final once lowering and import resolution have both finished; nothing
//! downstream of this pass needs to reference a symbol by its original,
//! unmangled name again.
//!
//! A top-level [`FunctionNode`]'s `.name` is mutated in place, matching
//! that field's own doc comment; struct and union declarations keep their
//! surface name on the node itself; their mangled form lives only in
//! [`SymbolData::mangled_type`].

use crate::diagnostics::{Diagnostics, Fatal};
use crate::pass::Pass;
use crate::symbol_data::SymbolData;
use aize_core::ir::{AggFuncId, FuncId, Ir, ParamId, StructId, TopLevelId, UnionId};
use aize_core::symbol::TypeSymbol;

pub struct Mangle;

impl Pass for Mangle {
    fn name(&self) -> &'static str {
        "mangle"
    }

    fn required_passes(&self) -> &'static [&'static str] {
        &["init_symbols", "declare_types", "declare_functions", "resolve"]
    }

    fn run(&mut self, ir: &mut Ir, _diagnostics: &mut Diagnostics) -> Result<(), Fatal> {
        let mut data = ir
            .extensions
            .remove::<SymbolData>()
            .expect("init_symbols, declare_types, declare_functions and resolve ran first");
        let sources = ir.program.sources.clone();
        for (index, source_id) in sources.into_iter().enumerate() {
            let source_mangled = format!("aize_S{index}");
            let top_levels = ir.source(source_id).top_levels.clone();
            for top_level in top_levels {
                match top_level {
                    TopLevelId::Function(func_id) => mangle_function(ir, &mut data, func_id, &source_mangled),
                    TopLevelId::Struct(struct_id) => mangle_struct(ir, &mut data, struct_id, &source_mangled),
                    TopLevelId::Union(union_id) => mangle_union(ir, &mut data, union_id, &source_mangled),
                    TopLevelId::Import(_) => {}
                }
            }
        }
        ir.extensions.insert(data);
        Ok(())
    }
}

fn mangle_function(ir: &mut Ir, data: &mut SymbolData, func_id: FuncId, parent: &str) {
    let name = ir.function(func_id).name.clone();
    let mangled = format!("{parent}_F{}{}", name.len(), name);
    ir.function_mut(func_id).name = mangled.clone();
    let symbol = data.function(func_id).symbol;
    data.set_mangled_value(symbol, mangled.clone());
    let params = ir.function(func_id).params.clone();
    for param_id in params {
        mangle_param(ir, data, param_id, &mangled);
    }
}

fn mangle_agg_func(ir: &Ir, data: &mut SymbolData, agg_func_id: AggFuncId, parent: &str) {
    let name = ir.agg_func(agg_func_id).name.clone();
    let mangled = format!("{parent}_F{}{}", name.len(), name);
    let symbol = data.agg_func(agg_func_id).symbol;
    data.set_mangled_value(symbol, mangled.clone());
    let params = ir.agg_func(agg_func_id).params.clone();
    for param_id in params {
        mangle_param(ir, data, param_id, &mangled);
    }
}

fn mangle_param(ir: &Ir, data: &mut SymbolData, param_id: ParamId, parent: &str) {
    let name = ir.param(param_id).name.clone();
    let symbol = data.param(param_id);
    data.set_mangled_value(symbol, format!("{parent}_V{}{}", name.len(), name));
}

fn mangle_struct(ir: &Ir, data: &mut SymbolData, struct_id: StructId, parent: &str) {
    let name = ir.struct_(struct_id).name.clone();
    let ty_id = data.struct_type(struct_id);
    let mangled = format!("{parent}_T{}{}", name.len(), name);
    data.set_mangled_type(ty_id, mangled.clone());
    let funcs = ir.struct_(struct_id).funcs.clone();
    for agg_func_id in funcs {
        mangle_agg_func(ir, data, agg_func_id, &mangled);
    }
}

fn mangle_union(ir: &Ir, data: &mut SymbolData, union_id: UnionId, parent: &str) {
    let name = ir.union_(union_id).name.clone();
    let ty_id = data.union_type(union_id);
    let mangled = format!("{parent}_T{}{}", name.len(), name);
    data.set_mangled_type(ty_id, mangled.clone());
    if let TypeSymbol::Union { variants, .. } = data.table.type_symbol(ty_id).clone() {
        for (variant_name, variant_ty) in variants {
            data.set_mangled_type(variant_ty, format!("{mangled}_T{}{}", variant_name.len(), variant_name));
        }
    }
    let funcs = ir.union_(union_id).funcs.clone();
    for agg_func_id in funcs {
        mangle_agg_func(ir, data, agg_func_id, &mangled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostics, SinkConfig};
    use crate::passes::declare_functions::DeclareFunctions;
    use crate::passes::declare_types::DeclareTypes;
    use crate::passes::init_symbols::InitSymbols;
    use crate::passes::resolve::ResolveSymbols;
    use aize_core::ir::{
        ArithmeticOp, ExprKind, ExprNode, FuncAttrId, FunctionNode, ParamNode, SourceNode,
        StmtKind, StmtNode, TypeExprKind, TypeExprNode,
    };
    use aize_core::source::{Position, SourceKey, SourceRegistry};

    fn int32_type_expr(ir: &mut Ir) -> aize_core::ir::TypeExprId {
        ir.push_type_expr(TypeExprNode { kind: TypeExprKind::GetType { name: "int32".into() }, pos: Position::None })
    }

    fn run_prereqs(ir: &mut Ir, diagnostics: &mut Diagnostics) {
        InitSymbols.run(ir, diagnostics).unwrap();
        DeclareTypes.run(ir, diagnostics).unwrap();
        DeclareFunctions.run(ir, diagnostics).unwrap();
        ResolveSymbols.run(ir, diagnostics).unwrap();
    }

    fn one_source(ir: &mut Ir, top: TopLevelId) {
        let mut registry = SourceRegistry::new();
        let source_id = registry.get_or_insert(SourceKey::Name("t".into()), "t".into(), "").0;
        let id = ir.push_source(SourceNode { top_levels: vec![top], display_name: "t".into(), source_id });
        ir.program.sources.push(id);
    }

    /// `def f(x: int32) -> int32 { return x + 1; }` mangles to `aize_S0_F1f`,
    /// matching the worked example in the mangling rule's own write-up.
    #[test]
    fn top_level_function_mangles_to_source_scoped_name() {
        let mut ir = Ir::new();
        let param_ty = int32_type_expr(&mut ir);
        let param = ir.push_param(ParamNode { name: "x".into(), ty: param_ty, pos: Position::None });
        let ret = int32_type_expr(&mut ir);
        let x = ir.push_expr(ExprNode { kind: ExprKind::GetVar { name: "x".into() }, pos: Position::None });
        let one = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
        let sum = ir.push_expr(ExprNode {
            kind: ExprKind::Arithmetic { op: ArithmeticOp::Add, left: x, right: one },
            pos: Position::None,
        });
        let ret_stmt = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: sum }, pos: Position::None });
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![param],
            ret,
            body: vec![ret_stmt],
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        one_source(&mut ir, TopLevelId::Function(func_id));
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        run_prereqs(&mut ir, &mut diagnostics);
        Mangle.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(ir.function(func_id).name, "aize_S0_F1f");
        let data = ir.extensions.expect::<SymbolData>();
        let symbol = data.function(func_id).symbol;
        assert_eq!(data.mangled_value(symbol), "aize_S0_F1f");
        let param_symbol = data.param(param);
        assert_eq!(data.mangled_value(param_symbol), "aize_S0_F1f_V1x");
    }

    /// Two sources each declaring `f` get distinct mangled names from their
    /// own per-source counter, even though the unmangled names collide.
    #[test]
    fn two_sources_get_distinct_source_scoped_names() {
        let mut ir = Ir::new();
        let make_trivial_function = |ir: &mut Ir| {
            let ret = int32_type_expr(ir);
            let one = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
            let ret_stmt = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: one }, pos: Position::None });
            ir.push_function(FunctionNode {
                name: "f".into(),
                params: vec![],
                ret,
                body: vec![ret_stmt],
                attrs: Vec::<FuncAttrId>::new(),
                pos: Position::None,
            })
        };
        let first = make_trivial_function(&mut ir);
        let second = make_trivial_function(&mut ir);
        let mut registry = SourceRegistry::new();
        let a = registry.get_or_insert(SourceKey::Name("a".into()), "a".into(), "").0;
        let b = registry.get_or_insert(SourceKey::Name("b".into()), "b".into(), "").0;
        let source_a = ir.push_source(SourceNode {
            top_levels: vec![TopLevelId::Function(first)],
            display_name: "a".into(),
            source_id: a,
        });
        let source_b = ir.push_source(SourceNode {
            top_levels: vec![TopLevelId::Function(second)],
            display_name: "b".into(),
            source_id: b,
        });
        ir.program.sources.push(source_a);
        ir.program.sources.push(source_b);
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        run_prereqs(&mut ir, &mut diagnostics);
        Mangle.run(&mut ir, &mut diagnostics).unwrap();
        assert_eq!(ir.function(first).name, "aize_S0_F1f");
        assert_eq!(ir.function(second).name, "aize_S1_F1f");
    }
}
