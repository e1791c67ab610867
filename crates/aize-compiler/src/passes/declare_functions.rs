//! `DeclareFunctions`: registers every function/aggregate-function symbol
//! with its full `Function` type (params + return), and the body namespace
//! each one's statements will later be resolved inside. Runs after
//! `DeclareTypes` so a struct/union's own type already exists and an
//! aggregate function's implicit `self` parameter can be typed against it.
//!
//! Parameters are given symbols here, but are not yet registered *by name*
//! in the function's body namespace — that happens in `resolve`, once a
//! namespace stack walk is actually entering the body (see
//! [`aize_core::symbol::SymbolTable::bind_value`]).

use crate::diagnostics::{DiagnosticKind, Diagnostics, Fatal};
use crate::pass::Pass;
use crate::passes::type_expr::resolve_type_expr;
use crate::symbol_data::{AggFuncData, FunctionData, SymbolData};
use aize_core::ir::{AggFuncId, FuncId, Ir, StructId, TopLevelId, UnionId};
use aize_core::source::Position;
use aize_core::symbol::{NamespaceSymbolId, SymbolKind, TypeSymbol, VariableSymbolId};
use indexmap::IndexMap;

pub struct DeclareFunctions;

impl Pass for DeclareFunctions {
    fn name(&self) -> &'static str {
        "declare_functions"
    }

    fn required_passes(&self) -> &'static [&'static str] {
        &["init_symbols", "declare_types"]
    }

    fn run(&mut self, ir: &mut Ir, diagnostics: &mut Diagnostics) -> Result<(), Fatal> {
        let mut data = ir
            .extensions
            .remove::<SymbolData>()
            .expect("init_symbols and declare_types ran first");
        let sources = ir.program.sources.clone();
        for source_id in sources {
            let ns = data.source_namespace(source_id);
            let top_levels = ir.source(source_id).top_levels.clone();
            for top_level in top_levels {
                match top_level {
                    TopLevelId::Import(_) => {}
                    TopLevelId::Function(func_id) => {
                        declare_function(ir, &mut data, ns, func_id, diagnostics)?;
                    }
                    TopLevelId::Struct(struct_id) => {
                        declare_struct_funcs(ir, &mut data, ns, struct_id, diagnostics)?;
                    }
                    TopLevelId::Union(union_id) => {
                        declare_union_funcs(ir, &mut data, ns, union_id, diagnostics)?;
                    }
                }
            }
        }
        ir.extensions.insert(data);
        Ok(())
    }
}

fn declare_function(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    func_id: FuncId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let node = ir.function(func_id).clone();
    let mut param_tys = Vec::with_capacity(node.params.len());
    for param_id in &node.params {
        let param = ir.param(*param_id);
        let ty = resolve_type_expr(ir, data, ns, param.ty, diagnostics)?;
        let symbol = data
            .table
            .push_variable(aize_core::symbol::VariableSymbol {
                name: param.name.clone(),
                ty,
                pos: param.pos.clone(),
            });
        data.set_param(*param_id, symbol);
        param_tys.push(ty);
    }
    let ret = resolve_type_expr(ir, data, ns, node.ret, diagnostics)?;
    let func_ty = data.table.push_type(TypeSymbol::Function {
        params: param_tys,
        ret,
    });
    let symbol = match data.table.define_value(
        ns,
        &node.name,
        node.name.clone(),
        func_ty,
        node.pos.clone(),
        true,
    ) {
        Ok(symbol) => symbol,
        Err(err) => {
            report_symbol_error(diagnostics, node.pos.clone(), err)?;
            data.table
                .push_variable(aize_core::symbol::VariableSymbol {
                    name: node.name.clone(),
                    ty: func_ty,
                    pos: node.pos.clone(),
                })
        }
    };
    let body_ns = data
        .table
        .define_namespace(ns, format!("function {}", node.name), node.pos.clone(), false, true)
        .expect("function body namespaces are never redefined");
    let attrs = node
        .attrs
        .iter()
        .map(|attr_id| ir.func_attr(*attr_id).name.clone())
        .collect();
    data.set_function(
        func_id,
        FunctionData {
            symbol,
            namespace: body_ns,
            attrs,
        },
    );
    data.set_function_body_namespace(func_id, body_ns);
    Ok(())
}

/// Declare one aggregate function. `agg_ty` is the enclosing struct/union's
/// own type, used to type the implicit `self` (the function's first
/// parameter) directly instead of resolving whatever annotation the
/// parameter happened to carry.
fn declare_agg_func(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    agg_func_id: AggFuncId,
    agg_ty: aize_core::symbol::TypeSymbolId,
    diagnostics: &mut Diagnostics,
) -> Result<(String, VariableSymbolId), Fatal> {
    let node = ir.agg_func(agg_func_id).clone();
    if node.params.is_empty() {
        diagnostics
            .report(node.pos.clone(), DiagnosticKind::MissingSelfParam)
            .emit()?;
    }
    let mut param_tys = Vec::with_capacity(node.params.len());
    for (index, param_id) in node.params.iter().enumerate() {
        let param = ir.param(*param_id);
        let ty = if index == 0 {
            agg_ty
        } else {
            resolve_type_expr(ir, data, ns, param.ty, diagnostics)?
        };
        let symbol = data
            .table
            .push_variable(aize_core::symbol::VariableSymbol {
                name: param.name.clone(),
                ty,
                pos: param.pos.clone(),
            });
        data.set_param(*param_id, symbol);
        param_tys.push(ty);
    }
    let ret = resolve_type_expr(ir, data, ns, node.ret, diagnostics)?;
    let func_ty = data.table.push_type(TypeSymbol::Function {
        params: param_tys,
        ret,
    });
    // Not registered by name in `ns`: an aggregate function is only reached
    // through its struct/union's own `funcs` map, never by unqualified
    // lookup in the enclosing source.
    let symbol = data
        .table
        .push_variable(aize_core::symbol::VariableSymbol {
            name: node.name.clone(),
            ty: func_ty,
            pos: node.pos.clone(),
        });
    let body_ns = data
        .table
        .define_namespace(ns, format!("agg function {}", node.name), node.pos.clone(), false, true)
        .expect("agg-function body namespaces are never redefined");
    data.set_agg_func(
        agg_func_id,
        AggFuncData {
            symbol,
            namespace: body_ns,
        },
    );
    data.set_agg_func_body_namespace(agg_func_id, body_ns);
    Ok((node.name, symbol))
}

fn declare_struct_funcs(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    struct_id: StructId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let node = ir.struct_(struct_id).clone();
    let struct_ty = data.struct_type(struct_id);
    let mut funcs = IndexMap::new();
    for agg_func_id in &node.funcs {
        let func_pos = ir.agg_func(*agg_func_id).pos.clone();
        let (name, symbol) = declare_agg_func(ir, data, ns, *agg_func_id, struct_ty, diagnostics)?;
        if let TypeSymbol::Struct { fields, .. } = data.table.type_symbol(struct_ty) {
            if let Some(field) = fields.get(&name) {
                diagnostics
                    .report(
                        func_pos,
                        DiagnosticKind::RepeatedField {
                            name: name.clone(),
                            previous: field.pos.clone(),
                        },
                    )
                    .message(format!("'{name}' is both a field and a function"))
                    .emit()?;
                continue;
            }
        }
        if let Some(previous) = funcs.insert(name.clone(), symbol) {
            let previous_pos = data.table.variable(previous).pos.clone();
            diagnostics
                .report(
                    func_pos,
                    DiagnosticKind::DuplicateDefinition {
                        kind: SymbolKind::Value,
                        name,
                        previous: previous_pos,
                    },
                )
                .emit()?;
        }
    }
    if let TypeSymbol::Struct { funcs: slot, .. } = data.table.type_symbol_mut(struct_ty) {
        *slot = funcs;
    }
    Ok(())
}

fn declare_union_funcs(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    union_id: UnionId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let node = ir.union_(union_id).clone();
    let union_ty = data.union_type(union_id);
    let mut funcs = IndexMap::new();
    for agg_func_id in &node.funcs {
        let func_pos = ir.agg_func(*agg_func_id).pos.clone();
        let (name, symbol) = declare_agg_func(ir, data, ns, *agg_func_id, union_ty, diagnostics)?;
        if let TypeSymbol::Union { variants, .. } = data.table.type_symbol(union_ty) {
            if let Some(&variant_ty) = variants.get(&name) {
                let previous = match data.table.type_symbol(variant_ty) {
                    TypeSymbol::UnionVariant { pos, .. } => pos.clone(),
                    _ => func_pos.clone(),
                };
                diagnostics
                    .report(
                        func_pos,
                        DiagnosticKind::RepeatedVariant {
                            name: name.clone(),
                            previous,
                        },
                    )
                    .message(format!("'{name}' is both a variant and a function"))
                    .emit()?;
                continue;
            }
        }
        if let Some(previous) = funcs.insert(name.clone(), symbol) {
            let previous_pos = data.table.variable(previous).pos.clone();
            diagnostics
                .report(
                    func_pos,
                    DiagnosticKind::DuplicateDefinition {
                        kind: SymbolKind::Value,
                        name,
                        previous: previous_pos,
                    },
                )
                .emit()?;
        }
    }
    if let TypeSymbol::Union { funcs: slot, .. } = data.table.type_symbol_mut(union_ty) {
        *slot = funcs;
    }
    Ok(())
}

fn report_symbol_error(
    diagnostics: &mut Diagnostics,
    pos: Position,
    err: aize_core::symbol::SymbolError,
) -> Result<(), Fatal> {
    match err {
        aize_core::symbol::SymbolError::DuplicateSymbol { kind, name, previous, .. } => diagnostics
            .report(pos, DiagnosticKind::DuplicateDefinition { kind, name, previous })
            .emit(),
        aize_core::symbol::SymbolError::FailedLookup { kind, name, pos: at } => {
            diagnostics.report(at, DiagnosticKind::UndefinedName { kind, name }).emit()
        }
    }
}
