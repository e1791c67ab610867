//! `ResolveSymbols`: the type checker. Walks every function and aggregate
//! function body, annotating each [`ExprId`]/[`StmtId`] in [`SymbolData`]
//! with its resolved type/terminality, inserting implicit widening casts,
//! and rewriting `Call` into `MethodCall` where the callee turned out to be
//! a method lookup. Runs last among the declaration/resolution passes:
//! every symbol a body could reference already exists by the time this
//! pass starts.
//!
//! Two kinds of IR node redirection happen here, both sanctioned: a
//! `Call`'s rewrite into `MethodCall` (same [`ExprId`], new [`ExprKind`]),
//! and every other statement/expression field that held a child id before
//! unification now holding whichever id `unify` returned for that child —
//! the original child node is never edited, only the parent's reference to
//! it is redirected to a newly appended cast-wrapping node when a cast was
//! inserted.

use crate::diagnostics::{DiagnosticKind, Diagnostics, Fatal};
use crate::pass::Pass;
use crate::passes::type_expr::resolve_type_expr;
use crate::symbol_data::{ExprData, ExprExtra, StmtData, SymbolData};
use aize_core::ir::{
    AggFuncId, ExprId, ExprKind, ExprNode, FuncId, Ir, NamespaceExprId, NamespaceExprKind,
    StmtId, StmtKind, TopLevelId, TypeExprKind, TypeExprNode,
};
use aize_core::source::Position;
use aize_core::symbol::{
    NamespaceSymbolId, SymbolError, SymbolKind, TypeSymbol, TypeSymbolId, VariableSymbol,
};

pub struct ResolveSymbols;

impl Pass for ResolveSymbols {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn required_passes(&self) -> &'static [&'static str] {
        &["init_symbols", "declare_types", "declare_functions"]
    }

    fn run(&mut self, ir: &mut Ir, diagnostics: &mut Diagnostics) -> Result<(), Fatal> {
        let mut data = ir
            .extensions
            .remove::<SymbolData>()
            .expect("init_symbols, declare_types and declare_functions ran first");
        let sources = ir.program.sources.clone();
        for source_id in sources {
            let top_levels = ir.source(source_id).top_levels.clone();
            for top_level in top_levels {
                match top_level {
                    TopLevelId::Import(_) => {}
                    TopLevelId::Function(func_id) => {
                        resolve_function(ir, &mut data, func_id, diagnostics)?;
                    }
                    TopLevelId::Struct(struct_id) => {
                        let funcs = ir.struct_(struct_id).funcs.clone();
                        for agg_func_id in funcs {
                            resolve_agg_func(ir, &mut data, agg_func_id, diagnostics)?;
                        }
                    }
                    TopLevelId::Union(union_id) => {
                        let funcs = ir.union_(union_id).funcs.clone();
                        for agg_func_id in funcs {
                            resolve_agg_func(ir, &mut data, agg_func_id, diagnostics)?;
                        }
                    }
                }
            }
        }
        ir.extensions.insert(data);
        Ok(())
    }
}

/// The namespace a body is resolved inside, plus the type a `Return`
/// statement inside it must unify against.
struct FuncCtx {
    ns: NamespaceSymbolId,
    ret: TypeSymbolId,
}

fn int_ty(data: &SymbolData, name: &str) -> TypeSymbolId {
    data.table
        .lookup_type(data.program_ns, name, true, Position::Builtin)
        .unwrap_or_else(|_| panic!("builtin type '{name}' is always defined by init_symbols"))
}

fn errored(data: &mut SymbolData) -> TypeSymbolId {
    data.table.push_type(TypeSymbol::Errored)
}

fn is_errored(data: &SymbolData, ty: TypeSymbolId) -> bool {
    matches!(data.table.type_symbol(ty), TypeSymbol::Errored)
}

fn report_symbol_error(
    diagnostics: &mut Diagnostics,
    pos: Position,
    err: SymbolError,
) -> Result<(), Fatal> {
    match err {
        SymbolError::DuplicateSymbol { kind, name, previous, .. } => diagnostics
            .report(pos, DiagnosticKind::DuplicateDefinition { kind, name, previous })
            .emit(),
        SymbolError::FailedLookup { kind, name, pos: at } => {
            diagnostics.report(at, DiagnosticKind::UndefinedName { kind, name }).emit()
        }
    }
}

fn function_return_type(data: &SymbolData, func_ty: TypeSymbolId) -> TypeSymbolId {
    match data.table.type_symbol(func_ty) {
        TypeSymbol::Function { ret, .. } => *ret,
        _ => unreachable!("declare_functions always gives a function symbol a Function type"),
    }
}

fn bind_params(
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    params: &[aize_core::ir::ParamId],
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    for param_id in params {
        let symbol = data.param(*param_id);
        let (name, pos) = {
            let var = data.table.variable(symbol);
            (var.name.clone(), var.pos.clone())
        };
        if let Err(err) = data.table.bind_value(ns, &name, symbol, pos.clone()) {
            report_symbol_error(diagnostics, pos, err)?;
        }
    }
    Ok(())
}

fn resolve_body(
    ir: &mut Ir,
    data: &mut SymbolData,
    ctx: &FuncCtx,
    body: &[StmtId],
    diagnostics: &mut Diagnostics,
) -> Result<bool, Fatal> {
    let mut terminal = false;
    for stmt_id in body {
        resolve_stmt(ir, data, ctx, *stmt_id, diagnostics)?;
        if data.stmt(*stmt_id).is_terminal {
            terminal = true;
        }
    }
    Ok(terminal)
}

fn resolve_function(
    ir: &mut Ir,
    data: &mut SymbolData,
    func_id: FuncId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let func_data = data.function(func_id).clone();
    let func_ty = data.table.variable(func_data.symbol).ty;
    let ret = function_return_type(data, func_ty);
    let node = ir.function(func_id).clone();
    bind_params(data, func_data.namespace, &node.params, diagnostics)?;
    let ctx = FuncCtx { ns: func_data.namespace, ret };
    let terminal = resolve_body(ir, data, &ctx, &node.body, diagnostics)?;
    if !terminal {
        diagnostics
            .report(node.pos.clone(), DiagnosticKind::NotAlwaysTerminating { name: node.name.clone() })
            .emit()?;
    }
    Ok(())
}

fn resolve_agg_func(
    ir: &mut Ir,
    data: &mut SymbolData,
    agg_func_id: AggFuncId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let agg_data = data.agg_func(agg_func_id).clone();
    let func_ty = data.table.variable(agg_data.symbol).ty;
    let ret = function_return_type(data, func_ty);
    let node = ir.agg_func(agg_func_id).clone();
    bind_params(data, agg_data.namespace, &node.params, diagnostics)?;
    let ctx = FuncCtx { ns: agg_data.namespace, ret };
    let terminal = resolve_body(ir, data, &ctx, &node.body, diagnostics)?;
    if !terminal {
        diagnostics
            .report(node.pos.clone(), DiagnosticKind::NotAlwaysTerminating { name: node.name.clone() })
            .emit()?;
    }
    Ok(())
}

/// Unify an already-resolved expression to `target`, inserting a generated
/// `CastInt`/`CastUnion` node when the source table's decision calls for a
/// widening coercion, reporting a `TypeCheckingError` family diagnostic
/// otherwise. Returns the `ExprId` the caller should use in place of
/// `expr_id` from here on — usually `expr_id` itself, sometimes the newly
/// appended cast node.
fn unify(
    ir: &mut Ir,
    data: &mut SymbolData,
    expr_id: ExprId,
    target: TypeSymbolId,
    diagnostics: &mut Diagnostics,
) -> Result<ExprId, Fatal> {
    let from = data.expr(expr_id).return_type;
    if is_errored(data, from) || is_errored(data, target) {
        return Ok(expr_id);
    }
    let from_ty = data.table.type_symbol(from).clone();
    let to_ty = data.table.type_symbol(target).clone();
    let pos = ir.expr(expr_id).pos.clone();
    match (&from_ty, &to_ty) {
        (TypeSymbol::Int { signed: fs, bits: fb, .. }, TypeSymbol::Int { signed: ts, bits: tb, .. }) => {
            if fs != ts {
                diagnostics
                    .report(pos, DiagnosticKind::SignMismatch { from: from_ty.name().into(), to: to_ty.name().into() })
                    .emit()?;
                return Ok(expr_id);
            }
            if fb == tb {
                return Ok(expr_id);
            }
            if fb > tb {
                diagnostics
                    .report(pos, DiagnosticKind::NarrowingInt { from: from_ty.name().into(), to: to_ty.name().into() })
                    .emit()?;
                return Ok(expr_id);
            }
            let to_type_expr = ir.push_type_expr(TypeExprNode { kind: TypeExprKind::Generated, pos: pos.clone() });
            let cast_id = ir.push_expr(ExprNode {
                kind: ExprKind::CastInt { expr: expr_id, to: to_type_expr },
                pos,
            });
            data.set_expr(
                cast_id,
                ExprData {
                    return_type: target,
                    is_lval: false,
                    extra: Some(ExprExtra::CastInt { from_bits: *fb, to_bits: *tb, is_signed: *fs }),
                },
            );
            Ok(cast_id)
        }
        (TypeSymbol::UnionVariant { union, .. }, TypeSymbol::Union { .. }) => {
            if *union == target {
                let union_type_expr =
                    ir.push_type_expr(TypeExprNode { kind: TypeExprKind::Generated, pos: pos.clone() });
                let cast_id = ir.push_expr(ExprNode {
                    kind: ExprKind::CastUnion { expr: expr_id, union_ty: union_type_expr },
                    pos,
                });
                data.set_expr(
                    cast_id,
                    ExprData {
                        return_type: target,
                        is_lval: false,
                        extra: Some(ExprExtra::CastUnion { from_variant: from, to_union: target }),
                    },
                );
                Ok(cast_id)
            } else {
                type_mismatch(diagnostics, pos, &to_ty, &from_ty)?;
                Ok(expr_id)
            }
        }
        (TypeSymbol::Struct { .. }, TypeSymbol::Struct { .. })
        | (TypeSymbol::Function { .. }, TypeSymbol::Function { .. })
        | (TypeSymbol::Tuple { .. }, TypeSymbol::Tuple { .. })
        | (TypeSymbol::Union { .. }, TypeSymbol::Union { .. }) => {
            if from == target {
                Ok(expr_id)
            } else {
                type_mismatch(diagnostics, pos, &to_ty, &from_ty)?;
                Ok(expr_id)
            }
        }
        _ => {
            type_mismatch(diagnostics, pos, &to_ty, &from_ty)?;
            Ok(expr_id)
        }
    }
}

fn type_mismatch(
    diagnostics: &mut Diagnostics,
    pos: Position,
    expected: &TypeSymbol,
    found: &TypeSymbol,
) -> Result<(), Fatal> {
    diagnostics
        .report(
            pos,
            DiagnosticKind::TypeMismatch {
                expected: expected.name().to_string(),
                found: found.name().to_string(),
            },
        )
        .emit()
}

/// Unify each argument against its matching parameter type. Excess or
/// missing arguments are reported once, not per argument; an excess
/// argument is passed through un-unified.
fn unify_arguments(
    ir: &mut Ir,
    data: &mut SymbolData,
    args: Vec<ExprId>,
    param_tys: &[TypeSymbolId],
    pos: Position,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<ExprId>, Fatal> {
    if args.len() > param_tys.len() {
        diagnostics
            .report(pos.clone(), DiagnosticKind::TooManyArguments { expected: param_tys.len(), found: args.len() })
            .emit()?;
    } else if args.len() < param_tys.len() {
        diagnostics
            .report(pos.clone(), DiagnosticKind::TooFewArguments { expected: param_tys.len(), found: args.len() })
            .emit()?;
    }
    let mut out = Vec::with_capacity(args.len());
    for (i, arg) in args.into_iter().enumerate() {
        match param_tys.get(i) {
            Some(&target) => out.push(unify(ir, data, arg, target, diagnostics)?),
            None => out.push(arg),
        }
    }
    Ok(out)
}

fn resolve_namespace_expr(
    ir: &Ir,
    data: &mut SymbolData,
    ctx: &FuncCtx,
    id: NamespaceExprId,
    diagnostics: &mut Diagnostics,
) -> Result<Option<NamespaceSymbolId>, Fatal> {
    let node = ir.namespace_expr(id);
    let pos = node.pos.clone();
    match &node.kind {
        NamespaceExprKind::GetNamespace { name } => {
            let name = name.clone();
            match data.table.lookup_namespace(ctx.ns, &name, false, pos.clone()) {
                Ok(ns) => Ok(Some(ns)),
                Err(err) => {
                    report_symbol_error(diagnostics, pos, err)?;
                    Ok(None)
                }
            }
        }
        NamespaceExprKind::Malformed => {
            diagnostics.report(pos, DiagnosticKind::MalformedNamespaceExpr).emit()?;
            Ok(None)
        }
    }
}

fn resolve_expr(
    ir: &mut Ir,
    data: &mut SymbolData,
    ctx: &FuncCtx,
    expr_id: ExprId,
    diagnostics: &mut Diagnostics,
) -> Result<ExprId, Fatal> {
    let pos = ir.expr(expr_id).pos.clone();
    let kind = ir.expr(expr_id).kind.clone();
    match kind {
        ExprKind::Int(_) => {
            let ty = int_ty(data, "int32");
            data.set_expr(expr_id, ExprData { return_type: ty, is_lval: false, extra: None });
            Ok(expr_id)
        }
        ExprKind::GetVar { name } => {
            let (return_type, is_lval) = match data.table.lookup_value(ctx.ns, &name, false, pos.clone()) {
                Ok(symbol) => {
                    let ty = data.table.variable(symbol).ty;
                    let is_lval = !matches!(data.table.type_symbol(ty), TypeSymbol::Function { .. });
                    (ty, is_lval)
                }
                Err(err) => {
                    report_symbol_error(diagnostics, pos, err)?;
                    (errored(data), false)
                }
            };
            data.set_expr(expr_id, ExprData { return_type, is_lval, extra: None });
            Ok(expr_id)
        }
        ExprKind::SetVar { name, value } => {
            let value = resolve_expr(ir, data, ctx, value, diagnostics)?;
            let return_type = match data.table.lookup_value(ctx.ns, &name, false, pos.clone()) {
                Ok(symbol) => {
                    let var_ty = data.table.variable(symbol).ty;
                    let value = unify(ir, data, value, var_ty, diagnostics)?;
                    ir.expr_mut(expr_id).kind = ExprKind::SetVar { name, value };
                    var_ty
                }
                Err(err) => {
                    report_symbol_error(diagnostics, pos, err)?;
                    ir.expr_mut(expr_id).kind = ExprKind::SetVar { name, value };
                    errored(data)
                }
            };
            data.set_expr(expr_id, ExprData { return_type, is_lval: true, extra: None });
            Ok(expr_id)
        }
        ExprKind::GetAttr { obj, attr } => {
            let obj = resolve_expr(ir, data, ctx, obj, diagnostics)?;
            let obj_data = data.expr(obj).clone();
            let (return_type, is_lval, extra) = match data.table.type_symbol(obj_data.return_type).clone() {
                TypeSymbol::Struct { fields, funcs, name, .. } => {
                    if let Some((index, _, field)) = fields.get_full(&attr) {
                        (field.ty, obj_data.is_lval, Some(ExprExtra::FieldAccess { field_index: index as u32 }))
                    } else if let Some(method) = funcs.get(&attr) {
                        let method_ty = data.table.variable(*method).ty;
                        (method_ty, false, Some(ExprExtra::MethodAccess { method: *method }))
                    } else {
                        diagnostics
                            .report(pos.clone(), DiagnosticKind::AttributeNotFound { attr: attr.clone(), ty: name })
                            .emit()?;
                        (errored(data), false, None)
                    }
                }
                TypeSymbol::Union { funcs, name, .. } => {
                    if let Some(method) = funcs.get(&attr) {
                        let method_ty = data.table.variable(*method).ty;
                        (method_ty, false, Some(ExprExtra::MethodAccess { method: *method }))
                    } else {
                        diagnostics
                            .report(pos.clone(), DiagnosticKind::AttributeNotFound { attr: attr.clone(), ty: name })
                            .emit()?;
                        (errored(data), false, None)
                    }
                }
                TypeSymbol::Errored => (errored(data), false, None),
                other => {
                    diagnostics
                        .report(pos.clone(), DiagnosticKind::ExpectedAggregate { found: other.name().to_string() })
                        .emit()?;
                    (errored(data), false, None)
                }
            };
            ir.expr_mut(expr_id).kind = ExprKind::GetAttr { obj, attr };
            data.set_expr(expr_id, ExprData { return_type, is_lval, extra });
            Ok(expr_id)
        }
        ExprKind::SetAttr { obj, attr, value } => {
            let obj = resolve_expr(ir, data, ctx, obj, diagnostics)?;
            let value = resolve_expr(ir, data, ctx, value, diagnostics)?;
            let obj_data = data.expr(obj).clone();
            let (return_type, value, extra) = match data.table.type_symbol(obj_data.return_type).clone() {
                TypeSymbol::Struct { fields, name, .. } => {
                    if let Some((index, _, field)) = fields.get_full(&attr) {
                        let field_ty = field.ty;
                        if !obj_data.is_lval {
                            diagnostics.report(pos.clone(), DiagnosticKind::ExpectedLvalue).emit()?;
                        }
                        let value = unify(ir, data, value, field_ty, diagnostics)?;
                        (field_ty, value, Some(ExprExtra::FieldAccess { field_index: index as u32 }))
                    } else {
                        diagnostics
                            .report(pos.clone(), DiagnosticKind::AttributeNotFound { attr: attr.clone(), ty: name })
                            .emit()?;
                        (errored(data), value, None)
                    }
                }
                TypeSymbol::Errored => (errored(data), value, None),
                other => {
                    diagnostics
                        .report(pos.clone(), DiagnosticKind::ExpectedAggregate { found: other.name().to_string() })
                        .emit()?;
                    (errored(data), value, None)
                }
            };
            ir.expr_mut(expr_id).kind = ExprKind::SetAttr { obj, attr, value };
            data.set_expr(expr_id, ExprData { return_type, is_lval: true, extra });
            Ok(expr_id)
        }
        ExprKind::GetStaticAttr { namespace, attr } => {
            let resolved_ns = resolve_namespace_expr(ir, data, ctx, namespace, diagnostics)?;
            let (return_type, is_lval) = match resolved_ns {
                Some(ns) => match data.table.lookup_value(ns, &attr, true, pos.clone()) {
                    Ok(symbol) => {
                        let ty = data.table.variable(symbol).ty;
                        (ty, !matches!(data.table.type_symbol(ty), TypeSymbol::Function { .. }))
                    }
                    Err(err) => {
                        report_symbol_error(diagnostics, pos.clone(), err)?;
                        (errored(data), false)
                    }
                },
                None => (errored(data), false),
            };
            data.set_expr(expr_id, ExprData { return_type, is_lval, extra: None });
            Ok(expr_id)
        }
        ExprKind::Compare { op, left, right } => {
            let left = resolve_expr(ir, data, ctx, left, diagnostics)?;
            let right = resolve_expr(ir, data, ctx, right, diagnostics)?;
            let lt = data.expr(left).return_type;
            let rt = data.expr(right).return_type;
            let is_signed = match (data.table.type_symbol(lt).clone(), data.table.type_symbol(rt).clone()) {
                (TypeSymbol::Int { signed, .. }, TypeSymbol::Int { .. }) => signed,
                (TypeSymbol::Errored, _) | (_, TypeSymbol::Errored) => false,
                (l, r) => {
                    let bad = if matches!(l, TypeSymbol::Int { .. }) { r.name().to_string() } else { l.name().to_string() };
                    diagnostics.report(pos.clone(), DiagnosticKind::ExpectedInteger { found: bad }).emit()?;
                    false
                }
            };
            let return_type = int_ty(data, "bool");
            ir.expr_mut(expr_id).kind = ExprKind::Compare { op, left, right };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: Some(ExprExtra::Compare { is_signed }) });
            Ok(expr_id)
        }
        ExprKind::Arithmetic { op, left, right } => {
            let left = resolve_expr(ir, data, ctx, left, diagnostics)?;
            let right = resolve_expr(ir, data, ctx, right, diagnostics)?;
            let lt = data.expr(left).return_type;
            let rt = data.expr(right).return_type;
            let (return_type, is_signed) = match (data.table.type_symbol(lt).clone(), data.table.type_symbol(rt).clone()) {
                (TypeSymbol::Int { signed, bits: lb, .. }, TypeSymbol::Int { bits: rb, .. }) => {
                    (if lb >= rb { lt } else { rt }, signed)
                }
                (TypeSymbol::Errored, _) => (lt, false),
                (_, TypeSymbol::Errored) => (rt, false),
                (l, r) => {
                    let bad = if matches!(l, TypeSymbol::Int { .. }) { r.name().to_string() } else { l.name().to_string() };
                    diagnostics.report(pos.clone(), DiagnosticKind::ExpectedInteger { found: bad }).emit()?;
                    (errored(data), false)
                }
            };
            ir.expr_mut(expr_id).kind = ExprKind::Arithmetic { op, left, right };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: Some(ExprExtra::Arithmetic { is_signed }) });
            Ok(expr_id)
        }
        ExprKind::Negate { right } => {
            let right = resolve_expr(ir, data, ctx, right, diagnostics)?;
            let rt = data.expr(right).return_type;
            let return_type = match data.table.type_symbol(rt) {
                TypeSymbol::Int { .. } | TypeSymbol::Errored => rt,
                other => {
                    diagnostics
                        .report(pos.clone(), DiagnosticKind::ExpectedInteger { found: other.name().to_string() })
                        .emit()?;
                    errored(data)
                }
            };
            ir.expr_mut(expr_id).kind = ExprKind::Negate { right };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: None });
            Ok(expr_id)
        }
        ExprKind::New { ty, args } => {
            let resolved_ty = resolve_type_expr(ir, data, ctx.ns, ty, diagnostics)?;
            let mut resolved_args = Vec::with_capacity(args.len());
            for a in args {
                resolved_args.push(resolve_expr(ir, data, ctx, a, diagnostics)?);
            }
            let return_type = match data.table.type_symbol(resolved_ty).clone() {
                TypeSymbol::Struct { fields, .. } => {
                    let field_tys: Vec<TypeSymbolId> = fields.values().map(|f| f.ty).collect();
                    resolved_args = unify_arguments(ir, data, resolved_args, &field_tys, pos.clone(), diagnostics)?;
                    resolved_ty
                }
                TypeSymbol::UnionVariant { contains, .. } => {
                    resolved_args = unify_arguments(ir, data, resolved_args, &[contains], pos.clone(), diagnostics)?;
                    resolved_ty
                }
                // Accepted at the type-check gate, same as a struct or a
                // variant, but a bare union name names no field list to
                // construct against.
                TypeSymbol::Union { .. } => {
                    resolved_args = unify_arguments(ir, data, resolved_args, &[], pos.clone(), diagnostics)?;
                    resolved_ty
                }
                TypeSymbol::Errored => errored(data),
                other => {
                    diagnostics
                        .report(pos.clone(), DiagnosticKind::ExpectedAggregate { found: other.name().to_string() })
                        .emit()?;
                    errored(data)
                }
            };
            ir.expr_mut(expr_id).kind = ExprKind::New { ty, args: resolved_args };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: None });
            Ok(expr_id)
        }
        ExprKind::Call { callee, args } => {
            let callee = resolve_expr(ir, data, ctx, callee, diagnostics)?;
            let callee_data = data.expr(callee).clone();
            if matches!(callee_data.extra, Some(ExprExtra::MethodAccess { .. })) {
                let (obj, name) = match &ir.expr(callee).kind {
                    ExprKind::GetAttr { obj, attr } => (*obj, attr.clone()),
                    _ => unreachable!("MethodAccess extra is only ever set while resolving a GetAttr"),
                };
                let mut resolved_args = Vec::with_capacity(args.len());
                for a in args {
                    resolved_args.push(resolve_expr(ir, data, ctx, a, diagnostics)?);
                }
                let mut full_args = Vec::with_capacity(resolved_args.len() + 1);
                full_args.push(obj);
                full_args.extend(resolved_args);
                let (param_tys, ret_ty) = match data.table.type_symbol(callee_data.return_type).clone() {
                    TypeSymbol::Function { params, ret } => (params, ret),
                    _ => (Vec::new(), errored(data)),
                };
                full_args = unify_arguments(ir, data, full_args, &param_tys, pos.clone(), diagnostics)?;
                ir.expr_mut(expr_id).kind = ExprKind::MethodCall { obj, name, args: full_args };
                data.set_expr(expr_id, ExprData { return_type: ret_ty, is_lval: false, extra: None });
                return Ok(expr_id);
            }
            let mut resolved_args = Vec::with_capacity(args.len());
            for a in args {
                resolved_args.push(resolve_expr(ir, data, ctx, a, diagnostics)?);
            }
            let return_type = match data.table.type_symbol(callee_data.return_type).clone() {
                TypeSymbol::Function { params, ret } => {
                    resolved_args = unify_arguments(ir, data, resolved_args, &params, pos.clone(), diagnostics)?;
                    ret
                }
                TypeSymbol::Errored => errored(data),
                other => {
                    diagnostics
                        .report(pos.clone(), DiagnosticKind::ExpectedFunction { found: other.name().to_string() })
                        .emit()?;
                    errored(data)
                }
            };
            ir.expr_mut(expr_id).kind = ExprKind::Call { callee, args: resolved_args };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: None });
            Ok(expr_id)
        }
        ExprKind::MethodCall { .. } => {
            unreachable!("MethodCall is synthesized by this pass, never present beforehand")
        }
        ExprKind::Intrinsic { name, args } => {
            let mut resolved_args = Vec::with_capacity(args.len());
            for a in args {
                resolved_args.push(resolve_expr(ir, data, ctx, a, diagnostics)?);
            }
            let recognized = matches!(name.as_str(), "int8" | "int32" | "int64" | "uint8" | "uint32" | "uint64");
            let return_type = if recognized {
                let int64 = int_ty(data, "int64");
                resolved_args = unify_arguments(ir, data, resolved_args, &[int64], pos.clone(), diagnostics)?;
                int_ty(data, &name)
            } else {
                diagnostics.report(pos.clone(), DiagnosticKind::UnknownIntrinsic { name: name.clone() }).emit()?;
                errored(data)
            };
            ir.expr_mut(expr_id).kind = ExprKind::Intrinsic { name, args: resolved_args };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: None });
            Ok(expr_id)
        }
        ExprKind::CastInt { .. } | ExprKind::CastUnion { .. } => {
            unreachable!("cast nodes are synthesized by this pass, never present beforehand")
        }
        ExprKind::Lambda { params, body } => {
            let lambda_ns = data
                .table
                .define_namespace(ctx.ns, "lambda".to_string(), pos.clone(), false, true)
                .expect("lambda body namespaces are never redefined");
            let mut param_tys = Vec::with_capacity(params.len());
            for param_id in &params {
                let param = ir.param(*param_id).clone();
                let ty = resolve_type_expr(ir, data, ctx.ns, param.ty, diagnostics)?;
                let symbol = data.table.push_variable(VariableSymbol { name: param.name.clone(), ty, pos: param.pos.clone() });
                data.set_param(*param_id, symbol);
                if let Err(err) = data.table.bind_value(lambda_ns, &param.name, symbol, param.pos.clone()) {
                    report_symbol_error(diagnostics, param.pos.clone(), err)?;
                }
                param_tys.push(ty);
            }
            let lambda_ctx = FuncCtx { ns: lambda_ns, ret: ctx.ret };
            let body = resolve_expr(ir, data, &lambda_ctx, body, diagnostics)?;
            let ret_ty = data.expr(body).return_type;
            let return_type = data.table.push_type(TypeSymbol::Function { params: param_tys, ret: ret_ty });
            ir.expr_mut(expr_id).kind = ExprKind::Lambda { params, body };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: None });
            Ok(expr_id)
        }
        ExprKind::Tuple { items } => {
            let mut resolved = Vec::with_capacity(items.len());
            let mut tys = Vec::with_capacity(items.len());
            for item in items {
                let r = resolve_expr(ir, data, ctx, item, diagnostics)?;
                tys.push(data.expr(r).return_type);
                resolved.push(r);
            }
            let return_type = data.table.push_type(TypeSymbol::Tuple { items: tys });
            ir.expr_mut(expr_id).kind = ExprKind::Tuple { items: resolved };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra: None });
            Ok(expr_id)
        }
        ExprKind::Is { expr: inner, variant, bind_name } => {
            let inner = resolve_expr(ir, data, ctx, inner, diagnostics)?;
            let inner_ty = data.expr(inner).return_type;
            let extra = match data.table.type_symbol(inner_ty).clone() {
                TypeSymbol::Union { variants, .. } => {
                    if let Some(&variant_ty) = variants.get(&variant) {
                        let contains = match data.table.type_symbol(variant_ty) {
                            TypeSymbol::UnionVariant { contains, .. } => *contains,
                            _ => unreachable!("a union's variants map only ever holds UnionVariant types"),
                        };
                        let symbol = data.table.push_variable(VariableSymbol {
                            name: bind_name.clone(),
                            ty: contains,
                            pos: pos.clone(),
                        });
                        if let Err(err) = data.table.bind_value(ctx.ns, &bind_name, symbol, pos.clone()) {
                            report_symbol_error(diagnostics, pos.clone(), err)?;
                        }
                        Some(ExprExtra::Is { union_ty: inner_ty, variant_ty })
                    } else {
                        diagnostics
                            .report(pos.clone(), DiagnosticKind::UndefinedName { kind: SymbolKind::Type, name: variant.clone() })
                            .emit()?;
                        None
                    }
                }
                TypeSymbol::Errored => None,
                other => {
                    diagnostics
                        .report(pos.clone(), DiagnosticKind::ExpectedAggregate { found: other.name().to_string() })
                        .emit()?;
                    None
                }
            };
            let return_type = int_ty(data, "bool");
            ir.expr_mut(expr_id).kind = ExprKind::Is { expr: inner, variant, bind_name };
            data.set_expr(expr_id, ExprData { return_type, is_lval: false, extra });
            Ok(expr_id)
        }
    }
}

fn resolve_stmt(
    ir: &mut Ir,
    data: &mut SymbolData,
    ctx: &FuncCtx,
    stmt_id: StmtId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let pos = ir.stmt(stmt_id).pos.clone();
    let kind = ir.stmt(stmt_id).kind.clone();
    match kind {
        StmtKind::VarDecl { name, ann, value } => {
            let value = resolve_expr(ir, data, ctx, value, diagnostics)?;
            let (ty, value) = match ir.type_expr(ann).kind {
                TypeExprKind::NoType => (data.expr(value).return_type, value),
                _ => {
                    let declared = resolve_type_expr(ir, data, ctx.ns, ann, diagnostics)?;
                    let value = unify(ir, data, value, declared, diagnostics)?;
                    (declared, value)
                }
            };
            let symbol = data.table.push_variable(VariableSymbol { name: name.clone(), ty, pos: pos.clone() });
            if let Err(err) = data.table.bind_value(ctx.ns, &name, symbol, pos.clone()) {
                report_symbol_error(diagnostics, pos, err)?;
            }
            ir.stmt_mut(stmt_id).kind = StmtKind::VarDecl { name, ann, value };
            data.set_stmt(stmt_id, StmtData { is_terminal: false });
            Ok(())
        }
        StmtKind::Block { stmts } => {
            // A statement after a terminal one is unreachable; the
            // diagnostic for that is left unimplemented (open question),
            // but the block's own terminality is still tracked correctly.
            let mut terminal = false;
            for s in &stmts {
                resolve_stmt(ir, data, ctx, *s, diagnostics)?;
                if data.stmt(*s).is_terminal {
                    terminal = true;
                }
            }
            data.set_stmt(stmt_id, StmtData { is_terminal: terminal });
            Ok(())
        }
        StmtKind::If { cond, then_do, else_do } => {
            let cond = resolve_expr(ir, data, ctx, cond, diagnostics)?;
            let bool_ty = int_ty(data, "bool");
            let cond = unify(ir, data, cond, bool_ty, diagnostics)?;
            resolve_stmt(ir, data, ctx, then_do, diagnostics)?;
            resolve_stmt(ir, data, ctx, else_do, diagnostics)?;
            let terminal = data.stmt(then_do).is_terminal && data.stmt(else_do).is_terminal;
            ir.stmt_mut(stmt_id).kind = StmtKind::If { cond, then_do, else_do };
            data.set_stmt(stmt_id, StmtData { is_terminal: terminal });
            Ok(())
        }
        StmtKind::While { cond, body } => {
            let cond = resolve_expr(ir, data, ctx, cond, diagnostics)?;
            let bool_ty = int_ty(data, "bool");
            let cond = unify(ir, data, cond, bool_ty, diagnostics)?;
            resolve_stmt(ir, data, ctx, body, diagnostics)?;
            // Inherited from the body regardless of whether the loop can
            // execute zero times; preserved exactly, not "fixed" — see the
            // open question this carries forward.
            let terminal = data.stmt(body).is_terminal;
            ir.stmt_mut(stmt_id).kind = StmtKind::While { cond, body };
            data.set_stmt(stmt_id, StmtData { is_terminal: terminal });
            Ok(())
        }
        StmtKind::ExprStmt { expr } => {
            let expr = resolve_expr(ir, data, ctx, expr, diagnostics)?;
            ir.stmt_mut(stmt_id).kind = StmtKind::ExprStmt { expr };
            data.set_stmt(stmt_id, StmtData { is_terminal: false });
            Ok(())
        }
        StmtKind::Return { expr } => {
            let expr = resolve_expr(ir, data, ctx, expr, diagnostics)?;
            let expr = unify(ir, data, expr, ctx.ret, diagnostics)?;
            ir.stmt_mut(stmt_id).kind = StmtKind::Return { expr };
            data.set_stmt(stmt_id, StmtData { is_terminal: true });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SinkConfig;
    use crate::passes::declare_functions::DeclareFunctions;
    use crate::passes::declare_types::DeclareTypes;
    use crate::passes::init_symbols::InitSymbols;
    use aize_core::ir::{
        ArithmeticOp, FuncAttrId, FunctionNode, ParamNode, SourceNode, StmtNode, TypeExprId,
    };
    use aize_core::source::{SourceKey, SourceRegistry};

    fn int32_type_expr(ir: &mut Ir) -> TypeExprId {
        ir.push_type_expr(TypeExprNode { kind: TypeExprKind::GetType { name: "int32".into() }, pos: Position::None })
    }

    fn no_type_expr(ir: &mut Ir) -> TypeExprId {
        ir.push_type_expr(TypeExprNode { kind: TypeExprKind::NoType, pos: Position::None })
    }

    fn run_prereqs(ir: &mut Ir, diagnostics: &mut Diagnostics) {
        InitSymbols.run(ir, diagnostics).unwrap();
        DeclareTypes.run(ir, diagnostics).unwrap();
        DeclareFunctions.run(ir, diagnostics).unwrap();
    }

    fn one_source(ir: &mut Ir, top: TopLevelId) {
        let mut registry = SourceRegistry::new();
        let source_id = registry.get_or_insert(SourceKey::Name("t".into()), "t".into(), "").0;
        let id = ir.push_source(SourceNode { top_levels: vec![top], display_name: "t".into(), source_id });
        ir.program.sources.push(id);
    }

    /// `def f(x: int32) -> int32 { return x + 1; }`
    #[test]
    fn simple_function_typechecks_and_terminates() {
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
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        let data = ir.extensions.expect::<SymbolData>();
        let sum_ty = data.expr(sum).return_type;
        assert!(matches!(data.table.type_symbol(sum_ty), TypeSymbol::Int { signed: true, bits: 32, .. }));
        assert!(data.stmt(ret_stmt).is_terminal);
    }

    /// `def f() -> int32 { var x: int32 = 1; x = x + 1; }` — never returns.
    #[test]
    fn function_without_a_return_is_not_always_terminating() {
        let mut ir = Ir::new();
        let ret = int32_type_expr(&mut ir);
        let ann = int32_type_expr(&mut ir);
        let one = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
        let decl = ir.push_stmt(StmtNode {
            kind: StmtKind::VarDecl { name: "x".into(), ann, value: one },
            pos: Position::None,
        });
        let x = ir.push_expr(ExprNode { kind: ExprKind::GetVar { name: "x".into() }, pos: Position::None });
        let one_again = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
        let sum = ir.push_expr(ExprNode {
            kind: ExprKind::Arithmetic { op: ArithmeticOp::Add, left: x, right: one_again },
            pos: Position::None,
        });
        let set = ir.push_expr(ExprNode { kind: ExprKind::SetVar { name: "x".into(), value: sum }, pos: Position::None });
        let set_stmt = ir.push_stmt(StmtNode { kind: StmtKind::ExprStmt { expr: set }, pos: Position::None });
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![],
            ret,
            body: vec![decl, set_stmt],
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        one_source(&mut ir, TopLevelId::Function(func_id));
        let mut diagnostics = Diagnostics::new(SinkConfig { fail_ge: None, ..SinkConfig::default() });
        run_prereqs(&mut ir, &mut diagnostics);
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::NotAlwaysTerminating { .. })));
    }

    /// `def f(x: int8) -> int32 { return x; }` inserts a widening `CastInt`.
    #[test]
    fn narrow_to_wide_return_inserts_a_cast() {
        let mut ir = Ir::new();
        let param_ty = ir.push_type_expr(TypeExprNode { kind: TypeExprKind::GetType { name: "int8".into() }, pos: Position::None });
        let param = ir.push_param(ParamNode { name: "x".into(), ty: param_ty, pos: Position::None });
        let ret = int32_type_expr(&mut ir);
        let x = ir.push_expr(ExprNode { kind: ExprKind::GetVar { name: "x".into() }, pos: Position::None });
        let ret_stmt = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: x }, pos: Position::None });
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
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        let cast_id = match &ir.stmt(ret_stmt).kind {
            StmtKind::Return { expr } => *expr,
            _ => unreachable!(),
        };
        assert_ne!(cast_id, x);
        let data = ir.extensions.expect::<SymbolData>();
        assert!(matches!(data.expr(cast_id).extra, Some(ExprExtra::CastInt { from_bits: 8, to_bits: 32, is_signed: true })));
    }

    #[test]
    fn var_decl_without_ann_uses_no_type() {
        let mut ir = Ir::new();
        let ann = no_type_expr(&mut ir);
        let one = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
        let decl = ir.push_stmt(StmtNode { kind: StmtKind::VarDecl { name: "x".into(), ann, value: one }, pos: Position::None });
        let ret = int32_type_expr(&mut ir);
        let x = ir.push_expr(ExprNode { kind: ExprKind::GetVar { name: "x".into() }, pos: Position::None });
        let ret_stmt = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: x }, pos: Position::None });
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![],
            ret,
            body: vec![decl, ret_stmt],
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        one_source(&mut ir, TopLevelId::Function(func_id));
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        run_prereqs(&mut ir, &mut diagnostics);
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
    }

    /// `def f() -> int32 { a; b; c; return 0; }` — three independent
    /// undefined names each get their own diagnostic, but the sink's
    /// fail flag is a single boolean, not a counter.
    #[test]
    fn three_undefined_names_accumulate_but_the_fail_flag_stays_singular() {
        let mut ir = Ir::new();
        let ret = int32_type_expr(&mut ir);
        let mut body = Vec::new();
        for name in ["a", "b", "c"] {
            let expr = ir.push_expr(ExprNode { kind: ExprKind::GetVar { name: name.into() }, pos: Position::None });
            body.push(ir.push_stmt(StmtNode { kind: StmtKind::ExprStmt { expr }, pos: Position::None }));
        }
        let zero = ir.push_expr(ExprNode { kind: ExprKind::Int(0), pos: Position::None });
        body.push(ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: zero }, pos: Position::None }));
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![],
            ret,
            body,
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        one_source(&mut ir, TopLevelId::Function(func_id));
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        run_prereqs(&mut ir, &mut diagnostics);
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .all(|d| matches!(d.kind, DiagnosticKind::UndefinedName { .. })));
        assert!(diagnostics.has_errors());
    }

    /// `union U { A(int32) } def f(u: U) -> bool { return u is A as x; }` —
    /// a successful `is` check resolves to `bool` and binds `x` to the
    /// variant's contained type.
    #[test]
    fn union_is_check_resolves_to_bool_and_binds_the_variant() {
        let mut ir = Ir::new();
        let variant_ty = int32_type_expr(&mut ir);
        let variant_id = ir.push_variant(aize_core::ir::VariantNode {
            name: "A".into(),
            ty: variant_ty,
            pos: Position::None,
        });
        let union_id = ir.push_union(aize_core::ir::UnionNode {
            name: "U".into(),
            variants: vec![variant_id],
            funcs: vec![],
            pos: Position::None,
        });
        let param_ty = ir.push_type_expr(TypeExprNode {
            kind: TypeExprKind::GetType { name: "U".into() },
            pos: Position::None,
        });
        let param = ir.push_param(ParamNode { name: "u".into(), ty: param_ty, pos: Position::None });
        let ret = ir.push_type_expr(TypeExprNode {
            kind: TypeExprKind::GetType { name: "bool".into() },
            pos: Position::None,
        });
        let u_var = ir.push_expr(ExprNode { kind: ExprKind::GetVar { name: "u".into() }, pos: Position::None });
        let is_expr = ir.push_expr(ExprNode {
            kind: ExprKind::Is { expr: u_var, variant: "A".into(), bind_name: "x".into() },
            pos: Position::None,
        });
        let ret_stmt = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: is_expr }, pos: Position::None });
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![param],
            ret,
            body: vec![ret_stmt],
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        let mut registry = SourceRegistry::new();
        let source_id = registry.get_or_insert(SourceKey::Name("t".into()), "t".into(), "").0;
        let id = ir.push_source(SourceNode {
            top_levels: vec![TopLevelId::Union(union_id), TopLevelId::Function(func_id)],
            display_name: "t".into(),
            source_id,
        });
        ir.program.sources.push(id);
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        run_prereqs(&mut ir, &mut diagnostics);
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        let data = ir.extensions.expect::<SymbolData>();
        let bool_ty = int_ty(&data, "bool");
        assert_eq!(data.expr(is_expr).return_type, bool_ty);
        assert!(matches!(data.expr(is_expr).extra, Some(ExprExtra::Is { .. })));
    }

    fn bool_cond(ir: &mut Ir) -> ExprId {
        ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None })
    }

    /// `def f() -> int32 { if (1) { return 1; } else { return 2; } }` —
    /// both arms return, so the `if` as a whole is terminal.
    #[test]
    fn if_with_both_arms_returning_is_terminal() {
        let mut ir = Ir::new();
        let ret = int32_type_expr(&mut ir);
        let cond = bool_cond(&mut ir);
        let one = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
        let then_ret = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: one }, pos: Position::None });
        let then_do = ir.push_stmt(StmtNode { kind: StmtKind::Block { stmts: vec![then_ret] }, pos: Position::None });
        let two = ir.push_expr(ExprNode { kind: ExprKind::Int(2), pos: Position::None });
        let else_ret = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: two }, pos: Position::None });
        let else_do = ir.push_stmt(StmtNode { kind: StmtKind::Block { stmts: vec![else_ret] }, pos: Position::None });
        let if_stmt = ir.push_stmt(StmtNode { kind: StmtKind::If { cond, then_do, else_do }, pos: Position::None });
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![],
            ret,
            body: vec![if_stmt],
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        one_source(&mut ir, TopLevelId::Function(func_id));
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        run_prereqs(&mut ir, &mut diagnostics);
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        let data = ir.extensions.expect::<SymbolData>();
        assert!(data.stmt(if_stmt).is_terminal);
    }

    /// `def f() -> int32 { if (1) { return 1; } }` — only one arm returns
    /// (the implicit empty else never does), so the function as a whole
    /// is rejected as not always terminating.
    #[test]
    fn if_with_only_one_arm_returning_is_not_terminal() {
        let mut ir = Ir::new();
        let ret = int32_type_expr(&mut ir);
        let cond = bool_cond(&mut ir);
        let one = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
        let then_ret = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: one }, pos: Position::None });
        let then_do = ir.push_stmt(StmtNode { kind: StmtKind::Block { stmts: vec![then_ret] }, pos: Position::None });
        let else_do = ir.push_stmt(StmtNode { kind: StmtKind::Block { stmts: vec![] }, pos: Position::None });
        let if_stmt = ir.push_stmt(StmtNode { kind: StmtKind::If { cond, then_do, else_do }, pos: Position::None });
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![],
            ret,
            body: vec![if_stmt],
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        one_source(&mut ir, TopLevelId::Function(func_id));
        let mut diagnostics = Diagnostics::new(SinkConfig { fail_ge: None, ..SinkConfig::default() });
        run_prereqs(&mut ir, &mut diagnostics);
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        let data = ir.extensions.expect::<SymbolData>();
        assert!(!data.stmt(if_stmt).is_terminal);
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::NotAlwaysTerminating { .. })));
    }

    /// `def f() -> int32 { while (1) { return 1; } }` — the loop body
    /// always returns, so (per the inherited, deliberately unsound rule)
    /// the `while` itself is treated as terminal even though the
    /// condition could be false on entry and the loop body never run.
    #[test]
    fn while_inherits_terminality_from_its_body_even_though_it_may_never_run() {
        let mut ir = Ir::new();
        let ret = int32_type_expr(&mut ir);
        let cond = bool_cond(&mut ir);
        let one = ir.push_expr(ExprNode { kind: ExprKind::Int(1), pos: Position::None });
        let body_ret = ir.push_stmt(StmtNode { kind: StmtKind::Return { expr: one }, pos: Position::None });
        let body = ir.push_stmt(StmtNode { kind: StmtKind::Block { stmts: vec![body_ret] }, pos: Position::None });
        let while_stmt = ir.push_stmt(StmtNode { kind: StmtKind::While { cond, body }, pos: Position::None });
        let func_id = ir.push_function(FunctionNode {
            name: "f".into(),
            params: vec![],
            ret,
            body: vec![while_stmt],
            attrs: Vec::<FuncAttrId>::new(),
            pos: Position::None,
        });
        one_source(&mut ir, TopLevelId::Function(func_id));
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        run_prereqs(&mut ir, &mut diagnostics);
        ResolveSymbols.run(&mut ir, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        let data = ir.extensions.expect::<SymbolData>();
        assert!(data.stmt(while_stmt).is_terminal);
    }
}
