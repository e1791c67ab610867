//! Lowers the parsed AST (see [`crate::ast`]) into the arena-of-ids IR
//! ([`aize_core::ir`]).
//!
//! Every import's path has already been resolved to a target [`SourceKey`]
//! by [`crate::import::trace_imports`] before this runs; lowering's only job
//! with that information is to translate it into the matching
//! [`aize_core::ir::IrSourceId`] once every source in the program has been
//! assigned one. That is the one two-phase step here: sources (and
//! everything in them) are lowered first, import targets are backfilled
//! second.

use crate::ast;
use crate::import::parse_anchor;
use aize_core::ir::{
    self, AggFieldNode, AggFuncNode, ArithmeticOp as IrArithmeticOp, CompareOp as IrCompareOp,
    ExprKind, ExprNode, FuncAttrNode, FunctionNode, Ir, ImportAnchor, ImportNode, ImportPath,
    NamespaceExprKind, NamespaceExprNode, ParamNode, SourceNode, StmtKind, StmtNode, StructNode,
    TopLevelId, TypeExprKind, TypeExprNode, UnionNode, VariantNode,
};
use aize_core::source::SourceKey;
use std::collections::HashMap;

/// Lower a whole program's sources (already flattened and import-resolved
/// by [`crate::import::trace_imports`], entry source first).
pub fn lower_program(sources: &[ast::Source]) -> Ir {
    let mut ir = Ir::new();
    let mut key_to_id: HashMap<SourceKey, ir::IrSourceId> = HashMap::new();
    let mut pending_imports: Vec<(ir::ImportId, Option<SourceKey>)> = Vec::new();

    for source in sources {
        let mut top_levels = Vec::with_capacity(source.top_levels.len());
        for top_level in &source.top_levels {
            let id = match top_level {
                ast::TopLevel::Import(imp) => {
                    let anchor = parse_anchor(imp.anchor_text.as_deref()).unwrap_or(ImportAnchor::Project);
                    let id = ir.push_import(ImportNode {
                        path: ImportPath {
                            anchor,
                            segments: imp.segments.clone(),
                        },
                        resolved: None,
                        pos: imp.pos.clone(),
                    });
                    pending_imports.push((id, imp.resolved_key.clone()));
                    TopLevelId::Import(id)
                }
                ast::TopLevel::Function(f) => TopLevelId::Function(lower_function(&mut ir, f)),
                ast::TopLevel::Struct(s) => TopLevelId::Struct(lower_struct(&mut ir, s)),
                ast::TopLevel::Union(u) => TopLevelId::Union(lower_union(&mut ir, u)),
            };
            top_levels.push(id);
        }
        let ir_id = ir.push_source(SourceNode {
            top_levels,
            display_name: source.display_name.clone(),
            source_id: source.source_id,
        });
        ir.program.sources.push(ir_id);
        key_to_id.insert(source.key.clone(), ir_id);
    }

    for (import_id, resolved_key) in pending_imports {
        if let Some(target) = resolved_key.and_then(|key| key_to_id.get(&key).copied()) {
            ir.import_mut(import_id).resolved = Some(target);
        }
    }

    ir
}

fn lower_param(ir: &mut Ir, p: &ast::Param) -> ir::ParamId {
    let ty = lower_type(ir, &p.ty);
    ir.push_param(ParamNode {
        name: p.name.clone(),
        ty,
        pos: p.pos.clone(),
    })
}

fn lower_function(ir: &mut Ir, f: &ast::Function) -> ir::FuncId {
    let params = f.params.iter().map(|p| lower_param(ir, p)).collect();
    let ret = lower_annotation(ir, f.ret.as_ref(), &f.pos);
    let body = f.body.iter().map(|s| lower_stmt(ir, s)).collect();
    let attrs = f
        .attrs
        .iter()
        .map(|a| {
            ir.push_func_attr(FuncAttrNode {
                name: a.name.clone(),
                pos: a.pos.clone(),
            })
        })
        .collect();
    ir.push_function(FunctionNode {
        name: f.name.clone(),
        params,
        ret,
        body,
        attrs,
        pos: f.pos.clone(),
    })
}

fn lower_agg_func(ir: &mut Ir, f: &ast::AggFunc) -> ir::AggFuncId {
    let params = f.params.iter().map(|p| lower_param(ir, p)).collect();
    let ret = lower_annotation(ir, f.ret.as_ref(), &f.pos);
    let body = f.body.iter().map(|s| lower_stmt(ir, s)).collect();
    ir.push_agg_func(AggFuncNode {
        name: f.name.clone(),
        params,
        ret,
        body,
        pos: f.pos.clone(),
    })
}

fn lower_struct(ir: &mut Ir, s: &ast::Struct) -> ir::StructId {
    let fields = s
        .fields
        .iter()
        .map(|field| {
            let ty = lower_type(ir, &field.ty);
            ir.push_agg_field(AggFieldNode {
                name: field.name.clone(),
                ty,
                pos: field.pos.clone(),
            })
        })
        .collect();
    let funcs = s.funcs.iter().map(|f| lower_agg_func(ir, f)).collect();
    ir.push_struct(StructNode {
        name: s.name.clone(),
        fields,
        funcs,
        pos: s.pos.clone(),
    })
}

fn lower_union(ir: &mut Ir, u: &ast::Union) -> ir::UnionId {
    let variants = u
        .variants
        .iter()
        .map(|variant| {
            let ty = lower_type(ir, &variant.ty);
            ir.push_variant(VariantNode {
                name: variant.name.clone(),
                ty,
                pos: variant.pos.clone(),
            })
        })
        .collect();
    let funcs = u.funcs.iter().map(|f| lower_agg_func(ir, f)).collect();
    ir.push_union(UnionNode {
        name: u.name.clone(),
        variants,
        funcs,
        pos: u.pos.clone(),
    })
}

fn lower_stmt(ir: &mut Ir, s: &ast::Stmt) -> ir::StmtId {
    match s {
        ast::Stmt::VarDecl {
            name,
            ann,
            value,
            pos,
        } => {
            let ann_id = lower_annotation(ir, ann.as_ref(), pos);
            let value_id = lower_expr(ir, value);
            ir.push_stmt(StmtNode {
                kind: StmtKind::VarDecl {
                    name: name.clone(),
                    ann: ann_id,
                    value: value_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Stmt::Block { stmts, pos } => {
            let ids = stmts.iter().map(|st| lower_stmt(ir, st)).collect();
            ir.push_stmt(StmtNode {
                kind: StmtKind::Block { stmts: ids },
                pos: pos.clone(),
            })
        }
        ast::Stmt::If {
            cond,
            then_do,
            else_do,
            pos,
        } => {
            let cond_id = lower_expr(ir, cond);
            let then_id = lower_stmt(ir, then_do);
            let else_id = match else_do {
                Some(e) => lower_stmt(ir, e),
                None => ir.push_stmt(StmtNode {
                    kind: StmtKind::Block { stmts: vec![] },
                    pos: pos.clone(),
                }),
            };
            ir.push_stmt(StmtNode {
                kind: StmtKind::If {
                    cond: cond_id,
                    then_do: then_id,
                    else_do: else_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Stmt::While { cond, body, pos } => {
            let cond_id = lower_expr(ir, cond);
            let body_id = lower_stmt(ir, body);
            ir.push_stmt(StmtNode {
                kind: StmtKind::While {
                    cond: cond_id,
                    body: body_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Stmt::ExprStmt { expr, pos } => {
            let expr_id = lower_expr(ir, expr);
            ir.push_stmt(StmtNode {
                kind: StmtKind::ExprStmt { expr: expr_id },
                pos: pos.clone(),
            })
        }
        ast::Stmt::Return { expr, pos } => {
            let expr_id = lower_expr(ir, expr);
            ir.push_stmt(StmtNode {
                kind: StmtKind::Return { expr: expr_id },
                pos: pos.clone(),
            })
        }
    }
}

fn lower_compare_op(op: ast::CompareOp) -> IrCompareOp {
    match op {
        ast::CompareOp::Eq => IrCompareOp::Eq,
        ast::CompareOp::Ne => IrCompareOp::Ne,
        ast::CompareOp::Lt => IrCompareOp::Lt,
        ast::CompareOp::Le => IrCompareOp::Le,
        ast::CompareOp::Gt => IrCompareOp::Gt,
        ast::CompareOp::Ge => IrCompareOp::Ge,
    }
}

fn lower_arithmetic_op(op: ast::ArithmeticOp) -> IrArithmeticOp {
    match op {
        ast::ArithmeticOp::Add => IrArithmeticOp::Add,
        ast::ArithmeticOp::Sub => IrArithmeticOp::Sub,
        ast::ArithmeticOp::Mul => IrArithmeticOp::Mul,
        ast::ArithmeticOp::Div => IrArithmeticOp::Div,
        ast::ArithmeticOp::Mod => IrArithmeticOp::Mod,
    }
}

fn lower_expr(ir: &mut Ir, e: &ast::Expr) -> ir::ExprId {
    match e {
        ast::Expr::Int(v, pos) => ir.push_expr(ExprNode {
            kind: ExprKind::Int(*v),
            pos: pos.clone(),
        }),
        ast::Expr::Name(name, pos) => ir.push_expr(ExprNode {
            kind: ExprKind::GetVar { name: name.clone() },
            pos: pos.clone(),
        }),
        ast::Expr::SetVar { name, value, pos } => {
            let value_id = lower_expr(ir, value);
            ir.push_expr(ExprNode {
                kind: ExprKind::SetVar {
                    name: name.clone(),
                    value: value_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::GetAttr { obj, attr, pos } => {
            let obj_id = lower_expr(ir, obj);
            ir.push_expr(ExprNode {
                kind: ExprKind::GetAttr {
                    obj: obj_id,
                    attr: attr.clone(),
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::SetAttr {
            obj,
            attr,
            value,
            pos,
        } => {
            let obj_id = lower_expr(ir, obj);
            let value_id = lower_expr(ir, value);
            ir.push_expr(ExprNode {
                kind: ExprKind::SetAttr {
                    obj: obj_id,
                    attr: attr.clone(),
                    value: value_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::GetStaticAttr {
            namespace,
            attr,
            pos,
        } => {
            let ns_id = lower_namespace(ir, namespace);
            ir.push_expr(ExprNode {
                kind: ExprKind::GetStaticAttr {
                    namespace: ns_id,
                    attr: attr.clone(),
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Compare {
            op,
            left,
            right,
            pos,
        } => {
            let left_id = lower_expr(ir, left);
            let right_id = lower_expr(ir, right);
            ir.push_expr(ExprNode {
                kind: ExprKind::Compare {
                    op: lower_compare_op(*op),
                    left: left_id,
                    right: right_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Arithmetic {
            op,
            left,
            right,
            pos,
        } => {
            let left_id = lower_expr(ir, left);
            let right_id = lower_expr(ir, right);
            ir.push_expr(ExprNode {
                kind: ExprKind::Arithmetic {
                    op: lower_arithmetic_op(*op),
                    left: left_id,
                    right: right_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Negate { right, pos } => {
            let right_id = lower_expr(ir, right);
            ir.push_expr(ExprNode {
                kind: ExprKind::Negate { right: right_id },
                pos: pos.clone(),
            })
        }
        ast::Expr::New { ty, args, pos } => {
            let ty_id = lower_type(ir, ty);
            let arg_ids = args.iter().map(|a| lower_expr(ir, a)).collect();
            ir.push_expr(ExprNode {
                kind: ExprKind::New {
                    ty: ty_id,
                    args: arg_ids,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Call { callee, args, pos } => {
            let callee_id = lower_expr(ir, callee);
            let arg_ids = args.iter().map(|a| lower_expr(ir, a)).collect();
            ir.push_expr(ExprNode {
                kind: ExprKind::Call {
                    callee: callee_id,
                    args: arg_ids,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Intrinsic { name, args, pos } => {
            let arg_ids = args.iter().map(|a| lower_expr(ir, a)).collect();
            ir.push_expr(ExprNode {
                kind: ExprKind::Intrinsic {
                    name: name.clone(),
                    args: arg_ids,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Lambda {
            params, body, pos, ..
        } => {
            let param_ids = params.iter().map(|p| lower_param(ir, p)).collect();
            // A lambda in value position always carries a body; the parser
            // never hands us one without, so `body` being absent here would
            // mean this node was actually meant as a type annotation (see
            // `lower_type`), not as a value.
            let body_id = match body {
                Some(b) => lower_expr(ir, b),
                None => ir.push_expr(ExprNode {
                    kind: ExprKind::Tuple { items: vec![] },
                    pos: pos.clone(),
                }),
            };
            ir.push_expr(ExprNode {
                kind: ExprKind::Lambda {
                    params: param_ids,
                    body: body_id,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Tuple { items, pos } => {
            let item_ids = items.iter().map(|i| lower_expr(ir, i)).collect();
            ir.push_expr(ExprNode {
                kind: ExprKind::Tuple { items: item_ids },
                pos: pos.clone(),
            })
        }
        ast::Expr::Is {
            expr,
            variant,
            bind_name,
            pos,
        } => {
            let expr_id = lower_expr(ir, expr);
            ir.push_expr(ExprNode {
                kind: ExprKind::Is {
                    expr: expr_id,
                    variant: variant.clone(),
                    bind_name: bind_name.clone(),
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::NoType(pos) => ir.push_expr(ExprNode {
            kind: ExprKind::Tuple { items: vec![] },
            pos: pos.clone(),
        }),
    }
}

/// Lower an optional annotation expression, substituting an explicit
/// `NoType` node (anchored at `fallback_pos`) when absent.
fn lower_annotation(ir: &mut Ir, ann: Option<&ast::Expr>, fallback_pos: &aize_core::source::Position) -> ir::TypeExprId {
    match ann {
        Some(e) => lower_type(ir, e),
        None => ir.push_type_expr(TypeExprNode {
            kind: TypeExprKind::NoType,
            pos: fallback_pos.clone(),
        }),
    }
}

/// Lower an expression used in type position. A bare name is a type
/// reference, a body-less lambda is a function-type, a tuple of types is a
/// tuple type; anything else is not a legal type expression.
fn lower_type(ir: &mut Ir, e: &ast::Expr) -> ir::TypeExprId {
    match e {
        ast::Expr::Name(name, pos) => ir.push_type_expr(TypeExprNode {
            kind: TypeExprKind::GetType { name: name.clone() },
            pos: pos.clone(),
        }),
        ast::Expr::Lambda {
            params,
            body: None,
            ret,
            pos,
        } => {
            let param_tys = params.iter().map(|p| lower_type(ir, &p.ty)).collect();
            let ret_ty = match ret {
                Some(r) => lower_type(ir, r),
                None => ir.push_type_expr(TypeExprNode {
                    kind: TypeExprKind::NoType,
                    pos: pos.clone(),
                }),
            };
            ir.push_type_expr(TypeExprNode {
                kind: TypeExprKind::FuncType {
                    params: param_tys,
                    ret: ret_ty,
                },
                pos: pos.clone(),
            })
        }
        ast::Expr::Tuple { items, pos } => {
            let item_tys = items.iter().map(|i| lower_type(ir, i)).collect();
            ir.push_type_expr(TypeExprNode {
                kind: TypeExprKind::TupleType { items: item_tys },
                pos: pos.clone(),
            })
        }
        ast::Expr::NoType(pos) => ir.push_type_expr(TypeExprNode {
            kind: TypeExprKind::NoType,
            pos: pos.clone(),
        }),
        other => ir.push_type_expr(TypeExprNode {
            kind: TypeExprKind::Malformed,
            pos: other.pos(),
        }),
    }
}

/// Lower an expression used in static-path position (`namespace::attr`). The
/// surface grammar only ever nests a bare name here; anything else is not a
/// legal namespace expression.
fn lower_namespace(ir: &mut Ir, e: &ast::Expr) -> ir::NamespaceExprId {
    match e {
        ast::Expr::Name(name, pos) => ir.push_namespace_expr(NamespaceExprNode {
            kind: NamespaceExprKind::GetNamespace { name: name.clone() },
            pos: pos.clone(),
        }),
        other => ir.push_namespace_expr(NamespaceExprNode {
            kind: NamespaceExprKind::Malformed,
            pos: other.pos(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aize_core::source::{Position, SourceRegistry};

    fn src(source_id: aize_core::source::SourceId, top_levels: Vec<ast::TopLevel>) -> ast::Source {
        ast::Source {
            key: SourceKey::Name("t".into()),
            display_name: "t.aize".into(),
            top_levels,
            source_id,
        }
    }

    fn dummy_id() -> aize_core::source::SourceId {
        let mut registry = SourceRegistry::new();
        registry
            .get_or_insert(SourceKey::Name("t".into()), "t.aize".into(), "")
            .0
    }

    #[test]
    fn lowers_a_function_with_int_params_and_return() {
        let f = ast::Function {
            name: "add".into(),
            params: vec![
                ast::Param {
                    name: "a".into(),
                    ty: ast::Expr::Name("int32".into(), Position::None),
                    pos: Position::None,
                },
                ast::Param {
                    name: "b".into(),
                    ty: ast::Expr::Name("int32".into(), Position::None),
                    pos: Position::None,
                },
            ],
            ret: Some(ast::Expr::Name("int32".into(), Position::None)),
            body: vec![ast::Stmt::Return {
                expr: ast::Expr::Arithmetic {
                    op: ast::ArithmeticOp::Add,
                    left: Box::new(ast::Expr::Name("a".into(), Position::None)),
                    right: Box::new(ast::Expr::Name("b".into(), Position::None)),
                    pos: Position::None,
                },
                pos: Position::None,
            }],
            attrs: vec![],
            pos: Position::None,
        };
        let program = src(dummy_id(), vec![ast::TopLevel::Function(f)]);
        let ir = lower_program(&[program]);
        assert_eq!(ir.program.sources.len(), 1);
        let source = ir.source(ir.program.sources[0]);
        assert_eq!(source.top_levels.len(), 1);
        let ir::TopLevelId::Function(func_id) = source.top_levels[0] else {
            panic!("expected a function");
        };
        let function = ir.function(func_id);
        assert_eq!(function.name, "add");
        assert_eq!(function.params.len(), 2);
        match &ir.type_expr(function.ret).kind {
            TypeExprKind::GetType { name } => assert_eq!(name, "int32"),
            other => panic!("unexpected ret type kind: {other:?}"),
        }
    }

    #[test]
    fn lambda_without_body_lowers_to_a_function_type() {
        let ty = ast::Expr::Lambda {
            params: vec![ast::Param {
                name: "_".into(),
                ty: ast::Expr::Name("int32".into(), Position::None),
                pos: Position::None,
            }],
            body: None,
            ret: Some(Box::new(ast::Expr::Name("bool".into(), Position::None))),
            pos: Position::None,
        };
        let mut ir = Ir::new();
        let id = lower_type(&mut ir, &ty);
        match &ir.type_expr(id).kind {
            TypeExprKind::FuncType { params, ret } => {
                assert_eq!(params.len(), 1);
                match &ir.type_expr(*ret).kind {
                    TypeExprKind::GetType { name } => assert_eq!(name, "bool"),
                    other => panic!("unexpected: {other:?}"),
                }
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn if_without_else_lowers_to_an_empty_block() {
        let stmt = ast::Stmt::If {
            cond: ast::Expr::Int(1, Position::None),
            then_do: Box::new(ast::Stmt::ExprStmt {
                expr: ast::Expr::Int(1, Position::None),
                pos: Position::None,
            }),
            else_do: None,
            pos: Position::None,
        };
        let mut ir = Ir::new();
        let id = lower_stmt(&mut ir, &stmt);
        match &ir.stmt(id).kind {
            StmtKind::If { else_do, .. } => match &ir.stmt(*else_do).kind {
                StmtKind::Block { stmts } => assert!(stmts.is_empty()),
                other => panic!("unexpected: {other:?}"),
            },
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn import_resolved_key_backfills_to_the_target_sources_ir_id() {
        let leaf = src(dummy_id(), vec![]);
        let mut leaf = leaf;
        leaf.key = SourceKey::Name("leaf".into());
        let import = ast::Import {
            anchor_text: None,
            segments: vec!["leaf".into()],
            resolved_key: Some(SourceKey::Name("leaf".into())),
            pos: Position::None,
        };
        let mut entry = src(dummy_id(), vec![ast::TopLevel::Import(import)]);
        entry.key = SourceKey::Name("entry".into());
        let ir = lower_program(&[entry, leaf]);
        let entry_source = ir.source(ir.program.sources[0]);
        let ir::TopLevelId::Import(import_id) = entry_source.top_levels[0] else {
            panic!("expected an import");
        };
        assert_eq!(ir.import(import_id).resolved, Some(ir.program.sources[1]));
    }
}
