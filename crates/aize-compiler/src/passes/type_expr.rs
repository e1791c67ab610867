//! Resolving a [`TypeExprId`] to a [`TypeSymbolId`] — shared by every pass
//! that needs to turn a type annotation into an actual type (field/variant
//! types, parameter/return types, `New`'s type argument). `VarDecl`'s
//! `NoType` ("infer from the value") is the one annotation site that is
//! legitimately absent; everywhere else a [`TypeExprKind::NoType`] reaching
//! this function means the input was malformed, handled the same as an
//! unrecognized shape.

use crate::diagnostics::{DiagnosticKind, Diagnostics, Fatal};
use crate::symbol_data::SymbolData;
use aize_core::ir::{Ir, TypeExprId, TypeExprKind};
use aize_core::symbol::{NamespaceSymbolId, TypeSymbol};

pub(crate) fn resolve_type_expr(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    id: TypeExprId,
    diagnostics: &mut Diagnostics,
) -> Result<aize_core::symbol::TypeSymbolId, Fatal> {
    let node = ir.type_expr(id);
    let pos = node.pos.clone();
    match &node.kind {
        TypeExprKind::GetType { name } => {
            let name = name.clone();
            match data.table.lookup_type(ns, &name, false, pos.clone()) {
                Ok(ty) => Ok(ty),
                Err(_) => {
                    diagnostics
                        .report(
                            pos,
                            DiagnosticKind::UndefinedName {
                                kind: aize_core::symbol::SymbolKind::Type,
                                name,
                            },
                        )
                        .emit()?;
                    Ok(data.table.push_type(TypeSymbol::Errored))
                }
            }
        }
        TypeExprKind::FuncType { params, ret } => {
            let params = params.clone();
            let ret = *ret;
            let mut param_tys = Vec::with_capacity(params.len());
            for p in params {
                param_tys.push(resolve_type_expr(ir, data, ns, p, diagnostics)?);
            }
            let ret_ty = resolve_type_expr(ir, data, ns, ret, diagnostics)?;
            Ok(data.table.push_type(TypeSymbol::Function {
                params: param_tys,
                ret: ret_ty,
            }))
        }
        TypeExprKind::TupleType { items } => {
            let items = items.clone();
            let mut item_tys = Vec::with_capacity(items.len());
            for item in items {
                item_tys.push(resolve_type_expr(ir, data, ns, item, diagnostics)?);
            }
            Ok(data.table.push_type(TypeSymbol::Tuple { items: item_tys }))
        }
        TypeExprKind::NoType | TypeExprKind::Generated | TypeExprKind::Malformed => {
            diagnostics
                .report(pos, DiagnosticKind::MalformedTypeExpr)
                .emit()?;
            Ok(data.table.push_type(TypeSymbol::Errored))
        }
    }
}
