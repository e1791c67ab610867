//! `DeclareTypes`: binds each source's imports to a local namespace alias,
//! and registers every struct/union's [`TypeSymbol`] with its fields or
//! variants resolved — but not yet its aggregate functions, which need the
//! struct/union's own type to exist first (see `declare_functions`).

use crate::diagnostics::{DiagnosticKind, Diagnostics, Fatal};
use crate::pass::Pass;
use crate::passes::type_expr::resolve_type_expr;
use crate::symbol_data::SymbolData;
use aize_core::ir::{Ir, StructId, TopLevelId, UnionId};
use aize_core::symbol::{NamespaceSymbolId, TypeSymbol};
use indexmap::IndexMap;

pub struct DeclareTypes;

impl Pass for DeclareTypes {
    fn name(&self) -> &'static str {
        "declare_types"
    }

    fn required_passes(&self) -> &'static [&'static str] {
        &["init_symbols"]
    }

    fn run(&mut self, ir: &mut Ir, diagnostics: &mut Diagnostics) -> Result<(), Fatal> {
        let mut data = ir.extensions.remove::<SymbolData>().expect("init_symbols ran first");
        let sources = ir.program.sources.clone();
        for source_id in sources {
            let ns = data.source_namespace(source_id);
            let top_levels = ir.source(source_id).top_levels.clone();
            for top_level in top_levels {
                match top_level {
                    TopLevelId::Import(import_id) => {
                        declare_import(ir, &mut data, ns, import_id, diagnostics)?;
                    }
                    TopLevelId::Struct(struct_id) => {
                        declare_struct(ir, &mut data, ns, struct_id, diagnostics)?;
                    }
                    TopLevelId::Union(union_id) => {
                        declare_union(ir, &mut data, ns, union_id, diagnostics)?;
                    }
                    TopLevelId::Function(_) => {}
                }
            }
        }
        ir.extensions.insert(data);
        Ok(())
    }
}

fn declare_import(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    import_id: aize_core::ir::ImportId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let import = ir.import(import_id);
    let Some(target_source) = import.resolved else {
        // Not yet resolved by the import-tracing driver; nothing to alias.
        return Ok(());
    };
    let Some(bound_name) = import.path.segments.last().cloned() else {
        return Ok(());
    };
    let target_ns = data.source_namespace(target_source);
    let pos = import.pos.clone();
    if let Err(err) = data.table.alias_namespace(ns, &bound_name, target_ns, pos.clone()) {
        report_symbol_error(diagnostics, pos, err)?;
    }
    Ok(())
}

fn declare_struct(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    struct_id: StructId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let node = ir.struct_(struct_id).clone();
    let mut fields = IndexMap::new();
    for field_id in &node.fields {
        let field = ir.agg_field(*field_id);
        let ty = resolve_type_expr(ir, data, ns, field.ty, diagnostics)?;
        if let Some(previous) = fields.insert(
            field.name.clone(),
            aize_core::symbol::FieldEntry {
                ty,
                pos: field.pos.clone(),
            },
        ) {
            diagnostics
                .report(
                    field.pos.clone(),
                    DiagnosticKind::RepeatedField {
                        name: field.name.clone(),
                        previous: previous.pos,
                    },
                )
                .emit()?;
        }
    }
    let ty_id = data.table.push_type(TypeSymbol::Struct {
        name: node.name.clone(),
        fields,
        funcs: IndexMap::new(),
        pos: node.pos.clone(),
    });
    if let Err(err) = data
        .table
        .define_type(ns, &node.name, clone_type(data, ty_id), node.pos.clone(), true)
    {
        report_symbol_error(diagnostics, node.pos.clone(), err)?;
    }
    let struct_ns = data
        .table
        .define_namespace(ns, node.name.clone(), node.pos.clone(), true, true)
        .expect("struct body namespaces are never redefined once their type registration above succeeded");
    data.set_struct(struct_id, ty_id, struct_ns);
    Ok(())
}

fn declare_union(
    ir: &Ir,
    data: &mut SymbolData,
    ns: NamespaceSymbolId,
    union_id: UnionId,
    diagnostics: &mut Diagnostics,
) -> Result<(), Fatal> {
    let node = ir.union_(union_id).clone();
    let mut variants = IndexMap::new();
    // The union's own TypeSymbolId is only known once it is pushed, but each
    // UnionVariant needs to point back at it; reserve the slot first.
    let union_ty_id = data.table.push_type(TypeSymbol::Errored);
    for (index, variant_id) in node.variants.iter().enumerate() {
        let variant = ir.variant(*variant_id);
        let contains = resolve_type_expr(ir, data, ns, variant.ty, diagnostics)?;
        let variant_ty = data.table.push_type(TypeSymbol::UnionVariant {
            name: variant.name.clone(),
            index: index as u32,
            contains,
            union: union_ty_id,
            pos: variant.pos.clone(),
        });
        if let Some(previous_ty) = variants.insert(variant.name.clone(), variant_ty) {
            let previous = match data.table.type_symbol(previous_ty) {
                TypeSymbol::UnionVariant { pos, .. } => pos.clone(),
                _ => variant.pos.clone(),
            };
            diagnostics
                .report(
                    variant.pos.clone(),
                    DiagnosticKind::RepeatedVariant {
                        name: variant.name.clone(),
                        previous,
                    },
                )
                .emit()?;
        }
        // A variant is independently name-resolvable in the enclosing
        // namespace, not just reachable through the union's own `variants`
        // map: `New(Some, ...)` looks `Some` up as a bare type name.
        if let Err(err) = data.table.define_type(
            ns,
            &variant.name,
            clone_type(data, variant_ty),
            variant.pos.clone(),
            true,
        ) {
            report_symbol_error(diagnostics, variant.pos.clone(), err)?;
        }
    }
    *data.table.type_symbol_mut(union_ty_id) = TypeSymbol::Union {
        name: node.name.clone(),
        variants,
        funcs: IndexMap::new(),
        pos: node.pos.clone(),
    };
    if let Err(err) = data.table.define_type(
        ns,
        &node.name,
        clone_type(data, union_ty_id),
        node.pos.clone(),
        true,
    ) {
        report_symbol_error(diagnostics, node.pos.clone(), err)?;
    }
    let union_ns = data
        .table
        .define_namespace(ns, node.name.clone(), node.pos.clone(), true, true)
        .expect("union body namespaces are never redefined once their type registration above succeeded");
    data.set_union(union_id, union_ty_id, union_ns);
    Ok(())
}

/// `define_type` takes ownership of a fresh `TypeSymbol`, but the type was
/// already pushed once above to obtain its id; this builds the second,
/// identical entry `define_type` needs without re-deriving its contents by
/// hand. Both ids end up denoting equal (if not identical) data, and only
/// the one returned by the first `push_type` is ever referenced afterward.
fn clone_type(data: &SymbolData, id: aize_core::symbol::TypeSymbolId) -> TypeSymbol {
    data.table.type_symbol(id).clone()
}

fn report_symbol_error(
    diagnostics: &mut Diagnostics,
    pos: aize_core::source::Position,
    err: aize_core::symbol::SymbolError,
) -> Result<(), Fatal> {
    match err {
        aize_core::symbol::SymbolError::DuplicateSymbol { kind, name, previous, .. } => {
            diagnostics
                .report(pos, DiagnosticKind::DuplicateDefinition { kind, name, previous })
                .emit()
        }
        aize_core::symbol::SymbolError::FailedLookup { kind, name, pos: at } => diagnostics
            .report(at, DiagnosticKind::UndefinedName { kind, name })
            .emit(),
    }
}
