//! `InitSymbols`: the first declared pass. Builds the builtin namespace (the
//! seven builtin integer types, `bool` among them) and one child namespace
//! per source, then registers the resulting [`SymbolData`] as an extension.

use crate::diagnostics::{Diagnostics, Fatal};
use crate::pass::Pass;
use crate::symbol_data::SymbolData;
use aize_core::ir::Ir;
use aize_core::source::Position;
use aize_core::symbol::{SymbolTable, TypeSymbol};

/// `(name, signed, bits)` for every builtin integer type. `bool` is an
/// unsigned 1-bit integer, not a distinct kind of type.
const BUILTIN_INTS: &[(&str, bool, u32)] = &[
    ("bool", false, 1),
    ("uint8", false, 8),
    ("uint32", false, 32),
    ("uint64", false, 64),
    ("int8", true, 8),
    ("int32", true, 32),
    ("int64", true, 64),
];

pub struct InitSymbols;

impl Pass for InitSymbols {
    fn name(&self) -> &'static str {
        "init_symbols"
    }

    fn run(&mut self, ir: &mut Ir, _diagnostics: &mut Diagnostics) -> Result<(), Fatal> {
        let mut data = SymbolData::new(SymbolTable::new());

        for (name, signed, bits) in BUILTIN_INTS {
            data.table
                .define_type(
                    data.program_ns,
                    name,
                    TypeSymbol::Int {
                        name: (*name).to_string(),
                        signed: *signed,
                        bits: *bits,
                    },
                    Position::Builtin,
                    true,
                )
                .expect("builtin types are each defined exactly once");
        }

        let sources = ir.program.sources.clone();
        for source_id in sources {
            let display_name = ir.source(source_id).display_name.clone();
            let label = format!("source#{}", source_id.as_u32());
            // Not visible: a source's namespace is reached structurally, via
            // `SymbolData::source_namespace`, never by looking up its
            // synthetic label from the program namespace.
            let ns = data
                .table
                .define_namespace(
                    data.program_ns,
                    label,
                    Position::Source { name: display_name },
                    false,
                    true,
                )
                .expect("one namespace registered per source, each under a unique label");
            data.set_source_namespace(source_id, ns);
        }

        ir.extensions.insert(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SinkConfig;
    use aize_core::ir::SourceNode;

    #[test]
    fn registers_all_seven_builtin_int_types() {
        let mut ir = Ir::new();
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        InitSymbols.run(&mut ir, &mut diagnostics).unwrap();
        let data = ir.extensions.expect::<SymbolData>();
        for (name, ..) in BUILTIN_INTS {
            assert!(data
                .table
                .lookup_type(data.program_ns, name, true, Position::None)
                .is_ok());
        }
    }

    #[test]
    fn each_source_gets_its_own_namespace() {
        let mut ir = Ir::new();
        let id = ir.push_source(SourceNode {
            top_levels: vec![],
            display_name: "a.aize".into(),
            source_id: {
                let mut registry = aize_core::source::SourceRegistry::new();
                registry
                    .get_or_insert(
                        aize_core::source::SourceKey::Name("a".into()),
                        "a.aize".into(),
                        "",
                    )
                    .0
            },
        });
        ir.program.sources.push(id);
        let mut diagnostics = Diagnostics::new(SinkConfig::default());
        InitSymbols.run(&mut ir, &mut diagnostics).unwrap();
        let data = ir.extensions.expect::<SymbolData>();
        let ns = data.source_namespace(id);
        assert_eq!(data.table.root_of(ns), data.program_ns);
    }
}
