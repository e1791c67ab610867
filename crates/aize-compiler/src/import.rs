//! Import anchor parsing and the collaborator that turns an import path into
//! another source's parsed AST.
//!
//! Reading a file and invoking a parser on it are both outside this crate's
//! job; [`ImportResolver`] is the seam a driver plugs a real filesystem (or
//! an in-memory fixture, for tests) in through.

use crate::ast::{Source, TopLevel};
use aize_core::ir::ImportAnchor;
use aize_core::source::{Position, SourceKey};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ImportError {
    #[error("'{0}' is not a valid import anchor")]
    BadAnchor(String),
    #[error("could not find '{0}'")]
    NotFound(String),
    #[error("a source cannot import itself")]
    SelfImport,
}

/// Parse the literal anchor prefix token a surface `import` path carried, if
/// any. Absence defaults to [`ImportAnchor::Project`].
pub fn parse_anchor(anchor_text: Option<&str>) -> Result<ImportAnchor, ImportError> {
    match anchor_text {
        None => Ok(ImportAnchor::Project),
        Some("std") => Ok(ImportAnchor::Std),
        Some("project") => Ok(ImportAnchor::Project),
        Some("local") => Ok(ImportAnchor::Local),
        Some(other) => Err(ImportError::BadAnchor(other.to_string())),
    }
}

/// Render an anchor and its path segments back into the display form used
/// in diagnostics (`<std>/io/read`, `foo/bar`, ...).
pub fn display_path(anchor: &ImportAnchor, segments: &[String]) -> String {
    let joined = segments.join("/");
    match anchor {
        ImportAnchor::Std => format!("<std>/{joined}"),
        ImportAnchor::Local => format!("<local>/{joined}"),
        ImportAnchor::Project => joined,
    }
}

/// Resolves an import's anchor and path segments to the source it names.
/// Implemented by whatever drives compilation (a filesystem loader in
/// production, an in-memory map in tests); this crate only calls it.
pub trait ImportResolver {
    /// Resolve `anchor`/`segments`, as imported from `importing`, to a
    /// dedup key and the already-parsed AST for that source.
    ///
    /// Implementations are expected to themselves report
    /// [`ImportError::NotFound`] for anything that does not exist;
    /// self-import detection is handled by the caller, which knows the
    /// importing source's own key.
    fn resolve(
        &mut self,
        anchor: ImportAnchor,
        segments: &[String],
        importing: &SourceKey,
    ) -> Result<(SourceKey, Source), ImportError>;
}

/// Resolve every import reachable (transitively) from `entry`, in the order
/// sources are first referenced, deduplicating by [`SourceKey`]. Each
/// [`crate::ast::Import::resolved_key`] is filled in along the way, so
/// [`crate::lower`] can later look up which already-lowered source an import
/// points at. Returns the full program's sources, `entry` first.
pub fn trace_imports(
    entry: Source,
    resolver: &mut dyn ImportResolver,
) -> Result<Vec<Source>, (ImportError, Position)> {
    let mut seen = HashSet::new();
    seen.insert(entry.key.clone());
    let mut sources = vec![entry];
    let mut i = 0;
    while i < sources.len() {
        let own_key = sources[i].key.clone();
        let mut discovered = Vec::new();
        for top_level in &mut sources[i].top_levels {
            let TopLevel::Import(import) = top_level else {
                continue;
            };
            let anchor = parse_anchor(import.anchor_text.as_deref())
                .map_err(|e| (e, import.pos.clone()))?;
            let (resolved_key, resolved_source) = resolver
                .resolve(anchor, &import.segments, &own_key)
                .map_err(|e| (e, import.pos.clone()))?;
            if resolved_key == own_key {
                return Err((ImportError::SelfImport, import.pos.clone()));
            }
            import.resolved_key = Some(resolved_key.clone());
            if seen.insert(resolved_key) {
                discovered.push(resolved_source);
            }
        }
        sources.extend(discovered);
        i += 1;
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_anchor_defaults_to_project() {
        assert_eq!(parse_anchor(None).unwrap(), ImportAnchor::Project);
    }

    #[test]
    fn unknown_anchor_is_rejected() {
        assert!(parse_anchor(Some("bogus")).is_err());
    }

    fn dummy_source_id() -> aize_core::source::SourceId {
        let mut registry = aize_core::source::SourceRegistry::new();
        registry
            .get_or_insert(SourceKey::Name("dummy".into()), "dummy".into(), "")
            .0
    }

    struct MapResolver(std::collections::HashMap<String, Source>);

    impl ImportResolver for MapResolver {
        fn resolve(
            &mut self,
            _anchor: ImportAnchor,
            segments: &[String],
            _importing: &SourceKey,
        ) -> Result<(SourceKey, Source), ImportError> {
            let joined = segments.join("/");
            self.0
                .get(&joined)
                .cloned()
                .map(|s| (SourceKey::Name(joined.clone()), s))
                .ok_or(ImportError::NotFound(joined))
        }
    }

    fn import_of(segments: &[&str]) -> TopLevel {
        TopLevel::Import(crate::ast::Import {
            anchor_text: None,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            resolved_key: None,
            pos: Position::None,
        })
    }

    #[test]
    fn dedups_a_source_imported_from_two_places() {
        let leaf = Source {
            key: SourceKey::Name("leaf".into()),
            display_name: "leaf".into(),
            top_levels: vec![],
            source_id: dummy_source_id(),
        };
        let mut map = std::collections::HashMap::new();
        map.insert("leaf".to_string(), leaf);
        let mut resolver = MapResolver(map);

        let entry = Source {
            key: SourceKey::Name("entry".into()),
            display_name: "entry".into(),
            top_levels: vec![import_of(&["leaf"]), import_of(&["leaf"])],
            source_id: dummy_source_id(),
        };
        let resolved = trace_imports(entry, &mut resolver).unwrap();
        // entry + one deduplicated leaf
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn self_import_is_rejected() {
        let entry = Source {
            key: SourceKey::Name("entry".into()),
            display_name: "entry".into(),
            top_levels: vec![import_of(&["entry"])],
            source_id: dummy_source_id(),
        };
        let mut resolver = MapResolver(std::collections::HashMap::from([(
            "entry".to_string(),
            entry.clone(),
        )]));
        let err = trace_imports(entry, &mut resolver).unwrap_err().0;
        assert!(matches!(err, ImportError::SelfImport));
    }
}
