//! Type-keyed bag of analysis-derived data attached to an [`super::Ir`] tree.
//!
//! Passes never store their results on IR nodes directly; they populate a
//! separate extension value (e.g. a symbol-resolution table) and register it
//! here. This is what lets the pass scheduler ask "has extension X been
//! populated yet" as a plain type-presence check, and what keeps IR nodes
//! themselves immutable data independent of which passes have run.

use std::any::{Any, TypeId};
use std::collections::HashMap;

#[derive(Default)]
pub struct ExtensionRegistry {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension value. Replaces any previous value of the
    /// same type.
    pub fn insert<E: 'static>(&mut self, ext: E) {
        self.map.insert(TypeId::of::<E>(), Box::new(ext));
    }

    pub fn contains<E: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<E>())
    }

    pub fn get<E: 'static>(&self) -> Option<&E> {
        self.map
            .get(&TypeId::of::<E>())
            .and_then(|b| b.downcast_ref::<E>())
    }

    /// # Panics
    /// Panics if `E` has not been registered; reading an extension a pass
    /// did not declare as a prerequisite is a scheduling bug.
    pub fn expect<E: 'static>(&self) -> &E {
        self.get::<E>()
            .unwrap_or_else(|| panic!("extension {:?} not registered", TypeId::of::<E>()))
    }

    pub fn get_mut<E: 'static>(&mut self) -> Option<&mut E> {
        self.map
            .get_mut(&TypeId::of::<E>())
            .and_then(|b| b.downcast_mut::<E>())
    }

    pub fn expect_mut<E: 'static>(&mut self) -> &mut E {
        self.get_mut::<E>()
            .unwrap_or_else(|| panic!("extension not registered"))
    }

    /// Take ownership of a registered extension, removing it from the
    /// registry. Passes that need to mutate an extension by value (rather
    /// than through `&mut`) pull it out with this and `insert` it back when
    /// done, since the registry itself does not support in-place field
    /// mutation through a borrowed entry.
    pub fn remove<E: 'static>(&mut self) -> Option<E> {
        self.map
            .remove(&TypeId::of::<E>())
            .map(|b| *b.downcast::<E>().unwrap_or_else(|_| unreachable!()))
    }
}

/// A single-writer slot map: every key may be written at most once, and
/// reading a key that was never written panics rather than silently
/// returning a default. Extension structs (e.g. `SymbolData` in
/// `aize-compiler`) build their per-node-category tables out of these.
pub struct SlotMap<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> Default for SlotMap<K, V> {
    fn default() -> Self {
        SlotMap {
            map: HashMap::new(),
        }
    }
}

impl<K: Eq + std::hash::Hash + Copy + std::fmt::Debug, V> SlotMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    /// Panics if `key` was already set; an extension slot is populated by
    /// exactly one pass, exactly once, per node.
    pub fn set(&mut self, key: K, value: V) {
        if self.map.insert(key, value).is_some() {
            panic!("extension slot for {key:?} set twice");
        }
    }

    pub fn get(&self, key: K) -> &V {
        self.map
            .get(&key)
            .unwrap_or_else(|| panic!("extension slot for {key:?} read before it was set"))
    }

    pub fn get_opt(&self, key: K) -> Option<&V> {
        self.map.get(&key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.map.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Foo(u32);
    struct Bar(&'static str);

    #[test]
    fn registry_distinguishes_types() {
        let mut reg = ExtensionRegistry::new();
        reg.insert(Foo(1));
        reg.insert(Bar("x"));
        assert!(reg.contains::<Foo>());
        assert!(reg.contains::<Bar>());
        assert_eq!(reg.expect::<Foo>().0, 1);
        assert_eq!(reg.expect::<Bar>().0, "x");
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn reading_missing_extension_panics() {
        let reg = ExtensionRegistry::new();
        reg.expect::<Foo>();
    }

    #[test]
    fn remove_returns_ownership_and_clears_the_slot() {
        let mut reg = ExtensionRegistry::new();
        reg.insert(Foo(9));
        let foo = reg.remove::<Foo>().unwrap();
        assert_eq!(foo.0, 9);
        assert!(!reg.contains::<Foo>());
        assert!(reg.remove::<Foo>().is_none());
    }

    #[test]
    #[should_panic(expected = "set twice")]
    fn slot_map_rejects_double_write() {
        let mut slots: SlotMap<u32, &str> = SlotMap::new();
        slots.set(0, "a");
        slots.set(0, "b");
    }

    #[test]
    #[should_panic(expected = "read before it was set")]
    fn slot_map_rejects_read_of_unset() {
        let slots: SlotMap<u32, &str> = SlotMap::new();
        slots.get(0);
    }
}
