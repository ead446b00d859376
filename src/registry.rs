// src/registry.rs
//
// TypeRegistry: the process-wide schema-name -> factory map the JSON codec
// consults on read (`instance_from_schema`) and write (downgrade rewrite).
// Registration is expected at startup only; after that the registry is
// read-mostly, so the mutex in `REGISTRY` is never expected to contend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::any::AnyDictionary;
use crate::error::{Error, Result};
use crate::object::{NodeRef, UnknownState};

pub type Factory = dyn Fn() -> NodeRef + Send + Sync;
pub type UpgradeFn = dyn Fn(AnyDictionary) -> AnyDictionary + Send + Sync;
pub type DowngradeFn = dyn Fn(AnyDictionary) -> AnyDictionary + Send + Sync;

struct TypeInfo {
    current_version: i64,
    factory: std::sync::Arc<Factory>,
    upgrades: HashMap<i64, std::sync::Arc<UpgradeFn>>,
    downgrades: HashMap<i64, std::sync::Arc<DowngradeFn>>,
}

#[derive(Default)]
struct RegistryInner {
    types: HashMap<String, TypeInfo>,
}

static REGISTRY: Lazy<Mutex<RegistryInner>> = Lazy::new(|| Mutex::new(RegistryInner::default()));

fn lock() -> MutexGuard<'static, RegistryInner> {
    REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// First registration wins. Re-registering an already-registered schema name
/// is a no-op that still reports success: the registry has no way to compare
/// two `Fn` closures for "same behavior" (wrapping each in a fresh `Arc`
/// gives every call a distinct heap address, so pointer equality can never
/// recognize a logically-identical factory offered a second time), so a
/// repeat registration is treated as idempotent regardless of the factory
/// passed, matching what callers like `register_builtins` actually need
/// (safe to call more than once).
pub fn register_type(
    schema_name: impl Into<String>,
    current_version: i64,
    factory: impl Fn() -> NodeRef + Send + Sync + 'static,
) -> bool {
    let schema_name = schema_name.into();
    let mut registry = lock();
    match registry.types.get(&schema_name) {
        None => {
            tracing::debug!(schema = %schema_name, version = current_version, "registered schema");
            registry.types.insert(
                schema_name,
                TypeInfo {
                    current_version,
                    factory: std::sync::Arc::new(factory),
                    upgrades: HashMap::new(),
                    downgrades: HashMap::new(),
                },
            );
            true
        }
        Some(_) => {
            tracing::debug!(schema = %schema_name, "schema already registered, ignoring re-registration");
            true
        }
    }
}

/// Register `alias` as another name for an already-registered schema,
/// sharing its factory and version tables. Used for the legacy names the
/// format still has to read (`Filler` -> `Gap`, `Sequence` -> `Track`,
/// `SerializeableCollection` -> `SerializableCollection`).
pub fn register_type_from_existing_type(alias: impl Into<String>, existing_name: &str) -> Result<()> {
    let alias = alias.into();
    let mut registry = lock();
    let existing = registry
        .types
        .get(existing_name)
        .ok_or_else(|| Error::SchemaNotRegistered(existing_name.to_string()))?;
    let cloned = TypeInfo {
        current_version: existing.current_version,
        factory: existing.factory.clone(),
        upgrades: existing.upgrades.clone(),
        downgrades: existing.downgrades.clone(),
    };
    registry.types.insert(alias, cloned);
    Ok(())
}

/// Installed upgrade functions run in increasing order of `version_to_upgrade_to`
/// when the on-disk version is below `current_version`.
pub fn register_upgrade_function(
    schema_name: &str,
    version_to_upgrade_to: i64,
    f: impl Fn(AnyDictionary) -> AnyDictionary + Send + Sync + 'static,
) -> Result<()> {
    let mut registry = lock();
    let info = registry
        .types
        .get_mut(schema_name)
        .ok_or_else(|| Error::SchemaNotRegistered(schema_name.to_string()))?;
    info.upgrades.insert(version_to_upgrade_to, std::sync::Arc::new(f));
    Ok(())
}

/// Installed downgrade functions run in decreasing order of `version_to_downgrade_from`
/// when writing to a target version below `current_version`.
pub fn register_downgrade_function(
    schema_name: &str,
    version_to_downgrade_from: i64,
    f: impl Fn(AnyDictionary) -> AnyDictionary + Send + Sync + 'static,
) -> Result<()> {
    let mut registry = lock();
    let info = registry
        .types
        .get_mut(schema_name)
        .ok_or_else(|| Error::SchemaNotRegistered(schema_name.to_string()))?;
    info.downgrades.insert(version_to_downgrade_from, std::sync::Arc::new(f));
    Ok(())
}

pub fn current_version(schema_name: &str) -> Option<i64> {
    lock().types.get(schema_name).map(|info| info.current_version)
}

/// Apply every registered upgrade function whose key exceeds `on_disk_version`,
/// in increasing key order, to bring `fields` up to `current_version`.
pub fn upgrade(schema_name: &str, on_disk_version: i64, mut fields: AnyDictionary) -> AnyDictionary {
    let registry = lock();
    let Some(info) = registry.types.get(schema_name) else { return fields };
    let mut keys: Vec<i64> = info.upgrades.keys().copied().filter(|v| *v > on_disk_version).collect();
    keys.sort_unstable();
    for version in keys {
        fields = (info.upgrades[&version])(fields);
    }
    fields
}

/// Apply every registered downgrade function whose key exceeds `target_version`,
/// in decreasing key order, to bring `fields` down from `current_version`.
pub fn downgrade(schema_name: &str, target_version: i64, mut fields: AnyDictionary) -> AnyDictionary {
    let registry = lock();
    let Some(info) = registry.types.get(schema_name) else { return fields };
    let mut keys: Vec<i64> = info.downgrades.keys().copied().filter(|v| *v > target_version).collect();
    keys.sort_unstable_by(|a, b| b.cmp(a));
    for version in keys {
        fields = (info.downgrades[&version])(fields);
    }
    fields
}

/// Build a fresh, empty instance of `schema_name` via its registered
/// factory. An unrecognized name wraps `fields` in an `UnknownSchema` node
/// that round-trips byte-stable (modulo dictionary key order).
pub fn instance_from_schema(schema_name: &str, version: i64, fields: AnyDictionary) -> NodeRef {
    let registry = lock();
    match registry.types.get(schema_name) {
        Some(info) => (info.factory)(),
        None => {
            drop(registry);
            crate::object::Node::new(
                "",
                crate::object::NodeKind::UnknownSchema(UnknownState {
                    original_schema_name: schema_name.to_string(),
                    original_schema_version: version,
                    fields,
                }),
            )
        }
    }
}

pub fn is_registered(schema_name: &str) -> bool {
    lock().types.contains_key(schema_name)
}

/// Registers the built-in schemas (`Clip`, `Gap`, `Track`, `Stack`,
/// `Transition`, `Timeline`, `SerializableCollection`) and their legacy
/// aliases. Idempotent — safe to call more than once, including implicitly
/// via `ensure_builtins_registered` at first codec use.
pub fn register_builtins() {
    register_type("Clip", 1, || crate::object::Clip::new("Clip", None).node().clone());
    register_type("Gap", 1, || {
        crate::object::Gap::new("Gap", crate::time::TimeRange::from_components(0.0, 0.0, 1.0)).node().clone()
    });
    register_type("Track", 1, || {
        crate::object::Track::new("Track", crate::object::TrackKind::Video).node().clone()
    });
    register_type("Stack", 1, || crate::object::Stack::new("Stack").node().clone());
    register_type("Transition", 1, || {
        crate::object::Transition::new(
            "Transition",
            crate::object::TransitionType::SmoothCut,
            crate::time::RationalTime::zero(),
            crate::time::RationalTime::zero(),
        )
        .node()
        .clone()
    });
    register_type("Timeline", 1, || crate::object::Timeline::new("Timeline").node().clone());
    register_type("SerializableCollection", 1, || {
        crate::object::SerializableCollection::new("SerializableCollection").node().clone()
    });

    let _ = register_type_from_existing_type("Filler", "Gap");
    let _ = register_type_from_existing_type("Sequence", "Track");
    let _ = register_type_from_existing_type("SerializeableCollection", "SerializableCollection");
}

static BUILTINS: std::sync::Once = std::sync::Once::new();

/// Idempotent guard the JSON codec calls before its first read or write so
/// applications that never call `register_builtins()` explicitly still get
/// working round-trips for the schemas this crate ships.
pub fn ensure_builtins_registered() {
    BUILTINS.call_once(register_builtins);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins_duplicate_factory_is_idempotent() {
        fn make() -> NodeRef {
            crate::object::Gap::new("g", crate::time::TimeRange::from_components(0.0, 0.0, 1.0)).node().clone()
        }
        assert!(register_type("__TestSchemaA", 1, make));
        assert!(register_type("__TestSchemaA", 1, make));
    }

    #[test]
    fn duplicate_registration_with_different_factory_keeps_the_first() {
        register_type("__TestSchemaB", 1, || {
            crate::object::Gap::new("a", crate::time::TimeRange::from_components(0.0, 0.0, 1.0)).node().clone()
        });
        let accepted = register_type("__TestSchemaB", 1, || {
            crate::object::Gap::new("b", crate::time::TimeRange::from_components(0.0, 0.0, 1.0)).node().clone()
        });
        assert!(accepted);
        assert_eq!(instance_from_schema("__TestSchemaB", 1, AnyDictionary::new()).name(), "a");
    }

    #[test]
    fn unknown_schema_round_trips_name_and_version() {
        ensure_builtins_registered();
        let node = instance_from_schema("NotARealSchema", 3, AnyDictionary::new());
        assert_eq!(node.schema_name(), "NotARealSchema");
        assert_eq!(node.original_schema().map(|(_, v)| v), Some(3));
    }
}
