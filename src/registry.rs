//! Process-wide annotation registry.
//!
//! Every annotation that reaches a scheduler must be registered once,
//! typically from a module init function during program startup. The
//! registry is append-only and exists to bound the search space of the
//! type-erased [visitor](crate::visit): a task carries only its
//! annotation's `TypeId`, and the visitor recovers the cached access list
//! by scanning the registered entries.
//!
//! Registration order is definition order and never affects any computed
//! access list; each annotation carries its full information.

use std::any::TypeId;
use std::sync::RwLock;

use crate::access::ResourceAccess;
use crate::annotation::Annotation;

/// A registered annotation: its identity plus the cached filtered list.
#[derive(Debug, Clone)]
pub struct AnnotationEntry {
    type_id: TypeId,
    type_name: &'static str,
    accesses: Vec<ResourceAccess>,
}

impl AnnotationEntry {
    /// The annotation's type identity.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The annotation's type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The filtered access list, computed once at registration.
    pub fn accesses(&self) -> &[ResourceAccess] {
        &self.accesses
    }
}

static REGISTRY: RwLock<Vec<AnnotationEntry>> = RwLock::new(Vec::new());

/// Registers annotation `A`, returning its position in the registry.
///
/// Idempotent: registering an annotation twice keeps the first entry, so
/// the registry enumerates each annotation exactly once. The filtered list
/// is computed here and cached for every later lookup.
///
/// # Panics
///
/// Panics if `A`'s composition is cyclic (see [`Annotation::expanded`]).
pub fn register<A: Annotation>() -> usize {
    let type_id = TypeId::of::<A>();
    // Fold outside the lock; expansion can be arbitrarily deep.
    let accesses = A::filtered();
    let mut entries = REGISTRY.write().unwrap();
    if let Some(position) = entries.iter().position(|e| e.type_id == type_id) {
        return position;
    }
    entries.push(AnnotationEntry {
        type_id,
        type_name: std::any::type_name::<A>(),
        accesses,
    });
    entries.len() - 1
}

/// Whether annotation `A` has been registered.
pub fn is_registered<A: Annotation>() -> bool {
    let type_id = TypeId::of::<A>();
    REGISTRY
        .read()
        .unwrap()
        .iter()
        .any(|e| e.type_id == type_id)
}

/// The cached filtered access list of a registered annotation.
///
/// Returns `None` when `A` was never registered. This is the typed
/// counterpart of going through a task's erased carrier.
pub fn resources_of<A: Annotation>() -> Option<Vec<ResourceAccess>> {
    let type_id = TypeId::of::<A>();
    let entries = REGISTRY.read().unwrap();
    entries
        .iter()
        .find(|e| e.type_id == type_id)
        .map(|e| e.accesses.clone())
}

/// Runs `f` over the registered entries, in registration order.
pub(crate) fn with_entries<R>(f: impl FnOnce(&[AnnotationEntry]) -> R) -> R {
    let entries = REGISTRY.read().unwrap();
    f(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Read, Write};

    struct Vault {
        _code: u32,
        _label: String,
    }

    crate::members! {
        struct VaultCode: Vault { _code: u32 }
        struct VaultLabel: Vault { _label: String }
    }

    crate::annotation! {
        struct OpenVault => (Write<VaultCode>, Read<VaultLabel>);
        struct RenameVault => (Write<VaultLabel>,);
        struct NeverRegistered => (Read<VaultCode>,);
    }

    #[test]
    fn register_is_idempotent() {
        let first = register::<OpenVault>();
        let second = register::<OpenVault>();
        assert_eq!(first, second);
        let hits = with_entries(|entries| {
            entries
                .iter()
                .filter(|e| e.type_id() == std::any::TypeId::of::<OpenVault>())
                .count()
        });
        assert_eq!(hits, 1);
    }

    #[test]
    fn registered_entry_caches_filtered_list() {
        register::<RenameVault>();
        let cached = resources_of::<RenameVault>().unwrap();
        assert_eq!(cached, RenameVault::filtered());
    }

    #[test]
    fn lookup_of_unregistered_annotation_is_none() {
        assert!(resources_of::<NeverRegistered>().is_none());
        assert!(!is_registered::<NeverRegistered>());
    }

    #[test]
    fn entry_reports_identity() {
        register::<OpenVault>();
        with_entries(|entries| {
            let entry = entries
                .iter()
                .find(|e| e.type_id() == std::any::TypeId::of::<OpenVault>())
                .unwrap();
            assert!(entry.type_name().contains("OpenVault"));
            assert_eq!(entry.accesses(), OpenVault::filtered());
        });
    }
}
