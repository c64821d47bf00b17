//! Type-erased annotation carrier and registry visitor.
//!
//! Tasks with different annotations must expose them through one uniform
//! surface. The carrier keeps only the annotation's `TypeId` (plus its
//! name for diagnostics); [`visit`] recovers the registered entry by
//! scanning the [registry](crate::registry) and hands it to a callback.

use std::any::TypeId;

use crate::annotation::Annotation;
use crate::registry::{self, AnnotationEntry};

/// An annotation with its static identity erased.
///
/// Constructed at task-creation time; resolved back to a registered
/// [`AnnotationEntry`] by [`visit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErasedAnnotation {
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedAnnotation {
    /// Erases annotation `A`.
    pub fn of<A: Annotation>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            type_name: std::any::type_name::<A>(),
        }
    }

    /// The erased annotation's type identity.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The erased annotation's type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Looks `erased` up in the registry and calls `f` on the first match.
///
/// Entries are scanned in registration order. A miss logs a warning and
/// returns `None` without calling `f`; callers treat that as "no declared
/// accesses". A miss is a program-assembly bug (an annotation reached a
/// task without being registered), not a runtime failure.
pub fn visit<R>(erased: &ErasedAnnotation, f: impl FnOnce(&AnnotationEntry) -> R) -> Option<R> {
    registry::with_entries(|entries| {
        match entries.iter().find(|e| e.type_id() == erased.type_id) {
            Some(entry) => Some(f(entry)),
            None => {
                log::warn!(
                    "annotation type `{}` not found in registry",
                    erased.type_name
                );
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Write;
    use crate::registry::register;

    struct Gauge {
        _level: f32,
    }

    crate::members! {
        struct GaugeLevel: Gauge { _level: f32 }
    }

    crate::annotation! {
        struct Refill => (Write<GaugeLevel>,);
        struct Unknown => (Write<GaugeLevel>,);
    }

    #[test]
    fn visit_finds_registered_annotation() {
        register::<Refill>();
        let erased = ErasedAnnotation::of::<Refill>();
        let accesses = visit(&erased, |entry| entry.accesses().to_vec());
        assert_eq!(accesses.unwrap(), Refill::filtered());
    }

    #[test]
    fn visit_miss_returns_none_without_calling_back() {
        let erased = ErasedAnnotation::of::<Unknown>();
        let mut called = false;
        let result = visit(&erased, |_| {
            called = true;
        });
        assert!(result.is_none());
        assert!(!called);
    }

    #[test]
    fn erased_annotation_keeps_identity() {
        let a = ErasedAnnotation::of::<Refill>();
        let b = ErasedAnnotation::of::<Refill>();
        assert_eq!(a, b);
        assert_eq!(a.type_id(), std::any::TypeId::of::<Refill>());
        assert!(a.type_name().contains("Refill"));
    }
}
