//! The normalizer: folds an expanded access list into its canonical form.
//!
//! Normalization is two passes over a flat list of [`ResourceAccess`]es:
//!
//! 1. [`dedup_exact`] removes duplicate `(owner, member, mode)` triples.
//! 2. [`absorb_reads`] removes every read of a resource that is also
//!    written.
//!
//! The result is deterministic, idempotent, and, at the set level,
//! invariant under permutation of the input.

use crate::access::ResourceAccess;

/// Removes exact duplicates from an expanded list.
///
/// Later duplicates of a triple suppress earlier ones and the survivor
/// takes the later position; the surviving elements are then emitted in
/// reverse. `[read, read, write]` on one resource therefore becomes
/// `[write, read]`.
pub fn dedup_exact(expanded: &[ResourceAccess]) -> Vec<ResourceAccess> {
    let mut unique = Vec::with_capacity(expanded.len());
    for access in expanded.iter().rev() {
        if !unique.contains(access) {
            unique.push(*access);
        }
    }
    unique
}

/// Removes each read whose resource is also written in the list.
///
/// Writes are never removed. Surviving elements keep their relative order.
pub fn absorb_reads(unique: Vec<ResourceAccess>) -> Vec<ResourceAccess> {
    let written: Vec<_> = unique
        .iter()
        .filter(|access| access.is_write())
        .map(|access| access.id)
        .collect();
    unique
        .into_iter()
        .filter(|access| access.is_write() || !written.contains(&access.id))
        .collect()
}

/// Full normalization: [`dedup_exact`] then [`absorb_reads`].
///
/// The output satisfies both filtered-list invariants: no duplicate
/// `(resource, mode)` pairs, and at most one of `(r, read)` / `(r, write)`
/// per resource, with the write surviving when both appeared.
pub fn normalize(expanded: Vec<ResourceAccess>) -> Vec<ResourceAccess> {
    absorb_reads(dedup_exact(&expanded))
}
