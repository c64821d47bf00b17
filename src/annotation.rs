//! Annotations: composable declarations of the resources a callable touches.
//!
//! An annotation is a marker type with an associated tuple of *claims*.
//! Each claim is either a single access ([`Read<M>`] / [`Write<M>`] for a
//! [`Member`] `M`) or another annotation, whose already-filtered access
//! list is inherited wholesale. Annotations therefore compose the way the
//! callables they describe compose: annotate a routine with the
//! annotations of its callees plus its own direct accesses, and the
//! normalizer folds everything into one canonical list.
//!
//! Annotations are declared with the [`annotation!`](crate::annotation)
//! macro:
//!
//! ```
//! use accessflow::{annotation, members, Read, Write};
//!
//! struct Ledger {
//!     balance: i64,
//!     owner: String,
//! }
//!
//! members! {
//!     pub struct LedgerBalance: Ledger { balance: i64 }
//!     pub struct LedgerOwner: Ledger { owner: String }
//! }
//!
//! annotation! {
//!     /// `Ledger::settle` rewrites the balance and reads the owner.
//!     pub struct SettleResources => (Write<LedgerBalance>, Read<LedgerOwner>);
//! }
//! ```

use std::any::TypeId;
use std::cell::RefCell;
use std::marker::PhantomData;

use crate::access::{AccessMode, ResourceAccess};
use crate::member::Member;
use crate::normalize::normalize;

/// A single read claim on member `M`. Usable as an annotation child.
pub struct Read<M: Member>(PhantomData<M>);

/// A single write claim on member `M`. Usable as an annotation child.
pub struct Write<M: Member>(PhantomData<M>);

/// Anything usable as the child of an annotation.
///
/// Implemented by the access markers ([`Read`], [`Write`]) and, via the
/// [`annotation!`](crate::annotation) macro, by every annotation type.
/// A marker contributes its single access; an annotation contributes its
/// **filtered** list (the list it exports as its contract), so a parent
/// never re-expands a child's descendants from scratch.
pub trait Claim: 'static {
    /// Appends this child's contribution to `out`.
    fn append_accesses(out: &mut Vec<ResourceAccess>);
}

impl<M: Member> Claim for Read<M> {
    fn append_accesses(out: &mut Vec<ResourceAccess>) {
        out.push(ResourceAccess::new(M::resource_id(), AccessMode::Read));
    }
}

impl<M: Member> Claim for Write<M> {
    fn append_accesses(out: &mut Vec<ResourceAccess>) {
        out.push(ResourceAccess::new(M::resource_id(), AccessMode::Write));
    }
}

/// A heterogeneous list of claims: `()` or a tuple of up to eight
/// [`Claim`]s. The empty tuple is the claim list of an annotation that
/// touches nothing.
pub trait ClaimList: 'static {
    /// Appends every child's contribution to `out`, in declaration order.
    fn append_accesses(out: &mut Vec<ResourceAccess>);
}

impl ClaimList for () {
    fn append_accesses(_out: &mut Vec<ResourceAccess>) {}
}

macro_rules! impl_claim_list {
    ($($T:ident),+) => {
        impl<$($T: Claim),+> ClaimList for ($($T,)+) {
            fn append_accesses(out: &mut Vec<ResourceAccess>) {
                $($T::append_accesses(out);)+
            }
        }
    };
}

impl_claim_list!(A);
impl_claim_list!(A, B);
impl_claim_list!(A, B, C);
impl_claim_list!(A, B, C, D);
impl_claim_list!(A, B, C, D, E);
impl_claim_list!(A, B, C, D, E, F);
impl_claim_list!(A, B, C, D, E, F, G);
impl_claim_list!(A, B, C, D, E, F, G, H);

thread_local! {
    // Annotation types currently being expanded, used to reject cyclic
    // composition at first use.
    static EXPANSION_STACK: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// A named bundle of claims attached to a callable.
///
/// Both accessors are pure: calling them twice yields identical lists.
/// The [registry](crate::registry) caches the filtered list once per
/// process, so per-task lookups never re-run the fold.
///
/// # Panics
///
/// Expansion panics if an annotation transitively contains itself.
/// Composition must form a DAG; the panic triggers on first use, which is
/// registration time for any annotation that reaches a scheduler.
pub trait Annotation: 'static {
    /// The annotation's children.
    type Claims: ClaimList;

    /// The flat concatenation of each child's contribution, in declaration
    /// order. May contain duplicates and conflicting modes.
    fn expanded() -> Vec<ResourceAccess> {
        let type_id = TypeId::of::<Self>();
        EXPANSION_STACK.with(|stack| {
            assert!(
                !stack.borrow().contains(&type_id),
                "annotation cycle detected involving `{}`",
                std::any::type_name::<Self>()
            );
            stack.borrow_mut().push(type_id);
        });
        let mut out = Vec::new();
        <Self::Claims as ClaimList>::append_accesses(&mut out);
        EXPANSION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
        out
    }

    /// The canonical access list: [`expanded()`](Annotation::expanded)
    /// deduplicated, with reads absorbed by writes on the same resource.
    /// See [`normalize`](crate::normalize()).
    fn filtered() -> Vec<ResourceAccess> {
        normalize(Self::expanded())
    }
}

/// The annotation of a task that touches no resources.
///
/// Tasks carrying `NoAccess` never conflict with anything and always
/// become graph roots.
pub struct NoAccess;

impl Annotation for NoAccess {
    type Claims = ();
}

impl Claim for NoAccess {
    fn append_accesses(_out: &mut Vec<ResourceAccess>) {}
}

/// Declares annotation marker types.
///
/// Each entry names the annotation and its claim tuple. Expands to a unit
/// struct, its [`Annotation`] impl, and a [`Claim`] impl so the annotation
/// can appear as the child of another annotation.
///
/// ```
/// use accessflow::{annotation, members, Read, Write};
///
/// struct Inventory {
///     count: u32,
///     label: String,
/// }
///
/// members! {
///     pub struct InventoryCount: Inventory { count: u32 }
///     pub struct InventoryLabel: Inventory { label: String }
/// }
///
/// annotation! {
///     pub struct Restock => (Write<InventoryCount>,);
///     /// Relabeling restocks, then renames.
///     pub struct Relabel => (Restock, Write<InventoryLabel>);
/// }
/// ```
#[macro_export]
macro_rules! annotation {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $claims:ty;
    )+) => {
        $(
            $(#[$meta])*
            $vis struct $name;

            impl $crate::Annotation for $name {
                type Claims = $claims;
            }

            impl $crate::Claim for $name {
                fn append_accesses(out: &mut ::std::vec::Vec<$crate::ResourceAccess>) {
                    out.extend(<$name as $crate::Annotation>::filtered());
                }
            }
        )+
    };
}
