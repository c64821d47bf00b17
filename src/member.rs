//! Member designators.
//!
//! A [`Member`] is a marker type naming one field of one owning type. It is
//! the declaration-side half of a resource identity: access markers like
//! [`Read<M>`](crate::Read) and [`Write<M>`](crate::Write) are
//! parameterized by a member, and the member supplies the
//! [`ResourceId`] they claim.
//!
//! Members are usually declared with the [`members!`](crate::members)
//! macro rather than by hand:
//!
//! ```
//! use accessflow::members;
//!
//! struct Ledger {
//!     balance: i64,
//!     owner: String,
//! }
//!
//! members! {
//!     /// `Ledger::balance`.
//!     pub struct LedgerBalance: Ledger { balance: i64 }
//!     /// `Ledger::owner`.
//!     pub struct LedgerOwner: Ledger { owner: String }
//! }
//! ```

use crate::access::ResourceId;

/// A marker type designating one member of an owning type.
///
/// The triple `(Owner, NAME, Value)` is the member's identity; two marker
/// types with equal triples designate the same resource. This covers both
/// publicly accessible fields and fields the annotating code cannot reach:
/// either way the field is named by its string, so visibility of the field
/// itself does not matter.
pub trait Member: 'static {
    /// The type owning the member.
    type Owner: 'static;
    /// The member's value type.
    type Value: 'static;
    /// The member's field name.
    const NAME: &'static str;

    /// The resource identity designated by this member.
    fn resource_id() -> ResourceId {
        ResourceId::new::<Self::Owner, Self::Value>(Self::NAME)
    }
}

/// Declares member marker types.
///
/// Each entry names the marker type, the owning type, and the field it
/// designates (name and value type). Expands to a unit struct plus its
/// [`Member`] impl.
///
/// ```
/// use accessflow::members;
///
/// struct Inventory {
///     count: u32,
/// }
///
/// members! {
///     pub struct InventoryCount: Inventory { count: u32 }
/// }
/// ```
#[macro_export]
macro_rules! members {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident: $owner:ty { $field:ident: $value:ty }
    )+) => {
        $(
            $(#[$meta])*
            $vis struct $name;

            impl $crate::Member for $name {
                type Owner = $owner;
                type Value = $value;
                const NAME: &'static str = ::core::stringify!($field);
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ledger {
        _balance: i64,
        _owner: String,
    }

    members! {
        struct LedgerBalance: Ledger { _balance: i64 }
        struct LedgerOwner: Ledger { _owner: String }
    }

    // Declared independently but naming the same field as LedgerOwner.
    members! {
        struct LedgerOwnerAlias: Ledger { _owner: String }
    }

    #[test]
    fn member_carries_field_name() {
        assert_eq!(LedgerBalance::NAME, "_balance");
        assert_eq!(LedgerOwner::NAME, "_owner");
    }

    #[test]
    fn members_of_one_owner_are_distinct_resources() {
        assert_ne!(LedgerBalance::resource_id(), LedgerOwner::resource_id());
    }

    #[test]
    fn same_triple_same_resource() {
        // Identity is structural: distinct marker types, one resource.
        assert_eq!(LedgerOwner::resource_id(), LedgerOwnerAlias::resource_id());
        assert_eq!(
            LedgerOwner::resource_id().key(),
            LedgerOwnerAlias::resource_id().key()
        );
    }
}
