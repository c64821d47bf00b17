use std::any::TypeId;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Describes the mode used to access a resource.
///
/// Two tasks touching the same resource only need ordering when at least
/// one of them writes. The scheduler treats `Read`/`Read` pairs as freely
/// reorderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Shared, non-mutating access.
    Read,
    /// Exclusive, mutating access.
    Write,
}

/// Identity of a single member of an owning type.
///
/// A resource is the pair of an owning type and one of its members. Rust
/// has no pointer-to-member, so the member half is the field name together
/// with the field's value type, compared structurally. Two [`Member`]
/// declarations naming the same `(owner, field, value type)` triple refer
/// to the same resource, even when the marker types differ.
///
/// [`Member`]: crate::Member
#[derive(Debug, Clone, Copy)]
pub struct ResourceId {
    owner: TypeId,
    /// Type name of the owner. Diagnostics only; not part of identity.
    owner_name: &'static str,
    member_name: &'static str,
    value: TypeId,
}

impl ResourceId {
    /// Creates the identity for the member `member_name` of `Owner`.
    pub fn new<Owner: 'static, Value: 'static>(member_name: &'static str) -> Self {
        Self {
            owner: TypeId::of::<Owner>(),
            owner_name: std::any::type_name::<Owner>(),
            member_name,
            value: TypeId::of::<Value>(),
        }
    }

    /// Stable key for this resource, equal for equal identities.
    ///
    /// The access mode never participates: a read and a write of the same
    /// member map to the same key. Keys are what the scheduler hands to
    /// the flow builder as `ro`/`rw` claims.
    pub fn key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Type name of the owning type.
    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    /// Name of the member within the owning type.
    pub fn member_name(&self) -> &'static str {
        self.member_name
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        // owner_name is redundant with owner and deliberately excluded
        self.owner == other.owner
            && self.member_name == other.member_name
            && self.value == other.value
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.member_name.hash(state);
        self.value.hash(state);
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner_name, self.member_name)
    }
}

/// One declared access: a resource identity plus the mode it is touched in.
///
/// This is the unit the normalizer filters and the flow builder consumes.
/// Value-like and cheap to copy; equality covers all three of
/// `(owner, member, mode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceAccess {
    /// The resource being accessed.
    pub id: ResourceId,
    /// How the resource is accessed.
    pub mode: AccessMode,
}

impl ResourceAccess {
    /// Creates an access of `id` in `mode`.
    pub fn new(id: ResourceId, mode: AccessMode) -> Self {
        Self { id, mode }
    }

    /// The resource key, ignoring mode. See [`ResourceId::key`].
    pub fn key(&self) -> u64 {
        self.id.key()
    }

    /// Whether this access mutates the resource.
    pub fn is_write(&self) -> bool {
        self.mode == AccessMode::Write
    }
}

impl fmt::Display for ResourceAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
        };
        write!(f, "{} ({mode})", self.id)
    }
}
