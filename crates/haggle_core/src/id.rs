//! Type-safe identifiers
//!
//! Every entity id is a UUID v4 tagged with a per-type prefix, rendered as
//! `prefix_uuid`. The prefix makes ids self-describing in logs and on the wire,
//! and the type parameter keeps a `SessionId` from being passed where a
//! `ProductId` is expected.

use schemars::JsonSchema;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A type-safe ID with a consistent prefix and UUID
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    uuid: Uuid,
    _phantom: PhantomData<T>,
}

impl<T: IdType> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", T::PREFIX, self.uuid)
    }
}

/// Trait for types that can be used as ID markers
pub trait IdType: Send + Sync + 'static {
    /// The prefix for this ID type (e.g., "user", "product")
    const PREFIX: &'static str;
}

/// Errors that can occur when parsing IDs
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum IdError {
    #[error("Invalid ID format: expected prefix '{expected}', got '{actual}'")]
    #[diagnostic(help("Ensure the ID starts with the correct prefix followed by an underscore"))]
    InvalidPrefix { expected: String, actual: String },

    #[error("Invalid UUID: {0}")]
    #[diagnostic(help("The UUID portion of the ID must be a valid UUID"))]
    InvalidUuid(#[from] uuid::Error),

    #[error("Invalid ID format: {0}")]
    #[diagnostic(help(
        "IDs must be in the format 'prefix_uuid' where prefix matches the expected type"
    ))]
    InvalidFormat(String),
}

/// Split `prefix_uuid` and check the prefix against `T`.
fn split_prefixed<T: IdType>(s: &str) -> Result<&str, IdError> {
    let (prefix, uuid_str) = s.split_once('_').ok_or_else(|| {
        IdError::InvalidFormat("ID must be in format 'prefix_uuid'".to_string())
    })?;

    if prefix != T::PREFIX {
        return Err(IdError::InvalidPrefix {
            expected: T::PREFIX.to_string(),
            actual: prefix.to_string(),
        });
    }

    Ok(uuid_str)
}

impl<T: IdType> Id<T> {
    /// Create a new ID with a random UUID
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an ID from a specific UUID (useful for tests and seed data)
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _phantom: PhantomData,
        }
    }

    /// Parse an ID from its `prefix_uuid` form
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let uuid_str = split_prefixed::<T>(s)?;
        Ok(Self::from_uuid(Uuid::parse_str(uuid_str)?))
    }

    /// Get the UUID part
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Get the prefix for this ID type
    pub fn prefix(&self) -> &'static str {
        T::PREFIX
    }

    /// Key used for this entity in storage tables
    pub fn to_record_id(&self) -> String {
        self.uuid.to_string()
    }

    /// Create a nil/empty ID (all zeros)
    pub fn nil() -> Self {
        Self::from_uuid(Uuid::nil())
    }

    /// Check if this is a nil/empty ID
    pub fn is_nil(&self) -> bool {
        self.uuid.is_nil()
    }
}

impl<T: IdType> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", T::PREFIX, self.uuid)
    }
}

impl<T: IdType> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: IdType> From<Id<T>> for String {
    fn from(id: Id<T>) -> Self {
        id.to_string()
    }
}

impl<T: IdType> AsRef<Uuid> for Id<T> {
    fn as_ref(&self) -> &Uuid {
        &self.uuid
    }
}

impl<T: IdType> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de, T: IdType> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(IdVisitor(PhantomData))
    }
}

struct IdVisitor<T>(PhantomData<T>);

impl<'de, T: IdType> Visitor<'de> for IdVisitor<T> {
    type Value = Id<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a string with the format '{}_UUID'", T::PREFIX)
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Id::parse(s).map_err(de::Error::custom)
    }
}

impl<T: IdType> JsonSchema for Id<T> {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("{}Id", T::PREFIX))
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        String::json_schema(generator)
    }
}

/// Macro to define new ID types with minimal boilerplate
#[macro_export]
macro_rules! define_id_type {
    ($type_name:ident, $prefix:expr) => {
        /// Marker type for the ID
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
        pub struct $type_name;

        impl $crate::id::IdType for $type_name {
            const PREFIX: &'static str = $prefix;
        }
    };
}

define_id_type!(UserIdType, "user");
define_id_type!(ProductIdType, "product");
define_id_type!(SessionIdType, "negotiation");
define_id_type!(VoiceSessionIdType, "voice");

/// Identity of an authenticated buyer
pub type UserId = Id<UserIdType>;

/// Catalog item under negotiation
pub type ProductId = Id<ProductIdType>;

/// Negotiation session
pub type SessionId = Id<SessionIdType>;

/// Voice call session
pub type VoiceSessionId = Id<VoiceSessionIdType>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = SessionId::generate();
        let id2 = SessionId::generate();

        assert_ne!(id1, id2);
        assert_eq!(id1.prefix(), "negotiation");
        assert!(id2.to_string().starts_with("negotiation_"));
    }

    #[test]
    fn test_id_parsing() {
        let id = ProductId::generate();
        let id_str = id.to_string();

        let parsed = ProductId::parse(&id_str).unwrap();
        assert_eq!(id, parsed);

        assert!(matches!(
            UserId::parse(&id_str),
            Err(IdError::InvalidPrefix { .. })
        ));
        assert!(matches!(
            ProductId::parse("invalid"),
            Err(IdError::InvalidFormat(_))
        ));
        assert!(ProductId::parse("product_").is_err());
        assert!(matches!(
            ProductId::parse("product_not-a-uuid"),
            Err(IdError::InvalidUuid(_))
        ));
    }

    #[test]
    fn test_id_serialization() {
        let id = UserId::generate();

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let deserialized: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);

        let wrong: Result<SessionId, _> = serde_json::from_str(&json);
        assert!(wrong.is_err());
    }

    #[test]
    fn test_nil_id() {
        let nil_id = VoiceSessionId::nil();
        assert!(nil_id.is_nil());
        assert_eq!(
            nil_id.to_string(),
            "voice_00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_record_id_is_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = SessionId::from_uuid(uuid);
        assert_eq!(id.uuid(), uuid);
        assert_eq!(id.to_record_id(), uuid.to_string());
    }

    #[test]
    fn test_debug_matches_display() {
        let id = SessionId::generate();
        let debug = format!("{:?}", id);
        assert!(!debug.contains("PhantomData"));
        assert_eq!(debug, id.to_string());
    }
}
