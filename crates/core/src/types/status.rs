//! Order status.
//!
//! Status is an open string rather than a closed enum: administrators may set
//! any non-empty value ("Preparing", "Out for delivery", ...). Only two values
//! carry rules:
//!
//! - `Pending` is the initial status of every order.
//! - `Cancelled` is reachable by the owner or an admin, and only from exactly
//!   `Pending`.

use serde::{Deserialize, Serialize};

/// The status of an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Initial status of every order.
    pub const PENDING: &'static str = "Pending";
    /// Status after a successful cancellation.
    pub const CANCELLED: &'static str = "Cancelled";

    /// The initial status.
    #[must_use]
    pub fn pending() -> Self {
        Self(Self::PENDING.to_owned())
    }

    /// The cancelled status.
    #[must_use]
    pub fn cancelled() -> Self {
        Self(Self::CANCELLED.to_owned())
    }

    /// Parse an administrator-supplied status.
    ///
    /// Any value is accepted except an empty (or whitespace-only) string.
    /// The value is stored verbatim apart from trimming.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Whether this is exactly `Pending` (case-sensitive).
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0 == Self::PENDING
    }

    /// The status as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::pending()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<String as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
