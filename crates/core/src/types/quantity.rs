//! Cart and order line quantities.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantity was zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// Quantity exceeds the storable range.
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// A line quantity, always at least 1.
///
/// Stored as a Postgres `INTEGER`, so the upper bound is `i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity from an unsigned count.
    ///
    /// # Errors
    ///
    /// Returns an error if `n` is zero or larger than `i32::MAX`.
    pub fn new(n: u32) -> Result<Self, QuantityError> {
        Self::try_from(i64::from(n))
    }

    /// The count as `u32`.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The count as `i32`, for storage.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        // Bounded by the constructor.
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }

    /// Add two quantities, saturating at the storable maximum.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        let max = u32::try_from(i32::MAX).unwrap_or(u32::MAX);
        Self(self.0.saturating_add(other.0).min(max))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        if value > i64::from(i32::MAX) {
            return Err(QuantityError::TooLarge(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge(value))
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_i32(), buf)
    }
}
