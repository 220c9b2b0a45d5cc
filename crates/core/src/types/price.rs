//! Monetary amounts using decimal arithmetic.
//!
//! Menu prices, order line prices, and order totals are all [`Price`]s in the
//! store's single currency. Totals are summed in `Decimal` so that
//! `0.1 + 0.2` style drift never reaches the payment processor; conversion to
//! the processor's minor units happens once, in [`Price::to_minor_units`].
//!
//! Stored amounts are whole cents no larger than [`Price::MAX_STORED`], the
//! range of a `NUMERIC(12, 2)` column. [`Price::ensure_storable`] checks both.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Quantity;

/// Errors produced when converting a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount does not fit in the processor's integer amount field.
    #[error("amount {0} is out of range for minor-unit conversion")]
    OutOfRange(Decimal),

    /// A line or total exceeded the range of `Decimal`.
    #[error("amount overflowed while computing a total")]
    Overflow,

    /// The amount has fractions of a cent.
    #[error("Price {0} has more than two decimal places")]
    SubCent(Decimal),

    /// The amount is larger than a stored price can hold.
    #[error("Price {0} is too large")]
    TooLarge(Decimal),
}

/// A price in the currency's standard unit (dollars, not cents).
///
/// Serializes as a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable amount: `9_999_999_999.99`.
    pub const MAX_STORED: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build a price from a whole number of minor units (e.g. cents).
    #[must_use]
    pub fn from_minor_units(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Check that the amount is whole cents within [`Self::MAX_STORED`].
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::SubCent`] for fractions of a cent and
    /// [`PriceError::TooLarge`] beyond the stored range.
    pub fn ensure_storable(self) -> Result<Self, PriceError> {
        if self.0.normalize().scale() > 2 {
            return Err(PriceError::SubCent(self.0));
        }
        if self.0.abs() > Self::MAX_STORED.0 {
            return Err(PriceError::TooLarge(self.0));
        }
        Ok(self)
    }

    /// Convert to minor units, rounding half away from zero.
    ///
    /// `12.345` becomes `1235`, `0.004` becomes `0`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::OutOfRange`] if the result does not fit in `i64`.
    pub fn to_minor_units(&self) -> Result<i64, PriceError> {
        let scaled = (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled.to_i64().ok_or(PriceError::OutOfRange(self.0))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Price of one order line: unit price times quantity.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the product exceeds `Decimal`.
pub fn line_total(unit_price: Price, quantity: Quantity) -> Result<Price, PriceError> {
    unit_price
        .0
        .checked_mul(Decimal::from(quantity.get()))
        .map(Price)
        .ok_or(PriceError::Overflow)
}

/// Sum of `unit price × quantity` over every line.
///
/// Used for cart checkout, direct order submission, and the payment charge,
/// so the three can only disagree on *which* prices they are given.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if any line or the running sum exceeds
/// `Decimal`. Client-supplied prices can get there.
pub fn order_total<I>(lines: I) -> Result<Price, PriceError>
where
    I: IntoIterator<Item = (Price, Quantity)>,
{
    lines.into_iter().try_fold(Price::ZERO, |total, (price, quantity)| {
        let line = line_total(price, quantity)?;
        total
            .0
            .checked_add(line.0)
            .map(Price)
            .ok_or(PriceError::Overflow)
    })
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
