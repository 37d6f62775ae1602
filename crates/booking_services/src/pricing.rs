use serde::{Deserialize, Serialize};

/// Nights covered by one week tier.
pub const NIGHTS_PER_WEEK: i64 = 7;
/// Nights covered by one month tier.
pub const NIGHTS_PER_MONTH: i64 = 30;

/// Errors raised while pricing a stay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// Zero or negative stays cannot be priced.
    #[error("A stay must be at least one night, got {0}")]
    NonPositiveNights(i64),

    /// A tier was configured with a zero or negative price.
    #[error("Price per {0} must be positive")]
    NonPositiveUnitPrice(PriceTierKind),

    /// The total does not fit in the price type.
    #[error("Price overflow for a stay of {0} nights")]
    Overflow(i64),
}

/// One of the flat-priced units a stay is tiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTierKind {
    /// 30 nights.
    Month,
    /// 7 nights.
    Week,
    /// A single night.
    Day,
}

impl PriceTierKind {
    /// Number of nights one unit of this tier covers.
    pub fn nights(self) -> i64 {
        match self {
            PriceTierKind::Month => NIGHTS_PER_MONTH,
            PriceTierKind::Week => NIGHTS_PER_WEEK,
            PriceTierKind::Day => 1,
        }
    }
}

impl std::fmt::Display for PriceTierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PriceTierKind::Month => "month",
            PriceTierKind::Week => "week",
            PriceTierKind::Day => "day",
        };
        f.write_str(label)
    }
}

/// A line of the price breakdown: `count` units of `tier` at `unit_price` cents each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    /// Tier kind
    pub tier: PriceTierKind,
    /// Number of units consumed
    pub count: i64,
    /// Price of one unit in cents
    pub unit_price: i64,
    /// `count * unit_price`
    pub subtotal: i64,
}

/// Price of a stay with its breakdown, months first, then weeks, then days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Nights priced
    pub nights: i64,
    /// Total in cents
    pub total_price: i64,
    /// Non-empty tiers in descending granularity
    pub breakdown: Vec<PriceTier>,
}

/// Flat unit prices, in cents, for each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTable {
    /// Price of a single night
    pub per_day: i64,
    /// Price of a 7-night block
    pub per_week: i64,
    /// Price of a 30-night block
    pub per_month: i64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            per_day: 8_900,
            per_week: 54_900,
            per_month: 189_900,
        }
    }
}

impl PricingTable {
    /// Creates a pricing table, rejecting non-positive unit prices.
    pub fn new(per_day: i64, per_week: i64, per_month: i64) -> Result<Self, PricingError> {
        let table = Self {
            per_day,
            per_week,
            per_month,
        };
        for (kind, price) in table.unit_prices() {
            if price <= 0 {
                return Err(PricingError::NonPositiveUnitPrice(kind));
            }
        }
        Ok(table)
    }

    /// Unit price of every tier, largest tier first.
    pub fn unit_prices(&self) -> [(PriceTierKind, i64); 3] {
        [
            (PriceTierKind::Month, self.per_month),
            (PriceTierKind::Week, self.per_week),
            (PriceTierKind::Day, self.per_day),
        ]
    }

    /// Prices a stay by tiling it greedily with months, then weeks, then single days.
    ///
    /// The greedy tiling is the published pricing policy even where it is not the
    /// cheapest combination: 29 nights are four weeks and one day, never a month.
    pub fn quote(&self, nights: i64) -> Result<PriceQuote, PricingError> {
        if nights <= 0 {
            return Err(PricingError::NonPositiveNights(nights));
        }

        let mut remaining = nights;
        let mut total: i64 = 0;
        let mut breakdown = Vec::with_capacity(3);

        for (tier, unit_price) in self.unit_prices() {
            let count = remaining / tier.nights();
            if count == 0 {
                continue;
            }
            remaining %= tier.nights();

            let subtotal = count
                .checked_mul(unit_price)
                .ok_or(PricingError::Overflow(nights))?;
            total = total
                .checked_add(subtotal)
                .ok_or(PricingError::Overflow(nights))?;

            breakdown.push(PriceTier {
                tier,
                count,
                unit_price,
                subtotal,
            });
        }

        Ok(PriceQuote {
            nights,
            total_price: total,
            breakdown,
        })
    }
}
