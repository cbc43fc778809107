//! Price binning for the stratified split.

use crate::domain::PriceStratum;

/// Upper bounds (inclusive) of strata 1..=4; stratum 5 is open-ended.
///
/// Intervals are `(0, 1759]`, `(1759, 5277]`, `(5277, 8372]`, `(8372, 12373]`, `(12373, ∞)`.
pub const PRICE_BREAKPOINTS: [i64; 4] = [1759, 5277, 8372, 12373];

/// Assign a price to its stratum.
///
/// Non-positive prices have no interval of their own and fall in stratum 1.
pub fn bin_price(price: i64) -> PriceStratum {
    match PRICE_BREAKPOINTS.iter().position(|&upper| price <= upper) {
        Some(0) => PriceStratum::S1,
        Some(1) => PriceStratum::S2,
        Some(2) => PriceStratum::S3,
        Some(3) => PriceStratum::S4,
        _ => PriceStratum::S5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_belong_to_lower_stratum() {
        let cases = [
            (1, 1),
            (1759, 1),
            (1760, 2),
            (5277, 2),
            (5278, 3),
            (8372, 3),
            (8373, 4),
            (12373, 4),
            (12374, 5),
            (79512, 5),
        ];
        for (price, label) in cases {
            assert_eq!(bin_price(price).label(), label, "price {price}");
        }
    }

    #[test]
    fn non_positive_prices_fall_in_first_stratum() {
        assert_eq!(bin_price(0), PriceStratum::S1);
        assert_eq!(bin_price(-10), PriceStratum::S1);
    }
}
