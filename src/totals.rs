//! Invoice and order aggregate math.
//!
//! Amounts are integer minor units (piasters). Rates are whole percents;
//! the discount applies to the subtotal, tax applies to the discounted base.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
}

pub fn line_total(quantity: i32, unit_price: i64) -> i64 {
    unit_price * quantity as i64
}

pub fn compute(line_totals: &[i64], discount_rate: i64, tax_rate: i64) -> Totals {
    let subtotal: i64 = line_totals.iter().sum();
    let discount = subtotal * discount_rate / 100;
    let tax = (subtotal - discount) * tax_rate / 100;
    let total = subtotal - discount + tax;
    Totals {
        subtotal,
        discount,
        tax,
        total,
    }
}

/// Rates are accepted as whole percents in 0..=100.
pub fn valid_rate(rate: i64) -> bool {
    (0..=100).contains(&rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rates_pass_subtotal_through() {
        let t = compute(&[1000, 2500], 0, 0);
        assert_eq!(t.subtotal, 3500);
        assert_eq!(t.discount, 0);
        assert_eq!(t.tax, 0);
        assert_eq!(t.total, 3500);
    }

    #[test]
    fn tax_applies_to_discounted_base() {
        // 10000 - 10% = 9000, tax 14% of 9000 = 1260
        let t = compute(&[10000], 10, 14);
        assert_eq!(t.discount, 1000);
        assert_eq!(t.tax, 1260);
        assert_eq!(t.total, 10260);
    }

    #[test]
    fn full_discount_zeroes_tax_and_total() {
        let t = compute(&[4200], 100, 14);
        assert_eq!(t.discount, 4200);
        assert_eq!(t.tax, 0);
        assert_eq!(t.total, 0);
    }

    #[test]
    fn integer_division_floors() {
        // 3% of 999 = 29.97 -> 29
        let t = compute(&[999], 3, 0);
        assert_eq!(t.discount, 29);
        assert_eq!(t.total, 970);
    }

    #[test]
    fn empty_lines_are_zero() {
        let t = compute(&[], 10, 14);
        assert_eq!(t.subtotal, 0);
        assert_eq!(t.total, 0);
    }

    #[test]
    fn line_total_scales_by_quantity() {
        assert_eq!(line_total(3, 2500), 7500);
    }

    #[test]
    fn rate_bounds() {
        assert!(valid_rate(0));
        assert!(valid_rate(100));
        assert!(!valid_rate(-1));
        assert!(!valid_rate(101));
    }
}
