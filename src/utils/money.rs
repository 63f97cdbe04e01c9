//! Float money helpers. The ledger stores amounts as f64 with 2-decimal
//! rounding on every mutation (round half away from zero at the cent
//! boundary, which is half-up for the positive amounts the ledger allows).

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// True for amounts the ledger accepts: finite and strictly positive.
pub fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_at_cent_boundary() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(10.004), 10.0);
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(33.333_333), 33.33);
    }

    #[test]
    fn rejects_non_finite_and_non_positive_amounts() {
        assert!(!is_valid_amount(0.0));
        assert!(!is_valid_amount(-5.0));
        assert!(!is_valid_amount(f64::NAN));
        assert!(!is_valid_amount(f64::INFINITY));
        assert!(is_valid_amount(0.01));
    }
}
