//! Scalar helpers used by the moment recurrence and the statistic adapters

/// `+1.0` for an even `k`, `-1.0` for an odd `k`
#[inline]
pub fn parity_sign(k: u32) -> f64 {
    if k % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Binomial coefficient `C(n, k)`, zero when `k > n`
///
/// Evaluated multiplicatively so every intermediate value is itself a
/// binomial coefficient; exact for the exponents a moment engine sees.
pub fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0;
    for i in 0..k {
        acc = acc * f64::from(n - i) / f64::from(i + 1);
    }
    acc
}

/// `x` raised to a non-negative integer power
#[inline]
pub fn powu(x: f64, n: u32) -> f64 {
    // Exponents are moment orders, far below i32::MAX.
    x.powi(n as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_sign() {
        assert_eq!(parity_sign(0), 1.0);
        assert_eq!(parity_sign(1), -1.0);
        assert_eq!(parity_sign(4), 1.0);
        assert_eq!(parity_sign(7), -1.0);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(0, 0), 1.0);
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(10, 3), 120.0);
        assert_eq!(binomial(10, 7), 120.0);
        assert_eq!(binomial(2, 3), 0.0);
        assert_eq!(binomial(30, 15), 155_117_520.0);
    }

    #[test]
    fn test_powu() {
        assert_eq!(powu(2.0, 0), 1.0);
        assert_eq!(powu(-3.0, 3), -27.0);
        assert_eq!(powu(0.0, 0), 1.0);
    }
}
