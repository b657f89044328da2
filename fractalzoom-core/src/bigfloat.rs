//! Big floats for view coordinates deeper than f64 can hold.

use crate::BoundsError;
use dashu_base::{Abs, Approximation, EstimatedLog2};
use dashu_float::{DBig, FBig};
use serde::{Deserialize, Serialize};

/// Arbitrary precision floating point with explicit precision enforcement
///
/// Uses f64 internally when precision_bits <= 64, FBig otherwise.
/// The switch is invisible to callers: arithmetic between the two
/// representations promotes to FBig at the larger precision.
#[derive(Clone, Debug)]
pub struct BigFloat {
    value: BigFloatValue,
    precision_bits: usize,
}

#[derive(Clone, Debug)]
enum BigFloatValue {
    F64(f64),
    Arbitrary(FBig),
}

impl BigFloat {
    /// Create BigFloat from f64 with explicit precision
    ///
    /// # Panics
    /// Panics if `val` is NaN or infinite. View bounds are validated as
    /// finite before they reach this point.
    pub fn with_precision(val: f64, precision_bits: usize) -> Self {
        let value = if precision_bits <= 64 {
            BigFloatValue::F64(val)
        } else {
            BigFloatValue::Arbitrary(fbig_from_f64(val, precision_bits))
        };

        Self {
            value,
            precision_bits,
        }
    }

    /// Create zero with explicit precision
    pub fn zero(precision_bits: usize) -> Self {
        Self::with_precision(0.0, precision_bits)
    }

    /// Create one with explicit precision
    pub fn one(precision_bits: usize) -> Self {
        Self::with_precision(1.0, precision_bits)
    }

    /// Create an integer-valued BigFloat (pixel indices, resolutions).
    pub fn from_u32(val: u32, precision_bits: usize) -> Self {
        Self::with_precision(f64::from(val), precision_bits)
    }

    /// Get precision in bits
    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    /// Convert to f64 (for colorization and display only)
    /// May lose precision for values requiring > 64 bits. Rounds to nearest.
    pub fn to_f64(&self) -> f64 {
        match &self.value {
            BigFloatValue::F64(v) => *v,
            BigFloatValue::Arbitrary(v) => v
                .clone()
                .with_rounding::<dashu_float::round::mode::HalfEven>()
                .to_f64()
                .value(),
        }
    }

    /// Parse a decimal coordinate, e.g. "-0.743643887037158704752191506114774"
    /// or "1e-500", which f64 cannot represent.
    pub fn from_string(val: &str, precision_bits: usize) -> Result<Self, BoundsError> {
        if precision_bits <= 64 {
            val.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| Self::with_precision(f, precision_bits))
                .ok_or_else(|| BoundsError::Parse(val.to_string()))
        } else {
            val.parse::<DBig>()
                .map_err(|e| BoundsError::Parse(format!("{val}: {e}")))
                .map(|dbig| {
                    // Decimal to binary in one rounding step at the target precision
                    let fbig_halfaway = match dbig.with_base_and_precision::<2>(precision_bits) {
                        Approximation::Exact(v) => v,
                        Approximation::Inexact(v, _) => v,
                    };
                    let fbig_with_prec =
                        fbig_halfaway.with_rounding::<dashu_float::round::mode::Zero>();
                    Self {
                        value: BigFloatValue::Arbitrary(fbig_with_prec),
                        precision_bits,
                    }
                })
        }
    }

    /// Add two BigFloats, preserving max precision
    pub fn add(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a + b, |a, b| a + b)
    }

    /// Subtract two BigFloats, preserving max precision
    pub fn sub(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a - b, |a, b| a - b)
    }

    /// Multiply two BigFloats, preserving max precision
    pub fn mul(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a * b, |a, b| a * b)
    }

    /// Divide two BigFloats, preserving max precision
    pub fn div(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a / b, |a, b| a / b)
    }

    /// self * self
    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Absolute value
    pub fn abs(&self) -> Self {
        let value = match &self.value {
            BigFloatValue::F64(v) => BigFloatValue::F64(v.abs()),
            BigFloatValue::Arbitrary(v) => BigFloatValue::Arbitrary(v.clone().abs()),
        };
        Self {
            value,
            precision_bits: self.precision_bits,
        }
    }

    /// Approximate log2(|self|). Works beyond the f64 exponent range.
    /// Returns negative infinity for zero.
    pub fn log2_approx(&self) -> f64 {
        match &self.value {
            BigFloatValue::F64(v) => v.abs().log2(),
            BigFloatValue::Arbitrary(v) => {
                let as_f64 = self.to_f64();
                if as_f64 != 0.0 && as_f64.is_finite() {
                    as_f64.abs().log2()
                } else if v.repr().is_zero() {
                    f64::NEG_INFINITY
                } else {
                    f64::from(v.log2_est())
                }
            }
        }
    }

    fn binary_op(
        &self,
        other: &Self,
        f64_op: impl Fn(f64, f64) -> f64,
        big_op: impl Fn(&FBig, &FBig) -> FBig,
    ) -> Self {
        let result_precision = self.precision_bits.max(other.precision_bits);

        let value = match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) if result_precision <= 64 => {
                BigFloatValue::F64(f64_op(*a, *b))
            }
            _ => {
                let a_big = self.to_fbig(result_precision);
                let b_big = other.to_fbig(result_precision);
                BigFloatValue::Arbitrary(big_op(&a_big, &b_big))
            }
        };

        Self {
            value,
            precision_bits: result_precision,
        }
    }

    /// Convert to FBig for arbitrary precision operations
    fn to_fbig(&self, precision_bits: usize) -> FBig {
        match &self.value {
            BigFloatValue::F64(v) => fbig_from_f64(*v, precision_bits.max(self.precision_bits)),
            BigFloatValue::Arbitrary(v) => v.clone(),
        }
    }
}

fn fbig_from_f64(val: f64, precision_bits: usize) -> FBig {
    let fbig = if val == 0.0 {
        FBig::ZERO
    } else {
        match FBig::try_from(val) {
            Ok(v) => v,
            Err(_) => panic!("BigFloat requires a finite value, got {val}"),
        }
    };
    fbig.with_precision(precision_bits).value()
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a == b,
            _ => {
                let precision = self.precision_bits.max(other.precision_bits);
                self.to_fbig(precision) == other.to_fbig(precision)
            }
        }
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a.partial_cmp(b),
            _ => {
                let precision = self.precision_bits.max(other.precision_bits);
                self.to_fbig(precision)
                    .partial_cmp(&other.to_fbig(precision))
            }
        }
    }
}

impl std::fmt::Display for BigFloat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            BigFloatValue::F64(v) => write!(f, "{}", v),
            BigFloatValue::Arbitrary(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BigFloatSerde {
    value: String,
    precision_bits: usize,
}

impl Serialize for BigFloat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value_str = match &self.value {
            BigFloatValue::F64(v) => v.to_string(),
            BigFloatValue::Arbitrary(v) => v.to_string(),
        };

        BigFloatSerde {
            value: value_str,
            precision_bits: self.precision_bits,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigFloat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let serde = BigFloatSerde::deserialize(deserializer)?;

        let value = if serde.precision_bits <= 64 {
            let f = serde
                .value
                .parse::<f64>()
                .map_err(|e| serde::de::Error::custom(format!("Failed to parse f64: {}", e)))?;
            BigFloatValue::F64(f)
        } else {
            let fbig = serde
                .value
                .parse::<FBig>()
                .map_err(|e| serde::de::Error::custom(format!("Failed to parse FBig: {}", e)))?;
            BigFloatValue::Arbitrary(fbig)
        };

        Ok(BigFloat {
            value,
            precision_bits: serde.precision_bits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_returns_positive_for_negative_value() {
        let neg = BigFloat::with_precision(-5.0, 64);
        assert_eq!(neg.abs().to_f64(), 5.0);
    }

    #[test]
    fn abs_preserves_precision() {
        let neg = BigFloat::with_precision(-5.0, 256);
        assert_eq!(neg.abs().precision_bits(), 256);
    }

    #[test]
    fn square_matches_mul() {
        let a = BigFloat::with_precision(-1.25, 256);
        assert_eq!(a.square(), a.mul(&a));
        assert_eq!(a.square().to_f64(), 1.5625);
    }

    #[test]
    fn log2_approx_of_power_of_two() {
        assert_eq!(BigFloat::with_precision(8.0, 64).log2_approx(), 3.0);
        assert_eq!(BigFloat::with_precision(0.25, 256).log2_approx(), -2.0);
    }

    #[test]
    fn log2_approx_beyond_f64_range() {
        let tiny = BigFloat::from_string("1e-500", 2048).unwrap();
        let log2 = tiny.log2_approx();
        // log2(1e-500) ≈ -1660.96
        assert!((log2 + 1661.0).abs() < 2.0, "got {log2}");
    }

    #[test]
    fn log2_approx_of_zero_is_negative_infinity() {
        assert_eq!(BigFloat::zero(256).log2_approx(), f64::NEG_INFINITY);
        let parsed = BigFloat::from_string("0.0", 512).unwrap();
        assert_eq!(parsed.log2_approx(), f64::NEG_INFINITY);
    }

    #[test]
    fn to_f64_rounds_to_nearest() {
        // Truncation would give 0.09999999999999999
        assert_eq!(BigFloat::from_string("0.1", 256).unwrap().to_f64(), 0.1);
        let near_two = BigFloat::from_string("-1.999999999999999999999999999999", 256).unwrap();
        assert_eq!(near_two.to_f64(), -2.0);
    }

    #[test]
    fn mixed_precision_promotes_to_larger() {
        let a = BigFloat::with_precision(2.0, 64);
        let b = BigFloat::with_precision(3.0, 256);
        let sum = a.add(&b);
        assert_eq!(sum.precision_bits(), 256);
        assert_eq!(sum.to_f64(), 5.0);
    }

    #[test]
    fn from_u32_is_exact() {
        assert_eq!(BigFloat::from_u32(1920, 256).to_f64(), 1920.0);
    }
}
