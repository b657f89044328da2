use fractalzoom_core::BigFloat;

// ============================================================================
// Arithmetic at scales f64 cannot represent
// ============================================================================

#[test]
fn add_extreme_same_scale_tiny() {
    let a = BigFloat::from_string("1e-2000", 7000).unwrap();
    let b = BigFloat::from_string("3.5e-2000", 7000).unwrap();
    let expected = BigFloat::from_string("4.5e-2000", 7000).unwrap();

    let result = a.add(&b);
    assert_eq!(result.precision_bits(), 7000);
    assert_eq!(result, expected);
}

#[test]
fn sub_recovers_offset_lost_in_f64() {
    // -0.75 + 1e-40 - (-0.75) is 0 in f64 but exact at 256 bits
    let base = BigFloat::from_string("-0.75", 256).unwrap();
    let offset = BigFloat::from_string("1e-40", 256).unwrap();
    let shifted = base.add(&offset);

    let diff = shifted.sub(&base);
    let rel = (diff.to_f64() - 1e-40).abs() / 1e-40;
    assert!(rel < 1e-12, "relative error {rel}");
    assert_eq!((-0.75_f64 + 1e-40) - (-0.75_f64), 0.0);
}

#[test]
fn mul_and_div_are_inverse() {
    let a = BigFloat::from_string("1.2345678901234567890123456789", 256).unwrap();
    let b = BigFloat::from_string("9.87654321e-100", 256).unwrap();
    let back = a.mul(&b).div(&b);

    let err = back.sub(&a).abs();
    assert!(err.log2_approx() < -240.0, "error 2^{}", err.log2_approx());
}

#[test]
fn square_of_tiny_value_does_not_underflow() {
    let tiny = BigFloat::from_string("1e-200", 2048).unwrap();
    let sq = tiny.square();
    // 1e-400 is below f64's range
    assert_eq!(sq.to_f64(), 0.0);
    assert!((sq.log2_approx() + 1328.77).abs() < 1.0);
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn ordering_across_paths() {
    let small = BigFloat::with_precision(1.5, 64);
    let large = BigFloat::with_precision(2.5, 256);
    assert!(small < large);
    assert!(large > small);
}

#[test]
fn ordering_beyond_f64_range() {
    let a = BigFloat::from_string("1e-2000", 7000).unwrap();
    let b = BigFloat::from_string("2e-2000", 7000).unwrap();
    assert!(a < b);
    assert_ne!(a, b);
}

#[test]
fn equality_of_separately_parsed_values() {
    let a = BigFloat::from_string("1e-2000", 7000).unwrap();
    let b = BigFloat::from_string("1e-2000", 7000).unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// Construction and serialization
// ============================================================================

#[test]
fn from_string_rejects_garbage() {
    assert!(BigFloat::from_string("not a number", 64).is_err());
    assert!(BigFloat::from_string("not a number", 256).is_err());
}

#[test]
fn low_precision_uses_f64_semantics() {
    let a = BigFloat::with_precision(0.1, 64);
    let b = BigFloat::with_precision(0.2, 64);
    assert_eq!(a.add(&b).to_f64(), 0.1 + 0.2);
}

#[test]
fn serialize_round_trip_f64_path() {
    let original = BigFloat::with_precision(1.5, 64);
    let json = serde_json::to_string(&original).unwrap();
    let back: BigFloat = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
    assert_eq!(back.precision_bits(), 64);
}

#[test]
fn serialize_round_trip_arbitrary_path() {
    let original = BigFloat::with_precision(2.5, 128);
    let json = serde_json::to_string(&original).unwrap();
    let back: BigFloat = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
    assert_eq!(back.precision_bits(), 128);
}

#[test]
fn serialized_form_records_precision() {
    let json = serde_json::to_string(&BigFloat::with_precision(1.5, 64)).unwrap();
    assert!(json.contains("\"precision_bits\":64"), "{json}");
}
