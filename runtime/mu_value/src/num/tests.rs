use pretty_assertions::assert_eq;

use super::*;

// ── Hashing ──

#[test]
fn integral_numbers_hash_to_themselves() {
    assert_eq!(hash(0.0), 0);
    assert_eq!(hash(-0.0), 0);
    assert_eq!(hash(7.0), 7);
    assert_eq!(hash(4_294_967_296.0), 0);
}

#[test]
fn equal_numbers_hash_equal() {
    for n in [0.5, -3.25, 1e300, f64::INFINITY] {
        assert_eq!(hash(n), hash(n + 0.0));
    }
}

#[test]
fn index_keys() {
    assert_eq!(index_of(&Value::Number(3.0), hash(3.0)), Some(3));
    assert_eq!(index_of(&Value::Number(-0.0), hash(-0.0)), Some(0));
    assert_eq!(index_of(&Value::Number(-1.0), hash(-1.0)), None);
    assert_eq!(index_of(&Value::Number(2.5), hash(2.5)), None);
    assert_eq!(index_of(&Value::Number(4_294_967_297.0), 1), None);
    assert_eq!(index_of(&Value::from("3"), 3), None);
}

#[test]
fn integral_range() {
    assert_eq!(integral(12.0), Some(12));
    assert_eq!(integral(-5.0), Some(-5));
    assert_eq!(integral(0.1), None);
    assert_eq!(integral(f64::NAN), None);
    assert_eq!(integral(f64::INFINITY), None);
    assert_eq!(integral(1e300), None);
}

#[test]
fn nan_is_unequal_to_itself() {
    assert!(!equals(f64::NAN, f64::NAN));
    assert!(equals(0.0, -0.0));
}

// ── Parsing ──

#[test]
fn parse_decimal() {
    assert_eq!(parse("42"), Ok(42.0));
    assert_eq!(parse("-3.5"), Ok(-3.5));
    assert_eq!(parse("+1e3"), Ok(1000.0));
    assert_eq!(parse("2.5E-1"), Ok(0.25));
    assert_eq!(parse(".5"), Ok(0.5));
}

#[test]
fn parse_prefixed_integers() {
    assert_eq!(parse("0x1F"), Ok(31.0));
    assert_eq!(parse("0o17"), Ok(15.0));
    assert_eq!(parse("0b101"), Ok(5.0));
    assert_eq!(parse("-0xff"), Ok(-255.0));
}

#[test]
fn parse_rejects_malformed_text() {
    for text in ["", "-", "abc", "1..2", "1e", "0x", "0b12", "12abc", "inf", "nan", " 1"] {
        assert_eq!(parse(text), Err(Error::Parse), "input {text:?}");
    }
}

// ── Rendering ──

#[test]
fn format_integral_and_fractional() {
    assert_eq!(format_number(10.0), "10");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(-42.0), "-42");
    assert_eq!(format_number(0.5), "0.5");
    assert_eq!(format_number(-2.25), "-2.25");
}

#[test]
fn format_special_values() {
    assert_eq!(format_number(f64::INFINITY), "inf");
    assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
    assert_eq!(format_number(f64::NAN), "nan");
}

#[test]
fn format_is_bounded() {
    for n in [1e300, 1.0 / 3.0, -123_456_789_012_345_678.0, 6.02214076e23, 1e-300] {
        let text = format_number(n);
        assert!(text.len() <= NUM_LEN, "{n} rendered as {text}");
    }
    assert_eq!(format_number(1e300), "1e300");
}

#[test]
fn repr_allocates_string() {
    assert_eq!(repr(12.0).map(|s| s.to_string()), Ok("12".to_owned()));
}
