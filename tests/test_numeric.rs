use msgpack_typed::num::atof::parse_float;
use msgpack_typed::num::itoa::{MAX_U64_DIGITS, fmt_u64};

/// `str::parse::<f64>` is correctly rounded; every parse must agree with it
/// bit for bit.
fn check(s: &str) {
    let expected: f64 = s.parse().expect("reference parse");
    let got = parse_float(s.as_bytes()).expect("parse_float");
    assert_eq!(
        expected.to_bits(),
        got.to_bits(),
        "parsing {s:?}: expected {expected:e}, got {got:e}"
    );
}

#[test]
fn test_known_hard_inputs() {
    let cases = [
        // halfway cases that defeat the 128-bit approximation
        "9007199254740993",
        "9007199254740992.5",
        "1.00000000000000011102230246251565404236316680908203125",
        "0.500000000000000166533453693773481063544750213623046875",
        "3.518437208883201171875e13",
        "9214843084008499",
        "30078505129381147446200",
        "1777820000000000000001",
        // subnormal territory
        "5e-324",
        "4.9e-324",
        "2.47e-324",
        "2.4e-324",
        "1e-320",
        "6.33e-322",
        "2.2250738585072011e-308",
        "2.2250738585072014e-308",
        "104110013277974872254e-225",
        // extremes
        "1.7976931348623157e308",
        "1.7976931348623159e308",
        "8.98846567431158e307",
        "1e309",
        "1e400",
        "1e-400",
        "0e999999",
        // plain
        "62.5",
        "8.7e-280",
        "1090544144181609348835077142190",
        "0.1",
        "0.2",
        "0.3",
        "2.675",
        "1e22",
        "1e23",
        "-1e23",
        "123456789012345678e-20",
    ];
    for s in cases {
        check(s);
    }
}

#[test]
fn test_mantissa_exponent_grid() {
    let mantissas: [u64; 8] = [
        1,
        7,
        20,
        123_456_789,
        (1 << 53) - 1,
        (1 << 53) + 1,
        9_999_999_999_999_999_999,
        18_446_744_073_709_551_615,
    ];
    for man in mantissas {
        for exp in (-320..=300).step_by(7) {
            let s = format!("{man}e{exp}");
            check(&s);
        }
    }
}

#[test]
fn test_long_digit_strings_force_fallback() {
    // more digits than a u64 mantissa can hold
    check("1.2345678901234567890123456789012345678901234567890e10");
    check(&format!("1{}", "0".repeat(400)));
    check(&format!("0.{}1", "0".repeat(320)));
    check(&format!("0.{}1e-20", "0".repeat(300)));
    // 770 significant digits, truncation inside the digit array
    let long: String = "123456789".repeat(86).chars().take(770).collect();
    check(&format!("0.{long}"));
}

#[test]
fn test_signs_and_zeros() {
    for s in ["0", "-0", "0.0", "-0.0", "+0.0", "0e10", "-0e-10"] {
        let expected: f64 = s.parse().unwrap();
        let got = parse_float(s.as_bytes()).unwrap();
        assert_eq!(expected.to_bits(), got.to_bits(), "parsing {s:?}");
    }
}

fn fmt(x: u64) -> String {
    let mut buf = [0u8; MAX_U64_DIGITS];
    let n = fmt_u64(x, &mut buf);
    std::str::from_utf8(&buf[..n]).unwrap().to_owned()
}

#[test]
fn test_fmt_u64_against_reference() {
    let mut values: Vec<u64> = vec![0, u64::MAX];
    for p in 0..20u32 {
        let pow = 10u64.pow(p);
        values.push(pow);
        values.push(pow - 1);
        values.push(pow + 1);
    }
    // a scattering across the whole range
    let mut x: u64 = 0x9e37_79b9_7f4a_7c15;
    for _ in 0..2000 {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        values.push(x);
    }
    for v in values {
        assert_eq!(v.to_string(), fmt(v), "formatting {v}");
    }
}
