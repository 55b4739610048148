//! Locale-independent number parsing that never panics.
//!
//! [`parse_positive_int`] and [`parse_double`] report malformed input
//! through `None` / `NaN` instead of errors. The compiler uses them for
//! quantifier bounds, where a bad number must surface as a pattern
//! diagnostic with an offset, not as an unrelated failure.

/// Zero code points of the Unicode decimal digit runs (general category Nd,
/// Unicode 15.0). Every run covers zero..=nine starting at the listed code
/// point.
const DECIMAL_DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
    0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

/// Numeric value of `c` under `radix`, recognizing ASCII digits and letters
/// plus every Unicode decimal digit.
fn digit_value(c: char, radix: u32) -> Option<u32> {
    if let Some(digit) = c.to_digit(radix) {
        return Some(digit);
    }
    let code = c as u32;
    let run = DECIMAL_DIGIT_ZEROS.partition_point(|&zero| zero <= code);
    if run > 0 {
        let zero = DECIMAL_DIGIT_ZEROS[run - 1];
        let digit = code - zero;
        if digit <= 9 && digit < radix {
            return Some(digit);
        }
    }
    None
}

/// Parses a string as a non-negative integer in the given radix.
///
/// Leading and trailing spaces are skipped, as are spaces used as digit
/// group separators (e.g. `"1 000 000 000"`). The first character may be an
/// ASCII plus sign; a minus sign always yields `None` since only
/// non-negative results are ever returned. Digits may be any Unicode
/// decimal digit, not only ASCII `0`-`9`.
///
/// Returns `None` for empty input, an unsupported radix (outside 2..=36),
/// any non-digit character, or a value that does not fit in the positive
/// `i32` range. Overflow is checked before every multiply and add, so the
/// accumulator never wraps.
pub fn parse_positive_int(string: &str, radix: u32) -> Option<i32> {
    if !(2..=36).contains(&radix) {
        return None;
    }

    let mut chars = string.chars().peekable();
    while chars.peek() == Some(&' ') {
        chars.next();
    }
    match chars.peek() {
        Some('-') => return None,
        Some('+') => {
            chars.next();
        }
        _ => {}
    }

    let multiplication_limit = i32::MAX / radix as i32;
    // Fast path for ISO-LATIN-1 digits; once a non-Latin digit shows up we
    // stay on the general lookup for the rest of the string.
    let mut check_latin_digits_first = radix == 10;
    let mut result: i32 = 0;
    let mut seen_digit = false;

    for c in chars {
        // spaces between digit groups are ignored
        if c == ' ' {
            continue;
        }

        let digit = if check_latin_digits_first && c.is_ascii_digit() {
            c as i32 - '0' as i32
        } else {
            match digit_value(c, radix) {
                Some(digit) => {
                    check_latin_digits_first = false;
                    digit as i32
                }
                None => return None,
            }
        };

        // limits have to hold before the arithmetic, afterwards is too late
        if result > multiplication_limit {
            return None;
        }
        result *= radix as i32;
        if result > i32::MAX - digit {
            return None;
        }
        result += digit;
        seen_digit = true;
    }

    if seen_digit {
        Some(result)
    } else {
        None
    }
}

/// Parses a string as a double precision floating point number.
///
/// In contrast to [`str::parse::<f64>`] both `.` and `,` are accepted as
/// the decimal separator independent of any locale, a trailing `d`/`D`/
/// `f`/`F` type suffix is ignored, and hexadecimal floating point literals
/// with a binary exponent (`0x1.99999ap-4`) are understood. `NaN`,
/// `Infinity` and `-Infinity` parse to the corresponding special values,
/// and exponents too large for `i32` clamp to infinity or zero.
///
/// Any other malformed input yields `f64::NAN`; the function never panics.
pub fn parse_double(string: &str) -> f64 {
    parse_double_checked(string.trim()).unwrap_or(f64::NAN)
}

/// Parses a string as a single precision floating point number.
///
/// Same grammar as [`parse_double`], narrowed to `f32`; values beyond the
/// `f32` range become infinite.
pub fn parse_float(string: &str) -> f32 {
    parse_double(string) as f32
}

fn parse_double_checked(s: &str) -> Option<f64> {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return None;
    }

    let mut i = 0;
    let negative = match chars[0] {
        '-' => {
            i = 1;
            true
        }
        '+' => {
            i = 1;
            false
        }
        _ => false,
    };
    if i >= chars.len() {
        return None;
    }

    let rest: String = chars[i..].iter().collect();
    if rest == "NaN" {
        return Some(f64::NAN);
    }
    if rest == "Infinity" {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    if rest.starts_with("0x") || rest.starts_with("0X") {
        return parse_hex_double(&chars[i + 2..], negative);
    }
    parse_decimal_double(&chars[i..], negative)
}

fn parse_decimal_double(digits: &[char], negative: bool) -> Option<f64> {
    let mut i = 0;
    let mut int_part = String::new();
    let mut frac_part = String::new();
    let mut exp_part = String::new();
    let mut exp_negative = false;

    while i < digits.len() && digits[i].is_ascii_digit() {
        int_part.push(digits[i]);
        i += 1;
    }
    if i < digits.len() && (digits[i] == '.' || digits[i] == ',') {
        i += 1;
        while i < digits.len() && digits[i].is_ascii_digit() {
            frac_part.push(digits[i]);
            i += 1;
        }
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if i < digits.len() && (digits[i] == 'e' || digits[i] == 'E') {
        i += 1;
        if i < digits.len() && (digits[i] == '+' || digits[i] == '-') {
            exp_negative = digits[i] == '-';
            i += 1;
        }
        while i < digits.len() && digits[i].is_ascii_digit() {
            exp_part.push(digits[i]);
            i += 1;
        }
        if exp_part.is_empty() {
            return None;
        }
    }
    if i < digits.len() && matches!(digits[i], 'd' | 'D' | 'f' | 'F') {
        i += 1;
    }
    if i != digits.len() {
        return None;
    }

    // Rebuild a canonical literal; std's float parsing already clamps
    // oversized exponents to infinity / zero.
    let mut canonical = String::with_capacity(digits.len() + 2);
    if negative {
        canonical.push('-');
    }
    if int_part.is_empty() {
        canonical.push('0');
    } else {
        canonical.push_str(&int_part);
    }
    if !frac_part.is_empty() {
        canonical.push('.');
        canonical.push_str(&frac_part);
    }
    if !exp_part.is_empty() {
        canonical.push('e');
        if exp_negative {
            canonical.push('-');
        }
        canonical.push_str(&exp_part);
    }
    canonical.parse::<f64>().ok()
}

/// Significant hex digits kept in the mantissa; 16 of them cover the 53
/// mantissa bits of an `f64`.
const HEX_MANTISSA_DIGITS: u32 = 16;

/// Binary exponents beyond this magnitude are out of `f64` range no matter
/// the mantissa.
const BINARY_EXPONENT_LIMIT: i64 = 2_000;

fn parse_hex_double(digits: &[char], negative: bool) -> Option<f64> {
    let mut i = 0;
    let mut mantissa: f64 = 0.0;
    let mut significant: u32 = 0;
    let mut scale_exp: i64 = 0;
    let mut seen_digit = false;

    while i < digits.len() {
        let Some(value) = digits[i].to_digit(16) else {
            break;
        };
        seen_digit = true;
        if significant < HEX_MANTISSA_DIGITS {
            mantissa = mantissa * 16.0 + value as f64;
            if mantissa != 0.0 {
                significant += 1;
            }
        } else {
            scale_exp += 4;
        }
        i += 1;
    }
    if i < digits.len() && digits[i] == '.' {
        i += 1;
        while i < digits.len() {
            let Some(value) = digits[i].to_digit(16) else {
                break;
            };
            seen_digit = true;
            if significant < HEX_MANTISSA_DIGITS {
                mantissa = mantissa * 16.0 + value as f64;
                scale_exp -= 4;
                if mantissa != 0.0 {
                    significant += 1;
                }
            }
            i += 1;
        }
    }
    if !seen_digit {
        return None;
    }

    // binary exponent is mandatory in hexadecimal floating point literals
    if i >= digits.len() || !matches!(digits[i], 'p' | 'P') {
        return None;
    }
    i += 1;
    let mut exp_negative = false;
    if i < digits.len() && (digits[i] == '+' || digits[i] == '-') {
        exp_negative = digits[i] == '-';
        i += 1;
    }
    let mut exponent: i64 = 0;
    let mut exp_digits = 0;
    while i < digits.len() && digits[i].is_ascii_digit() {
        let digit = digits[i] as i64 - '0' as i64;
        exponent = (exponent * 10 + digit).min(i64::from(i32::MAX));
        exp_digits += 1;
        i += 1;
    }
    if exp_digits == 0 {
        return None;
    }
    if exp_negative {
        exponent = -exponent;
    }

    if i < digits.len() && matches!(digits[i], 'd' | 'D' | 'f' | 'F') {
        i += 1;
    }
    if i != digits.len() {
        return None;
    }

    let sign = if negative { -1.0 } else { 1.0 };
    if mantissa == 0.0 {
        return Some(sign * 0.0);
    }
    let total_exp = exponent + scale_exp;
    if total_exp > BINARY_EXPONENT_LIMIT {
        return Some(sign * f64::INFINITY);
    }
    if total_exp < -BINARY_EXPONENT_LIMIT {
        return Some(sign * 0.0);
    }
    Some(sign * mantissa * 2f64.powi(total_exp as i32))
}
