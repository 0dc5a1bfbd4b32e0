use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::{BigInt, Sign};
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

use crate::error::CodecError;
use crate::types::TypeIdentifier;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;

/// Digits allowed after the decimal point
const MAX_SCALE: i64 = 16383;
/// Base-10000 groups the binary header can count (int16)
const MAX_GROUPS: i64 = i16::MAX as i64;

static NUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid numeric pattern")
});

/// Keep error text readable for very long literals
fn abbreviate(text: &str) -> String {
    match text.char_indices().nth(40) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Upper bound on the base-10000 groups needed on each side of the point
fn digit_groups(integer_digits: i64, scale: i64) -> i64 {
    (integer_digits.max(0) + 3) / 4 + (scale.max(0) + 3) / 4
}

pub struct DecimalHandler;

impl DecimalHandler {
    /// Parse numeric text exactly, keeping the scale written in the source
    pub fn parse_decimal(s: &str) -> Result<BigDecimal, CodecError> {
        let trimmed = s.trim();
        let unsigned = trimmed.trim_start_matches(['+', '-']);
        if trimmed.eq_ignore_ascii_case("nan") || unsigned.eq_ignore_ascii_case("infinity") {
            return Err(CodecError::range(TypeIdentifier::Numeric, trimmed));
        }
        if !NUMERIC_PATTERN.is_match(trimmed) {
            return Err(CodecError::format(TypeIdentifier::Numeric, s));
        }

        let decimal = BigDecimal::from_str(trimmed).map_err(|_| CodecError::format(TypeIdentifier::Numeric, s))?;
        let (_, scale) = decimal.as_bigint_and_exponent();
        let integer_digits = decimal.digits() as i64 - scale;
        if scale > MAX_SCALE || digit_groups(integer_digits, scale) > MAX_GROUPS {
            return Err(CodecError::range(TypeIdentifier::Numeric, abbreviate(trimmed)));
        }
        // An exponent only shifts the point; "1e3" is the integer 1000
        Ok(if scale < 0 { decimal.with_scale(0) } else { decimal })
    }

    /// Plain positional text, never exponent notation
    pub fn format_decimal(decimal: &BigDecimal) -> String {
        let (unscaled, scale) = decimal.as_bigint_and_exponent();
        let negative = unscaled.sign() == Sign::Minus;
        let mut digits = unscaled.magnitude().to_string();

        let mut result = String::with_capacity(digits.len() + 3);
        if negative {
            result.push('-');
        }
        if scale <= 0 {
            result.push_str(&digits);
            if digits != "0" {
                result.extend(std::iter::repeat_n('0', (-scale) as usize));
            }
            return result;
        }

        let scale = scale as usize;
        if digits.len() <= scale {
            digits = format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits);
        }
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        result.push_str(int_part);
        result.push('.');
        result.push_str(frac_part);
        result
    }

    /// Encode as PostgreSQL binary NUMERIC:
    /// ndigits, weight, sign, dscale (all int16) then base-10000 digit groups
    pub fn encode_numeric(decimal: &BigDecimal) -> Result<Vec<u8>, CodecError> {
        let (unscaled, scale) = decimal.as_bigint_and_exponent();
        let (unscaled, scale) = if scale < 0 {
            decimal.with_scale(0).as_bigint_and_exponent()
        } else {
            (unscaled, scale)
        };
        let sign = if unscaled.sign() == Sign::Minus { NUMERIC_NEG } else { NUMERIC_POS };
        let digits = unscaled.magnitude().to_string();

        let int_len = digits.len() as i64 - scale;
        let (int_digits, frac_digits) = if int_len > 0 {
            let (i, f) = digits.split_at(int_len as usize);
            (i.to_string(), f.to_string())
        } else {
            (String::new(), format!("{}{}", "0".repeat((-int_len) as usize), digits))
        };

        // Align both halves on group boundaries around the decimal point
        let pad_left = (4 - int_digits.len() % 4) % 4;
        let pad_right = (4 - frac_digits.len() % 4) % 4;
        let aligned = format!(
            "{}{}{}{}",
            "0".repeat(pad_left),
            int_digits,
            frac_digits,
            "0".repeat(pad_right)
        );

        let mut groups: Vec<i16> = aligned
            .as_bytes()
            .chunks(4)
            .map(|chunk| chunk.iter().fold(0i16, |acc, b| acc * 10 + (b - b'0') as i16))
            .collect();
        let leading = groups.iter().take_while(|g| **g == 0).count();
        groups.drain(..leading);
        let weight = ((pad_left + int_digits.len()) / 4) as i64 - 1 - leading as i64;
        while groups.last() == Some(&0) {
            groups.pop();
        }

        // Every header field is an int16 on the wire
        if groups.len() as i64 > MAX_GROUPS || weight > i16::MAX as i64 || !(0..=MAX_SCALE).contains(&scale) {
            return Err(CodecError::range(TypeIdentifier::Numeric, abbreviate(&digits)));
        }

        let mut buf = BytesMut::with_capacity(8 + groups.len() * 2);
        if groups.is_empty() {
            buf.put_i16(0);
            buf.put_i16(0);
            buf.put_u16(NUMERIC_POS);
        } else {
            buf.put_i16(groups.len() as i16);
            buf.put_i16(weight as i16);
            buf.put_u16(sign);
        }
        buf.put_i16(scale as i16);
        for group in groups {
            buf.put_i16(group);
        }
        Ok(buf.to_vec())
    }

    /// Decode PostgreSQL binary NUMERIC
    pub fn decode_numeric(bytes: &[u8]) -> Result<BigDecimal, CodecError> {
        let malformed = || CodecError::format(TypeIdentifier::Numeric, hex::encode(bytes));
        if bytes.len() < 8 {
            return Err(malformed());
        }

        let ndigits = BigEndian::read_i16(&bytes[0..2]);
        let weight = BigEndian::read_i16(&bytes[2..4]) as i64;
        let sign = BigEndian::read_u16(&bytes[4..6]);
        let dscale = BigEndian::read_i16(&bytes[6..8]);

        if sign == NUMERIC_NAN {
            return Err(CodecError::range(TypeIdentifier::Numeric, "NaN"));
        }
        if (sign != NUMERIC_POS && sign != NUMERIC_NEG) || ndigits < 0 || dscale < 0 {
            return Err(malformed());
        }
        if bytes.len() != 8 + ndigits as usize * 2 {
            return Err(malformed());
        }

        let mut unscaled = BigInt::from(0u32);
        for chunk in bytes[8..].chunks(2) {
            let group = BigEndian::read_i16(chunk);
            if !(0..10000).contains(&group) {
                return Err(malformed());
            }
            unscaled = unscaled * 10000u32 + BigInt::from(group as u32);
        }
        if sign == NUMERIC_NEG {
            unscaled = -unscaled;
        }

        // The last group sits at power 10000^(weight - ndigits + 1)
        let exponent = 4 * (weight - ndigits as i64 + 1);
        Ok(BigDecimal::new(unscaled, -exponent).with_scale(dscale as i64))
    }
}
