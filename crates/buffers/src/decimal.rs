//! 96-bit decimal value and its 16-byte wire layout.
//!
//! Layout: bytes 0..12 hold the unscaled magnitude (little-endian), bytes
//! 12 and 13 are reserved zeros, byte 14 is the scale and byte 15 the sign
//! (`0x80` when negative).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::BufferError;

/// Largest scale (digits after the decimal point).
pub const MAX_DECIMAL_SCALE: u8 = 28;

/// Largest unscaled magnitude, `2^96 - 1`.
pub const MAX_DECIMAL_MAGNITUDE: u128 = (1u128 << 96) - 1;

const SIGN_BIT: u8 = 0x80;

/// A decimal number `(-1)^negative * magnitude / 10^scale`.
///
/// The magnitude carries all 96 bits end to end; nothing is dropped when a
/// value goes through [`Decimal::to_bytes`] and [`Decimal::from_bytes`].
///
/// ```
/// use fbe_buffers::Decimal;
///
/// let price: Decimal = "-123.4500".parse().unwrap();
/// assert_eq!(price.scale(), 4);
/// assert!(price.is_negative());
/// assert_eq!(price.to_string(), "-123.4500");
/// assert_eq!(Decimal::from_bytes(&price.to_bytes()).unwrap(), price);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    magnitude: u128,
    scale: u8,
    negative: bool,
}

impl Decimal {
    /// Builds a decimal from a signed unscaled value and a scale.
    pub fn new(mantissa: i128, scale: u32) -> Result<Self, BufferError> {
        let negative = mantissa < 0;
        let scale = u8::try_from(scale).map_err(|_| BufferError::InvalidDecimalScale(scale))?;
        Self::from_parts(mantissa.unsigned_abs(), scale, negative)
    }

    /// Builds a decimal from its wire components.
    pub fn from_parts(magnitude: u128, scale: u8, negative: bool) -> Result<Self, BufferError> {
        if scale > MAX_DECIMAL_SCALE {
            return Err(BufferError::InvalidDecimalScale(scale as u32));
        }
        if magnitude > MAX_DECIMAL_MAGNITUDE {
            return Err(BufferError::DecimalOverflow);
        }
        Ok(Self {
            magnitude,
            scale,
            negative,
        })
    }

    pub fn magnitude(&self) -> u128 {
        self.magnitude
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Signed unscaled value.
    pub fn mantissa(&self) -> i128 {
        // magnitude < 2^96, so the cast cannot wrap
        let m = self.magnitude as i128;
        if self.negative {
            -m
        } else {
            m
        }
    }

    /// Encodes the 16-byte wire form.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..12].copy_from_slice(&self.magnitude.to_le_bytes()[..12]);
        out[14] = self.scale;
        out[15] = if self.negative { SIGN_BIT } else { 0 };
        out
    }

    /// Decodes the 16-byte wire form. The reserved bytes must be zero and
    /// the sign byte `0x00` or `0x80`.
    pub fn from_bytes(bytes: &[u8; 16]) -> Result<Self, BufferError> {
        let negative = match bytes[15] {
            0 => false,
            SIGN_BIT => true,
            _ => return Err(BufferError::InvalidDecimal(crate::hex(bytes))),
        };
        if bytes[12] != 0 || bytes[13] != 0 {
            return Err(BufferError::InvalidDecimal(crate::hex(bytes)));
        }
        let mut magnitude = [0u8; 16];
        magnitude[..12].copy_from_slice(&bytes[..12]);
        Self::from_parts(u128::from_le_bytes(magnitude), bytes[14], negative)
    }

    /// Integer and fractional parts, the latter rescaled to 28 digits, so
    /// two magnitudes of different scale can be compared without overflow.
    fn split(&self) -> (u128, u128) {
        let unit = pow10(self.scale);
        let int = self.magnitude / unit;
        let frac = (self.magnitude % unit) * pow10(MAX_DECIMAL_SCALE - self.scale);
        (int, frac)
    }
}

fn pow10(exp: u8) -> u128 {
    10u128.pow(exp as u32)
}

impl Ord for Decimal {
    /// Numeric order; numerically equal values are then ordered by scale
    /// and sign so that the order stays consistent with `Eq`.
    fn cmp(&self, other: &Self) -> Ordering {
        let zero_a = self.magnitude == 0;
        let zero_b = other.magnitude == 0;
        let neg_a = self.negative && !zero_a;
        let neg_b = other.negative && !zero_b;
        let numeric = match (neg_a, neg_b) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.split().cmp(&other.split()),
            (true, true) => other.split().cmp(&self.split()),
        };
        numeric
            .then(self.scale.cmp(&other.scale))
            .then(self.negative.cmp(&other.negative))
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.magnitude.to_string();
        let scale = self.scale as usize;
        if self.negative && self.magnitude != 0 {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{int}.{frac}")
        } else {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        }
    }
}

impl FromStr for Decimal {
    type Err = BufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BufferError::InvalidDecimal(s.to_owned());
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int, frac) = match body.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (body, ""),
        };
        if int.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > MAX_DECIMAL_SCALE as usize {
            return Err(BufferError::InvalidDecimalScale(frac.len() as u32));
        }
        let mut magnitude: u128 = 0;
        for b in int.bytes().chain(frac.bytes()) {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add((b - b'0') as u128))
                .ok_or(BufferError::DecimalOverflow)?;
        }
        Self::from_parts(magnitude, frac.len() as u8, negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout() {
        let d = Decimal::new(-12345, 2).unwrap();
        let bytes = d.to_bytes();
        assert_eq!(&bytes[..4], &12345u32.to_le_bytes());
        assert_eq!(&bytes[4..14], &[0u8; 10]);
        assert_eq!(bytes[14], 2);
        assert_eq!(bytes[15], 0x80);
    }

    #[test]
    fn test_full_96_bits_survive() {
        let d = Decimal::from_parts(MAX_DECIMAL_MAGNITUDE, 0, false).unwrap();
        let back = Decimal::from_bytes(&d.to_bytes()).unwrap();
        assert_eq!(back.magnitude(), MAX_DECIMAL_MAGNITUDE);
        assert_eq!(back.to_string(), "79228162514264337593543950335");
    }

    #[test]
    fn test_rejects_bad_scale() {
        let mut bytes = Decimal::default().to_bytes();
        bytes[14] = 29;
        assert_eq!(
            Decimal::from_bytes(&bytes),
            Err(BufferError::InvalidDecimalScale(29))
        );
        assert!(Decimal::new(1, 29).is_err());
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(
            Decimal::from_parts(MAX_DECIMAL_MAGNITUDE + 1, 0, false),
            Err(BufferError::DecimalOverflow)
        );
        assert_eq!(
            "79228162514264337593543950336".parse::<Decimal>(),
            Err(BufferError::DecimalOverflow)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Decimal::new(5, 3).unwrap().to_string(), "0.005");
        assert_eq!(Decimal::new(-150, 2).unwrap().to_string(), "-1.50");
        assert_eq!(Decimal::new(42, 0).unwrap().to_string(), "42");
        assert_eq!(Decimal::new(0, 1).unwrap().to_string(), "0.0");
    }

    #[test]
    fn test_parse() {
        assert_eq!(".5".parse::<Decimal>().unwrap(), Decimal::new(5, 1).unwrap());
        assert_eq!("+7.".parse::<Decimal>().unwrap(), Decimal::new(7, 0).unwrap());
        assert!("".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("1e5".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_numeric_order() {
        let parse = |s: &str| s.parse::<Decimal>().unwrap();
        assert!(parse("1.5") < parse("2"));
        assert!(parse("-2") < parse("-1.5"));
        assert!(parse("-0.1") < parse("0"));
        assert!(parse("10") > parse("9.999999"));
        // numerically equal, ordered by scale
        assert!(parse("1.0") > parse("1"));
        assert_ne!(parse("1.0"), parse("1"));
    }
}
