//! 128-bit identifier value

use std::fmt;
use std::str::FromStr;

/// GUID-like 128-bit identifier
///
/// Formats as the familiar hyphenated form (`8-4-4-4-12` hex groups) and
/// parses either that form or a bare 32-hex-digit string.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Guid(pub u128);

impl Guid {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub const fn as_u128(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (b >> 96) as u32,
            (b >> 80) as u16,
            (b >> 64) as u16,
            (b >> 48) as u16,
            b & 0xffff_ffff_ffff
        )
    }
}

impl FromStr for Guid {
    type Err = ParseGuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return Err(ParseGuidError);
        }
        u128::from_str_radix(&hex, 16)
            .map(Guid)
            .map_err(|_| ParseGuidError)
    }
}

/// Error parsing a guid string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid guid string")]
pub struct ParseGuidError;

impl serde::Serialize for Guid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let guid = Guid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let text = guid.to_string();
        assert_eq!(text, "01234567-89ab-cdef-0123-456789abcdef");
        assert_eq!(text.parse::<Guid>().unwrap(), guid);
    }

    #[test]
    fn test_parse_without_hyphens() {
        let guid: Guid = "0123456789abcdef0123456789abcdef".parse().unwrap();
        assert_eq!(guid.as_u128(), 0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-guid".parse::<Guid>().is_err());
        assert!("".parse::<Guid>().is_err());
    }

    #[test]
    fn test_zero() {
        assert!(Guid::zero().is_zero());
        assert_eq!(
            Guid::zero().to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
    }
}
