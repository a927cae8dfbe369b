use std::{fmt, str::FromStr, sync::LazyLock};

use macaddr::MacAddr6;
use rand::Rng;
use regex::Regex;

use crate::MacswapError;

/// Six colon-separated two-digit hex groups.
const MAC_GRAMMAR: &str = "[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}";

static EXACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{MAC_GRAMMAR}$")).expect("MAC grammar is a valid regex")
});

// The surrounding characters must not extend the run of hex groups, otherwise
// the tail of an IPv6 address such as `2001:db8:aa:bb:cc:dd:ee:ff` would match.
static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?:^|[^0-9A-Fa-f:])({MAC_GRAMMAR})(?:$|[^0-9A-Fa-f:])"))
        .expect("MAC grammar is a valid regex")
});

/// A hardware address, always rendered as `aa:bb:cc:dd:ee:ff`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(MacAddr6);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        MacAddress(MacAddr6::new(
            octets[0], octets[1], octets[2], octets[3], octets[4], octets[5],
        ))
    }

    /// Parses exactly six colon-separated groups of two hex digits.
    ///
    /// Upper- and lowercase digits are accepted; anything else, including
    /// other separators, missing groups or trailing characters, is rejected.
    pub fn parse(text: &str) -> Result<Self, MacswapError> {
        if !EXACT.is_match(text) {
            return Err(MacswapError::InvalidMacFormat(text.to_owned()));
        }
        Ok(Self::from_grammar_match(text))
    }

    /// Returns the first MAC-shaped token found in `text`, if any.
    pub fn extract_from(text: &str) -> Option<Self> {
        EMBEDDED
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| Self::from_grammar_match(m.as_str()))
    }

    /// Six independent uniformly random octets. No bits are forced.
    pub fn random() -> Self {
        let mut octets = [0u8; 6];
        rand::thread_rng().fill(&mut octets);
        MacAddress::new(octets)
    }

    /// Random unicast address with the locally-administered bit set.
    pub fn random_local() -> Self {
        let mut octets = Self::random().octets();
        octets[0] = (octets[0] & 0xfe) | 0x02;
        MacAddress::new(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0.into_array()
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    // Only called on text already matched by MAC_GRAMMAR, so every group is
    // two valid hex digits.
    fn from_grammar_match(text: &str) -> Self {
        let mut octets = [0u8; 6];
        for (octet, group) in octets.iter_mut().zip(text.split(':')) {
            *octet = u8::from_str_radix(group, 16).unwrap_or_default();
        }
        MacAddress::new(octets)
    }
}

impl FromStr for MacAddress {
    type Err = MacswapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MacAddress::parse(s)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.octets();
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}
