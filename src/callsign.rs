use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CallSignError, FrameError, Result};

/// Octets taken by one station on the wire: six callsign characters and an SSID octet.
pub const FIELD_LEN: usize = 7;

const CALLSIGN_LEN: usize = 6;
const MAX_SSID: u8 = 15;
const SSID_MASK: u8 = 0b0001_1110;

/// Characters permitted in a callsign once it has been uppercased.
pub fn is_callsign_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit()
}

/// A station identity: a callsign of 1-6 characters from `A-Z0-9` and an SSID from 0 to 15.
///
/// Every value of this type is valid. The only ways to obtain one are `create`,
/// parsing a string, decoding an address field or deserializing, and all of them
/// go through the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCallSignSSID"))]
pub struct CallSignSSID {
    callsign: String,
    ssid: u8,
}

impl CallSignSSID {
    /// Validate and build a station identity. The callsign is uppercased first.
    pub fn create(callsign: &str, ssid: u8) -> Result<CallSignSSID, CallSignError> {
        if ssid > MAX_SSID {
            return Err(CallSignError::SsidOutOfRange { ssid });
        }
        let callsign = callsign.to_ascii_uppercase();
        if callsign.is_empty() {
            return Err(CallSignError::Empty);
        }
        if callsign.chars().count() > CALLSIGN_LEN {
            return Err(CallSignError::TooLong { callsign });
        }
        if !callsign.chars().all(is_callsign_char) {
            return Err(CallSignError::InvalidCharacters { callsign });
        }
        Ok(CallSignSSID { callsign, ssid })
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Decode a station from a 7-octet address field.
    ///
    /// Only the SSID bits of the last octet are read. The command/response or
    /// has-been-repeated bit, the reserved bits and the extension bit belong to
    /// the address chain and are ignored here.
    pub fn decode_field(bytes: &[u8]) -> Result<CallSignSSID> {
        if bytes.len() != FIELD_LEN {
            return Err(FrameError::WrongFieldLength { len: bytes.len() });
        }
        let shifted: String = bytes[..CALLSIGN_LEN]
            .iter()
            .map(|&b| char::from(b >> 1))
            .collect();
        let ssid = (bytes[CALLSIGN_LEN] & SSID_MASK) >> 1;
        Ok(CallSignSSID::create(shifted.trim_end_matches(' '), ssid)?)
    }

    /// Encode this station as a 7-octet address field with every flag bit clear.
    pub fn encode_field(&self) -> [u8; FIELD_LEN] {
        // Shift by one bit as required for AX.25 address encoding, padding with spaces
        let mut encoded = [b' ' << 1; FIELD_LEN];
        for (slot, b) in encoded.iter_mut().zip(self.callsign.bytes()) {
            *slot = b << 1;
        }
        encoded[CALLSIGN_LEN] = self.ssid << 1;
        encoded
    }
}

impl fmt::Display for CallSignSSID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ssid {
            0 => write!(f, "{}", self.callsign),
            ssid => write!(f, "{}-{}", self.callsign, ssid),
        }
    }
}

/// Parses `CALL` (SSID 0) or `CALL-N`.
impl FromStr for CallSignSSID {
    type Err = CallSignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (callsign, ssid) = match s.split_once('-') {
            Some((callsign, ssid)) => {
                let ssid = ssid.parse::<u8>().map_err(|_| CallSignError::InvalidSsid {
                    input: ssid.to_string(),
                })?;
                (callsign, ssid)
            }
            None => (s, 0),
        };
        CallSignSSID::create(callsign, ssid)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawCallSignSSID {
    callsign: String,
    ssid: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCallSignSSID> for CallSignSSID {
    type Error = CallSignError;

    fn try_from(raw: RawCallSignSSID) -> Result<Self, Self::Error> {
        CallSignSSID::create(&raw.callsign, raw.ssid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(callsign: &str, ssid: u8) -> CallSignSSID {
        CallSignSSID::create(callsign, ssid).unwrap()
    }

    #[test]
    fn test_create() {
        let s = station("vk7ntk", 15);
        assert_eq!(s.callsign(), "VK7NTK");
        assert_eq!(s.ssid(), 15);

        assert_eq!(
            CallSignSSID::create("VK7NTK", 16),
            Err(CallSignError::SsidOutOfRange { ssid: 16 })
        );
        assert_eq!(
            CallSignSSID::create("VK7NTKX", 0),
            Err(CallSignError::TooLong {
                callsign: "VK7NTKX".to_string()
            })
        );
        assert_eq!(
            CallSignSSID::create("VK7N T", 0),
            Err(CallSignError::InvalidCharacters {
                callsign: "VK7N T".to_string()
            })
        );
        assert_eq!(CallSignSSID::create("", 0), Err(CallSignError::Empty));
        assert!(CallSignSSID::create("VK-7", 0).is_err());
        assert!(CallSignSSID::create("ÉCOLE", 0).is_err());

        // Only ASCII letters are case-mapped, so these never expand into valid characters
        assert_eq!(
            CallSignSSID::create("ßa", 0),
            Err(CallSignError::InvalidCharacters {
                callsign: "ßA".to_string()
            })
        );
        assert_eq!(
            CallSignSSID::create("\u{fb01}x", 0),
            Err(CallSignError::InvalidCharacters {
                callsign: "\u{fb01}X".to_string()
            })
        );
        assert_eq!(
            CallSignSSID::create("ßßßß", 0),
            Err(CallSignError::InvalidCharacters {
                callsign: "ßßßß".to_string()
            })
        );
    }

    #[test]
    fn test_decode_field() {
        let s = CallSignSSID::decode_field(&[0xae, 0xa4, 0x60, 0xaa, 0x40, 0x40, 0x08]).unwrap();
        assert_eq!(s, station("WR0U", 4));

        let s = CallSignSSID::decode_field(&[0x96, 0x62, 0x86, 0x90, 0x9c, 0x40, 0x18]).unwrap();
        assert_eq!(s, station("K1CHN", 12));

        let s = CallSignSSID::decode_field(&[0x96, 0x8a, 0x6e, 0xa6, 0x92, 0x9c, 0x0c]).unwrap();
        assert_eq!(s, station("KE7SIN", 6));
    }

    #[test]
    fn test_decode_field_ignores_chain_bits() {
        // KE7SIN-6 with the high bit, both reserved bits and the extension bit set
        let s = CallSignSSID::decode_field(&[0x96, 0x8a, 0x6e, 0xa6, 0x92, 0x9c, 0xed]).unwrap();
        assert_eq!(s, station("KE7SIN", 6));
    }

    #[test]
    fn test_decode_field_wrong_length() {
        assert_eq!(
            CallSignSSID::decode_field(&[0xae, 0xa4, 0x60, 0xaa, 0x40, 0x40]),
            Err(FrameError::WrongFieldLength { len: 6 })
        );
        assert_eq!(
            CallSignSSID::decode_field(&[0x40; 8]),
            Err(FrameError::WrongFieldLength { len: 8 })
        );
    }

    #[test]
    fn test_decode_field_rejects_blank_callsign() {
        assert_eq!(
            CallSignSSID::decode_field(&[0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x00]),
            Err(FrameError::CallSign(CallSignError::Empty))
        );
    }

    #[test]
    fn test_encode_field() {
        assert_eq!(
            station("WR0U", 4).encode_field(),
            [0xae, 0xa4, 0x60, 0xaa, 0x40, 0x40, 0x08]
        );
        assert_eq!(
            station("K1CHN", 12).encode_field(),
            [0x96, 0x62, 0x86, 0x90, 0x9c, 0x40, 0x18]
        );
        assert_eq!(
            station("KE7SIN", 6).encode_field(),
            [0x96, 0x8a, 0x6e, 0xa6, 0x92, 0x9c, 0x0c]
        );
    }

    #[test]
    fn test_round_trip() {
        for s in [station("WR0U", 10), station("K1CHN", 10), station("KE7SIN", 10), station("A", 0)] {
            assert_eq!(CallSignSSID::decode_field(&s.encode_field()).unwrap(), s);
        }
    }

    #[test]
    fn test_fromstr() {
        assert_eq!("VK7NTK-1".parse::<CallSignSSID>().unwrap(), station("VK7NTK", 1));
        assert_eq!("ID-15".parse::<CallSignSSID>().unwrap(), station("ID", 15));
        assert_eq!("BEACON".parse::<CallSignSSID>().unwrap(), station("BEACON", 0));
        assert!("vk7ntk-5".parse::<CallSignSSID>().is_ok());

        assert_eq!("-1".parse::<CallSignSSID>(), Err(CallSignError::Empty));
        assert!("VK7N -5".parse::<CallSignSSID>().is_err());
        assert!("VK7NTK-16".parse::<CallSignSSID>().is_err());
        assert_eq!(
            "vk7n--1".parse::<CallSignSSID>(),
            Err(CallSignError::InvalidSsid {
                input: "-1".to_string()
            })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(station("VK7NTK", 0).to_string(), "VK7NTK");
        assert_eq!(station("VK7NTK", 2).to_string(), "VK7NTK-2");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates() {
        let s: CallSignSSID = serde_json::from_str(r#"{"callsign":"ku0l","ssid":9}"#).unwrap();
        assert_eq!(s, station("KU0L", 9));

        assert!(serde_json::from_str::<CallSignSSID>(r#"{"callsign":"KU0L","ssid":16}"#).is_err());
        assert!(serde_json::from_str::<CallSignSSID>(r#"{"callsign":"KU0L!","ssid":1}"#).is_err());
    }
}
