use crate::control::Modulo;

/// Errors that can occur when building a `CallSignSSID` from a callsign and SSID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallSignError {
    #[error("SSID {ssid} is out of range, it must be from 0 to 15")]
    SsidOutOfRange { ssid: u8 },

    #[error("SSID '{input}' is not a number from 0 to 15")]
    InvalidSsid { input: String },

    #[error("callsign must contain at least one character")]
    Empty,

    #[error("callsign '{callsign}' is longer than 6 characters")]
    TooLong { callsign: String },

    #[error("callsign '{callsign}' may only contain the letters A-Z and digits 0-9")]
    InvalidCharacters { callsign: String },
}

/// Errors that can occur when decoding or encoding an AX.25 frame.
///
/// The first problem detected is reported and no partial frame is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A callsign on the wire did not form a valid `CallSignSSID`.
    #[error(transparent)]
    CallSign(#[from] CallSignError),

    #[error("address field must be exactly 7 octets, got {len}")]
    WrongFieldLength { len: usize },

    #[error("address chain ended after {remaining} octets at offset {offset} without a final entry")]
    TruncatedAddressChain { offset: usize, remaining: usize },

    #[error("address chain has {entries} entries, at least a destination and source are required")]
    AddressChainTooShort { entries: usize },

    #[error("control field needs {expected} octets but only {actual} remain")]
    ShortControlField { expected: usize, actual: usize },

    #[error("unknown supervisory function bits {bits:#04b}")]
    UnknownFunction { bits: u8 },

    #[error("unknown unnumbered control octet {control:#04x}")]
    UnknownModifier { control: u8 },

    #[error("frame is missing its protocol identifier octet")]
    MissingProtocolId,

    #[error("only I and UI frames carry a protocol identifier")]
    UnexpectedProtocolId,

    #[error("FRMR information field must be exactly 3 octets, got {len}")]
    InvalidFrmrLength { len: usize },

    #[error("{len} unexpected octets follow a frame that carries no information field")]
    UnexpectedTrailingData { len: usize },

    #[error("frame of {len} octets is shorter than the 15 octet minimum")]
    FrameTooShort { len: usize },

    #[error("sequence number {value} does not fit in {modulo}")]
    SequenceNumberOutOfRange { value: u8, modulo: Modulo },
}

/// A modulo setting string that is neither 8 nor 128.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{input}' is not a valid modulo, expected 8 or 128")]
pub struct ModuloParseError {
    pub input: String,
}

pub type Result<T, E = FrameError> = std::result::Result<T, E>;
