use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{debug, trace};

use crate::address::{AddressChain, CommandResponse};
use crate::callsign::FIELD_LEN;
use crate::control::{check_sequence, FrameKind, Modulo, UnnumberedModifier};
use crate::error::{FrameError, Result};

/// Two address fields and a control octet.
pub const MIN_FRAME_LEN: usize = 2 * FIELD_LEN + 1;

const FRMR_INFO_LEN: usize = 3;

// Mostly from AX.25 2.2, which lists far more values than 2.0
/// The layer 3 protocol carried in the information field of an I or UI frame.
///
/// The octet seen on the wire is always recoverable with `to_byte`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ProtocolIdentifier {
    /// AX.25 layer 3 implemented, `yy01yyyy` or `yy10yyyy`
    Layer3Impl(u8),
    X25Plp,
    CompressedTcpIp,
    UncompressedTcpIp,
    SegmentationFragment,
    TexnetDatagram,
    LinkQuality,
    Appletalk,
    AppletalkArp,
    ArpaIp,
    ArpaAddress,
    Flexnet,
    NetRom,
    /// No layer 3 protocol
    None,
    Escape,
    Unknown(u8),
}

impl ProtocolIdentifier {
    pub fn from_byte(byte: u8) -> ProtocolIdentifier {
        match byte {
            pid if pid & 0b0011_0000 == 0b0001_0000 || pid & 0b0011_0000 == 0b0010_0000 => {
                ProtocolIdentifier::Layer3Impl(pid)
            }
            0x01 => ProtocolIdentifier::X25Plp,
            0x06 => ProtocolIdentifier::CompressedTcpIp,
            0x07 => ProtocolIdentifier::UncompressedTcpIp,
            0x08 => ProtocolIdentifier::SegmentationFragment,
            0xC3 => ProtocolIdentifier::TexnetDatagram,
            0xC4 => ProtocolIdentifier::LinkQuality,
            0xCA => ProtocolIdentifier::Appletalk,
            0xCB => ProtocolIdentifier::AppletalkArp,
            0xCC => ProtocolIdentifier::ArpaIp,
            0xCD => ProtocolIdentifier::ArpaAddress,
            0xCE => ProtocolIdentifier::Flexnet,
            0xCF => ProtocolIdentifier::NetRom,
            0xF0 => ProtocolIdentifier::None,
            0xFF => ProtocolIdentifier::Escape,
            pid => ProtocolIdentifier::Unknown(pid),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ProtocolIdentifier::Layer3Impl(pid) => pid,
            ProtocolIdentifier::X25Plp => 0x01,
            ProtocolIdentifier::CompressedTcpIp => 0x06,
            ProtocolIdentifier::UncompressedTcpIp => 0x07,
            ProtocolIdentifier::SegmentationFragment => 0x08,
            ProtocolIdentifier::TexnetDatagram => 0xC3,
            ProtocolIdentifier::LinkQuality => 0xC4,
            ProtocolIdentifier::Appletalk => 0xCA,
            ProtocolIdentifier::AppletalkArp => 0xCB,
            ProtocolIdentifier::ArpaIp => 0xCC,
            ProtocolIdentifier::ArpaAddress => 0xCD,
            ProtocolIdentifier::Flexnet => 0xCE,
            ProtocolIdentifier::NetRom => 0xCF,
            ProtocolIdentifier::None => 0xF0,
            ProtocolIdentifier::Escape => 0xFF,
            ProtocolIdentifier::Unknown(pid) => pid,
        }
    }
}

/// Whatever follows the control field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Payload {
    /// Nothing follows the control field.
    Empty,
    /// Protocol identifier then information, for I and UI frames. `info` may be empty.
    Information {
        pid: ProtocolIdentifier,
        info: Vec<u8>,
    },
    /// Information without a protocol identifier, for XID, TEST and FRMR frames.
    Raw(Vec<u8>),
}

impl Payload {
    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Payload::Empty => {}
            Payload::Information { pid, info } => {
                out.push(pid.to_byte());
                out.extend_from_slice(info);
            }
            Payload::Raw(info) => out.extend_from_slice(info),
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Information { info, .. } => 1 + info.len(),
            Payload::Raw(info) => info.len(),
        }
    }
}

/// What may follow the control field of a given kind of frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadRule {
    ProtocolIdAndInfo,
    RawInfo,
    FrameRejectInfo,
    Nothing,
}

impl PayloadRule {
    fn for_kind(kind: &FrameKind) -> PayloadRule {
        match kind {
            FrameKind::Information { .. } => PayloadRule::ProtocolIdAndInfo,
            FrameKind::Supervisory { .. } => PayloadRule::Nothing,
            FrameKind::Unnumbered { modifier, .. } => match modifier {
                UnnumberedModifier::Ui => PayloadRule::ProtocolIdAndInfo,
                UnnumberedModifier::Xid | UnnumberedModifier::Test => PayloadRule::RawInfo,
                UnnumberedModifier::Frmr => PayloadRule::FrameRejectInfo,
                UnnumberedModifier::Sabm
                | UnnumberedModifier::Sabme
                | UnnumberedModifier::Disc
                | UnnumberedModifier::Dm
                | UnnumberedModifier::Ua => PayloadRule::Nothing,
            },
        }
    }

    /// Split the octets after the control field.
    fn decode(self, bytes: &[u8]) -> Result<Payload> {
        match self {
            PayloadRule::ProtocolIdAndInfo => match bytes.split_first() {
                Some((&pid, info)) => Ok(Payload::Information {
                    pid: ProtocolIdentifier::from_byte(pid),
                    info: info.to_vec(),
                }),
                None => {
                    debug!("missing protocol identifier");
                    Err(FrameError::MissingProtocolId)
                }
            },
            PayloadRule::RawInfo => Ok(Payload::Raw(bytes.to_vec())),
            PayloadRule::FrameRejectInfo => {
                if bytes.len() != FRMR_INFO_LEN {
                    debug!(len = bytes.len(), "wrong size for FRMR info");
                    return Err(FrameError::InvalidFrmrLength { len: bytes.len() });
                }
                Ok(Payload::Raw(bytes.to_vec()))
            }
            PayloadRule::Nothing => {
                if !bytes.is_empty() {
                    debug!(len = bytes.len(), "trailing data after control field");
                    return Err(FrameError::UnexpectedTrailingData { len: bytes.len() });
                }
                Ok(Payload::Empty)
            }
        }
    }

    /// Check a caller-supplied payload, returning it in the form `decode` would produce.
    fn accept(self, payload: Payload) -> Result<Payload> {
        match (self, payload) {
            (PayloadRule::ProtocolIdAndInfo, payload @ Payload::Information { .. }) => Ok(payload),
            (PayloadRule::ProtocolIdAndInfo, _) => Err(FrameError::MissingProtocolId),

            (_, Payload::Information { .. }) => Err(FrameError::UnexpectedProtocolId),

            (PayloadRule::RawInfo, Payload::Empty) => Ok(Payload::Raw(Vec::new())),
            (PayloadRule::RawInfo, payload) => Ok(payload),

            (PayloadRule::FrameRejectInfo, payload) => match payload.encoded_len() {
                FRMR_INFO_LEN => Ok(payload),
                len => Err(FrameError::InvalidFrmrLength { len }),
            },

            (PayloadRule::Nothing, payload) => match payload.encoded_len() {
                0 => Ok(Payload::Empty),
                len => Err(FrameError::UnexpectedTrailingData { len }),
            },
        }
    }
}

/// The information field of a modulo 8 FRMR frame, with fields named as in AX.25 2.2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FrameReject {
    /// A raw copy of the control field in the frame that was rejected
    pub rejected_control: u8,
    /// V(S) of the station sending the FRMR
    pub send_state: u8,
    /// V(R) of the station sending the FRMR
    pub receive_state: u8,
    /// Whether the rejected frame was a command or a response
    pub command_response: CommandResponse,
    /// The received control field was invalid or not implemented.
    pub w: bool,
    /// A U or S frame was received that contained an information field.
    pub x: bool,
    /// The information field of a received frame exceeded the maximum allowable length.
    pub y: bool,
    /// The attached control field contained an invalid Receive Sequence Number
    pub z: bool,
}

impl FrameReject {
    pub fn from_info(info: &[u8]) -> Result<FrameReject> {
        let info: [u8; FRMR_INFO_LEN] = info
            .try_into()
            .map_err(|_| FrameError::InvalidFrmrLength { len: info.len() })?;
        Ok(FrameReject {
            rejected_control: info[0],
            send_state: (info[1] & 0b0000_1110) >> 1,
            command_response: match info[1] & 0b0001_0000 > 0 {
                true => CommandResponse::Response,
                false => CommandResponse::Command,
            },
            receive_state: (info[1] & 0b1110_0000) >> 5,
            w: info[2] & 0b0000_0001 > 0,
            x: info[2] & 0b0000_0010 > 0,
            y: info[2] & 0b0000_0100 > 0,
            z: info[2] & 0b0000_1000 > 0,
        })
    }

    pub fn to_info(&self) -> Result<[u8; FRMR_INFO_LEN]> {
        let send_state = check_sequence(self.send_state, Modulo::Mod8)?;
        let receive_state = check_sequence(self.receive_state, Modulo::Mod8)?;

        let mut states: u8 = 0;
        states |= receive_state << 5;
        states |= if self.command_response == CommandResponse::Response { 1 << 4 } else { 0 };
        states |= send_state << 1;

        let mut flags: u8 = 0;
        flags |= if self.z { 1 << 3 } else { 0 };
        flags |= if self.y { 1 << 2 } else { 0 };
        flags |= if self.x { 1 << 1 } else { 0 };
        flags |= if self.w { 1 << 0 } else { 0 };

        Ok([self.rejected_control, states, flags])
    }
}

/// A complete AX.25 frame, without HDLC flags or FCS.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Frame {
    addresses: AddressChain,
    kind: FrameKind,
    payload: Payload,
}

impl Frame {
    /// Assemble a frame, checking that `payload` is allowed for `kind`.
    ///
    /// An empty `Payload::Raw` and `Payload::Empty` are interchangeable and are
    /// stored however decoding the same octets would produce them.
    pub fn new(addresses: AddressChain, kind: FrameKind, payload: Payload) -> Result<Frame> {
        let payload = PayloadRule::for_kind(&kind).accept(payload)?;
        Ok(Frame {
            addresses,
            kind,
            payload,
        })
    }

    /// Decode one frame. `modulo` is the sequence numbering agreed for the link.
    pub fn decode(bytes: &[u8], modulo: Modulo) -> Result<Frame> {
        trace!(len = bytes.len(), %modulo, "decoding frame");
        if bytes.len() < MIN_FRAME_LEN {
            debug!(len = bytes.len(), "frame too short");
            return Err(FrameError::FrameTooShort { len: bytes.len() });
        }
        let (addresses, control) = AddressChain::decode(bytes)?;
        let (kind, control_len) = FrameKind::decode(&bytes[control..], modulo)?;
        let payload = PayloadRule::for_kind(&kind).decode(&bytes[control + control_len..])?;
        Ok(Frame {
            addresses,
            kind,
            payload,
        })
    }

    pub fn encode(&self, modulo: Modulo) -> Result<Vec<u8>> {
        trace!(%modulo, kind = %self.kind, "encoding frame");
        let mut encoded = Vec::with_capacity(
            self.addresses.fields().len() * FIELD_LEN
                + self.kind.control_len(modulo)
                + self.payload.encoded_len(),
        );
        self.addresses.encode_into(&mut encoded);
        self.kind.encode_into(modulo, &mut encoded)?;
        self.payload.encode_into(&mut encoded);
        Ok(encoded)
    }

    pub fn addresses(&self) -> &AddressChain {
        &self.addresses
    }

    pub fn kind(&self) -> &FrameKind {
        &self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_parts(self) -> (AddressChain, FrameKind, Payload) {
        (self.addresses, self.kind, self.payload)
    }

    /// The protocol identifier of an I or UI frame.
    pub fn pid(&self) -> Option<ProtocolIdentifier> {
        match self.payload {
            Payload::Information { pid, .. } => Some(pid),
            _ => None,
        }
    }

    /// The information field, if this kind of frame has one.
    pub fn info(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Information { info, .. } | Payload::Raw(info) => Some(info.as_slice()),
            Payload::Empty => None,
        }
    }

    /// Returns a UTF-8 string that is a "best effort" at displaying the information
    /// content of this frame. Returns None if there is no information field present.
    /// Most applications will need to work with `info()` directly.
    pub fn info_string_lossy(&self) -> Option<String> {
        self.info()
            .map(|info| String::from_utf8_lossy(info).into_owned())
    }

    /// The decoded information field of a FRMR frame.
    pub fn frame_reject(&self) -> Option<FrameReject> {
        match (&self.kind, &self.payload) {
            (
                FrameKind::Unnumbered {
                    modifier: UnnumberedModifier::Frmr,
                    ..
                },
                Payload::Raw(info),
            ) => FrameReject::from_info(info).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.addresses, self.kind)?;
        if let Payload::Information { info, .. } = &self.payload {
            write!(f, " \"{}\"", String::from_utf8_lossy(info))?;
        }
        Ok(())
    }
}
