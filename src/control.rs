use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::debug;

use crate::error::{FrameError, ModuloParseError, Result};

const POLL_FINAL_8: u8 = 0b0001_0000;
const POLL_FINAL_128: u16 = 0b0000_0001_0000_0000;
const FORMAT_MASK: u8 = 0b0000_0011;
const SUPERVISORY: u8 = 0b0000_0001;
const UNNUMBERED: u8 = 0b0000_0011;
/// Everything in a U control octet except the P/F bit and the format bits.
const MODIFIER_MASK: u8 = !(POLL_FINAL_8 | FORMAT_MASK);

/// Sequence numbering in use on a link. This is agreed out of band and has to be
/// supplied to decode and encode I and S frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modulo {
    /// 3-bit sequence numbers, one control octet
    #[default]
    Mod8,
    /// 7-bit sequence numbers, two control octets for I and S frames
    Mod128,
}

impl Modulo {
    /// Largest sequence number that can be carried.
    pub fn max_sequence(self) -> u8 {
        match self {
            Modulo::Mod8 => 7,
            Modulo::Mod128 => 127,
        }
    }

    /// Control field length for I and S frames. U frames always use one octet.
    pub fn numbered_control_len(self) -> usize {
        match self {
            Modulo::Mod8 => 1,
            Modulo::Mod128 => 2,
        }
    }
}

impl fmt::Display for Modulo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modulo::Mod8 => write!(f, "modulo 8"),
            Modulo::Mod128 => write!(f, "modulo 128"),
        }
    }
}

/// Accepts `8`, `128`, `mod8`, `mod128`, `modulo 8` and `modulo 128` in any case.
impl FromStr for Modulo {
    type Err = ModuloParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let number = lower
            .strip_prefix("modulo")
            .or_else(|| lower.strip_prefix("mod"))
            .unwrap_or(&lower)
            .trim();
        match number {
            "8" => Ok(Modulo::Mod8),
            "128" => Ok(Modulo::Mod128),
            _ => Err(ModuloParseError {
                input: s.to_string(),
            }),
        }
    }
}

/// The function of a Supervisory (S) frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[strum(serialize_all = "UPPERCASE")]
pub enum SupervisoryFunction {
    /// Receive Ready
    Rr,
    /// Receive Not Ready
    Rnr,
    /// Reject
    Rej,
    /// Selective Reject
    Srej,
}

impl SupervisoryFunction {
    /// Look up the two function bits (bits 2 and 3 of the control field, shifted down).
    pub fn from_bits(bits: u8) -> Result<SupervisoryFunction> {
        match bits {
            0b00 => Ok(SupervisoryFunction::Rr),
            0b01 => Ok(SupervisoryFunction::Rnr),
            0b10 => Ok(SupervisoryFunction::Rej),
            0b11 => Ok(SupervisoryFunction::Srej),
            bits => Err(FrameError::UnknownFunction { bits }),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            SupervisoryFunction::Rr => 0b00,
            SupervisoryFunction::Rnr => 0b01,
            SupervisoryFunction::Rej => 0b10,
            SupervisoryFunction::Srej => 0b11,
        }
    }
}

/// The command or response carried by an Unnumbered (U) frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[strum(serialize_all = "UPPERCASE")]
pub enum UnnumberedModifier {
    /// Set Asynchronous Balanced Mode
    Sabm,
    /// Set Asynchronous Balanced Mode Extended
    Sabme,
    /// Disconnect
    Disc,
    /// Disconnected Mode
    Dm,
    /// Unnumbered Acknowledge
    Ua,
    /// Frame Reject
    Frmr,
    /// Unnumbered Information
    Ui,
    /// Exchange Identification
    Xid,
    Test,
}

impl UnnumberedModifier {
    /// Look up the modifier bits of a U control octet, with the P/F bit and the
    /// two format bits cleared.
    pub fn from_pattern(pattern: u8) -> Option<UnnumberedModifier> {
        match pattern {
            0b0110_1100 => Some(UnnumberedModifier::Sabme),
            0b0010_1100 => Some(UnnumberedModifier::Sabm),
            0b0100_0000 => Some(UnnumberedModifier::Disc),
            0b0000_1100 => Some(UnnumberedModifier::Dm),
            0b0110_0000 => Some(UnnumberedModifier::Ua),
            0b1000_0100 => Some(UnnumberedModifier::Frmr),
            0b0000_0000 => Some(UnnumberedModifier::Ui),
            0b1010_1100 => Some(UnnumberedModifier::Xid),
            0b1110_0000 => Some(UnnumberedModifier::Test),
            _ => None,
        }
    }

    pub fn pattern(self) -> u8 {
        match self {
            UnnumberedModifier::Sabme => 0b0110_1100,
            UnnumberedModifier::Sabm => 0b0010_1100,
            UnnumberedModifier::Disc => 0b0100_0000,
            UnnumberedModifier::Dm => 0b0000_1100,
            UnnumberedModifier::Ua => 0b0110_0000,
            UnnumberedModifier::Frmr => 0b1000_0100,
            UnnumberedModifier::Ui => 0b0000_0000,
            UnnumberedModifier::Xid => 0b1010_1100,
            UnnumberedModifier::Test => 0b1110_0000,
        }
    }
}

/// What the control field says about a frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FrameKind {
    /// Information (I) frame
    Information {
        send_seq: u8,
        recv_seq: u8,
        poll_final: bool,
    },
    /// Supervisory (S) frame
    Supervisory {
        function: SupervisoryFunction,
        recv_seq: u8,
        poll_final: bool,
    },
    /// Unnumbered (U) frame
    Unnumbered {
        modifier: UnnumberedModifier,
        poll_final: bool,
    },
}

impl FrameKind {
    pub fn poll_final(&self) -> bool {
        match *self {
            FrameKind::Information { poll_final, .. }
            | FrameKind::Supervisory { poll_final, .. }
            | FrameKind::Unnumbered { poll_final, .. } => poll_final,
        }
    }

    /// Number of control octets this kind occupies under `modulo`.
    pub fn control_len(&self, modulo: Modulo) -> usize {
        match self {
            FrameKind::Unnumbered { .. } => 1,
            _ => modulo.numbered_control_len(),
        }
    }

    /// Decode the control field at the start of `bytes`, returning the kind and the
    /// number of octets consumed.
    ///
    /// The frame format is chosen from the first octet alone: a clear low bit is an
    /// I frame whatever the second bit holds.
    pub fn decode(bytes: &[u8], modulo: Modulo) -> Result<(FrameKind, usize)> {
        let first = *bytes.first().ok_or(FrameError::ShortControlField {
            expected: 1,
            actual: 0,
        })?;
        if first & 0b1 == 0 {
            decode_information(bytes, modulo)
        } else if first & FORMAT_MASK == SUPERVISORY {
            decode_supervisory(bytes, modulo)
        } else {
            decode_unnumbered(first).map(|kind| (kind, 1))
        }
    }

    /// Encode the control field, checking that sequence numbers fit in `modulo`.
    pub fn encode(&self, modulo: Modulo) -> Result<Vec<u8>> {
        let mut encoded = Vec::with_capacity(2);
        self.encode_into(modulo, &mut encoded)?;
        Ok(encoded)
    }

    pub(crate) fn encode_into(&self, modulo: Modulo, out: &mut Vec<u8>) -> Result<()> {
        match *self {
            FrameKind::Information {
                send_seq,
                recv_seq,
                poll_final,
            } => {
                let send_seq = check_sequence(send_seq, modulo)?;
                let recv_seq = check_sequence(recv_seq, modulo)?;
                match modulo {
                    Modulo::Mod8 => {
                        let mut c: u8 = 0;
                        c |= recv_seq << 5;
                        c |= if poll_final { POLL_FINAL_8 } else { 0 };
                        c |= send_seq << 1;
                        out.push(c);
                    }
                    Modulo::Mod128 => {
                        let mut c: u16 = 0;
                        c |= u16::from(recv_seq) << 9;
                        c |= if poll_final { POLL_FINAL_128 } else { 0 };
                        c |= u16::from(send_seq) << 1;
                        out.extend_from_slice(&c.to_le_bytes());
                    }
                }
            }
            FrameKind::Supervisory {
                function,
                recv_seq,
                poll_final,
            } => {
                let recv_seq = check_sequence(recv_seq, modulo)?;
                match modulo {
                    Modulo::Mod8 => {
                        let mut c: u8 = SUPERVISORY;
                        c |= function.bits() << 2;
                        c |= if poll_final { POLL_FINAL_8 } else { 0 };
                        c |= recv_seq << 5;
                        out.push(c);
                    }
                    Modulo::Mod128 => {
                        let mut c: u16 = u16::from(SUPERVISORY);
                        c |= u16::from(function.bits()) << 2;
                        c |= if poll_final { POLL_FINAL_128 } else { 0 };
                        c |= u16::from(recv_seq) << 9;
                        out.extend_from_slice(&c.to_le_bytes());
                    }
                }
            }
            FrameKind::Unnumbered {
                modifier,
                poll_final,
            } => {
                let mut c: u8 = modifier.pattern() | UNNUMBERED;
                c |= if poll_final { POLL_FINAL_8 } else { 0 };
                out.push(c);
            }
        }
        Ok(())
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Information {
                send_seq, recv_seq, ..
            } => write!(f, "I N(S)={} N(R)={}", send_seq, recv_seq)?,
            FrameKind::Supervisory {
                function, recv_seq, ..
            } => write!(f, "{} N(R)={}", function, recv_seq)?,
            FrameKind::Unnumbered { modifier, .. } => write!(f, "{}", modifier)?,
        }
        if self.poll_final() {
            write!(f, " P/F")?;
        }
        Ok(())
    }
}

pub(crate) fn check_sequence(value: u8, modulo: Modulo) -> Result<u8> {
    if value > modulo.max_sequence() {
        debug!(value, %modulo, "sequence number out of range");
        return Err(FrameError::SequenceNumberOutOfRange { value, modulo });
    }
    Ok(value)
}

/// Read the control octets of an I or S frame. Under modulo 128 the two octets are
/// combined little-endian, first octet in the low byte.
fn numbered_control(bytes: &[u8], modulo: Modulo) -> Result<u16> {
    let expected = modulo.numbered_control_len();
    if bytes.len() < expected {
        debug!(expected, actual = bytes.len(), "control field too short");
        return Err(FrameError::ShortControlField {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(match modulo {
        Modulo::Mod8 => u16::from(bytes[0]),
        Modulo::Mod128 => u16::from_le_bytes([bytes[0], bytes[1]]),
    })
}

fn decode_information(bytes: &[u8], modulo: Modulo) -> Result<(FrameKind, usize)> {
    let c = numbered_control(bytes, modulo)?;
    let kind = match modulo {
        Modulo::Mod8 => FrameKind::Information {
            recv_seq: ((c & 0b1110_0000) >> 5) as u8,
            send_seq: ((c & 0b0000_1110) >> 1) as u8,
            poll_final: c & u16::from(POLL_FINAL_8) != 0,
        },
        Modulo::Mod128 => FrameKind::Information {
            recv_seq: ((c >> 9) & 0x7f) as u8,
            send_seq: ((c >> 1) & 0x7f) as u8,
            poll_final: c & POLL_FINAL_128 != 0,
        },
    };
    Ok((kind, modulo.numbered_control_len()))
}

fn decode_supervisory(bytes: &[u8], modulo: Modulo) -> Result<(FrameKind, usize)> {
    let c = numbered_control(bytes, modulo)?;
    let function = SupervisoryFunction::from_bits(((c & 0b0000_1100) >> 2) as u8)?;
    let kind = match modulo {
        Modulo::Mod8 => FrameKind::Supervisory {
            function,
            recv_seq: ((c & 0b1110_0000) >> 5) as u8,
            poll_final: c & u16::from(POLL_FINAL_8) != 0,
        },
        // Bits 4-7 are reserved; they are ignored here and sent as 0
        Modulo::Mod128 => FrameKind::Supervisory {
            function,
            recv_seq: ((c >> 9) & 0x7f) as u8,
            poll_final: c & POLL_FINAL_128 != 0,
        },
    };
    Ok((kind, modulo.numbered_control_len()))
}

fn decode_unnumbered(c: u8) -> Result<FrameKind> {
    // Ignore the P/F bit for identifying the command or response
    let modifier = UnnumberedModifier::from_pattern(c & MODIFIER_MASK).ok_or_else(|| {
        debug!(control = c, "unknown U frame modifier");
        FrameError::UnknownModifier { control: c }
    })?;
    Ok(FrameKind::Unnumbered {
        modifier,
        poll_final: c & POLL_FINAL_8 != 0,
    })
}
