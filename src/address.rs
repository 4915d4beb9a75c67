use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{debug, trace};

use crate::callsign::{CallSignSSID, FIELD_LEN};
use crate::error::{FrameError, Result};

/// The "C" bit on destination and source, the "H" (has been repeated) bit on a digipeater.
const FLAG_BIT: u8 = 0b1000_0000;
/// Set on the final entry of the address chain.
const EXTENSION_BIT: u8 = 0b0000_0001;
/// Reserved bits of the SSID octet, transmitted as 1.
const RESERVED_BITS: u8 = 0b0110_0000;

/// Whether a frame is a command or a response, as signalled by the C bits of the
/// destination and source address fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum CommandResponse {
    Command,
    Response,
}

impl CommandResponse {
    /// Interpret the destination and source C bits.
    ///
    /// AX.25 2.0 stations set exactly one of the two bits. Earlier stations set both
    /// for a command and neither for a response. All four combinations are accepted.
    pub fn from_flag_bits(destination: bool, source: bool) -> CommandResponse {
        match (destination, source) {
            (true, true) | (true, false) => CommandResponse::Command,
            (false, false) | (false, true) => CommandResponse::Response,
        }
    }

    /// The (destination, source) C bits a 2.0 station transmits.
    pub fn flag_bits(self) -> (bool, bool) {
        match self {
            CommandResponse::Command => (true, false),
            CommandResponse::Response => (false, true),
        }
    }
}

/// One 7-octet entry in the address chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AddressField {
    station: CallSignSSID,
    flag_bit: bool,
    continuation_bit: bool,
}

impl AddressField {
    pub fn new(station: CallSignSSID, flag_bit: bool, continuation_bit: bool) -> AddressField {
        AddressField {
            station,
            flag_bit,
            continuation_bit,
        }
    }

    pub fn station(&self) -> &CallSignSSID {
        &self.station
    }

    /// C bit for the destination and source, H bit for a digipeater.
    pub fn flag_bit(&self) -> bool {
        self.flag_bit
    }

    /// True when this is the last entry of its chain.
    pub fn continuation_bit(&self) -> bool {
        self.continuation_bit
    }

    pub fn decode(bytes: &[u8]) -> Result<AddressField> {
        let octets: [u8; FIELD_LEN] = bytes
            .try_into()
            .map_err(|_| FrameError::WrongFieldLength { len: bytes.len() })?;
        let last = octets[FIELD_LEN - 1];
        let mut masked = octets;
        masked[FIELD_LEN - 1] &= !(FLAG_BIT | EXTENSION_BIT);
        Ok(AddressField {
            station: CallSignSSID::decode_field(&masked)?,
            flag_bit: last & FLAG_BIT != 0,
            continuation_bit: last & EXTENSION_BIT != 0,
        })
    }

    pub fn encode(&self) -> [u8; FIELD_LEN] {
        let mut encoded = self.station.encode_field();
        encoded[FIELD_LEN - 1] |= RESERVED_BITS;
        if self.flag_bit {
            encoded[FIELD_LEN - 1] |= FLAG_BIT;
        }
        if self.continuation_bit {
            encoded[FIELD_LEN - 1] |= EXTENSION_BIT;
        }
        encoded
    }
}

/// The address chain: destination, source and any digipeaters in path order.
///
/// There are always at least two entries and only the last one has its
/// continuation bit set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AddressChain {
    fields: Vec<AddressField>,
}

impl AddressChain {
    /// Build a chain with the C bits a 2.0 station uses for `command_response`.
    /// None of the digipeaters are marked as having repeated the frame yet.
    pub fn new(
        destination: CallSignSSID,
        source: CallSignSSID,
        digipeaters: Vec<CallSignSSID>,
        command_response: CommandResponse,
    ) -> AddressChain {
        let (dest_c_bit, src_c_bit) = command_response.flag_bits();
        let mut fields = Vec::with_capacity(2 + digipeaters.len());
        fields.push(AddressField::new(destination, dest_c_bit, false));
        fields.push(AddressField::new(source, src_c_bit, false));
        fields.extend(
            digipeaters
                .into_iter()
                .map(|repeater| AddressField::new(repeater, false, false)),
        );
        AddressChain::normalized(fields)
    }

    /// Build a chain from explicit entries. Continuation bits are overwritten so that
    /// only the last entry carries one.
    pub fn from_fields(fields: Vec<AddressField>) -> Result<AddressChain> {
        if fields.len() < 2 {
            return Err(FrameError::AddressChainTooShort {
                entries: fields.len(),
            });
        }
        Ok(AddressChain::normalized(fields))
    }

    fn normalized(mut fields: Vec<AddressField>) -> AddressChain {
        let last = fields.len() - 1;
        for (i, field) in fields.iter_mut().enumerate() {
            field.continuation_bit = i == last;
        }
        AddressChain { fields }
    }

    /// Decode the address chain at the start of `bytes`.
    ///
    /// Returns the chain and the number of octets it occupied, which is where the
    /// control field begins.
    pub fn decode(bytes: &[u8]) -> Result<(AddressChain, usize)> {
        let mut fields = Vec::new();
        let mut offset = 0;
        loop {
            let remaining = bytes.len() - offset;
            if remaining < FIELD_LEN {
                debug!(offset, remaining, "address chain truncated");
                return Err(FrameError::TruncatedAddressChain { offset, remaining });
            }
            let field = AddressField::decode(&bytes[offset..offset + FIELD_LEN])?;
            offset += FIELD_LEN;
            let last = field.continuation_bit;
            fields.push(field);
            if last {
                break;
            }
        }
        if fields.len() < 2 {
            debug!(entries = fields.len(), "address chain too short");
            return Err(FrameError::AddressChainTooShort {
                entries: fields.len(),
            });
        }
        trace!(entries = fields.len(), "decoded address chain");
        Ok((AddressChain { fields }, offset))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(self.fields.len() * FIELD_LEN);
        self.encode_into(&mut encoded);
        encoded
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        let last = self.fields.len() - 1;
        for (i, field) in self.fields.iter().enumerate() {
            let mut octets = field.encode();
            // The extension bit is dictated by position, whatever the entry says
            if i == last {
                octets[FIELD_LEN - 1] |= EXTENSION_BIT;
            } else {
                octets[FIELD_LEN - 1] &= !EXTENSION_BIT;
            }
            out.extend_from_slice(&octets);
        }
    }

    pub fn fields(&self) -> &[AddressField] {
        &self.fields
    }

    pub fn destination(&self) -> &CallSignSSID {
        &self.fields[0].station
    }

    pub fn source(&self) -> &CallSignSSID {
        &self.fields[1].station
    }

    /// The digipeater entries in path order.
    pub fn digipeater_fields(&self) -> &[AddressField] {
        &self.fields[2..]
    }

    pub fn digipeaters(&self) -> impl Iterator<Item = &CallSignSSID> {
        self.digipeater_fields().iter().map(|f| &f.station)
    }

    /// The digipeaters whose H bit is set, in path order.
    pub fn repeated_by(&self) -> impl Iterator<Item = &CallSignSSID> {
        self.digipeater_fields()
            .iter()
            .filter(|f| f.flag_bit)
            .map(|f| &f.station)
    }

    pub fn command_response(&self) -> CommandResponse {
        CommandResponse::from_flag_bits(self.fields[0].flag_bit, self.fields[1].flag_bit)
    }

    /// A copy of this chain with the H bit set on the digipeater at `index`,
    /// or `None` if there is no such digipeater.
    pub fn mark_repeated(&self, index: usize) -> Option<AddressChain> {
        let mut chain = self.clone();
        chain.fields.get_mut(2 + index)?.flag_bit = true;
        Some(chain)
    }
}

/// Formats as `SOURCE>DEST,DIGI1*,DIGI2` where `*` marks digipeaters that have repeated the frame.
impl fmt::Display for AddressChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source(), self.destination())?;
        for field in self.digipeater_fields() {
            let mark = if field.flag_bit { "*" } else { "" };
            write!(f, ",{}{}", field.station, mark)?;
        }
        Ok(())
    }
}
