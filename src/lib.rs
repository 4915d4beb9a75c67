//! Encoding and decoding of AX.25 link-layer frames.
//!
//! This crate turns the octets of one AX.25 frame into strongly typed structures and back:
//! * The address chain: destination, source and the digipeater path, with the C and H bits
//! * The control field of I, S and U frames, under modulo 8 or modulo 128 sequence numbering
//! * The protocol identifier and information field, checked against what each kind of frame allows
//!
//! Input is expected to be a single frame with HDLC flags, bit stuffing and the FCS already
//! removed, as handed over by a TNC or KISS interface. Nothing here keeps state between frames.
//!
//! ```
//! use ax25_codec::{Frame, FrameKind, Modulo, UnnumberedModifier};
//!
//! let bytes = [
//!     0xae, 0x6e, 0x98, 0xa8, 0x40, 0x40, 0xf4,
//!     0x96, 0x62, 0x86, 0x90, 0x9c, 0x40, 0x61,
//!     0x3f,
//! ];
//! let frame = Frame::decode(&bytes, Modulo::Mod8)?;
//! assert_eq!(frame.addresses().source().to_string(), "K1CHN");
//! assert!(matches!(
//!     frame.kind(),
//!     FrameKind::Unnumbered { modifier: UnnumberedModifier::Sabm, poll_final: true }
//! ));
//! assert_eq!(frame.encode(Modulo::Mod8)?, bytes);
//! # Ok::<(), ax25_codec::FrameError>(())
//! ```

/// Station identities and their 7-octet wire form.
pub mod callsign;

/// Address fields and the address chain.
pub mod address;

/// The control field of I, S and U frames.
pub mod control;

/// Whole frames and their information fields.
pub mod frame;

/// Error types for station identities and frames.
pub mod error;

pub use address::{AddressChain, AddressField, CommandResponse};
pub use callsign::CallSignSSID;
pub use control::{FrameKind, Modulo, SupervisoryFunction, UnnumberedModifier};
pub use error::{CallSignError, FrameError, ModuloParseError};
pub use frame::{Frame, FrameReject, Payload, ProtocolIdentifier};
