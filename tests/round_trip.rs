use ax25_codec::frame::MIN_FRAME_LEN;
use ax25_codec::{
    AddressChain, AddressField, CallSignSSID, Frame, FrameKind, Modulo, Payload,
    ProtocolIdentifier, SupervisoryFunction, UnnumberedModifier,
};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::select;
use strum::IntoEnumIterator;

fn station() -> impl Strategy<Value = CallSignSSID> {
    ("[A-Z0-9]{1,6}", 0u8..=15)
        .prop_map(|(callsign, ssid)| CallSignSSID::create(&callsign, ssid).unwrap())
}

fn address_chain() -> impl Strategy<Value = AddressChain> {
    (
        station(),
        any::<bool>(),
        station(),
        any::<bool>(),
        vec((station(), any::<bool>()), 0..8),
    )
        .prop_map(|(dest, dest_c_bit, src, src_c_bit, route)| {
            let mut fields = vec![
                AddressField::new(dest, dest_c_bit, false),
                AddressField::new(src, src_c_bit, false),
            ];
            fields.extend(
                route
                    .into_iter()
                    .map(|(repeater, has_repeated)| AddressField::new(repeater, has_repeated, false)),
            );
            AddressChain::from_fields(fields).unwrap()
        })
}

fn frame_kind(modulo: Modulo) -> impl Strategy<Value = FrameKind> {
    let max = modulo.max_sequence();
    prop_oneof![
        (0..=max, 0..=max, any::<bool>()).prop_map(|(send_seq, recv_seq, poll_final)| {
            FrameKind::Information {
                send_seq,
                recv_seq,
                poll_final,
            }
        }),
        (
            select(SupervisoryFunction::iter().collect::<Vec<_>>()),
            0..=max,
            any::<bool>()
        )
            .prop_map(|(function, recv_seq, poll_final)| FrameKind::Supervisory {
                function,
                recv_seq,
                poll_final,
            }),
        (
            select(UnnumberedModifier::iter().collect::<Vec<_>>()),
            any::<bool>()
        )
            .prop_map(|(modifier, poll_final)| FrameKind::Unnumbered {
                modifier,
                poll_final,
            }),
    ]
}

fn payload_for(kind: &FrameKind) -> BoxedStrategy<Payload> {
    match kind {
        FrameKind::Information { .. }
        | FrameKind::Unnumbered {
            modifier: UnnumberedModifier::Ui,
            ..
        } => (any::<u8>(), vec(any::<u8>(), 0..256))
            .prop_map(|(pid, info)| Payload::Information {
                pid: ProtocolIdentifier::from_byte(pid),
                info,
            })
            .boxed(),
        FrameKind::Unnumbered {
            modifier: UnnumberedModifier::Xid | UnnumberedModifier::Test,
            ..
        } => vec(any::<u8>(), 0..256).prop_map(Payload::Raw).boxed(),
        FrameKind::Unnumbered {
            modifier: UnnumberedModifier::Frmr,
            ..
        } => vec(any::<u8>(), 3).prop_map(Payload::Raw).boxed(),
        _ => Just(Payload::Empty).boxed(),
    }
}

fn frame(modulo: Modulo) -> impl Strategy<Value = Frame> {
    (address_chain(), frame_kind(modulo))
        .prop_flat_map(|(chain, kind)| {
            let payload = payload_for(&kind);
            (Just(chain), Just(kind), payload)
        })
        .prop_map(|(chain, kind, payload)| Frame::new(chain, kind, payload).unwrap())
}

fn any_modulo() -> impl Strategy<Value = Modulo> {
    prop_oneof![Just(Modulo::Mod8), Just(Modulo::Mod128)]
}

proptest! {
    #[test]
    fn callsign_field_round_trip(s in station()) {
        prop_assert_eq!(CallSignSSID::decode_field(&s.encode_field()).unwrap(), s);
    }

    #[test]
    fn callsign_text_round_trip(s in station()) {
        prop_assert_eq!(s.to_string().parse::<CallSignSSID>().unwrap(), s);
    }

    #[test]
    fn invalid_callsign_characters_rejected(callsign in "[A-Z0-9]{0,2}[ !#$%&*+,./:;<=>?@_~-][A-Z0-9]{0,2}") {
        prop_assert!(CallSignSSID::create(&callsign, 0).is_err());
    }

    #[test]
    fn mod8_frame_round_trip(f in frame(Modulo::Mod8)) {
        let encoded = f.encode(Modulo::Mod8).unwrap();
        prop_assert!(encoded.len() >= MIN_FRAME_LEN);
        prop_assert_eq!(Frame::decode(&encoded, Modulo::Mod8).unwrap(), f);
    }

    #[test]
    fn mod128_frame_round_trip(f in frame(Modulo::Mod128)) {
        let encoded = f.encode(Modulo::Mod128).unwrap();
        prop_assert!(encoded.len() >= MIN_FRAME_LEN);
        prop_assert_eq!(Frame::decode(&encoded, Modulo::Mod128).unwrap(), f);
    }

    #[test]
    fn decode_is_deterministic(bytes in vec(any::<u8>(), 0..64), modulo in any_modulo()) {
        prop_assert_eq!(Frame::decode(&bytes, modulo), Frame::decode(&bytes, modulo));
    }

    #[test]
    fn decoded_frames_reencode_to_the_same_length(bytes in vec(any::<u8>(), 15..64), modulo in any_modulo()) {
        if let Ok(f) = Frame::decode(&bytes, modulo) {
            let encoded = f.encode(modulo).unwrap();
            prop_assert_eq!(encoded.len(), bytes.len());
            prop_assert_eq!(Frame::decode(&encoded, modulo).unwrap(), f);
        }
    }
}
