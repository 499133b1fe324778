//! Codec Round-Trip Tests
//!
//! Exercises every protocol descriptor through the public codec and framer:
//! boundary values, seeded random commands, arbitrary byte input, and the
//! frame-size invariants of batch encoding.

use haptic_render::protocol::{
    decode_batch, encode_batch, CodecError, CommandCodec, CommandField, ProtocolVariant,
};
use haptic_render::{CommandKind, LogicalCommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const VARIANTS: [ProtocolVariant; 3] = [
    ProtocolVariant::Canonical5,
    ProtocolVariant::LegacyGrouped4,
    ProtocolVariant::LegacyMarker3,
];

/// A random command that is valid for `codec`'s descriptor.
fn random_command(rng: &mut StdRng, codec: &CommandCodec) -> LogicalCommand {
    let d = codec.descriptor();
    let field = |rng: &mut StdRng, max: u32| -> u32 { rng.gen_range(0..=max) };

    let address = field(rng, d.address_max()) as u8;
    let duty = field(rng, d.duty_max()) as u8;
    let freq_index = field(rng, d.freq_index_max()) as u8;
    let delay_ms = d.delay_max().map_or(0, |max| field(rng, max));
    let flags = d.flags_max().map_or(0, |max| field(rng, max) as u8);
    let kind = if rng.gen_bool(0.5) {
        CommandKind::Start
    } else {
        CommandKind::Stop
    };

    LogicalCommand {
        address,
        kind,
        duty,
        freq_index,
        delay_ms,
        flags,
    }
}

#[test]
fn test_boundary_values_round_trip() {
    for variant in VARIANTS {
        let codec = CommandCodec::new(variant);
        let d = codec.descriptor();

        let zero = LogicalCommand::stop(0, 0);
        let max = LogicalCommand {
            address: d.address_max() as u8,
            kind: CommandKind::Start,
            duty: d.duty_max() as u8,
            freq_index: d.freq_index_max() as u8,
            delay_ms: d.delay_max().unwrap_or(0),
            flags: d.flags_max().unwrap_or(0) as u8,
        };

        for cmd in [zero, max] {
            let bytes = codec.encode(&cmd).unwrap();
            assert_eq!(bytes.len(), codec.command_width(), "{variant}");
            assert_eq!(codec.decode(&bytes).unwrap(), cmd, "{variant}");
        }
    }
}

#[test]
fn test_canonical_extremes_are_all_zero_and_all_one_bits() {
    let codec = CommandCodec::new(ProtocolVariant::Canonical5);
    let max = LogicalCommand::start(127, 127, 31, 65_535).with_flags(15);
    assert_eq!(codec.encode(&max).unwrap(), vec![0xFF; 5]);
    assert_eq!(codec.encode(&LogicalCommand::stop(0, 0)).unwrap(), vec![0x00; 5]);
}

#[test]
fn test_random_commands_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5EED_CAFE);
    for variant in VARIANTS {
        let codec = CommandCodec::new(variant);
        for _ in 0..1500 {
            let cmd = random_command(&mut rng, &codec);
            let bytes = codec.encode(&cmd).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), cmd, "{variant}: {cmd:?}");
        }
    }
}

#[test]
fn test_accepted_bytes_re_encode_identically() {
    // Flip one bit of a valid encoding: data bits stay decodable, marker bits
    // and oversized sub-addresses must be rejected.
    let mut rng = StdRng::seed_from_u64(42);
    for variant in VARIANTS {
        let codec = CommandCodec::new(variant);
        let bits = codec.command_width() * 8;
        let (mut accepted, mut rejected) = (0, 0);
        for _ in 0..2000 {
            let mut bytes = codec.encode(&random_command(&mut rng, &codec)).unwrap();
            let bit = rng.gen_range(0..bits);
            bytes[bit / 8] ^= 0x80 >> (bit % 8);
            match codec.decode(&bytes) {
                Ok(cmd) => {
                    accepted += 1;
                    assert_eq!(codec.encode(&cmd).unwrap(), bytes, "{variant}");
                }
                Err(_) => rejected += 1,
            }
        }
        assert!(accepted > 0, "{variant} accepted no mutated input");
        if variant != ProtocolVariant::Canonical5 {
            assert!(rejected > 0, "{variant} accepted corrupted marker bits");
        }
    }
}

#[test]
fn test_every_canonical_byte_pattern_decodes() {
    let codec = CommandCodec::new(ProtocolVariant::Canonical5);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
        let bytes: [u8; 5] = rng.gen();
        let cmd = codec.decode(&bytes).unwrap();
        assert_eq!(codec.encode(&cmd).unwrap(), bytes);
    }
}

#[test]
fn test_out_of_range_fields_are_named() {
    let codec = CommandCodec::new(ProtocolVariant::Canonical5);

    let err = codec.encode(&LogicalCommand::start(128, 0, 0, 0)).unwrap_err();
    assert_eq!(
        err,
        CodecError::FieldOutOfRange {
            field: CommandField::Address,
            value: 128,
            max: 127
        }
    );

    let err = codec.encode(&LogicalCommand::start(0, 0, 32, 0)).unwrap_err();
    assert!(matches!(
        err,
        CodecError::FieldOutOfRange {
            field: CommandField::FreqIndex,
            max: 31,
            ..
        }
    ));

    let err = codec
        .encode(&LogicalCommand::start(0, 0, 0, 65_536))
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::FieldOutOfRange {
            field: CommandField::Delay,
            ..
        }
    ));
}

#[test]
fn test_legacy_rejects_delay_and_flags() {
    for variant in [ProtocolVariant::LegacyGrouped4, ProtocolVariant::LegacyMarker3] {
        let codec = CommandCodec::new(variant);
        let delayed = codec.encode(&LogicalCommand::start(1, 1, 1, 10));
        assert!(matches!(
            delayed,
            Err(CodecError::UnsupportedField {
                field: CommandField::Delay,
                ..
            })
        ));
        let flagged = codec.encode(&LogicalCommand::stop(1, 0).with_flags(2));
        assert!(matches!(
            flagged,
            Err(CodecError::UnsupportedField {
                field: CommandField::Flags,
                ..
            })
        ));
    }
}

#[test]
fn test_wrong_length_input() {
    let codec = CommandCodec::new(ProtocolVariant::Canonical5);
    assert_eq!(
        codec.decode(&[0; 4]).unwrap_err(),
        CodecError::InvalidLength {
            expected: 5,
            actual: 4
        }
    );
}

#[test]
fn test_batch_never_splits_commands() {
    let mut rng = StdRng::seed_from_u64(99);
    for variant in VARIANTS {
        let codec = CommandCodec::new(variant);
        let width = codec.command_width();
        for _ in 0..50 {
            let count = rng.gen_range(1..300);
            let max_frame_bytes = rng.gen_range(width..=260);
            let commands: Vec<LogicalCommand> =
                (0..count).map(|_| random_command(&mut rng, &codec)).collect();

            let frames = encode_batch(&codec, &commands, max_frame_bytes).unwrap();
            let total: usize = frames.iter().map(|f| f.len()).sum();
            assert_eq!(total, commands.len() * width);
            for frame in &frames {
                assert!(!frame.is_empty());
                assert!(frame.len() <= max_frame_bytes);
                assert_eq!(frame.len() % width, 0);
            }

            let decoded: Vec<LogicalCommand> = frames
                .iter()
                .flat_map(|f| decode_batch(&codec, f.as_bytes()).unwrap())
                .collect();
            assert_eq!(decoded, commands);
        }
    }
}

#[test]
fn test_batch_errors() {
    let codec = CommandCodec::new(ProtocolVariant::Canonical5);
    assert_eq!(encode_batch(&codec, &[], 250).unwrap_err(), CodecError::EmptyBatch);
    assert_eq!(
        encode_batch(&codec, &[LogicalCommand::stop(0, 0)], 4).unwrap_err(),
        CodecError::FrameTooSmall {
            max_frame_bytes: 4,
            command_width: 5
        }
    );

    let commands = [LogicalCommand::stop(0, 0), LogicalCommand::start(200, 0, 0, 0)];
    match encode_batch(&codec, &commands, 250).unwrap_err() {
        CodecError::InBatch { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(
                *source,
                CodecError::FieldOutOfRange {
                    field: CommandField::Address,
                    ..
                }
            ));
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(
        decode_batch(&codec, &[0; 7]).unwrap_err(),
        CodecError::MisalignedFrame {
            len: 7,
            command_width: 5
        }
    );
}
