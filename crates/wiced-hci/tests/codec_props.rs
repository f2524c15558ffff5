//! Property tests for the frame codec and the firmware chunk walker.

use proptest::prelude::*;
use wiced_hci::{encode, FirmwareImage, Frame, HciError, MAX_PAYLOAD_LIMIT};

proptest! {
    #[test]
    fn frame_survives_the_wire(
        command in any::<u16>(),
        payload in prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LIMIT),
    ) {
        let wire = encode(command, &payload, MAX_PAYLOAD_LIMIT).unwrap();
        prop_assert_eq!(wire.len(), 5 + payload.len());

        let frame = Frame::decode(&wire).unwrap();
        prop_assert_eq!(frame.command, command);
        prop_assert_eq!(frame.group_code(), (command >> 8) as u8);
        prop_assert_eq!(frame.payload, payload);
    }

    #[test]
    fn oversized_payload_never_encodes(
        max in 1usize..64,
        extra in 1usize..64,
    ) {
        let payload = vec![0u8; max + extra];
        let result = encode(0x0001, &payload, max);
        let rejected = matches!(result, Err(HciError::PayloadTooLarge { .. }));
        prop_assert!(rejected);
    }

    #[test]
    fn chunks_cover_the_whole_image(
        bodies in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..=255usize), 1..20),
    ) {
        let mut data = Vec::new();
        for body in &bodies {
            data.extend_from_slice(&0xFC4Cu16.to_le_bytes());
            data.push(body.len() as u8);
            data.extend_from_slice(body);
        }
        let image = FirmwareImage::from_bytes(data.clone());

        let mut rebuilt = Vec::new();
        let mut count = 0;
        for chunk in image.chunks() {
            let chunk = chunk.unwrap();
            prop_assert_eq!(chunk.data, &bodies[count][..]);
            rebuilt.extend_from_slice(chunk.raw);
            count += 1;
        }
        prop_assert_eq!(count, bodies.len());
        prop_assert_eq!(rebuilt, data);
    }
}
