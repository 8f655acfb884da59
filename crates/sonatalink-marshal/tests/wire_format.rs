use sonatalink_marshal::channelizer::{
    BaseAddr, ChannelizerState, Intrinsics, Status, INTERFACE_VERSION,
};
use sonatalink_marshal::common::{MessageHeader, NssDate, NssMessage, NssMessageSeverity};
use sonatalink_marshal::dx::{DxActivityState, DxActivityStatus, DxStatus, ThereYouAre};
use sonatalink_marshal::{
    check_all_layouts, demarshall, from_wire, marshall, registry, swap_fields, text_field, to_wire,
    IntegrityError, Marshall,
};

#[test]
fn status_is_big_endian_on_the_wire() {
    let status = Status {
        timestamp: NssDate {
            tv_sec: 0x0a0b_0c0d,
            tv_usec: 1,
        },
        center_sky_freq_mhz: 1420.0,
        state: ChannelizerState::Running,
        ..Status::default()
    };
    let wire = marshall(&status);
    assert_eq!(wire.len(), Status::WIRE_SIZE);
    assert_eq!(&wire[0..4], &[0x0a, 0x0b, 0x0c, 0x0d]);
    assert_eq!(&wire[16..24], &1420.0f64.to_be_bytes());
    assert_eq!(&wire[24..28], &[0, 0, 0, 2]);
    assert_eq!(demarshall::<Status>(&wire).unwrap(), status);
}

#[test]
fn character_arrays_are_not_swapped() {
    let addr = BaseAddr::new("10.1.2.3", 51_000);
    let wire = marshall(&addr);
    assert_eq!(&wire[..8], b"10.1.2.3");
    assert_eq!(&wire[256..260], &51_000i32.to_be_bytes());
}

#[test]
fn wire_bytes_survive_decode_then_encode() {
    let mut msg = NssMessage::new(40_047, NssMessageSeverity::Warning, "baseline drifting");
    msg.description[500] = b'x';
    let wire = marshall(&msg);
    let again = marshall(&demarshall::<NssMessage>(&wire).unwrap());
    assert_eq!(wire, again);
}

#[test]
fn swap_is_its_own_inverse() {
    let status = DxStatus {
        number_of_activities: 1,
        act: [
            DxActivityStatus {
                activity_id: 12,
                current_state: DxActivityState::Tuned,
            },
            DxActivityStatus::default(),
        ],
        ..DxStatus::default()
    };
    let wire = marshall(&status);
    let mut bytes = wire.to_vec();
    from_wire(DxStatus::LAYOUT, &mut bytes).unwrap();
    to_wire(DxStatus::LAYOUT, &mut bytes).unwrap();
    assert_eq!(&bytes[..], &wire[..]);

    swap_fields(DxStatus::LAYOUT, &mut bytes).unwrap();
    swap_fields(DxStatus::LAYOUT, &mut bytes).unwrap();
    assert_eq!(&bytes[..], &wire[..]);
}

#[test]
fn wrong_length_buffers_are_rejected() {
    let wire = marshall(&ThereYouAre::default());
    assert!(matches!(
        demarshall::<ThereYouAre>(&wire[..wire.len() - 1]),
        Err(IntegrityError::Truncated { .. })
    ));

    let mut long = wire.to_vec();
    long.push(0);
    assert!(matches!(
        demarshall::<ThereYouAre>(&long),
        Err(IntegrityError::TrailingBytes { .. })
    ));
}

#[test]
fn header_and_body_concatenate() {
    let body = Intrinsics {
        interface_version: text_field(INTERFACE_VERSION),
        ..Intrinsics::default()
    };
    let mut header = MessageHeader {
        code: 80_002,
        data_length: Intrinsics::WIRE_SIZE as u32,
        message_number: 1,
        ..MessageHeader::default()
    };
    header.set_sender("chan0");

    let mut buf = bytes::BytesMut::new();
    sonatalink_marshal::marshall_into(&header, &mut buf);
    sonatalink_marshal::marshall_into(&body, &mut buf);
    assert_eq!(buf.len(), MessageHeader::WIRE_SIZE + Intrinsics::WIRE_SIZE);

    let back_header: MessageHeader = demarshall(&buf[..MessageHeader::WIRE_SIZE]).unwrap();
    assert_eq!(back_header.data_length as usize, Intrinsics::WIRE_SIZE);
    let back_body: Intrinsics = demarshall(&buf[MessageHeader::WIRE_SIZE..]).unwrap();
    assert_eq!(back_body, body);
}

#[test]
fn all_layouts_verify() {
    let summary = check_all_layouts().unwrap();
    assert_eq!(summary.records, registry().len());
    for info in registry() {
        assert!(info.layout.size > 0, "{}", info.layout.name);
    }
}
