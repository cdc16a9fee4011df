use etherparse::PacketBuilder;
use layerchain_core::{
    ChainStop, DispatchError, Dispatcher, FrameError, LayerError, PacketContext, Protocol,
    ProtocolTag, decode_ethernet_frame,
};
use serde_json::json;

const ETHERCAT: ProtocolTag = ProtocolTag::EtherType(0x88a4);
const NBNS: ProtocolTag = ProtocolTag::UdpPort(137);

fn ethercat_payload(word: u16, total: usize) -> Vec<u8> {
    let mut buf = vec![0u8; total];
    buf[..2].copy_from_slice(&word.to_le_bytes());
    buf
}

#[test]
fn header_lengths_sum_to_buffer_length() {
    let dispatcher = Dispatcher::default();
    for total in 7..=20 {
        let buf = ethercat_payload(0x0005, total);
        let chain = dispatcher
            .build(&buf, ETHERCAT, PacketContext::default())
            .expect("chain");
        let sum: usize = chain.layers().map(|l| l.header_len()).sum();
        assert_eq!(sum, total, "total {total}");
        assert!(chain.last().next_layer().is_none());
        assert!(chain.undecoded().is_none());
    }
}

#[test]
fn ethercat_length_word_examples() {
    let dispatcher = Dispatcher::default();

    let exact = ethercat_payload(0x0005, 7);
    let chain = dispatcher
        .build(&exact, ETHERCAT, PacketContext::default())
        .expect("chain");
    assert_eq!(chain.root().header_len(), 7);
    assert!(chain.root().next_layer().is_none());

    let padded = ethercat_payload(0x0005, 10);
    let chain = dispatcher
        .build(&padded, ETHERCAT, PacketContext::default())
        .expect("chain");
    let trailer = chain.root().next_layer().expect("trailer");
    assert_eq!(trailer.protocol(), Protocol::PadBytes);
    assert_eq!(trailer.header_len(), 3);
}

#[test]
fn nbns_never_has_successor() {
    let dispatcher = Dispatcher::default();
    for len in 4..64 {
        let buf: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let chain = dispatcher
            .build(&buf, NBNS, PacketContext::default())
            .expect("chain");
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.consumed(), len);
    }
}

#[test]
fn short_buffers_are_malformed() {
    let dispatcher = Dispatcher::default();
    let err = dispatcher
        .build(&[0x05], ETHERCAT, PacketContext::default())
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::Layer(LayerError::Malformed {
            protocol: Protocol::EtherCat,
            needed: 2,
            actual: 1,
        })
    );
    let err = dispatcher
        .build(&[0, 0, 0], NBNS, PacketContext::default())
        .unwrap_err();
    assert!(err.to_string().contains("malformed NBNS layer"));
}

#[test]
fn unknown_tag_is_reported() {
    let err = Dispatcher::default()
        .build(&[0u8; 12], ProtocolTag::UdpPort(138), PacketContext::default())
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::UnknownProtocol {
            tag: ProtocolTag::UdpPort(138),
            undecoded: 12,
        }
    );
}

#[test]
fn describe_is_idempotent() {
    let buf = ethercat_payload(0x0002, 9);
    let chain = Dispatcher::default()
        .build(&buf, ETHERCAT, PacketContext::default())
        .expect("chain");
    for layer in chain.layers() {
        let before = layer.view().as_bytes().to_vec();
        assert_eq!(layer.describe(), layer.describe());
        assert_eq!(layer.view().as_bytes(), before.as_slice());
    }
}

#[test]
fn overlong_length_keeps_partial_chain() {
    let buf = ethercat_payload(0x07ff, 60);
    let chain = Dispatcher::default()
        .build(&buf, ETHERCAT, PacketContext::default())
        .expect("chain");
    assert_eq!(chain.len(), 1);
    assert!(matches!(
        chain.stop(),
        Some(ChainStop::Failed {
            after: Protocol::EtherCat,
            ..
        })
    ));
    assert_eq!(chain.consumed(), 60);
}

#[test]
fn ethernet_frame_summary() {
    let mut frame = vec![0u8; 60];
    frame[0..6].copy_from_slice(&[0x01, 0x01, 0x05, 0x01, 0x00, 0x00]);
    frame[6..12].copy_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    frame[12..14].copy_from_slice(&0x88a4u16.to_be_bytes());
    frame[14..16].copy_from_slice(&0x100eu16.to_le_bytes());

    let decoded = decode_ethernet_frame(
        &Dispatcher::default(),
        &frame,
        PacketContext {
            index: 0,
            timestamp: Some(1.5),
        },
    )
    .expect("decode");
    let value = serde_json::to_value(decoded.chain.summary()).expect("summary json");
    assert_eq!(
        value,
        json!({
            "context": { "index": 0, "timestamp": 1.5 },
            "buffer_len": 46,
            "consumed": 46,
            "undecoded": 0,
            "layers": [
                {
                    "protocol": "ethercat",
                    "osi_layer": "data_link",
                    "offset": 0,
                    "header_len": 16,
                    "description": "EtherCAT Layer, Data length: 16 bytes"
                },
                {
                    "protocol": "pad_bytes",
                    "osi_layer": "data_link",
                    "offset": 16,
                    "header_len": 30,
                    "description": format!("Pad bytes: {}", "00".repeat(30))
                }
            ]
        })
    );
}

#[test]
fn nbns_query_over_ipv6() {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv6([0xfe; 16], [0xff; 16], 32)
        .udp(50000, 137);
    let payload = [0x12, 0x34, 0x85, 0x00, 0, 0, 0, 1, 0, 0, 0, 0, 0xde, 0xad];
    let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, &payload).expect("write");

    let decoded = decode_ethernet_frame(&Dispatcher::default(), &frame, PacketContext::default())
        .expect("decode");
    assert_eq!(decoded.entry, ProtocolTag::UdpPort(137));
    let root = decoded.chain.root();
    assert_eq!(root.protocol(), Protocol::Nbns);
    assert_eq!(root.view().as_bytes(), &payload);
}

#[test]
fn arp_frame_is_unknown() {
    let mut frame = vec![0u8; 42];
    frame[12..14].copy_from_slice(&0x0806u16.to_be_bytes());
    let err = decode_ethernet_frame(&Dispatcher::default(), &frame, PacketContext::default())
        .unwrap_err();
    assert_eq!(
        err,
        FrameError::Dispatch(DispatchError::UnknownProtocol {
            tag: ProtocolTag::EtherType(0x0806),
            undecoded: 28,
        })
    );
}
