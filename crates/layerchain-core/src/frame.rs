//! Ethernet II entry point.
//!
//! Finds the first protocol the dispatcher can start from: an EtherCAT
//! EtherType directly after the Ethernet header, or a UDP datagram to or
//! from the NBNS port. The chain is built over that payload, so layer
//! offsets are relative to it. For EtherCAT the payload runs to the end of
//! the frame and any Ethernet padding ends up in a raw trailer.

use etherparse::{Ethernet2HeaderSlice, NetSlice, SlicedPacket, TransportSlice};
use tracing::debug;

use crate::dispatch::{Chain, Dispatcher, PacketContext, ProtocolTag};
use crate::error::{DispatchError, FrameError};
use crate::protocols::{ethercat, nbns};

/// Chain decoded from an Ethernet frame, plus the tag that selected its root.
#[derive(Debug)]
pub struct FrameDecode<'a> {
    pub entry: ProtocolTag,
    /// Offset of the chain's buffer within the frame.
    pub payload_offset: usize,
    pub chain: Chain<'a>,
}

pub fn decode_ethernet_frame<'a>(
    dispatcher: &Dispatcher,
    frame: &'a [u8],
    context: PacketContext,
) -> Result<FrameDecode<'a>, FrameError> {
    let ethernet =
        Ethernet2HeaderSlice::from_slice(frame).map_err(|e| FrameError::Slice(e.to_string()))?;
    let ether_type = ethernet.ether_type().0;
    let header_len = ethernet.slice().len();

    if ethercat::is_ethercat_ethertype(ether_type) {
        let payload = frame.get(header_len..).unwrap_or(&[]);
        let entry = ProtocolTag::EtherType(ether_type);
        debug!(%entry, index = context.index, len = payload.len(), "ethernet entry");
        let chain = dispatcher.build(payload, entry, context)?;
        return Ok(FrameDecode {
            entry,
            payload_offset: header_len,
            chain,
        });
    }

    let (port, payload, payload_offset) = udp_payload(frame)?;
    let entry = ProtocolTag::UdpPort(port);
    debug!(%entry, index = context.index, len = payload.len(), "udp entry");
    let chain = dispatcher.build(payload, entry, context)?;
    Ok(FrameDecode {
        entry,
        payload_offset,
        chain,
    })
}

/// Locate the UDP payload and the port that identifies its protocol.
///
/// The NBNS port wins when it appears on either side; otherwise the lower
/// of the two ports is reported, which is usually the service port.
fn udp_payload(frame: &[u8]) -> Result<(u16, &[u8], usize), FrameError> {
    let sliced = SlicedPacket::from_ethernet(frame).map_err(|e| FrameError::Slice(e.to_string()))?;
    let Some(net) = sliced.net else {
        let header_len = Ethernet2HeaderSlice::from_slice(frame)
            .map(|eth| eth.slice().len())
            .unwrap_or_default();
        return Err(unknown(
            ether_type_of(frame),
            frame.len().saturating_sub(header_len),
        ));
    };
    let udp = match sliced.transport {
        Some(TransportSlice::Udp(udp)) => udp,
        _ => {
            let tag = match &net {
                NetSlice::Ipv4(ipv4) => ProtocolTag::IpProtocol(ipv4.header().protocol().0),
                NetSlice::Ipv6(ipv6) => ProtocolTag::IpProtocol(ipv6.header().next_header().0),
            };
            let ip_payload = net.ip_payload_ref().ok_or(FrameError::MissingIpPayload)?;
            return Err(unknown(tag, ip_payload.payload.len()));
        }
    };

    // Bounded by the UDP length field, not by the end of the IP payload.
    let payload = udp.payload();
    let payload_offset = offset_within(frame, payload);

    let (src, dst) = (udp.source_port(), udp.destination_port());
    let port = if nbns::is_nbns_port(src) || nbns::is_nbns_port(dst) {
        nbns::layout::NBNS_PORT
    } else {
        src.min(dst)
    };
    Ok((port, payload, payload_offset))
}

fn ether_type_of(frame: &[u8]) -> ProtocolTag {
    let value = Ethernet2HeaderSlice::from_slice(frame)
        .map(|eth| eth.ether_type().0)
        .unwrap_or_default();
    ProtocolTag::EtherType(value)
}

fn unknown(tag: ProtocolTag, undecoded: usize) -> FrameError {
    FrameError::Dispatch(DispatchError::UnknownProtocol { tag, undecoded })
}

fn offset_within(outer: &[u8], inner: &[u8]) -> usize {
    let outer_start = outer.as_ptr() as usize;
    let inner_start = inner.as_ptr() as usize;
    inner_start.saturating_sub(outer_start).min(outer.len())
}

#[cfg(test)]
mod tests {
    use etherparse::PacketBuilder;

    use super::decode_ethernet_frame;
    use crate::dispatch::{Dispatcher, PacketContext, ProtocolTag};
    use crate::error::{DispatchError, FrameError};
    use crate::layer::Protocol;

    fn ethercat_frame(data_len: u16, payload_len: usize) -> Vec<u8> {
        let mut frame = vec![0u8; 14 + payload_len];
        frame[0..6].copy_from_slice(&[0xff; 6]);
        frame[6..12].copy_from_slice(&[0x02, 0, 0, 0, 0, 1]);
        frame[12..14].copy_from_slice(&0x88a4u16.to_be_bytes());
        frame[14..16].copy_from_slice(&(0x1000 | data_len).to_le_bytes());
        frame
    }

    #[test]
    fn ethercat_frame_with_padding() {
        let frame = ethercat_frame(12, 46);
        let decoded =
            decode_ethernet_frame(&Dispatcher::default(), &frame, PacketContext::default())
                .unwrap();
        assert_eq!(decoded.entry, ProtocolTag::EtherType(0x88a4));
        assert_eq!(decoded.payload_offset, 14);
        let chain = decoded.chain;
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.root().header_len(), 14);
        assert_eq!(chain.last().protocol(), Protocol::PadBytes);
        assert_eq!(chain.last().header_len(), 32);
    }

    #[test]
    fn nbns_over_udp() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 10], [192, 168, 0, 255], 64)
            .udp(137, 137);
        let payload = [0x80, 0x94, 0x01, 0x10, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let decoded =
            decode_ethernet_frame(&Dispatcher::default(), &frame, PacketContext::default())
                .unwrap();
        assert_eq!(decoded.entry, ProtocolTag::UdpPort(137));
        assert_eq!(decoded.payload_offset, 14 + 20 + 8);
        assert_eq!(decoded.chain.len(), 1);
        assert_eq!(decoded.chain.root().header_len(), payload.len());
    }

    #[test]
    fn other_udp_port_is_unknown() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .udp(5353, 53);
        let payload = [0u8; 6];
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let err = decode_ethernet_frame(&Dispatcher::default(), &frame, PacketContext::default())
            .unwrap_err();
        assert_eq!(
            err,
            FrameError::Dispatch(DispatchError::UnknownProtocol {
                tag: ProtocolTag::UdpPort(53),
                undecoded: 6,
            })
        );
    }

    #[test]
    fn tcp_is_unknown() {
        let builder = PacketBuilder::ethernet2([1, 1, 1, 1, 1, 1], [2, 2, 2, 2, 2, 2])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(1000, 137, 0, 0);
        let payload = [0u8; 4];
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let err = decode_ethernet_frame(&Dispatcher::default(), &frame, PacketContext::default())
            .unwrap_err();
        // 20-byte TCP header plus the 4 payload bytes.
        assert_eq!(
            err,
            FrameError::Dispatch(DispatchError::UnknownProtocol {
                tag: ProtocolTag::IpProtocol(6),
                undecoded: 24,
            })
        );
        assert_eq!(
            err.to_string(),
            "unknown protocol ip protocol 6: 24 bytes left undecoded"
        );
    }

    #[test]
    fn non_ip_ethertype_reports_ethernet_payload() {
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

    #[test]
    fn udp_payload_honours_length_field() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 10], [192, 168, 0, 255], 64)
            .udp(137, 137);
        let payload = [0x80, 0x94, 0x01, 0x10];
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();
        // Ethernet padding up to the 60-byte minimum frame size.
        frame.resize(60, 0);

        let decoded =
            decode_ethernet_frame(&Dispatcher::default(), &frame, PacketContext::default())
                .unwrap();
        assert_eq!(decoded.chain.buffer_len(), payload.len());
        assert_eq!(decoded.chain.root().view().as_bytes(), &payload);
    }

    #[test]
    fn truncated_ethernet_header() {
        let err = decode_ethernet_frame(&Dispatcher::default(), &[0u8; 5], PacketContext::default())
            .unwrap_err();
        assert!(matches!(err, FrameError::Slice(_)));
    }
}
