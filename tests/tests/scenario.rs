use tc_gtpu::counter_indices::*;
use tc_gtpu_tests::{framework::*, *};

#[test]
fn hundred_byte_frame_from_interface_5() {
    let (pp, _logger) = init();

    // 14 bytes of Ethernet and an 86 byte IPv4 packet.
    let frame = ue_frame(100 - ETH_LEN - IPV4_LEN - UDP_LEN);
    assert_eq!(frame.len(), 100);

    let mut skb = MemSkb::new(&frame, 5);
    assert_eq!(pp.tunnel_egress(&mut skb), TcAction::Redirect);
    assert_eq!(skb.redirect_target(), Some(GTPU_IFINDEX));
    assert_eq!(skb.frame().len(), 100 + ENCAP_LEN);

    let outer = outer_headers(skb.frame());
    assert_eq!(outer.teid, 5);
    assert_eq!(outer.qfi, 9);
    assert_eq!(outer.gtp_message_length as usize, 86 + GTPU_EXT_LEN);
    assert_eq!(outer.ipv4_total_length as usize, 86 + ENCAP_LEN);
    assert_eq!(outer.udp_length as usize, 86 + ENCAP_LEN - IPV4_LEN);

    let counters = pp.counters().tunnel_egress.snapshot();
    assert_eq!(counters[RX_PKTS], 1);
    assert_eq!(counters[RX_BYTES], 100);
    assert_eq!(counters[ENCAP], 1);
}
