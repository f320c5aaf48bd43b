use rand::Rng;
use tc_gtpu::{EgressState, counter_indices::*};
use tc_gtpu_tests::{framework::*, *};

#[test]
fn default_teid_and_qfi_without_state() {
    let (pp, _logger) = init();
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let frame = ue_frame(rng.gen_range(0..1400));
        let (action, out) = send_uplink(&pp, &frame);
        assert_eq!(action, TcAction::Redirect);
        assert_eq!(out.len(), frame.len() + ENCAP_LEN);

        let inner_len = (frame.len() - ETH_LEN) as u16;
        let outer = outer_headers(&out);
        assert_eq!(outer.teid, TUNNEL_IFINDEX);
        assert_eq!(outer.qfi, 9);
        assert_eq!(outer.ipv4_total_length, inner_len + ENCAP_LEN as u16);
        assert_eq!(outer.udp_length, outer.ipv4_total_length - IPV4_LEN as u16);
        assert_eq!(outer.gtp_message_length, inner_len + GTPU_EXT_LEN as u16);
        assert_eq!(&out[ETH_LEN + ENCAP_LEN..], &frame[ETH_LEN..]);
        assert_eq!(&out[..ETH_LEN], &frame[..ETH_LEN]);
    }
}

#[test]
fn outer_headers_follow_config() {
    let (pp, _logger) = init();
    let (_, out) = send_uplink(&pp, &ue_frame(10));
    let outer = outer_headers(&out);
    assert_eq!(outer.src, TUNNEL_SADDR);
    assert_eq!(outer.dst, TUNNEL_DADDR);
    assert_eq!(outer.udp_source, GTPU_PORT);
    assert_eq!(outer.udp_destination, GTPU_PORT);
    assert_eq!(outer.gtp_flags, 0x34);
    assert_eq!(outer.gtp_message_type, GTP_MESSAGE_TYPE_GPU);
    assert_eq!(outer.next_ext, 0x85);
}

#[test]
fn egress_state_overrides_teid_and_qfi() {
    let (pp, _logger) = init();
    let mut rng = rand::thread_rng();
    let teid = rng.gen_range(1..=u32::MAX);
    pp.egress_state()
        .insert(TUNNEL_IFINDEX, EgressState { teid, qfi: 5 })
        .unwrap();

    let (action, out) = send_uplink(&pp, &ue_frame(100));
    assert_eq!(action, TcAction::Redirect);
    let outer = outer_headers(&out);
    assert_eq!(outer.teid, teid);
    assert_eq!(outer.qfi, 5);
}

#[test]
fn zeroed_egress_state_is_ignored() {
    let (pp, _logger) = init();
    pp.egress_state()
        .insert(TUNNEL_IFINDEX, EgressState { teid: 0x1234, qfi: 0 })
        .unwrap();
    let outer = outer_headers(&send_uplink(&pp, &ue_frame(20)).1);
    assert_eq!((outer.teid, outer.qfi), (TUNNEL_IFINDEX, 9));

    pp.egress_state()
        .insert(TUNNEL_IFINDEX, EgressState { teid: 0, qfi: 7 })
        .unwrap();
    let outer = outer_headers(&send_uplink(&pp, &ue_frame(20)).1);
    assert_eq!((outer.teid, outer.qfi), (TUNNEL_IFINDEX, 9));
}

#[test]
fn outer_checksum_finalized_on_gtpu_egress() {
    let (pp, _logger) = init();
    let frame = ue_frame(77);

    // Straight after encapsulation the checksum is still zero.
    let mut skb = MemSkb::new(&frame, TUNNEL_IFINDEX);
    pp.tunnel_egress(&mut skb);
    assert_eq!(outer_headers(skb.frame()).ipv4_checksum, 0);

    let (_, out) = send_uplink(&pp, &frame);
    let outer = outer_headers(&out);
    assert_ne!(outer.ipv4_checksum, 0);
    assert_eq!(outer.ipv4_checksum, expected_outer_checksum(&out));
    assert_eq!(pp.counters().gtpu_egress.snapshot()[CSUM_FIXED], 1);
}

#[test]
fn non_linear_frame_is_pulled_in() {
    let (pp, _logger) = init();
    let frame = ue_frame(500);
    let mut skb = MemSkb::new(&frame, TUNNEL_IFINDEX).with_linear_len(ETH_LEN + IPV4_LEN);
    assert_eq!(pp.tunnel_egress(&mut skb), TcAction::Redirect);
    let outer = outer_headers(skb.frame());
    assert_eq!(outer.ipv4_total_length as usize, frame.len() - ETH_LEN + ENCAP_LEN);
    assert_eq!(&skb.frame()[ETH_LEN + ENCAP_LEN..], &frame[ETH_LEN..]);
}

#[test]
fn sub_ethernet_frames_are_dropped() {
    let (pp, _logger) = init();
    let runt = [0xffu8; ETH_LEN - 1];

    let mut skb = MemSkb::new(&runt, TUNNEL_IFINDEX);
    assert_eq!(pp.tunnel_egress(&mut skb), TcAction::Shot);
    assert_eq!(skb.frame(), &runt[..]);

    let mut skb = MemSkb::new(&runt, TUNNEL_IFINDEX);
    assert_eq!(pp.tunnel_ingress(&mut skb), TcAction::Shot);
    assert_eq!(pp.counters().tunnel_ingress.snapshot()[DROP_TOO_SHORT], 1);

    // A whole frame with only part of its Ethernet header resident is
    // unparseable rather than short, on both hooks.
    let frame = ue_frame(20);
    let mut skb = MemSkb::new(&frame, TUNNEL_IFINDEX).with_linear_len(10);
    assert_eq!(pp.tunnel_egress(&mut skb), TcAction::Ok);
    assert_eq!(skb.frame(), &frame[..]);

    let mut skb = MemSkb::new(&frame, TUNNEL_IFINDEX).with_linear_len(10);
    assert_eq!(pp.tunnel_ingress(&mut skb), TcAction::Ok);
    assert_eq!(skb.frame(), &frame[..]);
    assert_eq!(pp.counters().tunnel_egress.snapshot()[DROP_TOO_SHORT], 1);
    assert_eq!(pp.counters().tunnel_ingress.snapshot()[DROP_TOO_SHORT], 1);
}

#[test]
fn tunnel_ingress_passes_anything_with_ethernet() {
    let (pp, _logger) = init();
    let mut frame = ue_frame(4);
    frame[12..14].copy_from_slice(&[0x88, 0xcc]);
    let mut skb = MemSkb::new(&frame, TUNNEL_IFINDEX);
    assert_eq!(pp.tunnel_ingress(&mut skb), TcAction::Ok);
    assert_eq!(skb.frame(), &frame[..]);
}

#[test]
fn malformed_inner_passes_unmodified() {
    let (pp, _logger) = init();
    let mut frame = ue_frame(4);
    frame[ETH_LEN] = 0x44; // IHL too small
    let (action, out) = send_uplink(&pp, &frame);
    assert_eq!(action, TcAction::Ok);
    assert_eq!(out, frame);

    let frame = ue_frame(4);
    let truncated = &frame[..ETH_LEN + IPV4_LEN - 1];
    let (action, out) = send_uplink(&pp, truncated);
    assert_eq!(action, TcAction::Ok);
    assert_eq!(out, truncated);
}

#[test]
fn gtpu_egress_leaves_other_traffic_alone() {
    let (pp, _logger) = init();

    // Plain UDP to port 53, with its checksum cleared.
    let mut plain_udp = ue_frame(32);
    plain_udp[ETH_LEN + 10..ETH_LEN + 12].fill(0);

    // GTP-U cut short inside the UDP header.
    let truncated = gtpu_frame(9, GTP_MESSAGE_TYPE_GPU, &ue_frame(8)[ETH_LEN..])[..ETH_LEN + IPV4_LEN + 4].to_vec();

    // GTP-U behind a 24-byte IPv4 header carrying one word of NOP options.
    let mut with_options = gtpu_frame(9, GTP_MESSAGE_TYPE_GPU, &ue_frame(8)[ETH_LEN..]);
    with_options.splice(ETH_LEN + IPV4_LEN..ETH_LEN + IPV4_LEN, [1u8; 4]);
    with_options[ETH_LEN] = 0x46;
    let total_length = (with_options.len() - ETH_LEN) as u16;
    with_options[ETH_LEN + 2..ETH_LEN + 4].copy_from_slice(&total_length.to_be_bytes());
    with_options[ETH_LEN + 10..ETH_LEN + 12].fill(0);

    for frame in [plain_udp, truncated, with_options] {
        let mut skb = MemSkb::new(&frame, GTPU_IFINDEX);
        assert_eq!(pp.gtpu_egress(&mut skb), TcAction::Ok);
        assert_eq!(skb.frame(), &frame[..]);
    }
    let counters = pp.counters().gtpu_egress.snapshot();
    assert_eq!(counters[CSUM_FIXED], 0);
    assert_eq!(counters[PASS], 3);
}
