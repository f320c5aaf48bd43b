use tc_gtpu::{
    EgressState, PacketProcessor, PcapMirror, TunnelParams, TunnelStateFile, load_config_file,
    state_file::load_state_file,
};
use tc_gtpu_tests::{framework::*, *};

#[test]
fn load_config_and_state_files() -> anyhow::Result<()> {
    let (_, logger) = init();
    let config = load_config_file("test_config.toml", &logger)?;
    assert_eq!(config.gtpu_ifindex, GTPU_IFINDEX);
    assert_eq!(config.saddr, TUNNEL_SADDR);
    assert_eq!(config.daddr, TUNNEL_DADDR);

    let (mirror, _receivers) = PcapMirror::new(1, 1);
    let pp = PacketProcessor::new(config, mirror, &logger)?;
    let state = load_state_file("test_state.toml", &logger)?;
    pp.load_state(&state)?;

    assert_eq!(pp.egress_state().len(), 2);
    assert_eq!(
        pp.resolve_egress(TUNNEL_IFINDEX),
        TunnelParams { teid: 0x100, qfi: 5 }
    );
    // Zero QFI on disk still means "use the defaults".
    assert_eq!(pp.resolve_egress(6), TunnelParams { teid: 6, qfi: 9 });

    let target = pp.resolve_ingress(0x100);
    assert_eq!(target.ifindex, TUNNEL_IFINDEX);
    assert_eq!(target.if_mac, Some([0x02, 0, 0, 0, 0, 0x05]));

    let (_, out) = send_uplink(&pp, &ue_frame(64));
    assert_eq!(outer_headers(&out).teid, 0x100);
    Ok(())
}

#[test]
fn missing_files_are_errors() {
    let (_, logger) = init();
    assert!(load_config_file("no_such_config.toml", &logger).is_err());
    assert!(load_state_file("no_such_state.toml", &logger).is_err());
}

#[test]
fn state_beyond_table_capacity_is_rejected() {
    let (pp, _logger) = init();
    let state = TunnelStateFile {
        egress: (1..=33)
            .map(|ifindex| (ifindex, EgressState { teid: ifindex, qfi: 1 }))
            .collect(),
        ingress: vec![],
    };
    assert!(pp.load_state(&state).is_err());
    assert_eq!(pp.egress_state().len(), 32);
}
