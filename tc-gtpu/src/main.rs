//! main - replays captured frames through one of the gateway hooks

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use slog::{Drain, Logger, info, o};
use std::fs;
use tc_gtpu::{
    MAX_CPUS, MemSkb, PacketProcessor, PcapMirror, StatsReporter, TcAction, load_config_file,
    state_file::load_state_file,
};

const MIRROR_DEPTH: usize = 256;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gateway configuration: tunnel addresses, GTP-U interface index and
    /// verbosity.
    #[arg(long, default_value = "tc-gtpu.toml")]
    config: String,

    /// Tunnel state to install before replaying, as the control plane would.
    #[arg(long)]
    state: Option<String>,

    /// Which hook to run the frames through.
    #[arg(long, value_enum)]
    hook: Hook,

    /// Index of the interface the frames are seen on.
    #[arg(long, default_value_t = 1)]
    ifindex: u32,

    /// Processor the frames are handled on.  Selects the capture channel.
    #[arg(long, default_value_t = 0)]
    cpu: usize,

    /// File of frames in hex, one per line.  Blank lines and lines starting
    /// with '#' are skipped.
    frames: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Hook {
    TunnelEgress,
    GtpuIngress,
    TunnelIngress,
    GtpuEgress,
}

fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();
    let args = Args::parse();
    ensure!(args.cpu < MAX_CPUS, "CPU must be less than {MAX_CPUS}");

    let config = load_config_file(&args.config, &logger)?;
    let (mirror, receivers) = PcapMirror::new(args.cpu + 1, MIRROR_DEPTH);
    let packet_processor = PacketProcessor::new(config, mirror, &logger)?;

    if let Some(state_file) = &args.state {
        let state = load_state_file(state_file, &logger)?;
        packet_processor.load_state(&state)?;
        info!(
            logger,
            "Installed {} egress and {} ingress entries",
            packet_processor.egress_state().len(),
            packet_processor.ingress_state().len()
        );
    }

    for frame in read_frames(&args.frames)? {
        let mut skb = MemSkb::new(&frame, args.ifindex).with_cpu(args.cpu);
        let action = run_hook(&packet_processor, args.hook, &mut skb);
        match skb.redirect_target() {
            Some(ifindex) => println!("{action} ifindex={ifindex} {}", hex::encode(skb.frame())),
            None => println!("{action} {}", hex::encode(skb.frame())),
        }
    }

    for (cpu, receiver) in receivers.iter().enumerate() {
        while let Ok(record) = receiver.try_recv() {
            println!(
                "pcap cpu={cpu} {} {}",
                hex::encode(record.metadata()),
                hex::encode(&record.data)
            );
        }
    }

    StatsReporter::default().log_stats(packet_processor.counters(), &logger);
    Ok(())
}

fn run_hook(packet_processor: &PacketProcessor, hook: Hook, skb: &mut MemSkb) -> TcAction {
    match hook {
        Hook::TunnelEgress => packet_processor.tunnel_egress(skb),
        Hook::GtpuIngress => packet_processor.gtpu_ingress(skb),
        Hook::TunnelIngress => packet_processor.tunnel_ingress(skb),
        Hook::GtpuEgress => packet_processor.gtpu_egress(skb),
    }
}

fn read_frames(filename: &str) -> Result<Vec<Vec<u8>>> {
    let contents =
        fs::read_to_string(filename).with_context(|| format!("Failed to read {filename}"))?;
    contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(idx, line)| {
            let digits: String = line.split_whitespace().collect();
            hex::decode(digits).with_context(|| format!("{filename} line {} is not hex", idx + 1))
        })
        .collect()
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}
