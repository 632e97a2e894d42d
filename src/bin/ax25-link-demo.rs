/*! AX.25 link-layer demo.

Runs two in-process [`Engine`](ax25link::ax25::Engine)s back to back over a
loopback "channel" that can drop a fraction of frames, to exercise the
retransmission and window-flow-control logic outside of any real radio.

```no_run
$ ax25-link-demo --messages 20 --drop-rate 0.2 -v
```
*/
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use rand::Rng;

use ax25link::ax25::{Address, Engine, LinkConfig};

#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Opt {
    #[arg(short = 'v', default_value = "0")]
    verbose: usize,

    #[arg(
        long,
        default_value = "10",
        help = "Number of payloads to send each way"
    )]
    messages: u32,

    #[arg(
        long,
        default_value = "0.0",
        help = "Fraction of frames to drop on the wire"
    )]
    drop_rate: f64,

    #[arg(long, default_value = "A", help = "Call sign for station A")]
    call_a: String,

    #[arg(long, default_value = "B", help = "Call sign for station B")]
    call_b: String,
}

/// Shovel frames sitting in `from`'s frame-out queue onto `to`, dropping
/// some fraction of them to simulate a lossy channel.
fn relay(from: &Engine, to: &mut Engine, drop_rate: f64, rng: &mut impl Rng) -> usize {
    let mut moved = 0;
    while let Some(frame) = from.try_recv_frame_out() {
        if rng.random_bool(drop_rate) {
            log::debug!("dropped a frame on the wire");
            continue;
        }
        to.receive_bytes(&frame);
        moved += 1;
    }
    moved
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    stderrlog::new()
        .module(module_path!())
        .module("ax25link")
        .quiet(false)
        .verbosity(opt.verbose)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let addr_a = Address::new(&opt.call_a, 0);
    let addr_b = Address::new(&opt.call_b, 0);
    let mut a = Engine::new(LinkConfig::new(addr_a, addr_b));
    let mut b = Engine::new(LinkConfig::new(addr_b, addr_a));

    for i in 0..opt.messages {
        a.send_payload(format!("a->b #{i}").into_bytes());
        b.send_payload(format!("b->a #{i}").into_bytes());
    }

    let mut rng = rand::rng();
    let deadline = Instant::now() + Duration::from_secs(30);
    let mut received_by_a = 0u32;
    let mut received_by_b = 0u32;
    while Instant::now() < deadline
        && (received_by_a < opt.messages || received_by_b < opt.messages)
    {
        relay(&a, &mut b, opt.drop_rate, &mut rng);
        relay(&b, &mut a, opt.drop_rate, &mut rng);
        while let Some(payload) = a.try_recv_payload() {
            log::info!("A received: {}", String::from_utf8_lossy(&payload));
            received_by_a += 1;
        }
        while let Some(payload) = b.try_recv_payload() {
            log::info!("B received: {}", String::from_utf8_lossy(&payload));
            received_by_b += 1;
        }
        if let Some(err) = a.fatal() {
            anyhow::bail!("A's link failed: {err}");
        }
        if let Some(err) = b.fatal() {
            anyhow::bail!("B's link failed: {err}");
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    println!("A received {received_by_a}/{} payloads", opt.messages);
    println!("B received {received_by_b}/{} payloads", opt.messages);
    if received_by_a < opt.messages || received_by_b < opt.messages {
        anyhow::bail!("not all payloads were delivered within the deadline");
    }
    Ok(())
}
