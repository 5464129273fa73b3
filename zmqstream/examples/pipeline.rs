//! Vent → sink pipeline
//!
//! A PUSH socket vents numbered messages to a PULL socket over inproc. The
//! vent writes up to 100 messages per loop turn, stops when `write` reports
//! the transport full, and resumes on the next drain. The sink reads in
//! batches of 100 whenever it is told data is readable.
//!
//! # Features Demonstrated
//!
//! - Flow control with `write` → `false` → `Drain`
//! - Batched reads driven by `Readable`
//! - Two sockets sharing one compio event loop
//!
//! # Run
//!
//! ```sh
//! cargo run --example pipeline -- 100000
//! ```

use std::time::Instant;
use zmqstream::prelude::*;

const ENDPOINT: &str = "inproc://pipeline";
const BATCH: usize = 100;

#[compio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    zmqstream::dev_tracing::init_tracing();

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1000);

    let mut sink = Socket::with_type(SocketType::Pull);
    sink.bind(ENDPOINT)?;
    let readable = sink.on(StreamEvent::Readable);

    let mut vent = Socket::with_type(SocketType::Push);
    vent.connect(ENDPOINT)?;
    let drains = vent.on(StreamEvent::Drain);

    println!("Venting {count} messages with a {} socket.", vent.socket_type());
    println!("Sinking {count} messages with a {} socket.", sink.socket_type());

    let start = Instant::now();

    let venting = async {
        let mut sent = 0;
        let mut drain_waits = 0;
        while sent < count {
            // Up to BATCH messages per turn of the loop.
            let mut full = false;
            for _ in 0..BATCH.min(count - sent) {
                sent += 1;
                if !vent.write(Message::new().push_str(&format!("msg:{sent}")))? {
                    full = true;
                    break;
                }
            }

            if full {
                drain_waits += 1;
                while drains.try_next().is_none() {
                    vent.ready().await?;
                }
            } else {
                vent.dispatch()?;
                compio::time::sleep(std::time::Duration::ZERO).await;
            }
        }
        while vent.queued() > 0 {
            vent.ready().await?;
        }
        println!("Sent: {sent} ({drain_waits} drain waits)");
        Ok::<_, StreamError>(())
    };

    let sinking = async {
        let mut received = 0;
        while received < count {
            sink.ready().await?;
            if readable.try_next().is_none() {
                continue;
            }
            while let Some(batch) = sink.read(Some(BATCH))? {
                received += batch.len();
            }
        }
        println!("Received: {received}");
        Ok::<_, StreamError>(received)
    };

    let (vented, sunk) = futures::future::join(venting, sinking).await;
    vented?;
    let received = sunk?;

    let elapsed = start.elapsed();
    println!(
        "Rate: {:.0} msg/s over {:?}",
        received as f64 / elapsed.as_secs_f64(),
        elapsed
    );

    vent.close()?;
    sink.close()?;
    Ok(())
}
