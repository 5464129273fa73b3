//! DEALER / ROUTER ping-pong
//!
//! A DEALER named `ExampleDealer` sends `ping:N` requests, one per loop turn,
//! and a ROUTER answers each with `pong:N`. Both sides only act on `Drain`
//! and `Readable` notifications.
//!
//! The inproc transport does not add routing envelopes, so the router sees
//! `[empty, body]` and its reply goes back to its only peer.
//!
//! # Run
//!
//! ```sh
//! cargo run --example dealer_router -- 1000
//! ```

use zmqstream::prelude::*;

const ENDPOINT: &str = "inproc://dealer-router";

#[compio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    zmqstream::dev_tracing::init_tracing();

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1000);

    let mut router = Socket::with_type(SocketType::Router);
    router.bind(ENDPOINT)?;
    let router_events = router.observe();

    let mut dealer = Socket::with_type(SocketType::Dealer);
    dealer.set_option(SocketOption::Identity, "ExampleDealer")?;
    dealer.connect(ENDPOINT)?;
    let dealer_events = dealer.observe();

    println!("Pinging router with {count} messages.");

    let pinging = async {
        let (mut sent, mut received) = (0, 0);
        let mut paused = false;
        while received < count {
            if !paused && sent < count {
                sent += 1;
                let ping = Message::new().push_empty().push_str(&format!("ping:{sent}"));
                paused = !dealer.write(ping)?;
            }

            dealer.ready().await?;
            for event in dealer_events.drain() {
                match event {
                    StreamEvent::Drain => paused = false,
                    StreamEvent::Readable => {
                        while let Some(batch) = dealer.read(Some(100))? {
                            received += batch.len();
                        }
                    }
                }
            }
        }
        println!("Dealer sent: {sent}, received: {received}");
        Ok::<_, StreamError>(())
    };

    let ponging = async {
        let (mut sent, mut received) = (0, 0);
        while sent < count || router.queued() > 0 {
            router.ready().await?;
            if !router_events.drain().contains(&StreamEvent::Readable) {
                continue;
            }
            while let Some(batch) = router.read(Some(100))? {
                for request in batch {
                    received += 1;
                    let body = request.parse_frame_str(request.len().saturating_sub(1))?;
                    let seq = body.strip_prefix("ping:").unwrap_or(body);
                    sent += 1;
                    let pong = Message::new().push_empty().push_str(&format!("pong:{seq}"));
                    router.write(pong)?;
                }
            }
        }
        println!("Router received: {received}, sent: {sent}");
        Ok::<_, StreamError>(())
    };

    let (pinged, ponged) = futures::future::join(pinging, ponging).await;
    pinged?;
    ponged?;

    dealer.close()?;
    router.close()?;
    Ok(())
}
