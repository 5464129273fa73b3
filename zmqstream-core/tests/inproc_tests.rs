//! Integration tests for the in-process transport

use std::sync::Arc;
use std::thread;
use zmqstream_core::inproc::InprocTransport;
use zmqstream_core::message::Message;
use zmqstream_core::options::SocketOptions;
use zmqstream_core::socket_type::SocketType;
use zmqstream_core::transport::{RecvOutcome, SendOutcome, Transport};

#[test]
fn test_signal_wakes_across_threads() {
    let endpoint = "inproc://it-cross-thread";
    let mut server = InprocTransport::new(&SocketOptions::from(SocketType::Pull));
    server.bind(endpoint).unwrap();
    let signal = server.signal();
    signal.take();

    let sender = thread::spawn(move || {
        let mut client = InprocTransport::new(&SocketOptions::from(SocketType::Push));
        client.connect(endpoint).unwrap();
        for i in 0..100u32 {
            let msg = Message::new().push(i.to_be_bytes().to_vec());
            assert_eq!(client.try_send(msg).unwrap(), SendOutcome::Sent);
        }
        // Keep the link alive until the receiver is done.
        client
    });

    let mut received = 0;
    while received < 100 {
        futures::executor::block_on(futures::future::poll_fn(|cx| signal.poll_notified(cx)));
        while let RecvOutcome::Received(_) = server.try_recv().unwrap() {
            received += 1;
        }
    }

    let client = sender.join().unwrap();
    assert_eq!(client.peer_count(), 1);
    assert!(Arc::strong_count(&signal) >= 2);
}

#[test]
fn test_boxed_transport() {
    let endpoint = "inproc://it-boxed";
    let mut server: Box<dyn Transport> =
        Box::new(InprocTransport::new(&SocketOptions::default()));
    server.bind(endpoint).unwrap();
    let mut client: Box<dyn Transport> =
        Box::new(InprocTransport::new(&SocketOptions::default()));
    client.connect(endpoint).unwrap();

    assert!(client.is_writable());
    assert_eq!(client.try_send(Message::from(["boxed"])).unwrap(), SendOutcome::Sent);
    assert!(server.is_readable());
    assert_eq!(
        server.try_recv().unwrap(),
        RecvOutcome::Received(Message::from(["boxed"]))
    );
    server.close().unwrap();
    client.close().unwrap();
}

#[test]
fn test_incompatible_kinds_still_link() {
    let endpoint = "inproc://it-incompatible";
    let mut server = InprocTransport::new(&SocketOptions::from(SocketType::Pub));
    server.bind(endpoint).unwrap();
    let mut client = InprocTransport::new(&SocketOptions::from(SocketType::Push));
    client.connect(endpoint).unwrap();

    assert_eq!(server.peer_count(), 1);
}
