//! Integration tests for socket options

use bytes::Bytes;
use std::time::Duration;
use zmqstream_core::config::{DEFAULT_READ_BATCH, DEFAULT_YIELD_AFTER};
use zmqstream_core::options::{OptionValue, SocketOption, SocketOptions};
use zmqstream_core::socket_type::SocketType;

#[test]
fn test_flow_control_options() {
    let opts = SocketOptions::new()
        .with_send_hwm(10)
        .with_recv_hwm(20)
        .with_read_batch(10)
        .with_yield_after(1000);

    assert_eq!(opts.send_hwm, 10);
    assert_eq!(opts.recv_hwm, 20);
    assert_eq!(opts.read_batch, 10);
    assert_eq!(opts.yield_after, 1000);
}

#[test]
fn test_engine_defaults() {
    let opts = SocketOptions::default();

    assert_eq!(opts.read_batch, DEFAULT_READ_BATCH);
    assert_eq!(opts.yield_after, DEFAULT_YIELD_AFTER);
    assert_eq!(opts.linger, Some(Duration::from_secs(30)));
    assert_eq!(opts.socket_type, SocketType::Pair); // Empty options mean PAIR
}

#[test]
fn test_keyed_options_match_builder() {
    let built = SocketOptions::from(SocketType::Router)
        .with_identity("router-1")
        .with_send_hwm(5)
        .with_linger(None);

    let mut keyed = SocketOptions::from(SocketType::Router);
    keyed.set(SocketOption::Identity, &"router-1".into()).unwrap();
    keyed.set(SocketOption::SendHighWaterMark, &OptionValue::Int(5)).unwrap();
    keyed.set(SocketOption::Linger, &OptionValue::Int(-1)).unwrap();

    assert_eq!(built, keyed);
}

#[test]
fn test_option_names_and_codes() {
    assert_eq!(SocketOption::Identity as i32, 5);
    assert_eq!(SocketOption::Type as i32, 16);
    assert_eq!(SocketOption::Linger as i32, 17);
    assert_eq!(SocketOption::SendHighWaterMark as i32, 23);
    assert_eq!(SocketOption::RecvHighWaterMark as i32, 24);
    assert_eq!(SocketOption::SendHighWaterMark.to_string(), "SNDHWM");
}

#[test]
fn test_identity_limits() {
    let mut opts = SocketOptions::new();

    let max = Bytes::from(vec![b'a'; 255]);
    opts.set(SocketOption::Identity, &OptionValue::Bytes(max.clone())).unwrap();
    assert_eq!(opts.identity, Some(max));

    let too_long = Bytes::from(vec![b'a'; 256]);
    let err = opts
        .set(SocketOption::Identity, &OptionValue::Bytes(too_long))
        .unwrap_err();
    assert!(err.to_string().contains("255"));
}
