//! Application data over established channels.

mod channel_common;

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use channel_common::*;
use secchan::{AuthMode, Config, Error, HandshakeParams, PasswordParams, Value};

#[test]
fn none_passes_values_through() {
    let (mut init, mut resp) = established(HandshakeParams::none(), HandshakeParams::none());
    assert_eq!(init.auth_mode(), Some(AuthMode::None));

    let msg: Value = [("hello", "world")].into_iter().collect();
    assert!(init.send_msg(&msg));
    assert_eq!(resp.recv_msg().unwrap(), msg);

    // Plaintext records are counted too: the hello and the message.
    assert_eq!(init.write_seq_num(), 2);
    assert_eq!(resp.read_seq_num(), 2);
}

#[test]
fn anonymous_dh_counts_every_record() {
    let (mut init, mut resp) =
        established(HandshakeParams::anonymous_dh(), HandshakeParams::anonymous_dh());
    assert_eq!(resp.auth_mode(), Some(AuthMode::AnonymousDh));

    let sizes = [16, 100, 1000, 4096, 10 * 1024];

    let (init_write, resp_read) = (init.write_seq_num(), resp.read_seq_num());
    for (i, size) in sizes.iter().enumerate() {
        let msg = Value::Bytes(vec![i as u8; *size]);
        assert!(init.send_msg(&msg));
        assert_eq!(resp.recv_msg().unwrap(), msg);
    }
    assert_eq!(init.write_seq_num(), init_write + 5);
    assert_eq!(resp.read_seq_num(), resp_read + 5);

    let (resp_write, init_read) = (resp.write_seq_num(), init.read_seq_num());
    for (i, size) in sizes.iter().enumerate() {
        let msg = Value::Bytes(vec![0xf0 | i as u8; *size]);
        assert!(resp.send_msg(&msg));
        assert_eq!(init.recv_msg().unwrap(), msg);
    }
    assert_eq!(resp.write_seq_num(), resp_write + 5);
    assert_eq!(init.read_seq_num(), init_read + 5);
}

#[test]
fn nested_values_survive() {
    let (mut init, mut resp) = established(
        HandshakeParams::password(PasswordParams::new("hunter2")),
        HandshakeParams::password(PasswordParams::new("hunter2")),
    );

    let mut inner = BTreeMap::new();
    inner.insert("ok".to_string(), Value::Bool(true));
    inner.insert("code".to_string(), Value::Int(-42));
    inner.insert("blob".to_string(), Value::Bytes(vec![0, 1, 2, 255]));

    let msg: Value = [
        ("type", Value::from("result")),
        ("items", Value::List(vec![Value::Nil, Value::from("x"), Value::Map(inner)])),
    ]
    .into_iter()
    .collect();

    assert!(resp.send_msg(&msg));
    assert_eq!(init.recv_msg().unwrap(), msg);
}

#[test]
fn corrupted_records_are_skipped() {
    let (mut init, mut resp) =
        established(HandshakeParams::anonymous_dh(), HandshakeParams::anonymous_dh());

    let checks = resp.mac_checks();

    // Garbage written straight to the socket, bypassing the channel.
    let mut stream = init.get_ref();
    for _ in 0..3 {
        stream.write_all(b"48 ").unwrap();
        stream.write_all(&[0x55; 48]).unwrap();
    }

    let msg = Value::from("after the noise");
    assert!(init.send_msg(&msg));
    assert_eq!(resp.recv_msg().unwrap(), msg);

    assert_eq!(resp.mac_checks(), checks + 4);
}

#[test]
fn too_many_corrupted_records() {
    let config = Arc::new(
        Config::builder()
            .max_corrupted_records(Some(2))
            .build()
            .unwrap(),
    );
    let (init, resp) = handshake_with_config(
        HandshakeParams::anonymous_dh(),
        HandshakeParams::anonymous_dh(),
        config,
    );
    init.result.unwrap();
    resp.result.unwrap();
    let (init, mut resp) = (init.channel, resp.channel);

    let mut stream = init.get_ref();
    for _ in 0..3 {
        stream.write_all(b"48 ").unwrap();
        stream.write_all(&[0x55; 48]).unwrap();
    }

    assert!(matches!(
        resp.recv_msg(),
        Err(Error::TooManyCorruptedRecords(3))
    ));
}

#[test]
fn deep_values_are_rejected() {
    let (mut init, mut resp) = established(HandshakeParams::none(), HandshakeParams::none());

    let mut msg = Value::Nil;
    for _ in 0..100 {
        msg = Value::List(vec![msg]);
    }

    assert!(init.send_msg(&msg));
    assert!(matches!(resp.recv_msg(), Err(Error::Decode(_))));
}

#[test]
fn peer_close_is_disconnected() {
    let (init, mut resp) =
        established(HandshakeParams::anonymous_dh(), HandshakeParams::anonymous_dh());

    init.close().unwrap();
    assert!(matches!(resp.recv_msg(), Err(Error::Disconnected)));
}
