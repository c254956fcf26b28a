//! Authenticated handshake modes.

mod channel_common;

use channel_common::*;
use secchan::{AuthMode, Error, HandshakeParams, PasswordParams, TrustStore, Value};

fn ping_pong(
    init: &mut secchan::Channel<std::os::unix::net::UnixStream>,
    resp: &mut secchan::Channel<std::os::unix::net::UnixStream>,
) {
    let ping = Value::from("ping");
    assert!(init.send_msg(&ping));
    assert_eq!(resp.recv_msg().unwrap(), ping);

    let pong = Value::from("pong");
    assert!(resp.send_msg(&pong));
    assert_eq!(init.recv_msg().unwrap(), pong);
}

#[test]
fn pubkey_with_every_key_kind() {
    for (initiator, responder) in [("ec256", "rsa"), ("rsa", "ec384"), ("dsa", "ec256")] {
        let trust: TrustStore = [("controller", public_key(initiator))].into_iter().collect();

        let (mut init, mut resp) = established(
            HandshakeParams::pubkey_initiator(
                "controller",
                private_key(initiator),
                public_key(responder),
            ),
            HandshakeParams::pubkey_responder(private_key(responder), trust),
        );

        assert_eq!(init.auth_mode(), Some(AuthMode::Pubkey));
        ping_pong(&mut init, &mut resp);
    }
}

#[test]
fn pubkey_unknown_identity() {
    let trust: TrustStore = [("controller", public_key("ec256"))].into_iter().collect();

    let (init, resp) = handshake(
        HandshakeParams::pubkey_initiator("intruder", private_key("ec256"), public_key("rsa")),
        HandshakeParams::pubkey_responder(private_key("rsa"), trust),
    );

    assert!(matches!(resp.result, Err(Error::HandshakeFailed(_))));
    assert!(init.result.is_err());
}

#[test]
fn pubkey_identity_with_other_key() {
    let trust: TrustStore = [("controller", public_key("ec384"))].into_iter().collect();

    let (init, resp) = handshake(
        HandshakeParams::pubkey_initiator("controller", private_key("ec256"), public_key("rsa")),
        HandshakeParams::pubkey_responder(private_key("rsa"), trust),
    );

    assert!(matches!(resp.result, Err(Error::HandshakeFailed(_))));
    assert!(init.result.is_err());
}

#[test]
fn pubkey_impersonated_responder() {
    let trust: TrustStore = [("controller", public_key("ec256"))].into_iter().collect();

    // The initiator expects the RSA key, the responder holds the EC one.
    let (init, _resp) = handshake(
        HandshakeParams::pubkey_initiator("controller", private_key("ec256"), public_key("rsa")),
        HandshakeParams::pubkey_responder(private_key("ec384"), trust),
    );

    assert!(matches!(init.result, Err(Error::HandshakeFailed(_))));
}

#[test]
fn ssh_picks_the_known_host_key() {
    let (mut init, mut resp) = established(
        HandshakeParams::ssh_initiator(private_key("ec256"), vec![public_key("ec384")]),
        HandshakeParams::ssh_responder(
            vec![private_key("rsa"), private_key("ec384")],
            vec![public_key("dsa"), public_key("ec256")],
        ),
    );

    assert_eq!(resp.auth_mode(), Some(AuthMode::Ssh));
    ping_pong(&mut init, &mut resp);
}

#[test]
fn ssh_unauthorized_key() {
    let (init, resp) = handshake(
        HandshakeParams::ssh_initiator(private_key("ec256"), vec![public_key("rsa")]),
        HandshakeParams::ssh_responder(vec![private_key("rsa")], vec![public_key("ec384")]),
    );

    assert!(matches!(resp.result, Err(Error::HandshakeFailed(_))));
    assert!(init.result.is_err());
}

#[test]
fn ssh_no_known_host() {
    let (init, _resp) = handshake(
        HandshakeParams::ssh_initiator(private_key("ec256"), vec![public_key("dsa")]),
        HandshakeParams::ssh_responder(vec![private_key("rsa")], vec![public_key("ec256")]),
    );

    assert!(matches!(init.result, Err(Error::HandshakeFailed(_))));
}

#[test]
fn ssh_from_openssh_files() {
    let keys = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/keys");
    let dir = std::env::temp_dir().join(format!("secchan-ssh-auth-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::copy(keys.join("rsa.openssh"), dir.join("id_rsa")).unwrap();
    std::fs::copy(keys.join("known_hosts"), dir.join("known_hosts")).unwrap();
    std::fs::copy(keys.join("rsa.pub"), dir.join("authorized_keys")).unwrap();

    let initiator = HandshakeParams::ssh_initiator_from_dir(&dir).unwrap();
    // Only the second host key is in known_hosts.
    let responder = HandshakeParams::ssh_responder_from_files(
        [keys.join("dsa.pem"), keys.join("ec384.pem")],
        dir.join("authorized_keys"),
    );
    std::fs::remove_dir_all(&dir).unwrap();

    let (mut init, mut resp) = established(initiator, responder);
    assert_eq!(init.auth_mode(), Some(AuthMode::Ssh));
    ping_pong(&mut init, &mut resp);
}

#[test]
fn password_correct() {
    let (mut init, mut resp) = established(
        HandshakeParams::password(PasswordParams::new("correct horse")),
        HandshakeParams::password(PasswordParams::new("correct horse")),
    );

    assert_eq!(init.auth_mode(), Some(AuthMode::Password));
    ping_pong(&mut init, &mut resp);
}

#[test]
fn password_custom_username() {
    let params = PasswordParams::new("pw").with_username("operator");

    let (mut init, mut resp) = established(
        HandshakeParams::password(params.clone()),
        HandshakeParams::password(params),
    );
    ping_pong(&mut init, &mut resp);
}

#[test]
fn password_wrong() {
    let (init, resp) = handshake(
        HandshakeParams::password(PasswordParams::new("correct horse")),
        HandshakeParams::password(PasswordParams::new("battery staple")),
    );

    assert!(matches!(resp.result, Err(Error::HandshakeFailed(_))));
    assert!(init.result.is_err());

    for mut channel in [init.channel, resp.channel] {
        assert!(!channel.is_established());
        assert!(!channel.send_msg(&Value::from("anyone?")));
        assert!(matches!(channel.recv_msg(), Err(Error::Unusable)));
    }
}

#[test]
fn password_unknown_username() {
    let (init, resp) = handshake(
        HandshakeParams::password(PasswordParams::new("pw").with_username("guest")),
        HandshakeParams::password(PasswordParams::new("pw")),
    );

    assert!(matches!(resp.result, Err(Error::HandshakeFailed(_))));
    assert!(init.result.is_err());
}

#[test]
fn trust_store_from_directory() {
    let dir = std::env::temp_dir().join(format!("secchan-trust-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("controller"),
        public_key("ec256").to_pem().unwrap(),
    )
    .unwrap();

    let trust = TrustStore::load_dir(&dir).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    let (mut init, mut resp) = established(
        HandshakeParams::pubkey_initiator("controller", private_key("ec256"), public_key("rsa")),
        HandshakeParams::pubkey_responder(private_key("rsa"), trust),
    );
    ping_pong(&mut init, &mut resp);
}
