use std::io::{Read, Write};

use num_bigint::BigUint;
use zeroize::Zeroizing;

use super::{ct_equal, finished_hash, srp, warn_no_authentication, warn_no_security};
use super::{HandshakeRole, Session, State, INITIATOR_FINISHED, RESPONDER_FINISHED};
use crate::crypto::{compare_keys, CryptoProvider, DhKeyExchange, PrivateKey, PublicKey};
use crate::framer::Framer;
use crate::message::*;
use crate::params::{HandshakeParams, PasswordParams, SSH_IDENTITY};
use crate::{Error, Role};

/// The side that opens the connection and speaks first.
pub(crate) struct Initiator {
    session: Session,
    params: HandshakeParams,
}

impl Initiator {
    pub fn new(params: HandshakeParams, provider: CryptoProvider) -> Self {
        Initiator {
            session: Session::new(Role::Initiator, provider),
            params,
        }
    }

    fn exchange<S: Read + Write>(&mut self, framer: &mut Framer<S>) -> Result<(), Error> {
        let session = &mut self.session;

        hello(session, framer)?;

        match &self.params {
            HandshakeParams::None => {
                warn_no_security();
                Ok(())
            }
            HandshakeParams::AnonymousDh => {
                warn_no_authentication();
                anonymous_dh(session, framer)
            }
            HandshakeParams::PubkeyInitiator {
                identity,
                local_key,
                peer_key,
            } => pubkey(session, framer, identity, local_key, peer_key),
            HandshakeParams::SshInitiator {
                local_key,
                known_hosts,
            } => ssh(session, framer, local_key, known_hosts),
            HandshakeParams::Password(params) => password(session, framer, params),
            HandshakeParams::PubkeyResponder { .. } | HandshakeParams::SshResponder { .. } => Err(
                Error::Config("Responder params given to the initiator".to_string()),
            ),
        }
    }
}

impl HandshakeRole for Initiator {
    fn state(&self) -> State {
        self.session.state()
    }

    fn run<S: Read + Write>(&mut self, framer: &mut Framer<S>) -> Result<(), Error> {
        let result = self.exchange(framer);
        self.session.finish(result)
    }
}

fn hello<S: Read + Write>(session: &mut Session, framer: &mut Framer<S>) -> Result<(), Error> {
    let random = session.new_random()?;
    session.send(framer, Handshake::InitiatorHello(InitiatorHello { random }))?;

    let hello = expect!(session.recv(framer)?, ResponderHello);
    session.set_randoms(random, hello.random);

    Ok(())
}

fn anonymous_dh<S: Read + Write>(
    session: &mut Session,
    framer: &mut Framer<S>,
) -> Result<(), Error> {
    let group = session.provider().dh_group;
    let dh = DhKeyExchange::new(group, session.provider())?;

    session.send(
        framer,
        Handshake::DhPublic(DhPublic {
            value: dh.public_bytes(),
        }),
    )?;

    let peer = expect!(session.recv(framer)?, DhPublic);
    let peer_public = BigUint::from_bytes_be(&peer.value);

    let shared = Zeroizing::new(
        dh.compute_shared_secret(&peer_public)
            .map_err(Error::handshake)?,
    );
    session.agree_keys(framer, &shared)?;
    session.change_cipher_spec(framer)?;

    // The responder proves itself first.
    let hash = finished_hash(group, dh.public_key(), &peer_public);
    let expected = session.verify_data(RESPONDER_FINISHED, &hash)?;

    let finished = expect!(session.recv(framer)?, Finished);
    if !ct_equal(&finished.verify_data, &expected) {
        return Err(Error::handshake("Responder Finished mismatch"));
    }

    let verify_data = session.verify_data(INITIATOR_FINISHED, &hash)?;
    session.send(framer, Handshake::Finished(Finished { verify_data }))?;

    Ok(())
}

fn pubkey<S: Read + Write>(
    session: &mut Session,
    framer: &mut Framer<S>,
    identity: &str,
    local_key: &PrivateKey,
    peer_key: &PublicKey,
) -> Result<(), Error> {
    let group = session.provider().dh_group;
    let dh = DhKeyExchange::new(group, session.provider())?;

    let dh_public = dh.public_bytes();
    let signature = local_key.sign(&dh_public, session.provider().secure_random)?;

    session.send(
        framer,
        Handshake::PubkeyInitiatorHello(PubkeyInitiatorHello {
            identity: identity.to_string(),
            public_key: local_key.public_key().to_der()?,
            dh_public,
            signature,
        }),
    )?;

    let reply = expect!(session.recv(framer)?, PubkeyResponderHello);

    let responder_key = PublicKey::from_der(&reply.public_key)
        .map_err(|e| Error::handshake(format!("Bad responder key: {}", e)))?;

    if !compare_keys(peer_key, &responder_key) {
        return Err(Error::handshake("Responder key is not the expected key"));
    }

    if !peer_key.verify(&reply.dh_public, &reply.signature) {
        return Err(Error::handshake("Bad signature on responder DH value"));
    }

    let peer_public = BigUint::from_bytes_be(&reply.dh_public);
    let shared = Zeroizing::new(
        dh.compute_shared_secret(&peer_public)
            .map_err(Error::handshake)?,
    );
    session.agree_keys(framer, &shared)?;
    session.change_cipher_spec(framer)?;

    Ok(())
}

fn ssh<S: Read + Write>(
    session: &mut Session,
    framer: &mut Framer<S>,
    local_key: &PrivateKey,
    known_hosts: &[PublicKey],
) -> Result<(), Error> {
    session.send(
        framer,
        Handshake::SshInitiatorHello(SshInitiatorHello {
            public_key: local_key.public_key().to_der()?,
        }),
    )?;

    let hello = expect!(session.recv(framer)?, SshResponderHello);

    // Indexes refer to the responder's list, unparsable keys included.
    let selected = hello
        .host_keys
        .iter()
        .enumerate()
        .find_map(|(i, der)| {
            let key = PublicKey::from_der(der).ok()?;
            let known = known_hosts.iter().any(|k| compare_keys(k, &key));
            known.then_some((i, key))
        });

    let Some((index, host_key)) = selected else {
        return Err(Error::handshake("No known host key offered"));
    };
    debug!("Selected host key {} ({:?})", index, host_key.kind());

    let index = index as u32;
    let random = session.provider().secure_random;
    let signature = local_key.sign(&SshKeySelect::signed_data(index), random)?;
    session.send(
        framer,
        Handshake::SshKeySelect(SshKeySelect { index, signature }),
    )?;

    pubkey(session, framer, SSH_IDENTITY, local_key, &host_key)
}

fn password<S: Read + Write>(
    session: &mut Session,
    framer: &mut Framer<S>,
    params: &PasswordParams,
) -> Result<(), Error> {
    let group = session.provider().srp_group;
    let k = srp::multiplier(group);

    session.send(
        framer,
        Handshake::SrpBegin(SrpBegin {
            username: params.username.clone(),
        }),
    )?;

    let msg = expect!(session.recv(framer)?, SrpSalt);
    let x = srp::private_x(&msg.salt, &params.username, &params.password);

    let a = session.provider().random_exponent(group)?;
    let big_a = group.g().modpow(&a, group.p());
    if srp::is_degenerate(group, &big_a) {
        return Err(Error::handshake("Degenerate SRP initiator value"));
    }
    let a_bytes = group.encode(&big_a);

    session.send(
        framer,
        Handshake::SrpInitiatorPublic(SrpInitiatorPublic { a: a_bytes.clone() }),
    )?;

    let msg = expect!(session.recv(framer)?, SrpResponderPublic);
    let b_bytes = msg.b;
    let big_b = BigUint::from_bytes_be(&b_bytes);
    if srp::is_degenerate(group, &big_b) {
        return Err(Error::handshake("Degenerate SRP responder value"));
    }

    let u = srp::scrambler(&a_bytes, &b_bytes);
    let s = srp::initiator_secret(group, &big_b, &k, &x, &a, &u);
    let s_bytes = Zeroizing::new(group.encode(&s));

    let m1 = srp::proof1(&a_bytes, &b_bytes, &s_bytes);
    session.send(framer, Handshake::SrpProof1(SrpProof1 { m1: m1.to_vec() }))?;

    let msg = expect!(session.recv(framer)?, SrpProof2);
    let expected = srp::proof2(&a_bytes, &m1, &s_bytes);
    if !ct_equal(&msg.m2, &expected) {
        return Err(Error::handshake("SRP responder proof mismatch"));
    }

    let key = Zeroizing::new(srp::session_key(&s_bytes));
    session.agree_keys(framer, &*key)?;
    session.change_cipher_spec(framer)?;

    Ok(())
}
