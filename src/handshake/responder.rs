use std::io::{Read, Write};

use num_bigint::BigUint;
use zeroize::Zeroizing;

use super::{ct_equal, finished_hash, srp, warn_no_authentication, warn_no_security};
use super::{HandshakeRole, Session, State, INITIATOR_FINISHED, RESPONDER_FINISHED};
use crate::crypto::{check_public_value, compare_keys, CryptoProvider, DhKeyExchange};
use crate::crypto::{PrivateKey, PublicKey};
use crate::framer::Framer;
use crate::identity::TrustStore;
use crate::message::*;
use crate::params::{HandshakeParams, PasswordParams, SSH_IDENTITY};
use crate::{Error, Role};

const SRP_SALT_LEN: usize = 16;

/// The side that accepted the connection and answers.
pub(crate) struct Responder {
    session: Session,
    params: HandshakeParams,
}

impl Responder {
    pub fn new(params: HandshakeParams, provider: CryptoProvider) -> Self {
        Responder {
            session: Session::new(Role::Responder, provider),
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
            HandshakeParams::PubkeyResponder {
                local_key,
                trust_store,
            } => pubkey(session, framer, local_key, trust_store),
            HandshakeParams::SshResponder {
                host_keys,
                authorized_keys,
            } => ssh(session, framer, host_keys, authorized_keys),
            HandshakeParams::Password(params) => password(session, framer, params),
            HandshakeParams::PubkeyInitiator { .. } | HandshakeParams::SshInitiator { .. } => Err(
                Error::Config("Initiator params given to the responder".to_string()),
            ),
        }
    }
}

impl HandshakeRole for Responder {
    fn state(&self) -> State {
        self.session.state()
    }

    fn run<S: Read + Write>(&mut self, framer: &mut Framer<S>) -> Result<(), Error> {
        let result = self.exchange(framer);
        self.session.finish(result)
    }
}

fn hello<S: Read + Write>(session: &mut Session, framer: &mut Framer<S>) -> Result<(), Error> {
    let hello = expect!(session.recv(framer)?, InitiatorHello);

    let random = session.new_random()?;
    session.send(framer, Handshake::ResponderHello(ResponderHello { random }))?;
    session.set_randoms(hello.random, random);

    Ok(())
}

fn anonymous_dh<S: Read + Write>(
    session: &mut Session,
    framer: &mut Framer<S>,
) -> Result<(), Error> {
    let group = session.provider().dh_group;

    let peer = expect!(session.recv(framer)?, DhPublic);
    let peer_public = BigUint::from_bytes_be(&peer.value);
    check_public_value(group, &peer_public).map_err(Error::handshake)?;

    let dh = DhKeyExchange::new(group, session.provider())?;
    session.send(
        framer,
        Handshake::DhPublic(DhPublic {
            value: dh.public_bytes(),
        }),
    )?;

    let shared = Zeroizing::new(
        dh.compute_shared_secret(&peer_public)
            .map_err(Error::handshake)?,
    );
    session.agree_keys(framer, &shared)?;
    session.change_cipher_spec(framer)?;

    let hash = finished_hash(group, &peer_public, dh.public_key());

    let verify_data = session.verify_data(RESPONDER_FINISHED, &hash)?;
    session.send(framer, Handshake::Finished(Finished { verify_data }))?;

    let expected = session.verify_data(INITIATOR_FINISHED, &hash)?;
    let finished = expect!(session.recv(framer)?, Finished);
    if !ct_equal(&finished.verify_data, &expected) {
        return Err(Error::handshake("Initiator Finished mismatch"));
    }

    Ok(())
}

fn pubkey<S: Read + Write>(
    session: &mut Session,
    framer: &mut Framer<S>,
    local_key: &PrivateKey,
    trust_store: &TrustStore,
) -> Result<(), Error> {
    let group = session.provider().dh_group;

    let hello = expect!(session.recv(framer)?, PubkeyInitiatorHello);

    let Some(expected_key) = trust_store.get(&hello.identity) else {
        debug!(
            "Trusted identities: {:?}",
            trust_store.identities().collect::<Vec<_>>()
        );
        return Err(Error::handshake(format!(
            "Unknown identity {:?}",
            hello.identity
        )));
    };

    let initiator_key = PublicKey::from_der(&hello.public_key)
        .map_err(|e| Error::handshake(format!("Bad initiator key: {}", e)))?;

    if !compare_keys(expected_key, &initiator_key) {
        return Err(Error::handshake(format!(
            "Key of {:?} is not the trusted key",
            hello.identity
        )));
    }

    if !expected_key.verify(&hello.dh_public, &hello.signature) {
        return Err(Error::handshake("Bad signature on initiator DH value"));
    }
    debug!("Authenticated {:?} ({:?})", hello.identity, expected_key.kind());

    let peer_public = BigUint::from_bytes_be(&hello.dh_public);
    check_public_value(group, &peer_public).map_err(Error::handshake)?;

    let dh = DhKeyExchange::new(group, session.provider())?;
    let dh_public = dh.public_bytes();
    let signature = local_key.sign(&dh_public, session.provider().secure_random)?;

    session.send(
        framer,
        Handshake::PubkeyResponderHello(PubkeyResponderHello {
            public_key: local_key.public_key().to_der()?,
            dh_public,
            signature,
        }),
    )?;

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
    host_keys: &[PrivateKey],
    authorized_keys: &[PublicKey],
) -> Result<(), Error> {
    let hello = expect!(session.recv(framer)?, SshInitiatorHello);

    let initiator_key = PublicKey::from_der(&hello.public_key)
        .map_err(|e| Error::handshake(format!("Bad initiator key: {}", e)))?;

    if !authorized_keys
        .iter()
        .any(|k| compare_keys(k, &initiator_key))
    {
        return Err(Error::handshake("Initiator key is not authorized"));
    }

    let offered = host_keys
        .iter()
        .map(|k| k.public_key().to_der())
        .collect::<Result<Vec<_>, _>>()?;

    session.send(
        framer,
        Handshake::SshResponderHello(SshResponderHello { host_keys: offered }),
    )?;

    let select = expect!(session.recv(framer)?, SshKeySelect);

    let Some(host_key) = host_keys.get(select.index as usize) else {
        return Err(Error::handshake(format!(
            "Host key index {} out of range",
            select.index
        )));
    };

    if !initiator_key.verify(&SshKeySelect::signed_data(select.index), &select.signature) {
        return Err(Error::handshake("Bad signature on host key selection"));
    }
    debug!("Initiator selected host key {}", select.index);

    let mut trust_store = TrustStore::new();
    trust_store.insert(SSH_IDENTITY, initiator_key);

    pubkey(session, framer, host_key, &trust_store)
}

fn password<S: Read + Write>(
    session: &mut Session,
    framer: &mut Framer<S>,
    params: &PasswordParams,
) -> Result<(), Error> {
    let group = session.provider().srp_group;
    let k = srp::multiplier(group);

    let begin = expect!(session.recv(framer)?, SrpBegin);
    if begin.username != params.username {
        return Err(Error::handshake(format!(
            "Unknown SRP user {:?}",
            begin.username
        )));
    }

    let salt = session.provider().random_vec(SRP_SALT_LEN)?;
    let x = srp::private_x(&salt, &params.username, &params.password);
    let v = srp::verifier(group, &x);

    session.send(framer, Handshake::SrpSalt(SrpSalt { salt }))?;

    let msg = expect!(session.recv(framer)?, SrpInitiatorPublic);
    let a_bytes = msg.a;
    let big_a = BigUint::from_bytes_be(&a_bytes);
    if srp::is_degenerate(group, &big_a) {
        return Err(Error::handshake("Degenerate SRP initiator value"));
    }

    let b = session.provider().random_exponent(group)?;
    let big_b = srp::responder_public(group, &b, &k, &v);
    let b_bytes = group.encode(&big_b);

    session.send(
        framer,
        Handshake::SrpResponderPublic(SrpResponderPublic { b: b_bytes.clone() }),
    )?;

    let u = srp::scrambler(&a_bytes, &b_bytes);
    let s = srp::responder_secret(group, &big_a, &v, &u, &b);
    let s_bytes = Zeroizing::new(group.encode(&s));

    let msg = expect!(session.recv(framer)?, SrpProof1);
    let expected = srp::proof1(&a_bytes, &b_bytes, &s_bytes);
    if !ct_equal(&msg.m1, &expected) {
        return Err(Error::handshake("SRP initiator proof mismatch"));
    }

    let m2 = srp::proof2(&a_bytes, &expected, &s_bytes);
    session.send(framer, Handshake::SrpProof2(SrpProof2 { m2: m2.to_vec() }))?;

    let key = Zeroizing::new(srp::session_key(&s_bytes));
    session.agree_keys(framer, &*key)?;
    session.change_cipher_spec(framer)?;

    Ok(())
}
