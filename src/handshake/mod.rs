//! The handshake engine.
//!
//! Every mode starts with the hello exchange, after which the mode specific
//! exchange runs. [`Initiator`] and [`Responder`] each drive their side to
//! completion over a [`Framer`]. A failed handshake is terminal.

use std::io::{Read, Write};

use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::prf::{self, MASTER_SECRET_LEN, VERIFY_DATA_LEN};
use crate::crypto::{CryptoProvider, Group};
use crate::framer::Framer;
use crate::message::{ContentType, Handshake, MessageType, Random};
use crate::{Error, Role};

/// Take the expected message out of a [`Handshake`] or fail the handshake.
macro_rules! expect {
    ($msg:expr, $variant:ident) => {
        match $msg {
            Handshake::$variant(m) => m,
            other => {
                return Err(Error::handshake(format!(
                    "Expected {:?}, got {:?}",
                    MessageType::$variant,
                    other.message_type()
                )))
            }
        }
    };
}

mod initiator;
mod responder;
mod srp;

pub(crate) use initiator::Initiator;
pub(crate) use responder::Responder;

const INITIATOR_FINISHED: &str = "initiator finished";
const RESPONDER_FINISHED: &str = "responder finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    HellosExchanged,
    KeyAgreed,
    CipherPending,
    Established,
    Failed,
}

/// One side of the handshake.
pub(crate) trait HandshakeRole {
    fn state(&self) -> State;

    /// Run the whole exchange. On error the state is [`State::Failed`].
    fn run<S: Read + Write>(&mut self, framer: &mut Framer<S>) -> Result<(), Error>;
}

/// State common to both sides of one handshake.
pub(crate) struct Session {
    role: Role,
    state: State,
    provider: CryptoProvider,
    initiator_random: Option<Random>,
    responder_random: Option<Random>,
    master_secret: Option<Zeroizing<[u8; MASTER_SECRET_LEN]>>,
}

impl Session {
    pub fn new(role: Role, provider: CryptoProvider) -> Self {
        Session {
            role,
            state: State::Init,
            provider,
            initiator_random: None,
            responder_random: None,
            master_secret: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn provider(&self) -> &CryptoProvider {
        &self.provider
    }

    fn transition(&mut self, new_state: State) {
        let prev_state = self.state;
        if prev_state != new_state {
            self.state = new_state;
            trace!("{:?} -> {:?}", prev_state, new_state);
        }
    }

    /// Record the outcome of a run.
    fn finish(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        match &result {
            Ok(()) => self.transition(State::Established),
            Err(e) => {
                if e.is_disconnected() {
                    debug!("{:?} handshake: peer went away", self.role);
                } else {
                    warn!("{:?} handshake failed: {}", self.role, e);
                }
                self.transition(State::Failed);
            }
        }
        result
    }

    fn send<S: Read + Write>(&mut self, framer: &mut Framer<S>, msg: Handshake) -> Result<(), Error> {
        trace!("Send {:?}", msg.message_type());
        let mut body = Vec::new();
        msg.serialize(&mut body);
        framer.send(ContentType::Handshake, &body)
    }

    fn recv<S: Read + Write>(&mut self, framer: &mut Framer<S>) -> Result<Handshake, Error> {
        let (content_type, body) = framer.recv()?;

        if content_type != ContentType::Handshake {
            return Err(Error::handshake(format!(
                "Unexpected {:?} record during handshake",
                content_type
            )));
        }

        let msg = Handshake::decode(&body).map_err(|e| Error::handshake(e.to_string()))?;
        trace!("Received {:?}", msg.message_type());

        Ok(msg)
    }

    fn new_random(&self) -> Result<Random, Error> {
        Ok(Random::new(self.provider.random_bytes::<{ Random::LEN }>()?))
    }

    fn set_randoms(&mut self, initiator: Random, responder: Random) {
        self.initiator_random = Some(initiator);
        self.responder_random = Some(responder);
        self.transition(State::HellosExchanged);
    }

    fn randoms(&self) -> Result<(&Random, &Random), Error> {
        match (&self.initiator_random, &self.responder_random) {
            (Some(i), Some(r)) => Ok((i, r)),
            _ => Err(Error::handshake("Hellos not exchanged")),
        }
    }

    /// Derive the master secret from the agreed secret and install the
    /// pending cipher specs.
    fn agree_keys<S: Read + Write>(
        &mut self,
        framer: &mut Framer<S>,
        shared: &[u8],
    ) -> Result<(), Error> {
        let (initiator_random, responder_random) = self.randoms()?;
        let (ir, rr) = (initiator_random.as_bytes(), responder_random.as_bytes());

        let master_secret = Zeroizing::new(prf::master_secret(shared, ir, rr));
        let keys = prf::key_expansion(&*master_secret, ir, rr);

        framer.records_mut().install_next(&keys, self.role);
        self.master_secret = Some(master_secret);

        self.transition(State::KeyAgreed);
        Ok(())
    }

    fn change_cipher_spec<S: Read + Write>(&mut self, framer: &mut Framer<S>) -> Result<(), Error> {
        framer.send_change_cipher_spec()?;
        self.transition(State::CipherPending);
        Ok(())
    }

    fn verify_data(&self, label: &str, hash: &[u8]) -> Result<[u8; VERIFY_DATA_LEN], Error> {
        let master_secret = self
            .master_secret
            .as_ref()
            .ok_or_else(|| Error::handshake("No master secret"))?;

        let derived = prf::finished_verify_data(&**master_secret, label, hash);
        let mut out = [0u8; VERIFY_DATA_LEN];
        out.copy_from_slice(&derived);
        Ok(out)
    }
}

/// Transcript hash for the Finished exchange.
fn finished_hash(group: &Group, initiator_pub: &BigUint, responder_pub: &BigUint) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(group.encode(initiator_pub));
    hasher.update(group.encode(responder_pub));
    hasher.finalize().to_vec()
}

fn ct_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

fn warn_no_security() {
    warn!("===================================");
    warn!("NO SECURE CHANNEL SETUP IS IN PLACE");
    warn!(" ALL COMMUNICATION IS IN PLAINTEXT");
    warn!("===================================");
}

fn warn_no_authentication() {
    warn!("===========================================");
    warn!("        NO AUTHENTICATION IN PLACE");
    warn!("SECURE CHANNEL IS VULNERABLE TO MITM ATTACKS");
    warn!("===========================================");
}
