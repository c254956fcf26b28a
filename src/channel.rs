use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use crate::framer::Framer;
use crate::handshake::{HandshakeRole, Initiator, Responder};
use crate::message::ContentType;
use crate::params::{AuthMode, HandshakeParams};
use crate::value::Value;
use crate::{Config, Error};

/// Which end of the connection a channel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Opened the connection. Speaks first in every exchange.
    Initiator,
    /// Accepted the connection.
    Responder,
}

/// A blocking, reliable duplex byte stream.
pub trait Transport: Read + Write {
    fn shutdown(&self, how: Shutdown) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        TcpStream::shutdown(self, how)
    }
}

impl Transport for UnixStream {
    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        UnixStream::shutdown(self, how)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    New,
    Established(AuthMode),
    Unusable,
}

/// A secure channel over a [`Transport`].
///
/// ```no_run
/// use std::os::unix::net::UnixStream;
/// use secchan::{Channel, HandshakeParams, PasswordParams, Role, Value};
///
/// let stream = UnixStream::connect("/run/agent.sock")?;
/// let mut channel = Channel::new(stream, Role::Initiator);
///
/// channel.handshake(&HandshakeParams::password(PasswordParams::new("hunter2")))?;
///
/// let msg: Value = [("type", Value::from("ping"))].into_iter().collect();
/// channel.send_msg(&msg);
/// let reply = channel.recv_msg()?;
/// # let _ = reply;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Channel<S: Transport> {
    framer: Framer<S>,
    role: Role,
    config: Arc<Config>,
    status: Status,
}

impl<S: Transport> Channel<S> {
    /// Wrap `stream` with the default configuration.
    pub fn new(stream: S, role: Role) -> Self {
        Self::with_config(stream, role, Arc::new(Config::default()))
    }

    pub fn with_config(stream: S, role: Role, config: Arc<Config>) -> Self {
        Channel {
            framer: Framer::new(stream, &config),
            role,
            config,
            status: Status::New,
        }
    }

    /// Run the handshake. Must be called exactly once before exchanging
    /// messages.
    ///
    /// Params are checked before anything is written, so a configuration
    /// error leaves the channel untouched. Any other failure makes the
    /// channel permanently unusable.
    pub fn handshake(&mut self, params: &HandshakeParams) -> Result<(), Error> {
        match self.status {
            Status::New => {}
            Status::Established(_) => return Err(Error::HandshakeAlreadyRun),
            Status::Unusable => return Err(Error::Unusable),
        }

        params.validate(self.role)?;

        let provider = self.config.crypto_provider().clone();
        let result = match self.role {
            Role::Initiator => drive(Initiator::new(params.clone(), provider), &mut self.framer),
            Role::Responder => drive(Responder::new(params.clone(), provider), &mut self.framer),
        };

        match result {
            Ok(()) => {
                let mode = params.auth_mode();
                let records = self.framer.records();
                debug!(
                    "{:?} channel established ({:?}, protected: {})",
                    self.role,
                    mode,
                    records.is_read_protected() && records.is_write_protected()
                );
                self.status = Status::Established(mode);
                Ok(())
            }
            Err(e) => {
                self.status = Status::Unusable;
                Err(e)
            }
        }
    }

    /// Encode and send one value. Returns `false` if it could not be sent.
    pub fn send_msg(&mut self, value: &Value) -> bool {
        match self.try_send(value) {
            Ok(()) => true,
            Err(e) => {
                debug!("Failed to send message: {}", e);
                false
            }
        }
    }

    fn try_send(&mut self, value: &Value) -> Result<(), Error> {
        self.ensure_established()?;
        self.framer
            .send(ContentType::ApplicationData, &value.encode())
    }

    /// Block until the next value arrives.
    pub fn recv_msg(&mut self) -> Result<Value, Error> {
        self.ensure_established()?;

        let (content_type, body) = self.framer.recv()?;
        if content_type != ContentType::ApplicationData {
            return Err(Error::Decode(format!(
                "Unexpected {:?} record after the handshake",
                content_type
            )));
        }

        Value::decode(&body, self.config.max_value_depth())
    }

    fn ensure_established(&self) -> Result<(), Error> {
        match self.status {
            Status::New => Err(Error::NotEstablished),
            Status::Established(_) => Ok(()),
            Status::Unusable => Err(Error::Unusable),
        }
    }

    /// Shut down both directions and drop the channel with its keys.
    pub fn close(self) -> Result<(), Error> {
        match self.framer.get_ref().shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e.into()),
            _ => Ok(()),
        }
    }

    pub fn shutdown(&self, how: Shutdown) -> Result<(), Error> {
        self.framer.get_ref().shutdown(how)?;
        Ok(())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_established(&self) -> bool {
        matches!(self.status, Status::Established(_))
    }

    /// Mode the handshake authenticated with, once established.
    pub fn auth_mode(&self) -> Option<AuthMode> {
        match self.status {
            Status::Established(mode) => Some(mode),
            _ => None,
        }
    }

    /// Records read under the current read keys.
    pub fn read_seq_num(&self) -> u64 {
        self.framer.records().read_seq_num()
    }

    /// Records written under the current write keys.
    pub fn write_seq_num(&self) -> u64 {
        self.framer.records().write_seq_num()
    }

    /// MAC verifications run on received records, passing or not.
    pub fn mac_checks(&self) -> u64 {
        self.framer.records().mac_checks()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_ref(&self) -> &S {
        self.framer.get_ref()
    }
}

fn drive<S: Read + Write, H: HandshakeRole>(mut side: H, framer: &mut Framer<S>) -> Result<(), Error> {
    let result = side.run(framer);
    trace!("Handshake ended in {:?}", side.state());
    result
}
