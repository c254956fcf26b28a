//! What a handshake should authenticate and with which material.

use std::path::{Path, PathBuf};

use crate::crypto::{PrivateKey, PublicKey};
use crate::identity::{load_authorized_keys, load_host_keys, load_known_hosts, TrustStore};
use crate::identity::SYSTEM_HOST_KEYS;
use crate::{Error, Role};

/// Username sent by the password exchange unless another one is set.
pub const DEFAULT_USERNAME: &str = "lnst_user";

/// Identity the ssh exchange uses for the inner pubkey exchange.
pub(crate) const SSH_IDENTITY: &str = "ssh";

/// Authentication mode of a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Plaintext, unauthenticated. Only the hellos are exchanged.
    None,
    /// Ephemeral DH with a Finished exchange, no peer authentication.
    AnonymousDh,
    /// SSH host keys and authorized keys, then a pubkey exchange.
    Ssh,
    /// Signed ephemeral DH with static keys.
    Pubkey,
    /// SRP with a shared password.
    Password,
}

/// Shared credentials for the password exchange.
#[derive(Clone)]
pub struct PasswordParams {
    pub username: String,
    pub password: String,
}

impl PasswordParams {
    /// Credentials for the default username.
    pub fn new(password: impl Into<String>) -> Self {
        PasswordParams {
            username: DEFAULT_USERNAME.to_string(),
            password: password.into(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }
}

impl std::fmt::Debug for PasswordParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordParams")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Drop for PasswordParams {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.password.zeroize();
    }
}

/// Mode and role specific material for [`Channel::handshake`](crate::Channel::handshake).
#[derive(Debug, Clone)]
pub enum HandshakeParams {
    None,
    AnonymousDh,
    PubkeyInitiator {
        /// Name the responder looks our key up by.
        identity: String,
        local_key: PrivateKey,
        /// The responder's expected public key.
        peer_key: PublicKey,
    },
    PubkeyResponder {
        local_key: PrivateKey,
        /// Initiator keys by identity.
        trust_store: TrustStore,
    },
    SshInitiator {
        local_key: PrivateKey,
        known_hosts: Vec<PublicKey>,
    },
    SshResponder {
        host_keys: Vec<PrivateKey>,
        authorized_keys: Vec<PublicKey>,
    },
    Password(PasswordParams),
}

impl HandshakeParams {
    pub fn none() -> Self {
        HandshakeParams::None
    }

    pub fn anonymous_dh() -> Self {
        HandshakeParams::AnonymousDh
    }

    pub fn pubkey_initiator(
        identity: impl Into<String>,
        local_key: PrivateKey,
        peer_key: PublicKey,
    ) -> Self {
        HandshakeParams::PubkeyInitiator {
            identity: identity.into(),
            local_key,
            peer_key,
        }
    }

    pub fn pubkey_responder(local_key: PrivateKey, trust_store: TrustStore) -> Self {
        HandshakeParams::PubkeyResponder {
            local_key,
            trust_store,
        }
    }

    pub fn ssh_initiator(local_key: PrivateKey, known_hosts: Vec<PublicKey>) -> Self {
        HandshakeParams::SshInitiator {
            local_key,
            known_hosts,
        }
    }

    pub fn ssh_responder(host_keys: Vec<PrivateKey>, authorized_keys: Vec<PublicKey>) -> Self {
        HandshakeParams::SshResponder {
            host_keys,
            authorized_keys,
        }
    }

    /// Ssh initiator material from an ssh directory: `id_rsa` and `known_hosts`.
    ///
    /// A missing `known_hosts` yields an empty list, which
    /// [`validate`](Self::validate) rejects.
    pub fn ssh_initiator_from_dir(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let local_key = PrivateKey::load(dir.join("id_rsa"))?;
        let known_hosts = load_known_hosts(dir.join("known_hosts")).unwrap_or_else(|e| {
            warn!("No known hosts loaded: {}", e);
            Vec::new()
        });
        Ok(Self::ssh_initiator(local_key, known_hosts))
    }

    /// Ssh responder material: the readable keys among `host_keys` and the
    /// keys of an `authorized_keys` file.
    pub fn ssh_responder_from_files<P: AsRef<Path>>(
        host_keys: impl IntoIterator<Item = P>,
        authorized_keys: impl AsRef<Path>,
    ) -> Self {
        let authorized_keys = load_authorized_keys(authorized_keys).unwrap_or_else(|e| {
            warn!("No authorized keys loaded: {}", e);
            Vec::new()
        });
        Self::ssh_responder(load_host_keys(host_keys), authorized_keys)
    }

    /// [`ssh_initiator_from_dir`](Self::ssh_initiator_from_dir) on `~/.ssh`.
    pub fn ssh_initiator_from_home() -> Result<Self, Error> {
        Self::ssh_initiator_from_dir(home_ssh_dir()?)
    }

    /// The sshd host keys and `~/.ssh/authorized_keys`.
    pub fn ssh_responder_from_system() -> Result<Self, Error> {
        Ok(Self::ssh_responder_from_files(
            SYSTEM_HOST_KEYS,
            home_ssh_dir()?.join("authorized_keys"),
        ))
    }

    pub fn password(params: PasswordParams) -> Self {
        HandshakeParams::Password(params)
    }

    pub fn auth_mode(&self) -> AuthMode {
        match self {
            HandshakeParams::None => AuthMode::None,
            HandshakeParams::AnonymousDh => AuthMode::AnonymousDh,
            HandshakeParams::PubkeyInitiator { .. } | HandshakeParams::PubkeyResponder { .. } => {
                AuthMode::Pubkey
            }
            HandshakeParams::SshInitiator { .. } | HandshakeParams::SshResponder { .. } => {
                AuthMode::Ssh
            }
            HandshakeParams::Password(_) => AuthMode::Password,
        }
    }

    /// The role these params are meant for, if they are role specific.
    pub fn role(&self) -> Option<Role> {
        match self {
            HandshakeParams::PubkeyInitiator { .. } | HandshakeParams::SshInitiator { .. } => {
                Some(Role::Initiator)
            }
            HandshakeParams::PubkeyResponder { .. } | HandshakeParams::SshResponder { .. } => {
                Some(Role::Responder)
            }
            _ => None,
        }
    }

    /// Check the params can be used by `role` before touching the network.
    pub fn validate(&self, role: Role) -> Result<(), Error> {
        if let Some(wanted) = self.role() {
            if wanted != role {
                return Err(Error::Config(format!(
                    "{:?} params used by {:?}",
                    self.auth_mode(),
                    role
                )));
            }
        }

        match self {
            HandshakeParams::PubkeyInitiator { identity, .. } if identity.is_empty() => {
                Err(Error::Config("Empty pubkey identity".to_string()))
            }
            HandshakeParams::PubkeyResponder { trust_store, .. } if trust_store.is_empty() => {
                Err(Error::Config("Empty trust store".to_string()))
            }
            HandshakeParams::SshInitiator { known_hosts, .. } if known_hosts.is_empty() => {
                Err(Error::Config("No known hosts".to_string()))
            }
            HandshakeParams::SshResponder { host_keys, .. } if host_keys.is_empty() => {
                Err(Error::Config("No host keys".to_string()))
            }
            HandshakeParams::SshResponder {
                authorized_keys, ..
            } if authorized_keys.is_empty() => {
                Err(Error::Config("No authorized keys".to_string()))
            }
            HandshakeParams::SshResponder { host_keys, .. } if host_keys.len() > u16::MAX as usize => {
                Err(Error::Config("Too many host keys".to_string()))
            }
            HandshakeParams::Password(p) if p.password.is_empty() => {
                Err(Error::Config("Empty password".to_string()))
            }
            HandshakeParams::Password(p) if p.username.is_empty() => {
                Err(Error::Config("Empty username".to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn home_ssh_dir() -> Result<PathBuf, Error> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".ssh"))
        .ok_or_else(|| Error::Config("HOME is not set".to_string()))
}
