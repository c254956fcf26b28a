use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::crypto::{PrivateKey, PublicKey};
use crate::Error;

/// Host keys sshd usually holds, in the order they are offered.
pub const SYSTEM_HOST_KEYS: [&str; 2] = [
    "/etc/ssh/ssh_host_rsa_key",
    "/etc/ssh/ssh_host_ecdsa_key",
];

/// Named public keys of peers we are willing to talk to.
///
/// The responder of a pubkey handshake looks up the identity the initiator
/// claims and expects the presented key to match the stored one.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    keys: BTreeMap<String, PublicKey>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every regular file in `dir` as a PEM public key named by its file name.
    ///
    /// Files that can't be read or parsed are skipped. Fails if the directory
    /// itself can't be listed.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::Config(format!("Unreadable key directory {}: {}", dir.display(), e))
        })?;

        let mut store = TrustStore::new();

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match PublicKey::load(&path) {
                Ok(key) => {
                    store.insert(name, key);
                }
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                }
            }
        }

        Ok(store)
    }

    /// Add or replace the key for `identity`.
    pub fn insert(&mut self, identity: impl Into<String>, key: PublicKey) -> Option<PublicKey> {
        self.keys.insert(identity.into(), key)
    }

    pub fn get(&self, identity: &str) -> Option<&PublicKey> {
        self.keys.get(identity)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(|k| k.as_str())
    }
}

/// Keys of an OpenSSH `known_hosts` file.
///
/// Lines are `hosts keytype base64 [comment]`. The host field is dropped
/// without matching it. Comments, markers and lines that don't parse are
/// skipped.
pub fn parse_known_hosts(text: &str) -> Vec<PublicKey> {
    parse_lines(text, |line| {
        let (_hosts, key) = line.split_once(char::is_whitespace)?;
        PublicKey::from_openssh(key).ok()
    })
}

/// Keys of an OpenSSH `authorized_keys` file.
///
/// Only plain `keytype base64 [comment]` lines are understood. Lines with
/// options, and anything else that doesn't parse, are skipped.
pub fn parse_authorized_keys(text: &str) -> Vec<PublicKey> {
    parse_lines(text, |line| PublicKey::from_openssh(line).ok())
}

fn parse_lines(text: &str, parse: impl Fn(&str) -> Option<PublicKey>) -> Vec<PublicKey> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let key = parse(line);
            if key.is_none() {
                trace!("Skipping unparsable key line: {:.32}", line);
            }
            key
        })
        .collect()
}

/// Read and parse a `known_hosts` file.
pub fn load_known_hosts(path: impl AsRef<Path>) -> Result<Vec<PublicKey>, Error> {
    read_key_list(path.as_ref()).map(|text| parse_known_hosts(&text))
}

/// Read and parse an `authorized_keys` file.
pub fn load_authorized_keys(path: impl AsRef<Path>) -> Result<Vec<PublicKey>, Error> {
    read_key_list(path.as_ref()).map(|text| parse_authorized_keys(&text))
}

fn read_key_list(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Unreadable key list {}: {}", path.display(), e)))
}

/// Load the private keys at `paths` that can be read, keeping their order.
pub fn load_host_keys<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Vec<PrivateKey> {
    paths
        .into_iter()
        .filter_map(|path| match PrivateKey::load(&path) {
            Ok(key) => Some(key),
            Err(e) => {
                debug!("Skipping host key: {}", e);
                None
            }
        })
        .collect()
}

impl<S: Into<String>> FromIterator<(S, PublicKey)> for TrustStore {
    fn from_iter<I: IntoIterator<Item = (S, PublicKey)>>(iter: I) -> Self {
        let mut store = TrustStore::new();
        for (name, key) in iter {
            store.insert(name, key);
        }
        store
    }
}
