//! Record protection: MAC, pad and encrypt with sequence binding.
//!
//! A protected record is built in three layers, each only applied if the
//! current write spec has the relevant key:
//!
//! ```text
//! signed    = plaintext || HMAC-SHA256(mac_key, seq || len || plaintext)
//! padded    = signed || pad (1..=16 bytes, each equal to the pad length)
//! encrypted = iv || AES-256-CBC(enc_key, iv, padded)
//! ```
//!
//! `seq` and `len` are both encoded as big-endian u64.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::crypto::{hmac, CryptoProvider, KeyBlock};
use crate::{Error, Role};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const BLOCK_SIZE: usize = 16;
const MAC_LEN: usize = 32;

/// Keys and sequence counter governing one direction.
#[derive(Default)]
pub(crate) struct CipherSpec {
    enc_key: Option<Vec<u8>>,
    mac_key: Option<Vec<u8>>,
    seq_num: u64,
}

impl CipherSpec {
    fn new(enc_key: &[u8], mac_key: &[u8]) -> Self {
        CipherSpec {
            enc_key: Some(enc_key.to_vec()),
            mac_key: Some(mac_key.to_vec()),
            seq_num: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.enc_key.is_none() && self.mac_key.is_none()
    }
}

impl Drop for CipherSpec {
    fn drop(&mut self) {
        self.enc_key.zeroize();
        self.mac_key.zeroize();
    }
}

/// The four cipher specs of one side of a channel.
///
/// `next_*` is filled by the handshake and moved into `current_*` when a
/// change cipher spec is sent (write) or received (read).
pub(crate) struct RecordLayer {
    provider: CryptoProvider,
    current_read: CipherSpec,
    current_write: CipherSpec,
    next_read: CipherSpec,
    next_write: CipherSpec,

    /// Number of times the MAC verification routine ran.
    mac_checks: u64,
}

impl RecordLayer {
    pub fn new(provider: CryptoProvider) -> Self {
        RecordLayer {
            provider,
            current_read: CipherSpec::default(),
            current_write: CipherSpec::default(),
            next_read: CipherSpec::default(),
            next_write: CipherSpec::default(),
            mac_checks: 0,
        }
    }

    /// Fill the pending specs from an expanded key block.
    pub fn install_next(&mut self, keys: &KeyBlock, role: Role) {
        let initiator = CipherSpec::new(&keys.initiator_enc, &keys.initiator_mac);
        let responder = CipherSpec::new(&keys.responder_enc, &keys.responder_mac);

        match role {
            Role::Initiator => {
                self.next_write = initiator;
                self.next_read = responder;
            }
            Role::Responder => {
                self.next_write = responder;
                self.next_read = initiator;
            }
        }
    }

    pub fn change_read_spec(&mut self) {
        self.current_read = std::mem::take(&mut self.next_read);
        trace!("Read spec promoted");
    }

    pub fn change_write_spec(&mut self) {
        self.current_write = std::mem::take(&mut self.next_write);
        trace!("Write spec promoted");
    }

    pub fn read_seq_num(&self) -> u64 {
        self.current_read.seq_num
    }

    pub fn write_seq_num(&self) -> u64 {
        self.current_write.seq_num
    }

    pub fn mac_checks(&self) -> u64 {
        self.mac_checks
    }

    pub fn is_read_protected(&self) -> bool {
        !self.current_read.is_empty()
    }

    pub fn is_write_protected(&self) -> bool {
        !self.current_write.is_empty()
    }

    /// Protect one record with the current write spec.
    ///
    /// The write sequence number advances exactly once per call.
    pub fn protect(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        let spec = &self.current_write;

        let mut data = plaintext.to_vec();

        if let Some(mac_key) = &spec.mac_key {
            let tag = mac(mac_key, spec.seq_num, plaintext);
            data.extend_from_slice(&tag);
        }

        if let Some(enc_key) = &spec.enc_key {
            let pad_len = BLOCK_SIZE - (data.len() % BLOCK_SIZE);
            data.resize(data.len() + pad_len, pad_len as u8);

            let iv = self.provider.random_bytes::<BLOCK_SIZE>()?;
            let len = data.len();
            Aes256CbcEnc::new_from_slices(enc_key, &iv)
                .map_err(|e| Error::CryptoError(format!("Bad encryption key: {}", e)))?
                .encrypt_padded_mut::<NoPadding>(&mut data, len)
                .map_err(|e| Error::CryptoError(format!("Encryption failed: {}", e)))?;

            let mut out = Vec::with_capacity(BLOCK_SIZE + data.len());
            out.extend_from_slice(&iv);
            out.extend_from_slice(&data);
            data = out;
        }

        self.current_write.seq_num += 1;

        Ok(data)
    }

    /// Undo [`protect`](Self::protect) with the current read spec.
    ///
    /// Returns `None` for any failure. The read sequence number only
    /// advances on success.
    pub fn unprotect(&mut self, blob: &[u8]) -> Option<Vec<u8>> {
        let decrypted = self
            .current_read
            .enc_key
            .as_deref()
            .map(|enc_key| decrypt(enc_key, blob));

        let signed = match decrypted {
            Some(padded) => match padded.as_deref().and_then(strip_padding) {
                Some(signed) => signed.to_vec(),
                None => {
                    // Bad padding must cost the same as a bad MAC.
                    let _ = self.verify_mac(padded.as_deref().unwrap_or(blob));
                    return None;
                }
            },
            None => blob.to_vec(),
        };

        let data = self.verify_mac(&signed)?;

        self.current_read.seq_num += 1;

        Some(data)
    }

    fn verify_mac(&mut self, signed: &[u8]) -> Option<Vec<u8>> {
        let spec = &self.current_read;

        let Some(mac_key) = &spec.mac_key else {
            return Some(signed.to_vec());
        };

        self.mac_checks += 1;

        let split = signed.len().saturating_sub(MAC_LEN);
        let (data, tag) = signed.split_at(split);
        let expected = mac(mac_key, spec.seq_num, data);

        let valid = tag.len() == MAC_LEN && bool::from(expected.ct_eq(tag));

        valid.then(|| data.to_vec())
    }
}

fn mac(mac_key: &[u8], seq_num: u64, data: &[u8]) -> [u8; MAC_LEN] {
    hmac(
        mac_key,
        &[
            &seq_num.to_be_bytes()[..],
            &(data.len() as u64).to_be_bytes()[..],
            data,
        ],
    )
}

fn decrypt(enc_key: &[u8], blob: &[u8]) -> Option<Vec<u8>> {
    if blob.len() < 2 * BLOCK_SIZE || blob.len() % BLOCK_SIZE != 0 {
        return None;
    }

    let (iv, ciphertext) = blob.split_at(BLOCK_SIZE);
    let mut buf = ciphertext.to_vec();

    Aes256CbcDec::new_from_slices(enc_key, iv)
        .ok()?
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .ok()?;

    Some(buf)
}

/// Remove the block padding, checking every pad byte.
fn strip_padding(padded: &[u8]) -> Option<&[u8]> {
    let pad_len = *padded.last()? as usize;
    if pad_len == 0 || pad_len > BLOCK_SIZE || pad_len > padded.len() {
        return None;
    }

    let (data, pad) = padded.split_at(padded.len() - pad_len);
    let bad = pad.iter().fold(0u8, |acc, b| acc | (b ^ pad_len as u8));

    (bad == 0).then_some(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::default_provider;
    use crate::crypto::prf::key_expansion;

    fn layer_pair(enc: bool, mac: bool) -> (RecordLayer, RecordLayer) {
        let mut writer = RecordLayer::new(default_provider());
        let mut reader = RecordLayer::new(default_provider());

        let spec = || CipherSpec {
            enc_key: enc.then(|| vec![0x11; 32]),
            mac_key: mac.then(|| vec![0x22; 64]),
            seq_num: 0,
        };
        writer.current_write = spec();
        reader.current_read = spec();

        (writer, reader)
    }

    #[test]
    fn round_trip_every_protection_subset() {
        for (enc, mac) in [(false, false), (false, true), (true, false), (true, true)] {
            let (mut writer, mut reader) = layer_pair(enc, mac);

            for len in [0, 1, 15, 16, 17, 31, 32, 33, 1000] {
                let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
                let blob = writer.protect(&plaintext).unwrap();
                let out = reader.unprotect(&blob);
                assert_eq!(out.as_deref(), Some(&plaintext[..]), "enc={enc} mac={mac} len={len}");
            }

            assert_eq!(writer.write_seq_num(), 9);
            assert_eq!(reader.read_seq_num(), 9);
        }
    }

    #[test]
    fn encryption_hides_plaintext() {
        let (mut writer, _) = layer_pair(true, true);
        let blob = writer.protect(b"attack at dawn").unwrap();

        // iv + (14 + 32 + 2 pad) bytes
        assert_eq!(blob.len(), 16 + 48);
        assert!(!blob.windows(14).any(|w| w == b"attack at dawn"));
    }

    #[test]
    fn identical_plaintexts_use_fresh_ivs() {
        let (mut writer, _) = layer_pair(true, false);
        let a = writer.protect(b"same").unwrap();
        let b = writer.protect(b"same").unwrap();
        assert_ne!(a[..16], b[..16]);
    }

    #[test]
    fn replayed_record_fails() {
        let (mut writer, mut reader) = layer_pair(true, true);

        let first = writer.protect(b"one").unwrap();
        let second = writer.protect(b"two").unwrap();

        assert_eq!(reader.unprotect(&first).as_deref(), Some(&b"one"[..]));
        assert_eq!(reader.unprotect(&second).as_deref(), Some(&b"two"[..]));

        assert_eq!(reader.unprotect(&first), None);
        assert_eq!(reader.read_seq_num(), 2);
    }

    #[test]
    fn tampered_record_fails_without_advancing() {
        let (mut writer, mut reader) = layer_pair(false, true);

        let mut blob = writer.protect(b"hello").unwrap();
        blob[0] ^= 1;

        assert_eq!(reader.unprotect(&blob), None);
        assert_eq!(reader.read_seq_num(), 0);
    }

    #[test]
    fn bad_padding_still_runs_mac_check() {
        let (_, mut reader) = layer_pair(true, true);
        let key = vec![0x11; 32];
        let iv = [7u8; 16];

        // Last byte 0 is never valid padding.
        let mut padded = vec![0xaa; 48];
        padded[47] = 0;
        let len = padded.len();
        Aes256CbcEnc::new_from_slices(&key, &iv)
            .unwrap()
            .encrypt_padded_mut::<NoPadding>(&mut padded, len)
            .unwrap();

        let mut blob = iv.to_vec();
        blob.extend_from_slice(&padded);

        assert_eq!(reader.mac_checks(), 0);
        assert_eq!(reader.unprotect(&blob), None);
        assert_eq!(reader.mac_checks(), 1);
        assert_eq!(reader.read_seq_num(), 0);
    }

    #[test]
    fn short_ciphertext_still_runs_mac_check() {
        let (_, mut reader) = layer_pair(true, true);
        assert_eq!(reader.unprotect(&[0u8; 20]), None);
        assert_eq!(reader.mac_checks(), 1);
    }

    #[test]
    fn padding_rules() {
        assert_eq!(strip_padding(&[1, 2, 3, 1]), Some(&[1, 2, 3][..]));
        assert_eq!(strip_padding(&[9, 3, 3, 3]), Some(&[9][..]));
        assert_eq!(strip_padding(&[16; 16]), Some(&[][..]));
        assert_eq!(strip_padding(&[1, 2, 3, 0]), None);
        assert_eq!(strip_padding(&[1, 2, 2, 3]), None);
        assert_eq!(strip_padding(&[17; 32]), None);
        assert_eq!(strip_padding(&[]), None);
    }

    #[test]
    fn installed_specs_are_symmetric() {
        let keys = key_expansion(&[5u8; 48], &[1u8; 28], &[2u8; 28]);

        let mut initiator = RecordLayer::new(default_provider());
        let mut responder = RecordLayer::new(default_provider());
        initiator.install_next(&keys, Role::Initiator);
        responder.install_next(&keys, Role::Responder);

        assert_eq!(initiator.next_write.enc_key, responder.next_read.enc_key);
        assert_eq!(initiator.next_write.mac_key, responder.next_read.mac_key);
        assert_eq!(initiator.next_read.enc_key, responder.next_write.enc_key);
        assert_eq!(initiator.next_read.mac_key, responder.next_write.mac_key);
        assert_ne!(initiator.next_write.enc_key, initiator.next_read.enc_key);
    }

    #[test]
    fn promotion_moves_and_empties_next() {
        let keys = key_expansion(&[5u8; 48], &[1u8; 28], &[2u8; 28]);

        let mut initiator = RecordLayer::new(default_provider());
        let mut responder = RecordLayer::new(default_provider());
        initiator.install_next(&keys, Role::Initiator);
        responder.install_next(&keys, Role::Responder);

        // Plaintext before promotion.
        let blob = initiator.protect(b"ccs").unwrap();
        assert_eq!(blob, b"ccs");
        assert_eq!(responder.unprotect(&blob).as_deref(), Some(&b"ccs"[..]));

        initiator.change_write_spec();
        responder.change_read_spec();

        assert!(initiator.next_write.is_empty());
        assert!(responder.next_read.is_empty());
        assert!(initiator.is_write_protected());
        assert!(responder.is_read_protected());
        assert_eq!(initiator.write_seq_num(), 0);
        assert_eq!(responder.read_seq_num(), 0);

        let blob = initiator.protect(b"secret").unwrap();
        assert_ne!(blob, b"secret");
        assert_eq!(responder.unprotect(&blob).as_deref(), Some(&b"secret"[..]));
        assert_eq!(initiator.write_seq_num(), 1);
        assert_eq!(responder.read_seq_num(), 1);
    }
}
