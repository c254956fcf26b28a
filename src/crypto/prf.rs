use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the master secret.
pub const MASTER_SECRET_LEN: usize = 48;

/// Length of the Finished verify data.
pub const VERIFY_DATA_LEN: usize = 12;

/// AES-256 key length.
pub const ENC_KEY_LEN: usize = 32;

/// MAC keys are sized to the SHA-256 block size.
pub const MAC_KEY_LEN: usize = 64;

/// P_SHA256 as specified in RFC 2246 Section 5.
///
/// A(0) = seed
/// A(i) = HMAC_SHA256(secret, A(i-1))
/// P_SHA256(secret, seed) = HMAC_SHA256(secret, A(1) + seed) +
///                          HMAC_SHA256(secret, A(2) + seed) + ...
///
/// The output is truncated to `output_len`, so a shorter output is always a
/// prefix of a longer one for the same inputs.
pub fn p_sha256(secret: &[u8], seed: &[u8], output_len: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(output_len);

    // A(1) = HMAC_hash(secret, A(0)) where A(0) = seed
    let mut a = hmac(secret, &[seed]);

    while result.len() < output_len {
        // HMAC_hash(secret, A(i) + seed)
        let output = hmac(secret, &[&a[..], seed]);

        let remaining = output_len - result.len();
        let to_copy = std::cmp::min(remaining, output.len());
        result.extend_from_slice(&output[..to_copy]);

        if result.len() < output_len {
            // A(i+1) = HMAC_hash(secret, A(i))
            a = hmac(secret, &[&a[..]]);
        }
    }

    result
}

/// PRF(secret, label, seed) = P_SHA256(secret, label + seed)
///
/// NOTE: The seed parameter here is the actual seed data WITHOUT the label.
pub fn prf(secret: &[u8], label: &str, seed: &[u8], output_len: usize) -> Vec<u8> {
    let mut full_seed = Vec::with_capacity(label.len() + seed.len());
    full_seed.extend_from_slice(label.as_bytes());
    full_seed.extend_from_slice(seed);

    p_sha256(secret, &full_seed, output_len)
}

/// master_secret = PRF(shared, "master secret", client_random + server_random, 48)
pub fn master_secret(
    shared: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> [u8; MASTER_SECRET_LEN] {
    let mut seed = Vec::with_capacity(client_random.len() + server_random.len());
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);

    let derived = prf(shared, "master secret", &seed, MASTER_SECRET_LEN);

    let mut out = [0u8; MASTER_SECRET_LEN];
    out.copy_from_slice(&derived);
    out
}

/// Keys for both directions, split out of the key block.
pub struct KeyBlock {
    pub initiator_enc: Vec<u8>,
    pub responder_enc: Vec<u8>,
    pub initiator_mac: Vec<u8>,
    pub responder_mac: Vec<u8>,
}

/// Key expansion as in RFC 2246 Section 6.3
///
/// key_block = PRF(master_secret, "key expansion", server_random + client_random)
pub fn key_expansion(master_secret: &[u8], client_random: &[u8], server_random: &[u8]) -> KeyBlock {
    // For key expansion, the seed is server_random + client_random
    let mut seed = Vec::with_capacity(client_random.len() + server_random.len());
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    let block = prf(
        master_secret,
        "key expansion",
        &seed,
        2 * ENC_KEY_LEN + 2 * MAC_KEY_LEN,
    );

    let (initiator_enc, rest) = block.split_at(ENC_KEY_LEN);
    let (responder_enc, rest) = rest.split_at(ENC_KEY_LEN);
    let (initiator_mac, responder_mac) = rest.split_at(MAC_KEY_LEN);

    KeyBlock {
        initiator_enc: initiator_enc.to_vec(),
        responder_enc: responder_enc.to_vec(),
        initiator_mac: initiator_mac.to_vec(),
        responder_mac: responder_mac.to_vec(),
    }
}

/// verify_data = PRF(master_secret, finished_label, SHA256(handshake_data), 12)
pub fn finished_verify_data(master_secret: &[u8], label: &str, handshake_hash: &[u8]) -> Vec<u8> {
    prf(master_secret, label, handshake_hash, VERIFY_DATA_LEN)
}

pub(crate) fn hmac(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    // unwrap: HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).unwrap();
    for part in parts {
        mac.update(part);
    }
    let bytes = mac.finalize().into_bytes();

    let mut output = [0u8; 32];
    output.copy_from_slice(&bytes);
    output
}

impl Drop for KeyBlock {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.initiator_enc.zeroize();
        self.responder_enc.zeroize();
        self.initiator_mac.zeroize();
        self.responder_mac.zeroize();
    }
}
