//! Fixed prime groups for the Diffie-Hellman and SRP exchanges.

use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;

// RFC 3526, 2048-bit MODP group 14.
const DH_PRIME: &str = "\
    FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1\
    29024E088A67CC74020BBEA63B139B22514A08798E3404DD\
    EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245\
    E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
    EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D\
    C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F\
    83655D23DCA3AD961C62F356208552BB9ED529077096966D\
    670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
    E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9\
    DE2BCBF6955817183995497CEA956AE515D2261898FA0510\
    15728E5A8AACAA68FFFFFFFFFFFFFFFF";

// RFC 5054, 2048-bit SRP group.
const SRP_PRIME: &str = "\
    AC6BDB41324A9A9BF166DE5E1389582FAF72B6651987EE07FC\
    3192943DB56050A37329CBB4A099ED8193E0757767A13DD52312\
    AB4B03310DCD7F48A9DA04FD50E8083969EDB767B0CF6095179A\
    163AB3661A05FBD5FAAAE82918A9962F0B93B855F97993EC975E\
    EAA80D740ADBF4FF747359D041D5C33EA71D281E446B14773BCA\
    97B43A23FB801676BD207A436C6481F1D2B9078717461A5B9D32\
    E688F87748544523B524B0D57D5EA77A2775D2ECFA032CFBDBF5\
    2FB3786160279004E57AE6AF874E7303CE53299CCC041C7BC308\
    D82A5698F3A8D0C38271AE35F8E9DBFBB694B5C803D89F7AE435\
    DE236D525F54759B65E372FCD68EF20FA7111F9E4AFF73";

static DH_GROUP: OnceLock<Group> = OnceLock::new();
static SRP_GROUP: OnceLock<Group> = OnceLock::new();

/// The group used by the anonymous, pubkey and ssh exchanges.
pub fn dh_group() -> &'static Group {
    DH_GROUP.get_or_init(|| Group::from_hex(DH_PRIME, 2))
}

/// The group used by the password (SRP) exchange.
pub fn srp_group() -> &'static Group {
    SRP_GROUP.get_or_init(|| Group::from_hex(SRP_PRIME, 2))
}

/// A prime group `{p, g, q}` where `q = (p - 1) / 2`.
pub struct Group {
    p: BigUint,
    g: BigUint,
    q: BigUint,
    p_size: usize,
    q_size: usize,
}

impl Group {
    fn from_hex(p: &str, g: u32) -> Self {
        // unwrap: the primes above are valid hex
        let p = BigUint::parse_bytes(p.as_bytes(), 16).unwrap();
        Self::new(p, BigUint::from(g))
    }

    pub fn new(p: BigUint, g: BigUint) -> Self {
        let q: BigUint = (&p - 1u32) >> 1;
        let p_size = byte_width(&p);
        let q_size = byte_width(&q);
        Group {
            p,
            g,
            q,
            p_size,
            q_size,
        }
    }

    #[inline(always)]
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    #[inline(always)]
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    #[inline(always)]
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Byte width of `p`. All group elements are encoded to this width.
    #[inline(always)]
    pub fn p_size(&self) -> usize {
        self.p_size
    }

    /// Byte width of `q`.
    #[inline(always)]
    pub fn q_size(&self) -> usize {
        self.q_size
    }

    /// Big-endian encoding of a group element padded to `p_size` bytes.
    pub fn encode(&self, value: &BigUint) -> Vec<u8> {
        encode_fixed(value, self.p_size)
    }

    /// Encoding of the generator, without padding.
    pub fn g_bytes(&self) -> Vec<u8> {
        self.g.to_bytes_be()
    }

    /// Sanity checks for a group handed to a crypto provider.
    pub fn validate(&self) -> Result<(), String> {
        let one = BigUint::from(1u32);
        if self.p <= BigUint::from(3u32) || !self.p.bit(0) {
            return Err("Group prime must be odd and larger than 3".to_string());
        }
        if self.g <= one || self.g >= self.p {
            return Err("Group generator out of range".to_string());
        }
        if self.q.bits() == 0 {
            return Err("Group order is zero".to_string());
        }
        Ok(())
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("p_bits", &self.p.bits())
            .field("g", &self.g)
            .finish()
    }
}

fn byte_width(value: &BigUint) -> usize {
    (value.bits() as usize).div_ceil(8)
}

/// Big-endian encoding of `value` left-padded with zeros to `width` bytes.
///
/// Values wider than `width` are returned unpadded.
pub fn encode_fixed(value: &BigUint, width: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes.len() >= width {
        return bytes;
    }
    let mut out = vec![0u8; width - bytes.len()];
    out.extend_from_slice(&bytes);
    out
}
