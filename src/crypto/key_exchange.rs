use num_bigint::BigUint;

use super::group::Group;
use super::provider::CryptoProvider;
use crate::Error;

/// Ephemeral finite field Diffie-Hellman over one of the fixed groups.
pub struct DhKeyExchange {
    group: &'static Group,

    /// Our private key (random exponent in `[0, q)`)
    private_key: BigUint,

    /// g^private_key mod p
    public_key: BigUint,
}

impl DhKeyExchange {
    pub fn new(group: &'static Group, provider: &CryptoProvider) -> Result<Self, Error> {
        let private_key = provider.random_exponent(group)?;

        // Compute public key as g^private_key mod p
        let public_key = group.g().modpow(&private_key, group.p());

        Ok(DhKeyExchange {
            group,
            private_key,
            public_key,
        })
    }

    pub fn public_key(&self) -> &BigUint {
        &self.public_key
    }

    /// Public key encoded to the width of the group prime.
    pub fn public_bytes(&self) -> Vec<u8> {
        self.group.encode(&self.public_key)
    }

    /// ZZ = peer_public^private_key mod p, encoded to the width of the prime.
    pub fn compute_shared_secret(&self, peer_public: &BigUint) -> Result<Vec<u8>, String> {
        check_public_value(self.group, peer_public)?;

        let shared_secret = peer_public.modpow(&self.private_key, self.group.p());

        Ok(self.group.encode(&shared_secret))
    }
}

/// Peer values must lie in `[2, p - 2]`; 0, 1 and p - 1 force a trivial secret.
pub fn check_public_value(group: &Group, value: &BigUint) -> Result<(), String> {
    let two = BigUint::from(2u32);
    let upper = group.p() - &two;
    if value < &two || value > &upper {
        return Err("DH public value out of range".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::provider::default_provider;

    #[test]
    fn both_sides_agree() {
        let provider = default_provider();
        let a = DhKeyExchange::new(provider.dh_group, &provider).unwrap();
        let b = DhKeyExchange::new(provider.dh_group, &provider).unwrap();

        let zz_a = a.compute_shared_secret(b.public_key()).unwrap();
        let zz_b = b.compute_shared_secret(a.public_key()).unwrap();

        assert_eq!(zz_a, zz_b);
        assert_eq!(zz_a.len(), provider.dh_group.p_size());
        assert_eq!(a.public_bytes().len(), provider.dh_group.p_size());
    }

    #[test]
    fn rejects_degenerate_values() {
        let provider = default_provider();
        let group = provider.dh_group;
        let a = DhKeyExchange::new(group, &provider).unwrap();

        assert!(a.compute_shared_secret(&BigUint::from(0u32)).is_err());
        assert!(a.compute_shared_secret(&BigUint::from(1u32)).is_err());
        assert!(a.compute_shared_secret(&(group.p() - 1u32)).is_err());
        assert!(a.compute_shared_secret(group.p()).is_err());
        assert!(a.compute_shared_secret(&BigUint::from(2u32)).is_ok());
    }
}
