use crate::crypto::{default_provider, CryptoProvider};
use crate::Error;

/// Channel configuration
#[derive(Debug, Clone)]
pub struct Config {
    max_record_len: usize,
    max_corrupted_records: Option<usize>,
    max_value_depth: usize,
    crypto_provider: CryptoProvider,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            max_record_len: 16 * 1024 * 1024,
            max_corrupted_records: Some(32),
            max_value_depth: 64,
            crypto_provider: None,
        }
    }

    /// Largest record payload we accept.
    ///
    /// A length prefix above this is a bad frame.
    #[inline(always)]
    pub fn max_record_len(&self) -> usize {
        self.max_record_len
    }

    /// Max number of consecutive records failing protection checks before
    /// giving up on the peer.
    ///
    /// `None` means keep dropping and re-reading forever.
    #[inline(always)]
    pub fn max_corrupted_records(&self) -> Option<usize> {
        self.max_corrupted_records
    }

    /// Max nesting of lists and maps in a received [`Value`](crate::Value).
    #[inline(always)]
    pub fn max_value_depth(&self) -> usize {
        self.max_value_depth
    }

    /// Cryptographic provider.
    ///
    /// Provides randomness and the groups used by the key exchanges.
    #[inline(always)]
    pub fn crypto_provider(&self) -> &CryptoProvider {
        &self.crypto_provider
    }
}

/// Builder for channel configuration.
pub struct ConfigBuilder {
    max_record_len: usize,
    max_corrupted_records: Option<usize>,
    max_value_depth: usize,
    crypto_provider: Option<CryptoProvider>,
}

impl ConfigBuilder {
    /// Set the largest record payload we accept.
    ///
    /// Defaults to 16 MiB.
    pub fn max_record_len(mut self, max_record_len: usize) -> Self {
        self.max_record_len = max_record_len;
        self
    }

    /// Set the max number of consecutive corrupted records to drop.
    ///
    /// `None` never gives up.
    /// Defaults to 32.
    pub fn max_corrupted_records(mut self, max: Option<usize>) -> Self {
        self.max_corrupted_records = max;
        self
    }

    /// Set the max nesting depth of received values.
    ///
    /// Defaults to 64.
    pub fn max_value_depth(mut self, depth: usize) -> Self {
        self.max_value_depth = depth;
        self
    }

    /// Set a custom crypto provider.
    ///
    /// If not set, OS randomness and the built-in groups are used.
    pub fn with_crypto_provider(mut self, provider: CryptoProvider) -> Self {
        self.crypto_provider = Some(provider);
        self
    }

    /// Build the configuration.
    ///
    /// This validates the crypto provider before returning the configuration.
    /// Returns `Error::Config` if the provider is unusable.
    pub fn build(self) -> Result<Config, Error> {
        let crypto_provider = self.crypto_provider.unwrap_or_else(default_provider);

        // Always validate the crypto provider
        crypto_provider.validate()?;

        if self.max_record_len == 0 {
            return Err(Error::Config("max_record_len must be positive".to_string()));
        }

        Ok(Config {
            max_record_len: self.max_record_len,
            max_corrupted_records: self.max_corrupted_records,
            max_value_depth: self.max_value_depth,
            crypto_provider,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        // The default provider only fails validation without OS randomness.
        Config::builder()
            .build()
            .expect("Default config should always validate")
    }
}
