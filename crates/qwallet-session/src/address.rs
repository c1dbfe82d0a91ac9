//! Mock address and private-key generation.
//!
//! Addresses are `prefix + N` lowercase hex characters for every currency,
//! with `N` taken from the catalog. Real encodings (bech32, base58, SS58)
//! differ; the hex alphabet is a deliberate simplification for a mock.

use std::sync::Arc;

use qwallet_core::constants::{PRIVATE_KEY_HEX_LEN, PRIVATE_KEY_PREFIX};
use qwallet_core::{CurrencyCatalog, CurrencyCode, RandomSource, WalletIdentity};

/// Builds [`WalletIdentity`] values from catalog address shapes.
#[derive(Debug, Clone)]
pub struct AddressFactory {
    catalog: Arc<CurrencyCatalog>,
}

impl AddressFactory {
    pub fn new(catalog: Arc<CurrencyCatalog>) -> Self {
        Self { catalog }
    }

    /// Create an identity for `currency`, drawing randomness from `rng`.
    ///
    /// Unknown currencies use the catalog's fallback shape; the identity
    /// still records the requested code.
    pub fn create(&self, currency: &CurrencyCode, rng: &mut dyn RandomSource) -> WalletIdentity {
        let entry = self.catalog.lookup(currency);
        let address = format!("{}{}", entry.address_prefix, random_hex(rng, entry.address_length));
        let private_key = format!("{PRIVATE_KEY_PREFIX}{}", random_hex(rng, PRIVATE_KEY_HEX_LEN));
        WalletIdentity::new(address, private_key, currency.clone())
    }

    pub fn catalog(&self) -> &CurrencyCatalog {
        &self.catalog
    }
}

/// `len` random lowercase hex characters.
fn random_hex(rng: &mut dyn RandomSource, len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    rng.fill_bytes(&mut bytes);
    let mut text = hex::encode(bytes);
    text.truncate(len);
    text
}
