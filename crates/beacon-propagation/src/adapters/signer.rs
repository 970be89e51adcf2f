//! Ed25519 signer adapter.

use shared_crypto::{AsSigningKey, AsVerifyingKey};
use shared_types::{current_timestamp, IsdAs};

use crate::errors::SignError;
use crate::ports::outbound::BeaconSigner;

/// Signs segments with a locally held AS key.
#[derive(Debug)]
pub struct KeySigner {
    ia: IsdAs,
    key: AsSigningKey,
}

impl KeySigner {
    pub fn new(ia: IsdAs, key: AsSigningKey) -> Self {
        Self { ia, key }
    }

    pub fn verifying_key(&self) -> AsVerifyingKey {
        self.key.verifying_key()
    }
}

impl BeaconSigner for KeySigner {
    fn ia(&self) -> IsdAs {
        self.ia
    }

    fn expires_at(&self) -> u64 {
        self.key.not_after()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignError> {
        let now = current_timestamp();
        if now >= self.key.not_after() {
            return Err(SignError::KeyUnavailable(format!(
                "key for {} expired at {}",
                self.ia,
                self.key.not_after()
            )));
        }
        Ok(self.key.sign(message).to_vec())
    }
}
