use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::ledger::{Signer, SignerError};
use crate::permit::{PubKey, SignOptions, StdSignDoc, StdSignature};

/// Тип публичного ключа, который кладёт кошелёк в подпись.
pub const SECP256K1_PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";

/// Детерминированный подписант для тестов и локального запуска.
///
/// Настоящей криптографии нет: "подпись" = hex(SHA-256(address || digest)),
/// а вместо публичного ключа лежит адрес. `InMemoryLedger` умеет это проверять.
#[derive(Clone, Debug)]
pub struct DeterministicSigner {
    address: String,
    /// Эмулирует отказ пользователя подписывать.
    rejecting: bool,
}

impl DeterministicSigner {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            rejecting: false,
        }
    }

    /// Подписант, который на всё отвечает отказом.
    pub fn rejecting(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            rejecting: true,
        }
    }
}

/// Эмулированная подпись sign doc'а от имени `address`.
pub fn emulated_signature(address: &str, doc: &StdSignDoc) -> Result<StdSignature, SignerError> {
    let digest = doc
        .digest()
        .map_err(|e| SignerError::Rejected(format!("sign doc не сериализуется: {e}")))?;

    let mut hasher = Sha256::new();
    hasher.update(address.as_bytes());
    hasher.update(digest);
    let sig = hasher.finalize();

    Ok(StdSignature {
        pub_key: PubKey {
            kind: SECP256K1_PUBKEY_TYPE.to_string(),
            value: address.to_string(),
        },
        signature: to_hex(&sig),
    })
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl Signer for DeterministicSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_amino(
        &self,
        signer_address: &str,
        doc: &StdSignDoc,
        _options: &SignOptions,
    ) -> Result<StdSignature, SignerError> {
        if signer_address != self.address {
            return Err(SignerError::NoKey(signer_address.to_string()));
        }
        if self.rejecting {
            return Err(SignerError::Rejected("пользователь отменил подпись".into()));
        }
        emulated_signature(&self.address, doc)
    }
}
