//! Инфраструктура для тестов и локального запуска без ноды:
//! - `InMemoryLedger`: эмулятор ноды с покерным контрактом;
//! - `DeterministicSigner`: подписант без настоящих ключей.

pub mod ledger;
pub mod signer;

pub use ledger::{InMemoryLedger, LedgerFault, CONTRACT_ERROR_CODE, PARSE_ERROR_CODE};
pub use signer::{emulated_signature, DeterministicSigner, SECP256K1_PUBKEY_TYPE};
