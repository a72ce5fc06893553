//! Внешние капабилити, которые ядро получает из окружения:
//! - `LedgerClient`: отправка транзакций и read-only запросы к ноде;
//! - `Signer`: адрес и amino-подпись.
//!
//! Реализации (RPC, кошельки) живут вне крейта; для тестов есть `infra`.

pub mod types;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::permit::{SignOptions, StdSignDoc, StdSignature};

pub use types::*;

/// Ошибки уровня леджера.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Нода / сеть недоступна, запрос не дошёл или ответ не пришёл.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Таймаут ожидания: транзакция могла как попасть в блок, так и нет.
    #[error("timed out waiting for settlement (tx_hash={tx_hash:?})")]
    Timeout { tx_hash: Option<String> },
}

/// Ошибки подписанта.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signing rejected: {0}")]
    Rejected(String),

    #[error("no key available for {0}")]
    NoKey(String),
}

/// Клиент леджера.
///
/// Ретраев внутри нет и быть не должно: повторная отправка в блокчейн
/// рискует задублировать транзакцию.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Отправить одно сообщение.
    async fn execute_contract(
        &self,
        msg: &ExecuteContractMsg,
        opts: &TxOptions,
    ) -> Result<Settlement, LedgerError>;

    /// Отправить несколько сообщений одной атомарной транзакцией (порядок важен).
    async fn broadcast(
        &self,
        msgs: &[ExecuteContractMsg],
        opts: &TxOptions,
    ) -> Result<Settlement, LedgerError>;

    /// Read-only запрос.
    async fn query_contract(&self, query: &ContractQuery) -> Result<Value, LedgerError>;
}

/// Подписант (кошелёк).
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;

    async fn sign_amino(
        &self,
        signer_address: &str,
        doc: &StdSignDoc,
        options: &SignOptions,
    ) -> Result<StdSignature, SignerError>;
}
