use thiserror::Error;

use crate::domain::{GamePhase, HandRef, TableId};
use crate::executor::SubmissionResult;
use crate::ledger::{LedgerError, SignerError};

/// Ошибки клиентского слоя оркестрации.
///
/// Всё, что здесь перечислено, возвращается вызывающему коду.
/// Ядро ничего не "глотает" в лог и не продолжает работу как будто всё ок.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Нет/битый дескриптор контракта, пустой адрес или code hash.
    #[error("Ошибка конфигурации: {0}")]
    Configuration(String),

    /// Signer отказал (нет ключа, пользователь отменил подпись и т.п.).
    #[error("Ошибка подписи: {0}")]
    Signing(String),

    /// Структурно некорректное действие (арность, дубликаты, не та улица).
    #[error("Некорректное действие: {0}")]
    InvalidAction(String),

    /// Структурно некорректный scope для permit.
    #[error("Некорректный scope permit'а: {0}")]
    InvalidPermitScope(String),

    /// Локальная проверка легальности перехода не прошла, в сеть ничего не ушло.
    #[error("Недопустимый переход на столе {table_id}: {action} из фазы {phase:?}")]
    IllegalTransition {
        table_id: TableId,
        action: String,
        phase: GamePhase,
    },

    /// Сеть / нода недоступна. Решение о ретрае принимает вызывающий.
    #[error("Ошибка транспорта: {0}")]
    Transport(String),

    /// Леджер отклонил транзакцию из-за нехватки газа.
    #[error("Недостаточно газа: лимит {gas_limit}, израсходовано {gas_used}")]
    OutOfGas { gas_limit: u64, gas_used: u64 },

    /// Контракт/леджер отклонил транзакцию (не газ).
    #[error("Транзакция отклонена (code={code}): {raw_log}")]
    Rejected { code: u32, raw_log: String },

    /// Таймаут: исход неизвестен, нужно перечитать состояние контракта.
    #[error("Исход транзакции неизвестен (tx_hash={tx_hash:?})")]
    OutcomeUnknown { tx_hash: Option<String> },

    /// В settlement нет ожидаемого `response` или он не парсится.
    #[error("Некорректный ответ контракта (msg_index={msg_index}): {reason}")]
    MalformedResponse { msg_index: u32, reason: String },

    /// Локальный трекер разошёлся с цепочкой.
    ///
    /// Если транзакция при этом уже легла в блок, её результат лежит в
    /// `settled`: хэш и разобранные ответы не теряются.
    #[error("Устаревшее локальное состояние стола {table_id}: ожидали hand_ref={expected}, контракт вернул {actual}")]
    StaleState {
        table_id: TableId,
        expected: HandRef,
        actual: HandRef,
        settled: Option<Box<SubmissionResult>>,
    },
}

impl ClientError {
    /// Можно ли вызывающему повторить операцию (после паузы или действия пользователя).
    ///
    /// `OutOfGas` сюда не входит: лимит нужно переоценить, а не просто повторить.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Signing(_))
    }

    /// Результат транзакции, которая прошла, несмотря на ошибку.
    pub fn settled(&self) -> Option<&SubmissionResult> {
        match self {
            ClientError::StaleState { settled, .. } => settled.as_deref(),
            _ => None,
        }
    }
}

impl From<LedgerError> for ClientError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Transport(msg) => ClientError::Transport(msg),
            LedgerError::Timeout { tx_hash } => ClientError::OutcomeUnknown { tx_hash },
        }
    }
}

impl From<SignerError> for ClientError {
    fn from(err: SignerError) -> Self {
        ClientError::Signing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
