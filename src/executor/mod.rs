//! Отправка действий в контракт.
//!
//! Одно действие уходит через `execute_contract`, несколько через `broadcast`
//! одной атомарной транзакцией в заданном порядке. Ретраев нет никаких:
//! повтор в блокчейне рискует задублировать транзакцию, политику ретраев
//! выбирает вызывающий.

pub mod gas;
pub mod sender_locks;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::actions::Action;
use crate::decoder::{ContractEvent, ResponseDecoder};
use crate::domain::ContractRef;
use crate::errors::{ClientError, Result};
use crate::ledger::{ExecuteContractMsg, LedgerClient, Settlement, Signer};

pub use gas::{estimate_action_gas, GasBudget};
pub use sender_locks::SenderLocks;

/// Код ошибки "out of gas" в cosmos-sdk.
pub const OUT_OF_GAS_CODE: u32 = 11;

/// Результат отправки.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmissionResult {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
    /// true только для Block-режима: транзакция в блоке, логи есть.
    pub confirmed: bool,
    /// Пусто, если `confirmed == false`.
    pub decoded_events: Vec<ContractEvent>,
}

impl SubmissionResult {
    /// Ответ контракта на действие с индексом `msg_index` внутри батча.
    pub fn event_for(&self, msg_index: usize) -> Option<&ContractEvent> {
        self.decoded_events
            .iter()
            .find(|e| e.msg_index as usize == msg_index)
    }
}

/// Исполнитель транзакций.
pub struct TxExecutor {
    ledger: Arc<dyn LedgerClient>,
    decoder: ResponseDecoder,
    senders: SenderLocks,
}

impl TxExecutor {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            ledger,
            decoder: ResponseDecoder::new(),
            senders: SenderLocks::new(),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    pub fn sender_locks(&self) -> &SenderLocks {
        &self.senders
    }

    /// Отправить действия одной транзакцией.
    ///
    /// Действия не выкидываются и не переставляются. Атомарность батча
    /// обеспечивает контракт: либо всё, либо ничего.
    pub async fn submit(
        &self,
        signer: &dyn Signer,
        contract: &ContractRef,
        actions: &[Action],
        budget: GasBudget,
    ) -> Result<SubmissionResult> {
        if actions.is_empty() {
            return Err(ClientError::InvalidAction("пустой батч".into()));
        }

        let sender = signer.address();
        let msgs = actions
            .iter()
            .map(|a| a.to_execute_msg(sender, contract))
            .collect::<Result<Vec<ExecuteContractMsg>>>()?;
        let opts = budget.tx_options();

        // Одна транзакция в полёте на адрес.
        let _slot = self.senders.acquire(sender).await;

        info!(
            sender,
            contract = contract.address(),
            actions = actions.len(),
            gas_limit = budget.gas_limit,
            mode = ?budget.mode,
            "submitting"
        );

        let outcome = match msgs.as_slice() {
            [single] => self.ledger.execute_contract(single, &opts).await,
            many => self.ledger.broadcast(many, &opts).await,
        };

        let settlement = outcome.map_err(|e| {
            warn!(sender, error = %e, "submission did not settle");
            ClientError::from(e)
        })?;

        classify(&settlement, budget.gas_limit)?;

        let confirmed = budget.mode.is_confirming();
        let decoded_events = if confirmed {
            self.decoder.decode_for(&settlement, actions)?
        } else {
            Vec::new()
        };

        info!(
            tx_hash = %settlement.tx_hash,
            gas_used = settlement.gas_used,
            confirmed,
            "submission settled"
        );

        Ok(SubmissionResult {
            tx_hash: settlement.tx_hash,
            code: settlement.code,
            raw_log: settlement.raw_log,
            gas_wanted: settlement.gas_wanted,
            gas_used: settlement.gas_used,
            confirmed,
            decoded_events,
        })
    }
}

/// Разобрать код ответа леджера.
fn classify(settlement: &Settlement, gas_limit: u64) -> Result<()> {
    if settlement.code == OUT_OF_GAS_CODE
        || (settlement.code != 0 && settlement.gas_used > gas_limit)
    {
        warn!(tx_hash = %settlement.tx_hash, gas_limit, gas_used = settlement.gas_used, "out of gas");
        return Err(ClientError::OutOfGas {
            gas_limit,
            gas_used: settlement.gas_used,
        });
    }

    if !settlement.is_success() {
        warn!(tx_hash = %settlement.tx_hash, code = settlement.code, "transaction rejected");
        return Err(ClientError::Rejected {
            code: settlement.code,
            raw_log: settlement.raw_log.clone(),
        });
    }

    Ok(())
}
