use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ContractRef;

/// Режим броадкаста.
///
/// - `Block`: ждём включения в блок, получаем логи (подтверждение);
/// - `Sync`: только проверка в мемпуле;
/// - `Async`: вообще ничего не ждём.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BroadcastMode {
    #[default]
    Block,
    Sync,
    Async,
}

impl BroadcastMode {
    /// Даёт ли режим подтверждённый settlement с логами.
    pub fn is_confirming(self) -> bool {
        self == BroadcastMode::Block
    }
}

/// Параметры отправки транзакции.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxOptions {
    pub gas_limit: u64,
    pub broadcast_mode: BroadcastMode,
}

/// Одно сообщение `MsgExecuteContract`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecuteContractMsg {
    pub sender: String,
    pub contract_address: String,
    pub code_hash: String,
    pub msg: Value,
}

/// Read-only запрос к контракту.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContractQuery {
    pub contract_address: String,
    pub code_hash: String,
    pub query: Value,
}

impl ContractQuery {
    pub fn new(contract: &ContractRef, query: Value) -> Self {
        Self {
            contract_address: contract.address().to_string(),
            code_hash: contract.code_hash().to_string(),
            query,
        }
    }
}

/// Атрибут события.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxAttribute {
    pub key: String,
    pub value: String,
}

/// Событие из лога транзакции.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<TxAttribute>,
}

/// Лог одного сообщения внутри транзакции.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxLog {
    #[serde(default)]
    pub msg_index: u32,
    #[serde(default)]
    pub events: Vec<TxEvent>,
}

/// Результат обработанной леджером транзакции.
///
/// Поля названы как в JSON-ответе клиента ноды, так что сохранённый
/// ответ (`flip_tx.json` и т.п.) можно прочитать напрямую.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    #[serde(rename = "transactionHash")]
    pub tx_hash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub gas_wanted: u64,
    #[serde(default)]
    pub gas_used: u64,
    #[serde(rename = "jsonLog", default)]
    pub logs: Vec<TxLog>,
}

impl Settlement {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}
