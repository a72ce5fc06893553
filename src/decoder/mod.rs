//! Разбор settlement'а: достаём структурированные ответы контракта из логов.

pub mod payload;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::actions::Action;
use crate::errors::{ClientError, Result};
use crate::ledger::{Settlement, TxLog};

pub use payload::*;

/// Тип события, в которое контракт пишет свои атрибуты.
pub const CONTRACT_EVENT_TYPE: &str = "wasm";
/// Ключ атрибута с JSON-ответом.
pub const RESPONSE_KEY: &str = "response";
/// Лог предыдущей раздачи, который контракт прикладывает к `start_game`.
pub const PREVIOUS_HAND_LOG_KEY: &str = "previous_hand_log";

/// Один разобранный ответ контракта.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContractEvent {
    /// Индекс сообщения в транзакции (совпадает с индексом действия в батче).
    pub msg_index: u32,
    /// Сырой JSON из атрибута `response`.
    pub response: Value,
    /// Типизированный ответ, если тип знакомый.
    pub payload: Option<ResponsePayload>,
    pub previous_hand_log: Option<Value>,
}

/// Декодер ответов.
#[derive(Clone, Debug)]
pub struct ResponseDecoder {
    event_type: String,
    response_key: String,
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self {
            event_type: CONTRACT_EVENT_TYPE.to_string(),
            response_key: RESPONSE_KEY.to_string(),
        }
    }
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Все ответы контракта из settlement'а, в порядке логов.
    ///
    /// Функция чистая: повторный вызов на том же settlement'е даёт тот же результат.
    pub fn decode(&self, settlement: &Settlement) -> Result<Vec<ContractEvent>> {
        let logs = logs_of(settlement)?;
        let mut out = Vec::new();

        for log in logs.iter() {
            for event in log.events.iter().filter(|e| e.kind == self.event_type) {
                let Some(attr) = event.attributes.iter().find(|a| a.key == self.response_key)
                else {
                    continue;
                };

                let response: Value = serde_json::from_str(&attr.value).map_err(|e| {
                    ClientError::MalformedResponse {
                        msg_index: log.msg_index,
                        reason: format!("response не парсится как JSON: {e}"),
                    }
                })?;

                let previous_hand_log = event
                    .attributes
                    .iter()
                    .find(|a| a.key == PREVIOUS_HAND_LOG_KEY)
                    .map(|a| {
                        serde_json::from_str::<Value>(&a.value).map_err(|e| {
                            ClientError::MalformedResponse {
                                msg_index: log.msg_index,
                                reason: format!("previous_hand_log не парсится: {e}"),
                            }
                        })
                    })
                    .transpose()?;

                out.push(ContractEvent {
                    msg_index: log.msg_index,
                    payload: ResponsePayload::recognize(&response),
                    response,
                    previous_hand_log,
                });
            }
        }

        debug!(tx_hash = %settlement.tx_hash, events = out.len(), "settlement decoded");
        Ok(out)
    }

    /// То же, что `decode`, но дополнительно требует ответ на каждое действие,
    /// которое должно его вернуть. Без ответа трекер двигать нельзя.
    pub fn decode_for(&self, settlement: &Settlement, actions: &[Action]) -> Result<Vec<ContractEvent>> {
        let events = self.decode(settlement)?;

        for (idx, action) in actions.iter().enumerate() {
            if !action.expects_response() {
                continue;
            }
            let idx = idx as u32;
            if !events.iter().any(|e| e.msg_index == idx) {
                return Err(ClientError::MalformedResponse {
                    msg_index: idx,
                    reason: format!("нет атрибута `{}` для {action}", self.response_key),
                });
            }
        }

        Ok(events)
    }
}

/// Логи settlement'а; если структурированных нет, разбираем raw_log.
///
/// Пустой raw_log значит "событий нет", непустой, но не JSON, это битый ответ.
fn logs_of(settlement: &Settlement) -> Result<Vec<TxLog>> {
    if !settlement.logs.is_empty() {
        return Ok(settlement.logs.clone());
    }
    if settlement.raw_log.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<TxLog>>(&settlement.raw_log).map_err(|e| {
        ClientError::MalformedResponse {
            msg_index: 0,
            reason: format!("raw_log не парсится как лог транзакции: {e}"),
        }
    })
}
