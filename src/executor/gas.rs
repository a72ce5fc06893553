use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::ledger::{BroadcastMode, TxOptions};

/// Базовая стоимость транзакции, не зависящая от сообщений.
pub const BASE_TX_GAS: u64 = 10_000;

/// Наблюдаемые полосы стоимости по типам сообщений.
pub const START_GAME_GAS: u64 = 60_000;
pub const REVEAL_STREET_GAS: u64 = 40_000;
pub const SHOWDOWN_GAS: u64 = 40_000;
pub const RANDOM_REQUEST_GAS: u64 = 30_000;

/// Бюджет отправки: жёсткий потолок газа и режим броадкаста.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GasBudget {
    pub gas_limit: u64,
    pub mode: BroadcastMode,
}

impl GasBudget {
    pub fn new(gas_limit: u64, mode: BroadcastMode) -> Self {
        Self { gas_limit, mode }
    }

    /// Блокирующий броадкаст с заданным лимитом.
    pub fn block(gas_limit: u64) -> Self {
        Self::new(gas_limit, BroadcastMode::Block)
    }

    /// Рекомендация по лимиту для набора действий.
    ///
    /// Только подсказка: исполнитель сам ничего не подбирает и не поднимает.
    pub fn suggested(actions: &[Action], mode: BroadcastMode) -> Self {
        let gas_limit = actions
            .iter()
            .map(estimate_action_gas)
            .fold(BASE_TX_GAS, u64::saturating_add);
        Self { gas_limit, mode }
    }

    pub fn tx_options(&self) -> TxOptions {
        TxOptions {
            gas_limit: self.gas_limit,
            broadcast_mode: self.mode,
        }
    }
}

/// Оценка газа на одно сообщение.
pub fn estimate_action_gas(action: &Action) -> u64 {
    match action {
        Action::StartGame { .. } => START_GAME_GAS,
        Action::RevealStreet { .. } => REVEAL_STREET_GAS,
        Action::Showdown { .. } => SHOWDOWN_GAS,
        Action::RandomRequest {} => RANDOM_REQUEST_GAS,
    }
}
