use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ContractRef, GamePhase, HandRef, Player, TableId};
use crate::errors::{ClientError, Result};
use crate::ledger::ExecuteContractMsg;

/// Улица с общими картами. Отдельный тип, чтобы `RevealStreet(Lobby)`
/// нельзя было даже сконструировать.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Flop,
    Turn,
    River,
}

impl Street {
    pub fn phase(self) -> GamePhase {
        match self {
            Street::Flop => GamePhase::Flop,
            Street::Turn => GamePhase::Turn,
            Street::River => GamePhase::River,
        }
    }

    pub fn from_phase(phase: GamePhase) -> Option<Self> {
        match phase {
            GamePhase::Flop => Some(Street::Flop),
            GamePhase::Turn => Some(Street::Turn),
            GamePhase::River => Some(Street::River),
            _ => None,
        }
    }
}

/// Действие над контрактом.
///
/// Сериализуется ровно в ту форму, которую ждёт `ExecuteMsg` контракта:
/// `{"start_game": {...}}`, `{"community_cards": {...}}` и т.д.
/// Собирается через билдеры из `actions::builder`, после сборки не меняется.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    #[serde(rename = "start_game")]
    StartGame {
        table_id: TableId,
        hand_ref: HandRef,
        folded_win: bool,
        /// В порядке мест.
        players: Vec<Player>,
    },

    #[serde(rename = "community_cards")]
    RevealStreet {
        table_id: TableId,
        #[serde(rename = "game_state")]
        street: Street,
    },

    #[serde(rename = "showdown")]
    Showdown {
        table_id: TableId,
        show_cards: Vec<Player>,
        all_in_showdown: bool,
    },

    /// Запрос случайного числа у контракта (без привязки к столу).
    #[serde(rename = "random_request")]
    RandomRequest {},
}

impl Action {
    /// К какому столу относится действие (None для `RandomRequest`).
    pub fn table_id(&self) -> Option<TableId> {
        match self {
            Action::StartGame { table_id, .. }
            | Action::RevealStreet { table_id, .. }
            | Action::Showdown { table_id, .. } => Some(*table_id),
            Action::RandomRequest {} => None,
        }
    }

    /// Имя сообщения в схеме контракта.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Action::StartGame { .. } => "start_game",
            Action::RevealStreet { .. } => "community_cards",
            Action::Showdown { .. } => "showdown",
            Action::RandomRequest {} => "random_request",
        }
    }

    /// Фаза, в которую переводит стол подтверждённое действие.
    pub fn target_phase(&self) -> Option<GamePhase> {
        match self {
            Action::StartGame { .. } => Some(GamePhase::PreFlop),
            Action::RevealStreet { street, .. } => Some(street.phase()),
            Action::Showdown { .. } => Some(GamePhase::Showdown),
            Action::RandomRequest {} => None,
        }
    }

    /// Должен ли контракт вернуть атрибут `response` на это действие.
    pub fn expects_response(&self) -> bool {
        !matches!(self, Action::RandomRequest {})
    }

    /// JSON-сообщение для контракта.
    pub fn to_msg(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| {
            ClientError::InvalidAction(format!("не удалось сериализовать {}: {e}", self.wire_name()))
        })
    }

    /// Обернуть в `MsgExecuteContract` от имени `sender`.
    pub fn to_execute_msg(&self, sender: &str, contract: &ContractRef) -> Result<ExecuteContractMsg> {
        Ok(ExecuteContractMsg {
            sender: sender.to_string(),
            contract_address: contract.address().to_string(),
            code_hash: contract.code_hash().to_string(),
            msg: self.to_msg()?,
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::RevealStreet { street, .. } => {
                write!(f, "{}({})", self.wire_name(), street.phase())
            }
            Action::Showdown {
                all_in_showdown: true,
                ..
            } => write!(f, "showdown(all_in)"),
            _ => write!(f, "{}", self.wire_name()),
        }
    }
}
