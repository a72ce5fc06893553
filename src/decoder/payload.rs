use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Card, GamePhase, HandRef, TableId};

/// Ответ `start_game`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartGameResponse {
    pub table_id: TableId,
    pub hand_ref: HandRef,
    pub players: Vec<String>,
}

/// Ответ `community_cards`: открытые карты улицы.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommunityCardsResponse {
    pub table_id: TableId,
    pub hand_ref: HandRef,
    pub game_state: GamePhase,
    pub community_cards: Vec<Card>,
}

/// Ответ `showdown`.
///
/// При олл-ин шоудауне контракт досылает ещё не открытые общие карты.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowdownResponse {
    pub table_id: TableId,
    pub hand_ref: HandRef,
    /// (id игрока, его карманные карты).
    pub players_cards: Vec<(String, Vec<Card>)>,
    #[serde(default)]
    pub community_cards: Option<Vec<Card>>,
}

/// Типизированный ответ контракта (JSON с тегом `type`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    StartGame(StartGameResponse),
    CommunityCards(CommunityCardsResponse),
    Showdown(ShowdownResponse),
}

impl ResponsePayload {
    /// Распознать ответ. Незнакомые типы не ошибка: сырой JSON остаётся у вызывающего.
    pub fn recognize(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn table_id(&self) -> TableId {
        match self {
            ResponsePayload::StartGame(r) => r.table_id,
            ResponsePayload::CommunityCards(r) => r.table_id,
            ResponsePayload::Showdown(r) => r.table_id,
        }
    }

    pub fn hand_ref(&self) -> HandRef {
        match self {
            ResponsePayload::StartGame(r) => r.hand_ref,
            ResponsePayload::CommunityCards(r) => r.hand_ref,
            ResponsePayload::Showdown(r) => r.hand_ref,
        }
    }
}

/// Приватные данные игрока (ответ на запрос под permit'ом).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerDataResponse {
    pub table_id: TableId,
    pub hand_ref: HandRef,
    pub hand: Vec<Card>,
    #[serde(default)]
    pub hand_seed: u64,
    #[serde(default)]
    pub flop_secret: u64,
    #[serde(default)]
    pub turn_secret: u64,
    #[serde(default)]
    pub river_secret: u64,
}
