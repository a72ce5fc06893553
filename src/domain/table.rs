use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::phase::GamePhase;
use crate::domain::player::Player;
use crate::domain::{HandRef, TableId};

/// Локальный снимок состояния стола.
///
/// Это кэш того, что подтверждено цепочкой: мутирует его только трекер
/// и только после подтверждённого settlement'а.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableState {
    pub table_id: TableId,
    pub phase: GamePhase,
    /// Игроки в порядке мест (пусто, пока не было `StartGame`).
    pub players: Vec<Player>,
    pub hand_ref: HandRef,
    /// Какие улицы уже открыты в текущей раздаче.
    pub revealed_streets: BTreeSet<GamePhase>,
}

impl TableState {
    /// Пустой стол в лобби.
    pub fn new(table_id: TableId, hand_ref: HandRef) -> Self {
        Self {
            table_id,
            phase: GamePhase::Lobby,
            players: Vec::new(),
            hand_ref,
            revealed_streets: BTreeSet::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn seated_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_seated(&self, address: &str) -> bool {
        self.players.iter().any(|p| p.address == address)
    }
}
