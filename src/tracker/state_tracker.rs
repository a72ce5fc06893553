use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::decoder::ContractEvent;
use crate::domain::{GamePhase, HandRef, TableId, TableState};
use crate::errors::{ClientError, Result};
use crate::tracker::transitions::{apply_transition, can_submit, check_transition};

/// Локальная машина состояний одного стола.
///
/// Двухфазная дисциплина: сначала `check` (до траты газа), потом
/// `advance`, только после подтверждённого settlement'а.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameStateTracker {
    state: TableState,
}

impl GameStateTracker {
    /// Новый стол в лобби с первым номером раздачи.
    pub fn new(table_id: TableId) -> Self {
        Self::with_hand_ref(table_id, 1)
    }

    pub fn with_hand_ref(table_id: TableId, hand_ref: HandRef) -> Self {
        Self {
            state: TableState::new(table_id, hand_ref),
        }
    }

    pub fn from_state(state: TableState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn table_id(&self) -> TableId {
        self.state.table_id
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn can_submit(&self, action: &Action) -> bool {
        can_submit(&self.state, action)
    }

    pub fn check(&self, action: &Action) -> Result<()> {
        check_transition(&self.state, action)
    }

    /// Проверить батч как последовательность: каждое действие этого стола
    /// проверяется на проекции после предыдущих. Сам трекер не меняется.
    ///
    /// Возвращает проекцию состояния после всего батча.
    pub fn check_batch(&self, actions: &[Action]) -> Result<TableState> {
        let mut projected = self.state.clone();
        for action in actions {
            match action.table_id() {
                Some(id) if id == projected.table_id => {
                    check_transition(&projected, action)?;
                    apply_transition(&mut projected, action);
                }
                // Чужие столы и random_request проверяют их собственные трекеры.
                _ => {}
            }
        }
        Ok(projected)
    }

    /// Сдвинуть фазу по подтверждённому действию.
    pub fn advance(&mut self, confirmed: &Action) -> Result<GamePhase> {
        check_transition(&self.state, confirmed)?;
        apply_transition(&mut self.state, confirmed);
        debug!(table_id = self.state.table_id, phase = %self.state.phase, "tracker advanced");
        Ok(self.state.phase)
    }

    /// Сдвинуть фазу, сверив ответ контракта с локальными ожиданиями.
    ///
    /// Если стол или hand_ref в ответе другие, локальное состояние устарело:
    /// возвращаем `StaleState` и ничего не меняем.
    pub fn advance_confirmed(
        &mut self,
        confirmed: &Action,
        event: Option<&ContractEvent>,
    ) -> Result<GamePhase> {
        if let Some(payload) = event.and_then(|e| e.payload.as_ref()) {
            let expected = match confirmed {
                Action::StartGame { hand_ref, .. } => *hand_ref,
                _ => self.state.hand_ref,
            };

            if payload.table_id() != self.state.table_id || payload.hand_ref() != expected {
                warn!(
                    table_id = self.state.table_id,
                    expected,
                    actual = payload.hand_ref(),
                    "contract response disagrees with local tracker"
                );
                return Err(ClientError::StaleState {
                    table_id: self.state.table_id,
                    expected,
                    actual: payload.hand_ref(),
                    settled: None,
                });
            }
        }

        self.advance(confirmed)
    }

    /// Вернуть стол в лобби под следующую раздачу.
    pub fn reset(&mut self) {
        self.state.phase = GamePhase::Lobby;
        self.state.hand_ref = self.state.hand_ref.wrapping_add(1);
        self.state.players.clear();
        self.state.revealed_streets = BTreeSet::new();
        info!(table_id = self.state.table_id, hand_ref = self.state.hand_ref, "table reset");
    }

    /// Принудительно заменить локальный снимок авторитетным (перечитанным из контракта).
    pub fn resync(&mut self, authoritative: TableState) -> Result<()> {
        if authoritative.table_id != self.state.table_id {
            return Err(ClientError::InvalidAction(format!(
                "снимок стола {} нельзя применить к столу {}",
                authoritative.table_id, self.state.table_id
            )));
        }
        info!(
            table_id = self.state.table_id,
            from = %self.state.phase,
            to = %authoritative.phase,
            "tracker resynchronized"
        );
        self.state = authoritative;
        Ok(())
    }
}
