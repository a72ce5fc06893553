use crate::actions::Action;
use crate::domain::{GamePhase, TableState};
use crate::errors::{ClientError, Result};

/// Проверка, легально ли отправлять действие при текущем (подтверждённом) состоянии стола.
///
/// - `StartGame` только из `Lobby`;
/// - `RevealStreet(Flop)` из `PreFlop`, `Turn` из `Flop`, `River` из `Turn`;
/// - `Showdown` из `River`, а при `all_in_showdown` ещё из `PreFlop`/`Flop`/`Turn`;
/// - `RandomRequest` к столу не привязан и разрешён всегда.
pub fn check_transition(state: &TableState, action: &Action) -> Result<()> {
    let Some(table_id) = action.table_id() else {
        return Ok(());
    };

    let illegal = |what: String| ClientError::IllegalTransition {
        table_id: state.table_id,
        action: what,
        phase: state.phase,
    };

    if table_id != state.table_id {
        return Err(illegal(format!("{action} для стола {table_id}")));
    }

    match action {
        Action::StartGame { .. } => {
            if state.phase != GamePhase::Lobby {
                return Err(illegal(action.to_string()));
            }
        }

        Action::RevealStreet { street, .. } => {
            let phase = street.phase();
            if phase.street_predecessor() != Some(state.phase)
                || state.revealed_streets.contains(&phase)
            {
                return Err(illegal(action.to_string()));
            }
        }

        Action::Showdown {
            show_cards,
            all_in_showdown,
            ..
        } => {
            let phase_ok = state.phase == GamePhase::River
                || (*all_in_showdown && state.phase.allows_all_in_showdown());
            if !phase_ok {
                return Err(illegal(action.to_string()));
            }

            // Вскрывать можно только тех, кто сидит за столом.
            if let Some(stranger) = show_cards.iter().find(|p| !state.is_seated(&p.address)) {
                return Err(illegal(format!("{action}: {stranger} не за столом")));
            }
        }

        Action::RandomRequest {} => {}
    }

    Ok(())
}

/// Булева форма `check_transition`.
pub fn can_submit(state: &TableState, action: &Action) -> bool {
    check_transition(state, action).is_ok()
}

/// Применить уже проверенное действие к снимку.
///
/// Вызывается только на копии (проекция батча) или после подтверждения.
pub(crate) fn apply_transition(state: &mut TableState, action: &Action) {
    match action {
        Action::StartGame {
            hand_ref, players, ..
        } => {
            state.players = players.clone();
            state.hand_ref = *hand_ref;
            state.revealed_streets.clear();
            state.phase = GamePhase::PreFlop;
        }
        Action::RevealStreet { street, .. } => {
            state.revealed_streets.insert(street.phase());
            state.phase = street.phase();
        }
        Action::Showdown { .. } => {
            state.phase = GamePhase::Showdown;
        }
        Action::RandomRequest {} => {}
    }
}
