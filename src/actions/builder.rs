use std::collections::HashSet;

use tracing::debug;

use crate::actions::action::{Action, Street};
use crate::domain::{GamePhase, HandRef, Player, TableId};
use crate::errors::{ClientError, Result};

/// Минимум игроков для старта раздачи.
pub const MIN_PLAYERS: usize = 2;

/// `start_game`: игроки в порядке мест, минимум двое, адреса уникальны.
pub fn start_game<P: Into<Player>>(
    table_id: TableId,
    players: impl IntoIterator<Item = P>,
    hand_ref: HandRef,
    folded_win: bool,
) -> Result<Action> {
    let players: Vec<Player> = players.into_iter().map(Into::into).collect();

    if players.len() < MIN_PLAYERS {
        return Err(ClientError::InvalidAction(format!(
            "start_game: нужно минимум {MIN_PLAYERS} игрока, передано {}",
            players.len()
        )));
    }
    ensure_unique("start_game", &players)?;

    debug!(table_id, hand_ref, players = players.len(), "start_game built");

    Ok(Action::StartGame {
        table_id,
        hand_ref,
        folded_win,
        players,
    })
}

/// `community_cards`: только Flop / Turn / River.
pub fn reveal_street(table_id: TableId, phase: GamePhase) -> Result<Action> {
    let street = Street::from_phase(phase).ok_or_else(|| {
        ClientError::InvalidAction(format!(
            "community_cards: фаза {phase} не открывает общие карты"
        ))
    })?;

    Ok(Action::RevealStreet { table_id, street })
}

/// `showdown`: игроки, чьи карты вскрываются, без повторов.
pub fn showdown<P: Into<Player>>(
    table_id: TableId,
    shown_players: impl IntoIterator<Item = P>,
    all_in_showdown: bool,
) -> Result<Action> {
    let show_cards: Vec<Player> = shown_players.into_iter().map(Into::into).collect();
    ensure_unique("showdown", &show_cards)?;

    Ok(Action::Showdown {
        table_id,
        show_cards,
        all_in_showdown,
    })
}

/// `random_request`: без полей.
pub fn random_request() -> Action {
    Action::RandomRequest {}
}

fn ensure_unique(method: &str, players: &[Player]) -> Result<()> {
    let mut seen = HashSet::with_capacity(players.len());
    for p in players {
        if p.address.trim().is_empty() {
            return Err(ClientError::InvalidAction(format!("{method}: пустой адрес игрока")));
        }
        if !seen.insert(p.address.as_str()) {
            return Err(ClientError::InvalidAction(format!(
                "{method}: адрес {} повторяется",
                p.address
            )));
        }
    }
    Ok(())
}
