use core::fmt;

use serde::{Deserialize, Serialize};

/// Фаза раздачи за столом (локальное зеркало серверного порядка).
///
/// `Lobby -> PreFlop -> Flop -> Turn -> River -> Showdown`, назад не ходим.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Lobby,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl GamePhase {
    /// Токен улицы, который ждёт `community_cards.game_state`.
    ///
    /// Есть только у фаз с общими картами.
    pub fn street_token(self) -> Option<&'static str> {
        match self {
            GamePhase::Flop => Some("flop"),
            GamePhase::Turn => Some("turn"),
            GamePhase::River => Some("river"),
            _ => None,
        }
    }

    /// Обратный маппинг токена улицы.
    pub fn from_street_token(token: &str) -> Option<Self> {
        match token {
            "flop" => Some(GamePhase::Flop),
            "turn" => Some(GamePhase::Turn),
            "river" => Some(GamePhase::River),
            _ => None,
        }
    }

    /// Фаза, из которой легально открыть эту улицу.
    pub fn street_predecessor(self) -> Option<Self> {
        match self {
            GamePhase::Flop => Some(GamePhase::PreFlop),
            GamePhase::Turn => Some(GamePhase::Flop),
            GamePhase::River => Some(GamePhase::Turn),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == GamePhase::Showdown
    }

    /// Фазы, из которых разрешён ранний шоудаун при олл-ине.
    pub fn allows_all_in_showdown(self) -> bool {
        matches!(self, GamePhase::PreFlop | GamePhase::Flop | GamePhase::Turn)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GamePhase::Lobby => "lobby",
            GamePhase::PreFlop => "pre_flop",
            GamePhase::Flop => "flop",
            GamePhase::Turn => "turn",
            GamePhase::River => "river",
            GamePhase::Showdown => "showdown",
        };
        write!(f, "{s}")
    }
}
