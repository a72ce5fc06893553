use core::fmt;

use serde::{Deserialize, Serialize};

/// Игрок за столом: по сути адрес кошелька (берётся из Signer).
///
/// Порядок игроков за столом значим (порядок мест) и фиксируется на `StartGame`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Player {
    pub address: String,
}

impl Player {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

impl From<&str> for Player {
    fn from(s: &str) -> Self {
        Player::new(s)
    }
}

impl From<String> for Player {
    fn from(s: String) -> Self {
        Player { address: s }
    }
}
