//! Доменная модель клиента: контракт, фазы раздачи, игроки, карты и снимок стола.

pub mod card;
pub mod contract;
pub mod deck;
pub mod phase;
pub mod player;
pub mod table;

// Идентификаторы в тех же типах, что и в схеме контракта.
pub type TableId = u32;
pub type HandRef = u32;

pub use card::*;
pub use contract::*;
pub use deck::*;
pub use phase::*;
pub use player::*;
pub use table::*;
