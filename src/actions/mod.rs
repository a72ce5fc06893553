//! Действия над столом и их wire-форма.
//!
//! Билдеры чистые: никакого I/O, никакой проверки легальности по фазе
//! (это делает `tracker`), только структурная валидация.

pub mod action;
pub mod builder;

pub use action::{Action, Street};
pub use builder::{random_request, reveal_street, showdown, start_game, MIN_PLAYERS};
