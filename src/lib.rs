//! Клиент покерного контракта в Secret Network.
//!
//! Собирает действия над столом (`start_game`, улицы, шоудаун), проверяет
//! их против локального зеркала фаз, отправляет транзакциями и разбирает
//! ответы контракта. Приватные данные игрока читаются под query permit'ом.
//!
//! Сеть и кошелёк сюда не входят: их дают реализации `ledger::LedgerClient`
//! и `ledger::Signer`. Для тестов и dev-CLI есть эмулятор в `infra`.

pub mod actions;
pub mod config;
pub mod decoder;
pub mod domain;
pub mod errors;
pub mod executor;
pub mod infra;
pub mod ledger;
pub mod permit;
pub mod session;
pub mod tracker;

pub use actions::Action;
pub use config::ClientConfig;
pub use domain::{ContractRef, GamePhase, TableState};
pub use errors::{ClientError, Result};
pub use executor::{GasBudget, SubmissionResult, TxExecutor};
pub use session::PokerSession;
pub use tracker::{GameStateTracker, TableRegistry};
