//! Сессия клиента: check → build → submit → decode → advance поверх
//! трекеров, исполнителя и permit'ов.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::actions::Action;
use crate::config::ClientConfig;
use crate::domain::{ContractRef, TableId, TableState};
use crate::errors::{ClientError, Result};
use crate::executor::{GasBudget, SubmissionResult, TxExecutor};
use crate::ledger::{ContractQuery, LedgerClient, Signer};
use crate::permit::{Permit, PermitCache, PermitIssuer, PermitScope, PrivateQuery};
use crate::tracker::{GameStateTracker, LockedTracker, TableRegistry};

/// Связка всех компонентов для работы с одним контрактом.
pub struct PokerSession {
    contract: ContractRef,
    executor: TxExecutor,
    registry: TableRegistry,
    issuer: PermitIssuer,
    permits: PermitCache,
}

impl PokerSession {
    pub fn new(ledger: Arc<dyn LedgerClient>, contract: ContractRef) -> Self {
        Self {
            contract,
            executor: TxExecutor::new(ledger),
            registry: TableRegistry::new(),
            issuer: PermitIssuer::default(),
            permits: PermitCache::new(),
        }
    }

    /// Собрать сессию по конфигу: дескриптор контракта грузится с диска.
    pub fn from_config(ledger: Arc<dyn LedgerClient>, config: &ClientConfig) -> Result<Self> {
        let contract = config.load_contract()?;
        let mut session = Self::new(ledger, contract);
        session.issuer = PermitIssuer::new(config.fee_denom.clone());
        Ok(session)
    }

    pub fn contract(&self) -> &ContractRef {
        &self.contract
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &TxExecutor {
        &self.executor
    }

    /// Текущий подтверждённый снимок стола, если стол отслеживается.
    pub async fn table_state(&self, table_id: TableId) -> Option<TableState> {
        let locked = self.registry.lock(table_id).await?;
        Some(locked.state().clone())
    }

    /// Отправить действия и, если транзакция подтверждена, сдвинуть трекеры.
    ///
    /// 1. Трекеры затронутых столов блокируются по возрастанию TableId.
    /// 2. Батч проверяется локально: при нелегальном переходе в сеть ничего не уходит.
    /// 3. Отправка.
    /// 4. Подтверждённый результат применяется сначала к копиям, потом коммитится целиком.
    /// 5. Столы, дошедшие до шоудауна, выкидываются из реестра до снятия блокировки.
    ///
    /// Любая ошибка оставляет трекеры нетронутыми. Трекер нового стола
    /// остаётся в реестре только после подтверждённого `start_game`.
    pub async fn play(
        &self,
        signer: &dyn Signer,
        actions: &[Action],
        budget: GasBudget,
    ) -> Result<SubmissionResult> {
        let mut table_ids: Vec<TableId> = actions.iter().filter_map(Action::table_id).collect();
        table_ids.sort_unstable();
        table_ids.dedup();

        let mut locked = Vec::with_capacity(table_ids.len());
        for id in &table_ids {
            locked.push(self.registry.lock_or_insert(*id).await);
        }

        let outcome = self.play_locked(signer, actions, budget, &mut locked).await;

        for table in locked {
            if table.state().is_finished() {
                let table_id = table.table_id();
                if self.registry.evict(table).await {
                    info!(table_id, "hand finished, table evicted");
                }
            } else {
                self.registry.release_unused(table).await;
            }
        }

        outcome
    }

    async fn play_locked(
        &self,
        signer: &dyn Signer,
        actions: &[Action],
        budget: GasBudget,
        locked: &mut [LockedTracker],
    ) -> Result<SubmissionResult> {
        for table in locked.iter() {
            table.check_batch(actions)?;
        }

        let result = self
            .executor
            .submit(signer, &self.contract, actions, budget)
            .await?;

        if !result.confirmed {
            debug!(tx_hash = %result.tx_hash, "unconfirmed submission, trackers untouched");
            return Ok(result);
        }

        let mut staged: Vec<GameStateTracker> = locked.iter().map(|t| (**t).clone()).collect();
        for (idx, action) in actions.iter().enumerate() {
            let Some(table_id) = action.table_id() else {
                continue;
            };
            let Some(pos) = locked.iter().position(|t| t.table_id() == table_id) else {
                continue;
            };
            if let Err(err) = staged[pos].advance_confirmed(action, result.event_for(idx)) {
                // Транзакция уже в блоке: отдаём её результат вместе с ошибкой.
                return Err(match err {
                    ClientError::StaleState {
                        table_id,
                        expected,
                        actual,
                        ..
                    } => ClientError::StaleState {
                        table_id,
                        expected,
                        actual,
                        settled: Some(Box::new(result)),
                    },
                    other => other,
                });
            }
        }

        for (table, next) in locked.iter_mut().zip(staged) {
            **table = next;
        }

        Ok(result)
    }

    /// Перечитанный из контракта снимок стола заменяет локальный.
    pub async fn refresh_table(&self, authoritative: TableState) -> Result<()> {
        let mut locked = self.registry.lock_or_insert(authoritative.table_id).await;
        locked.resync(authoritative)
    }

    /// Подготовить стол к следующей раздаче.
    ///
    /// `false`, если стол не отслеживается (например, уже выкинут после
    /// шоудауна): следующий `start_game` и так начнётся из лобби.
    pub async fn reset_table(&self, table_id: TableId) -> bool {
        match self.registry.lock(table_id).await {
            Some(mut locked) => {
                locked.reset();
                true
            }
            None => false,
        }
    }

    /// Permit из кэша или новый.
    pub async fn permit(&self, signer: &dyn Signer, scope: PermitScope) -> Result<Permit> {
        self.permits.get_or_issue(&self.issuer, signer, scope).await
    }

    pub async fn revoke_permit(&self, signer_address: &str, name: &str) -> bool {
        self.permits.revoke(signer_address, name).await
    }

    /// Приватный запрос под permit'ом.
    pub async fn private_query(&self, permit: &Permit, query: &PrivateQuery) -> Result<Value> {
        self.issuer
            .query_with_permit(self.executor.ledger().as_ref(), &self.contract, permit, query)
            .await
    }

    /// Публичный read-only запрос.
    pub async fn query(&self, query: Value) -> Result<Value> {
        let res = self
            .executor
            .ledger()
            .query_contract(&ContractQuery::new(&self.contract, query))
            .await?;
        Ok(res)
    }
}
