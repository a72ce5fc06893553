use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use crate::domain::{GamePhase, TableId, TableState};
use crate::tracker::state_tracker::GameStateTracker;

/// Трекер стола под собственным async-мьютексом.
///
/// Мьютекс держится на всём цикле check → submit → advance.
pub type SharedTracker = Arc<Mutex<GameStateTracker>>;

/// Захваченный трекер, который на момент захвата лежит в реестре.
///
/// Пока гард жив, никто другой не может ни сдвинуть стол, ни выкинуть его
/// из реестра через `evict` / `release_unused`.
#[derive(Debug)]
pub struct LockedTracker {
    table_id: TableId,
    tracker: SharedTracker,
    guard: OwnedMutexGuard<GameStateTracker>,
    /// Трекер заведён этим захватом и ещё ни разу не подтверждался.
    created: bool,
}

impl LockedTracker {
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl Deref for LockedTracker {
    type Target = GameStateTracker;

    fn deref(&self) -> &GameStateTracker {
        &self.guard
    }
}

impl DerefMut for LockedTracker {
    fn deref_mut(&mut self) -> &mut GameStateTracker {
        &mut self.guard
    }
}

/// Реестр столов:
/// - хранит по трекеру на каждый TableId;
/// - столы независимы, общего изменяемого состояния между ними нет.
///
/// Порядок блокировок: мьютекс стола можно держать, беря лок реестра,
/// но не наоборот. Реестр ждёт мьютекс стола только через `try_lock`.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RwLock<HashMap<TableId, SharedTracker>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Трекер стола; если стола ещё нет, заводим его в лобби.
    pub async fn track(&self, table_id: TableId) -> SharedTracker {
        self.get_or_insert(table_id).await.0
    }

    /// Завести (или заменить) стол с заданным снимком.
    pub async fn track_state(&self, state: TableState) -> SharedTracker {
        let table_id = state.table_id;
        let tracker = Arc::new(Mutex::new(GameStateTracker::from_state(state)));
        self.tables
            .write()
            .await
            .insert(table_id, Arc::clone(&tracker));
        tracker
    }

    pub async fn get(&self, table_id: TableId) -> Option<SharedTracker> {
        self.tables.read().await.get(&table_id).cloned()
    }

    pub async fn has_table(&self, table_id: TableId) -> bool {
        self.tables.read().await.contains_key(&table_id)
    }

    /// Лежит ли в реестре именно этот трекер (а не выкинутый или заменённый).
    pub async fn is_current(&self, table_id: TableId, tracker: &SharedTracker) -> bool {
        self.tables
            .read()
            .await
            .get(&table_id)
            .is_some_and(|t| Arc::ptr_eq(t, tracker))
    }

    /// Захватить текущий трекер стола, если стол отслеживается.
    ///
    /// Если пока ждали мьютекс трекер выкинули или заменили, берём новый.
    pub async fn lock(&self, table_id: TableId) -> Option<LockedTracker> {
        loop {
            let tracker = self.get(table_id).await?;
            let guard = Arc::clone(&tracker).lock_owned().await;
            if self.is_current(table_id, &tracker).await {
                return Some(LockedTracker {
                    table_id,
                    tracker,
                    guard,
                    created: false,
                });
            }
            debug!(table_id, "tracker replaced while waiting, retrying");
        }
    }

    /// Захватить трекер стола, при необходимости заведя новый в лобби.
    ///
    /// Новый трекер, который так и не дошёл до подтверждённого `start_game`,
    /// нужно вернуть через `release_unused`.
    pub async fn lock_or_insert(&self, table_id: TableId) -> LockedTracker {
        loop {
            let (tracker, created) = self.get_or_insert(table_id).await;
            let guard = Arc::clone(&tracker).lock_owned().await;
            if self.is_current(table_id, &tracker).await {
                return LockedTracker {
                    table_id,
                    tracker,
                    guard,
                    created,
                };
            }
            debug!(table_id, "tracker replaced while waiting, retrying");
        }
    }

    /// Выкинуть захваченный трекер, не отпуская его мьютекс.
    ///
    /// Те, кто уже ждёт этот мьютекс, проснутся, увидят, что трекер не
    /// текущий, и возьмут свежий.
    pub async fn evict(&self, locked: LockedTracker) -> bool {
        let mut guard = self.tables.write().await;
        let current = guard
            .get(&locked.table_id)
            .is_some_and(|t| Arc::ptr_eq(t, &locked.tracker));
        if current {
            guard.remove(&locked.table_id);
        }
        drop(guard);
        drop(locked);
        current
    }

    /// Отпустить захват. Трекер, заведённый этим захватом и оставшийся в
    /// лобби, из реестра убирается: пустых столов после отказа не остаётся.
    pub async fn release_unused(&self, locked: LockedTracker) {
        if locked.created && locked.phase() == GamePhase::Lobby {
            let table_id = locked.table_id;
            if self.evict(locked).await {
                debug!(table_id, "unused tracker dropped");
            }
        }
    }

    /// Убрать стол из памяти.
    pub async fn remove(&self, table_id: TableId) -> Option<SharedTracker> {
        self.tables.write().await.remove(&table_id)
    }

    /// Выкинуть столы, чья раздача дошла до шоудауна.
    ///
    /// Занятые трекеры (кто-то держит мьютекс) пропускаются: их судьбу
    /// решит тот, кто держит. Возвращает выкинутые TableId по возрастанию.
    pub async fn evict_finished(&self) -> Vec<TableId> {
        let mut guard = self.tables.write().await;

        let mut finished: Vec<TableId> = guard
            .iter()
            .filter(|(_, t)| t.try_lock().map(|t| t.state().is_finished()).unwrap_or(false))
            .map(|(id, _)| *id)
            .collect();
        finished.sort_unstable();

        for id in &finished {
            guard.remove(id);
        }
        finished
    }

    /// Отсортированный список столов.
    pub async fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.is_empty()
    }

    async fn get_or_insert(&self, table_id: TableId) -> (SharedTracker, bool) {
        if let Some(t) = self.tables.read().await.get(&table_id) {
            return (Arc::clone(t), false);
        }
        let mut guard = self.tables.write().await;
        let mut created = false;
        let tracker = guard.entry(table_id).or_insert_with(|| {
            created = true;
            Arc::new(Mutex::new(GameStateTracker::new(table_id)))
        });
        (Arc::clone(tracker), created)
    }
}
