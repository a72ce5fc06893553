use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Очередь отправок по адресу подписанта.
///
/// У аккаунта монотонный sequence, поэтому в полёте может быть только одна
/// транзакция от одного адреса. Вторая ждёт, а не гонится с первой.
#[derive(Debug, Default)]
pub struct SenderLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Захватить слот отправки для адреса. Слот освобождается при drop гарда.
    ///
    /// Заодно выкидываются слоты, которые никто не держит и не ждёт:
    /// ссылка на такой лежит только в карте.
    pub async fn acquire(&self, address: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            map.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(map.entry(address.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Сколько адресов сейчас отслеживается.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Занят ли сейчас адрес (для диагностики и тестов).
    pub async fn is_busy(&self, address: &str) -> bool {
        let map = self.locks.lock().await;
        map.get(address)
            .map(|l| l.try_lock().is_err())
            .unwrap_or(false)
    }
}
