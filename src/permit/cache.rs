use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::Result;
use crate::ledger::Signer;
use crate::permit::issuer::{Permit, PermitIssuer, PermitScope};

/// Кэш permit'ов на время жизни процесса.
///
/// Ключ: (адрес подписанта, имя permit'а).
/// Серверный срок жизни не отслеживаем, `revoke` просто выбрасывает локальную копию.
#[derive(Debug, Default)]
pub struct PermitCache {
    permits: RwLock<HashMap<(String, String), Permit>>,
}

impl PermitCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, signer_address: &str, name: &str) -> Option<Permit> {
        self.permits
            .read()
            .await
            .get(&(signer_address.to_string(), name.to_string()))
            .cloned()
    }

    /// Вернуть уже выпущенный permit или выпустить новый.
    ///
    /// Подпись идёт без удержания блокировки: кошелёк может думать долго.
    /// Если параллельно успели выпустить такой же, оставляем первый.
    pub async fn get_or_issue(
        &self,
        issuer: &PermitIssuer,
        signer: &dyn Signer,
        scope: PermitScope,
    ) -> Result<Permit> {
        let key = (signer.address().to_string(), scope.name.clone());

        if let Some(p) = self.permits.read().await.get(&key) {
            return Ok(p.clone());
        }

        let permit = issuer.issue(signer, scope).await?;

        let mut guard = self.permits.write().await;
        let stored = guard.entry(key).or_insert(permit);
        Ok(stored.clone())
    }

    /// Забыть локальную копию permit'а. Возвращает true, если он был.
    pub async fn revoke(&self, signer_address: &str, name: &str) -> bool {
        let removed = self
            .permits
            .write()
            .await
            .remove(&(signer_address.to_string(), name.to_string()))
            .is_some();
        if removed {
            debug!(signer = signer_address, permit = name, "permit revoked locally");
        }
        removed
    }

    pub async fn clear(&self) {
        self.permits.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.permits.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.permits.read().await.is_empty()
    }
}
