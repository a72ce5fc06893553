use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::domain::{ContractRef, TableId};
use crate::errors::{ClientError, Result};
use crate::ledger::{ContractQuery, LedgerClient, Signer};
use crate::permit::sign_doc::{SignOptions, StdSignDoc, StdSignature};

/// Деноминация комиссии по умолчанию.
pub const DEFAULT_FEE_DENOM: &str = "uscrt";

/// Что именно разрешает permit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermitScope {
    pub name: String,
    /// Адреса контрактов, к которым permit применим (порядок сохраняем).
    pub allowed_contracts: Vec<String>,
    pub permissions: Vec<String>,
    pub chain_id: String,
}

impl PermitScope {
    pub fn new(name: impl Into<String>, chain_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_contracts: Vec::new(),
            permissions: Vec::new(),
            chain_id: chain_id.into(),
        }
    }

    pub fn allow_contract(mut self, contract: &ContractRef) -> Self {
        self.allowed_contracts.push(contract.address().to_string());
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ClientError::InvalidPermitScope("пустое имя permit'а".into()));
        }
        if self.chain_id.trim().is_empty() {
            return Err(ClientError::InvalidPermitScope("пустой chain_id".into()));
        }
        if self.allowed_contracts.is_empty() {
            return Err(ClientError::InvalidPermitScope(
                "нет ни одного разрешённого контракта".into(),
            ));
        }
        if self.permissions.is_empty() {
            return Err(ClientError::InvalidPermitScope("пустой список permissions".into()));
        }
        Ok(())
    }
}

/// Параметры permit'а в wire-формате (`permit.params`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermitParams {
    pub permit_name: String,
    pub allowed_tokens: Vec<String>,
    pub chain_id: String,
    pub permissions: Vec<String>,
}

/// Подписанный permit.
///
/// Приватного ключа внутри нет, только адрес подписанта и подпись,
/// так что его можно спокойно отдавать исполнителю запросов.
/// Срок жизни локально не отслеживается: валидность решает контракт.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permit {
    params: PermitParams,
    signature: StdSignature,
    #[serde(skip)]
    signer_address: String,
}

impl Permit {
    pub fn name(&self) -> &str {
        &self.params.permit_name
    }

    pub fn params(&self) -> &PermitParams {
        &self.params
    }

    pub fn signature(&self) -> &StdSignature {
        &self.signature
    }

    pub fn signer_address(&self) -> &str {
        &self.signer_address
    }

    pub fn chain_id(&self) -> &str {
        &self.params.chain_id
    }

    pub fn allows_contract(&self, contract: &ContractRef) -> bool {
        self.params
            .allowed_tokens
            .iter()
            .any(|a| a == contract.address())
    }
}

/// Приватные запросы, которые контракт выполняет только под permit'ом.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrivateQuery {
    /// Карманные карты игрока-подписанта.
    GetPlayerCards { table_id: TableId },
    /// Полные приватные данные игрока (рука + секреты улиц).
    PlayerPrivateData { table_id: TableId },
}

impl PrivateQuery {
    pub fn to_query(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| ClientError::InvalidAction(format!("не удалось сериализовать запрос: {e}")))
    }
}

/// Выпуск и применение query permit'ов.
#[derive(Clone, Debug)]
pub struct PermitIssuer {
    fee_denom: String,
}

impl Default for PermitIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_DENOM)
    }
}

impl PermitIssuer {
    pub fn new(fee_denom: impl Into<String>) -> Self {
        Self {
            fee_denom: fee_denom.into(),
        }
    }

    /// Собрать sign doc для данного scope (без подписи).
    pub fn sign_doc(&self, scope: &PermitScope) -> StdSignDoc {
        let value = json!({
            "permit_name": scope.name,
            "allowed_tokens": scope.allowed_contracts,
            "permissions": scope.permissions,
        });
        StdSignDoc::query_permit(&scope.chain_id, &self.fee_denom, value)
    }

    /// Выпустить permit: построить sign doc и отдать его подписанту.
    pub async fn issue(&self, signer: &dyn Signer, scope: PermitScope) -> Result<Permit> {
        scope.validate()?;

        let doc = self.sign_doc(&scope);
        let address = signer.address().to_string();

        let signature = signer
            .sign_amino(&address, &doc, &SignOptions::permit())
            .await
            .map_err(|e| {
                warn!(signer = %address, permit = %scope.name, error = %e, "permit signing failed");
                ClientError::from(e)
            })?;

        info!(signer = %address, permit = %scope.name, "query permit issued");

        Ok(Permit {
            params: PermitParams {
                permit_name: scope.name,
                allowed_tokens: scope.allowed_contracts,
                chain_id: scope.chain_id,
                permissions: scope.permissions,
            },
            signature,
            signer_address: address,
        })
    }

    /// Выполнить приватный запрос под permit'ом через леджер.
    ///
    /// Запрос read-only, никаких блокировок не нужно.
    pub async fn query_with_permit(
        &self,
        ledger: &dyn LedgerClient,
        contract: &ContractRef,
        permit: &Permit,
        query: &PrivateQuery,
    ) -> Result<Value> {
        let envelope = authorized_query(permit, query.to_query()?);
        debug!(contract = contract.address(), permit = permit.name(), "permit query");
        let res = ledger
            .query_contract(&ContractQuery::new(contract, envelope))
            .await?;
        Ok(res)
    }
}

/// Обернуть произвольный запрос в конверт `with_permit`.
///
/// Чисто структурная операция: сети нет, проверки scope нет.
/// Это делает контракт, и успех тут не гарантирован.
pub fn authorized_query(permit: &Permit, query: Value) -> Value {
    json!({
        "with_permit": {
            "query": query,
            "permit": {
                "params": {
                    "permit_name": permit.params.permit_name,
                    "allowed_tokens": permit.params.allowed_tokens,
                    "chain_id": permit.params.chain_id,
                    "permissions": permit.params.permissions,
                },
                "signature": permit.signature,
            },
        },
    })
}
