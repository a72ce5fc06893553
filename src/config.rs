//! Конфиг клиента: chain id, деноминация комиссии, путь к дескриптору контракта,
//! лимит газа и режим броадкаста по умолчанию.
//!
//! Источники по приоритету: переменные окружения > JSON-файл > значения по умолчанию.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::ContractRef;
use crate::errors::{ClientError, Result};
use crate::executor::GasBudget;
use crate::ledger::BroadcastMode;
use crate::permit::DEFAULT_FEE_DENOM;

pub const ENV_CHAIN_ID: &str = "POKER_CHAIN_ID";
pub const ENV_FEE_DENOM: &str = "POKER_FEE_DENOM";
pub const ENV_CONTRACT_INFO: &str = "POKER_CONTRACT_INFO";
pub const ENV_GAS_LIMIT: &str = "POKER_GAS_LIMIT";
pub const ENV_BROADCAST_MODE: &str = "POKER_BROADCAST_MODE";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub chain_id: String,
    pub fee_denom: String,
    /// Где лежит `contractInfo.json`.
    pub contract_info_path: PathBuf,
    pub default_gas_limit: u64,
    pub broadcast_mode: BroadcastMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: "pulsar-3".to_string(),
            fee_denom: DEFAULT_FEE_DENOM.to_string(),
            contract_info_path: PathBuf::from("contractInfo.json"),
            default_gas_limit: 50_000,
            broadcast_mode: BroadcastMode::Block,
        }
    }
}

impl ClientConfig {
    /// Прочитать конфиг из JSON-файла (отсутствующие поля берутся по умолчанию).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            ClientError::Configuration(format!("не удалось прочитать {}: {e}", path.display()))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            ClientError::Configuration(format!("битый конфиг {}: {e}", path.display()))
        })
    }

    /// Значения по умолчанию, перекрытые переменными окружения.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Перекрыть поля переменными окружения, если они заданы.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// То же, но с произвольным источником значений (удобно в тестах).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup(ENV_CHAIN_ID) {
            self.chain_id = v;
        }
        if let Some(v) = lookup(ENV_FEE_DENOM) {
            self.fee_denom = v;
        }
        if let Some(v) = lookup(ENV_CONTRACT_INFO) {
            self.contract_info_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_GAS_LIMIT) {
            self.default_gas_limit = v.parse().map_err(|e| {
                ClientError::Configuration(format!("{ENV_GAS_LIMIT}={v}: {e}"))
            })?;
        }
        if let Some(v) = lookup(ENV_BROADCAST_MODE) {
            self.broadcast_mode = parse_mode(&v)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain_id.trim().is_empty() {
            return Err(ClientError::Configuration("пустой chain_id".into()));
        }
        if self.fee_denom.trim().is_empty() {
            return Err(ClientError::Configuration("пустой fee_denom".into()));
        }
        if self.default_gas_limit == 0 {
            return Err(ClientError::Configuration("нулевой лимит газа".into()));
        }
        Ok(())
    }

    pub fn load_contract(&self) -> Result<ContractRef> {
        ContractRef::load(&self.contract_info_path)
    }

    pub fn default_budget(&self) -> GasBudget {
        GasBudget::new(self.default_gas_limit, self.broadcast_mode)
    }
}

fn parse_mode(s: &str) -> Result<BroadcastMode> {
    match s.to_ascii_lowercase().as_str() {
        "block" => Ok(BroadcastMode::Block),
        "sync" => Ok(BroadcastMode::Sync),
        "async" => Ok(BroadcastMode::Async),
        other => Err(ClientError::Configuration(format!(
            "{ENV_BROADCAST_MODE}: неизвестный режим {other}"
        ))),
    }
}
