//! Ссылка на задеплоенный контракт и загрузка её дескриптора с диска.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ClientError, Result};

/// Неизменяемый идентификатор контракта: адрес + code hash.
///
/// Оба поля обязаны быть непустыми, это проверяется при создании.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ContractRef {
    address: String,
    code_hash: String,
}

/// Формат файла `contractInfo.json`, который пишет деплой-скрипт.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDescriptor {
    pub contract_address: String,
    pub contract_code_hash: String,
}

impl ContractRef {
    pub fn new(address: impl Into<String>, code_hash: impl Into<String>) -> Result<Self> {
        let address = address.into();
        let code_hash = code_hash.into();

        if address.trim().is_empty() {
            return Err(ClientError::Configuration("пустой адрес контракта".into()));
        }
        if code_hash.trim().is_empty() {
            return Err(ClientError::Configuration("пустой code hash контракта".into()));
        }

        Ok(Self { address, code_hash })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn code_hash(&self) -> &str {
        &self.code_hash
    }

    /// Загрузить дескриптор контракта из JSON-файла.
    ///
    /// Отсутствие файла: ошибка конфигурации, никаких значений по умолчанию.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            ClientError::Configuration(format!(
                "не удалось прочитать дескриптор контракта {}: {e}",
                path.display()
            ))
        })?;

        let descriptor: ContractDescriptor = serde_json::from_str(&data).map_err(|e| {
            ClientError::Configuration(format!(
                "битый дескриптор контракта {}: {e}",
                path.display()
            ))
        })?;

        let contract = descriptor.try_into()?;
        debug!(path = %path.display(), ?contract, "contract descriptor loaded");
        Ok(contract)
    }
}

impl TryFrom<ContractDescriptor> for ContractRef {
    type Error = ClientError;

    fn try_from(d: ContractDescriptor) -> Result<Self> {
        ContractRef::new(d.contract_address, d.contract_code_hash)
    }
}
