use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Тип amino-сообщения permit'а. Верификатор на стороне контракта ждёт ровно его.
pub const QUERY_PERMIT_MSG_TYPE: &str = "query_permit";

/// Монета (amount строкой, как в amino JSON).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AminoMsg {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

/// Amino sign doc.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StdSignDoc {
    pub chain_id: String,
    pub account_number: String,
    pub sequence: String,
    pub fee: StdFee,
    pub msgs: Vec<AminoMsg>,
    pub memo: String,
}

impl StdSignDoc {
    /// Sign doc для query permit'а.
    ///
    /// Нулевая комиссия, gas = "1", account_number/sequence = "0", пустое memo:
    /// такая подпись годится только для оффчейн-авторизации и не может
    /// быть отправлена как транзакция.
    pub fn query_permit(chain_id: &str, fee_denom: &str, value: Value) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            account_number: "0".to_string(),
            sequence: "0".to_string(),
            fee: StdFee {
                amount: vec![Coin {
                    denom: fee_denom.to_string(),
                    amount: "0".to_string(),
                }],
                gas: "1".to_string(),
            },
            msgs: vec![AminoMsg {
                kind: QUERY_PERMIT_MSG_TYPE.to_string(),
                value,
            }],
            memo: String::new(),
        }
    }

    /// Канонические байты для подписи: компактный JSON с отсортированными ключами.
    pub fn sign_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        // Value::Object хранит ключи в BTreeMap, так что сортировка получается сама.
        let canonical = serde_json::to_value(self)?;
        serde_json::to_vec(&canonical)
    }

    /// SHA-256 от `sign_bytes`: то, что реально подписывает secp256k1-кошелёк.
    pub fn digest(&self) -> Result<[u8; 32], serde_json::Error> {
        let bytes = self.sign_bytes()?;
        let hash = Sha256::digest(&bytes);

        let mut out = [0u8; 32];
        out.copy_from_slice(&hash[..32]);
        Ok(out)
    }
}

/// Подсказки кошельку при подписи.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignOptions {
    pub prefer_no_set_fee: bool,
    pub prefer_no_set_memo: bool,
}

impl SignOptions {
    /// Комиссия и memo у permit'а фиксированы, пользователю их не показываем.
    pub fn permit() -> Self {
        Self {
            prefer_no_set_fee: true,
            prefer_no_set_memo: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PubKey {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Подпись в формате, который ждёт контракт внутри `permit.signature`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StdSignature {
    pub pub_key: PubKey,
    pub signature: String,
}
