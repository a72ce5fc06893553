//! Query permit'ы: подписанная оффчейн-авторизация на чтение приватного
//! состояния контракта (карманные карты) без on-chain транзакции.
//!
//! - sign_doc.rs: amino sign doc и формат подписи;
//! - issuer.rs: выпуск permit'а и конверт `with_permit`;
//! - cache.rs: локальный кэш с revoke.

pub mod cache;
pub mod issuer;
pub mod sign_doc;

pub use cache::PermitCache;
pub use issuer::{
    authorized_query, Permit, PermitIssuer, PermitParams, PermitScope, PrivateQuery,
    DEFAULT_FEE_DENOM,
};
pub use sign_doc::{AminoMsg, Coin, PubKey, SignOptions, StdFee, StdSignDoc, StdSignature};
