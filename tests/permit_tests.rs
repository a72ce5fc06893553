// tests/permit_tests.rs
//
// Query permit'ы.
//
// Мы тестируем:
//  1) Фиксированные поля sign doc'а (account_number, sequence, fee, memo, type)
//  2) Каноническая сериализация и детерминированный digest
//  3) Некорректный scope -> InvalidPermitScope, подписант даже не вызывается
//  4) Отказ подписанта -> Signing
//  5) Конверт with_permit: форма и параметры permit'а внутри
//  6) Сценарий get_player_cards под permit'ом ["allowance"]
//  7) Подделанная подпись / чужой контракт -> ошибка запроса
//  8) PermitCache: повторная выдача из кэша, revoke

use std::sync::Arc;

use serde_json::json;

use secret_poker_client::actions::start_game;
use secret_poker_client::decoder::PlayerDataResponse;
use secret_poker_client::domain::ContractRef;
use secret_poker_client::executor::GasBudget;
use secret_poker_client::infra::{DeterministicSigner, InMemoryLedger};
use secret_poker_client::ledger::{BroadcastMode, Signer};
use secret_poker_client::permit::{
    authorized_query, PermitCache, PermitIssuer, PermitScope, PrivateQuery, StdSignDoc,
};
use secret_poker_client::{ClientError, PokerSession};

const CHAIN: &str = "pulsar-3";

// -----------------------------
// ВСПОМОГАТЕЛЬНЫЕ КОНСТРУКТОРЫ
// -----------------------------

fn contract() -> ContractRef {
    ContractRef::new("secret1pokercontract", "c0de").unwrap()
}

fn scope(contract: &ContractRef) -> PermitScope {
    PermitScope::new("poker_hand", CHAIN)
        .allow_contract(contract)
        .permission("allowance")
}

// -----------------------------
// SIGN DOC
// -----------------------------

#[test]
fn sign_doc_has_fixed_permit_fields() {
    let issuer = PermitIssuer::default();
    let doc = issuer.sign_doc(&scope(&contract()));

    assert_eq!(doc.chain_id, CHAIN);
    assert_eq!(doc.account_number, "0");
    assert_eq!(doc.sequence, "0");
    assert_eq!(doc.memo, "");
    assert_eq!(doc.fee.gas, "1");
    assert_eq!(doc.fee.amount.len(), 1);
    assert_eq!(doc.fee.amount[0].denom, "uscrt");
    assert_eq!(doc.fee.amount[0].amount, "0");

    assert_eq!(doc.msgs.len(), 1);
    assert_eq!(doc.msgs[0].kind, "query_permit");
    assert_eq!(
        doc.msgs[0].value,
        json!({
            "permit_name": "poker_hand",
            "allowed_tokens": ["secret1pokercontract"],
            "permissions": ["allowance"],
        })
    );
}

#[test]
fn sign_bytes_are_sorted_and_digest_is_stable() {
    let doc = StdSignDoc::query_permit(CHAIN, "uscrt", json!({ "z": 1, "a": 2 }));
    let bytes = String::from_utf8(doc.sign_bytes().unwrap()).unwrap();

    // Ключи верхнего уровня по алфавиту, без пробелов.
    assert!(bytes.starts_with(r#"{"account_number":"0","chain_id":"pulsar-3","fee":"#));
    assert!(bytes.contains(r#"{"a":2,"z":1}"#));

    assert_eq!(doc.digest().unwrap(), doc.clone().digest().unwrap());

    let other = StdSignDoc::query_permit("secret-4", "uscrt", json!({ "z": 1, "a": 2 }));
    assert_ne!(doc.digest().unwrap(), other.digest().unwrap());
}

// -----------------------------
// ВЫДАЧА
// -----------------------------

#[tokio::test]
async fn invalid_scope_is_rejected_before_signing() {
    let issuer = PermitIssuer::default();
    // Отказывающий подписант: если бы до него дошло, была бы Signing.
    let signer = DeterministicSigner::rejecting("secret1a");

    let no_contracts = PermitScope::new("p", CHAIN).permission("allowance");
    let err = issuer.issue(&signer, no_contracts).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidPermitScope(_)));

    let no_permissions = PermitScope::new("p", CHAIN).allow_contract(&contract());
    let err = issuer.issue(&signer, no_permissions).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidPermitScope(_)));

    let blank_name = scope(&contract());
    let blank_name = PermitScope {
        name: " ".into(),
        ..blank_name
    };
    let err = issuer.issue(&signer, blank_name).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidPermitScope(_)));
}

#[tokio::test]
async fn signer_rejection_is_signing_error() {
    let issuer = PermitIssuer::default();
    let signer = DeterministicSigner::rejecting("secret1a");

    let err = issuer.issue(&signer, scope(&contract())).await.unwrap_err();
    assert!(matches!(err, ClientError::Signing(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn issued_permit_carries_scope_and_signer() {
    let c = contract();
    let signer = DeterministicSigner::new("secret1a");
    let permit = PermitIssuer::default()
        .issue(&signer, scope(&c))
        .await
        .unwrap();

    assert_eq!(permit.name(), "poker_hand");
    assert_eq!(permit.chain_id(), CHAIN);
    assert_eq!(permit.signer_address(), signer.address());
    assert!(permit.allows_contract(&c));
    assert!(!permit.allows_contract(&ContractRef::new("secret1other", "c0de").unwrap()));
    assert_eq!(permit.signature().pub_key.value, "secret1a");
}

#[tokio::test]
async fn with_permit_envelope_shape() {
    let c = contract();
    let signer = DeterministicSigner::new("secret1a");
    let permit = PermitIssuer::default()
        .issue(&signer, scope(&c))
        .await
        .unwrap();

    let query = PrivateQuery::GetPlayerCards { table_id: 42 }.to_query().unwrap();
    let envelope = authorized_query(&permit, query.clone());

    let inner = &envelope["with_permit"];
    assert_eq!(inner["query"], query);
    assert_eq!(inner["query"], json!({ "get_player_cards": { "table_id": 42 } }));
    assert_eq!(
        inner["permit"]["params"],
        json!({
            "permit_name": "poker_hand",
            "allowed_tokens": ["secret1pokercontract"],
            "chain_id": CHAIN,
            "permissions": ["allowance"],
        })
    );
    assert_eq!(
        inner["permit"]["signature"],
        serde_json::to_value(permit.signature()).unwrap()
    );
}

// -----------------------------
// ЗАПРОСЫ ЧЕРЕЗ ЛЕДЖЕР
// -----------------------------

async fn seated_session() -> (PokerSession, ContractRef) {
    let c = contract();
    let ledger = Arc::new(InMemoryLedger::new(&c, CHAIN));
    let session = PokerSession::new(ledger, c.clone());

    let dealer = DeterministicSigner::new("secret1a");
    let start = start_game(42, ["secret1a", "secret1b"], 1, false).unwrap();
    session
        .play(&dealer, &[start], GasBudget::new(100_000, BroadcastMode::Block))
        .await
        .unwrap();

    (session, c)
}

#[tokio::test]
async fn get_player_cards_under_allowance_permit() {
    let (session, c) = seated_session().await;
    let player = DeterministicSigner::new("secret1b");

    let permit = session.permit(&player, scope(&c)).await.unwrap();
    let raw = session
        .private_query(&permit, &PrivateQuery::GetPlayerCards { table_id: 42 })
        .await
        .unwrap();

    let data: PlayerDataResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(data.table_id, 42);
    assert_eq!(data.hand_ref, 1);
    assert_eq!(data.hand.len(), 2);
    assert_ne!(data.hand[0], data.hand[1]);
}

#[tokio::test]
async fn private_data_query_includes_street_secrets() {
    let (session, c) = seated_session().await;
    let player = DeterministicSigner::new("secret1a");

    let permit = session.permit(&player, scope(&c)).await.unwrap();
    let raw = session
        .private_query(&permit, &PrivateQuery::PlayerPrivateData { table_id: 42 })
        .await
        .unwrap();

    let data: PlayerDataResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(data.hand.len(), 2);
    assert_ne!(data.flop_secret, data.turn_secret);
}

#[tokio::test]
async fn permit_for_unseated_player_is_refused() {
    let (session, c) = seated_session().await;
    let outsider = DeterministicSigner::new("secret1z");

    let permit = session.permit(&outsider, scope(&c)).await.unwrap();
    let err = session
        .private_query(&permit, &PrivateQuery::GetPlayerCards { table_id: 42 })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn permit_for_other_contract_is_refused() {
    let (session, _) = seated_session().await;
    let player = DeterministicSigner::new("secret1a");
    let other = ContractRef::new("secret1elsewhere", "c0de").unwrap();

    let permit = session.permit(&player, scope(&other)).await.unwrap();
    let err = session
        .private_query(&permit, &PrivateQuery::GetPlayerCards { table_id: 42 })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn forged_signature_is_refused() {
    let (session, c) = seated_session().await;
    let player = DeterministicSigner::new("secret1a");
    let permit = session.permit(&player, scope(&c)).await.unwrap();

    // Подменяем владельца в подписи: контракт должен это заметить.
    let mut envelope = authorized_query(
        &permit,
        PrivateQuery::GetPlayerCards { table_id: 42 }.to_query().unwrap(),
    );
    envelope["with_permit"]["permit"]["signature"]["pub_key"]["value"] = json!("secret1b");

    let err = session.query(envelope).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

// -----------------------------
// КЭШ
// -----------------------------

#[tokio::test]
async fn cache_reuses_and_revokes() {
    let c = contract();
    let issuer = PermitIssuer::default();
    let cache = PermitCache::new();
    let signer = DeterministicSigner::new("secret1a");

    let first = cache.get_or_issue(&issuer, &signer, scope(&c)).await.unwrap();
    let second = cache.get_or_issue(&issuer, &signer, scope(&c)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.len().await, 1);

    assert!(cache.revoke("secret1a", "poker_hand").await);
    assert!(!cache.revoke("secret1a", "poker_hand").await);
    assert!(cache.is_empty().await);
    assert!(cache.get("secret1a", "poker_hand").await.is_none());
}
