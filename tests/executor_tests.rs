// tests/executor_tests.rs
//
// Отправка транзакций.
//
// Мы тестируем:
//  1) Одно действие -> execute_contract, ответ разобран
//  2) Батч уходит одной транзакцией в исходном порядке
//  3) Нехватка газа -> OutOfGas, ничего не применено, трекер не сдвинут
//  4) Отказ контракта -> Rejected с кодом и raw_log; контракт мягче локального трекера
//  5) Транспорт -> Transport (retryable), таймаут -> OutcomeUnknown
//  6) Sync-режим: confirmed = false, трекер не двигается
//  7) Пустой батч -> InvalidAction
//  8) Одна транзакция в полёте на адрес, разные адреса не мешают друг другу,
//     слоты простаивающих адресов не копятся
//  9) GasBudget::suggested

use std::sync::Arc;
use std::time::Duration;

use secret_poker_client::actions::{random_request, reveal_street, showdown, start_game, Action};
use secret_poker_client::domain::{ContractRef, GamePhase};
use secret_poker_client::executor::gas::{BASE_TX_GAS, REVEAL_STREET_GAS, START_GAME_GAS};
use secret_poker_client::executor::{GasBudget, TxExecutor};
use secret_poker_client::infra::{DeterministicSigner, InMemoryLedger, LedgerFault};
use secret_poker_client::ledger::BroadcastMode;
use secret_poker_client::{ClientError, PokerSession};

const T: u32 = 42;

// -----------------------------
// ВСПОМОГАТЕЛЬНЫЕ КОНСТРУКТОРЫ
// -----------------------------

fn contract() -> ContractRef {
    ContractRef::new("secret1pokercontract", "c0de").unwrap()
}

fn ledger() -> Arc<InMemoryLedger> {
    Arc::new(InMemoryLedger::new(&contract(), "pulsar-3"))
}

fn dealer() -> DeterministicSigner {
    DeterministicSigner::new("secret1a")
}

fn start() -> Action {
    start_game(T, ["secret1a", "secret1b", "secret1c"], 1, false).unwrap()
}

fn hand_to_turn() -> Vec<Action> {
    vec![
        start(),
        reveal_street(T, GamePhase::Flop).unwrap(),
        reveal_street(T, GamePhase::Turn).unwrap(),
    ]
}

// -----------------------------
// УСПЕШНЫЕ ОТПРАВКИ
// -----------------------------

#[tokio::test]
async fn single_action_settles_and_decodes() {
    let ledger = ledger();
    let executor = TxExecutor::new(ledger.clone());

    let result = executor
        .submit(&dealer(), &contract(), &[start()], GasBudget::block(100_000))
        .await
        .unwrap();

    assert!(result.confirmed);
    assert_eq!(result.code, 0);
    assert_eq!(result.gas_used, BASE_TX_GAS + START_GAME_GAS);
    assert_eq!(result.decoded_events.len(), 1);
    assert!(result.event_for(0).is_some());
    assert!(!result.tx_hash.is_empty());
}

#[tokio::test]
async fn batch_goes_as_one_transaction_in_order() {
    let ledger = ledger();
    let executor = TxExecutor::new(ledger.clone());
    let batch = hand_to_turn();

    let result = executor
        .submit(&dealer(), &contract(), &batch, GasBudget::block(500_000))
        .await
        .unwrap();

    assert_eq!(ledger.submissions().await, 1);
    let sent = ledger.sent_messages().await;
    let names: Vec<String> = sent
        .iter()
        .map(|m| m.msg.as_object().unwrap().keys().next().unwrap().clone())
        .collect();
    assert_eq!(names, ["start_game", "community_cards", "community_cards"]);
    assert_eq!(sent[2].msg["community_cards"]["game_state"], "turn");

    let indices: Vec<u32> = result.decoded_events.iter().map(|e| e.msg_index).collect();
    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(ledger.table_state(T).await.unwrap().phase, GamePhase::Turn);
}

// -----------------------------
// ОШИБКИ
// -----------------------------

#[tokio::test]
async fn out_of_gas_batch_changes_nothing() {
    let ledger = ledger();
    let session = PokerSession::new(ledger.clone(), contract());

    let needed = BASE_TX_GAS + START_GAME_GAS + 2 * REVEAL_STREET_GAS;
    let err = session
        .play(&dealer(), &hand_to_turn(), GasBudget::block(needed - 1))
        .await
        .unwrap_err();

    match &err {
        ClientError::OutOfGas { gas_limit, gas_used } => {
            assert_eq!(*gas_limit, needed - 1);
            assert_eq!(*gas_used, needed);
        }
        other => panic!("ожидали OutOfGas, получили {other:?}"),
    }
    // Лимит надо переоценить, простой повтор не поможет.
    assert!(!err.is_retryable());

    // Ни контракт, ни трекер не сдвинулись, пустой трекер в реестре не остался.
    assert!(ledger.table_state(T).await.is_none());
    assert!(session.table_state(T).await.is_none());
}

#[tokio::test]
async fn contract_rejection_is_reported_with_code() {
    let ledger = ledger();
    let executor = TxExecutor::new(ledger.clone());

    // Исполнитель не проверяет фазы, это делает сессия. Стола 42 в контракте ещё нет.
    let turn = reveal_street(T, GamePhase::Turn).unwrap();
    let err = executor
        .submit(&dealer(), &contract(), &[turn], GasBudget::block(100_000))
        .await
        .unwrap_err();

    match err {
        ClientError::Rejected { code, raw_log } => {
            assert_eq!(code, secret_poker_client::infra::CONTRACT_ERROR_CODE);
            assert!(raw_log.contains("message index: 0"));
            assert!(raw_log.contains("table 42 not found"));
        }
        other => panic!("ожидали Rejected, получили {other:?}"),
    }
}

#[tokio::test]
async fn contract_is_looser_than_local_tracker() {
    let ledger = ledger();
    let session = PokerSession::new(ledger.clone(), contract());
    session
        .play(&dealer(), &[start()], GasBudget::block(100_000))
        .await
        .unwrap();

    // Turn сразу после раздачи: локально нельзя, в сеть ничего не уходит.
    let turn = reveal_street(T, GamePhase::Turn).unwrap();
    let err = session
        .play(&dealer(), &[turn.clone()], GasBudget::block(100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::IllegalTransition { .. }));
    assert_eq!(ledger.submissions().await, 1);

    // Сам контракт порядок улиц не проверяет и такой turn примет.
    let result = session
        .executor()
        .submit(&dealer(), &contract(), &[turn], GasBudget::block(100_000))
        .await
        .unwrap();
    assert!(result.confirmed);
    assert_eq!(ledger.table_state(T).await.unwrap().phase, GamePhase::Turn);
    assert_eq!(session.table_state(T).await.unwrap().phase, GamePhase::PreFlop);

    // Шоудаун с тем, кто не сидит за столом, контракт отвергает.
    let stranger = showdown(T, ["secret1z"], true).unwrap();
    let err = session
        .executor()
        .submit(&dealer(), &contract(), &[stranger], GasBudget::block(100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { .. }));
}

#[tokio::test]
async fn transport_failure_is_retryable_and_harmless() {
    let ledger = ledger();
    let session = PokerSession::new(ledger.clone(), contract());
    ledger
        .inject_fault(LedgerFault::Transport("connection refused".into()))
        .await;

    let err = session
        .play(&dealer(), &[start()], GasBudget::block(100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.is_retryable());
    assert_eq!(ledger.submissions().await, 0);

    // Повтор проходит.
    session
        .play(&dealer(), &[start()], GasBudget::block(100_000))
        .await
        .unwrap();
    assert_eq!(session.table_state(T).await.unwrap().phase, GamePhase::PreFlop);
}

#[tokio::test]
async fn timeout_is_outcome_unknown_and_resync_recovers() {
    let ledger = ledger();
    let session = PokerSession::new(ledger.clone(), contract());
    ledger.inject_fault(LedgerFault::Timeout).await;

    let err = session
        .play(&dealer(), &[start()], GasBudget::block(100_000))
        .await
        .unwrap_err();
    match err {
        ClientError::OutcomeUnknown { tx_hash } => assert!(tx_hash.is_some()),
        other => panic!("ожидали OutcomeUnknown, получили {other:?}"),
    }
    assert!(!ClientError::OutcomeUnknown { tx_hash: None }.is_retryable());

    // Локально стола нет, а в контракте раздача уже идёт.
    assert!(session.table_state(T).await.is_none());

    let authoritative = session
        .query(serde_json::json!({ "get_table": { "table_id": T } }))
        .await
        .unwrap();
    session
        .refresh_table(serde_json::from_value(authoritative).unwrap())
        .await
        .unwrap();
    assert_eq!(session.table_state(T).await.unwrap().phase, GamePhase::PreFlop);
}

#[tokio::test]
async fn sync_mode_is_unconfirmed_and_tracker_stays() {
    let ledger = ledger();
    let session = PokerSession::new(ledger.clone(), contract());

    let result = session
        .play(&dealer(), &[start()], GasBudget::new(100_000, BroadcastMode::Sync))
        .await
        .unwrap();

    assert!(!result.confirmed);
    assert!(result.decoded_events.is_empty());
    assert!(session.table_state(T).await.is_none());
}

#[tokio::test]
async fn empty_batch_is_invalid() {
    let executor = TxExecutor::new(ledger());
    let err = executor
        .submit(&dealer(), &contract(), &[], GasBudget::block(100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidAction(_)));
}

#[tokio::test]
async fn illegal_batch_never_reaches_ledger() {
    let ledger = ledger();
    let session = PokerSession::new(ledger.clone(), contract());

    let batch = vec![start(), showdown(T, ["secret1a"], false).unwrap()];
    let err = session
        .play(&dealer(), &batch, GasBudget::block(500_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::IllegalTransition { .. }));
    assert_eq!(ledger.submissions().await, 0);
}

// -----------------------------
// КОНКУРЕНТНОСТЬ
// -----------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_transaction_in_flight_per_sender() {
    let ledger = Arc::new(
        InMemoryLedger::new(&contract(), "pulsar-3").with_latency(Duration::from_millis(20)),
    );
    let executor = Arc::new(TxExecutor::new(ledger.clone()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let executor = Arc::clone(&executor);
        handles.push(tokio::spawn(async move {
            executor
                .submit(&dealer(), &contract(), &[random_request()], GasBudget::block(100_000))
                .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(ledger.submissions().await, 4);
    assert_eq!(ledger.max_in_flight_per_sender().await, 1);
    assert!(!executor.sender_locks().is_busy("secret1a").await);
}

#[tokio::test]
async fn idle_sender_slots_are_dropped() {
    let executor = TxExecutor::new(ledger());

    for addr in ["secret1a", "secret1b", "secret1c", "secret1d"] {
        executor
            .submit(
                &DeterministicSigner::new(addr),
                &contract(),
                &[random_request()],
                GasBudget::block(100_000),
            )
            .await
            .unwrap();
    }

    // Остался только слот последнего адреса, остальные выкинуты при захвате.
    assert_eq!(executor.sender_locks().tracked().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_tables_progress_independently() {
    let ledger = ledger();
    let session = Arc::new(PokerSession::new(ledger.clone(), contract()));

    let mut handles = Vec::new();
    for (table_id, dealer_addr) in [(1u32, "secret1a"), (2, "secret1b"), (3, "secret1c")] {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            let signer = DeterministicSigner::new(dealer_addr);
            let start = start_game(table_id, ["secret1a", "secret1b"], 1, false).unwrap();
            let flop = reveal_street(table_id, GamePhase::Flop).unwrap();
            session
                .play(&signer, &[start], GasBudget::block(100_000))
                .await?;
            session
                .play(&signer, &[flop], GasBudget::block(100_000))
                .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    for table_id in [1, 2, 3] {
        assert_eq!(
            session.table_state(table_id).await.unwrap().phase,
            GamePhase::Flop
        );
    }
}

// -----------------------------
// БЮДЖЕТ
// -----------------------------

#[test]
fn suggested_budget_covers_batch() {
    let batch = hand_to_turn();
    let budget = GasBudget::suggested(&batch, BroadcastMode::Block);
    assert_eq!(
        budget.gas_limit,
        BASE_TX_GAS + START_GAME_GAS + 2 * REVEAL_STREET_GAS
    );
    assert_eq!(budget.tx_options().broadcast_mode, BroadcastMode::Block);
}
