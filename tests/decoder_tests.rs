// tests/decoder_tests.rs
//
// Разбор settlement'ов.
//
// Мы тестируем:
//  1) Ответ из события wasm/response, порядок по msg_index
//  2) Декодирование идемпотентно
//  3) Нет response на действие, которое его ждёт -> MalformedResponse
//  4) response не JSON -> MalformedResponse
//  5) Нет структурированных логов -> разбираем raw_log, мусор в нём -> MalformedResponse
//  6) Типизированные ответы: карты, олл-ин добор борда, previous_hand_log
//  7) Незнакомый тип ответа остаётся сырым JSON
//  8) Сохранённый ответ ноды читается как Settlement

use serde_json::json;

use secret_poker_client::actions::{random_request, reveal_street, start_game};
use secret_poker_client::decoder::{ResponseDecoder, ResponsePayload};
use secret_poker_client::domain::{Card, GamePhase, Rank, Suit};
use secret_poker_client::ledger::{Settlement, TxAttribute, TxEvent, TxLog};
use secret_poker_client::ClientError;

// -----------------------------
// ВСПОМОГАТЕЛЬНЫЕ КОНСТРУКТОРЫ
// -----------------------------

fn attr(key: &str, value: &str) -> TxAttribute {
    TxAttribute {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn wasm_log(msg_index: u32, attributes: Vec<TxAttribute>) -> TxLog {
    TxLog {
        msg_index,
        events: vec![
            TxEvent {
                kind: "message".to_string(),
                attributes: vec![attr("action", "/secret.compute.v1beta1.MsgExecuteContract")],
            },
            TxEvent {
                kind: "wasm".to_string(),
                attributes,
            },
        ],
    }
}

fn settlement(logs: Vec<TxLog>) -> Settlement {
    Settlement {
        tx_hash: "ABCDEF".to_string(),
        gas_wanted: 200_000,
        gas_used: 150_000,
        logs,
        ..Settlement::default()
    }
}

fn start_response() -> String {
    json!({
        "type": "start_game",
        "table_id": 42,
        "hand_ref": 3,
        "players": ["A", "B", "C"],
    })
    .to_string()
}

fn flop_response() -> String {
    json!({
        "type": "community_cards",
        "table_id": 42,
        "hand_ref": 3,
        "game_state": "flop",
        "community_cards": [0x01, 0x1d, 0x2a],
    })
    .to_string()
}

// -----------------------------
// ТЕСТЫ
// -----------------------------

#[test]
fn decodes_responses_in_message_order() {
    let s = settlement(vec![
        wasm_log(0, vec![attr("contract_address", "secret1c"), attr("response", &start_response())]),
        wasm_log(1, vec![attr("response", &flop_response())]),
    ]);

    let events = ResponseDecoder::new().decode(&s).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].msg_index, 0);
    assert_eq!(events[1].msg_index, 1);

    match &events[1].payload {
        Some(ResponsePayload::CommunityCards(r)) => {
            assert_eq!(r.game_state, GamePhase::Flop);
            assert_eq!(
                r.community_cards,
                vec![
                    Card::new(Rank::Ace, Suit::Clubs),
                    Card::new(Rank::King, Suit::Diamonds),
                    Card::new(Rank::Ten, Suit::Hearts),
                ]
            );
        }
        other => panic!("ожидали community_cards, получили {other:?}"),
    }
}

#[test]
fn decoding_is_idempotent() {
    let s = settlement(vec![wasm_log(0, vec![attr("response", &start_response())])]);
    let decoder = ResponseDecoder::new();
    assert_eq!(decoder.decode(&s).unwrap(), decoder.decode(&s).unwrap());
}

#[test]
fn missing_response_for_expecting_action_is_malformed() {
    let actions = vec![
        start_game(42, ["A", "B", "C"], 3, false).unwrap(),
        reveal_street(42, GamePhase::Flop).unwrap(),
    ];
    let s = settlement(vec![
        wasm_log(0, vec![attr("response", &start_response())]),
        wasm_log(1, vec![attr("contract_address", "secret1c")]),
    ]);

    let err = ResponseDecoder::new().decode_for(&s, &actions).unwrap_err();
    match err {
        ClientError::MalformedResponse { msg_index, .. } => assert_eq!(msg_index, 1),
        other => panic!("ожидали MalformedResponse, получили {other:?}"),
    }
}

#[test]
fn random_request_needs_no_response() {
    let actions = vec![random_request()];
    let s = settlement(vec![wasm_log(0, vec![attr("random", "12345")])]);

    let events = ResponseDecoder::new().decode_for(&s, &actions).unwrap();
    assert!(events.is_empty());
}

#[test]
fn unparsable_response_is_malformed() {
    let s = settlement(vec![wasm_log(0, vec![attr("response", "{not json")])]);
    assert!(matches!(
        ResponseDecoder::new().decode(&s),
        Err(ClientError::MalformedResponse { msg_index: 0, .. })
    ));
}

#[test]
fn falls_back_to_raw_log() {
    let logs = vec![wasm_log(0, vec![attr("response", &start_response())])];
    let s = Settlement {
        tx_hash: "RAW".to_string(),
        raw_log: serde_json::to_string(&logs).unwrap(),
        ..Settlement::default()
    };

    let events = ResponseDecoder::new().decode(&s).unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, Some(ResponsePayload::StartGame(_))));
}

#[test]
fn raw_log_that_is_not_json_is_malformed() {
    let s = Settlement {
        tx_hash: "RAW".to_string(),
        raw_log: "failed to execute message; message index: 0".to_string(),
        ..Settlement::default()
    };
    assert!(matches!(
        ResponseDecoder::new().decode(&s),
        Err(ClientError::MalformedResponse { msg_index: 0, .. })
    ));

    // Пустой raw_log: просто нет событий.
    let empty = Settlement::default();
    assert!(ResponseDecoder::new().decode(&empty).unwrap().is_empty());
}

#[test]
fn all_in_showdown_carries_remaining_board() {
    let response = json!({
        "type": "showdown",
        "table_id": 42,
        "hand_ref": 3,
        "players_cards": [["A", [0x01, 0x11]], ["B", [0x3d, 0x3c]]],
        "community_cards": [0x05, 0x06],
    })
    .to_string();
    let s = settlement(vec![wasm_log(0, vec![attr("response", &response)])]);

    let events = ResponseDecoder::new().decode(&s).unwrap();
    let Some(ResponsePayload::Showdown(sd)) = &events[0].payload else {
        panic!("ожидали showdown");
    };
    assert_eq!(sd.players_cards.len(), 2);
    assert_eq!(sd.players_cards[1].0, "B");
    assert_eq!(sd.community_cards.as_ref().map(Vec::len), Some(2));
}

#[test]
fn previous_hand_log_is_attached() {
    let previous = json!({ "type": "showdown", "table_id": 42, "hand_ref": 2, "players_cards": [] });
    let s = settlement(vec![wasm_log(
        0,
        vec![
            attr("response", &start_response()),
            attr("previous_hand_log", &previous.to_string()),
        ],
    )]);

    let events = ResponseDecoder::new().decode(&s).unwrap();
    assert_eq!(events[0].previous_hand_log, Some(previous));
}

#[test]
fn unknown_response_type_stays_raw() {
    let s = settlement(vec![wasm_log(0, vec![attr("response", r#"{"type":"fold","seat":2}"#)])]);

    let events = ResponseDecoder::new().decode(&s).unwrap();
    assert_eq!(events[0].payload, None);
    assert_eq!(events[0].response["seat"], 2);
}

#[test]
fn saved_node_response_parses_as_settlement() {
    let raw = json!({
        "transactionHash": "9F1C",
        "code": 0,
        "rawLog": "",
        "gasWanted": 200000,
        "gasUsed": 61234,
        "jsonLog": [{
            "msg_index": 0,
            "events": [{
                "type": "wasm",
                "attributes": [{ "key": "response", "value": start_response() }],
            }],
        }],
    });

    let s: Settlement = serde_json::from_value(raw).unwrap();
    assert!(s.is_success());
    assert_eq!(s.gas_used, 61234);
    assert_eq!(ResponseDecoder::new().decode(&s).unwrap().len(), 1);
}
