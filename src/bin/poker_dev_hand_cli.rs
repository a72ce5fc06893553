// src/bin/poker_dev_hand_cli.rs

use std::sync::Arc;

use secret_poker_client::actions::{reveal_street, showdown, start_game};
use secret_poker_client::decoder::{PlayerDataResponse, ResponsePayload};
use secret_poker_client::domain::{ContractRef, GamePhase, TableId};
use secret_poker_client::executor::GasBudget;
use secret_poker_client::infra::{DeterministicSigner, InMemoryLedger};
use secret_poker_client::ledger::BroadcastMode;
use secret_poker_client::permit::{PermitScope, PrivateQuery};
use secret_poker_client::{Action, ClientConfig, ClientError, PokerSession, SubmissionResult};
use tracing_subscriber::EnvFilter;

const TABLE_ID: TableId = 42;
const PLAYERS: [&str; 3] = [
    "secret1alicexxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
    "secret1bobxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
    "secret1carolxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("poker_dev_hand_cli: одна раздача против in-memory леджера…");

    // 1. Конфиг: значения по умолчанию + переменные окружения
    let config = ClientConfig::from_env()?;
    let contract = ContractRef::new(
        "secret1pokercontractxxxxxxxxxxxxxxxxxxxxxx",
        "0f2c4d6e8a1b3c5d7e9f0a2b4c6d8e0f1a3b5c7d9e0f2a4b6c8d0e1f3a5b7c9d",
    )?;
    let ledger = Arc::new(InMemoryLedger::new(&contract, config.chain_id.clone()));
    let session = PokerSession::new(ledger.clone(), contract.clone());

    // Действия отправляет дилер (первый игрок).
    let dealer = DeterministicSigner::new(PLAYERS[0]);

    // 2. start_game
    let start = start_game(TABLE_ID, PLAYERS, 1, false)?;
    play(&session, &dealer, start, config.broadcast_mode).await?;

    // 3. Карманные карты каждого игрока под его собственным permit'ом
    for address in PLAYERS {
        let signer = DeterministicSigner::new(address);
        let scope = PermitScope::new("poker_hand", config.chain_id.clone())
            .allow_contract(&contract)
            .permission("allowance");
        let permit = session.permit(&signer, scope).await?;

        let raw = session
            .private_query(&permit, &PrivateQuery::GetPlayerCards { table_id: TABLE_ID })
            .await?;
        match serde_json::from_value::<PlayerDataResponse>(raw) {
            Ok(data) => println!("  {address}: {}", fmt_cards(&data.hand)),
            Err(e) => println!("  {address}: неожиданный ответ ({e})"),
        }
    }

    // 4. Улицы
    for phase in [GamePhase::Flop, GamePhase::Turn, GamePhase::River] {
        let action = reveal_street(TABLE_ID, phase)?;
        play(&session, &dealer, action, config.broadcast_mode).await?;
    }

    // 5. Шоудаун: вскрываем всех
    let action = showdown(TABLE_ID, PLAYERS, false)?;
    play(&session, &dealer, action, config.broadcast_mode).await?;

    println!();
    println!("================ SUMMARY =================");
    println!("транзакций отправлено: {}", ledger.submissions().await);
    println!(
        "стол {TABLE_ID} в реестре: {}",
        session.registry().has_table(TABLE_ID).await
    );
    if let Some(state) = ledger.table_state(TABLE_ID).await {
        println!("фаза стола в контракте: {}", state.phase);
    }

    Ok(())
}

async fn play(
    session: &PokerSession,
    signer: &DeterministicSigner,
    action: Action,
    mode: BroadcastMode,
) -> Result<SubmissionResult, ClientError> {
    let actions = [action];
    let budget = GasBudget::suggested(&actions, mode);
    let result = session.play(signer, &actions, budget).await?;

    println!();
    println!(
        "{} | tx={} | gas {}/{}",
        actions[0], result.tx_hash, result.gas_used, result.gas_wanted
    );
    for event in &result.decoded_events {
        print_payload(event.payload.as_ref());
    }

    Ok(result)
}

fn print_payload(payload: Option<&ResponsePayload>) {
    match payload {
        Some(ResponsePayload::StartGame(r)) => {
            println!("  раздача #{} за столом {}: {} игрока", r.hand_ref, r.table_id, r.players.len());
        }
        Some(ResponsePayload::CommunityCards(r)) => {
            println!("  {}: {}", r.game_state, fmt_cards(&r.community_cards));
        }
        Some(ResponsePayload::Showdown(r)) => {
            for (player, cards) in &r.players_cards {
                println!("  {player} показывает {}", fmt_cards(cards));
            }
            if let Some(board) = &r.community_cards {
                println!("  добор борда: {}", fmt_cards(board));
            }
        }
        None => println!("  (ответ без типа)"),
    }
}

fn fmt_cards(cards: &[secret_poker_client::domain::Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
