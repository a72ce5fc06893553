use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::actions::Action;
use crate::decoder::{
    CommunityCardsResponse, PlayerDataResponse, ResponsePayload, ShowdownResponse,
    StartGameResponse, CONTRACT_EVENT_TYPE, PREVIOUS_HAND_LOG_KEY, RESPONSE_KEY,
};
use crate::domain::{Card, ContractRef, Deck, GamePhase, HandRef, TableId, TableState};
use crate::executor::gas::{estimate_action_gas, BASE_TX_GAS};
use crate::executor::OUT_OF_GAS_CODE;
use crate::infra::signer::{emulated_signature, to_hex};
use crate::ledger::{
    ContractQuery, ExecuteContractMsg, LedgerClient, LedgerError, Settlement, TxAttribute,
    TxEvent, TxLog, TxOptions,
};
use crate::permit::{PermitParams, StdSignDoc, StdSignature, DEFAULT_FEE_DENOM};

/// Код ответа контракта на сообщение, которое он не понял.
pub const PARSE_ERROR_CODE: u32 = 2;
/// Код ответа контракта на отвергнутое сообщение.
pub const CONTRACT_ERROR_CODE: u32 = 5;

/// Сколько игроков контракт принимает в `start_game`.
const MIN_PLAYERS: usize = 2;
const MAX_PLAYERS: usize = 9;

/// Сбой, который леджер вернёт на следующую транзакцию.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerFault {
    /// Запрос не дошёл: состояние не меняется.
    Transport(String),
    /// Транзакция попала в блок, но ответа клиент не дождался.
    Timeout,
}

/// Карты одной раздачи.
#[derive(Clone, Debug)]
struct DealtHand {
    hands: Vec<(String, Vec<Card>)>,
    /// Пять общих карт: flop (3), turn (1), river (1).
    board: Vec<Card>,
    seed: [u8; 32],
}

#[derive(Clone, Debug)]
struct EmulatedTable {
    state: TableState,
    dealt: Option<DealtHand>,
    /// Итог прошлой раздачи, его контракт прикладывает к следующему `start_game`.
    last_hand_log: Option<Value>,
}

impl EmulatedTable {
    fn new(table_id: TableId) -> Self {
        Self {
            state: TableState::new(table_id, 1),
            dealt: None,
            last_hand_log: None,
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    tables: HashMap<TableId, EmulatedTable>,
    faults: VecDeque<LedgerFault>,
    sent: Vec<ExecuteContractMsg>,
    tx_counter: u64,
    random_counter: u64,
    in_flight: HashMap<String, usize>,
    max_in_flight: usize,
}

/// Отказ контракта: ненулевой код и текст лога.
struct Rejection {
    code: u32,
    log: String,
}

impl Rejection {
    fn new(code: u32, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
        }
    }
}

/// Эмулятор ноды с покерным контрактом в памяти.
///
/// Ведёт себя как контракт снаружи: атомарно применяет батчи,
/// режет по газу с кодом 11, пишет ответы в событие `wasm`,
/// раздаёт карты детерминированно от (table_id, hand_ref) и
/// отвечает на приватные запросы только под валидным permit'ом.
#[derive(Debug)]
pub struct InMemoryLedger {
    contract_address: String,
    chain_id: String,
    fee_denom: String,
    latency: Duration,
    inner: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(contract: &ContractRef, chain_id: impl Into<String>) -> Self {
        Self {
            contract_address: contract.address().to_string(),
            chain_id: chain_id.into(),
            fee_denom: DEFAULT_FEE_DENOM.to_string(),
            latency: Duration::ZERO,
            inner: Mutex::new(LedgerState::default()),
        }
    }

    pub fn with_fee_denom(mut self, fee_denom: impl Into<String>) -> Self {
        self.fee_denom = fee_denom.into();
        self
    }

    /// Искусственная задержка на каждую транзакцию.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn inject_fault(&self, fault: LedgerFault) {
        self.inner.lock().await.faults.push_back(fault);
    }

    /// Все сообщения, дошедшие до леджера, в порядке получения.
    pub async fn sent_messages(&self) -> Vec<ExecuteContractMsg> {
        self.inner.lock().await.sent.clone()
    }

    /// Сколько транзакций леджер принял (включая отвергнутые контрактом).
    pub async fn submissions(&self) -> u64 {
        self.inner.lock().await.tx_counter
    }

    /// Авторитетное состояние стола в контракте.
    pub async fn table_state(&self, table_id: TableId) -> Option<TableState> {
        let inner = self.inner.lock().await;
        inner.tables.get(&table_id).map(|t| t.state.clone())
    }

    /// Максимум одновременных транзакций от одного отправителя за всё время.
    pub async fn max_in_flight_per_sender(&self) -> usize {
        self.inner.lock().await.max_in_flight
    }

    async fn enter(&self, sender: &str) {
        let mut inner = self.inner.lock().await;
        let slot = inner.in_flight.entry(sender.to_string()).or_insert(0);
        *slot += 1;
        let now = *slot;
        inner.max_in_flight = inner.max_in_flight.max(now);
    }

    async fn leave(&self, sender: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(slot) = inner.in_flight.get_mut(sender) {
            *slot = slot.saturating_sub(1);
        }
    }

    async fn process(
        &self,
        msgs: &[ExecuteContractMsg],
        opts: &TxOptions,
    ) -> Result<Settlement, LedgerError> {
        let sender = msgs.first().map(|m| m.sender.clone()).unwrap_or_default();

        self.enter(&sender).await;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let result = self.settle(msgs, opts).await;
        self.leave(&sender).await;

        result
    }

    async fn settle(
        &self,
        msgs: &[ExecuteContractMsg],
        opts: &TxOptions,
    ) -> Result<Settlement, LedgerError> {
        let mut inner = self.inner.lock().await;

        let fault = inner.faults.pop_front();
        if let Some(LedgerFault::Transport(reason)) = &fault {
            warn!(%reason, "injected transport failure");
            return Err(LedgerError::Transport(reason.clone()));
        }

        let settlement = self.execute(&mut inner, msgs, opts);

        if fault == Some(LedgerFault::Timeout) {
            warn!(tx_hash = %settlement.tx_hash, "injected timeout after settlement");
            return Err(LedgerError::Timeout {
                tx_hash: Some(settlement.tx_hash),
            });
        }
        Ok(settlement)
    }

    /// Исполнить транзакцию целиком: либо все сообщения, либо ни одного.
    fn execute(
        &self,
        inner: &mut LedgerState,
        msgs: &[ExecuteContractMsg],
        opts: &TxOptions,
    ) -> Settlement {
        inner.tx_counter += 1;
        inner.sent.extend(msgs.iter().cloned());
        let tx_hash = tx_hash(inner.tx_counter);

        let mut settlement = Settlement {
            tx_hash: tx_hash.clone(),
            gas_wanted: opts.gas_limit,
            ..Settlement::default()
        };

        let actions = match self.parse_actions(msgs) {
            Ok(actions) => actions,
            Err(r) => return reject(settlement, r),
        };

        let gas_used = actions
            .iter()
            .map(estimate_action_gas)
            .fold(BASE_TX_GAS, u64::saturating_add);
        settlement.gas_used = gas_used;

        if gas_used > opts.gas_limit {
            let log = format!(
                "out of gas in location: WasmExecute; gasWanted: {}, gasUsed: {gas_used}: out of gas",
                opts.gas_limit
            );
            return reject(settlement, Rejection::new(OUT_OF_GAS_CODE, log));
        }

        let mut tables = inner.tables.clone();
        let mut random_counter = inner.random_counter;
        let mut logs = Vec::with_capacity(actions.len());

        for (idx, action) in actions.iter().enumerate() {
            let attributes = match apply(&mut tables, &mut random_counter, action) {
                Ok(attributes) => attributes,
                Err(r) => {
                    let log = format!("failed to execute message; message index: {idx}: {}", r.log);
                    return reject(settlement, Rejection::new(r.code, log));
                }
            };

            let mut attrs = vec![TxAttribute {
                key: "contract_address".to_string(),
                value: self.contract_address.clone(),
            }];
            attrs.extend(attributes);

            logs.push(TxLog {
                msg_index: idx as u32,
                events: vec![TxEvent {
                    kind: CONTRACT_EVENT_TYPE.to_string(),
                    attributes: attrs,
                }],
            });
        }

        inner.tables = tables;
        inner.random_counter = random_counter;

        debug!(%tx_hash, messages = msgs.len(), gas_used, "transaction settled");

        // Sync/Async: транзакция исполнена, но логов клиент не видит.
        if opts.broadcast_mode.is_confirming() {
            settlement.raw_log = serde_json::to_string(&logs).unwrap_or_default();
            settlement.logs = logs;
        }
        settlement
    }

    fn parse_actions(&self, msgs: &[ExecuteContractMsg]) -> Result<Vec<Action>, Rejection> {
        msgs.iter()
            .enumerate()
            .map(|(idx, m)| {
                if m.contract_address != self.contract_address {
                    return Err(Rejection::new(
                        PARSE_ERROR_CODE,
                        format!("message index: {idx}: no such contract: {}", m.contract_address),
                    ));
                }
                serde_json::from_value::<Action>(m.msg.clone()).map_err(|e| {
                    Rejection::new(
                        PARSE_ERROR_CODE,
                        format!("message index: {idx}: Error parsing into type ExecuteMsg: {e}"),
                    )
                })
            })
            .collect()
    }

    fn answer(&self, state: &LedgerState, query: &Value) -> Result<Value, String> {
        if let Some(envelope) = query.get("with_permit") {
            return self.answer_with_permit(state, envelope);
        }

        if let Some(args) = query.get("get_table") {
            let table_id = table_id_arg(args)?;
            let snapshot = state
                .tables
                .get(&table_id)
                .map(|t| t.state.clone())
                .unwrap_or_else(|| TableState::new(table_id, 1));
            return serde_json::to_value(snapshot).map_err(|e| e.to_string());
        }

        Err(format!("unknown query: {query}"))
    }

    fn answer_with_permit(&self, state: &LedgerState, envelope: &Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct WirePermit {
            params: PermitParams,
            signature: StdSignature,
        }

        let permit: WirePermit = envelope
            .get("permit")
            .cloned()
            .ok_or_else(|| "permit is missing".to_string())
            .and_then(|v| serde_json::from_value(v).map_err(|e| e.to_string()))?;

        let params = &permit.params;
        if params.chain_id != self.chain_id {
            return Err(format!("permit is for chain {}", params.chain_id));
        }
        if !params.allowed_tokens.iter().any(|a| *a == self.contract_address) {
            return Err("permit doesn't apply to this contract".into());
        }

        let doc = StdSignDoc::query_permit(
            &params.chain_id,
            &self.fee_denom,
            json!({
                "permit_name": params.permit_name,
                "allowed_tokens": params.allowed_tokens,
                "permissions": params.permissions,
            }),
        );
        let owner = permit.signature.pub_key.value.clone();
        let expected = emulated_signature(&owner, &doc).map_err(|e| e.to_string())?;
        if expected.signature != permit.signature.signature {
            return Err("failed to verify permit signature".into());
        }

        let query = envelope
            .get("query")
            .ok_or_else(|| "query is missing".to_string())?;

        let (table_id, with_secrets) = if let Some(args) = query.get("get_player_cards") {
            (table_id_arg(args)?, false)
        } else if let Some(args) = query.get("player_private_data") {
            (table_id_arg(args)?, true)
        } else {
            return Err(format!("unknown permit query: {query}"));
        };

        let table = state
            .tables
            .get(&table_id)
            .ok_or_else(|| format!("table {table_id} not found"))?;
        let dealt = table
            .dealt
            .as_ref()
            .ok_or_else(|| format!("no hand in progress at table {table_id}"))?;
        let hand = dealt
            .hands
            .iter()
            .find(|(addr, _)| *addr == owner)
            .map(|(_, cards)| cards.clone())
            .ok_or_else(|| format!("{owner} is not seated at table {table_id}"))?;

        let mut data = PlayerDataResponse {
            table_id,
            hand_ref: table.state.hand_ref,
            hand,
            hand_seed: 0,
            flop_secret: 0,
            turn_secret: 0,
            river_secret: 0,
        };
        if with_secrets {
            data.hand_seed = secret(&dealt.seed, 0);
            data.flop_secret = secret(&dealt.seed, 1);
            data.turn_secret = secret(&dealt.seed, 2);
            data.river_secret = secret(&dealt.seed, 3);
        }

        serde_json::to_value(data).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn execute_contract(
        &self,
        msg: &ExecuteContractMsg,
        opts: &TxOptions,
    ) -> Result<Settlement, LedgerError> {
        self.process(std::slice::from_ref(msg), opts).await
    }

    async fn broadcast(
        &self,
        msgs: &[ExecuteContractMsg],
        opts: &TxOptions,
    ) -> Result<Settlement, LedgerError> {
        self.process(msgs, opts).await
    }

    async fn query_contract(&self, query: &ContractQuery) -> Result<Value, LedgerError> {
        if query.contract_address != self.contract_address {
            return Err(LedgerError::Transport(format!(
                "no such contract: {}",
                query.contract_address
            )));
        }
        let inner = self.inner.lock().await;
        self.answer(&inner, &query.query)
            .map_err(|e| LedgerError::Transport(format!("query failed: {e}")))
    }
}

fn reject(mut settlement: Settlement, r: Rejection) -> Settlement {
    debug!(tx_hash = %settlement.tx_hash, code = r.code, "transaction rejected");
    settlement.code = r.code;
    settlement.raw_log = r.log;
    settlement
}

/// Правила контракта, а не клиента. Контракт мягче локального трекера:
/// - `start_game` принимается в любой момент и затирает текущую раздачу;
/// - улицы открываются в любом порядке, в том числе повторно;
/// - отказ только на неизвестный стол, неверное число игроков и чужих в шоудауне.
fn contract_check(table: Option<&EmulatedTable>, action: &Action) -> Result<(), Rejection> {
    let dealt = table.and_then(|t| t.dealt.as_ref());

    match action {
        Action::StartGame { players, .. } => {
            if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
                return Err(Rejection::new(
                    CONTRACT_ERROR_CODE,
                    format!("invalid player count: {}", players.len()),
                ));
            }
        }
        Action::RevealStreet { table_id, .. } => {
            if dealt.is_none() {
                return Err(table_not_found(*table_id));
            }
        }
        Action::Showdown {
            table_id,
            show_cards,
            ..
        } => {
            let Some(dealt) = dealt else {
                return Err(table_not_found(*table_id));
            };
            if let Some(p) = show_cards
                .iter()
                .find(|p| !dealt.hands.iter().any(|(addr, _)| *addr == p.address))
            {
                return Err(Rejection::new(
                    CONTRACT_ERROR_CODE,
                    format!("player {} not found at table {table_id}", p.address),
                ));
            }
        }
        Action::RandomRequest {} => {}
    }
    Ok(())
}

fn table_not_found(table_id: TableId) -> Rejection {
    Rejection::new(CONTRACT_ERROR_CODE, format!("table {table_id} not found"))
}

/// Исполнить одно сообщение на копии таблиц. Возвращает атрибуты события `wasm`.
fn apply(
    tables: &mut HashMap<TableId, EmulatedTable>,
    random_counter: &mut u64,
    action: &Action,
) -> Result<Vec<TxAttribute>, Rejection> {
    let Some(table_id) = action.table_id() else {
        *random_counter += 1;
        return Ok(vec![TxAttribute {
            key: "random".to_string(),
            value: secret(&tx_seed(*random_counter), 0).to_string(),
        }]);
    };

    contract_check(tables.get(&table_id), action)?;

    let table = tables
        .entry(table_id)
        .or_insert_with(|| EmulatedTable::new(table_id));

    let mut attributes = Vec::new();

    let payload = match action {
        Action::StartGame {
            hand_ref, players, ..
        } => {
            let seed = deal_seed(table_id, *hand_ref);
            let mut deck = Deck::shuffled(seed);
            let hands = players
                .iter()
                .map(|p| (p.address.clone(), deck.draw_n(2)))
                .collect();
            let board = deck.draw_n(5);
            table.dealt = Some(DealtHand { hands, board, seed });

            if let Some(log) = table.last_hand_log.take() {
                attributes.push(TxAttribute {
                    key: PREVIOUS_HAND_LOG_KEY.to_string(),
                    value: log.to_string(),
                });
            }

            let mut state = TableState::new(table_id, *hand_ref);
            state.players = players.clone();
            state.phase = GamePhase::PreFlop;
            table.state = state;

            ResponsePayload::StartGame(StartGameResponse {
                table_id,
                hand_ref: *hand_ref,
                players: players.iter().map(|p| p.address.clone()).collect(),
            })
        }

        Action::RevealStreet { street, .. } => {
            let phase = street.phase();
            let community_cards = street_cards(table, phase)?;

            table.state.revealed_streets.insert(phase);
            if phase > table.state.phase {
                table.state.phase = phase;
            }

            ResponsePayload::CommunityCards(CommunityCardsResponse {
                table_id,
                hand_ref: table.state.hand_ref,
                game_state: phase,
                community_cards,
            })
        }

        Action::Showdown {
            show_cards,
            all_in_showdown,
            ..
        } => {
            let dealt = table
                .dealt
                .as_ref()
                .ok_or_else(|| table_not_found(table_id))?;

            let players_cards = show_cards
                .iter()
                .filter_map(|p| dealt.hands.iter().find(|(addr, _)| *addr == p.address))
                .cloned()
                .collect();

            // При олл-ине досылаем всё, что ещё не открыто.
            let community_cards = if *all_in_showdown && table.state.phase < GamePhase::River {
                let opened = opened_count(table.state.phase);
                Some(dealt.board[opened..].to_vec())
            } else {
                None
            };

            let response = ShowdownResponse {
                table_id,
                hand_ref: table.state.hand_ref,
                players_cards,
                community_cards,
            };
            table.last_hand_log = serde_json::to_value(&response).ok();
            table.state.phase = GamePhase::Showdown;
            ResponsePayload::Showdown(response)
        }

        Action::RandomRequest {} => return Ok(attributes),
    };

    let response = serde_json::to_string(&payload)
        .map_err(|e| Rejection::new(CONTRACT_ERROR_CODE, e.to_string()))?;
    attributes.insert(
        0,
        TxAttribute {
            key: RESPONSE_KEY.to_string(),
            value: response,
        },
    );

    Ok(attributes)
}

/// Сколько общих карт уже открыто в данной фазе.
fn opened_count(phase: GamePhase) -> usize {
    match phase {
        GamePhase::Flop => 3,
        GamePhase::Turn => 4,
        GamePhase::River | GamePhase::Showdown => 5,
        GamePhase::Lobby | GamePhase::PreFlop => 0,
    }
}

/// Карты конкретной улицы: flop три, turn и river по одной.
fn street_cards(table: &EmulatedTable, street: GamePhase) -> Result<Vec<Card>, Rejection> {
    let dealt = table
        .dealt
        .as_ref()
        .ok_or_else(|| table_not_found(table.state.table_id))?;
    let to = opened_count(street);
    let from = match street {
        GamePhase::Flop => 0,
        _ => to.saturating_sub(1),
    };
    Ok(dealt.board[from..to].to_vec())
}

fn table_id_arg(args: &Value) -> Result<TableId, String> {
    args.get("table_id")
        .and_then(Value::as_u64)
        .and_then(|v| TableId::try_from(v).ok())
        .ok_or_else(|| format!("bad table_id in {args}"))
}

/// Seed раздачи: H(domain || table_id || hand_ref).
fn deal_seed(table_id: TableId, hand_ref: HandRef) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"SECRET_POKER_EMULATOR_V1");
    hasher.update(table_id.to_le_bytes());
    hasher.update(hand_ref.to_le_bytes());
    hasher.finalize().into()
}

fn tx_seed(counter: u64) -> [u8; 32] {
    Sha256::digest(counter.to_le_bytes()).into()
}

fn tx_hash(counter: u64) -> String {
    to_hex(&tx_seed(counter)).to_uppercase()
}

fn secret(seed: &[u8; 32], index: u8) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update([index]);
    let hash = hasher.finalize();

    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(out)
}
