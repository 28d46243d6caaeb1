use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use blindchess_execution::{
    GameConfig, GameError, GameEvent, GameHub, GameId, Notification, PhaseConfig, ShakmatyOracle,
};
use blindchess_types::{
    BlindMove, BlindRules, Color, GamePhase, MoveRecord, ReconciliationResult, RewardConfig,
    Settlement, SquareParseError,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time;
use tracing::{info, warn};

#[derive(Clone, Debug)]
struct BlindTableConfig {
    tick_ms: u64,
    game: GameConfig,
}

impl BlindTableConfig {
    fn from_env() -> Self {
        let defaults = GameConfig::default();
        Self {
            tick_ms: read_u64("BLIND_TABLE_TICK_MS", 250),
            game: GameConfig {
                rules: BlindRules {
                    max_total_moves: read_u8(
                        "BLIND_TABLE_MAX_TOTAL_MOVES",
                        defaults.rules.max_total_moves,
                    ),
                    max_moves_per_piece: read_u8(
                        "BLIND_TABLE_MAX_MOVES_PER_PIECE",
                        defaults.rules.max_moves_per_piece,
                    ),
                },
                rewards: RewardConfig {
                    valid_reward: read_u64("BLIND_TABLE_VALID_REWARD", defaults.rewards.valid_reward),
                    capture_bonus: read_u64(
                        "BLIND_TABLE_CAPTURE_BONUS",
                        defaults.rewards.capture_bonus,
                    ),
                    invalid_penalty: read_u64(
                        "BLIND_TABLE_INVALID_PENALTY",
                        defaults.rewards.invalid_penalty,
                    ),
                    opponent_bonus: read_u64(
                        "BLIND_TABLE_OPPONENT_BONUS",
                        defaults.rewards.opponent_bonus,
                    ),
                    commission_bps: read_u16(
                        "BLIND_TABLE_COMMISSION_BPS",
                        defaults.rewards.commission_bps,
                    ),
                },
                phases: PhaseConfig {
                    blind_ms: read_u64("BLIND_TABLE_BLIND_MS", defaults.phases.blind_ms),
                    playback_ms_per_move: read_u64(
                        "BLIND_TABLE_PLAYBACK_MS_PER_MOVE",
                        defaults.phases.playback_ms_per_move,
                    ),
                    live_ms: read_u64("BLIND_TABLE_LIVE_MS", defaults.phases.live_ms),
                },
                entry_fee: read_u64("BLIND_TABLE_ENTRY_FEE", defaults.entry_fee),
            },
        }
    }
}

fn read_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_u16(key: &str, fallback: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(fallback)
}

fn read_u8(key: &str, fallback: u8) -> u8 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u8>().ok())
        .unwrap_or(fallback)
}

/// Milliseconds since the service started; the only clock the games ever see.
#[derive(Clone, Copy, Debug)]
struct Clock {
    started: Instant,
}

impl Clock {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[derive(Debug)]
enum BlindTableError {
    NotSeated,
    InvalidSquare(SquareParseError),
    Game(GameError),
}

impl From<GameError> for BlindTableError {
    fn from(value: GameError) -> Self {
        BlindTableError::Game(value)
    }
}

impl From<SquareParseError> for BlindTableError {
    fn from(value: SquareParseError) -> Self {
        BlindTableError::InvalidSquare(value)
    }
}

/// Maps client requests onto the game hub. Every method takes `now_ms` so the table itself
/// never reads a clock.
struct BlindTable {
    hub: GameHub<ShakmatyOracle>,
}

impl BlindTable {
    fn new(config: GameConfig) -> Result<Self, GameError> {
        Ok(Self {
            hub: GameHub::new(ShakmatyOracle, config)?,
        })
    }

    fn seat_of(&self, player_id: &str) -> Result<(GameId, Color), BlindTableError> {
        self.hub
            .find_player(player_id)
            .ok_or(BlindTableError::NotSeated)
    }

    fn handle_join(
        &mut self,
        player_id: &str,
        now_ms: u64,
    ) -> Result<(SeatView, Vec<GameEvent>), BlindTableError> {
        let (game_id, color, events) = self.hub.seat_player(player_id, now_ms)?;
        let seat = self.seat_view(game_id, color);
        Ok((seat, events))
    }

    fn seat_view(&self, game_id: GameId, color: Color) -> SeatView {
        let game = self.hub.game(game_id);
        SeatView {
            game_id,
            color,
            phase: game.map_or(GamePhase::Waiting, |game| game.current_phase()),
            phase_ends_at_ms: game.and_then(|game| game.phase_ends_at_ms()),
            queued: game.map_or_else(Vec::new, |game| game.preview(color).records().to_vec()),
            submitted: game.is_some_and(|game| game.sequence(color).is_submitted()),
        }
    }

    fn handle_move(
        &mut self,
        player_id: &str,
        from: &str,
        to: &str,
        now_ms: u64,
    ) -> Result<MoveRecord, BlindTableError> {
        let mv = BlindMove::parse(from, to)?;
        let (game_id, color) = self.seat_of(player_id)?;
        let game = self
            .hub
            .game_mut(game_id)
            .ok_or(BlindTableError::NotSeated)?;
        Ok(game.submit_blind_move(color, mv, now_ms)?)
    }

    fn handle_undo(&mut self, player_id: &str, now_ms: u64) -> Result<SeatView, BlindTableError> {
        let (game_id, color) = self.seat_of(player_id)?;
        if let Some(game) = self.hub.game_mut(game_id) {
            game.undo_last_blind_move(color, now_ms)?;
        }
        Ok(self.seat_view(game_id, color))
    }

    fn handle_reset(&mut self, player_id: &str, now_ms: u64) -> Result<SeatView, BlindTableError> {
        let (game_id, color) = self.seat_of(player_id)?;
        if let Some(game) = self.hub.game_mut(game_id) {
            game.reset_blind_sequence(color, now_ms)?;
        }
        Ok(self.seat_view(game_id, color))
    }

    fn handle_submit(
        &mut self,
        player_id: &str,
        now_ms: u64,
    ) -> Result<Vec<GameEvent>, BlindTableError> {
        let (game_id, color) = self.seat_of(player_id)?;
        Ok(self
            .hub
            .notify(game_id, Notification::SequenceSubmitted { color }, now_ms)?)
    }

    fn handle_reconnect(
        &mut self,
        player_id: &str,
        now_ms: u64,
    ) -> Result<(SeatView, Vec<GameEvent>), BlindTableError> {
        let (game_id, color) = self.seat_of(player_id)?;
        let events = self.hub.notify(game_id, Notification::Reconnect, now_ms)?;
        Ok((self.seat_view(game_id, color), events))
    }

    fn handle_playback_done(
        &mut self,
        player_id: &str,
        now_ms: u64,
    ) -> Result<Vec<GameEvent>, BlindTableError> {
        let (game_id, _) = self.seat_of(player_id)?;
        Ok(self
            .hub
            .notify(game_id, Notification::PlaybackFinished, now_ms)?)
    }

    fn tick(&mut self, now_ms: u64) -> Vec<OutboundEvent> {
        let events = self.hub.tick(now_ms);
        let outbound = self.to_outbound(events);
        let pruned = self.hub.prune_finished();
        if pruned > 0 {
            info!(pruned, "finished games pruned");
        }
        outbound
    }

    /// Convert state-machine events into wire events. Must run before finished games are
    /// pruned so live starts can still be read.
    fn to_outbound(&self, events: Vec<GameEvent>) -> Vec<OutboundEvent> {
        events
            .into_iter()
            .map(|event| match event {
                GameEvent::PhaseChanged {
                    game_id,
                    from,
                    to,
                    phase_ends_at_ms,
                } => {
                    let live = (to == GamePhase::Live)
                        .then(|| self.hub.game(game_id).and_then(|game| game.live()))
                        .flatten()
                        .map(|live| LiveView {
                            fen: live.fen.clone(),
                            clocks_ms: live.clocks_ms,
                        });
                    OutboundEvent::Phase {
                        game_id,
                        from,
                        to,
                        phase_ends_at_ms,
                        live,
                    }
                }
                GameEvent::SequenceSubmitted {
                    game_id,
                    color,
                    moves,
                } => OutboundEvent::Submitted {
                    game_id,
                    color,
                    moves,
                },
                GameEvent::Revealed { game_id, result } => {
                    OutboundEvent::Revealed { game_id, result }
                }
                GameEvent::Settled {
                    game_id,
                    settlement,
                } => OutboundEvent::Settled {
                    game_id,
                    settlement,
                },
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize)]
struct SeatView {
    #[serde(rename = "gameId")]
    game_id: GameId,
    color: Color,
    phase: GamePhase,
    #[serde(rename = "phaseEndsAtMs", skip_serializing_if = "Option::is_none")]
    phase_ends_at_ms: Option<u64>,
    queued: Vec<MoveRecord>,
    submitted: bool,
}

#[derive(Clone, Debug, Serialize)]
struct LiveView {
    fen: String,
    #[serde(rename = "clocksMs")]
    clocks_ms: [u64; 2],
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
enum OutboundEvent {
    #[serde(rename = "phase")]
    Phase {
        #[serde(rename = "gameId")]
        game_id: GameId,
        from: GamePhase,
        to: GamePhase,
        #[serde(rename = "phaseEndsAtMs", skip_serializing_if = "Option::is_none")]
        phase_ends_at_ms: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        live: Option<LiveView>,
    },
    #[serde(rename = "submitted")]
    Submitted {
        #[serde(rename = "gameId")]
        game_id: GameId,
        color: Color,
        moves: usize,
    },
    #[serde(rename = "revealed")]
    Revealed {
        #[serde(rename = "gameId")]
        game_id: GameId,
        result: ReconciliationResult,
    },
    #[serde(rename = "settled")]
    Settled {
        #[serde(rename = "gameId")]
        game_id: GameId,
        settlement: Settlement,
    },
}

impl OutboundEvent {
    fn game_id(&self) -> GameId {
        match self {
            OutboundEvent::Phase { game_id, .. }
            | OutboundEvent::Submitted { game_id, .. }
            | OutboundEvent::Revealed { game_id, .. }
            | OutboundEvent::Settled { game_id, .. } => *game_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum InboundMessage {
    #[serde(rename = "join")]
    Join {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "move")]
    Move {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
        from: String,
        to: String,
    },
    #[serde(rename = "undo")]
    Undo {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "reset")]
    Reset {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "submit")]
    Submit {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "reconnect")]
    Reconnect {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "playback_done")]
    PlaybackDone {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
}

impl InboundMessage {
    fn player_id(&self) -> &str {
        match self {
            InboundMessage::Join { player_id, .. }
            | InboundMessage::Move { player_id, .. }
            | InboundMessage::Undo { player_id, .. }
            | InboundMessage::Reset { player_id, .. }
            | InboundMessage::Submit { player_id, .. }
            | InboundMessage::Reconnect { player_id, .. }
            | InboundMessage::PlaybackDone { player_id, .. } => player_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum OutboundResponse {
    #[serde(rename = "ack")]
    Ack {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "seat")]
    Seat {
        #[serde(rename = "requestId")]
        request_id: String,
        seat: SeatView,
    },
    #[serde(rename = "queued")]
    Queued {
        #[serde(rename = "requestId")]
        request_id: String,
        record: MoveRecord,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(rename = "requestId")]
        request_id: String,
        code: String,
        message: String,
    },
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

#[derive(Clone)]
struct AppState {
    table: Arc<Mutex<BlindTable>>,
    broadcaster: broadcast::Sender<OutboundEvent>,
    clock: Clock,
}

/// One loop per socket: client requests and table events are interleaved on the same
/// sender. Only events for the table this socket's player sits at are forwarded.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.broadcaster.subscribe();
    let mut seated: Option<GameId> = None;

    loop {
        let payload = tokio::select! {
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<InboundMessage>(&text) {
                        Ok(inbound) => {
                            let response = handle_inbound(inbound, &state, &mut seated);
                            serde_json::to_string(&response).ok()
                        }
                        Err(err) => {
                            warn!(?err, "invalid inbound message");
                            None
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => None,
            },
            event = events.recv() => match event {
                Ok(event) if forwards(seated, &event) => serde_json::to_string(&event).ok(),
                Ok(_) => None,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, game_id = ?seated, "socket fell behind table events");
                    None
                }
                Err(RecvError::Closed) => break,
            },
        };
        if let Some(payload) = payload {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    }
}

fn forwards(seated: Option<GameId>, event: &OutboundEvent) -> bool {
    seated == Some(event.game_id())
}

fn handle_inbound(
    inbound: InboundMessage,
    state: &AppState,
    seated: &mut Option<GameId>,
) -> OutboundResponse {
    let now_ms = state.clock.now_ms();
    let mut table = match state.table.lock() {
        Ok(table) => table,
        Err(poisoned) => poisoned.into_inner(),
    };
    let player_id = inbound.player_id().to_string();
    let (request_id, outcome) = match inbound {
        InboundMessage::Join {
            request_id,
            player_id,
        } => {
            let outcome = table
                .handle_join(&player_id, now_ms)
                .map(|(seat, events)| (Reply::Seat(seat), events));
            (request_id, outcome)
        }
        InboundMessage::Move {
            request_id,
            player_id,
            from,
            to,
        } => {
            let outcome = table
                .handle_move(&player_id, &from, &to, now_ms)
                .map(|record| (Reply::Queued(record), Vec::new()));
            (request_id, outcome)
        }
        InboundMessage::Undo {
            request_id,
            player_id,
        } => {
            let outcome = table
                .handle_undo(&player_id, now_ms)
                .map(|seat| (Reply::Seat(seat), Vec::new()));
            (request_id, outcome)
        }
        InboundMessage::Reset {
            request_id,
            player_id,
        } => {
            let outcome = table
                .handle_reset(&player_id, now_ms)
                .map(|seat| (Reply::Seat(seat), Vec::new()));
            (request_id, outcome)
        }
        InboundMessage::Submit {
            request_id,
            player_id,
        } => {
            let outcome = table
                .handle_submit(&player_id, now_ms)
                .map(|events| (Reply::Ack, events));
            (request_id, outcome)
        }
        InboundMessage::Reconnect {
            request_id,
            player_id,
        } => {
            let outcome = table
                .handle_reconnect(&player_id, now_ms)
                .map(|(seat, events)| (Reply::Seat(seat), events));
            (request_id, outcome)
        }
        InboundMessage::PlaybackDone {
            request_id,
            player_id,
        } => {
            let outcome = table
                .handle_playback_done(&player_id, now_ms)
                .map(|events| (Reply::Ack, events));
            (request_id, outcome)
        }
    };

    match outcome {
        Ok((reply, events)) => {
            // Follow the player's table before its events go out.
            if let Ok((game_id, _)) = table.seat_of(&player_id) {
                *seated = Some(game_id);
            }
            for event in table.to_outbound(events) {
                let _ = state.broadcaster.send(event);
            }
            reply.into_response(request_id)
        }
        Err(err) => error_response(request_id, err),
    }
}

/// Per-request payload returned to the caller only.
enum Reply {
    Ack,
    Seat(SeatView),
    Queued(MoveRecord),
}

impl Reply {
    fn into_response(self, request_id: String) -> OutboundResponse {
        match self {
            Reply::Ack => OutboundResponse::Ack { request_id },
            Reply::Seat(seat) => OutboundResponse::Seat { request_id, seat },
            Reply::Queued(record) => OutboundResponse::Queued { request_id, record },
        }
    }
}

fn error_response(request_id: String, err: BlindTableError) -> OutboundResponse {
    let (code, message) = match err {
        BlindTableError::NotSeated => ("NOT_SEATED".to_string(), "NOT_SEATED".to_string()),
        BlindTableError::InvalidSquare(err) => ("INVALID_SQUARE".to_string(), err.to_string()),
        BlindTableError::Game(GameError::Rejected(result)) => {
            ("MOVE_REJECTED".to_string(), result.message())
        }
        BlindTableError::Game(err @ GameError::WrongPhase { .. }) => {
            ("WRONG_PHASE".to_string(), err.to_string())
        }
        BlindTableError::Game(err @ GameError::AlreadySubmitted { .. }) => {
            ("ALREADY_SUBMITTED".to_string(), err.to_string())
        }
        BlindTableError::Game(err @ GameError::TableFull) => {
            ("TABLE_FULL".to_string(), err.to_string())
        }
        BlindTableError::Game(err) => ("GAME_ERROR".to_string(), err.to_string()),
    };
    OutboundResponse::Error {
        request_id,
        code,
        message,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let host = std::env::var("BLIND_TABLE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("BLIND_TABLE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9124);

    let config = BlindTableConfig::from_env();
    let table = BlindTable::new(config.game)
        .map_err(|err| anyhow::anyhow!("invalid game config: {err}"))?;
    let table = Arc::new(Mutex::new(table));
    let (broadcaster, _) = broadcast::channel::<OutboundEvent>(1024);
    let clock = Clock::new();
    let tick_ms = config.tick_ms;

    let state = AppState {
        table: table.clone(),
        broadcaster: broadcaster.clone(),
        clock,
    };

    // Tick loop
    let tick_table = table.clone();
    let tick_broadcaster = broadcaster.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;
            let events = {
                let mut table = match tick_table.lock() {
                    Ok(table) => table,
                    Err(poisoned) => poisoned.into_inner(),
                };
                table.tick(clock.now_ms())
            };
            for event in events {
                let _ = tick_broadcaster.send(event);
            }
        }
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("invalid listen addr")?;
    info!(%addr, "blind table service listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> BlindTable {
        BlindTable::new(GameConfig::default()).unwrap()
    }

    #[test]
    fn test_join_then_move_and_submit() {
        let mut table = table();
        let (seat, events) = table.handle_join("alice", 0).unwrap();
        assert_eq!(seat.color, Color::White);
        assert_eq!(seat.phase, GamePhase::Waiting);
        assert!(events.is_empty());

        let (seat, events) = table.handle_join("bob", 0).unwrap();
        assert_eq!(seat.color, Color::Black);
        assert_eq!(seat.phase, GamePhase::Blind);
        assert_eq!(events.len(), 1);

        let record = table.handle_move("alice", "e2", "e4", 10).unwrap();
        assert_eq!(record.san_label, "e4");
        table.handle_submit("alice", 20).unwrap();
        let events = table.handle_submit("bob", 30).unwrap();
        let outbound = table.to_outbound(events);
        assert!(outbound
            .iter()
            .any(|event| matches!(event, OutboundEvent::Revealed { .. })));
        assert!(outbound
            .iter()
            .any(|event| matches!(event, OutboundEvent::Settled { .. })));
    }

    #[test]
    fn test_errors_map_to_codes() {
        let mut table = table();
        let err = table.handle_move("ghost", "e2", "e4", 0).unwrap_err();
        assert!(matches!(
            error_response("1".to_string(), err),
            OutboundResponse::Error { ref code, .. } if code == "NOT_SEATED"
        ));

        table.handle_join("alice", 0).unwrap();
        table.handle_join("bob", 0).unwrap();
        let err = table.handle_move("alice", "e2", "z9", 0).unwrap_err();
        assert!(matches!(err, BlindTableError::InvalidSquare(_)));

        let err = table.handle_move("alice", "e2", "e5", 0).unwrap_err();
        match error_response("2".to_string(), err) {
            OutboundResponse::Error { code, message, .. } => {
                assert_eq!(code, "MOVE_REJECTED");
                assert!(message.contains("e2-e5"));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_tick_announces_live_start_then_prunes() {
        let mut table = table();
        table.handle_join("alice", 0).unwrap();
        table.handle_join("bob", 0).unwrap();

        let events = table.tick(60_000);
        let live = events.iter().find_map(|event| match event {
            OutboundEvent::Phase {
                to: GamePhase::Live,
                live,
                ..
            } => live.clone(),
            _ => None,
        });
        let live = live.expect("live start announced");
        assert_eq!(live.clocks_ms, [300_000, 300_000]);
        assert!(table.hub.is_empty());
        assert!(matches!(
            table.handle_submit("alice", 60_001),
            Err(BlindTableError::NotSeated)
        ));
    }

    #[test]
    fn test_events_only_reach_their_table() {
        let mut table = table();
        table.handle_join("alice", 0).unwrap();
        let (first, _) = table.handle_join("bob", 0).unwrap();
        table.handle_join("carol", 0).unwrap();
        let (second, events) = table.handle_join("dave", 0).unwrap();
        assert_ne!(first.game_id, second.game_id);

        let outbound = table.to_outbound(events);
        assert_eq!(outbound.len(), 1);
        assert!(forwards(Some(second.game_id), &outbound[0]));
        assert!(!forwards(Some(first.game_id), &outbound[0]));
        assert!(!forwards(None, &outbound[0]));

        let events = table.handle_submit("alice", 10).unwrap();
        let outbound = table.to_outbound(events);
        assert!(outbound
            .iter()
            .all(|event| event.game_id() == first.game_id));
    }

    #[test]
    fn test_inbound_wire_format() {
        let inbound: InboundMessage = serde_json::from_str(
            r#"{"type":"move","requestId":"7","playerId":"alice","from":"g1","to":"f3"}"#,
        )
        .unwrap();
        assert!(matches!(
            inbound,
            InboundMessage::Move { ref from, ref to, .. } if from == "g1" && to == "f3"
        ));
        let inbound: InboundMessage =
            serde_json::from_str(r#"{"type":"playback_done","requestId":"8","playerId":"bob"}"#)
                .unwrap();
        assert!(matches!(inbound, InboundMessage::PlaybackDone { .. }));
        assert_eq!(inbound.player_id(), "bob");
    }
}
