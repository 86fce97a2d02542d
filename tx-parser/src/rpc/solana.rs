//! 📡 Solana JSON-RPC + websocket ledger client
//!
//! HTTP calls go through `solana-client`'s nonblocking `RpcClient`. Each log
//! subscription owns one websocket with its own reader task, ping keep-alive
//! and exponential reconnect backoff.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcRequest;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, Duration, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::{LedgerClient, LogNotification, LogSink, SignatureInfo, SubscriptionId};
use crate::error::LedgerError;
use crate::types::RawTransaction;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIBE_REQUEST_ID: u64 = 1;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const PING_INTERVAL: Duration = Duration::from_secs(30);
const INITIAL_RECONNECT_DELAY_SECS: u64 = 2;
const MAX_RECONNECT_DELAY_SECS: u64 = 60;

struct Subscription {
    address: String,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct SolanaLedgerClient {
    rpc: RpcClient,
    ws_url: String,
    commitment: String,
    next_id: AtomicU64,
    subscriptions: DashMap<u64, Subscription>,
}

impl SolanaLedgerClient {
    pub fn new(rpc_url: &str, ws_url: &str, commitment: &str) -> Self {
        Self {
            rpc: RpcClient::new(rpc_url.to_string()),
            ws_url: ws_url.to_string(),
            commitment: commitment.to_string(),
            next_id: AtomicU64::new(1),
            subscriptions: DashMap::new(),
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    async fn send(&self, request: RpcRequest, params: Value) -> Result<Value, LedgerError> {
        self.rpc
            .send::<Value>(request, params)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl LedgerClient for SolanaLedgerClient {
    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let params = json!([address, { "limit": limit, "commitment": self.commitment }]);
        let value = self.send(RpcRequest::GetSignaturesForAddress, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get_parsed_transaction(&self, signature: &str) -> Result<Option<RawTransaction>, LedgerError> {
        let params = json!([
            signature,
            {
                "encoding": "jsonParsed",
                "commitment": self.commitment,
                "maxSupportedTransactionVersion": 0
            }
        ]);
        let value = self.send(RpcRequest::GetTransaction, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn on_logs(&self, address: &str, sink: LogSink) -> Result<SubscriptionId, LedgerError> {
        let (stream, server_id) = open_subscription(&self.ws_url, address, &self.commitment).await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_subscription(
            self.ws_url.clone(),
            address.to_string(),
            self.commitment.clone(),
            stream,
            server_id,
            sink,
            shutdown_rx,
        ));

        self.subscriptions.insert(
            id,
            Subscription {
                address: address.to_string(),
                shutdown: shutdown_tx,
                task,
            },
        );

        info!("📡 Subscribed to logs for {} (subscription {})", address, id);
        Ok(SubscriptionId(id))
    }

    async fn remove_on_logs_listener(&self, id: SubscriptionId) -> Result<(), LedgerError> {
        let (_, subscription) = self
            .subscriptions
            .remove(&id.0)
            .ok_or(LedgerError::UnknownSubscription(id.0))?;

        // The task may already have exited if its sink was dropped.
        let _ = subscription.shutdown.send(());
        if timeout(HANDSHAKE_TIMEOUT, subscription.task).await.is_err() {
            warn!(
                "⚠️ Log reader for {} did not exit in time (subscription {})",
                subscription.address, id
            );
        }

        info!("📡 Removed log subscription {} for {}", id, subscription.address);
        Ok(())
    }
}

fn subscribe_message(address: &str, commitment: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIBE_REQUEST_ID,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [address] },
            { "commitment": commitment }
        ]
    })
}

fn unsubscribe_message(server_id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIBE_REQUEST_ID + 1,
        "method": "logsUnsubscribe",
        "params": [server_id]
    })
}

/// Connects and waits for the subscription confirmation.
async fn open_subscription(
    ws_url: &str,
    address: &str,
    commitment: &str,
) -> Result<(WsStream, u64), LedgerError> {
    let subscribe_error = |reason: String| LedgerError::Subscribe {
        address: address.to_string(),
        reason,
    };

    let (mut stream, _) = timeout(HANDSHAKE_TIMEOUT, connect_async(ws_url))
        .await
        .map_err(|_| subscribe_error("websocket connect timed out".to_string()))?
        .map_err(|e| subscribe_error(e.to_string()))?;

    stream
        .send(Message::Text(subscribe_message(address, commitment).to_string()))
        .await
        .map_err(|e| subscribe_error(e.to_string()))?;

    let confirmation = timeout(HANDSHAKE_TIMEOUT, async {
        while let Some(message) = stream.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => return Err("closed during subscribe".to_string()),
                Ok(_) => continue,
                Err(e) => return Err(e.to_string()),
            };

            let value: Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
            if value.get("id").and_then(Value::as_u64) != Some(SUBSCRIBE_REQUEST_ID) {
                continue;
            }
            if let Some(err) = value.get("error") {
                return Err(err.to_string());
            }
            return value
                .get("result")
                .and_then(Value::as_u64)
                .ok_or_else(|| format!("unexpected subscribe response: {}", text));
        }
        Err("stream ended during subscribe".to_string())
    })
    .await
    .map_err(|_| subscribe_error("subscribe confirmation timed out".to_string()))?
    .map_err(subscribe_error)?;

    debug!("📡 logsSubscribe confirmed for {} (server id {})", address, confirmation);
    Ok((stream, confirmation))
}

fn parse_notification(text: &str, address: &str) -> Option<LogNotification> {
    let value: Value = serde_json::from_str(text).ok()?;
    if value.get("method").and_then(Value::as_str) != Some("logsNotification") {
        return None;
    }

    let inner = value.get("params")?.get("result")?.get("value")?;
    let signature = inner.get("signature")?.as_str()?.to_string();
    let err = inner.get("err").cloned().filter(|err| !err.is_null());

    Some(LogNotification {
        address: address.to_string(),
        signature,
        err,
    })
}

enum StreamExit {
    Shutdown,
    Disconnected(String),
}

async fn pump(
    stream: &mut WsStream,
    address: &str,
    server_id: u64,
    sink: &LogSink,
    shutdown: &mut oneshot::Receiver<()>,
) -> StreamExit {
    let mut ping = interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ping.tick().await;

    loop {
        tokio::select! {
            _ = &mut *shutdown => {
                let _ = stream
                    .send(Message::Text(unsubscribe_message(server_id).to_string()))
                    .await;
                let _ = stream.close(None).await;
                return StreamExit::Shutdown;
            }
            _ = ping.tick() => {
                if let Err(e) = stream.send(Message::Ping(Vec::new())).await {
                    return StreamExit::Disconnected(format!("ping failed: {}", e));
                }
            }
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Some(notification) = parse_notification(&text, address) {
                        if sink.send(notification).is_err() {
                            debug!("Log sink for {} closed, stopping reader", address);
                            return StreamExit::Shutdown;
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = stream.send(Message::Pong(data)).await {
                        return StreamExit::Disconnected(format!("pong failed: {}", e));
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    return StreamExit::Disconnected("closed by server".to_string());
                }
                Some(Err(e)) => return StreamExit::Disconnected(e.to_string()),
                Some(Ok(_)) => {}
            }
        }
    }
}

async fn run_subscription(
    ws_url: String,
    address: String,
    commitment: String,
    mut stream: WsStream,
    mut server_id: u64,
    sink: LogSink,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut reconnect_delay = INITIAL_RECONNECT_DELAY_SECS;

    loop {
        match pump(&mut stream, &address, server_id, &sink, &mut shutdown).await {
            StreamExit::Shutdown => return,
            StreamExit::Disconnected(reason) => {
                warn!("⚠️ Log stream for {} disconnected: {}", address, reason);
            }
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => return,
                _ = sleep(Duration::from_secs(reconnect_delay)) => {}
            }

            match open_subscription(&ws_url, &address, &commitment).await {
                Ok((reconnected, id)) => {
                    info!("📡 Reconnected log stream for {}", address);
                    stream = reconnected;
                    server_id = id;
                    reconnect_delay = INITIAL_RECONNECT_DELAY_SECS;
                    break;
                }
                Err(e) => {
                    error!(
                        "❌ Reconnect for {} failed: {} (retrying in {}s)",
                        address,
                        e,
                        (reconnect_delay * 2).min(MAX_RECONNECT_DELAY_SECS)
                    );
                    reconnect_delay = (reconnect_delay * 2).min(MAX_RECONNECT_DELAY_SECS);
                }
            }
        }
    }
}
