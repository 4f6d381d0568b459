//! Spot price feed (C1): a websocket client for the reference crypto prices
//! the late-market strategy correlates against prediction-market moves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

const HISTORY_CAPACITY: usize = 60;
const RECV_TIMEOUT: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_VOLATILITY_WINDOW: usize = 30;

/// Symbols tracked for late-market correlation, lowercase as Binance expects them.
pub const SYMBOLS: &[&str] = &["btcusdt", "ethusdt", "solusdt", "xrpusdt"];

#[derive(Debug, Clone, Default)]
struct SymbolState {
    last_price: Option<Decimal>,
    history: Vec<Decimal>,
}

impl SymbolState {
    fn push(&mut self, price: Decimal) {
        self.last_price = Some(price);
        self.history.push(price);
        if self.history.len() > HISTORY_CAPACITY {
            self.history.remove(0);
        }
    }
}

/// Shared, lock-free-to-readers view of the latest spot prices and rolling
/// history per symbol. Cloned cheaply (it's an `Arc` around the lock); the
/// feed task is the sole writer.
#[derive(Clone)]
pub struct PriceFeed {
    state: Arc<RwLock<HashMap<String, SymbolState>>>,
}

impl PriceFeed {
    #[must_use]
    pub fn new() -> Self {
        let mut map = HashMap::with_capacity(SYMBOLS.len());
        for symbol in SYMBOLS {
            map.insert((*symbol).to_string(), SymbolState::default());
        }
        Self {
            state: Arc::new(RwLock::new(map)),
        }
    }

    /// Latest traded price for `symbol` (case-insensitive), if any has arrived.
    #[must_use]
    pub fn latest(&self, symbol: &str) -> Option<Decimal> {
        self.state.read().get(&symbol.to_lowercase())?.last_price
    }

    /// Percentage standard deviation over the trailing `window` prices,
    /// matching the reference volatility formula: `stddev / mean * 100`.
    #[must_use]
    pub fn volatility(&self, symbol: &str, window: usize) -> Decimal {
        let guard = self.state.read();
        let Some(state) = guard.get(&symbol.to_lowercase()) else {
            return Decimal::ZERO;
        };
        if state.history.len() < 2 {
            return Decimal::ZERO;
        }
        let start = state.history.len().saturating_sub(window);
        let recent = &state.history[start..];
        volatility_pct(recent)
    }

    /// Point-in-time copy of the ring buffer for `symbol`, oldest first.
    #[must_use]
    pub fn history_snapshot(&self, symbol: &str) -> Vec<Decimal> {
        self.state
            .read()
            .get(&symbol.to_lowercase())
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// Whether at least one price has been observed for every tracked symbol.
    #[must_use]
    pub fn is_warm(&self) -> bool {
        let guard = self.state.read();
        SYMBOLS
            .iter()
            .all(|symbol| guard.get(*symbol).is_some_and(|s| s.last_price.is_some()))
    }

    fn record(&self, symbol: &str, price: Decimal) {
        let mut guard = self.state.write();
        guard.entry(symbol.to_string()).or_default().push(price);
    }
}

impl Default for PriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

fn volatility_pct(prices: &[Decimal]) -> Decimal {
    if prices.len() < 2 {
        return Decimal::ZERO;
    }
    let count = Decimal::from(prices.len());
    let mean = prices.iter().sum::<Decimal>() / count;
    if mean.is_zero() {
        return Decimal::ZERO;
    }
    let variance = prices.iter().map(|p| (*p - mean) * (*p - mean)).sum::<Decimal>() / count;
    let std_dev = Decimal::from_f64_retain(variance.to_f64().unwrap_or(0.0).sqrt())
        .unwrap_or(Decimal::ZERO);
    std_dev / mean * Decimal::from(100)
}

#[derive(Debug, Deserialize)]
struct CombinedEnvelope {
    data: TickerPayload,
}

#[derive(Debug, Deserialize)]
struct TickerPayload {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c")]
    close_price: String,
}

/// Runs the reconnecting websocket feed loop until `shutdown` fires.
///
/// Mirrors the reference client's 5-second reconnect backoff and 30-second
/// silent-connection timeout: the first silent window is answered with a
/// ping, but a second consecutive one closes the connection and forces a
/// reconnect rather than pinging forever.
pub async fn run(feed: PriceFeed, ws_url: &str, mut shutdown: watch::Receiver<bool>) {
    let stream_path = SYMBOLS
        .iter()
        .map(|s| format!("{s}@ticker"))
        .collect::<Vec<_>>()
        .join("/");
    let url = format!("{}/{}", ws_url.trim_end_matches('/'), stream_path);

    info!("starting spot price feed");
    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            result = connect_and_listen(&feed, &url, &mut shutdown) => {
                if let Err(err) = result {
                    warn!(error = %err, "price feed connection lost");
                }
            }
            _ = shutdown.changed() => break,
        }

        if *shutdown.borrow() {
            break;
        }
        info!(delay_secs = RECONNECT_DELAY.as_secs(), "reconnecting to spot price feed");
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
    info!("spot price feed stopped");
}

async fn connect_and_listen(
    feed: &PriceFeed,
    url: &str,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
    info!("connected to spot price feed");
    let (mut write, mut read) = ws_stream.split();

    let mut consecutive_silent_windows = 0u32;
    loop {
        tokio::select! {
            message = timeout(RECV_TIMEOUT, read.next()) => {
                match message {
                    Ok(Some(Ok(Message::Text(text)))) => {
                        consecutive_silent_windows = 0;
                        process_message(feed, &text);
                    }
                    Ok(Some(Ok(Message::Ping(payload)))) => {
                        consecutive_silent_windows = 0;
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Ok(Some(Ok(_))) => {
                        consecutive_silent_windows = 0;
                    }
                    Ok(Some(Err(err))) => return Err(err),
                    Ok(None) => return Ok(()),
                    Err(_elapsed) => {
                        consecutive_silent_windows += 1;
                        if consecutive_silent_windows >= 2 {
                            warn!("no price feed message for two consecutive 30s windows, forcing reconnect");
                            return Ok(());
                        }
                        debug!("no price feed message in 30s, sending ping");
                        write.send(Message::Ping(Vec::new())).await?;
                    }
                }
            }
            _ = shutdown.changed() => return Ok(()),
        }
    }
}

fn process_message(feed: &PriceFeed, text: &str) {
    let payload = match serde_json::from_str::<CombinedEnvelope>(text) {
        Ok(envelope) => envelope.data,
        Err(_) => match serde_json::from_str::<TickerPayload>(text) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, "unrecognized price feed message");
                return;
            }
        },
    };

    let symbol = payload.symbol.to_lowercase();
    if !SYMBOLS.contains(&symbol.as_str()) {
        return;
    }
    match payload.close_price.parse::<Decimal>() {
        Ok(price) if price > Decimal::ZERO => feed.record(&symbol, price),
        _ => debug!(symbol, raw = %payload.close_price, "unparseable price"),
    }
}

#[must_use]
pub fn default_volatility_window() -> usize {
    DEFAULT_VOLATILITY_WINDOW
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn latest_returns_none_before_any_price() {
        let feed = PriceFeed::new();
        assert_eq!(feed.latest("btcusdt"), None);
    }

    #[test]
    fn record_updates_latest_and_history() {
        let feed = PriceFeed::new();
        feed.record("btcusdt", dec!(50000));
        feed.record("BTCUSDT", dec!(50100));
        assert_eq!(feed.latest("btcusdt"), Some(dec!(50100)));
    }

    #[test]
    fn history_capped_at_60_entries() {
        let feed = PriceFeed::new();
        for i in 0..100 {
            feed.record("ethusdt", Decimal::from(3000 + i));
        }
        let guard = feed.state.read();
        assert_eq!(guard.get("ethusdt").unwrap().history.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn volatility_zero_with_fewer_than_two_points() {
        let feed = PriceFeed::new();
        feed.record("solusdt", dec!(100));
        assert_eq!(feed.volatility("solusdt", 30), Decimal::ZERO);
    }

    #[test]
    fn volatility_nonzero_for_varying_prices() {
        let feed = PriceFeed::new();
        for p in [dec!(100), dec!(110), dec!(90), dec!(105)] {
            feed.record("xrpusdt", p);
        }
        assert!(feed.volatility("xrpusdt", 30) > Decimal::ZERO);
    }

    #[test]
    fn is_warm_requires_every_symbol() {
        let feed = PriceFeed::new();
        assert!(!feed.is_warm());
        for symbol in SYMBOLS {
            feed.record(symbol, dec!(1));
        }
        assert!(feed.is_warm());
    }
}
