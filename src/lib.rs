//! arbiter - concurrent prediction-market arbitrage and directional trading bot.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── core/             # Reusable library components
//! │   ├── domain/       # Pure domain types (market, signal, position, pnl)
//! │   ├── feed/         # Spot-price streaming client (C1)
//! │   ├── exchange/     # Exchange facade traits + implementations (C2)
//! │   ├── metadata/     # Market-metadata HTTP client (C3)
//! │   ├── scanner/       # Discovery loops (C4)
//! │   ├── signal_engine/ # Strategy detectors (C5)
//! │   ├── risk/          # Risk guard (C6)
//! │   ├── executor/      # Multi-leg order execution (C7)
//! │   ├── resolver/      # Position resolution + PnL rollup (C8)
//! │   └── store/         # Persistence trait + SQLite/in-memory backends
//! └── app/              # Configuration and task orchestration
//! ```

pub mod app;
pub mod cli;
pub mod core;
pub mod error;
