//! # Route Aggregator SDK
//!
//! Client-side SDK for an on-chain DEX route aggregator. It asks the aggregator's helper
//! contracts for the best route between two tokens, measures pool depth around the mid price,
//! and turns a chosen route into call data for the settlement contract.
//!
//! ## Overview
//!
//! - **Routing**: single-path, split and one-pool routes from the route helper, normalized
//! - **Liquidity**: per-pool depth curves fitted from sampled quotes
//! - **Encoding**: `mixSwap` / `multiSwap` payloads, ready to sign
//!
//! ## Architecture
//!
//! ### Chain Access
//! All reads go through `backend::AggregatorBackend`. `backend::ChainBackend` implements it with
//! ethers contract bindings and batches adapter lookups through Multicall.
//!
//! ### Numerics
//! Amounts and prices are WAD-scaled `U256` on chain. Curve fitting works in human units (`f64`).
//!
//! ### Facade
//! `aggregator::Aggregator` owns the adapter cache and exposes every query and encode operation.

// Core Types
/// Pairs, pool types and route shapes
pub mod types;
/// SDK error type
pub mod error;

// Numerics
/// WAD math and base-unit conversions
pub mod normalization;
/// Dex flags and packed payload words
pub mod flags;

// Liquidity Analysis
/// Quote sampling and spline fitting
pub mod curve_fitter;
/// Depth at target prices
pub mod liquidity;

// Routing & Encoding
/// Route normalization
pub mod router;
/// Settlement payload builders
pub mod encoder;
/// Facade over routing, liquidity and encoding
pub mod aggregator;

// Infrastructure
/// Chain access traits and the ethers implementation
pub mod backend;
/// Multicall batching
pub mod multicall;
/// Metrics (no-ops unless the `observability` feature is on)
pub mod metrics;

// Contracts (Public ABIs Only)
pub mod contracts;

// Settings & Configuration
pub mod settings;

// Re-exports for convenience
pub use aggregator::{Aggregator, EncodeOptions, LiquidityOptions};
pub use backend::{AggregatorBackend, ChainBackend, LiquiditySampler};
pub use encoder::UnsignedSwapTx;
pub use error::AggregatorError;
pub use settings::Settings;
pub use types::{Pair, PoolType, SwapType};
