//! # Route Quote CLI
//!
//! Command-line front end for the aggregator SDK: quotes routes, lists pools, measures pool
//! depth and prints unsigned swap transactions. With `--send` the encoded swap is signed with
//! `SDK_PRIVATE_KEY` and broadcast.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin route_quote -- single --from 0x... --to 0x... --amount 1000000
//! cargo run --bin route_quote -- encode-multi --from 0x... --to 0x... --amount 1000000
//! ```
//!
//! Settings come from `Config.toml` plus `SDK_*` environment variables (`.env` is honored).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethers::prelude::{Http, LocalWallet, Provider, Signer, SignerMiddleware};
use ethers::types::{Address, U256};
use log::info;
use route_aggregator_sdk::{
    curve_fitter::PairDecimals,
    encoder::submit,
    types::conversions::string_to_address,
    Aggregator, ChainBackend, EncodeOptions, LiquidityOptions, PoolType, Settings, UnsignedSwapTx,
};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "route_quote", about = "Quote and encode aggregator routes")]
struct Cli {
    /// Overrides the RPC URL from settings
    #[arg(long)]
    rpc_url: Option<String>,
    /// Pool type ids to leave out of route queries
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<u8>,
    /// Sign and broadcast encoded swaps
    #[arg(long)]
    send: bool,
    /// Serve Prometheus metrics on this address
    #[cfg(feature = "observability")]
    #[arg(long)]
    metrics_addr: Option<std::net::SocketAddr>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Best single-path route
    Single {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        /// One-hop routes only
        #[arg(long)]
        direct: bool,
    },
    /// Best split route
    Split {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        direct: bool,
        #[arg(long)]
        split_count: Option<u32>,
        #[arg(long)]
        middle: Option<String>,
    },
    /// Pools trading a pair
    Pools {
        #[arg(long)]
        token_a: String,
        #[arg(long)]
        token_b: String,
    },
    /// Pool depth around the mid price
    Liquidity {
        #[arg(long)]
        token_a: String,
        #[arg(long)]
        token_b: String,
        #[arg(long)]
        decimals0: u8,
        #[arg(long)]
        decimals1: u8,
        /// Relative offsets from mid, e.g. 0.005,0.01,0.02
        #[arg(long, value_delimiter = ',', default_value = "0.005,0.01,0.02,0.05")]
        multipliers: Vec<f64>,
    },
    /// Single route encoded as `mixSwap`
    EncodeMix {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        slippage_bps: Option<u64>,
    },
    /// Split route encoded as `multiSwap`
    EncodeMulti {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        slippage_bps: Option<u64>,
    },
}

fn address(raw: &str) -> Result<Address> {
    string_to_address(raw).with_context(|| format!("invalid address {}", raw))
}

fn amount(raw: &str) -> Result<U256> {
    U256::from_dec_str(raw.trim()).with_context(|| format!("invalid amount {}", raw))
}

fn print_tx(tx: &UnsignedSwapTx) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(tx)?);
    info!("calldata: 0x{}", hex::encode(&tx.data));
    Ok(())
}

async fn send_tx(provider: &Provider<Http>, chain_id: u64, tx: &UnsignedSwapTx) -> Result<()> {
    let key = std::env::var("SDK_PRIVATE_KEY").context("SDK_PRIVATE_KEY is required with --send")?;
    let wallet = key.trim().parse::<LocalWallet>()?.with_chain_id(chain_id);
    let client = SignerMiddleware::new(provider.clone(), wallet);
    match submit(&client, tx).await? {
        Some(receipt) => info!(
            "Swap mined in block {:?}: {:?}",
            receipt.block_number, receipt.transaction_hash
        ),
        None => info!("Swap dropped from the mempool"),
    }
    Ok(())
}

#[cfg(feature = "observability")]
fn init_observability(cli: &Cli) -> Result<()> {
    tracing_subscriber::fmt().json().init();
    if let Some(addr) = cli.metrics_addr {
        route_aggregator_sdk::metrics::install_prometheus_exporter(addr)?;
    }
    Ok(())
}

#[cfg(not(feature = "observability"))]
fn init_observability(_cli: &Cli) -> Result<()> {
    env_logger::init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_observability(&cli)?;

    let mut settings = Settings::new().context("failed to load settings")?;
    if let Some(url) = cli.rpc_url.clone() {
        settings.rpc.http_url = url;
    }
    let exclude = cli
        .exclude
        .iter()
        .map(|id| PoolType::try_from(*id))
        .collect::<Result<Vec<_>, _>>()?;

    let provider = Arc::new(Provider::<Http>::try_from(settings.rpc.http_url.as_str())?);
    let chain = settings.chain_config();
    let backend = Arc::new(ChainBackend::new(
        provider.clone(),
        &chain,
        settings.multicall.batch_size,
    ));
    let aggregator = Aggregator::new(backend, &settings);
    aggregator.init().await?;

    match cli.command {
        Command::Single {
            from,
            to,
            amount: raw,
            direct,
        } => {
            let (from, to, amt) = (address(&from)?, address(&to)?, amount(&raw)?);
            let route = if direct {
                aggregator.query_direct_route(from, to, amt, &exclude).await?
            } else {
                aggregator.query_single_route(from, to, amt, &exclude).await?
            };
            println!("{}", serde_json::to_string_pretty(&route)?);
        }
        Command::Split {
            from,
            to,
            amount: raw,
            direct,
            split_count,
            middle,
        } => {
            let middle = middle.as_deref().map(address).transpose()?;
            let route = aggregator
                .query_split_route(
                    address(&from)?,
                    address(&to)?,
                    amount(&raw)?,
                    direct,
                    &exclude,
                    split_count,
                    middle,
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&route)?);
        }
        Command::Pools { token_a, token_b } => {
            let pools = aggregator
                .get_pool_list(address(&token_a)?, address(&token_b)?, &exclude)
                .await?;
            println!("{}", serde_json::to_string_pretty(&pools)?);
        }
        Command::Liquidity {
            token_a,
            token_b,
            decimals0,
            decimals1,
            multipliers,
        } => {
            let pools = aggregator
                .get_pool_list(address(&token_a)?, address(&token_b)?, &exclude)
                .await?;
            info!("Measuring liquidity across {} pools", pools.len());
            let report = aggregator
                .get_pool_liquidity(
                    &pools,
                    PairDecimals {
                        token0: decimals0,
                        token1: decimals1,
                    },
                    &multipliers,
                    LiquidityOptions::from(&settings.liquidity),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::EncodeMix {
            from,
            to,
            amount: raw,
            slippage_bps,
        } => {
            let (from, to, amt) = (address(&from)?, address(&to)?, amount(&raw)?);
            let route = aggregator.query_single_route(from, to, amt, &exclude).await?;
            let options = EncodeOptions {
                slippage_bps,
                ..EncodeOptions::default()
            };
            let tx = aggregator
                .encode_mix_swap_data(&route, from, to, amt, options)
                .await?;
            print_tx(&tx)?;
            if cli.send {
                send_tx(&provider, chain.chain_id, &tx).await?;
            }
        }
        Command::EncodeMulti {
            from,
            to,
            amount: raw,
            slippage_bps,
        } => {
            let (from, to, amt) = (address(&from)?, address(&to)?, amount(&raw)?);
            let route = aggregator
                .query_split_route(from, to, amt, false, &exclude, None, None)
                .await?;
            let options = EncodeOptions {
                slippage_bps,
                ..EncodeOptions::default()
            };
            let tx = aggregator
                .encode_multi_swap_data(&route, from, to, amt, options)
                .await?;
            print_tx(&tx)?;
            if cli.send {
                send_tx(&provider, chain.chain_id, &tx).await?;
            }
        }
    }

    Ok(())
}
