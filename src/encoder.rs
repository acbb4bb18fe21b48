//! # Payload Encoder
//!
//! Builds the settlement contract's `mixSwap` / `multiSwap` arguments from a canonical route.
//! Builders are pure: adapter addresses are resolved by the caller (the facade, through its
//! cache) and passed in, so the same inputs always produce the same bytes.
//!
//! - **Mix swap**: one pool per hop, `directions` carries one bit per hop.
//! - **Multi swap**: weighted splits per hop, each pool described by a packed sequence entry.

use crate::contracts::aggregator::encode_call;
use crate::error::AggregatorError;
use crate::flags::{pack_directions, pack_sequence_word};
use crate::normalization::min_return_amount;
use crate::types::conversions::{eth_address, is_native};
use crate::types::pair::{Pair, SwapType};
use crate::types::route::{SingleRouteResult, SplitRouteResult};
use anyhow::Result;
use ethers::abi::{encode, Token};
use ethers::prelude::Middleware;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, U256};
use serde::Serialize;

/// Everything about a swap that is not the route itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapContext {
    pub from_token: Address,
    pub to_token: Address,
    pub from_amount: U256,
    pub slippage_bps: u64,
    /// Unix seconds
    pub deadline: u64,
    pub broker: Address,
    pub broker_fee_bps: u64,
    /// Settlement contract; final recipient of every route's output
    pub aggregator: Address,
}

impl SwapContext {
    pub fn value(&self) -> U256 {
        if is_native(self.from_token) {
            self.from_amount
        } else {
            U256::zero()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MixSwapParam {
    pub from_token: Address,
    pub to_token: Address,
    pub from_token_amount: U256,
    pub exp_return_amount: U256,
    pub min_return_amount: U256,
    pub mix_adapters: Vec<Address>,
    pub mix_pairs: Vec<Address>,
    pub asset_to: Vec<Address>,
    pub directions: U256,
    pub more_infos: Vec<Bytes>,
    pub fee_data: Bytes,
    pub deadline: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiSwapParam {
    pub from_token_amount: U256,
    pub exp_return_amount: U256,
    pub min_return_amount: U256,
    pub split_number: Vec<U256>,
    pub mid_token: Vec<Address>,
    pub asset_from: Vec<Address>,
    pub sequence: Vec<Bytes>,
    pub fee_data: Bytes,
    pub deadline: U256,
}

/// An unsigned transaction request: what to call, with which data and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsignedSwapTx {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl UnsignedSwapTx {
    pub fn to_request(&self) -> TransactionRequest {
        TransactionRequest::new()
            .to(self.to)
            .data(self.data.clone())
            .value(self.value)
    }
}

/// Zero address becomes the ETH sentinel; pools never hold the zero address.
pub fn payload_token(token: Address) -> Address {
    if token.is_zero() {
        eth_address()
    } else {
        token
    }
}

/// Native asset becomes the wrapped token; pools are keyed by wrapped addresses.
pub fn query_token(token: Address, wrapped_native: Address) -> Address {
    if is_native(token) {
        wrapped_native
    } else {
        token
    }
}

/// `abi.encode(address broker, uint256 feeRateBps)`
pub fn fee_data(broker: Address, fee_rate_bps: u64) -> Bytes {
    Bytes::from(encode(&[
        Token::Address(broker),
        Token::Uint(U256::from(fee_rate_bps)),
    ]))
}

/// Where a hop's input has to be sent before the pool is swapped.
pub fn resolve_recipient(pool: &Pair, pool_adapter: Address) -> Result<Address, AggregatorError> {
    match pool.swap_type {
        SwapType::Direct => Ok(pool.pool_addr),
        SwapType::Adapter => Ok(pool_adapter),
        SwapType::Invalid => Err(AggregatorError::InvalidSwapType(pool.pool_addr)),
    }
}

/// Minimum return for a quote, rejecting quotes that leave nothing to protect.
pub fn checked_min_return(best_amount: U256, slippage_bps: u64) -> Result<U256, AggregatorError> {
    let min_return = min_return_amount(best_amount, slippage_bps);
    if min_return.is_zero() {
        return Err(AggregatorError::ZeroMinReturn);
    }
    Ok(min_return)
}

/// Checks that need no adapter lookup; run before any network access.
pub fn precheck_mix(route: &SingleRouteResult, ctx: &SwapContext) -> Result<U256, AggregatorError> {
    if route.best_pool_path.is_empty() {
        return Err(AggregatorError::EmptyPoolList);
    }
    checked_min_return(route.best_amount, ctx.slippage_bps)
}

pub fn precheck_multi(route: &SplitRouteResult, ctx: &SwapContext) -> Result<U256, AggregatorError> {
    let info = &route.best_path_info;
    if info.one_hops.is_empty() || info.one_hops.iter().any(|h| h.pools.is_empty()) {
        return Err(AggregatorError::EmptyPoolList);
    }
    checked_min_return(route.best_amount, ctx.slippage_bps)
}

fn ensure_len(what: &'static str, expected: usize, actual: usize) -> Result<(), AggregatorError> {
    if expected != actual {
        return Err(AggregatorError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// `pool_adapters[i]` is the registered adapter of `route.best_pool_path[i]`'s pool type.
pub fn build_mix_swap_param(
    route: &SingleRouteResult,
    ctx: &SwapContext,
    pool_adapters: &[Address],
) -> Result<MixSwapParam, AggregatorError> {
    let min_return = precheck_mix(route, ctx)?;
    let pools = &route.best_pool_path;
    ensure_len("best path", pools.len() + 1, route.best_path.len())?;

    let mix_adapters = pool_adapters.to_vec();
    let mix_pairs: Vec<Address> = pools.iter().map(|p| p.pool_addr).collect();
    let mut asset_to = pools
        .iter()
        .zip(pool_adapters)
        .map(|(pool, adapter)| resolve_recipient(pool, *adapter))
        .collect::<Result<Vec<_>, _>>()?;
    asset_to.push(ctx.aggregator);

    ensure_len("mix adapters", mix_pairs.len(), mix_adapters.len())?;
    ensure_len("asset to", mix_pairs.len() + 1, asset_to.len())?;

    let sells_token1: Vec<bool> = pools
        .iter()
        .zip(&route.best_path)
        .map(|(pool, sell_token)| pool.sells_token1(*sell_token))
        .collect();

    Ok(MixSwapParam {
        from_token: payload_token(ctx.from_token),
        to_token: payload_token(ctx.to_token),
        from_token_amount: ctx.from_amount,
        exp_return_amount: route.best_amount,
        min_return_amount: min_return,
        mix_adapters,
        mix_pairs,
        asset_to,
        directions: pack_directions(&sells_token1),
        more_infos: vec![Bytes::default(); pools.len()],
        fee_data: fee_data(ctx.broker, ctx.broker_fee_bps),
        deadline: U256::from(ctx.deadline),
    })
}

/// `pool_adapters[h][i]` is the registered adapter of hop `h`'s pool `i`.
pub fn build_multi_swap_param(
    route: &SplitRouteResult,
    ctx: &SwapContext,
    pool_adapters: &[Vec<Address>],
) -> Result<MultiSwapParam, AggregatorError> {
    let min_return = precheck_multi(route, ctx)?;
    let info = &route.best_path_info;
    ensure_len("route tokens", info.one_hops.len() + 1, info.tokens.len())?;
    ensure_len("hop adapters", info.one_hops.len(), pool_adapters.len())?;

    let mut split_number = Vec::with_capacity(info.one_hops.len() + 1);
    let mut asset_from = Vec::with_capacity(info.one_hops.len() + 1);
    let mut sequence = Vec::new();
    let mut count = 0usize;
    split_number.push(U256::zero());

    for (h, (hop, adapters)) in info.one_hops.iter().zip(pool_adapters).enumerate() {
        ensure_len("hop weights", hop.pools.len(), hop.weights.len())?;
        ensure_len("pool adapters", hop.pools.len(), adapters.len())?;

        count += hop.pools.len();
        split_number.push(U256::from(count));

        if hop.is_split() {
            asset_from.push(ctx.aggregator);
        } else {
            asset_from.push(resolve_recipient(&hop.pools[0], adapters[0])?);
        }

        let sell_token = info.tokens[h];
        for ((pool, weight), adapter) in hop.pools.iter().zip(&hop.weights).zip(adapters) {
            if pool.swap_type == SwapType::Invalid {
                return Err(AggregatorError::InvalidSwapType(pool.pool_addr));
            }
            let word = pack_sequence_word(pool.sells_token1(sell_token), pool.swap_type.raw(), *weight);
            sequence.push(Bytes::from(encode(&[
                Token::Address(pool.pool_addr),
                Token::Address(*adapter),
                Token::Uint(word),
                Token::Bytes(Vec::new()),
            ])));
        }
    }
    asset_from.push(ctx.aggregator);
    ensure_len("asset from", split_number.len(), asset_from.len())?;

    let mut mid_token = info.tokens.clone();
    if let Some(first) = mid_token.first_mut() {
        *first = payload_token(ctx.from_token);
    }
    if let Some(last) = mid_token.last_mut() {
        *last = payload_token(ctx.to_token);
    }

    Ok(MultiSwapParam {
        from_token_amount: ctx.from_amount,
        exp_return_amount: route.best_amount,
        min_return_amount: min_return,
        split_number,
        mid_token,
        asset_from,
        sequence,
        fee_data: fee_data(ctx.broker, ctx.broker_fee_bps),
        deadline: U256::from(ctx.deadline),
    })
}

fn address_array(addresses: &[Address]) -> Token {
    Token::Array(addresses.iter().copied().map(Token::Address).collect())
}

fn bytes_array(items: &[Bytes]) -> Token {
    Token::Array(items.iter().map(|b| Token::Bytes(b.to_vec())).collect())
}

pub fn encode_mix_swap(param: &MixSwapParam) -> Result<Bytes> {
    encode_call(
        "mixSwap",
        &[
            Token::Address(param.from_token),
            Token::Address(param.to_token),
            Token::Uint(param.from_token_amount),
            Token::Uint(param.exp_return_amount),
            Token::Uint(param.min_return_amount),
            address_array(&param.mix_adapters),
            address_array(&param.mix_pairs),
            address_array(&param.asset_to),
            Token::Uint(param.directions),
            bytes_array(&param.more_infos),
            Token::Bytes(param.fee_data.to_vec()),
            Token::Uint(param.deadline),
        ],
    )
}

pub fn encode_multi_swap(param: &MultiSwapParam) -> Result<Bytes> {
    encode_call(
        "multiSwap",
        &[
            Token::Uint(param.from_token_amount),
            Token::Uint(param.exp_return_amount),
            Token::Uint(param.min_return_amount),
            Token::Array(param.split_number.iter().copied().map(Token::Uint).collect()),
            address_array(&param.mid_token),
            address_array(&param.asset_from),
            bytes_array(&param.sequence),
            Token::Bytes(param.fee_data.to_vec()),
            Token::Uint(param.deadline),
        ],
    )
}

/// Signs and broadcasts through a caller-owned client, waiting for the receipt.
pub async fn submit<M: Middleware + 'static>(
    client: &M,
    tx: &UnsignedSwapTx,
) -> Result<Option<TransactionReceipt>> {
    let pending = client
        .send_transaction(tx.to_request(), None)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send swap transaction: {}", e))?;
    Ok(pending.await?)
}
