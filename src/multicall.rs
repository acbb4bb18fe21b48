use crate::metrics;
pub use anyhow::Result;
use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::prelude::*;
use log::{debug, warn};
use std::sync::Arc;

/// Upper bound on calls per aggregate; larger requests get rejected by public RPCs
const MAX_BATCH_SIZE: usize = 200;

/// A single RPC call to be batched in a multicall.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Call {
    /// Target contract address
    pub target: Address,
    /// Encoded function call data
    pub call_data: Bytes,
}

/// Multicall batch executor.
///
/// Batches independent contract reads into `aggregate((address,bytes)[])` calls so a group of
/// lookups costs one round trip. Identical calls are coalesced before sending. `aggregate`
/// reverts as a whole when any call reverts, so a batch either fully succeeds or fails.
///
/// ## Example
///
/// ```rust,ignore
/// let multicall = Multicall::new(provider, multicall_address, 100);
/// let calls = vec![
///     Call { target: liquidity_config, call_data: get_pool_adapter_call },
///     // ... more calls
/// ];
/// let results = multicall.run(calls, None).await?;
/// ```
#[derive(Clone)]
pub struct Multicall<M: Middleware> {
    pub provider: Arc<M>,
    multicall_address: Address,
    batch_size: usize,
}

impl<M: Middleware + 'static> Multicall<M> {
    pub fn new(provider: Arc<M>, multicall_address: Address, batch_size: usize) -> Self {
        if batch_size > MAX_BATCH_SIZE {
            warn!(
                "Batch size {} exceeds recommended maximum ({}), capping",
                batch_size, MAX_BATCH_SIZE
            );
        }
        Self {
            provider,
            multicall_address,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn address(&self) -> Address {
        self.multicall_address
    }

    /// Runs a batch of calls, optionally at a specific block. Results come back in call order.
    pub async fn run(&self, calls: Vec<Call>, block: Option<BlockId>) -> Result<Vec<Bytes>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        // Coalesce identical calls to reduce load
        let mut unique_calls = indexmap::IndexMap::new();
        let mut original_indices = vec![0; calls.len()];
        for (i, call) in calls.iter().enumerate() {
            let (index, _) = unique_calls.insert_full((call.target, call.call_data.clone()), ());
            original_indices[i] = index;
        }

        let unique_call_vec: Vec<_> = unique_calls
            .into_keys()
            .map(|(target, call_data)| Call { target, call_data })
            .collect();
        debug!(
            "Multicall coalesced {} calls into {}",
            calls.len(),
            unique_call_vec.len()
        );

        let mut all_results_unique: Vec<Bytes> = Vec::with_capacity(unique_call_vec.len());
        for call_chunk in unique_call_vec.chunks(self.batch_size) {
            metrics::record_multicall_batch_size(call_chunk.len() as f64);
            let return_data = self.execute_aggregate(call_chunk, block).await?;
            if return_data.len() != call_chunk.len() {
                return Err(anyhow::anyhow!(
                    "Multicall returned {} results for {} calls",
                    return_data.len(),
                    call_chunk.len()
                ));
            }
            all_results_unique.extend(return_data);
        }

        // Reconstruct the full result set in the original order
        Ok(original_indices
            .into_iter()
            .map(|index| all_results_unique[index].clone())
            .collect())
    }

    async fn execute_aggregate(&self, calls: &[Call], block: Option<BlockId>) -> Result<Vec<Bytes>> {
        let call_tokens = calls
            .iter()
            .map(|call| {
                Token::Tuple(vec![
                    Token::Address(call.target),
                    Token::Bytes(call.call_data.to_vec()),
                ])
            })
            .collect();

        let calldata = aggregate_function().encode_input(&[Token::Array(call_tokens)])?;
        let tx_request = TransactionRequest::new()
            .to(self.multicall_address)
            .data(calldata);
        let typed_tx: ethers::types::transaction::eip2718::TypedTransaction = tx_request.into();
        let response = self
            .provider
            .call(&typed_tx, block)
            .await
            .map_err(|e| anyhow::anyhow!("Multicall aggregate failed: {}", e))?;

        decode_aggregate_output(&response)
    }
}

/// `aggregate((address,bytes)[] calls) returns (uint256 blockNumber, bytes[] returnData)`
#[allow(deprecated)]
fn aggregate_function() -> Function {
    Function {
        name: "aggregate".to_string(),
        inputs: vec![Param {
            name: "calls".to_string(),
            kind: ParamType::Array(Box::new(ParamType::Tuple(vec![
                ParamType::Address,
                ParamType::Bytes,
            ]))),
            internal_type: None,
        }],
        outputs: vec![
            Param {
                name: "blockNumber".to_string(),
                kind: ParamType::Uint(256),
                internal_type: None,
            },
            Param {
                name: "returnData".to_string(),
                kind: ParamType::Array(Box::new(ParamType::Bytes)),
                internal_type: None,
            },
        ],
        constant: None,
        state_mutability: StateMutability::Payable,
    }
}

fn decode_aggregate_output(response: &[u8]) -> Result<Vec<Bytes>> {
    let mut decoded = ethers::abi::decode(
        &[
            ParamType::Uint(256),
            ParamType::Array(Box::new(ParamType::Bytes)),
        ],
        response,
    )?;
    let results = decoded
        .pop()
        .and_then(|t| t.into_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid multicall response format"))?;

    results
        .into_iter()
        .map(|t| {
            t.into_bytes()
                .map(Bytes::from)
                .ok_or_else(|| anyhow::anyhow!("Invalid multicall return data"))
        })
        .collect()
}
