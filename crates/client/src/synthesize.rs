//! Turns flattened call frames into ordered operations.

use crate::error::ClientError;
use crate::trace::FlatFrame;
use alloy_primitives::{address, Address, I256, U256};
use rosetta_geth_types::{
    is_call_family, is_create_type, Amount, OpStatus, OpType, Operation, OperationIdentifier,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Detects chain-specific burn calls layered on top of generic synthesis.
pub trait BurnPolicy: Send + Sync {
    /// When `frame` is a recognized burn call, returns the logical sender
    /// embedded in the call input and the amount it burned.
    fn burned_transfer(&self, frame: &FlatFrame) -> Option<(Address, U256)>;
}

/// Sink address of the default burn policy.
const BURN_SINK: Address = address!("deaddeaddeaddeaddeaddeaddeaddeaddead0000");

/// 4-byte selector of `burn(address,uint256)`.
const BURN_SELECTOR: [u8; 4] = [0x9d, 0xc2, 0x9f, 0xac];

/// Hex length of `0x` + selector + two 32-byte words.
const BURN_INPUT_LEN: usize = 138;

/// Recognizes `burn(address,uint256)` calls sent to a fixed sink address.
#[derive(Debug, Clone)]
pub struct SinkBurnPolicy {
    sink: Address,
    selector: [u8; 4],
}

impl SinkBurnPolicy {
    /// A policy matching calls to `sink` carrying `selector`.
    pub fn new(sink: Address, selector: [u8; 4]) -> Self {
        Self { sink, selector }
    }
}

impl Default for SinkBurnPolicy {
    fn default() -> Self {
        Self::new(BURN_SINK, BURN_SELECTOR)
    }
}

impl BurnPolicy for SinkBurnPolicy {
    fn burned_transfer(&self, frame: &FlatFrame) -> Option<(Address, U256)> {
        if frame.call_type != OpType::Call.as_str() || frame.to != self.sink {
            return None;
        }
        if frame.input.len() != BURN_INPUT_LEN {
            return None;
        }
        let body = frame.input.strip_prefix("0x")?;
        // length is in bytes; slicing below needs ASCII hex throughout
        if !body.is_ascii() {
            return None;
        }
        let selector = hex::decode(&body[..8]).ok()?;
        if selector != self.selector {
            return None;
        }
        // first word is a left-padded address, second the amount
        let from = Address::from_str(&body[32..72]).ok()?;
        let amount = U256::from_str_radix(&body[72..], 16).ok()?;
        if amount.is_zero() {
            return None;
        }
        Some((from, amount))
    }
}

/// Converts a transaction's flattened frames into its operation sequence.
pub struct OpSynthesizer {
    include_zero_value_calls: bool,
    burn_policy: Option<Box<dyn BurnPolicy>>,
}

impl fmt::Debug for OpSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpSynthesizer")
            .field("include_zero_value_calls", &self.include_zero_value_calls)
            .field("burn_policy", &self.burn_policy.is_some())
            .finish()
    }
}

impl Default for OpSynthesizer {
    fn default() -> Self {
        Self { include_zero_value_calls: false, burn_policy: None }
    }
}

// === impl OpSynthesizer ===

impl OpSynthesizer {
    /// A synthesizer with explicit suppression and burn settings.
    pub fn new(include_zero_value_calls: bool, burn_policy: Option<Box<dyn BurnPolicy>>) -> Self {
        Self { include_zero_value_calls, burn_policy }
    }

    /// Synthesizes operations for `frames`, numbering them from `start_index`.
    ///
    /// Zero-value call-family frames are suppressed unless configured
    /// otherwise, but still pass through the destroyed-account bookkeeping.
    /// Leftover positive balances of destroyed accounts are cleared with
    /// trailing `DESTRUCT` operations; a negative leftover fails the request.
    pub fn operations(
        &self,
        frames: &[FlatFrame],
        start_index: i64,
    ) -> Result<Vec<Operation>, ClientError> {
        let mut ops: Vec<Operation> = Vec::new();
        let mut destroyed: BTreeMap<Address, I256> = BTreeMap::new();

        for frame in frames {
            let status = if frame.revert { OpStatus::Failure } else { OpStatus::Success };
            let mut metadata = Map::new();
            if frame.revert {
                metadata.insert("error".to_owned(), Value::String(frame.error_message.clone()));
            }
            let metadata = (!metadata.is_empty()).then_some(metadata);

            let zero_value = frame.value.is_zero();
            let should_add =
                self.include_zero_value_calls || !(zero_value && is_call_family(&frame.call_type));
            let value = I256::try_from(frame.value)
                .map_err(|_| ClientError::ValueOverflow { context: frame.value.to_string() })?;

            if should_add {
                let from_op = Operation {
                    operation_identifier: OperationIdentifier {
                        index: start_index + ops.len() as i64,
                    },
                    related_operations: None,
                    op_type: frame.call_type.clone(),
                    status: Some(status),
                    account: account(&frame.from),
                    amount: (!zero_value).then(|| Amount::wei((-value).to_string())),
                    metadata: metadata.clone(),
                };
                if status.is_successful() {
                    if let Some(delta) = destroyed.get_mut(&frame.from) {
                        *delta -= value;
                    }
                }
                ops.push(from_op);
            }

            if let Some((burned_from, burned)) =
                self.burn_policy.as_ref().and_then(|policy| policy.burned_transfer(frame))
            {
                let burned = I256::try_from(burned)
                    .map_err(|_| ClientError::ValueOverflow { context: burned.to_string() })?;
                ops.push(Operation {
                    operation_identifier: OperationIdentifier {
                        index: start_index + ops.len() as i64,
                    },
                    related_operations: None,
                    op_type: frame.call_type.clone(),
                    status: Some(status),
                    account: account(&burned_from),
                    amount: Some(Amount::wei((-burned).to_string())),
                    metadata: metadata.clone(),
                });
            }

            if frame.call_type == OpType::Selfdestruct.as_str() {
                destroyed.insert(frame.from, I256::ZERO);
                if frame.from == frame.to {
                    continue;
                }
            }

            if is_create_type(&frame.call_type) {
                destroyed.remove(&frame.to);
            }

            if should_add {
                // ops is non-empty here, the matching from op was just pushed
                let last_index = ops.last().map(|op| op.operation_identifier.index).unwrap_or(0);
                let to_op = Operation {
                    operation_identifier: OperationIdentifier { index: last_index + 1 },
                    related_operations: Some(vec![OperationIdentifier { index: last_index }]),
                    op_type: frame.call_type.clone(),
                    status: Some(status),
                    account: account(&frame.to),
                    amount: (!zero_value).then(|| Amount::wei(value.to_string())),
                    metadata,
                };
                if status.is_successful() {
                    if let Some(delta) = destroyed.get_mut(&frame.to) {
                        *delta += value;
                    }
                }
                ops.push(to_op);
            }
        }

        for (address, delta) in destroyed {
            if delta == I256::ZERO {
                continue;
            }
            if delta < I256::ZERO {
                return Err(ClientError::NegativeDestroyedBalance {
                    address: checksum(&address),
                    balance: delta.to_string(),
                });
            }
            let index = ops
                .last()
                .map(|op| op.operation_identifier.index + 1)
                .unwrap_or(start_index);
            ops.push(Operation {
                operation_identifier: OperationIdentifier { index },
                related_operations: None,
                op_type: OpType::Destruct.as_str().to_owned(),
                status: Some(OpStatus::Success),
                account: account(&address),
                amount: Some(Amount::wei((-delta).to_string())),
                metadata: None,
            });
        }

        Ok(ops)
    }
}

fn checksum(address: &Address) -> String {
    address.to_checksum(None)
}

fn account(address: &Address) -> rosetta_geth_types::AccountIdentifier {
    rosetta_geth_types::AccountIdentifier { address: checksum(address) }
}
