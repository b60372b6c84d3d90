//! Transfer intent matching.

use crate::error::ConstructionError;
use alloy_primitives::U256;
use rosetta_geth_types::{Currency, OpType, Operation};

/// A matched native transfer: one sender, one recipient, equal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    /// Sender address as supplied.
    pub from: String,
    /// Recipient address as supplied.
    pub to: String,
    /// Transferred value in wei.
    pub value: U256,
}

fn unclear(message: impl Into<String>) -> ConstructionError {
    ConstructionError::UnclearIntent(message.into())
}

fn parse_signed_decimal(value: &str) -> Option<(bool, U256)> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    if digits.is_empty() {
        return None;
    }
    U256::from_str_radix(digits, 10).ok().map(|abs| (negative, abs))
}

/// Matches exactly two `CALL` operations describing one native transfer:
/// a negative amount from the sender and the equal positive amount to the
/// recipient. Anything else is an unclear intent.
pub fn match_transfer(operations: &[Operation]) -> Result<TransferIntent, ConstructionError> {
    if operations.len() != 2 {
        return Err(unclear(format!("expected 2 operations, got {}", operations.len())));
    }

    let mut sender: Option<(&Operation, U256)> = None;
    let mut recipient: Option<(&Operation, U256)> = None;

    for op in operations {
        if op.op_type != OpType::Call.as_str() {
            return Err(unclear(format!("unsupported operation type `{}`", op.op_type)));
        }
        let amount = op.amount.as_ref().ok_or_else(|| unclear("operation missing amount"))?;
        if amount.currency != Currency::eth() {
            return Err(unclear(format!("unsupported currency `{}`", amount.currency.symbol)));
        }
        let (negative, value) = parse_signed_decimal(&amount.value)
            .ok_or_else(|| unclear(format!("bad amount `{}`", amount.value)))?;
        if value.is_zero() {
            return Err(unclear("zero-value operation"));
        }
        if negative {
            if sender.replace((op, value)).is_some() {
                return Err(unclear("more than one sending operation"));
            }
        } else if recipient.replace((op, value)).is_some() {
            return Err(unclear("more than one receiving operation"));
        }
    }

    let (from_op, sent) = sender.ok_or_else(|| unclear("no sending operation"))?;
    let (to_op, received) = recipient.ok_or_else(|| unclear("no receiving operation"))?;
    if sent != received {
        return Err(unclear("sent and received amounts do not match"));
    }

    Ok(TransferIntent {
        from: from_op.account.address.clone(),
        to: to_op.account.address.clone(),
        value: sent,
    })
}
