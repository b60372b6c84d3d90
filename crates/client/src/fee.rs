//! Fee attribution: effective gas price and the fee operation triple.

use crate::client::LoadedTransaction;
use crate::error::ClientError;
use crate::types::RpcTransaction;
use alloy_primitives::U256;
use rosetta_geth_types::{
    Amount, OpStatus, OpType, Operation, OperationIdentifier,
};

/// Envelope kind from which transactions price gas via fee market fields.
const FEE_MARKET_TX_TYPE: u64 = 2;

/// Price per gas the sender actually paid.
///
/// Legacy and access-list transactions pay their stated gas price. Fee-market
/// transactions pay `min(tip_cap, fee_cap - base_fee) + base_fee`; a fee cap
/// below the base fee has no defined price and fails the request.
pub fn effective_gas_price(
    tx: &RpcTransaction,
    base_fee: Option<U256>,
) -> Result<U256, ClientError> {
    let is_fee_market =
        tx.transaction_type.is_some_and(|ty| ty.to::<u64>() >= FEE_MARKET_TX_TYPE);
    let Some(base_fee) = base_fee else {
        return Ok(tx.gas_price.unwrap_or_default());
    };
    if !is_fee_market {
        return Ok(tx.gas_price.unwrap_or_default());
    }

    let fee_cap = tx
        .max_fee_per_gas
        .ok_or(ClientError::FeeCalculation("fee-market transaction missing maxFeePerGas"))?;
    let tip_cap = tx
        .max_priority_fee_per_gas
        .ok_or(ClientError::FeeCalculation("fee-market transaction missing maxPriorityFeePerGas"))?;
    if fee_cap < base_fee {
        return Err(ClientError::FeeCalculation("maxFeePerGas below base fee"));
    }
    Ok((fee_cap - base_fee).min(tip_cap) + base_fee)
}

fn debit(value: U256) -> String {
    if value.is_zero() {
        "0".to_owned()
    } else {
        format!("-{value}")
    }
}

/// The fee operations of one loaded transaction.
///
/// Index 0 debits the sender the miner's share, index 1 credits the miner and
/// relates back to index 0. When part of the fee was burned, index 2 debits
/// the sender the burned share, credited to no one.
pub(crate) fn fee_ops(tx: &LoadedTransaction) -> Vec<Operation> {
    let burned = tx.fee_burned.unwrap_or_default();
    let miner_share = tx.fee_amount - burned;

    let mut ops = vec![
        Operation {
            operation_identifier: OperationIdentifier { index: 0 },
            related_operations: None,
            op_type: OpType::Fee.as_str().to_owned(),
            status: Some(OpStatus::Success),
            account: tx.sender_account(),
            amount: Some(Amount::wei(debit(miner_share))),
            metadata: None,
        },
        Operation {
            operation_identifier: OperationIdentifier { index: 1 },
            related_operations: Some(vec![OperationIdentifier { index: 0 }]),
            op_type: OpType::Fee.as_str().to_owned(),
            status: Some(OpStatus::Success),
            account: tx.miner_account(),
            amount: Some(Amount::wei(miner_share.to_string())),
            metadata: None,
        },
    ];

    if tx.fee_burned.is_some() {
        ops.push(Operation {
            operation_identifier: OperationIdentifier { index: 2 },
            related_operations: None,
            op_type: OpType::Fee.as_str().to_owned(),
            status: Some(OpStatus::Success),
            account: tx.sender_account(),
            amount: Some(Amount::wei(debit(burned))),
            metadata: None,
        });
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, U64};

    fn legacy_tx(gas_price: u64) -> RpcTransaction {
        RpcTransaction {
            hash: B256::ZERO,
            nonce: U64::ZERO,
            gas: U64::from(21_000u64),
            gas_price: Some(U256::from(gas_price)),
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            to: Some(Address::with_last_byte(2)),
            value: U256::ZERO,
            input: Default::default(),
            transaction_type: None,
            from: Some(Address::with_last_byte(1)),
            block_hash: None,
            block_number: None,
        }
    }

    fn fee_market_tx(fee_cap: u64, tip_cap: u64) -> RpcTransaction {
        RpcTransaction {
            gas_price: None,
            max_fee_per_gas: Some(U256::from(fee_cap)),
            max_priority_fee_per_gas: Some(U256::from(tip_cap)),
            transaction_type: Some(U64::from(2u64)),
            ..legacy_tx(0)
        }
    }

    #[test]
    fn legacy_price_is_the_stated_gas_price() {
        let price = effective_gas_price(&legacy_tx(10_000), None).unwrap();
        assert_eq!(price, U256::from(10_000u64));

        // legacy transactions in post-London blocks still pay their stated price
        let price = effective_gas_price(&legacy_tx(10_000), Some(U256::from(3_000u64))).unwrap();
        assert_eq!(price, U256::from(10_000u64));
    }

    #[test]
    fn fee_market_price_caps_the_tip() {
        let base_fee = Some(U256::from(100u64));

        // tip cap binds
        let price = effective_gas_price(&fee_market_tx(500, 30), base_fee).unwrap();
        assert_eq!(price, U256::from(130u64));

        // fee cap binds
        let price = effective_gas_price(&fee_market_tx(120, 50), base_fee).unwrap();
        assert_eq!(price, U256::from(120u64));
    }

    #[test]
    fn fee_cap_below_base_fee_is_an_error() {
        let err = effective_gas_price(&fee_market_tx(99, 10), Some(U256::from(100u64)));
        assert!(matches!(err, Err(ClientError::FeeCalculation(_))));
    }

    #[test]
    fn pre_london_fee_is_a_balanced_pair() {
        let tx = LoadedTransaction::for_tests(legacy_tx(10_000), U256::from(210_000_000u64), None);
        let ops = fee_ops(&tx);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].amount.as_ref().unwrap().value, "-210000000");
        assert_eq!(ops[1].amount.as_ref().unwrap().value, "210000000");
        assert_eq!(
            ops[1].related_operations.as_deref(),
            Some(&[OperationIdentifier { index: 0 }][..])
        );
        assert!(ops.iter().all(|op| op.status == Some(OpStatus::Success)));
    }

    #[test]
    fn post_london_fee_splits_out_the_burned_share() {
        let tx = LoadedTransaction::for_tests(
            legacy_tx(10_000),
            U256::from(210_000_000u64),
            Some(U256::from(60_000_000u64)),
        );
        let ops = fee_ops(&tx);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].amount.as_ref().unwrap().value, "-150000000");
        assert_eq!(ops[1].amount.as_ref().unwrap().value, "150000000");
        assert_eq!(ops[2].amount.as_ref().unwrap().value, "-60000000");
        assert!(ops[2].related_operations.is_none());
    }
}
