//! Operations, amounts and the vocabulary they draw from.

use crate::identifiers::{AccountIdentifier, OperationIdentifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of decimals in the native currency.
pub const ETH_DECIMALS: u32 = 18;

/// Symbol of the native currency.
pub const ETH_SYMBOL: &str = "ETH";

/// Operation types the gateway can emit.
///
/// Trace-derived operations reuse the node's frame type string verbatim, so
/// this enum is the advertised vocabulary rather than a parsing bottleneck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpType {
    /// Non-uncle block reward credited to the miner.
    MinerReward,
    /// Reward credited to an uncle block's miner.
    UncleReward,
    /// Transaction fee debit or credit.
    Fee,
    /// Plain value-bearing call frame.
    Call,
    /// Contract creation frame.
    Create,
    /// `CREATE2` contract creation frame.
    Create2,
    /// Account self-destruction frame.
    Selfdestruct,
    /// `CALLCODE` frame.
    Callcode,
    /// `DELEGATECALL` frame.
    Delegatecall,
    /// `STATICCALL` frame.
    Staticcall,
    /// Synthetic debit clearing a destroyed account's leftover balance.
    Destruct,
}

impl OpType {
    /// All operation types, in catalog order.
    pub const ALL: [OpType; 11] = [
        OpType::MinerReward,
        OpType::UncleReward,
        OpType::Fee,
        OpType::Call,
        OpType::Create,
        OpType::Create2,
        OpType::Selfdestruct,
        OpType::Callcode,
        OpType::Delegatecall,
        OpType::Staticcall,
        OpType::Destruct,
    ];

    /// Wire spelling of the type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OpType::MinerReward => "MINER_REWARD",
            OpType::UncleReward => "UNCLE_REWARD",
            OpType::Fee => "FEE",
            OpType::Call => "CALL",
            OpType::Create => "CREATE",
            OpType::Create2 => "CREATE2",
            OpType::Selfdestruct => "SELFDESTRUCT",
            OpType::Callcode => "CALLCODE",
            OpType::Delegatecall => "DELEGATECALL",
            OpType::Staticcall => "STATICCALL",
            OpType::Destruct => "DESTRUCT",
        }
    }
}

/// Whether `frame_type` moves value without changing the account set.
pub fn is_call_family(frame_type: &str) -> bool {
    matches!(frame_type, "CALL" | "CALLCODE" | "DELEGATECALL" | "STATICCALL")
}

/// Whether `frame_type` deploys a contract.
pub fn is_create_type(frame_type: &str) -> bool {
    matches!(frame_type, "CREATE" | "CREATE2")
}

/// Execution outcome attached to confirmed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpStatus {
    /// The frame executed without reverting.
    Success,
    /// The frame reverted, or ran under a reverted ancestor.
    Failure,
}

impl OpStatus {
    /// Both statuses, in catalog order.
    pub const ALL: [OpStatus; 2] = [OpStatus::Success, OpStatus::Failure];

    /// Wire spelling of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OpStatus::Success => "SUCCESS",
            OpStatus::Failure => "FAILURE",
        }
    }

    /// Whether balances actually moved.
    pub const fn is_successful(&self) -> bool {
        matches!(self, OpStatus::Success)
    }
}

/// A currency definition attached to every amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Ticker symbol.
    pub symbol: String,
    /// Number of decimals the value string is denominated in.
    pub decimals: u32,
}

impl Currency {
    /// The native currency, 18 decimals of wei.
    pub fn eth() -> Self {
        Self { symbol: ETH_SYMBOL.to_owned(), decimals: ETH_DECIMALS }
    }
}

/// A signed value in some currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Signed decimal string, no leading zeros.
    pub value: String,
    /// Currency the value is denominated in.
    pub currency: Currency,
}

impl Amount {
    /// Amount of `value` wei.
    pub fn wei(value: impl Into<String>) -> Self {
        Self { value: value.into(), currency: Currency::eth() }
    }
}

/// One balance-affecting entry within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Position within the transaction.
    pub operation_identifier: OperationIdentifier,
    /// Indices of operations this one depends on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_operations: Option<Vec<OperationIdentifier>>,
    /// Operation type string, drawn from [`OpType`] or the node's frame types.
    #[serde(rename = "type")]
    pub op_type: String,
    /// Execution outcome. Absent on construction intents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OpStatus>,
    /// Affected account.
    pub account: AccountIdentifier,
    /// Balance change. Absent when no value moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// Free-form extras, e.g. the revert error of a failed frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Operation {
    /// A bare operation with no related operations, amount or metadata.
    pub fn new(index: i64, op_type: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            operation_identifier: OperationIdentifier { index },
            related_operations: None,
            op_type: op_type.into(),
            status: None,
            account: AccountIdentifier { address: address.into() },
            amount: None,
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_type_wire_spelling_matches_serde() {
        for ty in OpType::ALL {
            let json = serde_json::to_value(ty).unwrap();
            assert_eq!(json, serde_json::Value::String(ty.as_str().to_owned()));
        }
    }

    #[test]
    fn call_family_excludes_creates_and_selfdestruct() {
        for ty in ["CALL", "CALLCODE", "DELEGATECALL", "STATICCALL"] {
            assert!(is_call_family(ty));
        }
        assert!(!is_call_family("CREATE"));
        assert!(!is_call_family("CREATE2"));
        assert!(!is_call_family("SELFDESTRUCT"));
        assert!(is_create_type("CREATE2"));
        assert!(!is_create_type("CALL"));
    }

    #[test]
    fn operation_serializes_canonical_field_names() {
        let mut op = Operation::new(1, OpType::Call.as_str(), "0x0000000000000000000000000000000000000001");
        op.related_operations = Some(vec![OperationIdentifier { index: 0 }]);
        op.status = Some(OpStatus::Success);
        op.amount = Some(Amount::wei("100"));

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["operation_identifier"]["index"], 1);
        assert_eq!(json["related_operations"][0]["index"], 0);
        assert_eq!(json["type"], "CALL");
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["account"]["address"], "0x0000000000000000000000000000000000000001");
        assert_eq!(json["amount"]["value"], "100");
        assert_eq!(json["amount"]["currency"]["symbol"], "ETH");
        assert_eq!(json["amount"]["currency"]["decimals"], 18);
        assert!(json.get("metadata").is_none());
    }
}
