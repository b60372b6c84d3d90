//! Call-trace decoding, flattening and concurrency control.

use alloy_primitives::{Address, U256};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Default cap on concurrently executing `debug_trace*` calls.
pub const MAX_TRACE_CONCURRENCY: usize = 16;

/// One node of a `callTracer` result tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    /// Frame type string as reported by the node, e.g. `CALL` or `CREATE2`.
    pub call_type: String,
    /// Calling account.
    pub from: Address,
    /// Called or created account. Zero when the node omits it.
    pub to: Address,
    /// Value transferred by this frame, zero when absent.
    pub value: U256,
    /// Gas consumed by this frame.
    pub gas_used: U256,
    /// Call data, `0x`-prefixed hex.
    pub input: String,
    /// Whether this frame itself reverted.
    pub revert: bool,
    /// Node-reported error of this frame, empty when it succeeded.
    pub error_message: String,
    /// Child frames, in execution order.
    pub calls: Vec<TraceFrame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceFrameWire {
    #[serde(rename = "type")]
    call_type: String,
    #[serde(default)]
    from: Address,
    #[serde(default)]
    to: Option<Address>,
    #[serde(default)]
    value: Option<U256>,
    #[serde(default)]
    gas_used: Option<U256>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    calls: Vec<TraceFrame>,
}

impl<'de> Deserialize<'de> for TraceFrame {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = TraceFrameWire::deserialize(deserializer)?;
        let error_message = wire.error.unwrap_or_default();
        Ok(TraceFrame {
            call_type: wire.call_type,
            from: wire.from,
            to: wire.to.unwrap_or_default(),
            value: wire.value.unwrap_or_default(),
            gas_used: wire.gas_used.unwrap_or_default(),
            input: wire.input.unwrap_or_default(),
            revert: !error_message.is_empty(),
            error_message,
            calls: wire.calls,
        })
    }
}

/// One entry of a flattened trace, in depth-first pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFrame {
    /// Frame type string as reported by the node.
    pub call_type: String,
    /// Calling account.
    pub from: Address,
    /// Called or created account.
    pub to: Address,
    /// Value transferred by this frame.
    pub value: U256,
    /// Gas consumed by this frame.
    pub gas_used: U256,
    /// Call data, `0x`-prefixed hex.
    pub input: String,
    /// Whether this frame reverted, in itself or through an ancestor.
    pub revert: bool,
    /// This frame's error, or the nearest ancestor's when it has none.
    pub error_message: String,
}

/// Flattens a trace tree depth-first, pre-order: a tree of N frames yields
/// exactly N entries.
///
/// A reverted ancestor marks every descendant reverted, and descendants
/// without an error of their own inherit the ancestor's message.
pub fn flatten(root: &TraceFrame) -> Vec<FlatFrame> {
    let mut frames = Vec::new();
    push_frames(root, false, "", &mut frames);
    frames
}

fn push_frames(frame: &TraceFrame, parent_revert: bool, parent_error: &str, out: &mut Vec<FlatFrame>) {
    let revert = frame.revert || parent_revert;
    let error_message = if frame.error_message.is_empty() && revert {
        parent_error.to_owned()
    } else {
        frame.error_message.clone()
    };
    out.push(FlatFrame {
        call_type: frame.call_type.clone(),
        from: frame.from,
        to: frame.to,
        value: frame.value,
        gas_used: frame.gas_used,
        input: frame.input.clone(),
        revert,
        error_message: error_message.clone(),
    });
    for child in &frame.calls {
        push_frames(child, revert, &error_message, out);
    }
}

/// Bounds the number of concurrently executing trace calls.
///
/// Cheap to clone; all clones draw from the same pool of permits.
#[derive(Clone, Debug)]
pub struct TraceGuard(Arc<Semaphore>);

impl TraceGuard {
    /// A guard allowing up to `max_concurrent_traces` trace calls at once.
    pub fn new(max_concurrent_traces: usize) -> Self {
        Self(Arc::new(Semaphore::new(max_concurrent_traces)))
    }

    /// Waits for a permit. The permit is held until dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.0.clone().acquire_owned().await
    }
}

impl Default for TraceGuard {
    fn default() -> Self {
        Self::new(MAX_TRACE_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(call_type: &str, value: u64, error: &str, calls: Vec<TraceFrame>) -> TraceFrame {
        TraceFrame {
            call_type: call_type.to_owned(),
            from: Address::with_last_byte(1),
            to: Address::with_last_byte(2),
            value: U256::from(value),
            gas_used: U256::from(100u64),
            input: "0x".to_owned(),
            revert: !error.is_empty(),
            error_message: error.to_owned(),
            calls,
        }
    }

    #[test]
    fn decodes_nested_frames_with_missing_fields() {
        let raw = json!({
            "type": "CALL",
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x0000000000000000000000000000000000000002",
            "value": "0x1",
            "gasUsed": "0x5208",
            "error": "execution reverted",
            "calls": [
                { "type": "DELEGATECALL", "from": "0x0000000000000000000000000000000000000002" },
            ],
        });
        let decoded: TraceFrame = serde_json::from_value(raw).unwrap();
        assert!(decoded.revert);
        assert_eq!(decoded.error_message, "execution reverted");
        assert_eq!(decoded.calls.len(), 1);

        let child = &decoded.calls[0];
        assert!(!child.revert);
        assert_eq!(child.to, Address::ZERO);
        assert_eq!(child.value, U256::ZERO);
    }

    #[test]
    fn flatten_is_depth_first_pre_order() {
        // root -> [a -> [a1], b]
        let root = frame(
            "CALL",
            1,
            "",
            vec![
                frame("STATICCALL", 2, "", vec![frame("DELEGATECALL", 3, "", vec![])]),
                frame("CREATE", 4, "", vec![]),
            ],
        );
        let flat = flatten(&root);
        assert_eq!(flat.len(), 4);
        let values: Vec<u64> = flat.iter().map(|f| f.value.to::<u64>()).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
    }

    #[test]
    fn descendants_inherit_revert_and_error() {
        let root = frame(
            "CALL",
            0,
            "execution reverted",
            vec![
                frame("CALL", 0, "", vec![frame("CALL", 0, "", vec![])]),
                frame("CALL", 0, "out of gas", vec![]),
            ],
        );
        let flat = flatten(&root);
        assert!(flat.iter().all(|f| f.revert));
        assert_eq!(flat[1].error_message, "execution reverted");
        assert_eq!(flat[2].error_message, "execution reverted");
        assert_eq!(flat[3].error_message, "out of gas");
    }

    #[test]
    fn successful_siblings_of_a_reverted_frame_stay_successful() {
        let root = frame(
            "CALL",
            1,
            "",
            vec![frame("CALL", 2, "execution reverted", vec![]), frame("CALL", 3, "", vec![])],
        );
        let flat = flatten(&root);
        assert!(!flat[0].revert);
        assert!(flat[1].revert);
        assert!(!flat[2].revert);
        assert!(flat[2].error_message.is_empty());
    }

    #[tokio::test]
    async fn trace_guard_caps_outstanding_permits() {
        let guard = TraceGuard::new(2);
        let first = guard.acquire().await.unwrap();
        let _second = guard.acquire().await.unwrap();

        // pool exhausted, a third acquire must park
        let waiter = tokio::spawn({
            let guard = guard.clone();
            async move { guard.acquire().await.is_ok() }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(first);
        assert!(waiter.await.unwrap());
    }
}
