//! `_meta` accessors (§3 "Tool-execution context", §4.10).
//!
//! The core does not interpret `_meta` beyond `progressToken`, which governs
//! which logical progress stream a `notifications/progress` belongs to.

use serde_json::Value;

/// The `_meta` map carried by an inbound request's `params`, if any.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    inner: Option<Value>,
}

impl Meta {
    /// Pull `_meta` out of a request's `params` object, if present.
    pub fn from_params(params: Option<&Value>) -> Self {
        let inner = params
            .and_then(Value::as_object)
            .and_then(|obj| obj.get("_meta"))
            .cloned();
        Self { inner }
    }

    /// `_meta.progressToken`, falling back to the default token `0` per
    /// §4.10's `send_progress` convenience, when the caller did not supply
    /// one.
    pub fn progress_token(&self) -> Value {
        self.inner
            .as_ref()
            .and_then(Value::as_object)
            .and_then(|obj| obj.get("progressToken"))
            .cloned()
            .unwrap_or_else(|| Value::Number(0.into()))
    }

    pub fn as_value(&self) -> Option<&Value> {
        self.inner.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_progress_token() {
        let params = json!({"name": "x", "_meta": {"progressToken": "abc"}});
        let meta = Meta::from_params(Some(&params));
        assert_eq!(meta.progress_token(), json!("abc"));
    }

    #[test]
    fn falls_back_to_zero_without_meta() {
        let params = json!({"name": "x"});
        let meta = Meta::from_params(Some(&params));
        assert_eq!(meta.progress_token(), json!(0));
    }

    #[test]
    fn handles_absent_params() {
        let meta = Meta::from_params(None);
        assert_eq!(meta.progress_token(), json!(0));
        assert!(meta.as_value().is_none());
    }
}
