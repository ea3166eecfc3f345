//! The uniform result returned to every caller of a crew run.

use serde::{Deserialize, Serialize};

/// Outcome of one run, as returned over HTTP and printed by the CLI.
///
/// Exactly one of `result` and `error` is set; the unset one is omitted from
/// the JSON form. `topic` echoes the input for traceability; `mode` names the
/// crew that ran, when the caller knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl ResultEnvelope {
    /// A successful run that produced `result`.
    pub fn success(topic: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
            topic: topic.into(),
            mode: None,
        }
    }

    /// A failed run.
    pub fn failure(topic: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            topic: topic.into(),
            mode: None,
        }
    }

    /// Tags the envelope with the crew that produced it.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_omits_the_unused_field() {
        let ok = serde_json::to_value(ResultEnvelope::success("rust", "memo")).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"success": true, "result": "memo", "topic": "rust"})
        );

        let failed = serde_json::to_value(ResultEnvelope::failure("rust", "boom")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"success": false, "error": "boom", "topic": "rust"})
        );
    }

    #[test]
    fn mode_is_serialised_when_set() {
        let tagged = ResultEnvelope::success("rust", "memo").with_mode("prototype");
        assert_eq!(
            serde_json::to_value(&tagged).unwrap(),
            serde_json::json!({"success": true, "result": "memo", "topic": "rust", "mode": "prototype"})
        );
    }
}
