use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of a successful `POST /api/chat` response.
///
/// Fields other than `result` are ignored.  A falsy `result` (`null`, `false`,
/// `0` or `""`) reads as absent; any other non-string value is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The backend's answer.
    #[serde(
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<String>,
}

fn falsy_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        Value::Bool(true) => Err(de::Error::invalid_type(
            Unexpected::Bool(true),
            &"a string or a falsy value",
        )),
        Value::Number(_) => Err(de::Error::invalid_type(
            Unexpected::Other("non-zero number"),
            &"a string or a falsy value",
        )),
        Value::Array(_) => Err(de::Error::invalid_type(
            Unexpected::Seq,
            &"a string or a falsy value",
        )),
        Value::Object(_) => Err(de::Error::invalid_type(
            Unexpected::Map,
            &"a string or a falsy value",
        )),
    }
}

impl ChatResponse {
    /// Creates a response carrying the given result.
    pub fn with_result(result: impl Into<String>) -> Self {
        Self {
            result: Some(result.into()),
        }
    }

    /// Returns the result if it is present and non-empty.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref().filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_null_and_empty_results_are_absent() {
        for json in [
            serde_json::json!({}),
            serde_json::json!({"result": null}),
            serde_json::json!({"result": ""}),
            serde_json::json!({"result": false}),
            serde_json::json!({"result": 0}),
            serde_json::json!({"result": 0.0}),
            serde_json::json!({"other": "ignored"}),
        ] {
            let response: ChatResponse = serde_json::from_value(json.clone()).unwrap();
            assert_eq!(response.result(), None, "{json}");
        }
    }

    #[test]
    fn present_result() {
        let json = serde_json::json!({"result": "hi there", "model": "x"});
        let response: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.result(), Some("hi there"));
    }

    #[test]
    fn truthy_non_string_result_fails_to_parse() {
        for json in [
            serde_json::json!({"result": 42}),
            serde_json::json!({"result": true}),
            serde_json::json!({"result": {}}),
            serde_json::json!({"result": []}),
        ] {
            assert!(
                serde_json::from_value::<ChatResponse>(json.clone()).is_err(),
                "{json}"
            );
        }
    }

    #[test]
    fn falsy_results_parse_from_text() {
        let response: ChatResponse = serde_json::from_str(r#"{"result":false}"#).unwrap();
        assert_eq!(response, ChatResponse::default());
        let response: ChatResponse = serde_json::from_str(r#"{"result":0}"#).unwrap();
        assert_eq!(response.result(), None);
    }
}
