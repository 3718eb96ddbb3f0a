use crate::services::QueryResult;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

pub const NOT_JSON: &str = "Request must be JSON";
pub const NO_QUESTION: &str = "No question provided";

/// Body of `POST /query`.
#[derive(Debug, Clone, Validate)]
pub struct QueryRequest {
    #[validate(
        required(message = "No question provided"),
        length(min = 1, message = "No question provided")
    )]
    pub question: Option<String>,
}

impl QueryRequest {
    /// Pick the question out of a decoded body. Anything other than a string
    /// `question` on a JSON object is treated as absent.
    pub fn from_json(body: &Value) -> Self {
        Self {
            question: body
                .get("question")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            answer: result.answer,
            sources: result.sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_string_is_accepted() {
        let request = QueryRequest::from_json(&json!({"question": "Why?"}));
        assert!(request.validate().is_ok());
        assert_eq!(request.question.as_deref(), Some("Why?"));
    }

    #[test]
    fn missing_empty_or_non_string_question_is_rejected() {
        for body in [
            json!({}),
            json!({"question": ""}),
            json!({"question": null}),
            json!({"question": 42}),
            json!(["question"]),
        ] {
            let request = QueryRequest::from_json(&body);
            assert!(request.validate().is_err(), "{body}");
        }
    }

    #[test]
    fn response_serializes_answer_and_sources_only() {
        let response = QueryResponse::from(QueryResult {
            answer: "Paris".to_string(),
            sources: vec!["a".to_string(), "b".to_string()],
        });

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"answer": "Paris", "sources": ["a", "b"]})
        );
    }
}
