//! Response envelope shared by every feed handler.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

/// Body of a feed response: `{ "data": [...] }` or `{ "error": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeedBody {
    Data { data: Vec<Value> },
    Error { error: Value },
}

/// Status plus body; the CORS header is added when converted into a response.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedResponse {
    pub status: StatusCode,
    pub body: FeedBody,
}

impl FeedResponse {
    pub fn ok(data: Vec<Value>) -> Self {
        Self {
            status: StatusCode::OK,
            body: FeedBody::Data { data },
        }
    }

    pub fn bad_request(error: Value) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: FeedBody::Error { error },
        }
    }

    /// Records carried by a successful response, if any.
    pub fn data(&self) -> Option<&[Value]> {
        match &self.body {
            FeedBody::Data { data } => Some(data),
            FeedBody::Error { .. } => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }
}

impl IntoResponse for FeedResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, axum::Json(self.body)).into_response();
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }
}
