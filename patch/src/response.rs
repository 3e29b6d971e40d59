//! Mapping results onto the HTTP collaborator's status codes.

use serde_json::{json, Value};

use crate::executor::PatchExecutor;
use crate::request::{PatchRequest, RequestError};
use crate::result::PatchResult;

/// Status code and JSON body for a patch request.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchResponse {
    pub status: u16,
    pub body: Value,
}

impl PatchResponse {
    /// 200 on success (dry runs included), 422 on a failed batch.
    pub fn from_result(result: &PatchResult) -> Self {
        let status = if result.success { 200 } else { 422 };
        match serde_json::to_value(result) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(500, e.to_string()),
        }
    }

    /// 400 for a body that could not be decoded.
    pub fn from_request_error(error: &RequestError) -> Self {
        Self::error(error.status_code(), error.to_string())
    }

    fn error(status: u16, message: String) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": { "message": message } }),
        }
    }
}

impl PatchExecutor<'_> {
    /// Decode a request body, apply it, and map the outcome to a response.
    pub fn handle(&self, body: &Value) -> PatchResponse {
        match PatchRequest::from_value(body, self.config()) {
            Ok(request) => PatchResponse::from_result(&self.apply_request(&request)),
            Err(e) => PatchResponse::from_request_error(&e),
        }
    }
}
