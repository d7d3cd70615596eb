use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tfsgate_client::ClientError;
use tfsgate_transfer::TransferError;
use thiserror::Error;

/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Session setup against the name server failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Client(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Transfer(err) => transfer_status(err),
        }
    }
}

fn transfer_status(err: &TransferError) -> StatusCode {
    match err {
        TransferError::Open(ClientError::NotFound(_)) | TransferError::InvalidMetadata { .. } => {
            StatusCode::NOT_FOUND
        }
        TransferError::Open(ClientError::InvalidName(_)) => StatusCode::BAD_REQUEST,
        TransferError::Open(_)
        | TransferError::Stat(_)
        | TransferError::ReadFailure { .. }
        | TransferError::IntegrityFailure { .. }
        | TransferError::CloseFailure(_) => StatusCode::BAD_GATEWAY,
        TransferError::WriteFailure { .. }
        | TransferError::FinalizeFailure { .. }
        | TransferError::InvalidChunkSize => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }

        let body = json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use tfsgate_client::FileName;
    use tfsgate_transfer::IoFault;

    use super::*;

    fn name() -> FileName {
        FileName::parse("T1AAAAAAAAAAAAAAAA").unwrap()
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = GatewayError::from(TransferError::Open(ClientError::NotFound(name())));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err = GatewayError::from(TransferError::InvalidMetadata { size: 0 });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn read_side_failures_are_bad_gateway() {
        let err = GatewayError::from(TransferError::IntegrityFailure {
            moved: 10,
            expected: 1,
            actual: 2,
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        let err = GatewayError::from(TransferError::ReadFailure {
            moved: 0,
            cause: IoFault::Client(ClientError::Code(-1)),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn write_side_failures_are_internal() {
        let err = GatewayError::from(TransferError::FinalizeFailure {
            source: ClientError::Code(-5),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = GatewayError::from(TransferError::WriteFailure {
            moved: 4,
            cause: IoFault::Stalled(16),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn connect_failure_is_bad_gateway() {
        let err = GatewayError::from(ClientError::Connect {
            addr: "nowhere".into(),
            reason: "invalid address".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
