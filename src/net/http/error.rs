use crate::db::error::DbError;
use crate::error::DomainError;
use crate::services::ServiceError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: u16,
    msg: &'a str,
}

/// Error returned by every handler, rendered as `{"code": .., "msg": ..}`.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub msg: String,
}

impl HttpError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    fn internal(err: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            msg: &self.msg,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DbError> for HttpError {
    fn from(e: DbError) -> Self {
        Self::internal(&e)
    }
}

impl From<DomainError> for HttpError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotLoggedIn => Self::new(StatusCode::UNAUTHORIZED, e.to_string()),
            DomainError::PermissionDenied => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            DomainError::Infra(infra) => Self::internal(&infra),
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            ServiceError::InvalidInput(msg) => Self::bad_request(msg),
            ServiceError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ServiceError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InfraError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::NotFound { entity: "requisition" }, StatusCode::NOT_FOUND),
            (ServiceError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Database(DbError::UniqueViolation), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Database(DbError::Decode("bad row".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(HttpError::from(err).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = HttpError::from(ServiceError::Database(DbError::Decode("password=hunter2".into())));
        assert_eq!(err.msg, "internal error");

        let err = HttpError::from(ServiceError::Conflict("locked by Ada".into()));
        assert_eq!(err.msg, "locked by Ada");
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        let err = HttpError::from(DomainError::NotLoggedIn);
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.msg, "not logged in");

        assert_eq!(HttpError::from(DomainError::PermissionDenied).status, StatusCode::FORBIDDEN);

        let infra = DomainError::Infra(InfraError::Net("connection reset".into()));
        assert_eq!(HttpError::from(infra).msg, "internal error");
    }
}
