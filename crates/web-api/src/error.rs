use application::ApplicationError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::Timestamp;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// 仅在账号停用时返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_until: Option<Timestamp>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.into(),
                message: message.into(),
                suspended_until: None,
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "auth_required", "login required")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "admin_required", "admin access required")
    }

    pub fn not_found(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.body.code
    }

    fn internal(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(code, error = %message, "请求处理失败");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, "internal server error")
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::{DomainError, RepositoryError};

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => {
                ApiError::new(StatusCode::BAD_REQUEST, reason.clone(), format!("{field}: {reason}"))
            }
            AppErr::Domain(DomainError::UserAlreadyExists) => ApiError::new(
                StatusCode::CONFLICT,
                "email_exists",
                "an account with this email already exists",
            ),
            AppErr::Domain(DomainError::UserNotFound) => {
                ApiError::not_found("user_not_found", "user not found")
            }
            AppErr::Domain(DomainError::ReportNotFound) => {
                ApiError::not_found("report_not_found", "report not found")
            }
            AppErr::Domain(DomainError::InvalidCredentials) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid email or password",
            ),
            AppErr::Domain(DomainError::AccountSuspended { until }) => {
                let mut error = ApiError::new(
                    StatusCode::FORBIDDEN,
                    "account_suspended",
                    "account is temporarily suspended",
                );
                error.body.suspended_until = Some(until);
                error
            }
            AppErr::Domain(DomainError::InsufficientPermissions) | AppErr::Authorization => {
                ApiError::forbidden()
            }
            AppErr::Authentication => ApiError::unauthorized(),
            AppErr::Repository(RepositoryError::NotFound) => {
                ApiError::not_found("not_found", "requested resource not found")
            }
            AppErr::Repository(RepositoryError::Conflict) => {
                ApiError::new(StatusCode::CONFLICT, "conflict", "resource already exists")
            }
            AppErr::Repository(RepositoryError::Storage { message }) => {
                ApiError::internal("database_error", message)
            }
            AppErr::Password(err) => ApiError::internal("password_error", err.to_string()),
            AppErr::Infrastructure { message, .. } => {
                ApiError::internal("infrastructure_error", message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::new(rejection.status(), "invalid_path", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
