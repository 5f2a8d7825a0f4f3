use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::market::MarketError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Database(err) => AppError::Db(err),
            MarketError::NotFound { .. } => AppError::NotFound,
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(?self);
        (status, self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Currency;

    #[test]
    fn market_errors_map_to_http_statuses() {
        let missing = AppError::from(MarketError::NotFound {
            entity: "price",
            id: 9,
        });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let unsupported = AppError::from(MarketError::UnsupportedCurrency("XYZ".into()));
        assert_eq!(unsupported.into_response().status(), StatusCode::BAD_REQUEST);

        let db = AppError::from(MarketError::Database(sqlx::Error::RowNotFound));
        assert_eq!(
            db.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_message_is_preserved() {
        let err = AppError::from(MarketError::UnsupportedCurrency("usd".into()));
        assert_eq!(err.to_string(), "bad request: unsupported currency `usd`");
        assert!(Currency::from_code("usd").is_none());
    }
}
