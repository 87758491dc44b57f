use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::build::BuildError, config::LoadError, infra::error::InfraError,
    scene::SceneError,
};

/// What went wrong behind an HTTP failure. Kept out of the response body and
/// picked up by the response logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn new(source: &'static str, status: StatusCode, messages: Vec<String>) -> Self {
        Self {
            source,
            status,
            messages,
        }
    }

    /// Flatten `error` and its `source()` chain, outermost first.
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let chain = std::iter::successors(Some(error), |current| (*current).source())
            .map(ToString::to_string)
            .collect();
        Self::new(source, status, chain)
    }
}

/// A failure answered with a fixed plain-text body.
#[derive(Debug)]
pub struct HttpError {
    body: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        body: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            body,
            report: ErrorReport::new(source, status, vec![detail.into()]),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        body: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            body,
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.report.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.body).into_response();
        response.extensions_mut().insert(self.report);
        response
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
