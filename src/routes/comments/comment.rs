use std::fmt::{self, Debug, Formatter};

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Deserialize;

use crate::authorization::{Client, InsufficientPrivileges};
use crate::domain::{CommentRecord, CommentResponseBody};
use crate::repository::{self, PgTransaction};
use crate::utils;

#[derive(thiserror::Error)]
pub enum CommentError {
    #[error("{0}")]
    ValidationError(String),

    #[error("Missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("Post {0} not found")]
    PostNotFound(i64),

    #[error("Comment {0} not found")]
    CommentNotFound(i64),

    #[error(transparent)]
    Forbidden(#[from] InsufficientPrivileges),

    #[error("This action requires you to be logged in")]
    NotLoggedIn,

    #[error("Someone else modified this comment in the meantime. Please try again.")]
    EditConflict,

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for CommentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        utils::error_chain_fmt(self, f)
    }
}

impl ResponseError for CommentError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            CommentError::ValidationError(_) | CommentError::MissingParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            CommentError::PostNotFound(_) | CommentError::CommentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CommentError::Forbidden(_) | CommentError::NotLoggedIn => StatusCode::FORBIDDEN,
            CommentError::EditConflict => StatusCode::CONFLICT,
            CommentError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        utils::build_error_response(status_code, self.to_string())
    }
}

#[derive(Deserialize, Debug)]
pub struct CommentPathParams {
    pub id: i64,
}

pub(super) fn check_version(comment: &CommentRecord, expected: Option<i32>) -> Result<(), CommentError> {
    match expected {
        Some(version) if version != comment.version => Err(CommentError::EditConflict),
        _ => Ok(()),
    }
}

/// Serializes a comment as `client` sees it, reading inside the request transaction.
pub(super) async fn load_comment(
    comment_id: i64,
    client: &Client,
    transaction: &mut PgTransaction,
) -> Result<CommentResponseBody, CommentError> {
    repository::get_comment(comment_id, client.id, &mut **transaction)
        .await?
        .map(CommentResponseBody::from)
        .ok_or(CommentError::CommentNotFound(comment_id))
}
