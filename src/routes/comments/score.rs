use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;

use crate::authorization::{Client, Privilege, PrivilegeTable};
use crate::domain::{RateCommentPayload, Score};
use crate::repository;
use crate::routes::comments::comment::{CommentError, CommentPathParams, load_comment};

#[tracing::instrument(skip_all, fields(comment_id=%path.id, client=%&*client, score=%payload.score))]
pub async fn rate_comment(
    path: web::Path<CommentPathParams>,
    payload: web::Json<RateCommentPayload>,
    pool: web::Data<PgPool>,
    privileges: web::Data<PrivilegeTable>,
    client: web::ReqData<Client>,
) -> Result<HttpResponse, CommentError> {
    let comment_id = path.id;
    let client = client.into_inner();
    privileges.verify(&client, Privilege::CommentScore)?;
    let user_id = client.id.ok_or(CommentError::NotLoggedIn)?;

    let score = Score::parse(payload.score).map_err(CommentError::ValidationError)?;

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;

    if !repository::comment_exists(comment_id, &mut transaction).await? {
        return Err(CommentError::CommentNotFound(comment_id));
    }

    repository::set_comment_score(comment_id, user_id, score, &mut transaction).await?;
    let comment = load_comment(comment_id, &client, &mut transaction).await?;

    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to rate a comment")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "comment": comment })))
}
