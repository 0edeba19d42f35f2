use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;

use crate::authorization::{Client, Ownership, Privilege, PrivilegeTable};
use crate::domain::{
    CommentResponseBody, CommentText, DeleteCommentPayload, UpdateCommentPayload,
};
use crate::repository;
use crate::routes::comments::comment::{
    CommentError, CommentPathParams, check_version, load_comment,
};

#[tracing::instrument(skip_all, fields(comment_id=%path.id, client=%&*client))]
pub async fn get_comment(
    path: web::Path<CommentPathParams>,
    pool: web::Data<PgPool>,
    privileges: web::Data<PrivilegeTable>,
    client: web::ReqData<Client>,
) -> Result<HttpResponse, CommentError> {
    let comment_id = path.id;
    let client = client.into_inner();
    privileges.verify(&client, Privilege::CommentView)?;

    let comment = repository::get_comment(comment_id, client.id, pool.get_ref())
        .await?
        .map(CommentResponseBody::from)
        .ok_or(CommentError::CommentNotFound(comment_id))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "comment": comment })))
}

#[tracing::instrument(skip_all, fields(comment_id=%path.id, client=%&*client))]
pub async fn update_comment(
    path: web::Path<CommentPathParams>,
    payload: Option<web::Json<UpdateCommentPayload>>,
    pool: web::Data<PgPool>,
    privileges: web::Data<PrivilegeTable>,
    client: web::ReqData<Client>,
) -> Result<HttpResponse, CommentError> {
    let comment_id = path.id;
    let client = client.into_inner();
    // A missing or malformed body surfaces as a missing `text` after the privilege check
    let payload = payload.map(web::Json::into_inner);

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;

    let mut comment = repository::lock_comment(comment_id, &mut transaction)
        .await?
        .ok_or(CommentError::CommentNotFound(comment_id))?;
    check_version(&comment, payload.as_ref().and_then(|p| p.version))?;

    let ownership = Ownership::of(&client, comment.user_id);
    // Stamped on the locked row only; a failed check below rolls the transaction back
    comment.last_edit_time = Some(Utc::now());
    privileges.verify(&client, Privilege::CommentEdit(ownership))?;

    let text = payload
        .and_then(|p| p.text)
        .ok_or(CommentError::MissingParameter("text"))?;
    let text = CommentText::parse(text).map_err(CommentError::ValidationError)?;
    comment.text = text.as_ref().to_string();

    repository::save_comment_edit(&comment, &mut transaction).await?;
    let comment = load_comment(comment_id, &client, &mut transaction).await?;

    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to update a comment")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "comment": comment })))
}

#[tracing::instrument(skip_all, fields(comment_id=%path.id, client=%&*client))]
pub async fn delete_comment(
    path: web::Path<CommentPathParams>,
    payload: Option<web::Json<DeleteCommentPayload>>,
    pool: web::Data<PgPool>,
    privileges: web::Data<PrivilegeTable>,
    client: web::ReqData<Client>,
) -> Result<HttpResponse, CommentError> {
    let comment_id = path.id;
    let client = client.into_inner();
    let payload = payload.map(web::Json::into_inner).unwrap_or_default();

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;

    let comment = repository::lock_comment(comment_id, &mut transaction)
        .await?
        .ok_or(CommentError::CommentNotFound(comment_id))?;
    check_version(&comment, payload.version)?;

    let ownership = Ownership::of(&client, comment.user_id);
    privileges.verify(&client, Privilege::CommentDelete(ownership))?;

    repository::delete_comment(comment_id, &mut transaction).await?;

    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to delete a comment")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}
