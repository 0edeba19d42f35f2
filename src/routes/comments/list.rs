use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;

use crate::authorization::{Client, Privilege, PrivilegeTable};
use crate::domain::{
    CommentListQuery, CommentQuery, CommentResponseBody, CreateCommentPayload, Limit, Metadata,
    NewComment, Page, Paging,
};
use crate::repository;
use crate::routes::comments::comment::{CommentError, load_comment};

#[tracing::instrument(
    skip_all,
    fields(client=%&*client, query=%params.query, page=%params.page, limit=%params.limit)
)]
pub async fn list_comments(
    params: web::Query<CommentListQuery>,
    pool: web::Data<PgPool>,
    privileges: web::Data<PrivilegeTable>,
    client: web::ReqData<Client>,
) -> Result<HttpResponse, CommentError> {
    let client = client.into_inner();
    privileges.verify(&client, Privilege::CommentList)?;

    let params = params.into_inner();
    let query = CommentQuery::parse(&params.query).map_err(CommentError::ValidationError)?;
    let paging = Paging {
        page: Page::parse(params.page).map_err(CommentError::ValidationError)?,
        limit: Limit::parse(params.limit).map_err(CommentError::ValidationError)?,
    };

    let (rows, total_records) =
        repository::search_comments(&query, &paging, client.id, &pool).await?;
    let comments: Vec<CommentResponseBody> = rows.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "query": params.query,
        "comments": comments,
        "metadata": Metadata::calculate(total_records, &paging),
    })))
}

#[tracing::instrument(
    skip_all,
    fields(client=%&*client, post_id=tracing::field::Empty)
)]
pub async fn create_comment(
    payload: web::Json<CreateCommentPayload>,
    pool: web::Data<PgPool>,
    privileges: web::Data<PrivilegeTable>,
    client: web::ReqData<Client>,
) -> Result<HttpResponse, CommentError> {
    let client = client.into_inner();
    privileges.verify(&client, Privilege::CommentCreate)?;
    let author_id = client.id.ok_or(CommentError::NotLoggedIn)?;

    let payload = payload.into_inner();
    let text = payload.text.ok_or(CommentError::MissingParameter("text"))?;
    let post_id = payload
        .post_id
        .ok_or(CommentError::MissingParameter("postId"))?;
    tracing::Span::current().record("post_id", tracing::field::display(post_id));

    let new_comment =
        NewComment::new(text, post_id, author_id).map_err(CommentError::ValidationError)?;

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;

    if !repository::lock_post(post_id, &mut transaction).await? {
        return Err(CommentError::PostNotFound(post_id));
    }

    let comment_id =
        repository::insert_comment(&new_comment, Utc::now(), &mut transaction).await?;
    let comment = load_comment(comment_id, &client, &mut transaction).await?;

    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new comment")?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "comment": comment })))
}
