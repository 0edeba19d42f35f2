use anyhow::Context;

use crate::repository::PgTransaction;

/// Checks that the post exists and keeps it from being deleted until the transaction ends.
#[tracing::instrument(skip(transaction))]
pub async fn lock_post(post_id: i64, transaction: &mut PgTransaction) -> Result<bool, anyhow::Error> {
    let row = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM posts
        WHERE id = $1
        FOR KEY SHARE
        "#,
    )
    .bind(post_id)
    .fetch_optional(&mut **transaction)
    .await
    .context("Failed to look up post")?;

    Ok(row.is_some())
}
