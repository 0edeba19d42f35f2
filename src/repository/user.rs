use anyhow::Context;
use secrecy::Secret;
use sqlx::PgPool;

use crate::authorization::UserRank;

#[derive(sqlx::FromRow)]
struct CredentialsRecord {
    id: i64,
    rank: String,
    password_hash: String,
}

#[tracing::instrument(skip(pool))]
pub async fn get_stored_credentials(
    user_name: &str,
    pool: &PgPool,
) -> Result<Option<(i64, UserRank, Secret<String>)>, anyhow::Error> {
    let record = sqlx::query_as::<_, CredentialsRecord>(
        r#"
        SELECT id, rank, password_hash
        FROM users
        WHERE user_name = $1
        "#,
    )
    .bind(user_name)
    .fetch_optional(pool)
    .await
    .context("Failed to retrieve stored credentials")?;

    record
        .map(|r| {
            let rank = UserRank::parse(&r.rank).map_err(anyhow::Error::msg)?;
            Ok::<_, anyhow::Error>((r.id, rank, Secret::new(r.password_hash)))
        })
        .transpose()
}
