use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::domain::{
    CommentQuery, CommentRecord, CommentRow, Criteria, FilterKind, NewComment,
    Paging, Score, to_like_pattern,
};
use crate::repository::PgTransaction;

// Comments joined with author and score totals. `own` is the viewer's vote, bound right after.
const COMMENT_VIEW: &str = r#"
    SELECT c.id, c.user_id, c.post_id, c.text, c.creation_time, c.last_edit_time, c.version,
           u.user_name, u.rank AS user_rank, c.score,
           COALESCE(own.score, 0::SMALLINT) AS own_score
    FROM (
        SELECT comments.*,
               COALESCE(
                   (SELECT SUM(s.score) FROM comment_scores s WHERE s.comment_id = comments.id),
                   0
               )::BIGINT AS score
        FROM comments
    ) c
    LEFT JOIN users u ON u.id = c.user_id
    LEFT JOIN comment_scores own ON own.comment_id = c.id AND own.user_id = "#;

fn comment_view(viewer_id: Option<i64>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(COMMENT_VIEW);
    builder.push_bind(viewer_id);
    builder
}

#[tracing::instrument(skip(executor))]
pub async fn get_comment(
    comment_id: i64,
    viewer_id: Option<i64>,
    executor: impl PgExecutor<'_>,
) -> Result<Option<CommentRow>, anyhow::Error> {
    let mut builder = comment_view(viewer_id);
    builder.push(" WHERE c.id = ").push_bind(comment_id);

    builder
        .build_query_as::<CommentRow>()
        .fetch_optional(executor)
        .await
        .context("Failed to load comment")
}

/// Loads the stored comment and holds a row lock on it until the transaction ends.
#[tracing::instrument(skip(transaction))]
pub async fn lock_comment(
    comment_id: i64,
    transaction: &mut PgTransaction,
) -> Result<Option<CommentRecord>, anyhow::Error> {
    sqlx::query_as::<_, CommentRecord>(
        r#"
        SELECT id, user_id, post_id, text, creation_time, last_edit_time, version
        FROM comments
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(comment_id)
    .fetch_optional(&mut **transaction)
    .await
    .context("Failed to lock comment")
}

#[tracing::instrument(skip(transaction))]
pub async fn comment_exists(
    comment_id: i64,
    transaction: &mut PgTransaction,
) -> Result<bool, anyhow::Error> {
    let row = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM comments
        WHERE id = $1
        FOR KEY SHARE
        "#,
    )
    .bind(comment_id)
    .fetch_optional(&mut **transaction)
    .await
    .context("Failed to check if comment exists")?;

    Ok(row.is_some())
}

#[tracing::instrument(
    skip_all,
    fields(post_id=%comment.post_id, comment_id=tracing::field::Empty)
)]
pub async fn insert_comment(
    comment: &NewComment,
    creation_time: DateTime<Utc>,
    transaction: &mut PgTransaction,
) -> Result<i64, anyhow::Error> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO comments (user_id, post_id, text, creation_time)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(comment.author_id)
    .bind(comment.post_id)
    .bind(comment.text.as_ref())
    .bind(creation_time)
    .fetch_one(&mut **transaction)
    .await
    .context("Failed to insert comment")?;

    tracing::Span::current().record("comment_id", tracing::field::display(id));
    Ok(id)
}

/// Writes the edited text and edit time of a locked comment and bumps its version.
#[tracing::instrument(skip_all, fields(comment_id=%comment.id))]
pub async fn save_comment_edit(
    comment: &CommentRecord,
    transaction: &mut PgTransaction,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        UPDATE comments
        SET text = $1, last_edit_time = $2, version = version + 1
        WHERE id = $3
        "#,
    )
    .bind(&comment.text)
    .bind(comment.last_edit_time)
    .bind(comment.id)
    .execute(&mut **transaction)
    .await
    .context("Failed to update comment text")?;

    Ok(())
}

#[tracing::instrument(skip(transaction))]
pub async fn delete_comment(
    comment_id: i64,
    transaction: &mut PgTransaction,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        DELETE FROM comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .execute(&mut **transaction)
    .await
    .context("Failed to delete comment")?;

    Ok(())
}

/// Replaces the user's vote on a comment. A neutral score only removes the old vote.
#[tracing::instrument(skip(transaction))]
pub async fn set_comment_score(
    comment_id: i64,
    user_id: i64,
    score: Score,
    transaction: &mut PgTransaction,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        DELETE FROM comment_scores
        WHERE comment_id = $1 AND user_id = $2
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .execute(&mut **transaction)
    .await
    .context("Failed to remove previous comment score")?;

    if score.is_neutral() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO comment_scores (comment_id, user_id, score)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .bind(score.value())
    .execute(&mut **transaction)
    .await
    .context("Failed to store comment score")?;

    Ok(())
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, query: &CommentQuery) {
    builder.push(" WHERE TRUE");

    for filter in &query.filters {
        let column = match filter.kind {
            FilterKind::Id => "c.id",
            FilterKind::Post => "c.post_id",
            FilterKind::Score => "c.score",
            FilterKind::Text => "c.text",
            FilterKind::User => "COALESCE(u.user_name, '')",
            FilterKind::CreationTime => "c.creation_time",
            FilterKind::LastEditTime => "c.last_edit_time",
        };

        // Negation also keeps rows whose column is NULL, e.g. never edited comments
        builder.push(if filter.negated {
            " AND NOT COALESCE(("
        } else {
            " AND (("
        });
        match &filter.criteria {
            Criteria::Integers(values) => {
                builder
                    .push(column)
                    .push(" = ANY(")
                    .push_bind(values.clone())
                    .push(")");
            }
            Criteria::Range { min, max } => {
                builder.push("TRUE");
                if let Some(min) = min {
                    builder.push(" AND ").push(column).push(" >= ").push_bind(*min);
                }
                if let Some(max) = max {
                    builder.push(" AND ").push(column).push(" <= ").push_bind(*max);
                }
            }
            Criteria::Patterns(patterns) => {
                let patterns: Vec<String> = patterns.iter().map(|p| to_like_pattern(p)).collect();
                builder
                    .push(column)
                    .push(" ILIKE ANY(")
                    .push_bind(patterns)
                    .push(")");
            }
            Criteria::Spans(spans) => {
                builder.push("FALSE");
                for span in spans {
                    builder
                        .push(" OR (")
                        .push(column)
                        .push(" >= ")
                        .push_bind(span.start)
                        .push(" AND ")
                        .push(column)
                        .push(" < ")
                        .push_bind(span.end)
                        .push(")");
                }
            }
            Criteria::TimeRange { from, until } => {
                builder.push("TRUE");
                if let Some(from) = from {
                    builder.push(" AND ").push(column).push(" >= ").push_bind(*from);
                }
                if let Some(until) = until {
                    builder.push(" AND ").push(column).push(" < ").push_bind(*until);
                }
            }
        }
        builder.push(if filter.negated { "), FALSE)" } else { "))" });
    }
}

#[tracing::instrument(skip(pool))]
pub async fn search_comments(
    query: &CommentQuery,
    paging: &Paging,
    viewer_id: Option<i64>,
    pool: &PgPool,
) -> Result<(Vec<CommentRow>, i64), anyhow::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM (");
    count.push(COMMENT_VIEW).push_bind(viewer_id);
    push_filters(&mut count, query);
    count.push(") AS matched");

    let total_records = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    let mut select = comment_view(viewer_id);
    push_filters(&mut select, query);
    select.push(" ORDER BY ");
    if query.random_sort {
        select.push("random()");
    } else {
        for sort in &query.sorts {
            select.push(sort.to_sql()).push(", ");
        }
        select.push("c.creation_time DESC, c.id DESC");
    }
    select
        .push(" LIMIT ")
        .push_bind(i64::from(paging.limit.value()))
        .push(" OFFSET ")
        .push_bind(paging.offset());

    let comments = select
        .build_query_as::<CommentRow>()
        .fetch_all(pool)
        .await
        .context("Failed to search comments")?;

    Ok((comments, total_records))
}
