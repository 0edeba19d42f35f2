use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Row as stored, used when a mutation needs the author and version
#[derive(sqlx::FromRow, Debug)]
pub struct CommentRecord {
    pub id: i64,
    pub user_id: Option<i64>,
    pub post_id: i64,
    pub text: String,
    pub creation_time: DateTime<Utc>,
    pub last_edit_time: Option<DateTime<Utc>>,
    pub version: i32,
}

// Row joined with its author and scores, as seen by one client
#[derive(sqlx::FromRow, Debug)]
pub struct CommentRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub post_id: i64,
    pub text: String,
    pub creation_time: DateTime<Utc>,
    pub last_edit_time: Option<DateTime<Utc>>,
    pub version: i32,
    pub user_name: Option<String>,
    pub user_rank: Option<String>,
    pub score: i64,
    pub own_score: i16,
}

#[derive(Serialize, Debug)]
pub struct MicroUser {
    pub name: String,
    pub rank: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponseBody {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub creation_time: DateTime<Utc>,
    pub last_edit_time: Option<DateTime<Utc>>,
    pub version: i32,
    pub user: Option<MicroUser>,
    pub score: i64,
    pub own_score: i16,
}

impl From<CommentRow> for CommentResponseBody {
    fn from(row: CommentRow) -> Self {
        let user = match (row.user_name, row.user_rank) {
            (Some(name), Some(rank)) => Some(MicroUser { name, rank }),
            _ => None,
        };

        Self {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            creation_time: row.creation_time,
            last_edit_time: row.last_edit_time,
            version: row.version,
            user,
            score: row.score,
            own_score: row.own_score,
        }
    }
}

// Fields are optional so that missing parameters are reported after the privilege check
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentPayload {
    pub text: Option<String>,
    pub post_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCommentPayload {
    pub text: Option<String>,
    pub version: Option<i32>,
}

#[derive(Deserialize, Debug, Default)]
pub struct DeleteCommentPayload {
    pub version: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct RateCommentPayload {
    pub score: i16,
}
