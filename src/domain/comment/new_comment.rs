use crate::domain::CommentText;

#[derive(Debug)]
pub struct NewComment {
    pub text: CommentText,
    pub post_id: i64,
    pub author_id: i64,
}

impl NewComment {
    /// Validates the text only. Whether `post_id` names a post is decided by the database.
    pub fn new(text: String, post_id: i64, author_id: i64) -> Result<Self, String> {
        Ok(Self {
            text: CommentText::parse(text)?,
            post_id,
            author_id,
        })
    }
}
