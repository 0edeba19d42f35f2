mod comment_text;
mod new_comment;
mod score;
mod search;
mod types;

pub use comment_text::CommentText;
pub use new_comment::NewComment;
pub use score::Score;
pub use search::{
    CommentQuery, Criteria, Filter, FilterKind, SortDirection, SortField, SortOrder, TimeSpan,
    to_like_pattern,
};
pub use types::*;
