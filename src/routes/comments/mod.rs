mod comment;
mod detail;
mod list;
mod routes;
mod score;

pub use comment::{CommentError, CommentPathParams};
pub use detail::*;
pub use list::*;
pub use routes::comment_routes;
pub use score::*;
