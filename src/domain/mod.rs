mod comment;
mod pagination;

pub use comment::*;
pub use pagination::*;
