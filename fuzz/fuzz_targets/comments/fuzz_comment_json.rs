// Run with: cargo fuzz run fuzz_comment_json
// Feeds CreateCommentPayload-shaped JSON into NewComment::new.
#![no_main]

use booru_comments::domain::NewComment;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    if let Ok(v) = serde_json::from_slice::<Value>(data) {
        let text = v.get("text").and_then(|s| s.as_str()).unwrap_or("").to_string();
        let post_id = v.get("postId").and_then(|n| n.as_i64()).unwrap_or(0);

        if let Ok(comment) = NewComment::new(text, post_id, 1) {
            assert_eq!(comment.post_id, post_id);
            assert!(!comment.text.as_ref().is_empty());
        }
    }
});
