// Run with: cargo fuzz run fuzz_search_query
#![no_main]

use booru_comments::domain::{CommentQuery, Criteria, to_like_pattern};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(query) = CommentQuery::parse(text) {
        for filter in &query.filters {
            if let Criteria::Patterns(patterns) = &filter.criteria {
                for pattern in patterns {
                    assert!(!to_like_pattern(pattern).contains('*'));
                }
            }
        }
    }
});
