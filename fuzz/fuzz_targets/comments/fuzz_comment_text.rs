// Run with: cargo fuzz run fuzz_comment_text
#![no_main]

use arbitrary::Arbitrary;
use booru_comments::domain::CommentText;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    text: String,
    padding: u8,
}

fuzz_target!(|input: Input| {
    let padded = format!("{}{}", " ".repeat(input.padding as usize % 8), input.text);

    // leading whitespace never changes the outcome
    match (
        CommentText::parse(input.text.clone()),
        CommentText::parse(padded),
    ) {
        (Ok(a), Ok(b)) => assert_eq!(a.as_ref(), b.as_ref()),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("inconsistent parse: {a:?} vs {b:?}"),
    }
});
