/// A single user's vote on a comment. Zero means "no vote" and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(i16);

impl Score {
    pub fn parse(value: i16) -> Result<Self, String> {
        match value {
            -1..=1 => Ok(Self(value)),
            _ => Err("Invalid score: must be -1, 0 or 1.".to_string()),
        }
    }

    pub fn value(&self) -> i16 {
        self.0
    }

    pub fn is_neutral(&self) -> bool {
        self.0 == 0
    }
}
