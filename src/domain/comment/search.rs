//! Comment search syntax.
//!
//! A query is a whitespace separated list of tokens:
//!
//! * `key:value` filters on a named field, `-key:value` excludes matches,
//! * bare words filter on the comment text,
//! * `sort:field[,asc|desc]` orders the results, `-sort:field` reverses the order,
//! * `sort:random` shuffles the results and overrides every other sort.
//!
//! Integer fields take comma separated values (`id:1,2,3`) or ranges
//! (`id:1..5`, `id:3..`, `id:..7`). String fields take comma separated
//! alternatives where `*` matches any run of characters. Time fields take
//! `today`, `yesterday`, `YYYY`, `YYYY-MM` or `YYYY-MM-DD`, each naming the whole
//! day, month or year, either as a comma separated list or as a range.
//!
//! A colon preceded by a backslash (`http\://example.org`) is part of the value
//! and does not start a key.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Id,
    Post,
    User,
    Text,
    Score,
    CreationTime,
    LastEditTime,
}

impl FilterKind {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(Self::Id),
            "post" => Some(Self::Post),
            "user" | "author" => Some(Self::User),
            "text" => Some(Self::Text),
            "score" => Some(Self::Score),
            "creation-time" | "creation-date" => Some(Self::CreationTime),
            "last-edit-time" | "last-edit-date" | "edit-time" | "edit-date" => {
                Some(Self::LastEditTime)
            }
            _ => None,
        }
    }
}

/// Half-open interval `[start, end)` covering a day, month or year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    fn parse(value: &str, today: NaiveDate) -> Result<Self, String> {
        let invalid = || format!("Invalid search value: `{value}` is not a date");

        let (start, end) = match value {
            "today" => (today, today.succ_opt()),
            "yesterday" => (today.pred_opt().ok_or_else(invalid)?, Some(today)),
            _ => {
                let mut parts = value.split('-');
                let year: i32 = parts
                    .next()
                    .and_then(|year| year.parse().ok())
                    .ok_or_else(invalid)?;
                let month: Option<u32> = parts
                    .next()
                    .map(|month| month.parse().map_err(|_| invalid()))
                    .transpose()?;
                let day: Option<u32> = parts
                    .next()
                    .map(|day| day.parse().map_err(|_| invalid()))
                    .transpose()?;
                if parts.next().is_some() {
                    return Err(invalid());
                }

                let start =
                    NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))
                        .ok_or_else(invalid)?;
                let end = match (month, day) {
                    (None, _) => start.checked_add_months(Months::new(12)),
                    (Some(_), None) => start.checked_add_months(Months::new(1)),
                    (Some(_), Some(_)) => start.succ_opt(),
                };
                (start, end)
            }
        };

        Ok(Self {
            start: midnight(start),
            end: midnight(end.ok_or_else(invalid)?),
        })
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    Integers(Vec<i64>),
    Range {
        min: Option<i64>,
        max: Option<i64>,
    },
    Patterns(Vec<String>),
    Spans(Vec<TimeSpan>),
    /// `until` is exclusive.
    TimeRange {
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    },
}

impl Criteria {
    fn parse(kind: FilterKind, value: &str, today: NaiveDate) -> Result<Self, String> {
        match kind {
            FilterKind::Id | FilterKind::Post | FilterKind::Score => Self::parse_integers(value),
            FilterKind::User | FilterKind::Text => Self::parse_patterns(value),
            FilterKind::CreationTime | FilterKind::LastEditTime => {
                Self::parse_times(value, today)
            }
        }
    }

    fn parse_integers(value: &str) -> Result<Self, String> {
        let parse = |s: &str| {
            s.parse::<i64>()
                .map_err(|_| format!("Invalid search value: `{s}` is not an integer"))
        };

        if let Some((min, max)) = value.split_once("..") {
            let min = (!min.is_empty()).then(|| parse(min)).transpose()?;
            let max = (!max.is_empty()).then(|| parse(max)).transpose()?;
            if min.is_none() && max.is_none() {
                return Err("Invalid search range: `..` needs at least one bound".to_string());
            }
            return Ok(Self::Range { min, max });
        }

        let values = value.split(',').map(parse).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Integers(values))
    }

    fn parse_patterns(value: &str) -> Result<Self, String> {
        let patterns: Vec<String> = value.split(',').map(unescape).collect();
        if patterns.iter().any(String::is_empty) {
            return Err(format!("Invalid search value: `{value}` has an empty alternative"));
        }
        Ok(Self::Patterns(patterns))
    }

    fn parse_times(value: &str, today: NaiveDate) -> Result<Self, String> {
        if let Some((from, until)) = value.split_once("..") {
            let from = (!from.is_empty())
                .then(|| TimeSpan::parse(from, today))
                .transpose()?
                .map(|span| span.start);
            let until = (!until.is_empty())
                .then(|| TimeSpan::parse(until, today))
                .transpose()?
                .map(|span| span.end);
            if from.is_none() && until.is_none() {
                return Err("Invalid search range: `..` needs at least one bound".to_string());
            }
            return Ok(Self::TimeRange { from, until });
        }

        let spans = value
            .split(',')
            .map(|v| TimeSpan::parse(v, today))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Spans(spans))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub kind: FilterKind,
    pub criteria: Criteria,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Post,
    Text,
    User,
    CreationTime,
    LastEditTime,
    Score,
}

impl SortField {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(Self::Id),
            "post" => Some(Self::Post),
            "text" => Some(Self::Text),
            "user" | "author" => Some(Self::User),
            "creation-time" | "creation-date" => Some(Self::CreationTime),
            "last-edit-time" | "last-edit-date" | "edit-time" | "edit-date" => {
                Some(Self::LastEditTime)
            }
            "score" => Some(Self::Score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    fn parse(value: &str, negated: bool) -> Result<Self, String> {
        let (field, direction) = match value.split_once(',') {
            Some((field, "asc")) => (field, SortDirection::Asc),
            Some((field, "desc")) => (field, SortDirection::Desc),
            Some((_, other)) => return Err(format!("Invalid sort direction: `{other}`")),
            None => (value, SortDirection::Desc),
        };
        let field =
            SortField::from_key(field).ok_or_else(|| format!("Invalid sort field: `{field}`"))?;
        let direction = if negated { direction.reversed() } else { direction };

        Ok(Self { field, direction })
    }

    pub fn to_sql(&self) -> String {
        let column = match self.field {
            SortField::Id => "c.id",
            SortField::Post => "c.post_id",
            SortField::Text => "c.text",
            SortField::User => "u.user_name",
            SortField::CreationTime => "c.creation_time",
            SortField::LastEditTime => "c.last_edit_time",
            SortField::Score => "c.score",
        };

        let direction = match self.direction {
            SortDirection::Asc => "ASC NULLS LAST",
            SortDirection::Desc => "DESC NULLS LAST",
        };

        format!("{column} {direction}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentQuery {
    pub filters: Vec<Filter>,
    pub sorts: Vec<SortOrder>,
    pub random_sort: bool,
}

impl CommentQuery {
    pub fn parse(text: &str) -> Result<Self, String> {
        Self::parse_at(text, Utc::now().date_naive())
    }

    fn parse_at(text: &str, today: NaiveDate) -> Result<Self, String> {
        let mut query = Self::default();

        for token in text.split_whitespace() {
            let (negated, token) = match token.strip_prefix('-') {
                Some(rest) if !rest.is_empty() => (true, rest),
                _ => (false, token),
            };

            let Some((key, value)) = split_key(token) else {
                query.filters.push(Filter {
                    kind: FilterKind::Text,
                    criteria: Criteria::Patterns(vec![unescape(token)]),
                    negated,
                });
                continue;
            };

            if value.is_empty() {
                return Err(format!("Invalid search token: `{token}` has no value"));
            }

            if key == "sort" {
                if value == "random" {
                    query.random_sort = true;
                } else {
                    query.sorts.push(SortOrder::parse(value, negated)?);
                }
                continue;
            }

            let kind = FilterKind::from_key(key)
                .ok_or_else(|| format!("Invalid search token: unknown key `{key}`"))?;
            let criteria = Criteria::parse(kind, value, today)?;

            query.filters.push(Filter {
                kind,
                criteria,
                negated,
            });
        }

        Ok(query)
    }
}

/// Splits `key:value` on the first colon that is not escaped with a backslash.
fn split_key(token: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in token.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ':' => return Some((&token[..i], &token[i + 1..])),
            _ => {}
        }
    }
    None
}

fn unescape(value: &str) -> String {
    value.replace("\\:", ":")
}

/// Translates a `*` wildcard pattern into an `ILIKE` pattern, escaping LIKE metacharacters.
pub fn to_like_pattern(pattern: &str) -> String {
    let mut like = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '\\' | '%' | '_' => {
                like.push('\\');
                like.push(c);
            }
            '*' => like.push('%'),
            c => like.push(c),
        }
    }
    like
}
