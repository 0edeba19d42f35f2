use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct Page(i32);

impl Page {
    pub fn parse(value: i32) -> Result<Self, String> {
        if value <= 0 {
            return Err("page must be greater than zero".to_string());
        }

        if value > 1_000_000 {
            return Err("page must be a maximum of 1 million".to_string());
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Limit(i32);

impl Limit {
    pub fn parse(value: i32) -> Result<Self, String> {
        if value <= 0 {
            return Err("limit must be greater than zero".to_string());
        }

        if value > 100 {
            return Err("limit must be a maximum of 100".to_string());
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub page: Page,
    pub limit: Limit,
}

impl Paging {
    pub fn offset(&self) -> i64 {
        (self.page.value() as i64 - 1) * self.limit.value() as i64
    }
}

#[derive(Deserialize, Debug)]
pub struct CommentListQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: i32,
    #[serde(default = "default_limit")]
    pub limit: i32,
}

fn default_page() -> i32 {
    1
}

fn default_limit() -> i32 {
    20
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub current_page: i32,
    pub page_size: i32,
    pub first_page: i32,
    pub last_page: i32,
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, paging: &Paging) -> Self {
        let page_size = paging.limit.value();
        let last_page = if total_records == 0 {
            1
        } else {
            ((total_records + page_size as i64 - 1) / page_size as i64) as i32
        };

        Self {
            current_page: paging.page.value(),
            page_size,
            first_page: 1,
            last_page,
            total_records,
        }
    }
}
