use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Limit/offset query parameters with sane defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit(),
            offset: pagination.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let pagination = Pagination::default();

        assert_eq!(pagination.limit(), DEFAULT_LIMIT);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn limit_is_clamped() {
        let pagination = Pagination {
            limit: Some(10_000),
            offset: Some(-5),
        };

        assert_eq!(pagination.limit(), MAX_LIMIT);
        assert_eq!(pagination.offset(), 0);

        let pagination = Pagination {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(pagination.limit(), 1);
    }
}
