use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PageInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

impl PageInfo {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        Self {
            page,
            page_size,
            total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResultBody<T> {
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

/// Uniform envelope returned by every endpoint. `message` is null on success.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub result: ResultBody<T>,
    pub error: bool,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, pagination: Option<PageInfo>) -> Self {
        Self {
            result: ResultBody {
                data: Some(data),
                pagination,
            },
            error: false,
            message: None,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: ResultBody {
                data: None,
                pagination: None,
            },
            error: true,
            message: Some(message.into()),
        }
    }
}
