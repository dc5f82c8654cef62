pub mod search;
pub mod server;

use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> Self {
        Self::with_code(400, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::with_code(404, message)
    }

    /// Engine could not be initialized / 引擎初始化失败
    pub fn unavailable(message: &str) -> Self {
        Self::with_code(500, message)
    }

    fn with_code(code: i32, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: None,
        }
    }
}
