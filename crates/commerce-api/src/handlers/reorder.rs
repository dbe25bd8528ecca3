//! 通用排序 API 处理器
//!
//! 所有带 urutan 列的表共用一个入口，表名来自白名单

use axum::{
    Json,
    extract::{Path, State},
};
use commerce::{MoveCommand, OrderedTable, ReorderOutcome};

use crate::error::{ApiError, Result};
use crate::response::ApiResponse;
use crate::state::AppState;

fn parse_table(segment: &str) -> Result<OrderedTable> {
    OrderedTable::from_path(segment).ok_or_else(|| {
        ApiError::NotFound(format!("Resource tidak mendukung pengurutan: {}", segment))
    })
}

/// 移动一行：上移、下移或移动到指定位置
///
/// POST /api/admin/reorder/{table}/{id}
///
/// 请求体示例：`{"action": "up"}`、`{"action": "to", "position": 3}`
pub async fn move_item(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i64)>,
    Json(command): Json<MoveCommand>,
) -> Result<Json<ApiResponse<ReorderOutcome>>> {
    let outcome = state
        .reorder
        .move_item(parse_table(&table)?, id, command)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_parse_table_whitelist() {
        assert_eq!(parse_table("blog-posts").unwrap(), OrderedTable::BlogPost);
        assert_eq!(
            parse_table("admins").unwrap_err().status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_move_command_body() {
        let up: MoveCommand = serde_json::from_str(r#"{"action":"up"}"#).unwrap();
        assert_eq!(up, MoveCommand::Up);

        let to: MoveCommand = serde_json::from_str(r#"{"action":"to","position":3}"#).unwrap();
        assert_eq!(to, MoveCommand::To(3));
    }
}
