use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON 请求体；解析失败时返回统一的错误格式
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// 查询参数，如 `?limit=abc` 同样返回 JSON 错误
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
