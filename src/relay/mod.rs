//! 中转服务
//!
//! 把 `POST /api/generate` 的 `{prompt}` 转发给上游模型，返回 `{text}` 或 `{error}`。
//! 评分工具通过 `RelayGateway` 调用它，令牌只保存在中转服务一侧。

pub mod server;

pub use server::{router, serve, RelayState, GENERATE_PATH};
