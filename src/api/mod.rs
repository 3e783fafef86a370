// api/mod.rs - 调用方适配层
//! HTTP 层和命令行共用的搜索请求/响应类型，可直接 serde 序列化

pub mod request;
pub mod response;

pub use self::request::SearchRequest;
pub use self::response::SearchResponse;
