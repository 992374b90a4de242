//! 基于请求头的认证过滤器
//! 支持令牌、邮箱密码、Facebook 与 Twitter 四种认证方式

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod repository;
pub mod routes;
pub mod telemetry;
