//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// 令牌签名密钥（HS256，至少 32 字符）
    pub token_secret: Secret<String>,
    /// 令牌有效期（秒），未设置时令牌永不过期
    pub token_ttl_secs: Option<u64>,
    /// 视为“注册”的 action 标识
    pub register_action: String,
    /// 视为“登录”的 action 标识
    pub login_action: String,
    /// 注册时未提供密码则生成的随机占位密码长度
    pub placeholder_password_length: usize,
    /// Argon2 内存开销（KiB）
    pub argon2_memory_kib: u32,
    /// Argon2 迭代次数
    pub argon2_iterations: u32,
    /// Argon2 并行度
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookConfig {
    pub app_id: String,
    pub app_secret: Secret<String>,
    /// Graph API 根地址
    pub graph_url: String,
    /// Graph API 版本，例如 "v2.10"
    pub graph_version: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: Secret<String>,
    /// REST API 根地址，例如 "https://api.twitter.com/1.1"
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub facebook: FacebookConfig,
    pub twitter: TwitterConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("auth.token_secret", "change-this-secret-in-production-min-32-chars!")?
            .set_default("auth.register_action", "register")?
            .set_default("auth.login_action", "login")?
            .set_default("auth.placeholder_password_length", 32)?
            .set_default("auth.argon2_memory_kib", 65536)?
            .set_default("auth.argon2_iterations", 3)?
            .set_default("auth.argon2_parallelism", 4)?
            .set_default("facebook.app_id", "")?
            .set_default("facebook.app_secret", "")?
            .set_default("facebook.graph_url", "https://graph.facebook.com")?
            .set_default("facebook.graph_version", "v2.10")?
            .set_default("facebook.timeout_secs", 10)?
            .set_default("twitter.consumer_key", "")?
            .set_default("twitter.consumer_secret", "")?
            .set_default("twitter.api_url", "https://api.twitter.com/1.1")?
            .set_default("twitter.timeout_secs", 10)?;

        // 从环境变量加载配置（前缀为 AUTH_）
        settings = settings.add_source(
            Environment::with_prefix("AUTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // 验证签名密钥长度（至少 32 字符）
        if self.auth.token_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "Token secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.auth.token_ttl_secs == Some(0) {
            return Err(ConfigError::Message(
                "token_ttl_secs must be greater than 0 (leave unset for non-expiring tokens)"
                    .to_string(),
            ));
        }

        if self.auth.register_action.is_empty() || self.auth.login_action.is_empty() {
            return Err(ConfigError::Message(
                "register_action and login_action must not be empty".to_string(),
            ));
        }

        if self.auth.register_action == self.auth.login_action {
            return Err(ConfigError::Message(
                "register_action and login_action must differ".to_string(),
            ));
        }

        if self.auth.placeholder_password_length < 16 || self.auth.placeholder_password_length > 128 {
            return Err(ConfigError::Message(
                "placeholder_password_length must be between 16 and 128".to_string(),
            ));
        }

        // 验证 Argon2 参数（与 argon2::Params 的下限一致）
        if self.auth.argon2_parallelism < 1 || self.auth.argon2_iterations < 1 {
            return Err(ConfigError::Message(
                "argon2_iterations and argon2_parallelism must be >= 1".to_string(),
            ));
        }

        if self.auth.argon2_memory_kib < 8 * self.auth.argon2_parallelism {
            return Err(ConfigError::Message(
                "argon2_memory_kib must be at least 8 * argon2_parallelism".to_string(),
            ));
        }

        Ok(())
    }
}
