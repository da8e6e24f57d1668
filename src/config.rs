//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：内置默认值、config/default.toml、命令行指定的文件，最后用环境变量 `WIZARD__*` 覆盖（双下划线表示嵌套，如 `WIZARD__SERVICE__ENDPOINT=...`）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub telemetry: TelemetrySection,
    #[serde(default)]
    pub editor: EditorSection,
}

/// [service] 段：生成服务地址、传输端点、超时与重试
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    /// 随请求下发的服务 URL（请求体中的 `URL` 字段）
    #[serde(default = "default_service_url")]
    pub url: String,
    /// JSON-RPC 端点；未设置时使用 Mock 传输
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// 访问令牌（通常来自环境变量 WIZARD__SERVICE__ACCESS_TOKEN）
    pub access_token: Option<String>,
}

fn default_service_url() -> String {
    "https://c.ai.ansible.redhat.com".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            access_token: None,
        }
    }
}

/// [telemetry] 段：是否上报、测试模式标记所用的环境变量名
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySection {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,
    /// 该环境变量存在时视为测试模式，上报请求带 suppress 标记
    #[serde(default = "default_test_mode_env")]
    pub test_mode_env: String,
}

fn default_telemetry_enabled() -> bool {
    true
}

fn default_test_mode_env() -> String {
    "TEST_LIGHTSPEED_ACCESS_TOKEN".to_string()
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            test_mode_env: default_test_mode_env(),
        }
    }
}

/// [editor] 段：接受后的 playbook 写入目录与语言标识
#[derive(Debug, Clone, Deserialize)]
pub struct EditorSection {
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "ansible".to_string()
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            output_dir: None,
            language: default_language(),
        }
    }
}

/// 默认配置文件（相对工作目录，可缺省）
pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";

/// 加载配置：内置默认值 < config/default.toml < 显式文件 < 环境变量 WIZARD__*
///
/// 显式传入的文件必须存在，否则返回错误；默认文件缺失时只用内置默认值。
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false));

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder
        .add_source(
            config::Environment::with_prefix("WIZARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
