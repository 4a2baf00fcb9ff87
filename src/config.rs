//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再读显式指定的文件，最后用环境变量 `CONCIERGE__*` 覆盖
//! （双下划线表示嵌套，如 `CONCIERGE__STORAGE__BACKEND=file`）。所有字段都有默认值。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub storage: StorageSection,
    pub dialogs: DialogsSection,
    pub recognizer: RecognizerSection,
    pub console: ConsoleSection,
    pub http: HttpSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "concierge".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// 进程内，重启即丢失
    #[default]
    Memory,
    /// 每个键一个 JSON 文件
    File,
}

/// [storage] 段：状态存储后端
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackend,
    /// file 后端的根目录
    pub path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("state"),
        }
    }
}

/// [dialogs] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DialogsSection {
    /// 对话栈最大深度
    pub max_depth: usize,
}

impl Default for DialogsSection {
    fn default() -> Self {
        Self {
            max_depth: crate::dialogs::DEFAULT_MAX_DEPTH,
        }
    }
}

/// [recognizer] 段：活动未携带本地时间戳时使用的时区
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecognizerSection {
    pub utc_offset_minutes: i32,
}

/// [console] 段：控制台前端使用的身份
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleSection {
    pub user_id: String,
    pub user_name: Option<String>,
    /// 未设置时每次启动生成新的会话
    pub conversation_id: Option<String>,
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            user_id: "console-user".to_string(),
            user_name: None,
            conversation_id: None,
        }
    }
}

/// [http] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub bind: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3978".to_string(),
        }
    }
}

/// 加载配置：config/default.toml（若存在）→ `config_path`（若存在）→ 环境变量 CONCIERGE__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CONCIERGE")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
