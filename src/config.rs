//! # 配置模块
//!
//! ## 设计思路
//!
//! 将工厂级“可调策略”集中到 `FactoryConfig`：缓存预算 + 解码参数。
//! 配置构造后不可变，应用启动时读取一次，用来创建缓存与解码器。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置（缓存预算约等于“堆内存的 1/8”这一经验值）。
//! - JSON 中缺省的字段取默认值；文件不存在时整体取默认值。
//! - 解码参数平铺在同一层 JSON 中。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::BubbleError;
use crate::decode::DecodeConfig;

/// 工厂配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// 解码缓存允许占用的像素字节总数。
    pub cache_budget_bytes: usize,
    #[serde(flatten)]
    pub decode: DecodeConfig,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            cache_budget_bytes: 64 * 1024 * 1024,
            decode: DecodeConfig::default(),
        }
    }
}

impl FactoryConfig {
    /// 从 JSON 文件读取配置；文件不存在时返回默认配置。
    pub fn load_from_path(config_path: &Path) -> Result<Self, BubbleError> {
        if !config_path.exists() {
            log::info!(
                "⚙️ 配置文件不存在，使用默认配置 - {}",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| BubbleError::InvalidConfig(format!("解析配置文件失败：{}", e)))?;
        config.decode.validate()?;

        log::info!(
            "⚙️ 已加载配置 - cache_budget={}KB density={}x -> {}dpi",
            config.cache_budget_bytes / 1024,
            config.decode.source_density,
            config.decode.target_density
        );
        Ok(config)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), BubbleError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BubbleError::InvalidConfig(format!("序列化配置失败：{}", e)))?;
        fs::write(config_path, content)?;
        Ok(())
    }
}
