//! # 像素获取模块（decode）
//!
//! ## 设计思路
//!
//! 该模块把“来源识别 → 加载校验 → 解码 / 密度缩放 / 镜像”按职责拆分为多个子模块：
//!
//! - `source`：来源、来源身份与解码结果模型
//! - `config`：解码上限与密度参数
//! - `loader`：文件 / 内嵌资源加载与签名校验
//! - `pipeline`：解码、像素限制、密度缩放、镜像
//!
//! 解码是整条链路里唯一可能阻塞的操作，调用方应在非 UI 线程执行
//! （见 `BubbleFactory::build_animation_async`）。
//!
//! ```text
//! Decoder::decode
//!    ├─ loader.rs（来源加载 + 体积 / 签名校验）
//!    └─ pipeline.rs（解码 + 像素限制 + 密度缩放 + 镜像）
//! ```

mod config;
mod loader;
mod pipeline;
mod source;

use std::time::Instant;

use crate::BubbleError;

pub use config::{DENSITY_DEFAULT, DecodeConfig, ResizeFilter};
pub use source::{DecodedImage, ImageSource, SourceId};

/// 图片解码器。
///
/// 持有不可变的解码配置，可在线程间共享。
#[derive(Debug, Clone)]
pub struct Decoder {
    config: DecodeConfig,
}

impl Decoder {
    /// 根据配置创建解码器，配置在这里一次性校验。
    ///
    /// # 示例
    /// ```rust
    /// use ninepatch_bubble::decode::{DecodeConfig, Decoder};
    ///
    /// let decoder = Decoder::new(DecodeConfig::default())?;
    /// assert_eq!(decoder.config().source_density, 1);
    /// # Ok::<(), ninepatch_bubble::BubbleError>(())
    /// ```
    pub fn new(config: DecodeConfig) -> Result<Self, BubbleError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// 处理主入口：从任意来源加载并解码，`mirror` 时水平翻转像素。
    pub fn decode(&self, source: &ImageSource, mirror: bool) -> Result<DecodedImage, BubbleError> {
        let config = &self.config;
        let total_start = Instant::now();

        let raw = match source {
            ImageSource::File(path) => self.load_from_file(path, config)?,
            ImageSource::Embedded { id, bytes } => self.load_embedded(id, bytes, config)?,
        };
        let load_elapsed = total_start.elapsed();

        let decode_start = Instant::now();
        let image = self.decode_raw(raw, config, mirror)?;
        let decode_elapsed = decode_start.elapsed();

        log::debug!(
            "⏱️ 解码完成 - {} load={}ms decode={}ms total={}ms",
            source.id(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(image)
    }
}
