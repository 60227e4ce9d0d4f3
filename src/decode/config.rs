//! # 解码配置模块
//!
//! ## 设计思路
//!
//! 将解码阶段所有“可调策略”集中到 `DecodeConfig`：体积 / 像素 / 内存上限，
//! 以及文件来源的密度换算参数。配置构造后不可变，按值传入 `Decoder`。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置。
//! - `ResizeFilter` 负责滤镜字符串解析与反向输出，并映射到 `image` 的滤镜类型。
//! - `validate` 在构造 `Decoder` 时一次性校验，而不是拖到解码时。

use std::str::FromStr;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::BubbleError;

/// Android 基准密度（mdpi）。
pub const DENSITY_DEFAULT: u32 = 160;

/// 解码配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 素材绘制时的倍率，1 倍图为 1，3 倍图为 3。
    pub source_density: u32,
    /// 当前显示设备的 dpi。
    pub target_density: u32,
    /// 密度缩放滤镜。
    pub resize_filter: ResizeFilter,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024,
            max_decoded_pixels: 16_000_000,
            max_decoded_bytes: 64 * 1024 * 1024,
            source_density: 1,
            target_density: DENSITY_DEFAULT,
            resize_filter: ResizeFilter::Triangle,
        }
    }
}

impl DecodeConfig {
    pub fn validate(&self) -> Result<(), BubbleError> {
        if self.source_density == 0 || self.target_density == 0 {
            return Err(BubbleError::InvalidGeometry(format!(
                "密度不能为 0：source_density={} target_density={}",
                self.source_density, self.target_density
            )));
        }
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 || self.max_file_size == 0 {
            return Err(BubbleError::ResourceLimit("解码上限不能为 0".to_string()));
        }
        Ok(())
    }

    /// 文件来源按密度换算后的尺寸，四舍五入，最小为 1。
    ///
    /// # 示例
    /// ```rust
    /// use ninepatch_bubble::decode::DecodeConfig;
    ///
    /// let config = DecodeConfig { source_density: 1, target_density: 480, ..Default::default() };
    /// assert_eq!(config.density_scaled_size(128, 112), (384, 336));
    /// ```
    pub fn density_scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        let source = self.source_density as u64 * DENSITY_DEFAULT as u64;
        let target = self.target_density as u64;
        let scale = |v: u32| -> u32 {
            let scaled = (v as u64 * target * 2 + source) / (source * 2);
            scaled.clamp(1, u32::MAX as u64) as u32
        };
        (scale(width), scale(height))
    }

    /// 是否需要密度缩放。
    pub fn needs_density_scaling(&self) -> bool {
        self.source_density as u64 * DENSITY_DEFAULT as u64 != self.target_density as u64
    }
}

/// 密度缩放滤镜（面向配置文件的稳定字符串）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl FromStr for ResizeFilter {
    type Err = BubbleError;

    /// 从命令行等外部字符串解析滤镜，未知名称属于配置错误。
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" => Ok(Self::Triangle),
            "catmull_rom" | "catmullrom" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" => Ok(Self::Lanczos3),
            other => Err(BubbleError::InvalidConfig(format!(
                "未知缩放滤镜：{}（可选：nearest / triangle / catmull_rom / gaussian / lanczos3）",
                other
            ))),
        }
    }
}

impl ResizeFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Triangle => "triangle",
            Self::CatmullRom => "catmull_rom",
            Self::Gaussian => "gaussian",
            Self::Lanczos3 => "lanczos3",
        }
    }

    pub(crate) fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_density_is_identity() {
        let config = DecodeConfig::default();
        assert!(!config.needs_density_scaling());
        assert_eq!(config.density_scaled_size(128, 112), (128, 112));
    }

    #[test]
    fn xxhdpi_file_from_3x_asset_is_unscaled() {
        let config = DecodeConfig {
            source_density: 3,
            target_density: 480,
            ..Default::default()
        };
        assert!(!config.needs_density_scaling());
    }

    #[test]
    fn density_rounds_to_nearest() {
        let config = DecodeConfig {
            source_density: 3,
            target_density: 160,
            ..Default::default()
        };
        // 128 / 3 = 42.67 -> 43, 112 / 3 = 37.33 -> 37
        assert_eq!(config.density_scaled_size(128, 112), (43, 37));
        assert_eq!(config.density_scaled_size(1, 1), (1, 1));
    }

    #[test]
    fn zero_density_is_rejected() {
        let config = DecodeConfig {
            target_density: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BubbleError::InvalidGeometry(_))));
    }

    #[test]
    fn filter_names_round_trip() {
        for filter in [
            ResizeFilter::Nearest,
            ResizeFilter::Triangle,
            ResizeFilter::CatmullRom,
            ResizeFilter::Gaussian,
            ResizeFilter::Lanczos3,
        ] {
            assert_eq!(filter.as_str().parse::<ResizeFilter>().expect("parse"), filter);
        }
        let padded = " CatmullRom ".parse::<ResizeFilter>().expect("parse");
        assert_eq!(padded, ResizeFilter::CatmullRom);
        assert!(matches!(
            "bicubic".parse::<ResizeFilter>(),
            Err(BubbleError::InvalidConfig(_))
        ));
    }
}
