//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / 内嵌资源）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 读取 + 签名。
//! - 内嵌资源：体积限制 + 签名。
//! - 所有失败统一映射到 `BubbleError::DecodeFailure` / `ResourceLimit`。

use std::path::Path;

use crate::BubbleError;

use super::source::RawImageData;
use super::{DecodeConfig, Decoder};

impl Decoder {
    /// 从本地路径加载图片原始字节。
    pub(super) fn load_from_file(
        &self,
        path: &Path,
        config: &DecodeConfig,
    ) -> Result<RawImageData, BubbleError> {
        log::debug!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.is_file() {
            return Err(BubbleError::DecodeFailure(format!(
                "文件不存在：{}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| BubbleError::DecodeFailure(format!("无法读取文件信息：{}", e)))?;

        Self::validate_file_size(metadata.len(), config)?;

        let bytes = std::fs::read(path)
            .map_err(|e| BubbleError::DecodeFailure(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
            density_scaled: true,
        })
    }

    /// 从内嵌资源加载图片原始字节。
    pub(super) fn load_embedded(
        &self,
        id: &str,
        bytes: &[u8],
        config: &DecodeConfig,
    ) -> Result<RawImageData, BubbleError> {
        log::debug!("📦 开始读取内嵌资源 - id: {}", id);

        Self::validate_file_size(bytes.len() as u64, config)?;
        Self::validate_image_signature(bytes)?;

        Ok(RawImageData {
            bytes: bytes.to_vec(),
            source_hint: "resource",
            density_scaled: false,
        })
    }

    fn validate_file_size(len: u64, config: &DecodeConfig) -> Result<(), BubbleError> {
        if len > config.max_file_size {
            return Err(BubbleError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Ok(())
    }

    /// 文件签名校验：内容为空或不是图片类型时直接拒绝。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), BubbleError> {
        if bytes.is_empty() {
            return Err(BubbleError::DecodeFailure("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| BubbleError::DecodeFailure("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(BubbleError::DecodeFailure(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}
