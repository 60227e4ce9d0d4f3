//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义（文件 / 内嵌资源）
//! - `SourceId` 是来源的可哈希身份，作为缓存键的一部分
//! - `RawImageData` 表示已加载但未解码的字节
//! - `DecodedImage` 表示可直接交给渲染层的 RGBA 数据

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::BubbleError;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 本地文件路径来源，按配置的密度缩放。
    File(PathBuf),
    /// 内嵌资源：标识符 + 原始图片字节。平台已按显示密度提供，不再缩放。
    Embedded { id: String, bytes: Arc<[u8]> },
}

impl ImageSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn embedded(id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Embedded {
            id: id.into(),
            bytes: bytes.into(),
        }
    }

    /// 来源身份，不含字节内容。
    pub fn id(&self) -> SourceId {
        match self {
            Self::File(path) => SourceId::File(path.clone()),
            Self::Embedded { id, .. } => SourceId::Resource(id.clone()),
        }
    }
}

/// 来源身份：文件路径或资源标识符。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    File(PathBuf),
    Resource(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Resource(id) => write!(f, "res:{}", id),
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
    /// 是否需要按密度缩放。
    pub(crate) density_scaled: bool,
}

/// 解码阶段输出：RGBA 像素数据。
///
/// 进入缓存后不再修改，替换而非原地变更。
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// 接收外部已解码的 RGBA 缓冲区（`width * height * 4` 字节）。
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BubbleError> {
        if width == 0 || height == 0 {
            return Err(BubbleError::DecodeFailure(format!(
                "像素缓冲区尺寸为 0：{}x{}",
                width, height
            )));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| BubbleError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if pixels.len() != expected_len {
            return Err(BubbleError::DecodeFailure(format!(
                "像素数据长度异常：{}（期望 {}）",
                pixels.len(),
                expected_len
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// 缓存记账用的字节数。
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}
