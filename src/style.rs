//! # 气泡样式
//!
//! ## 设计思路
//!
//! 一种气泡样式（设计尺寸、拉伸线段、padding、镜像、循环次数、帧时长）在创建时一次性校验，
//! 之后不可变，按值在多次渲染之间复用。
//!
//! 外部以 `StyleSpec`（纯数据，可从 JSON 反序列化）描述，经 `BubbleStyle::new` 校验后使用。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::BubbleError;
use crate::animation::DEFAULT_FRAME_DURATION_MS;
use crate::patch::{ImageGeometry, PaddingBox, StretchRegion};

/// 样式的原始描述，字段与 JSON 一一对应。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    pub origin_width: u32,
    pub origin_height: u32,
    pub horizontal: StretchRegion,
    pub vertical: StretchRegion,
    /// 设计坐标系下的内容矩形，缺省时内边距全为 0。
    #[serde(default)]
    pub padding: Option<PaddingBox>,
    #[serde(default)]
    pub mirror: bool,
    #[serde(default = "default_finish_count")]
    pub finish_count: u32,
    /// 缺省为 100ms。
    #[serde(default)]
    pub frame_duration_ms: Option<u32>,
}

fn default_finish_count() -> u32 {
    1
}

/// 校验过的气泡样式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StyleSpec", into = "StyleSpec")]
pub struct BubbleStyle {
    origin_width: u32,
    origin_height: u32,
    horizontal: StretchRegion,
    vertical: StretchRegion,
    padding: Option<PaddingBox>,
    mirror: bool,
    finish_count: u32,
    frame_duration_ms: u32,
}

impl BubbleStyle {
    /// 校验并构建样式。
    ///
    /// # 示例
    /// ```rust
    /// use ninepatch_bubble::patch::{PaddingBox, StretchRegion};
    /// use ninepatch_bubble::{BubbleStyle, StyleSpec};
    ///
    /// let style = BubbleStyle::new(StyleSpec {
    ///     origin_width: 128,
    ///     origin_height: 112,
    ///     horizontal: StretchRegion::new(60, 61)?,
    ///     vertical: StretchRegion::new(52, 53)?,
    ///     padding: Some(PaddingBox::new(31, 37, 90, 75)),
    ///     mirror: false,
    ///     finish_count: 3,
    ///     frame_duration_ms: None,
    /// })?;
    /// assert_eq!(style.frame_duration_ms(), 100);
    /// # Ok::<(), ninepatch_bubble::BubbleError>(())
    /// ```
    pub fn new(spec: StyleSpec) -> Result<Self, BubbleError> {
        let StyleSpec {
            origin_width,
            origin_height,
            horizontal,
            vertical,
            padding,
            mirror,
            finish_count,
            frame_duration_ms,
        } = spec;

        if origin_width == 0 || origin_height == 0 {
            return Err(BubbleError::InvalidGeometry(format!(
                "原始尺寸不能为 0：{}x{}",
                origin_width, origin_height
            )));
        }
        horizontal.validate(origin_width)?;
        vertical.validate(origin_height)?;
        if let Some(padding) = padding {
            padding.validate_content_rect(origin_width, origin_height)?;
        }
        if finish_count == 0 {
            return Err(BubbleError::InvalidRepeatCount(finish_count));
        }
        let frame_duration_ms = frame_duration_ms.unwrap_or(DEFAULT_FRAME_DURATION_MS);
        if frame_duration_ms == 0 {
            return Err(BubbleError::InvalidFrameDuration(frame_duration_ms));
        }

        Ok(Self {
            origin_width,
            origin_height,
            horizontal,
            vertical,
            padding,
            mirror,
            finish_count,
            frame_duration_ms,
        })
    }

    /// 从 JSON 字符串解析并校验。
    pub fn from_json_str(content: &str) -> Result<Self, BubbleError> {
        let spec: StyleSpec = serde_json::from_str(content)
            .map_err(|e| BubbleError::InvalidConfig(format!("解析样式失败：{}", e)))?;
        Self::new(spec)
    }

    /// 从 JSON 文件读取样式。
    pub fn load_from_path(path: &Path) -> Result<Self, BubbleError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 同一样式的左右气泡只差镜像标记，复制一份并切换镜像。
    pub fn with_mirror(&self, mirror: bool) -> Self {
        Self {
            mirror,
            ..self.clone()
        }
    }

    /// 针对某个解码尺寸构建几何描述。
    pub fn geometry_for(
        &self,
        final_width: u32,
        final_height: u32,
    ) -> Result<ImageGeometry, BubbleError> {
        ImageGeometry::new(self.origin_width, self.origin_height, final_width, final_height)
    }

    pub fn origin_size(&self) -> (u32, u32) {
        (self.origin_width, self.origin_height)
    }

    pub fn horizontal(&self) -> StretchRegion {
        self.horizontal
    }

    pub fn vertical(&self) -> StretchRegion {
        self.vertical
    }

    pub fn padding(&self) -> Option<PaddingBox> {
        self.padding
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn finish_count(&self) -> u32 {
        self.finish_count
    }

    pub fn frame_duration_ms(&self) -> u32 {
        self.frame_duration_ms
    }
}

impl TryFrom<StyleSpec> for BubbleStyle {
    type Error = BubbleError;

    fn try_from(spec: StyleSpec) -> Result<Self, Self::Error> {
        Self::new(spec)
    }
}

impl From<BubbleStyle> for StyleSpec {
    fn from(style: BubbleStyle) -> Self {
        Self {
            origin_width: style.origin_width,
            origin_height: style.origin_height,
            horizontal: style.horizontal,
            vertical: style.vertical,
            padding: style.padding,
            mirror: style.mirror,
            finish_count: style.finish_count,
            frame_duration_ms: Some(style.frame_duration_ms),
        }
    }
}
