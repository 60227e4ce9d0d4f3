//! # 几何值类型
//!
//! ## 设计思路
//!
//! - `StretchRegion`：设计坐标系下单轴的拉伸线段（起点、终点均包含）。
//! - `PaddingBox`：内容安全区。设计坐标系下沿用 Android `Rect` 语义
//!   （`right`/`bottom` 是内容区右、下边缘的坐标）；缩放后的像素坐标系下四个值都是内边距。
//! - `ImageGeometry`：设计尺寸与实际解码尺寸，二者在密度不同的情况下并不相等。
//!
//! 三者创建后不可变，可以在多次渲染之间复用。

use serde::{Deserialize, Serialize};

use crate::BubbleError;

/// 单轴拉伸线段，设计坐标系。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StretchRegion {
    pub start: u32,
    pub end: u32,
}

impl StretchRegion {
    /// 创建拉伸线段，要求 `start <= end`。
    pub fn new(start: u32, end: u32) -> Result<Self, BubbleError> {
        if start > end {
            return Err(BubbleError::InvalidGeometry(format!(
                "拉伸线段起点大于终点：({}, {})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// 校验线段落在 `[0, origin_extent]` 内。
    pub fn validate(&self, origin_extent: u32) -> Result<(), BubbleError> {
        if self.start > self.end || self.end > origin_extent {
            return Err(BubbleError::InvalidGeometry(format!(
                "拉伸线段 ({}, {}) 超出原始尺寸 {}",
                self.start, self.end, origin_extent
            )));
        }
        Ok(())
    }

    /// 在设计坐标系内做水平翻转，端点互换以保持升序。
    ///
    /// 线段超出 `[0, origin_extent]` 时返回 `InvalidGeometry`。
    pub fn mirrored(&self, origin_extent: u32) -> Result<Self, BubbleError> {
        self.validate(origin_extent)?;
        Ok(Self {
            start: origin_extent - self.end,
            end: origin_extent - self.start,
        })
    }
}

/// 内容安全区。
///
/// 设计坐标系下为 `(left, top, right, bottom)` 矩形，缩放后为四边内边距。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaddingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PaddingBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// 校验设计坐标系下的内容矩形：`left <= right <= width`，`top <= bottom <= height`。
    pub fn validate_content_rect(
        &self,
        origin_width: u32,
        origin_height: u32,
    ) -> Result<(), BubbleError> {
        if self.left > self.right || self.right > origin_width {
            return Err(BubbleError::InvalidGeometry(format!(
                "padding 水平范围 [{}, {}] 超出原始宽度 {}",
                self.left, self.right, origin_width
            )));
        }
        if self.top > self.bottom || self.bottom > origin_height {
            return Err(BubbleError::InvalidGeometry(format!(
                "padding 竖直范围 [{}, {}] 超出原始高度 {}",
                self.top, self.bottom, origin_height
            )));
        }
        Ok(())
    }
}

/// 设计尺寸与最终解码尺寸。
///
/// 每次有新尺寸（或新镜像状态）的位图进入流水线都要重新构建。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    pub origin_width: u32,
    pub origin_height: u32,
    pub final_width: u32,
    pub final_height: u32,
}

impl ImageGeometry {
    /// 创建几何描述，原始尺寸为 0 时直接拒绝（缩放公式无定义）。
    pub fn new(
        origin_width: u32,
        origin_height: u32,
        final_width: u32,
        final_height: u32,
    ) -> Result<Self, BubbleError> {
        if origin_width == 0 || origin_height == 0 {
            return Err(BubbleError::InvalidGeometry(format!(
                "原始尺寸不能为 0：{}x{}",
                origin_width, origin_height
            )));
        }
        Ok(Self {
            origin_width,
            origin_height,
            final_width,
            final_height,
        })
    }

    /// 设计尺寸与最终尺寸一致。
    pub fn is_identity(&self) -> bool {
        self.origin_width == self.final_width && self.origin_height == self.final_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_rejects_inverted_endpoints() {
        assert!(matches!(
            StretchRegion::new(61, 60),
            Err(BubbleError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn region_outside_origin_is_invalid() {
        let region = StretchRegion::new(60, 129).expect("valid endpoints");
        assert!(region.validate(128).is_err());
        assert!(region.validate(129).is_ok());
    }

    #[test]
    fn mirror_reflects_and_swaps() {
        let region = StretchRegion::new(60, 61).expect("valid endpoints");
        let mirrored = region.mirrored(128).expect("mirror");
        assert_eq!(mirrored, StretchRegion { start: 67, end: 68 });
        assert_eq!(mirrored.mirrored(128).expect("mirror"), region);
    }

    #[test]
    fn mirror_rejects_region_beyond_origin() {
        let region = StretchRegion::new(60, 200).expect("valid endpoints");
        assert!(matches!(
            region.mirrored(128),
            Err(BubbleError::InvalidGeometry(_))
        ));
        assert!(region.mirrored(200).is_ok());
    }

    #[test]
    fn zero_origin_geometry_is_rejected() {
        assert!(matches!(
            ImageGeometry::new(0, 112, 64, 56),
            Err(BubbleError::InvalidGeometry(_))
        ));
        assert!(ImageGeometry::new(128, 112, 64, 56).is_ok());
    }

    #[test]
    fn content_rect_bounds() {
        let padding = PaddingBox::new(31, 37, 90, 75);
        assert!(padding.validate_content_rect(128, 112).is_ok());
        assert!(padding.validate_content_rect(80, 112).is_err());
        assert!(PaddingBox::new(40, 0, 30, 0).validate_content_rect(128, 112).is_err());
    }
}
