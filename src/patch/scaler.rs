//! # 区域缩放模块
//!
//! ## 设计思路
//!
//! 把设计坐标系下的拉伸线段与 padding 映射到实际解码尺寸上，可选水平镜像。
//! 纯函数，无 I/O、无缓存。
//!
//! ## 公式
//!
//! `scale(c) = floor(c * F / O)`，截断而非四舍五入，保证不同实现之间接缝位置逐像素一致。
//!
//! 镜像（仅水平方向）：先反射 `O - c` 再缩放，端点互换保持升序；
//! padding 的左右同样互换，上下不受影响。

use crate::BubbleError;

use super::{Chunk, ImageGeometry, PaddingBox, StretchRegion};

/// 缩放结果：可编码的 chunk 与像素坐标系下的内边距。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledPatch {
    pub chunk: Chunk,
    pub padding: PaddingBox,
}

/// 单轴坐标缩放。`origin == 0` 属于配置错误。
pub fn scale_coord(coord: u32, origin: u32, final_extent: u32) -> Result<u32, BubbleError> {
    if origin == 0 {
        return Err(BubbleError::InvalidGeometry("原始尺寸为 0，无法缩放".to_string()));
    }
    Ok(scale_unchecked(coord, origin, final_extent))
}

/// 单轴线段缩放，`mirror` 时先在设计坐标系内翻转。
pub fn scale_region(
    region: StretchRegion,
    origin: u32,
    final_extent: u32,
    mirror: bool,
) -> Result<StretchRegion, BubbleError> {
    if origin == 0 {
        return Err(BubbleError::InvalidGeometry("原始尺寸为 0，无法缩放".to_string()));
    }
    region.validate(origin)?;

    let source = if mirror { region.mirrored(origin)? } else { region };
    Ok(StretchRegion {
        start: scale_unchecked(source.start, origin, final_extent),
        end: scale_unchecked(source.end, origin, final_extent),
    })
}

/// 设计坐标系内容矩形 → 像素坐标系四边内边距。
pub fn scale_padding(
    padding: PaddingBox,
    geometry: &ImageGeometry,
    mirror: bool,
) -> Result<PaddingBox, BubbleError> {
    let ImageGeometry {
        origin_width: ow,
        origin_height: oh,
        final_width: fw,
        final_height: fh,
    } = *geometry;
    if ow == 0 || oh == 0 {
        return Err(BubbleError::InvalidGeometry("原始尺寸为 0，无法缩放".to_string()));
    }
    padding.validate_content_rect(ow, oh)?;

    let (left, right) = if mirror {
        (
            scale_unchecked(ow - padding.right, ow, fw),
            scale_unchecked(padding.left, ow, fw),
        )
    } else {
        (
            scale_unchecked(padding.left, ow, fw),
            scale_unchecked(ow - padding.right, ow, fw),
        )
    };

    Ok(PaddingBox {
        left,
        top: scale_unchecked(padding.top, oh, fh),
        right,
        bottom: scale_unchecked(oh - padding.bottom, oh, fh),
    })
}

/// 完整缩放：一段横向线段、一段竖向线段、可选 padding。
///
/// 未提供 padding 时内边距全为 0。
pub fn scale_patch(
    geometry: &ImageGeometry,
    horizontal: StretchRegion,
    vertical: StretchRegion,
    padding: Option<PaddingBox>,
    mirror: bool,
) -> Result<ScaledPatch, BubbleError> {
    let x = scale_region(horizontal, geometry.origin_width, geometry.final_width, mirror)?;
    let y = scale_region(vertical, geometry.origin_height, geometry.final_height, false)?;

    let padding = match padding {
        Some(design) => scale_padding(design, geometry, mirror)?,
        None => PaddingBox::default(),
    };

    log::debug!(
        "📐 缩放 patch：{}x{} -> {}x{} mirror={} div_x=({}, {}) div_y=({}, {}) padding={:?}",
        geometry.origin_width,
        geometry.origin_height,
        geometry.final_width,
        geometry.final_height,
        mirror,
        x.start,
        x.end,
        y.start,
        y.end,
        padding
    );

    let chunk = Chunk::new(vec![x.start, x.end], vec![y.start, y.end], padding)?;
    Ok(ScaledPatch { chunk, padding })
}

fn scale_unchecked(coord: u32, origin: u32, final_extent: u32) -> u32 {
    // u64 中间值，c * F 不会溢出；c <= O 时结果 <= F
    ((coord as u64 * final_extent as u64) / origin as u64) as u32
}
