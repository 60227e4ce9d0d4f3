//! # nine-patch 元数据模块（patch）
//!
//! ## 设计思路
//!
//! 把“设计坐标 → 像素坐标 → 二进制 chunk”拆成三个纯计算子模块：
//!
//! - `region`：值类型（拉伸线段、padding、几何尺寸）
//! - `scaler`：按实际解码尺寸缩放，可选水平镜像
//! - `chunk`：渲染层消费的二进制块编解码
//!
//! ```text
//! StretchRegion / PaddingBox（设计坐标）
//!    ↓  ImageGeometry
//! scaler.rs（截断缩放 + 镜像）
//!    ↓
//! chunk.rs（编码为字节块）
//! ```

mod chunk;
mod region;
mod scaler;

pub use chunk::{COLOR_SIZE, Chunk, NO_COLOR};
pub use region::{ImageGeometry, PaddingBox, StretchRegion};
pub use scaler::{ScaledPatch, scale_coord, scale_padding, scale_patch, scale_region};
