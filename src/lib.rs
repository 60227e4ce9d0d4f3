//! # nine-patch 聊天气泡 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │           展示层（列表 / 视图，不在本库范围内）           │
//! │                 ↑ Frame / AnimationSession                │
//! └─────────────────┼────────────────────────────────────────┘
//!                   │
//! ┌─────────────────┼────────────────────────────────────────┐
//! │  factory ── BubbleFactory（编排，缓存注入）               │
//! │    │                                                     │
//! │    ├─ cache ───── DecodeCache（(来源, 镜像) → 像素，LRU）  │
//! │    ├─ decode ──── 文件 / 内嵌资源 → RGBA（密度缩放 + 镜像）│
//! │    ├─ patch ───── 拉伸线段 / padding 缩放 + chunk 编解码   │
//! │    └─ animation ─ 有限循环帧序列 + 播放驱动               │
//! │                                                          │
//! │  style ── BubbleStyle（不可变样式）  config ── 工厂配置    │
//! │  error ── BubbleError（统一错误类型）                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `BubbleError` |
//! | [`patch`] | 设计坐标 → 像素坐标缩放、水平镜像、chunk 二进制编解码 |
//! | [`decode`] | 像素获取：加载校验、解码、密度缩放、镜像 |
//! | [`cache`] | 有界 LRU 解码缓存，读并发、写串行 |
//! | [`animation`] | 帧模型、有限循环状态机、tokio 播放驱动 |
//! | [`style`] | 气泡样式（构造即校验） |
//! | [`config`] | 工厂配置（缓存预算 + 解码参数，JSON） |
//! | [`factory`] | 静态 / 帧动画气泡的完整构建链路 |

pub mod animation;
pub mod cache;
pub mod config;
pub mod decode;
pub mod error;
pub mod factory;
pub mod patch;
pub mod style;

pub use animation::{AnimationSession, Frame, PlaybackEvent, PlaybackState};
pub use cache::{CacheKey, DecodeCache};
pub use config::FactoryConfig;
pub use decode::{DecodedImage, ImageSource};
pub use error::BubbleError;
pub use factory::BubbleFactory;
pub use style::{BubbleStyle, StyleSpec};
