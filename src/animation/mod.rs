//! # 帧动画模块（animation）
//!
//! ## 设计思路
//!
//! - `session`：帧模型与有限循环状态机，纯同步，不依赖计时器
//! - `player`：基于 tokio 计时的播放驱动，支持随时取消
//!
//! 状态机与计时解耦：测试可以逐 tick 驱动会话，也可以交给 `play` 按帧时长自动推进。

mod player;
mod session;

pub use player::play;
pub use session::{
    AnimationSession, DEFAULT_FRAME_DURATION_MS, Frame, PlaybackEvent, PlaybackState,
};
