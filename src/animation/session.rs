//! # 有限循环帧序列
//!
//! ## 状态机
//!
//! ```text
//! Idle ──start──▶ Playing ──tick（未绕回）──▶ Playing
//!                    │
//!                    ├──tick（绕回，loops < finish_count）──▶ Playing（回到第 0 帧）
//!                    ├──tick（绕回，loops == finish_count）──▶ Stopped（停在最后一帧）
//!                    └──stop──▶ Stopped
//! ```
//!
//! 平台帧动画默认无限循环，这里自行统计播放遍数，播放 `finish_count` 遍后停在最后一帧，
//! 不再产生任何换帧事件。`tick` 不可重入，停止后到达的 `tick` 一律忽略。

use std::sync::Arc;

use crate::BubbleError;
use crate::decode::DecodedImage;
use crate::patch::{Chunk, PaddingBox, ScaledPatch};

/// 默认每帧时长（毫秒）。
pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;

/// 一帧可直接渲染的 nine-patch：像素、chunk 及其编码、像素坐标 padding、时长。
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Arc<DecodedImage>,
    pub chunk: Chunk,
    pub chunk_bytes: Vec<u8>,
    pub padding: PaddingBox,
    pub duration_ms: u32,
}

impl Frame {
    /// 由解码结果与缩放结果组装一帧，chunk 在这里编码。
    pub fn new(
        image: Arc<DecodedImage>,
        patch: ScaledPatch,
        duration_ms: u32,
    ) -> Result<Self, BubbleError> {
        if duration_ms == 0 {
            return Err(BubbleError::InvalidFrameDuration(duration_ms));
        }
        let chunk_bytes = patch.chunk.encode()?;
        Ok(Self {
            image,
            chunk: patch.chunk,
            chunk_bytes,
            padding: patch.padding,
            duration_ms,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Stopped,
}

/// 每次状态迁移产生的事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// 开始播放，显示第 0 帧。
    Started { index: usize },
    /// 前进到下一帧。
    Advanced { index: usize },
    /// 播放完一遍并回到第 0 帧，`loops` 为已完成遍数。
    LoopCompleted { loops: u32, index: usize },
    /// 播放完 `finish_count` 遍，停在最后一帧。
    Finished { loops: u32, index: usize },
    /// 会话不在播放状态，本次请求被忽略。
    Ignored,
}

/// 一次渲染请求对应的帧动画会话。
#[derive(Debug)]
pub struct AnimationSession {
    frames: Vec<Frame>,
    finish_count: u32,
    is_one_shot: bool,
    state: PlaybackState,
    index: usize,
    loops: u32,
    advances: u64,
}

impl AnimationSession {
    /// 构造会话：帧列表不能为空，循环次数必须 >= 1。
    pub fn new(frames: Vec<Frame>, finish_count: u32) -> Result<Self, BubbleError> {
        if frames.is_empty() {
            return Err(BubbleError::EmptySequence("没有可播放的帧".to_string()));
        }
        if finish_count == 0 {
            return Err(BubbleError::InvalidRepeatCount(finish_count));
        }
        if let Some(frame) = frames.iter().find(|frame| frame.duration_ms == 0) {
            return Err(BubbleError::InvalidFrameDuration(frame.duration_ms));
        }

        Ok(Self {
            frames,
            finish_count,
            // 帧总是循环，只是循环次数有界
            is_one_shot: false,
            state: PlaybackState::Idle,
            index: 0,
            loops: 0,
            advances: 0,
        })
    }

    /// 开始播放。已停止的会话从第 0 帧重新开始，播放中的会话忽略本次调用。
    pub fn start(&mut self) -> PlaybackEvent {
        if self.state == PlaybackState::Playing {
            return PlaybackEvent::Ignored;
        }
        self.state = PlaybackState::Playing;
        self.index = 0;
        self.loops = 0;
        self.advances = 0;
        PlaybackEvent::Started { index: 0 }
    }

    /// 当前帧时长到期，前进一帧。
    pub fn tick(&mut self) -> PlaybackEvent {
        if self.state != PlaybackState::Playing {
            return PlaybackEvent::Ignored;
        }
        self.advances += 1;

        if self.index + 1 < self.frames.len() {
            self.index += 1;
            return PlaybackEvent::Advanced { index: self.index };
        }

        self.loops += 1;
        if self.loops >= self.finish_count {
            self.state = PlaybackState::Stopped;
            log::debug!(
                "🏁 帧动画播放结束 - loops={} advances={} 停在第 {} 帧",
                self.loops,
                self.advances,
                self.index
            );
            return PlaybackEvent::Finished {
                loops: self.loops,
                index: self.index,
            };
        }

        self.index = 0;
        PlaybackEvent::LoopCompleted {
            loops: self.loops,
            index: 0,
        }
    }

    /// 外部停止 / 取消：立即生效，停在当前帧；重复调用无副作用。
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            log::debug!("⏹️ 帧动画被停止 - 当前第 {} 帧", self.index);
            self.state = PlaybackState::Stopped;
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.index]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn finish_count(&self) -> u32 {
        self.finish_count
    }

    pub fn is_one_shot(&self) -> bool {
        self.is_one_shot
    }

    pub fn loops_completed(&self) -> u32 {
        self.loops
    }

    /// 本轮播放累计的换帧次数。
    pub fn advances(&self) -> u64 {
        self.advances
    }

    /// 播放一遍的总时长（毫秒）。
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|frame| frame.duration_ms as u64).sum()
    }
}
