//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `BubbleError` 枚举，覆盖“几何校验 → chunk 编解码 → 像素解码 → 帧动画装配”
//! 整条链路的失败分支，替代分散的字符串错误。
//!
//! 所有对外操作统一返回 `Result<T, BubbleError>`，调用方可以按分支匹配决定是否换一个来源重试。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `std::io::Error` 提供 `From` 转换，配置读取无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，方便上层（展示层 / CLI）以 JSON 输出。

use serde::Serialize;

/// 库级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum BubbleError {
    /// 原始尺寸为 0，或拉伸区域 / padding 超出 `[0, origin_extent]`
    #[error("几何参数非法：{0}")]
    InvalidGeometry(String),

    /// chunk 缓冲区短于自身头部声明的长度，或计数超出单字节表示范围
    #[error("chunk 格式错误：{0}")]
    MalformedChunk(String),

    /// 上游像素获取失败（文件缺失、字节损坏、目录为空等），调用方可换来源重试
    #[error("解码失败：{0}")]
    DecodeFailure(String),

    /// 解码前的体积 / 像素 / 内存预算校验未通过
    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 没有任何可播放的帧
    #[error("帧序列为空：{0}")]
    EmptySequence(String),

    /// 循环次数必须 >= 1
    #[error("循环次数非法：{0}（必须 >= 1）")]
    InvalidRepeatCount(u32),

    /// 每帧时长必须 > 0
    #[error("帧时长非法：{0}ms（必须 > 0）")]
    InvalidFrameDuration(u32),

    /// 配置文件无法解析
    #[error("配置错误：{0}")]
    InvalidConfig(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl BubbleError {
    /// 是否属于“单帧解码阶段”的失败。
    ///
    /// 多帧装配时，这类错误只丢弃当前帧，不会中断整个序列。
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::DecodeFailure(_) | Self::ResourceLimit(_) | Self::Io(_)
        )
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for BubbleError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
