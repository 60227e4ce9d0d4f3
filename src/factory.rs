//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `BubbleFactory` 只负责流程编排，不持有全局状态。处理链路固定为：
//! 1. 按 `(来源, 镜像)` 查询解码缓存，未命中则解码并回填
//! 2. 按样式与实际解码尺寸缩放拉伸线段与 padding
//! 3. 编码 chunk，组装帧
//! 4. 多帧时装配为有限循环的帧动画会话
//!
//! ## 实现思路
//!
//! - 缓存由调用方创建后注入（`Arc<DecodeCache>`），生命周期跟随应用而非进程全局。
//! - 单帧解码失败只丢弃该帧，其余帧继续装配；全部失败时报 `EmptySequence`。
//! - 异步版本把每一帧的解码放到 `spawn_blocking`，再按输入顺序收集，保证帧序不变。
//! - 记录装配耗时，便于性能诊断。

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::BubbleError;
use crate::animation::{AnimationSession, Frame};
use crate::cache::{CacheKey, DecodeCache};
use crate::config::FactoryConfig;
use crate::decode::{DecodedImage, Decoder, ImageSource};
use crate::patch::scale_patch;
use crate::style::BubbleStyle;

/// 气泡工厂，可廉价克隆并在线程间共享。
#[derive(Clone)]
pub struct BubbleFactory {
    cache: Arc<DecodeCache>,
    decoder: Arc<Decoder>,
}

impl BubbleFactory {
    /// 使用外部注入的缓存创建工厂。
    ///
    /// # 示例
    /// ```rust
    /// use std::sync::Arc;
    /// use ninepatch_bubble::{BubbleFactory, DecodeCache, FactoryConfig};
    ///
    /// let config = FactoryConfig::default();
    /// let cache = Arc::new(DecodeCache::new(config.cache_budget_bytes));
    /// let factory = BubbleFactory::new(&config, Arc::clone(&cache))?;
    /// assert!(factory.cache().is_empty());
    /// # Ok::<(), ninepatch_bubble::BubbleError>(())
    /// ```
    pub fn new(config: &FactoryConfig, cache: Arc<DecodeCache>) -> Result<Self, BubbleError> {
        let decoder = Decoder::new(config.decode.clone())?;
        Ok(Self {
            cache,
            decoder: Arc::new(decoder),
        })
    }

    /// 按配置预算创建独占缓存的工厂。
    pub fn from_config(config: &FactoryConfig) -> Result<Self, BubbleError> {
        Self::new(config, Arc::new(DecodeCache::new(config.cache_budget_bytes)))
    }

    pub fn cache(&self) -> &Arc<DecodeCache> {
        &self.cache
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// 缓存优先地获取解码结果；失败时不写缓存。
    pub fn load_image(
        &self,
        source: &ImageSource,
        mirror: bool,
    ) -> Result<Arc<DecodedImage>, BubbleError> {
        let key = CacheKey::for_source(source, mirror);
        if let Some(image) = self.cache.get(&key) {
            return Ok(image);
        }

        let image = Arc::new(self.decoder.decode(source, mirror)?);
        self.cache.put(key, Arc::clone(&image));
        Ok(image)
    }

    /// 针对已解码的像素构建一帧：几何按实际尺寸重新计算，不跨尺寸复用 chunk。
    pub fn prepare_frame(
        style: &BubbleStyle,
        image: Arc<DecodedImage>,
    ) -> Result<Frame, BubbleError> {
        let geometry = style.geometry_for(image.width(), image.height())?;
        let patch = scale_patch(
            &geometry,
            style.horizontal(),
            style.vertical(),
            style.padding(),
            style.mirror(),
        )?;

        log::debug!(
            "🧱 构建帧 - {}x{} padding={:?} div_x={:?} div_y={:?}",
            image.width(),
            image.height(),
            patch.padding,
            patch.chunk.div_x,
            patch.chunk.div_y
        );

        Frame::new(image, patch, style.frame_duration_ms())
    }

    /// 外部已解码的 RGBA 缓冲区直接构建一帧，不经过缓存。
    pub fn frame_from_pixels(
        style: &BubbleStyle,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Frame, BubbleError> {
        let image = DecodedImage::from_rgba(width, height, pixels)?;
        Self::prepare_frame(style, Arc::new(image))
    }

    /// 单张静态气泡。
    pub fn build_static(
        &self,
        style: &BubbleStyle,
        source: &ImageSource,
    ) -> Result<Frame, BubbleError> {
        let start = Instant::now();
        let image = self.load_image(source, style.mirror())?;
        let frame = Self::prepare_frame(style, image)?;

        log::info!(
            "✅ 静态气泡构建完成 - {} mirror={} 耗时={}ms",
            source.id(),
            style.mirror(),
            start.elapsed().as_millis()
        );
        Ok(frame)
    }

    /// 多帧气泡：解码失败的帧被跳过，其余按输入顺序装配。
    pub fn build_animation(
        &self,
        style: &BubbleStyle,
        sources: &[ImageSource],
    ) -> Result<AnimationSession, BubbleError> {
        let start = Instant::now();
        let loaded = sources
            .iter()
            .map(|source| (source.id().to_string(), self.load_image(source, style.mirror())));

        let session = Self::assemble(style, loaded)?;
        log::info!(
            "✅ 帧动画构建完成 - frames={}/{} finish_count={} 耗时={}ms",
            session.frame_count(),
            sources.len(),
            session.finish_count(),
            start.elapsed().as_millis()
        );
        Ok(session)
    }

    /// 从帧目录构建：目录中的文件按文件名排序作为帧序。
    pub fn build_animation_from_dir(
        &self,
        style: &BubbleStyle,
        dir: &Path,
    ) -> Result<AnimationSession, BubbleError> {
        let sources = list_frame_files(dir)?;
        self.build_animation(style, &sources)
    }

    /// `build_static` 的异步版本，解码在阻塞线程池执行。
    pub async fn build_static_async(
        &self,
        style: &BubbleStyle,
        source: ImageSource,
    ) -> Result<Frame, BubbleError> {
        let factory = self.clone();
        let mirror = style.mirror();
        let image = tokio::task::spawn_blocking(move || factory.load_image(&source, mirror))
            .await
            .map_err(|e| BubbleError::DecodeFailure(format!("解码任务异常终止：{}", e)))??;
        Self::prepare_frame(style, image)
    }

    /// `build_animation` 的异步版本：各帧并行解码，按输入顺序收集。
    pub async fn build_animation_async(
        &self,
        style: &BubbleStyle,
        sources: Vec<ImageSource>,
    ) -> Result<AnimationSession, BubbleError> {
        let start = Instant::now();
        let mirror = style.mirror();
        let total = sources.len();

        let tasks: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let factory = self.clone();
                let label = source.id().to_string();
                let handle =
                    tokio::task::spawn_blocking(move || factory.load_image(&source, mirror));
                (label, handle)
            })
            .collect();

        let mut loaded = Vec::with_capacity(tasks.len());
        for (label, handle) in tasks {
            let result = handle
                .await
                .map_err(|e| BubbleError::DecodeFailure(format!("解码任务异常终止：{}", e)))
                .and_then(|result| result);
            loaded.push((label, result));
        }

        let session = Self::assemble(style, loaded)?;
        log::info!(
            "✅ 帧动画异步构建完成 - frames={}/{} 耗时={}ms",
            session.frame_count(),
            total,
            start.elapsed().as_millis()
        );
        Ok(session)
    }

    fn assemble<I>(style: &BubbleStyle, loaded: I) -> Result<AnimationSession, BubbleError>
    where
        I: IntoIterator<Item = (String, Result<Arc<DecodedImage>, BubbleError>)>,
    {
        let mut frames = Vec::new();
        for (label, result) in loaded {
            match result {
                Ok(image) => frames.push(Self::prepare_frame(style, image)?),
                Err(err) if err.is_decode_failure() => {
                    log::warn!("⚠️ 跳过解码失败的帧 - {}：{}", label, err);
                }
                Err(err) => return Err(err),
            }
        }

        if frames.is_empty() {
            return Err(BubbleError::EmptySequence(
                "所有帧均解码失败，没有可播放的帧".to_string(),
            ));
        }

        AnimationSession::new(frames, style.finish_count())
    }
}

/// 列出帧目录下的文件，按文件名排序。
///
/// 目录不存在、无法读取或为空都属于解码失败。
pub fn list_frame_files(dir: &Path) -> Result<Vec<ImageSource>, BubbleError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        BubbleError::DecodeFailure(format!("无法读取帧目录 {}：{}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| BubbleError::DecodeFailure(format!("无法读取目录项：{}", e)))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(BubbleError::DecodeFailure(format!(
            "帧目录为空：{}",
            dir.display()
        )));
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    log::debug!("📂 帧目录 {} 共 {} 个文件", dir.display(), files.len());

    Ok(files.into_iter().map(ImageSource::File).collect())
}
