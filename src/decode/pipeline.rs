//! # 解码与变换流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低异常输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素 / 内存上限快速拒绝
//! 3. 完整解码
//! 4. 文件来源按密度缩放
//! 5. 需要时水平镜像
//! 6. 转换 RGBA，并校验字节长度一致性

use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba};
use std::io::Cursor;

use crate::BubbleError;

use super::source::{DecodedImage, RawImageData};
use super::{DecodeConfig, Decoder, ResizeFilter};

impl Decoder {
    /// 将原始字节解码为 RGBA 数据，可选水平镜像。
    pub(crate) fn decode_raw(
        &self,
        raw: RawImageData,
        config: &DecodeConfig,
        mirror: bool,
    ) -> Result<DecodedImage, BubbleError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;
        Self::validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| BubbleError::DecodeFailure(format!("图片解码失败：{}", e)))?;

        let (raw_width, raw_height) = decoded.dimensions();
        if raw_width == 0 || raw_height == 0 {
            return Err(BubbleError::DecodeFailure(format!(
                "图片尺寸为 0：{}x{}",
                raw_width, raw_height
            )));
        }

        let scaled = if raw.density_scaled {
            self.apply_density(decoded, config)?
        } else {
            decoded
        };

        let mut rgba = scaled.to_rgba8();
        if mirror {
            image::imageops::flip_horizontal_in_place(&mut rgba);
        }
        let (width, height) = rgba.dimensions();

        let image = DecodedImage::from_rgba(width, height, rgba.into_raw())?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 原始尺寸: {}x{} 输出尺寸: {}x{} mirror={}",
            raw.source_hint,
            raw_width,
            raw_height,
            width,
            height,
            mirror
        );

        Ok(image)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), BubbleError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BubbleError::DecodeFailure(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| BubbleError::DecodeFailure(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        config: &DecodeConfig,
        width: u32,
        height: u32,
    ) -> Result<(), BubbleError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| BubbleError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(BubbleError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        config: &DecodeConfig,
        width: u32,
        height: u32,
    ) -> Result<(), BubbleError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| BubbleError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(BubbleError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 按素材密度与设备密度缩放，等价于平台的 inDensity / inTargetDensity。
    fn apply_density(
        &self,
        image: DynamicImage,
        config: &DecodeConfig,
    ) -> Result<DynamicImage, BubbleError> {
        if !config.needs_density_scaling() {
            return Ok(image);
        }

        let (width, height) = image.dimensions();
        let (target_width, target_height) = config.density_scaled_size(width, height);
        Self::validate_pixel_limits(config, target_width, target_height)?;
        Self::validate_decoded_memory_limits(config, target_width, target_height)?;

        log::debug!(
            "🧩 密度缩放：{}x{} -> {}x{}（density {}x -> {}dpi, filter={}）",
            width,
            height,
            target_width,
            target_height,
            config.source_density,
            config.target_density,
            config.resize_filter.as_str()
        );

        let filter = config.resize_filter;
        match Self::resize_with_fast_image_resize(&image, target_width, target_height, filter) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}",
                    err
                );
                Ok(image.resize_exact(
                    target_width,
                    target_height,
                    config.resize_filter.filter_type(),
                ))
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: ResizeFilter,
    ) -> Result<DynamicImage, BubbleError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.into_raw(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| BubbleError::DecodeFailure(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image =
            fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new().resize_alg(Self::to_fast_alg(filter));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| BubbleError::DecodeFailure(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| BubbleError::DecodeFailure("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn to_fast_alg(filter: ResizeFilter) -> fr::ResizeAlg {
        match filter {
            ResizeFilter::Nearest => fr::ResizeAlg::Nearest,
            ResizeFilter::Triangle => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            ResizeFilter::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            ResizeFilter::Gaussian => fr::ResizeAlg::Convolution(fr::FilterType::Mitchell),
            ResizeFilter::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_support::create_png_bytes;

    fn raw(bytes: Vec<u8>, density_scaled: bool) -> RawImageData {
        RawImageData {
            bytes,
            source_hint: "test",
            density_scaled,
        }
    }

    #[test]
    fn decodes_png_to_rgba() {
        let config = DecodeConfig::default();
        let decoder = Decoder::new(config.clone()).expect("decoder");
        let image = decoder
            .decode_raw(raw(create_png_bytes(128, 112), true), &config, false)
            .expect("decode");

        assert_eq!((image.width(), image.height()), (128, 112));
        assert_eq!(image.byte_len(), 128 * 112 * 4);
        // 左上角像素：x=0, y=0
        assert_eq!(&image.pixels()[..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn mirror_flips_pixels_horizontally() {
        let config = DecodeConfig::default();
        let decoder = Decoder::new(config.clone()).expect("decoder");
        let png = create_png_bytes(8, 2);

        let plain = decoder.decode_raw(raw(png.clone(), true), &config, false).expect("decode");
        let mirrored = decoder.decode_raw(raw(png, true), &config, true).expect("decode");

        let row = |img: &DecodedImage, x: usize| img.pixels()[x * 4..x * 4 + 4].to_vec();
        assert_eq!(row(&mirrored, 0), row(&plain, 7));
        assert_eq!(row(&mirrored, 7), row(&plain, 0));
    }

    #[test]
    fn file_source_is_density_scaled_but_resource_is_not() {
        let config = DecodeConfig {
            source_density: 1,
            target_density: 80,
            ..Default::default()
        };
        let decoder = Decoder::new(config.clone()).expect("decoder");

        let scaled = decoder
            .decode_raw(raw(create_png_bytes(128, 112), true), &config, false)
            .expect("decode");
        assert_eq!((scaled.width(), scaled.height()), (64, 56));

        let untouched = decoder
            .decode_raw(raw(create_png_bytes(128, 112), false), &config, false)
            .expect("decode");
        assert_eq!((untouched.width(), untouched.height()), (128, 112));
    }

    #[test]
    fn rejects_too_many_pixels_before_decode() {
        let config = DecodeConfig {
            max_decoded_pixels: 1_000,
            ..Default::default()
        };
        let decoder = Decoder::new(config.clone()).expect("decoder");
        let result = decoder.decode_raw(raw(create_png_bytes(64, 64), true), &config, false);
        assert!(matches!(result, Err(BubbleError::ResourceLimit(_))));
    }

    #[test]
    fn corrupt_bytes_are_decode_failure() {
        let config = DecodeConfig::default();
        let decoder = Decoder::new(config.clone()).expect("decoder");
        let mut png = create_png_bytes(16, 16);
        png.truncate(40);
        let result = decoder.decode_raw(raw(png, true), &config, false);
        assert!(matches!(result, Err(BubbleError::DecodeFailure(_))));
    }
}
