//! # nine-patch 气泡 — 命令行入口
//!
//! 读取样式 JSON 与一张图片（或一个帧目录），输出缩放后的 chunk、padding 与播放信息。
//!
//! ```text
//! ninepatch-bubble <style.json> <image | frame-dir> [--mirror] [--config <factory.json>]
//!                  [--filter <name>]
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use ninepatch_bubble::decode::ResizeFilter;
use ninepatch_bubble::patch::PaddingBox;
use ninepatch_bubble::{BubbleError, BubbleFactory, BubbleStyle, FactoryConfig, Frame, ImageSource};

#[derive(Parser, Debug)]
#[command(name = "ninepatch-bubble", version)]
struct Cli {
    /// 气泡样式 JSON。
    style: PathBuf,

    /// 单张气泡图片，或按文件名排序的帧目录。
    input: PathBuf,

    /// 构建右侧（镜像）气泡。
    #[arg(long)]
    mirror: bool,

    /// 工厂配置 JSON（缺省使用内置默认值）。
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖配置中的密度缩放滤镜（nearest / triangle / catmull_rom / gaussian / lanczos3）。
    #[arg(long)]
    filter: Option<ResizeFilter>,
}

#[derive(Serialize)]
struct Report {
    input: String,
    mirror: bool,
    frames: usize,
    finish_count: u32,
    loop_duration_ms: u64,
    width: u32,
    height: u32,
    padding: PaddingBox,
    chunk_len: usize,
    chunk_hex: String,
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

struct Playback {
    frames: usize,
    finish_count: u32,
    loop_duration_ms: u64,
}

fn report_for(input: &Path, mirror: bool, frame: &Frame, playback: Playback) -> Report {
    Report {
        input: input.display().to_string(),
        mirror,
        frames: playback.frames,
        finish_count: playback.finish_count,
        loop_duration_ms: playback.loop_duration_ms,
        width: frame.image.width(),
        height: frame.image.height(),
        padding: frame.padding,
        chunk_len: frame.chunk_bytes.len(),
        chunk_hex: to_hex(&frame.chunk_bytes),
    }
}

async fn run(args: Cli) -> Result<Report, BubbleError> {
    let mut config = match &args.config {
        Some(path) => FactoryConfig::load_from_path(path)?,
        None => FactoryConfig::default(),
    };
    if let Some(filter) = args.filter {
        config.decode.resize_filter = filter;
    }
    let style = BubbleStyle::load_from_path(&args.style)?;
    let style = if args.mirror { style.with_mirror(true) } else { style };

    let factory = BubbleFactory::from_config(&config)?;

    if args.input.is_dir() {
        let sources = ninepatch_bubble::factory::list_frame_files(&args.input)?;
        let session = factory.build_animation_async(&style, sources).await?;
        let playback = Playback {
            frames: session.frame_count(),
            finish_count: session.finish_count(),
            loop_duration_ms: session.total_duration_ms(),
        };
        Ok(report_for(&args.input, style.mirror(), session.current_frame(), playback))
    } else {
        let frame = factory
            .build_static_async(&style, ImageSource::file(&args.input))
            .await?;
        let playback = Playback {
            frames: 1,
            finish_count: 1,
            loop_duration_ms: frame.duration_ms as u64,
        };
        Ok(report_for(&args.input, style.mirror(), &frame, playback))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    match run(args).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(err) => {
                log::error!("输出序列化失败: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            log::error!("气泡构建失败: {err}");
            let payload = serde_json::json!({ "error": err });
            println!("{}", payload);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "ninepatch-bubble",
            "style.json",
            "frames/",
            "--mirror",
            "--config",
            "factory.json",
            "--filter",
            "lanczos3",
        ])
        .expect("parse");

        assert_eq!(cli.style, PathBuf::from("style.json"));
        assert_eq!(cli.input, PathBuf::from("frames/"));
        assert!(cli.mirror);
        assert_eq!(cli.config, Some(PathBuf::from("factory.json")));
        assert_eq!(cli.filter, Some(ResizeFilter::Lanczos3));
    }

    #[test]
    fn defaults_and_rejections() {
        let cli =
            Cli::try_parse_from(["ninepatch-bubble", "style.json", "bubble.png"]).expect("parse");
        assert!(!cli.mirror);
        assert!(cli.config.is_none());
        assert!(cli.filter.is_none());

        assert!(Cli::try_parse_from(["ninepatch-bubble", "style.json"]).is_err());
        assert!(
            Cli::try_parse_from(["ninepatch-bubble", "s.json", "b.png", "--filter", "bicubic"])
                .is_err()
        );
    }
}
