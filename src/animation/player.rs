//! # 播放驱动
//!
//! ## 设计思路
//!
//! 单线程协作式计时：每次只等待当前帧的时长，到期后 `tick` 一次，同一会话永远只有一个 tick 在途。
//! 取消信号通过 `watch` 通道传入，与帧计时器竞争：一旦置位立即停止，不等待当前帧计时到期。

use std::time::Duration;

use tokio::sync::watch;

use super::{AnimationSession, Frame, PlaybackEvent, PlaybackState};

/// 驱动会话播放到结束或被取消，返回最终状态。
///
/// `on_event` 收到每次迁移事件及迁移后的当前帧。`cancel` 的值变为 `true` 时立即停止；
/// 发送端全部丢弃视为不再取消。
///
/// # 示例
/// ```rust,ignore
/// let (cancel_tx, cancel_rx) = watch::channel(false);
/// let state = play(&mut session, |event, frame| render(event, frame), cancel_rx).await;
/// assert_eq!(state, PlaybackState::Stopped);
/// ```
pub async fn play<E>(
    session: &mut AnimationSession,
    mut on_event: E,
    mut cancel: watch::Receiver<bool>,
) -> PlaybackState
where
    E: FnMut(PlaybackEvent, &Frame),
{
    if session.state() != PlaybackState::Playing {
        let event = session.start();
        on_event(event, session.current_frame());
    }

    log::debug!(
        "▶️ 开始播放帧动画 - frames={} finish_count={} 单遍时长={}ms",
        session.frame_count(),
        session.finish_count(),
        session.total_duration_ms()
    );

    loop {
        if *cancel.borrow() {
            session.stop();
            break;
        }

        let wait = Duration::from_millis(session.current_frame().duration_ms as u64);
        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                log::debug!("⏹️ 播放被取消 - index={}", session.current_index());
                session.stop();
                break;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let event = session.tick();
        match event {
            PlaybackEvent::Ignored => break,
            PlaybackEvent::Finished { .. } => {
                on_event(event, session.current_frame());
                break;
            }
            _ => on_event(event, session.current_frame()),
        }
    }

    session.state()
}

/// 取消标志置位时完成；发送端已全部丢弃且未置位则永不完成。
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|flag| *flag).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::session::test_support::{frame, session};
    use std::cell::Cell;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn plays_to_completion_and_holds_last_frame() {
        let mut session = session(4, 2);
        let mut events = Vec::new();
        let (_cancel, rx) = watch::channel(false);

        let state = play(&mut session, |event, _| events.push(event), rx).await;

        assert_eq!(state, PlaybackState::Stopped);
        assert_eq!(events.first(), Some(&PlaybackEvent::Started { index: 0 }));
        assert_eq!(events.last(), Some(&PlaybackEvent::Finished { loops: 2, index: 3 }));
        // 1 次 Started + 8 次换帧
        assert_eq!(events.len(), 9);
        assert_eq!(session.current_index(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_keeps_playing() {
        let mut session = session(3, 1);
        let (cancel, rx) = watch::channel(false);
        drop(cancel);

        let state = play(&mut session, |_, _| {}, rx).await;

        assert_eq!(state, PlaybackState::Stopped);
        assert_eq!(session.advances(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_on_tick_boundary() {
        let mut session = session(4, 100);
        let ticks = Cell::new(0u32);
        let (cancel, rx) = watch::channel(false);

        let state = play(
            &mut session,
            |event, _| {
                let advanced = matches!(
                    event,
                    PlaybackEvent::Advanced { .. } | PlaybackEvent::LoopCompleted { .. }
                );
                if advanced {
                    ticks.set(ticks.get() + 1);
                    if ticks.get() == 5 {
                        let _ = cancel.send(true);
                    }
                }
            },
            rx,
        )
        .await;

        assert_eq!(state, PlaybackState::Stopped);
        assert_eq!(ticks.get(), 5);
        assert_eq!(session.advances(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_pending_frame_timer() {
        let frames = (0..3).map(|_| frame(10_000)).collect();
        let mut session = AnimationSession::new(frames, 1).expect("session");
        let (cancel, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = cancel.send(true);
        });

        let begin = Instant::now();
        let state = play(&mut session, |_, _| {}, rx).await;
        let elapsed = begin.elapsed();

        assert_eq!(state, PlaybackState::Stopped);
        assert!(elapsed < Duration::from_millis(100), "停止耗时 {:?}", elapsed);
        assert_eq!(session.advances(), 0);
        assert_eq!(session.current_index(), 0);
    }
}
