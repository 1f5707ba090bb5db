//! 摄像头输入
//!
//! 异步获取实时视频流，第一帧可解码后报告就绪，并按需给摄像头像素重生器提供帧。
//!
//! ```text
//! Idle ─acquire─► Requesting ─┬─► Failed（终态）
//!                             └─► Attached ─首帧─► Ready
//! ```
//!
//! 请求在 tokio 运行时上执行，结果通过 crossbeam 通道交回主线程，
//! 主线程每帧调用一次 `poll()`。失败只对摄像头子系统致命，不会重试也不会重连。

pub mod still;

pub use still::{ConstantStream, StillImageCamera, UnavailableCamera};

use crate::core::error::{CameraError, CameraResult};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use futures::future::BoxFuture;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;

/// 采集约束
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConstraints {
    pub video: bool,
    pub audio: bool,
    /// 期望分辨率 [宽, 高]
    pub resolution: Option<[u32; 2]>,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: false,
            resolution: None,
        }
    }
}

/// 视频流
pub trait VideoStream: Send {
    /// 最新的一帧；尚无可解码的帧时返回 `None`
    fn next_frame(&mut self) -> Option<Arc<RgbaImage>>;
}

/// 采集设备
pub trait CameraDevice: Send + Sync {
    /// 请求一条视频流
    fn request(
        &self,
        constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, CameraResult<Box<dyn VideoStream>>>;
}

/// 摄像头状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Idle,
    Requesting,
    /// 已连接视频流，尚未得到可解码的帧
    Attached,
    Ready,
    Failed,
}

/// `poll()` 报告的状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    Ready { width: u32, height: u32 },
    Failed(CameraError),
}

/// 摄像头输入
pub struct CameraFeed {
    state: CameraState,
    constraints: CaptureConstraints,
    pending: Option<Receiver<CameraResult<Box<dyn VideoStream>>>>,
    stream: Option<Box<dyn VideoStream>>,
    last_frame: Option<Arc<RgbaImage>>,
    error: Option<CameraError>,
}

impl CameraFeed {
    pub fn new(constraints: CaptureConstraints) -> Self {
        Self {
            state: CameraState::Idle,
            constraints,
            pending: None,
            stream: None,
            last_frame: None,
            error: None,
        }
    }

    /// 发起采集请求
    ///
    /// 同一时刻只允许一个请求；不是 `Idle` 状态时返回 `CameraError::AlreadyRequested`。
    pub fn acquire(&mut self, device: &dyn CameraDevice, runtime: &Handle) -> CameraResult<()> {
        if self.state != CameraState::Idle {
            return Err(CameraError::AlreadyRequested);
        }

        let (tx, rx) = bounded(1);
        let request = device.request(&self.constraints);
        runtime.spawn(async move {
            let _ = tx.send(request.await);
        });

        self.pending = Some(rx);
        self.state = CameraState::Requesting;
        tracing::info!(target: "tendrils::camera", constraints = ?self.constraints, "Requesting capture device");
        Ok(())
    }

    /// 推进状态机，每帧调用一次
    ///
    /// `Ready` 只会被报告一次。
    pub fn poll(&mut self) -> Option<CameraEvent> {
        if self.state == CameraState::Requesting {
            let received = match &self.pending {
                Some(rx) => rx.try_recv(),
                None => Err(TryRecvError::Disconnected),
            };
            match received {
                Ok(Ok(stream)) => {
                    self.pending = None;
                    self.stream = Some(stream);
                    self.state = CameraState::Attached;
                    tracing::debug!(target: "tendrils::camera", "Video stream attached");
                }
                Ok(Err(e)) => return Some(self.fail(e)),
                Err(TryRecvError::Disconnected) => {
                    return Some(self.fail(CameraError::RequestDropped))
                }
                Err(TryRecvError::Empty) => return None,
            }
        }

        if self.state == CameraState::Attached {
            let frame = self.stream.as_mut().and_then(|stream| stream.next_frame())?;
            let (width, height) = frame.dimensions();
            self.last_frame = Some(frame);
            self.state = CameraState::Ready;
            tracing::info!(target: "tendrils::camera", width, height, "Camera ready");
            return Some(CameraEvent::Ready { width, height });
        }

        None
    }

    fn fail(&mut self, error: CameraError) -> CameraEvent {
        tracing::error!(target: "tendrils::camera", error = %error, "Camera unavailable");
        self.pending = None;
        self.stream = None;
        self.state = CameraState::Failed;
        self.error = Some(error.clone());
        CameraEvent::Failed(error)
    }

    /// 最新的一帧（没有新帧时返回最后一次看到的帧），仅在 `Ready` 时可用
    pub fn frame(&mut self) -> Option<&Arc<RgbaImage>> {
        if self.state != CameraState::Ready {
            return None;
        }
        if let Some(frame) = self.stream.as_mut().and_then(|stream| stream.next_frame()) {
            self.last_frame = Some(frame);
        }
        self.last_frame.as_ref()
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == CameraState::Ready
    }

    pub fn error(&self) -> Option<&CameraError> {
        self.error.as_ref()
    }

    pub fn constraints(&self) -> &CaptureConstraints {
        &self.constraints
    }

    /// 释放视频流
    pub fn release(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!(target: "tendrils::camera", "Video stream released");
        }
        self.pending = None;
        self.last_frame = None;
        if self.state != CameraState::Failed {
            self.state = CameraState::Idle;
        }
    }
}

impl Default for CameraFeed {
    fn default() -> Self {
        Self::new(CaptureConstraints::default())
    }
}

impl std::fmt::Debug for CameraFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFeed")
            .field("state", &self.state)
            .field("constraints", &self.constraints)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 前 `blank_frames` 次没有帧的视频流
    struct WarmingStream {
        blank_frames: usize,
        served: Arc<AtomicUsize>,
    }

    impl VideoStream for WarmingStream {
        fn next_frame(&mut self) -> Option<Arc<RgbaImage>> {
            if self.blank_frames > 0 {
                self.blank_frames -= 1;
                return None;
            }
            let n = self.served.fetch_add(1, Ordering::SeqCst) as u32;
            Some(Arc::new(RgbaImage::new(4 + n, 2)))
        }
    }

    struct WarmingCamera {
        blank_frames: usize,
        served: Arc<AtomicUsize>,
    }

    impl CameraDevice for WarmingCamera {
        fn request(
            &self,
            _constraints: &CaptureConstraints,
        ) -> BoxFuture<'static, CameraResult<Box<dyn VideoStream>>> {
            let stream = WarmingStream {
                blank_frames: self.blank_frames,
                served: self.served.clone(),
            };
            futures::future::ready(Ok(Box::new(stream) as Box<dyn VideoStream>)).boxed()
        }
    }

    /// 永远不会完成的请求
    struct HangingCamera;

    impl CameraDevice for HangingCamera {
        fn request(
            &self,
            _constraints: &CaptureConstraints,
        ) -> BoxFuture<'static, CameraResult<Box<dyn VideoStream>>> {
            futures::future::pending().boxed()
        }
    }

    async fn poll_until_event(feed: &mut CameraFeed) -> Option<CameraEvent> {
        for _ in 0..100 {
            if let Some(event) = feed.poll() {
                return Some(event);
            }
            tokio::task::yield_now().await;
        }
        None
    }

    #[tokio::test]
    async fn test_ready_after_first_decodable_frame() {
        let camera = WarmingCamera {
            blank_frames: 2,
            served: Arc::new(AtomicUsize::new(0)),
        };
        let mut feed = CameraFeed::default();
        feed.acquire(&camera, &Handle::current()).unwrap();
        assert_eq!(feed.state(), CameraState::Requesting);
        assert!(feed.frame().is_none());

        let event = poll_until_event(&mut feed).await;
        assert_eq!(event, Some(CameraEvent::Ready { width: 4, height: 2 }));
        assert!(feed.is_ready());

        // 就绪只报告一次
        assert_eq!(feed.poll(), None);

        let frame = feed.frame().unwrap();
        assert_eq!(frame.width(), 5);
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let mut feed = CameraFeed::default();
        feed.acquire(&UnavailableCamera, &Handle::current()).unwrap();

        let event = poll_until_event(&mut feed).await;
        assert_eq!(event, Some(CameraEvent::Failed(CameraError::NoDevice)));
        assert_eq!(feed.state(), CameraState::Failed);
        assert_eq!(feed.error(), Some(&CameraError::NoDevice));
        assert!(feed.frame().is_none());
        assert_eq!(feed.poll(), None);

        assert_eq!(
            feed.acquire(&UnavailableCamera, &Handle::current()),
            Err(CameraError::AlreadyRequested)
        );
    }

    #[tokio::test]
    async fn test_single_outstanding_request() {
        let mut feed = CameraFeed::default();
        feed.acquire(&HangingCamera, &Handle::current()).unwrap();
        assert_eq!(
            feed.acquire(&HangingCamera, &Handle::current()),
            Err(CameraError::AlreadyRequested)
        );

        assert_eq!(poll_until_event(&mut feed).await, None);
        assert_eq!(feed.state(), CameraState::Requesting);
    }

    #[tokio::test]
    async fn test_release_drops_stream() {
        let camera = WarmingCamera {
            blank_frames: 0,
            served: Arc::new(AtomicUsize::new(0)),
        };
        let mut feed = CameraFeed::default();
        feed.acquire(&camera, &Handle::current()).unwrap();
        poll_until_event(&mut feed).await;
        assert!(feed.is_ready());

        feed.release();
        assert_eq!(feed.state(), CameraState::Idle);
        assert!(feed.frame().is_none());
    }
}
