//! Landmark sources: synchronous detection, or detection on a worker thread whose latest
//! result is picked up by the display loop.

use anyhow::{Context, Result};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;

use super::detector::PoseDetector;
use super::landmark::Detections;
use crate::mailbox::LatestSlot;

/// 1フレーム分のポーリング結果
#[derive(Debug, Clone, Default)]
pub struct Polled {
    /// 描画に使う最新の検出結果。姿勢なしなら None
    pub poses: Option<Arc<Detections>>,
    /// `poses` が今回初めて観測された結果か
    pub fresh: bool,
}

impl Polled {
    /// メトリクス計算に使える、新しく届いた検出結果
    pub fn fresh_poses(&self) -> Option<&Detections> {
        if self.fresh {
            self.poses.as_deref()
        } else {
            None
        }
    }
}

/// フレームから検出結果を得る方法
pub trait LandmarkSource<F> {
    fn poll(&mut self, frame: &F) -> Result<Polled>;
}

/// 同期モード: 毎フレーム検出を実行し、その結果をそのまま返す
pub struct Blocking<D> {
    detector: D,
}

impl<D> Blocking<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }
}

impl<F, D: PoseDetector<F>> LandmarkSource<F> for Blocking<D> {
    fn poll(&mut self, frame: &F) -> Result<Polled> {
        let detections = self.detector.detect(frame)?;
        Ok(Polled {
            poses: (!detections.is_empty()).then(|| Arc::new(detections)),
            fresh: true,
        })
    }
}

/// ライブストリームモード: 検出は別スレッドで行い、最新結果を提供する
///
/// `poll` はフレームを投入するだけでブロックしない。ワーカーが推論中ならそのフレームは破棄される。
/// 返される結果は以前に投入したフレームのものであり得る (遅延の上限はない)。
pub struct LiveStream<F> {
    sender: Option<SyncSender<F>>,
    results: Arc<LatestSlot<Detections>>,
    last_seen: u64,
    submitted: u64,
    dropped: u64,
    handle: Option<thread::JoinHandle<()>>,
}

impl<F: Send + 'static> LiveStream<F> {
    pub fn spawn<D>(mut detector: D) -> Result<Self>
    where
        D: PoseDetector<F> + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel::<F>(1);
        let results = Arc::new(LatestSlot::new());
        let results_ref = results.clone();

        let handle = thread::Builder::new()
            .name("pose detector".to_string())
            .spawn(move || {
                // 送信側が drop されるとループを抜ける
                for frame in receiver {
                    match detector.detect(&frame) {
                        Ok(detections) => {
                            results_ref.publish(detections);
                        }
                        Err(e) => log::warn!("pose detection failed: {:#}", e),
                    }
                }
                log::debug!("pose detector worker exiting");
            })
            .context("Failed to spawn detector thread")?;

        Ok(Self {
            sender: Some(sender),
            results,
            last_seen: 0,
            submitted: 0,
            dropped: 0,
            handle: Some(handle),
        })
    }
}

impl<F> LiveStream<F> {
    /// ワーカーが busy で破棄されたフレーム数
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    pub fn submitted_frames(&self) -> u64 {
        self.submitted
    }

    fn submit(&mut self, frame: F) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .context("Detector worker already stopped")?;
        match sender.try_send(frame) {
            Ok(()) => self.submitted += 1,
            Err(TrySendError::Full(_)) => self.dropped += 1,
            Err(TrySendError::Disconnected(_)) => anyhow::bail!("Detector worker terminated"),
        }
        Ok(())
    }

    fn take_latest(&mut self) -> Polled {
        match self.results.latest() {
            Some(snapshot) => {
                let fresh = snapshot.sequence != self.last_seen;
                self.last_seen = snapshot.sequence;
                let poses = (!snapshot.value.is_empty()).then_some(snapshot.value);
                Polled { poses, fresh }
            }
            None => Polled::default(),
        }
    }
}

impl<F: Clone> LandmarkSource<F> for LiveStream<F> {
    fn poll(&mut self, frame: &F) -> Result<Polled> {
        self.submit(frame.clone())?;
        Ok(self.take_latest())
    }
}

impl<F> Drop for LiveStream<F> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("pose detector thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmark::{LandmarkIndex, PoseLandmarks};
    use std::time::{Duration, Instant};

    fn pose_with_nose_x(x: f32) -> PoseLandmarks {
        let mut pose = PoseLandmarks::default();
        pose.get_mut(LandmarkIndex::Nose).x = x;
        pose
    }

    fn poll_until_fresh(source: &mut LiveStream<u32>, frame: u32) -> Polled {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let polled = source.poll(&frame).unwrap();
            if polled.fresh {
                return polled;
            }
            assert!(Instant::now() < deadline, "no result from detector worker");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_blocking_always_fresh() {
        let mut source = Blocking::new(|frame: &u32| -> Result<Detections> {
            Ok(if *frame > 0 { vec![pose_with_nose_x(0.5)] } else { Vec::new() })
        });

        let polled = source.poll(&0u32).unwrap();
        assert!(polled.fresh);
        assert!(polled.poses.is_none());
        assert!(polled.fresh_poses().is_none());

        let polled = source.poll(&1u32).unwrap();
        assert_eq!(polled.fresh_poses().unwrap().len(), 1);
    }

    #[test]
    fn test_blocking_propagates_error() {
        let mut source =
            Blocking::new(|_: &u32| -> Result<Detections> { anyhow::bail!("model crashed") });
        assert!(source.poll(&0u32).is_err());
    }

    #[test]
    fn test_live_stream_delivers_result() {
        let mut source = LiveStream::<u32>::spawn(|frame: &u32| -> Result<Detections> {
            Ok(vec![pose_with_nose_x(*frame as f32 / 10.0)])
        })
        .unwrap();

        let polled = poll_until_fresh(&mut source, 3);
        let poses = polled.fresh_poses().unwrap();
        assert_eq!(poses.len(), 1);
        assert!(source.submitted_frames() >= 1);
    }

    #[test]
    fn test_live_stream_result_is_fresh_once() {
        let mut source =
            LiveStream::<u32>::spawn(|_: &u32| -> Result<Detections> { Ok(vec![pose_with_nose_x(0.1)]) })
                .unwrap();

        // Submit exactly one frame so exactly one result is ever published.
        source.submit(1).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !source.take_latest().fresh {
            assert!(Instant::now() < deadline, "no result from detector worker");
            thread::sleep(Duration::from_millis(1));
        }

        let again = source.take_latest();
        assert!(!again.fresh);
        assert!(again.poses.is_some());
        assert!(again.fresh_poses().is_none());
    }

    #[test]
    fn test_live_stream_empty_result_clears_poses() {
        let mut source =
            LiveStream::<u32>::spawn(|_: &u32| -> Result<Detections> { Ok(Vec::new()) }).unwrap();
        let polled = poll_until_fresh(&mut source, 0);
        assert!(polled.poses.is_none());
    }

    #[test]
    fn test_live_stream_drops_frames_while_busy() {
        let mut source = LiveStream::<u32>::spawn(|_: &u32| -> Result<Detections> {
            thread::sleep(Duration::from_millis(50));
            Ok(Vec::new())
        })
        .unwrap();

        for frame in 0..20u32 {
            source.poll(&frame).unwrap();
        }
        assert!(source.dropped_frames() > 0);
        assert_eq!(source.submitted_frames() + source.dropped_frames(), 20);
    }

    #[test]
    fn test_live_stream_survives_detector_error() {
        let mut calls = 0u32;
        let mut source = LiveStream::<u32>::spawn(move |_: &u32| -> Result<Detections> {
            calls += 1;
            if calls == 1 {
                anyhow::bail!("transient failure");
            }
            Ok(vec![PoseLandmarks::default()])
        })
        .unwrap();

        let polled = poll_until_fresh(&mut source, 0);
        assert!(polled.poses.is_some());
    }
}
