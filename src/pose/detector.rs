use anyhow::Result;

use super::landmark::Detections;

/// 姿勢ランドマーク検出器
///
/// フレーム型 `F` は呼び出し側 (カメラ) に依存する。姿勢が見つからなかった場合は
/// 空の `Detections` を返す。
pub trait PoseDetector<F> {
    fn detect(&mut self, frame: &F) -> Result<Detections>;
}

impl<F, T> PoseDetector<F> for T
where
    T: FnMut(&F) -> Result<Detections>,
{
    fn detect(&mut self, frame: &F) -> Result<Detections> {
        self(frame)
    }
}

#[cfg(feature = "desktop")]
pub use self::onnx::OnnxPoseDetector;

#[cfg(feature = "desktop")]
mod onnx {
    use anyhow::{Context, Result};
    use opencv::core::Mat;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;

    use super::PoseDetector;
    use crate::pose::landmark::{Detections, Landmark, LandmarkIndex, PoseLandmarks};
    use crate::pose::preprocess::{preprocess_for_blazepose, BLAZEPOSE_INPUT_SIZE};

    const INPUT_NAME: &str = "input_1";
    const LANDMARKS_OUTPUT: &str = "Identity";
    const POSE_FLAG_OUTPUT: &str = "Identity_1";
    /// 1ランドマークあたりの値 (x, y, z, visibility, presence)
    const VALUES_PER_LANDMARK: usize = 5;

    /// BlazePose (full) ランドマークモデルを使用した姿勢検出器
    pub struct OnnxPoseDetector {
        session: Session,
        min_pose_confidence: f32,
    }

    impl OnnxPoseDetector {
        /// ONNXモデルを読み込んで初期化
        pub fn new<P: AsRef<Path>>(model_path: P, min_pose_confidence: f32) -> Result<Self> {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(model_path.as_ref())
                .with_context(|| {
                    format!("Failed to load ONNX model {}", model_path.as_ref().display())
                })?;

            Ok(Self {
                session,
                min_pose_confidence,
            })
        }

        /// 前処理済みテンソルから姿勢を検出
        ///
        /// 入力: [1, 256, 256, 3] の f32 テンソル (0.0-1.0)
        /// 出力: 姿勢フラグが閾値未満なら空
        pub fn detect_tensor(&mut self, input: ndarray::Array4<f32>) -> Result<Detections> {
            let input_tensor = Tensor::from_array(input)?;
            let outputs = self
                .session
                .run(ort::inputs![INPUT_NAME => input_tensor])
                .context("Inference failed")?;

            let flag: ndarray::ArrayViewD<f32> = outputs[POSE_FLAG_OUTPUT]
                .try_extract_array()
                .context("Failed to extract pose flag tensor")?;
            let pose_flag = flag.iter().copied().next().unwrap_or(0.0);
            log::trace!("pose flag: {:.3}", pose_flag);

            if pose_flag < self.min_pose_confidence {
                return Ok(Vec::new());
            }

            // 出力は [1, 195] (39点 x 5値)。先頭33点が体のランドマーク
            let output: ndarray::ArrayViewD<f32> = outputs[LANDMARKS_OUTPUT]
                .try_extract_array()
                .context("Failed to extract landmark tensor")?;
            let values: Vec<f32> = output.iter().copied().collect();
            anyhow::ensure!(
                values.len() >= LandmarkIndex::COUNT * VALUES_PER_LANDMARK,
                "Unexpected landmark tensor length {}",
                values.len()
            );

            let scale = BLAZEPOSE_INPUT_SIZE as f32;
            let mut pose = PoseLandmarks::default();
            for (i, chunk) in values
                .chunks_exact(VALUES_PER_LANDMARK)
                .take(LandmarkIndex::COUNT)
                .enumerate()
            {
                pose.landmarks[i] = Landmark::new(
                    chunk[0] / scale,
                    chunk[1] / scale,
                    chunk[2] / scale,
                    sigmoid(chunk[3]),
                );
            }

            Ok(vec![pose])
        }
    }

    impl PoseDetector<Mat> for OnnxPoseDetector {
        fn detect(&mut self, frame: &Mat) -> Result<Detections> {
            let input = preprocess_for_blazepose(frame)?;
            self.detect_tensor(input)
        }
    }

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }
}
