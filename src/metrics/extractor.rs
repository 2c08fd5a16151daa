use crate::config::Config;
use crate::pose::{LandmarkIndex, PoseLandmarks};

use super::geometry::{joint_angle, velocity, SampledPoint};
use super::report::MetricReport;

/// デフォルトのサンプリング間隔 (検出フレーム数)
pub const DEFAULT_SAMPLE_INTERVAL: u32 = 10;
/// デフォルトの信頼度閾値
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.95;

/// 関節角度を求める3点 (近位, 関節, 遠位)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTriple {
    pub proximal: LandmarkIndex,
    pub joint: LandmarkIndex,
    pub distal: LandmarkIndex,
}

impl JointTriple {
    pub const LEFT_KNEE: JointTriple = JointTriple {
        proximal: LandmarkIndex::LeftHip,
        joint: LandmarkIndex::LeftKnee,
        distal: LandmarkIndex::LeftAnkle,
    };

    pub const RIGHT_KNEE: JointTriple = JointTriple {
        proximal: LandmarkIndex::RightHip,
        joint: LandmarkIndex::RightKnee,
        distal: LandmarkIndex::RightAnkle,
    };

    /// 姿勢からこの関節の角度を求める
    pub fn angle(&self, pose: &PoseLandmarks) -> f32 {
        joint_angle(
            pose.get(self.proximal).into(),
            pose.get(self.joint).into(),
            pose.get(self.distal).into(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// サンプリング間にスキップする検出フレーム数。N なら N+1 フレームごとにサンプリング (0 で毎フレーム)
    pub sample_interval: u32,
    /// 基準点の可視度がこれ未満ならメトリクスを出さない
    pub confidence_threshold: f32,
    /// 可視度を判定するランドマーク
    pub reference: LandmarkIndex,
    /// 速度を求めるランドマーク
    pub tracked: LandmarkIndex,
    pub left_leg: JointTriple,
    pub right_leg: JointTriple,
}

impl ExtractorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sample_interval: config.sampling.interval,
            confidence_threshold: config.gate.threshold,
            reference: config.gate.reference,
            tracked: config.sampling.tracked,
            ..Self::default()
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            reference: LandmarkIndex::Nose,
            tracked: LandmarkIndex::Nose,
            left_leg: JointTriple::LEFT_KNEE,
            right_leg: JointTriple::RIGHT_KNEE,
        }
    }
}

/// 1フレーム処理した結果
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// 姿勢なし。カウンタは進まない
    NoPose,
    /// サンプリング待ち。現在のカウンタ値
    Counting(u32),
    /// 最初のサンプル。基準点を記録しただけでレポートなし
    Baseline(SampledPoint),
    /// レポートを出力すべきサンプル
    Reported(MetricReport),
}

impl Step {
    pub fn report(&self) -> Option<&MetricReport> {
        match self {
            Step::Reported(report) => Some(report),
            _ => None,
        }
    }

    /// サンプリングが行われたか
    pub fn is_sample(&self) -> bool {
        matches!(self, Step::Baseline(_) | Step::Reported(_))
    }
}

/// フレームごとのランドマークから速度・膝角度・信頼度を求める
///
/// 状態は前回サンプルの追跡点とフレームカウンタのみ。追跡セッションごとに1つ持つ。
pub struct FrameMetricExtractor {
    config: ExtractorConfig,
    counter: u32,
    previous: Option<SampledPoint>,
}

impl FrameMetricExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            counter: 0,
            previous: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ExtractorConfig::from_config(config))
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// 前回サンプリングからの検出フレーム数 (0 以上 sample_interval 以下)
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn previous(&self) -> Option<SampledPoint> {
        self.previous
    }

    /// 前回サンプルとカウンタを破棄する
    pub fn reset(&mut self) {
        self.counter = 0;
        self.previous = None;
    }

    /// 1フレーム分の検出結果を処理する
    pub fn process(&mut self, pose: Option<&PoseLandmarks>) -> Step {
        let pose = match pose {
            Some(pose) => pose,
            None => return Step::NoPose,
        };

        if self.counter < self.config.sample_interval {
            self.counter += 1;
            return Step::Counting(self.counter);
        }
        self.counter = 0;

        let current = SampledPoint::from(pose.get(self.config.tracked));
        let previous = match self.previous.replace(current) {
            Some(previous) => previous,
            None => {
                log::debug!("baseline sample at ({:.3}, {:.3})", current.x, current.y);
                return Step::Baseline(current);
            }
        };

        let confidence = pose.get(self.config.reference).visibility;
        if confidence < self.config.confidence_threshold {
            log::debug!(
                "reference visibility {:.3} below {:.3}, suppressing metrics",
                confidence,
                self.config.confidence_threshold
            );
            return Step::Reported(MetricReport::LowConfidence { confidence });
        }

        Step::Reported(MetricReport::Metrics {
            velocity: velocity(previous, current),
            left_knee: self.config.left_leg.angle(pose),
            right_knee: self.config.right_leg.angle(pose),
            confidence,
        })
    }
}
