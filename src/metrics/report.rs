use std::fmt;

use super::geometry::Velocity;

/// 速度の表示桁数
pub const VELOCITY_DECIMALS: usize = 3;
/// 信頼度の表示桁数
pub const CONFIDENCE_DECIMALS: usize = 3;
/// 角度の表示桁数
pub const ANGLE_DECIMALS: usize = 2;

/// サンプリング1回分のレポート
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricReport {
    /// 基準点の可視度が閾値以上: 全メトリクス
    Metrics {
        velocity: Velocity,
        /// 左膝の角度 (度)
        left_knee: f32,
        /// 右膝の角度 (度)
        right_knee: f32,
        confidence: f32,
    },
    /// 基準点の可視度が閾値未満: 生のスコアのみ
    LowConfidence { confidence: f32 },
}

impl MetricReport {
    /// 基準点の可視度
    pub fn confidence(&self) -> f32 {
        match *self {
            MetricReport::Metrics { confidence, .. } => confidence,
            MetricReport::LowConfidence { confidence } => confidence,
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        matches!(self, MetricReport::LowConfidence { .. })
    }

    /// 1行1メトリクスの表示用テキスト
    pub fn lines(&self) -> Vec<String> {
        match *self {
            MetricReport::Metrics {
                velocity,
                left_knee,
                right_knee,
                confidence,
            } => vec![
                format!("Velocity X: {:.*}", VELOCITY_DECIMALS, velocity.dx),
                format!("Velocity Y: {:.*}", VELOCITY_DECIMALS, velocity.dy),
                format!("Left Knee Angle: {:.*}", ANGLE_DECIMALS, left_knee),
                format!("Right Knee Angle: {:.*}", ANGLE_DECIMALS, right_knee),
                format!("Confidence: {:.*}", CONFIDENCE_DECIMALS, confidence),
            ],
            MetricReport::LowConfidence { confidence } => vec![format!(
                "Low confidence: {:.*}",
                CONFIDENCE_DECIMALS, confidence
            )],
        }
    }
}

impl fmt::Display for MetricReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}
