//! Planar geometry on normalized landmark coordinates.

use crate::pose::Landmark;

/// 追跡点の位置 (正規化座標)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampledPoint {
    pub x: f32,
    pub y: f32,
}

impl SampledPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<&Landmark> for SampledPoint {
    fn from(lm: &Landmark) -> Self {
        Self::new(lm.x, lm.y)
    }
}

/// サンプル間の移動量。y は上向きが正
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

/// 前回サンプルから今回サンプルへの移動量
///
/// 検出器の座標系は y が下向きなので、符号を反転して上向きを正にする。
pub fn velocity(previous: SampledPoint, current: SampledPoint) -> Velocity {
    Velocity {
        dx: current.x - previous.x,
        dy: -(current.y - previous.y),
    }
}

/// 3点 (近位, 関節, 遠位) から関節の内角を求める (度, 0.0 以上 180.0 未満)
///
/// 関節→遠位 と 関節→近位 の方向角の差の絶対値を取り、優角は内角に折り返す。
/// 最後に 180 で剰余を取るので、完全に伸びた関節は 0 になる。
/// 関節まわりに3点を回転させても値は変わらない。
pub fn joint_angle(proximal: SampledPoint, joint: SampledPoint, distal: SampledPoint) -> f32 {
    let to_distal = (distal.y - joint.y).atan2(distal.x - joint.x);
    let to_proximal = (proximal.y - joint.y).atan2(proximal.x - joint.x);

    let mut angle = (to_distal - to_proximal).abs().to_degrees();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle.rem_euclid(180.0)
}
