use crate::pose::LandmarkIndex;

use LandmarkIndex::*;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const SKELETON_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 35] = [
    // 顔
    (Nose, LeftEyeInner),
    (LeftEyeInner, LeftEye),
    (LeftEye, LeftEyeOuter),
    (LeftEyeOuter, LeftEar),
    (Nose, RightEyeInner),
    (RightEyeInner, RightEye),
    (RightEye, RightEyeOuter),
    (RightEyeOuter, RightEar),
    (MouthLeft, MouthRight),
    // 上半身
    (LeftShoulder, RightShoulder),
    (LeftShoulder, LeftElbow),
    (LeftElbow, LeftWrist),
    (RightShoulder, RightElbow),
    (RightElbow, RightWrist),
    // 手
    (LeftWrist, LeftPinky),
    (LeftPinky, LeftIndex),
    (LeftIndex, LeftWrist),
    (LeftWrist, LeftThumb),
    (RightWrist, RightPinky),
    (RightPinky, RightIndex),
    (RightIndex, RightWrist),
    (RightWrist, RightThumb),
    // 胴体
    (LeftShoulder, LeftHip),
    (RightShoulder, RightHip),
    (LeftHip, RightHip),
    // 下半身
    (LeftHip, LeftKnee),
    (LeftKnee, LeftAnkle),
    (LeftAnkle, LeftHeel),
    (LeftHeel, LeftFootIndex),
    (LeftAnkle, LeftFootIndex),
    (RightHip, RightKnee),
    (RightKnee, RightAnkle),
    (RightAnkle, RightHeel),
    (RightHeel, RightFootIndex),
    (RightAnkle, RightFootIndex),
];

/// ランドマークの色 (BGR)
pub const LANDMARK_COLOR: [u8; 3] = [0, 255, 0]; // 緑

/// 骨格線の色 (BGR)
pub const SKELETON_COLOR: [u8; 3] = [0, 255, 255]; // 黄色

/// 可視度が低いランドマークの色 (BGR)
pub const LOW_VISIBILITY_COLOR: [u8; 3] = [0, 0, 255]; // 赤

/// レポート文字の色 (BGR)
pub const REPORT_TEXT_COLOR: [u8; 3] = [255, 255, 255];

/// 低信頼度レポートの文字色 (BGR)
pub const LOW_CONFIDENCE_TEXT_COLOR: [u8; 3] = [0, 165, 255]; // オレンジ

/// これ未満の可視度の点は LOW_VISIBILITY_COLOR で描く
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_connections_unique() {
        let mut seen = HashSet::new();
        for (a, b) in SKELETON_CONNECTIONS {
            assert_ne!(a, b);
            let key = if (a as usize) < (b as usize) { (a, b) } else { (b, a) };
            assert!(seen.insert(key), "duplicate connection {:?}", key);
        }
    }

    #[test]
    fn test_every_landmark_connected() {
        let connected: HashSet<LandmarkIndex> = SKELETON_CONNECTIONS
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .collect();
        assert_eq!(connected.len(), LandmarkIndex::COUNT);
    }

    #[test]
    fn test_legs_connected() {
        assert!(SKELETON_CONNECTIONS.contains(&(LeftHip, LeftKnee)));
        assert!(SKELETON_CONNECTIONS.contains(&(LeftKnee, LeftAnkle)));
        assert!(SKELETON_CONNECTIONS.contains(&(RightHip, RightKnee)));
        assert!(SKELETON_CONNECTIONS.contains(&(RightKnee, RightAnkle)));
    }
}
