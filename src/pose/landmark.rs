use serde::Deserialize;

/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    /// インデックス順の全ランドマーク
    pub const ALL: [LandmarkIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0, 左端が0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0, 上端が0で下向きに増加)
    pub y: f32,
    /// 腰中心を原点とした奥行き (x と同じスケール)
    pub z: f32,
    /// 可視度 (0.0〜1.0)
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視度が閾値以上か
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }

    /// ピクセル座標に変換
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        let px = (self.x * width as f32) as i32;
        let py = (self.y * height as f32) as i32;
        (px, py)
    }
}

/// 33ランドマークからなる姿勢
#[derive(Debug, Clone, PartialEq)]
pub struct PoseLandmarks {
    pub landmarks: [Landmark; LandmarkIndex::COUNT],
}

impl PoseLandmarks {
    pub fn new(landmarks: [Landmark; LandmarkIndex::COUNT]) -> Self {
        Self { landmarks }
    }

    /// インデックスでランドマークを取得
    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index as usize]
    }

    pub fn get_mut(&mut self, index: LandmarkIndex) -> &mut Landmark {
        &mut self.landmarks[index as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkIndex, &Landmark)> {
        LandmarkIndex::ALL.iter().copied().zip(self.landmarks.iter())
    }
}

impl Default for PoseLandmarks {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); LandmarkIndex::COUNT],
        }
    }
}

/// 1フレーム分の検出結果。姿勢が見つからなければ空
pub type Detections = Vec<PoseLandmarks>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_index_count() {
        assert_eq!(LandmarkIndex::COUNT, 33);
        assert_eq!(LandmarkIndex::ALL.len(), LandmarkIndex::COUNT);
    }

    #[test]
    fn test_landmark_index_order() {
        for (i, index) in LandmarkIndex::ALL.iter().enumerate() {
            assert_eq!(*index as usize, i);
        }
    }

    #[test]
    fn test_landmark_index_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            index: LandmarkIndex,
        }
        let w: Wrapper = toml::from_str("index = \"left_hip\"").unwrap();
        assert_eq!(w.index, LandmarkIndex::LeftHip);
        assert!(toml::from_str::<Wrapper>("index = \"tail\"").is_err());
    }

    #[test]
    fn test_landmark_is_visible() {
        let lm = Landmark::new(0.5, 0.5, 0.0, 0.95);
        assert!(lm.is_visible(0.95));
        assert!(!lm.is_visible(0.96));
    }

    #[test]
    fn test_landmark_to_pixel() {
        let lm = Landmark::new(0.5, 0.25, 0.0, 1.0);
        assert_eq!(lm.to_pixel(640, 480), (320, 120));
    }

    #[test]
    fn test_pose_get() {
        let mut pose = PoseLandmarks::default();
        *pose.get_mut(LandmarkIndex::Nose) = Landmark::new(0.5, 0.3, -0.1, 0.9);

        let nose = pose.get(LandmarkIndex::Nose);
        assert_eq!(nose.x, 0.5);
        assert_eq!(nose.y, 0.3);
        assert_eq!(nose.visibility, 0.9);
        assert_eq!(pose.landmarks[0], *nose);
    }

    #[test]
    fn test_pose_iter_pairs_index() {
        let pose = PoseLandmarks::default();
        let (last, _) = pose.iter().last().unwrap();
        assert_eq!(last, LandmarkIndex::RightFootIndex);
        assert_eq!(pose.iter().count(), LandmarkIndex::COUNT);
    }
}
