use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::metrics::extractor::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_SAMPLE_INTERVAL};
use crate::pose::LandmarkIndex;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    /// カメラ番号
    #[serde(default)]
    pub index: i32,
    /// カメラの代わりに読む動画ファイル
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// 左右反転 (鏡像表示)
    #[serde(default = "default_true")]
    pub mirror: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// 毎フレーム同期で推論
    #[default]
    Sync,
    /// 推論を別スレッドで行い、最新結果を使う
    LiveStream,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// 姿勢ありと判定する最小スコア
    #[serde(default = "default_min_pose_confidence")]
    pub min_pose_confidence: f32,
    #[serde(default)]
    pub mode: DetectionMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    /// サンプリング間にスキップする検出フレーム数 (0 で毎フレーム)
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// 速度を求めるランドマーク
    #[serde(default = "default_landmark")]
    pub tracked: LandmarkIndex,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    /// 可視度を判定するランドマーク
    #[serde(default = "default_landmark")]
    pub reference: LandmarkIndex,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// 標準出力に表示
    #[serde(default = "default_true")]
    pub console: bool,
    /// 表示前に画面をクリア
    #[serde(default = "default_true")]
    pub clear_console: bool,
    /// ログにも出力
    #[serde(default)]
    pub log: bool,
    /// 映像に重ねて表示
    #[serde(default = "default_true")]
    pub overlay: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// プレビューウィンドウを開く
    #[serde(default = "default_true")]
    pub window: bool,
    #[serde(default = "default_title")]
    pub title: String,
    /// 録画先 (mp4)
    #[serde(default)]
    pub record: Option<String>,
    #[serde(default = "default_fps")]
    pub record_fps: u32,
}

fn default_true() -> bool { true }
fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 480 }
fn default_fps() -> u32 { 30 }
fn default_model_path() -> String { "models/pose_landmark_full.onnx".to_string() }
fn default_min_pose_confidence() -> f32 { 0.5 }
fn default_interval() -> u32 { DEFAULT_SAMPLE_INTERVAL }
fn default_landmark() -> LandmarkIndex { LandmarkIndex::Nose }
fn default_threshold() -> f32 { DEFAULT_CONFIDENCE_THRESHOLD }
fn default_title() -> String { "Pose Metrics".to_string() }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            file: None,
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            mirror: default_true(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            min_pose_confidence: default_min_pose_confidence(),
            mode: DetectionMode::default(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            tracked: default_landmark(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            reference: default_landmark(),
            threshold: default_threshold(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            console: true,
            clear_console: true,
            log: false,
            overlay: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            window: true,
            title: default_title(),
            record: None,
            record_fps: default_fps(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// ファイルがない・読めない場合はデフォルト値を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("{} not found, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.gate.threshold),
            "gate.threshold must be within 0.0..=1.0, got {}",
            self.gate.threshold
        );
        ensure!(
            (0.0..=1.0).contains(&self.detector.min_pose_confidence),
            "detector.min_pose_confidence must be within 0.0..=1.0, got {}",
            self.detector.min_pose_confidence
        );
        ensure!(self.output.record_fps > 0, "output.record_fps must be positive");
        Ok(())
    }
}
