pub mod detector;
pub mod landmark;
#[cfg(feature = "desktop")]
pub mod preprocess;
pub mod source;

pub use detector::PoseDetector;
#[cfg(feature = "desktop")]
pub use detector::OnnxPoseDetector;
pub use landmark::{Detections, Landmark, LandmarkIndex, PoseLandmarks};
#[cfg(feature = "desktop")]
pub use preprocess::preprocess_for_blazepose;
pub use source::{Blocking, LandmarkSource, LiveStream, Polled};
