pub mod extractor;
pub mod geometry;
pub mod report;

pub use extractor::{ExtractorConfig, FrameMetricExtractor, JointTriple, Step};
pub use geometry::{joint_angle, velocity, SampledPoint, Velocity};
pub use report::MetricReport;
