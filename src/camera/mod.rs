pub mod capture;
pub mod recorder;

pub use capture::OpenCvCamera;
pub use recorder::VideoRecorder;
