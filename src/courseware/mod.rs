pub mod acquirer;
pub mod artifacts;

pub use acquirer::{AcquireError, AcquisitionResult, CoursewareAcquirer};
