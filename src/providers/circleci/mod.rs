mod client;
mod types;

pub use client::{BuildApi, CircleClient};
pub use types::{Action, Build, BuildDetails, Project, Step, TestCase, TestResults};
