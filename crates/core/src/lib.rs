//! Core library for the LensLab webcam demo.
//!
//! Each area keeps its domain contracts separate from the infrastructure
//! that fulfils them; the hosts in `lenslab-cli` and `lenslab-desktop`
//! compose them into the motion and face-detection demos.

pub mod detection;
pub mod motion;
pub mod overlay;
pub mod pipeline;
pub mod shared;
pub mod video;
