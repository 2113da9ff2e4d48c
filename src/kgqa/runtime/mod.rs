pub mod engine;
pub mod expansion;
pub mod extraction;
pub mod ranking;
pub mod resolution;

pub use engine::QaEngine;
