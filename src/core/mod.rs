pub mod analyzer;
pub mod engine;
pub mod instruments;
pub mod midi;
pub mod router;
pub mod synth;
pub mod voice;

pub use engine::VisualizationEngine;
pub use router::EventRouter;
