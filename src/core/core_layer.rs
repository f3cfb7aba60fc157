// The core module contains all domain logic.
// Nothing in here speaks HTTP or JSON-RPC; remote services sit behind traits.

#[path = "charts/mod.rs"]
pub mod charts;

#[path = "slides/mod.rs"]
pub mod slides;

#[path = "sample_data/sample_data_service.rs"]
pub mod sample_data;
