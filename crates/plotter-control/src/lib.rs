//! Pure control logic for the plotter panel
//!
//! Everything in this crate is independent of the browser: coordinate
//! transforms, boundary policy, target tracking, the metadata cache, the
//! endpoint configuration, and the preview backoff schedule. The WASM bridge
//! drives these from event handlers and async tasks.

pub mod boundary;
pub mod endpoint;
pub mod mapper;
pub mod metadata;
pub mod schedule;
pub mod target;

pub use boundary::BoundaryValidator;
pub use endpoint::{Endpoint, EndpointConfig};
pub use mapper::CoordinateMapper;
pub use metadata::MetadataCache;
pub use schedule::{LoopEpoch, PollOutcome, PollSchedule};
pub use target::TargetTracker;
