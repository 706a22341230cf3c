pub mod config;
pub mod error;
pub mod monitor;
pub mod sink;
pub mod stats;
pub mod target;

// Re-export the pieces most callers touch
pub use config::{FailurePolicy, MonitorConfig};
pub use error::{CallError, MonitorError};
pub use monitor::{AopMonitor, Applicator, Emission, Installation, WatchSpec};
pub use sink::{ChannelSink, RecordingSink, Sink, TracingSink};
pub use target::{Class, Instance, Object, Prototype, Receiver, Target, TargetKind, Value};
