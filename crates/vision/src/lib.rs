//! Camera discovery, probing, capture, and PPE detection runtimes
//! (`sentinel-vision`). Owns everything described as C3-C6 and C9 in the
//! design: turning a camera descriptor into a running frame + detection
//! pipeline, and serving the most recent state back out to the control plane.

pub mod capture;
pub mod detection;
pub mod detector;
pub mod discovery;
pub mod probe;
pub mod runtime;
pub mod snapshot;
pub mod supervisor;
pub mod vendor;

pub use capture::{CameraSource, CapturedFrame, FrameSource, VisionResult};
pub use detection::{DetectionResult, DetectionRuntime, DetectionRuntimeParams};
pub use detector::{BoundingBox, Detector, DetectorFactory, DetectionOutcome, PersonDetection, SimulationDetector};
pub use discovery::DiscoveredCamera;
pub use probe::{probe, ProbeError, ProbeResult};
pub use runtime::{CameraRuntime, RuntimeState, RuntimeStatus};
pub use snapshot::{SnapshotRetentionService, SnapshotStore, DEFAULT_RETENTION_DAYS};
pub use supervisor::{RuntimeSupervisor, StartParams};
