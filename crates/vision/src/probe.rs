//! Camera Probe (C4): stateless, side-effect-free reachability/decode check
//! for a fully-specified `CameraSource`, grounded on the original
//! `camera_integration_manager.py`'s `test_camera_connection` (opens, reads a
//! handful of frames, measures fps, closes).

use crate::capture::{build_source, CameraSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

const MAX_PROBE_FRAMES: u32 = 10;
const MAX_PROBE_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub decoded: bool,
    pub resolution: Option<(u32, u32)>,
    pub measured_fps: Option<f32>,
    pub features: Vec<String>,
    pub error: Option<ProbeError>,
    pub probed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProbeError {
    Unreachable { detail: String },
    AuthenticationFailed { detail: String },
    DecodeFailed { detail: String },
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Unreachable { detail } => write!(f, "unreachable: {detail}"),
            ProbeError::AuthenticationFailed { detail } => write!(f, "authentication failed: {detail}"),
            ProbeError::DecodeFailed { detail } => write!(f, "decode failed: {detail}"),
        }
    }
}

/// Opens the stream, reads up to `MAX_PROBE_FRAMES` frames or until
/// `MAX_PROBE_DURATION` elapses, then closes. Never mutates any persisted
/// state; callers decide what to do with the result.
pub async fn probe(source: CameraSource) -> ProbeResult {
    let mut backend = build_source(source);
    let started = Instant::now();

    if let Err(e) = backend.connect().await {
        let error = classify_error(&e);
        backend.close();
        return ProbeResult {
            decoded: false,
            resolution: None,
            measured_fps: None,
            features: Vec::new(),
            error: Some(error),
            probed_at: Utc::now(),
        };
    }

    let mut frames_read = 0u32;
    let mut resolution = None;

    loop {
        if frames_read >= MAX_PROBE_FRAMES || started.elapsed() >= MAX_PROBE_DURATION {
            break;
        }
        match backend.read_frame().await {
            Ok(frame) => {
                resolution.get_or_insert((frame.width, frame.height));
                frames_read += 1;
            }
            Err(e) => {
                let error = classify_error(&e);
                backend.close();
                return ProbeResult {
                    decoded: frames_read > 0,
                    resolution,
                    measured_fps: None,
                    features: Vec::new(),
                    error: Some(error),
                    probed_at: Utc::now(),
                };
            }
        }
    }

    backend.close();
    let elapsed = started.elapsed().as_secs_f32().max(0.001);
    let measured_fps = if frames_read > 0 { Some(frames_read as f32 / elapsed) } else { None };

    ProbeResult {
        decoded: frames_read > 0,
        resolution,
        measured_fps,
        features: Vec::new(),
        error: None,
        probed_at: Utc::now(),
    }
}

fn classify_error(e: &sentinel_core::Error) -> ProbeError {
    use sentinel_core::ErrorCode;
    match e.code {
        ErrorCode::AuthenticationFailed => ProbeError::AuthenticationFailed { detail: e.message.clone() },
        ErrorCode::ExternalServiceError => ProbeError::DecodeFailed { detail: e.message.clone() },
        _ => ProbeError::Unreachable { detail: e.message.clone() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::CameraProtocol;

    #[tokio::test]
    async fn synthetic_source_probes_successfully() {
        let source = CameraSource {
            ip_address: "127.0.0.1".to_string(),
            port: 0,
            protocol: CameraProtocol::Local,
            stream_path: None,
            username: None,
            password: None,
            resolution: (320, 240),
        };
        let result = probe(source).await;
        assert!(result.decoded);
        assert_eq!(result.resolution, Some((320, 240)));
        assert!(result.error.is_none());
    }
}
