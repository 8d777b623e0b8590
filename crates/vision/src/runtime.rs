//! Camera Runtime (C5): the lifecycle state machine that owns one camera's
//! `FrameSource`, advances it through INIT -> CONNECTING -> RUNNING, and
//! drops back to RECONNECTING on transient failures with capped exponential
//! backoff, matching the original `camera_integration_manager.py`'s
//! `_connection_loop` retry shape.

use crate::capture::{build_source, CameraSource, CapturedFrame, FrameSource};
use chrono::{DateTime, Utc};
use sentinel_core::CameraId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const BASE_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeState {
    Init,
    Connecting,
    Running,
    Reconnecting,
    Failed,
    Stopped,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RuntimeStatus {
    pub state: RuntimeState,
    pub consecutive_failures: u32,
    pub last_frame_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub frames_captured: u64,
    pub connection_drops: u64,
}

/// Single-slot frame buffer shared between the runtime and its readers
/// (detection runtime, MJPEG handler). Only the latest frame is ever kept,
/// matching the spec's "most recent frame, dropping stale ones" requirement.
pub struct FrameSlot {
    tx: watch::Sender<Option<CapturedFrame>>,
}

impl FrameSlot {
    fn new() -> (Self, watch::Sender<Option<CapturedFrame>>, watch::Receiver<Option<CapturedFrame>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx: tx.clone() }, tx, rx)
    }

    fn publish(&self, frame: CapturedFrame) {
        let _ = self.tx.send(Some(frame));
    }
}

/// Drives one camera's `FrameSource` on a background task until cancelled.
pub struct CameraRuntime {
    camera_id: CameraId,
    cancel: CancellationToken,
    state_tx: watch::Sender<RuntimeStatus>,
    frame_tx: watch::Sender<Option<CapturedFrame>>,
    frame_rx: watch::Receiver<Option<CapturedFrame>>,
    max_retries: u32,
}

impl CameraRuntime {
    /// Spawns the connection/read loop and returns a handle the supervisor
    /// keeps in its map. `max_retries` is the spec's per-camera override of
    /// the default (3).
    pub fn spawn(camera_id: CameraId, source: CameraSource, fps: u32, max_retries: Option<u32>) -> Arc<Self> {
        let cancel = CancellationToken::new();
        let (state_tx, _state_rx) = watch::channel(RuntimeStatus {
            state: RuntimeState::Init,
            consecutive_failures: 0,
            last_frame_at: None,
            last_error: None,
            frames_captured: 0,
            connection_drops: 0,
        });
        let (slot, frame_tx, frame_rx) = FrameSlot::new();
        let max_retries = max_retries.unwrap_or(DEFAULT_MAX_RETRIES);

        let runtime = Arc::new(Self {
            camera_id,
            cancel: cancel.clone(),
            state_tx: state_tx.clone(),
            frame_tx,
            frame_rx,
            max_retries,
        });

        tokio::spawn(run_loop(camera_id, source, cancel, state_tx, slot, max_retries, fps.max(1)));

        runtime
    }

    /// Overwrites the slot with the detection runtime's annotated frame
    /// (§4.6 step 4), replacing the raw one C5 last published.
    pub fn publish_annotated_frame(&self, frame: CapturedFrame) {
        let _ = self.frame_tx.send(Some(frame));
    }

    pub fn camera_id(&self) -> CameraId {
        self.camera_id
    }

    pub fn status(&self) -> RuntimeStatus {
        self.state_tx.borrow().clone()
    }

    pub fn latest_frame(&self) -> Option<CapturedFrame> {
        self.frame_rx.borrow().clone()
    }

    /// A clone of the watch receiver, so a caller can `.changed().await` on
    /// new frames rather than polling `latest_frame`.
    pub fn subscribe(&self) -> watch::Receiver<Option<CapturedFrame>> {
        self.frame_rx.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.status().state, RuntimeState::Stopped | RuntimeState::Failed)
    }
}

async fn run_loop(
    camera_id: CameraId,
    source: CameraSource,
    cancel: CancellationToken,
    state_tx: watch::Sender<RuntimeStatus>,
    slot: FrameSlot,
    max_retries: u32,
    fps: u32,
) {
    let mut backend = build_source(source);
    let mut consecutive_failures: u32 = 0;
    let rate_shape = Duration::from_millis((1000 / fps as u64).max(10));

    set_state(&state_tx, RuntimeState::Connecting, consecutive_failures, None, false, false);

    // Outer loop: CONNECTING/RECONNECTING. Connects exactly once per entry,
    // then hands off to the inner RUNNING loop, which only reads frames
    // (§4.5: "RUNNING" never reconnects itself, it drops to RECONNECTING).
    'reconnect: loop {
        if cancel.is_cancelled() {
            set_state(&state_tx, RuntimeState::Stopped, consecutive_failures, None, false, false);
            backend.close();
            return;
        }

        if let Err(e) = backend.connect().await {
            consecutive_failures += 1;
            warn!(%camera_id, attempt = consecutive_failures, error = %e, "camera connect failed");
            if consecutive_failures > max_retries {
                set_state(&state_tx, RuntimeState::Failed, consecutive_failures, Some(e.to_string()), false, true);
                backend.close();
                return;
            }
            set_state(&state_tx, RuntimeState::Reconnecting, consecutive_failures, Some(e.to_string()), false, true);
            if wait_or_cancel(backoff_for(consecutive_failures), &cancel).await {
                set_state(&state_tx, RuntimeState::Stopped, consecutive_failures, None, false, false);
                return;
            }
            continue 'reconnect;
        }

        set_state(&state_tx, RuntimeState::Running, 0, None, false, false);
        consecutive_failures = 0;

        // Inner loop: RUNNING. Reads frames on a fixed cadence until a read
        // fails, at which point it breaks back out to reconnect.
        loop {
            if cancel.is_cancelled() {
                set_state(&state_tx, RuntimeState::Stopped, consecutive_failures, None, false, false);
                backend.close();
                return;
            }

            match backend.read_frame().await {
                Ok(frame) => {
                    slot.publish(frame);
                    set_state(&state_tx, RuntimeState::Running, 0, None, true, false);
                    consecutive_failures = 0;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(%camera_id, attempt = consecutive_failures, error = %e, "camera frame read failed");
                    if consecutive_failures > max_retries {
                        set_state(&state_tx, RuntimeState::Failed, consecutive_failures, Some(e.to_string()), false, true);
                        backend.close();
                        return;
                    }
                    set_state(&state_tx, RuntimeState::Reconnecting, consecutive_failures, Some(e.to_string()), false, true);
                    if wait_or_cancel(backoff_for(consecutive_failures), &cancel).await {
                        set_state(&state_tx, RuntimeState::Stopped, consecutive_failures, None, false, false);
                        return;
                    }
                    continue 'reconnect;
                }
            }

            if wait_or_cancel(rate_shape, &cancel).await {
                set_state(&state_tx, RuntimeState::Stopped, consecutive_failures, None, false, false);
                backend.close();
                return;
            }
        }
    }
}

fn backoff_for(attempt: u32) -> Duration {
    let scaled = BASE_BACKOFF.saturating_mul(1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX));
    scaled.min(MAX_BACKOFF)
}

/// Returns true if cancelled while waiting.
async fn wait_or_cancel(dur: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(dur) => false,
        _ = cancel.cancelled() => true,
    }
}

fn set_state(
    tx: &watch::Sender<RuntimeStatus>,
    state: RuntimeState,
    consecutive_failures: u32,
    last_error: Option<String>,
    frame_captured: bool,
    connection_dropped: bool,
) {
    let prev = tx.borrow().clone();
    let last_frame_at = if frame_captured { Some(Utc::now()) } else { prev.last_frame_at };
    let frames_captured = prev.frames_captured + if frame_captured { 1 } else { 0 };
    let connection_drops = prev.connection_drops + if connection_dropped { 1 } else { 0 };
    let _ = tx.send(RuntimeStatus { state, consecutive_failures, last_frame_at, last_error, frames_captured, connection_drops });
    if state == RuntimeState::Running {
        info!(?state, "camera runtime state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(backoff_for(1), Duration::from_secs(2));
        assert_eq!(backoff_for(2), Duration::from_secs(4));
        assert_eq!(backoff_for(3), Duration::from_secs(8));
        assert_eq!(backoff_for(10), MAX_BACKOFF);
    }
}
