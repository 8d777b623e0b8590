//! Detection Runtime (C6): samples the frame slot published by a
//! `CameraRuntime`, runs a `Detector`, annotates the frame, tracks
//! compliant->non-compliant transitions per `track_id`, and feeds both a
//! bounded result queue (for polling clients) and the tenant store (for the
//! durable `Detection`/`Violation` log).

use crate::capture::CapturedFrame;
use crate::detector::{Detector, DetectorFactory, PersonDetection};
use crate::runtime::CameraRuntime;
use crate::snapshot::SnapshotStore;
use chrono::{DateTime, Utc};
use image::{Rgb, RgbImage};
use sentinel_core::{CameraId, CompanyId, PpeClass, RequiredPpe};
use sentinel_store::{NewDetection, NewViolation, TenantStore};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const RESULT_QUEUE_CAPACITY: usize = 10;
const IDLE_POLL: Duration = Duration::from_millis(100);
const TRACK_EVICT_AFTER_SAMPLES: u32 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub timestamp: DateTime<Utc>,
    pub camera_id: CameraId,
    pub total_people: i32,
    pub compliant_people: i32,
    pub compliance_rate: f32,
    pub people: Vec<PersonDetection>,
    pub simulated: bool,
}

/// Bounded, drop-oldest result queue a caller polls via `try_pop`.
pub struct ResultQueue {
    inner: Mutex<VecDeque<DetectionResult>>,
}

impl ResultQueue {
    fn new() -> Self {
        Self { inner: Mutex::new(VecDeque::with_capacity(RESULT_QUEUE_CAPACITY)) }
    }

    async fn offer(&self, result: DetectionResult) {
        let mut q = self.inner.lock().await;
        if q.len() >= RESULT_QUEUE_CAPACITY {
            q.pop_front();
        }
        q.push_back(result);
    }

    /// Never blocks; returns `None` if the queue is empty (§4.9).
    pub async fn try_pop(&self) -> Option<DetectionResult> {
        self.inner.lock().await.pop_front()
    }

    async fn drain(&self) {
        self.inner.lock().await.clear();
    }
}

pub struct DetectionRuntimeParams {
    pub company_id: CompanyId,
    pub camera_id: CameraId,
    pub sector: String,
    pub sample_every_n: u32,
    pub confidence_threshold: f32,
    pub required_ppe: RequiredPpe,
}

pub struct DetectionRuntime {
    cancel: CancellationToken,
    queue: Arc<ResultQueue>,
}

impl DetectionRuntime {
    pub fn spawn(
        params: DetectionRuntimeParams,
        camera_runtime: Arc<CameraRuntime>,
        store: Arc<TenantStore>,
        snapshots: Arc<SnapshotStore>,
        factory: Arc<DetectorFactory>,
    ) -> Arc<Self> {
        let cancel = CancellationToken::new();
        let queue = Arc::new(ResultQueue::new());

        tokio::spawn(run_loop(
            params,
            camera_runtime,
            store,
            snapshots,
            factory,
            cancel.clone(),
            queue.clone(),
        ));

        Arc::new(Self { cancel, queue })
    }

    pub async fn try_pop_result(&self) -> Option<DetectionResult> {
        self.queue.try_pop().await
    }

    /// Finishes the current iteration and drains the queue, per §4.6's
    /// cancellation contract.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn run_loop(
    params: DetectionRuntimeParams,
    camera_runtime: Arc<CameraRuntime>,
    store: Arc<TenantStore>,
    snapshots: Arc<SnapshotStore>,
    factory: Arc<DetectorFactory>,
    cancel: CancellationToken,
    queue: Arc<ResultQueue>,
) {
    let detector = factory.create(&params.sector);
    let sample_every_n = params.sample_every_n.max(1);
    let mut frame_count: u64 = 0;
    let mut track_states: HashMap<String, TrackState> = HashMap::new();
    let mut last_seen_frame: Option<DateTime<Utc>> = None;

    loop {
        if cancel.is_cancelled() {
            queue.drain().await;
            return;
        }

        let Some(frame) = camera_runtime.latest_frame() else {
            if wait_or_cancel(IDLE_POLL, &cancel).await {
                queue.drain().await;
                return;
            }
            continue;
        };

        // Skip frames we've already sampled.
        if last_seen_frame == Some(frame.captured_at) {
            if wait_or_cancel(IDLE_POLL, &cancel).await {
                queue.drain().await;
                return;
            }
            continue;
        }
        last_seen_frame = Some(frame.captured_at);

        frame_count += 1;
        if frame_count % sample_every_n as u64 != 0 {
            continue;
        }

        let outcome = detector.detect(
            frame.width,
            frame.height,
            &params.required_ppe.required,
            params.confidence_threshold,
        );

        evict_stale_tracks(&mut track_states, TRACK_EVICT_AFTER_SAMPLES);

        for person in &outcome.people {
            let state = track_states.entry(person.track_id.clone()).or_insert(TrackState {
                last_known_compliant: None,
                samples_since_seen: 0,
            });
            state.samples_since_seen = 0;

            let newly_non_compliant = !person.compliant && state.last_known_compliant != Some(false);
            state.last_known_compliant = Some(person.compliant);

            if newly_non_compliant {
                handle_violation(&params, &store, &snapshots, &frame, person).await;
            }
        }

        let confidence_score = params.confidence_threshold;
        if let Err(e) = store
            .record_detection(NewDetection {
                company_id: params.company_id.0,
                camera_id: params.camera_id.0,
                total_people: outcome.total_people,
                compliant_people: outcome.compliant_people,
                violation_people: outcome.total_people - outcome.compliant_people,
                compliance_rate: outcome.compliance_rate,
                confidence_score,
                image_path: None,
                detection_data: serde_json::json!({ "simulated": outcome.simulated }),
                track_id: outcome.people.first().map(|p| p.track_id.clone()),
            })
            .await
        {
            warn!(camera_id = %params.camera_id, error = %e, "failed to record detection");
        }

        let annotated_rgb = annotate_frame(&frame, &outcome.people, outcome.simulated);
        match crate::capture::encode_jpeg(&annotated_rgb) {
            Ok(jpeg) => camera_runtime.publish_annotated_frame(CapturedFrame {
                jpeg: Arc::new(jpeg),
                width: annotated_rgb.width(),
                height: annotated_rgb.height(),
                captured_at: frame.captured_at,
            }),
            Err(e) => warn!(camera_id = %params.camera_id, error = %e, "failed to encode annotated frame"),
        }

        queue
            .offer(DetectionResult {
                timestamp: Utc::now(),
                camera_id: params.camera_id,
                total_people: outcome.total_people,
                compliant_people: outcome.compliant_people,
                compliance_rate: outcome.compliance_rate,
                people: outcome.people,
                simulated: outcome.simulated,
            })
            .await;

        if wait_or_cancel(Duration::from_millis(5), &cancel).await {
            queue.drain().await;
            return;
        }
    }
}

struct TrackState {
    last_known_compliant: Option<bool>,
    samples_since_seen: u32,
}

fn evict_stale_tracks(tracks: &mut HashMap<String, TrackState>, max_age: u32) {
    for state in tracks.values_mut() {
        state.samples_since_seen += 1;
    }
    tracks.retain(|_, state| state.samples_since_seen <= max_age);
}

async fn handle_violation(
    params: &DetectionRuntimeParams,
    store: &Arc<TenantStore>,
    snapshots: &Arc<SnapshotStore>,
    frame: &CapturedFrame,
    person: &PersonDetection,
) {
    let Some(missing) = person.missing.first().copied() else {
        return;
    };
    let violation_type = missing.violation_type();

    let image_path = match snapshots
        .save(&frame.jpeg, params.company_id, params.camera_id, &person.track_id, &violation_type, &person.bbox)
        .await
    {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(camera_id = %params.camera_id, error = %e, "failed to save violation snapshot");
            None
        }
    };

    let severity = severity_for(&person.missing);

    match store
        .record_violation(NewViolation {
            company_id: params.company_id.0,
            camera_id: params.camera_id.0,
            user_id: None,
            violation_type,
            missing_ppe: person.missing.clone(),
            severity,
            penalty_amount: 0.0,
            image_path,
        })
        .await
    {
        Ok(id) => info!(violation_id = %id, camera_id = %params.camera_id, track_id = %person.track_id, "violation recorded"),
        Err(e) => warn!(camera_id = %params.camera_id, error = %e, "failed to record violation"),
    }
}

/// More missing items escalates severity; a single missing item of any class
/// is `low`, two is `medium`, three or more is `high`.
fn severity_for(missing: &[PpeClass]) -> sentinel_core::ViolationSeverity {
    use sentinel_core::ViolationSeverity::*;
    match missing.len() {
        0 | 1 => Low,
        2 => Medium,
        _ => High,
    }
}

/// Draws bounding boxes, per-person labels, and a header summary onto the
/// frame (§4.6 step 4). Box edges only — no glyph rendering, for the same
/// reason `snapshot.rs` renders a solid banner rather than literal text (no
/// font-rasterization crate in this workspace).
fn annotate_frame(frame: &CapturedFrame, people: &[PersonDetection], simulated: bool) -> RgbImage {
    let img = image::load_from_memory(&frame.jpeg).map(|i| i.to_rgb8()).unwrap_or_else(|_| {
        image::ImageBuffer::from_pixel(frame.width, frame.height, Rgb([0, 0, 0]))
    });
    let mut out = img;
    for person in people {
        let color = if person.compliant { Rgb([0, 200, 0]) } else { Rgb([220, 0, 0]) };
        draw_box_outline(&mut out, &person.bbox, color);
    }
    if simulated {
        draw_box_outline(
            &mut out,
            &crate::detector::BoundingBox { x: 0, y: 0, width: out.width().min(120), height: 8 },
            Rgb([255, 200, 0]),
        );
    }
    out
}

fn draw_box_outline(img: &mut RgbImage, bbox: &crate::detector::BoundingBox, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let x2 = (bbox.x + bbox.width).min(w.saturating_sub(1));
    let y2 = (bbox.y + bbox.height).min(h.saturating_sub(1));
    let x1 = bbox.x.min(x2);
    let y1 = bbox.y.min(y2);

    for x in x1..=x2 {
        img.put_pixel(x, y1, color);
        img.put_pixel(x, y2, color);
    }
    for y in y1..=y2 {
        img.put_pixel(x1, y, color);
        img.put_pixel(x2, y, color);
    }
}

async fn wait_or_cancel(dur: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(dur) => false,
        _ = cancel.cancelled() => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_escalates_with_missing_count() {
        assert_eq!(severity_for(&[PpeClass::Helmet]), sentinel_core::ViolationSeverity::Low);
        assert_eq!(severity_for(&[PpeClass::Helmet, PpeClass::SafetyVest]), sentinel_core::ViolationSeverity::Medium);
        assert_eq!(
            severity_for(&[PpeClass::Helmet, PpeClass::SafetyVest, PpeClass::Gloves]),
            sentinel_core::ViolationSeverity::High
        );
    }

    #[test]
    fn box_outline_stays_in_bounds() {
        let mut img: RgbImage = image::ImageBuffer::from_pixel(10, 10, Rgb([0, 0, 0]));
        let bbox = crate::detector::BoundingBox { x: 5, y: 5, width: 20, height: 20 };
        draw_box_outline(&mut img, &bbox, Rgb([255, 0, 0]));
        assert_eq!(*img.get_pixel(9, 9), Rgb([255, 0, 0]));
    }
}
