//! Runtime supervisor: the single authority for whether a camera is actually
//! running. Mediates start/stop so at most one `(CameraRuntime,
//! DetectionRuntime)` pair exists per `camera_id`, mirroring the teacher's
//! `DashMap`-backed tenant-pool cache.

use crate::capture::CameraSource;
use crate::detection::{DetectionResult, DetectionRuntime, DetectionRuntimeParams};
use crate::detector::DetectorFactory;
use crate::runtime::{CameraRuntime, RuntimeStatus};
use crate::snapshot::SnapshotStore;
use dashmap::DashMap;
use sentinel_core::{CameraId, CompanyId, Error, ErrorCode, RequiredPpe};
use sentinel_store::TenantStore;
use std::sync::Arc;

struct RuntimeHandle {
    company_id: CompanyId,
    camera: Arc<CameraRuntime>,
    detection: Arc<DetectionRuntime>,
}

pub struct RuntimeSupervisor {
    runtimes: DashMap<CameraId, RuntimeHandle>,
    store: Arc<TenantStore>,
    snapshots: Arc<SnapshotStore>,
    detectors: Arc<DetectorFactory>,
}

pub struct StartParams {
    pub company_id: CompanyId,
    pub camera_id: CameraId,
    pub source: CameraSource,
    pub fps: u32,
    pub max_retries: Option<u32>,
    pub sector: String,
    pub sample_every_n: u32,
    pub confidence_threshold: f32,
    pub required_ppe: RequiredPpe,
}

impl RuntimeSupervisor {
    pub fn new(store: Arc<TenantStore>, snapshots: Arc<SnapshotStore>, detectors: Arc<DetectorFactory>) -> Self {
        Self { runtimes: DashMap::new(), store, snapshots, detectors }
    }

    /// Starts both runtimes for a camera. If one is already running for this
    /// `camera_id`, it's torn down first so only one ever exists.
    pub fn start(&self, params: StartParams) -> Arc<CameraRuntime> {
        if let Some((_, existing)) = self.runtimes.remove(&params.camera_id) {
            existing.camera.stop();
            existing.detection.stop();
        }

        let camera = CameraRuntime::spawn(params.camera_id, params.source, params.fps, params.max_retries);
        let detection = DetectionRuntime::spawn(
            DetectionRuntimeParams {
                company_id: params.company_id,
                camera_id: params.camera_id,
                sector: params.sector,
                sample_every_n: params.sample_every_n,
                confidence_threshold: params.confidence_threshold,
                required_ppe: params.required_ppe,
            },
            camera.clone(),
            self.store.clone(),
            self.snapshots.clone(),
            self.detectors.clone(),
        );

        self.runtimes.insert(
            params.camera_id,
            RuntimeHandle { company_id: params.company_id, camera: camera.clone(), detection },
        );
        camera
    }

    /// Stops and removes a single camera's runtimes. No-op if not running.
    pub fn stop(&self, camera_id: CameraId) {
        if let Some((_, handle)) = self.runtimes.remove(&camera_id) {
            handle.camera.stop();
            handle.detection.stop();
        }
    }

    /// Stops every runtime owned by `company_id` (§4.8.1's tenant-wide
    /// stop-detection endpoint).
    pub fn stop_all_for_company(&self, company_id: CompanyId) -> u32 {
        let ids: Vec<CameraId> = self
            .runtimes
            .iter()
            .filter(|entry| entry.value().company_id == company_id)
            .map(|entry| *entry.key())
            .collect();
        let count = ids.len() as u32;
        for id in ids {
            self.stop(id);
        }
        count
    }

    pub fn is_running(&self, camera_id: CameraId) -> bool {
        self.runtimes.contains_key(&camera_id)
    }

    pub fn status(&self, camera_id: CameraId) -> Option<RuntimeStatus> {
        self.runtimes.get(&camera_id).map(|h| h.camera.status())
    }

    pub fn latest_frame_jpeg(&self, camera_id: CameraId) -> Option<Arc<Vec<u8>>> {
        self.runtimes.get(&camera_id).and_then(|h| h.camera.latest_frame()).map(|f| f.jpeg)
    }

    pub async fn try_pop_result(&self, camera_id: CameraId) -> Result<Option<DetectionResult>, Error> {
        let handle = self
            .runtimes
            .get(&camera_id)
            .ok_or_else(|| Error::new(ErrorCode::NotFound, "no active runtime for this camera"))?;
        Ok(handle.detection.try_pop_result().await)
    }

    pub fn running_camera_ids(&self) -> Vec<CameraId> {
        self.runtimes.iter().map(|e| *e.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_all_for_company_only_touches_that_tenant() {
        let pool = sqlx::postgres::PgPoolOptions::new().connect_lazy("postgres://localhost/irrelevant").unwrap();
        let store = Arc::new(TenantStore::new(pool));
        let snapshots = Arc::new(SnapshotStore::new(std::env::temp_dir().join("sentinel-test-snapshots")));
        let detectors = Arc::new(DetectorFactory::new());
        let supervisor = RuntimeSupervisor::new(store, snapshots, detectors);

        let company_a = CompanyId::new();
        let company_b = CompanyId::new();
        let camera_a = CameraId::new();
        let camera_b = CameraId::new();

        let source = CameraSource {
            ip_address: "127.0.0.1".into(),
            port: 0,
            protocol: sentinel_core::CameraProtocol::Local,
            stream_path: None,
            username: None,
            password: None,
            resolution: (64, 64),
        };

        supervisor.start(StartParams {
            company_id: company_a,
            camera_id: camera_a,
            source: source.clone(),
            fps: 5,
            max_retries: Some(1),
            sector: "generic".into(),
            sample_every_n: 5,
            confidence_threshold: 0.5,
            required_ppe: RequiredPpe::default(),
        });
        supervisor.start(StartParams {
            company_id: company_b,
            camera_id: camera_b,
            source,
            fps: 5,
            max_retries: Some(1),
            sector: "generic".into(),
            sample_every_n: 5,
            confidence_threshold: 0.5,
            required_ppe: RequiredPpe::default(),
        });

        assert_eq!(supervisor.stop_all_for_company(company_a), 1);
        assert!(!supervisor.is_running(camera_a));
        assert!(supervisor.is_running(camera_b));
        supervisor.stop(camera_b);
    }
}
