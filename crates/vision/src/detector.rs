//! The `Detector` interface (consumed, not defined — §1, §6). The actual PPE
//! model is an external collaborator; this module only describes the shape
//! callers rely on, a `DetectorFactory` that resolves one by sector (per
//! DESIGN NOTES' "Detector variability"), and a `Simulation` fallback so the
//! control plane can start a camera even when no real detector is wired in.

use rand::Rng;
use sentinel_core::PpeClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetection {
    pub track_id: String,
    pub bbox: BoundingBox,
    pub compliant: bool,
    pub missing: Vec<PpeClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionOutcome {
    pub people: Vec<PersonDetection>,
    pub total_people: i32,
    pub compliant_people: i32,
    pub compliance_rate: f32,
    pub simulated: bool,
}

/// Trait object returned by `DetectorFactory`. Implementations are external
/// to this crate (the model itself is out of scope per §1); `Simulation`
/// below is the one concrete implementation this crate owns.
pub trait Detector: Send + Sync {
    fn detect(
        &self,
        frame_width: u32,
        frame_height: u32,
        required_ppe: &[PpeClass],
        confidence_threshold: f32,
    ) -> DetectionOutcome;

    fn is_simulation(&self) -> bool {
        false
    }
}

/// Synthetic detector used when no real `Detector` is configured for a
/// sector, or when construction fails. Produces a plausible-looking result
/// with compliance randomized in [60,95]% as specified in §4.6.
pub struct SimulationDetector {
    track_counter: std::sync::atomic::AtomicU32,
}

impl Default for SimulationDetector {
    fn default() -> Self {
        Self { track_counter: std::sync::atomic::AtomicU32::new(0) }
    }
}

impl Detector for SimulationDetector {
    fn detect(
        &self,
        frame_width: u32,
        frame_height: u32,
        required_ppe: &[PpeClass],
        _confidence_threshold: f32,
    ) -> DetectionOutcome {
        let mut rng = rand::thread_rng();
        let total_people = rng.gen_range(0..=3);
        let mut people = Vec::with_capacity(total_people as usize);
        let mut compliant_people = 0;

        for i in 0..total_people {
            let track_id = format!(
                "SIM_{}",
                self.track_counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed).wrapping_add(i as u32)
            );
            let compliance_rate: f32 = rng.gen_range(0.60..=0.95);
            let compliant = rng.gen_bool(compliance_rate as f64);
            let missing = if compliant || required_ppe.is_empty() {
                Vec::new()
            } else {
                vec![required_ppe[rng.gen_range(0..required_ppe.len())]]
            };
            if compliant {
                compliant_people += 1;
            }

            let bw = frame_width / 4;
            let bh = frame_height / 2;
            people.push(PersonDetection {
                track_id,
                bbox: BoundingBox {
                    x: rng.gen_range(0..frame_width.saturating_sub(bw).max(1)),
                    y: rng.gen_range(0..frame_height.saturating_sub(bh).max(1)),
                    width: bw.max(1),
                    height: bh.max(1),
                },
                compliant,
                missing,
            });
        }

        let compliance_rate = if total_people == 0 { 100.0 } else { (compliant_people as f32 / total_people as f32) * 100.0 };

        DetectionOutcome {
            people,
            total_people,
            compliant_people,
            compliance_rate,
            simulated: true,
        }
    }

    fn is_simulation(&self) -> bool {
        true
    }
}

/// Resolves a `Detector` implementation by sector string. No real
/// implementation ships in this crate (the model is external per §1); every
/// sector currently resolves to `SimulationDetector`, matching the control
/// plane's requirement that a camera can always be started.
#[derive(Default)]
pub struct DetectorFactory {
    registry: HashMap<String, ()>,
}

impl DetectorFactory {
    pub fn new() -> Self {
        Self { registry: HashMap::new() }
    }

    pub fn register_sector(&mut self, sector: impl Into<String>) {
        self.registry.insert(sector.into(), ());
    }

    pub fn create(&self, _sector: &str) -> Box<dyn Detector> {
        Box::new(SimulationDetector::default())
    }
}
