//! # Carve Ledger
//!
//! The ordered history of destructive edits applied to the terrain.
//!
//! Carve spheres only ever remove material. Their effect on the density field is a
//! min-reduction and therefore independent of order, but insertion order is kept so the
//! persisted list round-trips element for element. The ledger has no removal operation.

use cgmath::{MetricSpace, Point3};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    application_state::persistence::{Storage, CARVING_SPHERES_KEY},
    core::Result,
};

/// A world-space sphere of removed material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarveSphere {
    /// Center x
    pub x: f64,
    /// Center y
    pub y: f64,
    /// Center z
    pub z: f64,
    /// Radius
    pub r: f64,
}

impl CarveSphere {
    /// Creates a sphere centered at `center`.
    pub fn new(center: Point3<f64>, r: f64) -> Self {
        Self {
            x: center.x,
            y: center.y,
            z: center.z,
            r,
        }
    }

    /// Center of the sphere.
    pub fn center(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Signed distance from `point` to the sphere surface, negative inside.
    pub fn signed_distance(&self, point: Point3<f64>) -> f64 {
        point.distance(self.center()) - self.r
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.r.is_finite()
    }
}

/// Append-only list of carve spheres, persisted write-through.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CarveLedger {
    spheres: Vec<CarveSphere>,
}

impl CarveLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the persisted list, replacing the current contents.
    ///
    /// An absent record yields an empty ledger. Unreadable or malformed records are logged
    /// and also yield an empty ledger, so a corrupt save never prevents startup.
    pub fn load(&mut self, storage: &dyn Storage) {
        self.spheres = match storage.load(CARVING_SPHERES_KEY) {
            Ok(Some(text)) => Self::decode(&text),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Could not read {CARVING_SPHERES_KEY}, starting without carves: {err}");
                Vec::new()
            }
        };
        info!("Restored {} carve spheres", self.spheres.len());
    }

    fn decode(text: &str) -> Vec<CarveSphere> {
        match serde_json::from_str::<Option<Vec<CarveSphere>>>(text) {
            Ok(Some(spheres)) if spheres.iter().all(CarveSphere::is_finite) => spheres,
            Ok(Some(_)) => {
                warn!("Ignoring {CARVING_SPHERES_KEY} containing non-finite values");
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Corrupt {CARVING_SPHERES_KEY} record, starting without carves: {err}");
                Vec::new()
            }
        }
    }

    /// Adds one sphere after all existing ones.
    pub fn append(&mut self, sphere: CarveSphere) {
        self.spheres.push(sphere);
    }

    /// All spheres in insertion order.
    pub fn all(&self) -> &[CarveSphere] {
        &self.spheres
    }

    /// Number of recorded spheres.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Whether no carve has been recorded.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Serializes the full list to storage.
    pub fn persist(&self, storage: &dyn Storage) -> Result<()> {
        let text = serde_json::to_string(&self.spheres)?;
        storage.store(CARVING_SPHERES_KEY, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_state::persistence::MemoryStorage;

    fn sample_ledger() -> CarveLedger {
        let mut ledger = CarveLedger::new();
        ledger.append(CarveSphere::new(Point3::new(1.0, 2.0, 3.0), 2.5));
        ledger.append(CarveSphere::new(Point3::new(-0.1, 1e-7, 12345.678), 0.5));
        ledger.append(CarveSphere::new(Point3::new(1.0, 2.0, 3.0), 2.5));
        ledger
    }

    #[test]
    fn persist_then_load_preserves_order_and_fields() {
        let storage = MemoryStorage::new();
        let ledger = sample_ledger();
        ledger.persist(&storage).unwrap();

        let mut restored = CarveLedger::new();
        restored.load(&storage);
        assert_eq!(restored.all(), ledger.all());
    }

    #[test]
    fn load_replaces_existing_contents() {
        let storage = MemoryStorage::new();
        CarveLedger::new().persist(&storage).unwrap();

        let mut ledger = sample_ledger();
        ledger.load(&storage);
        assert!(ledger.is_empty());
    }

    #[test]
    fn record_format_matches_field_names() {
        let storage = MemoryStorage::new();
        let mut ledger = CarveLedger::new();
        ledger.append(CarveSphere::new(Point3::new(0.0, 0.5, 4.0), 2.5));
        ledger.persist(&storage).unwrap();
        assert_eq!(
            storage.load(CARVING_SPHERES_KEY).unwrap().unwrap(),
            r#"[{"x":0.0,"y":0.5,"z":4.0,"r":2.5}]"#
        );
    }

    #[test]
    fn corrupt_records_fall_back_to_empty() {
        let storage = MemoryStorage::new();
        for corrupt in ["[{\"x\":1}]", "not json", "{\"x\":1,\"y\":2,\"z\":3,\"r\":4}", "null"] {
            storage.store(CARVING_SPHERES_KEY, corrupt).unwrap();
            let mut ledger = sample_ledger();
            ledger.load(&storage);
            assert!(ledger.is_empty(), "record {corrupt:?} should be discarded");
        }
    }

    #[test]
    fn missing_record_is_empty() {
        let mut ledger = CarveLedger::new();
        ledger.load(&MemoryStorage::new());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn signed_distance_is_negative_inside() {
        let sphere = CarveSphere::new(Point3::new(0.0, 0.0, 4.0), 2.5);
        assert_eq!(sphere.signed_distance(Point3::new(0.0, 0.0, 4.0)), -2.5);
        assert!(sphere.signed_distance(Point3::new(0.0, 0.0, 10.0)) > 0.0);
    }
}
