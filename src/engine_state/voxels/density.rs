//! # Density Field
//!
//! The scalar field from which all terrain is derived. Values below the isolevel mark
//! tunnel space, values above it mark rock.
//!
//! The field combines three terms:
//! 1. Coherent Perlin noise, shifted so its troughs fall below the isolevel and form tunnels
//! 2. A spherical containment falloff bounding the tunnel network inside a finite shell
//! 3. A min-reduction over every carve sphere, which can only remove material
//!
//! Sampling is pure: the same point and the same carve list always produce the same value.
//! Nothing is cached here; chunks cache the sampled grids.

use cgmath::{MetricSpace, Point3};
use noise::{NoiseFn, Perlin};

use crate::application_state::config::TerrainConfig;

use super::carve::CarveSphere;

/// Procedural density field with carve support.
pub struct DensityField {
    perlin: Perlin,
    tunnel_scale: f64,
    noise_gain: f64,
    noise_offset: f64,
    world_center: Point3<f64>,
    containment_radius: f64,
    containment_weight: f64,
}

impl DensityField {
    /// Builds the field described by `config`.
    pub fn new(config: &TerrainConfig) -> Self {
        let [cx, cy, cz] = config.world_center;
        Self {
            perlin: Perlin::new(config.noise_seed),
            tunnel_scale: config.tunnel_scale,
            noise_gain: config.noise_gain,
            noise_offset: config.noise_offset,
            world_center: Point3::new(cx, cy, cz),
            containment_radius: config.containment_radius,
            containment_weight: config.containment_weight,
        }
    }

    /// Raw noise value at `point`, before any mapping.
    pub fn noise(&self, point: Point3<f64>) -> f64 {
        self.perlin.get([
            point.x * self.tunnel_scale,
            point.y * self.tunnel_scale,
            point.z * self.tunnel_scale,
        ])
    }

    /// Density from noise and containment only, ignoring carves.
    pub fn base(&self, point: Point3<f64>) -> f64 {
        let tunnels = self.noise(point) * self.noise_gain - self.noise_offset;
        let containment =
            (point.distance(self.world_center) - self.containment_radius) * self.containment_weight;
        tunnels + containment
    }

    /// Full density at `point` with the given carves applied.
    pub fn sample(&self, point: Point3<f64>, carves: &[CarveSphere]) -> f64 {
        carves
            .iter()
            .map(|sphere| sphere.signed_distance(point))
            .fold(self.base(point), f64::min)
    }
}
