//! Thin adapter exposing `Simulation` operations to an external driver via
//! callbacks (spec §2 "Embedding interface", §6).

use std::path::Path;

use crate::config::ConfigError;
use crate::particle::Particle;
use crate::random::RandomSource;
use crate::simulation::{ParticleIndex, Simulation};

/// The operations an external trajectory simulator recognises. Invoked
/// only when a `Simulation` is embedded — a standalone run has no
/// callback bundle at all (spec §3, §9).
pub trait EmbeddingCallbacks {
    fn update_ion_mass(&mut self, mass: f64);
    fn update_ion_charge(&mut self, charge: f64);
    fn update_ion_color(&mut self, substance_index: i64);
}

/// Wraps one `Simulation` and forwards the operations an external driver
/// is expected to call each step: `add_particle`, `update_position`,
/// `react`, and `advance_timestep`. Holds no state of its own beyond the
/// `Simulation` — it exists only to give the embedding seam its own name
/// in the public API (spec §6).
pub struct Embedding {
    simulation: Simulation,
}

impl Embedding {
    /// Reads `path` and wires `callbacks` in from the start — an
    /// embedding without callbacks configured would silently drop every
    /// `update_ion_*` effect, which is legal but rarely what an embedder
    /// wants.
    pub fn from_config_file(
        path: &Path,
        rate_constant_conversion_factor: f64,
        random: Box<dyn RandomSource>,
        callbacks: Box<dyn EmbeddingCallbacks>,
    ) -> Result<Self, ConfigError> {
        let parsed = crate::config::ConfigParser::parse(path, rate_constant_conversion_factor)?;
        Ok(Embedding { simulation: Simulation::new(parsed, random, Some(callbacks), true) })
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn add_particle(&mut self, particle: Particle, index: ParticleIndex) {
        self.simulation.add_particle(particle, index);
    }

    /// Retires `index` entirely: destroys its particle and drops the
    /// `ion_map` entry. For a driver that wants to remove a particle
    /// outside the reaction path (e.g. it left the domain), not via
    /// `react` (spec §3, §4.7).
    pub fn remove_particle(&mut self, index: ParticleIndex) {
        if let Some(handle) = self.simulation.handle_of(index) {
            self.simulation.destroy_particle(handle);
        }
        self.simulation.remove_p(index);
    }

    pub fn update_position(&mut self, index: ParticleIndex, x: f64, y: f64, z: f64) {
        self.simulation.update_position(index, x, y, z);
    }

    pub fn react(&mut self, index: ParticleIndex, ke: f64, dt: f64) {
        self.simulation.react(index, ke, dt);
    }

    pub fn advance_timestep(&mut self, dt: f64) {
        self.simulation.advance_timestep(dt);
    }

    /// Reports `EngineWarning::NonGroupedFly` (spec §7): an external driver
    /// signalling that its own statistics grouping may be inaccurate for
    /// the current step. Informational only — logged and counted, never
    /// read back by the reaction loop.
    pub fn report_non_grouped_fly(&mut self) {
        self.simulation.report_non_grouped_fly();
    }
}
