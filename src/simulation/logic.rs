//! The Monte Carlo reaction loop, particle lifecycle, and the standalone
//! driver's random walk (spec §4.6–§4.11).

use super::{ParticleIndex, Simulation};
use crate::particle::Particle;
use crate::particle_list::SlabIndex;
use crate::vector::Vec3;
use crate::warning::EngineWarning;

/// A scale of ±0.005 mm per axis per step, matching the reference
/// driver's unit-square random walk (spec §4.11).
const RANDOM_WALK_SCALE: f64 = 0.01;

impl Simulation {
    /// Inserts `particle` under `index`, incrementing the species counter.
    /// Overwrites any existing `ion_map` entry at `index` without
    /// retiring the old handle — this is exactly how `react` rewrites the
    /// map onto a reaction's product (spec §4.6).
    pub fn add_particle(&mut self, particle: Particle, index: ParticleIndex) {
        let substance = particle.substance;
        let handle = self.particles.insert(particle);
        if let Some(c) = self.concentrations.get_mut(substance) {
            *c += 1;
        }
        self.ion_map.insert(index, handle);
    }

    /// Removes the particle at `handle` and decrements its species
    /// counter. Does not touch `ion_map` — callers retiring an external
    /// index entirely must remove it themselves (spec §4.7).
    pub fn destroy_particle(&mut self, handle: SlabIndex) {
        let substance = self.particles.get(handle).expect("destroy_particle: stale handle").substance;
        self.particles.remove(handle);
        if let Some(c) = self.concentrations.get_mut(substance) {
            *c -= 1;
        }
    }

    /// Fully retires an external index: removes its `ion_map` entry. A
    /// caller that wants the underlying particle gone too must call
    /// `destroy_particle` first.
    pub fn remove_p(&mut self, index: ParticleIndex) {
        self.ion_map.remove(&index);
    }

    /// Overwrites the position of the particle mapped to `index`. Pre:
    /// `index` is live (spec §4.8).
    pub fn update_position(&mut self, index: ParticleIndex, x: f64, y: f64, z: f64) {
        let handle = *self.ion_map.get(&index).expect("update_position: index not in ion_map");
        let particle = self.particles.get_mut(handle).expect("update_position: stale handle in ion_map");
        particle.position = Vec3::new(x, y, z);
    }

    /// Increments `n_steps` and accumulates `dt`. Called exactly once per
    /// simulation time step by the embedding (spec §4.10).
    pub fn advance_timestep(&mut self, dt: f64) {
        self.n_steps += 1;
        self.sum_timestep += dt;
    }

    /// The Monte Carlo inner loop: tries every independent reaction whose
    /// sole discrete educt matches the particle at `index`, in
    /// configuration-file order, stopping at the first to fire (spec
    /// §4.9). `ke` is accepted and ignored — activation-energy semantics
    /// are not implemented (spec §9, open question).
    ///
    /// Panics if `index` is not currently in `ion_map`: reacting an index
    /// the embedding never registered is a programming error (spec §7).
    pub fn react(&mut self, index: ParticleIndex, _ke: f64, dt: f64) {
        let handle = *self.ion_map.get(&index).expect("react: index not in ion_map");
        let s = self.particles.get(handle).expect("react: stale handle in ion_map").substance;

        // `ri[s]` and `ri_static_probs[s]` are never mutated after
        // construction; cloning the pair up front lets the loop body hold
        // `&mut self` freely instead of threading an immutable borrow of
        // `self.ri` through `destroy_particle`/`add_particle`.
        let reaction_indices = self.ri[s].clone();
        let static_probs = self.ri_static_probs[s].clone();

        for (i, &reaction_index) in reaction_indices.iter().enumerate() {
            let draw = self.random.next_unit();
            let prob = static_probs[i] * dt;

            if draw < prob {
                if prob >= 1.0 {
                    self.ill_events += 1;
                    if self.log_ill_events {
                        self.log_warning(EngineWarning::IllReactionEvent { probability: prob, reaction_index });
                    }
                }

                let position = self.particles.get(handle).unwrap().position;
                self.destroy_particle(handle);

                if let Some(&q_substance) = self.reactions[reaction_index].discrete_product_multiset().first() {
                    let product = Particle::new(q_substance, position);
                    self.add_particle(product, index);

                    if let Some(callbacks) = self.callbacks.as_mut() {
                        let substance = self.substances.get(q_substance).expect("product substance must exist");
                        callbacks.update_ion_mass(substance.mass().unwrap_or(0.0));
                        callbacks.update_ion_charge(substance.charge().unwrap_or(0.0));
                        callbacks.update_ion_color((q_substance + 1) as i64);
                    }
                }

                break;
            }
        }
    }

    /// Logs an [`EngineWarning`]. `IllReactionEvent` lines are gated by
    /// `log_ill_events`; `NonGroupedFly` always logs, since it only ever
    /// arrives via an explicit embedding call (spec §7).
    fn log_warning(&self, warning: EngineWarning) {
        match warning {
            EngineWarning::IllReactionEvent { probability, reaction_index } => {
                log::warn!("ill event: reaction {reaction_index} fired with probability {probability}");
            }
            EngineWarning::NonGroupedFly => {
                log::warn!("non-grouped fly reported by embedding: statistics may be inaccurate");
            }
        }
    }

    /// Records an embedding's report that its own statistics grouping may
    /// be inaccurate for the current step (spec §7,
    /// `EngineWarning::NonGroupedFly`). Purely informational: counted and
    /// logged, never read by the reaction loop itself.
    pub fn report_non_grouped_fly(&mut self) {
        self.non_grouped_fly_events += 1;
        self.log_warning(EngineWarning::NonGroupedFly);
    }

    /// Offsets every live particle's x and y by an independent draw
    /// uniform in `[-0.005, 0.005)`, wrapping toroidally into the unit
    /// square. `z` is left untouched. Auxiliary for standalone operation
    /// only — the embedded driver supplies its own trajectories (spec
    /// §4.11).
    pub fn random_walk(&mut self) {
        let handles: Vec<SlabIndex> = self.particles.iter().map(|(handle, _)| handle).collect();

        for handle in handles {
            let dx = self.random.next_unit() * RANDOM_WALK_SCALE - RANDOM_WALK_SCALE / 2.0;
            let dy = self.random.next_unit() * RANDOM_WALK_SCALE - RANDOM_WALK_SCALE / 2.0;

            if let Some(particle) = self.particles.get_mut(handle) {
                particle.position.x = (particle.position.x + dx).rem_euclid(1.0);
                particle.position.y = (particle.position.y + dy).rem_euclid(1.0);
            }
        }
    }
}
