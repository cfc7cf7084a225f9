//! Owns the particle population, the precomputed per-species reaction
//! index, and the concentration counters; executes the Monte Carlo step
//! (spec §2, §3 "Simulation state", §4.5).

mod logic;

use std::collections::HashMap;
use std::path::Path;

use crate::config::{ConfigError, ConfigParser, ParsedConfig};
use crate::embedding::EmbeddingCallbacks;
use crate::particle_list::{ParticleList, SlabIndex};
use crate::random::{RandomSource, SystemRandom};
use crate::reaction::Reaction;
use crate::substance_table::SubstanceTable;

/// The external, driver-facing identity of a particle. Stable across
/// reactions: `react` rewrites the map entry in place rather than
/// retiring the index (spec §3, §4.9).
pub type ParticleIndex = u64;

/// Owns everything the Monte Carlo reaction loop touches: the species
/// registry, the reaction set and its per-species index, the live
/// particle population, and the PRNG.
pub struct Simulation {
    substances: SubstanceTable,
    reactions: Vec<Reaction>,

    /// `ri[s]`: independent reactions whose sole discrete educt is `s`, in
    /// configuration-file order.
    ri: Vec<Vec<usize>>,
    /// `rd[s]`: dependent reactions in which `s` appears as a discrete
    /// educt. Populated, never consulted by `react` (spec §4.5, §9).
    rd: Vec<Vec<usize>>,
    /// Parallel to `ri`: `ri_static_probs[s][i] == reactions[ri[s][i]].static_probability()`.
    ri_static_probs: Vec<Vec<f64>>,

    particles: ParticleList,
    ion_map: HashMap<ParticleIndex, SlabIndex>,
    /// Live particle count per substance position; only discrete positions
    /// are ever nonzero.
    concentrations: Vec<u64>,

    n_steps: u64,
    sum_timestep: f64,
    ill_events: u64,
    /// Count of `EngineWarning::NonGroupedFly` signals reported via
    /// `report_non_grouped_fly` (spec §7). Informational only.
    non_grouped_fly_events: u64,

    random: Box<dyn RandomSource>,
    callbacks: Option<Box<dyn EmbeddingCallbacks>>,
    log_ill_events: bool,
}

impl Simulation {
    /// Builds a `Simulation` from already-parsed configuration, an
    /// injected PRNG, an optional callback bundle, and the ill-event
    /// logging toggle (spec §4.5).
    pub fn new(
        parsed: ParsedConfig,
        random: Box<dyn RandomSource>,
        callbacks: Option<Box<dyn EmbeddingCallbacks>>,
        log_ill_events: bool,
    ) -> Self {
        let ParsedConfig { substances, reactions, .. } = parsed;
        let n = substances.len();

        let mut ri: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut rd: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut ri_static_probs: Vec<Vec<f64>> = vec![Vec::new(); n];

        for (reaction_index, reaction) in reactions.iter().enumerate() {
            if reaction.is_independent() {
                let s = reaction.sole_discrete_educt();
                ri[s].push(reaction_index);
                ri_static_probs[s].push(reaction.static_probability());
            } else {
                let mut seen: Vec<usize> = Vec::new();
                for &(s, _) in reaction.discrete_educts() {
                    if !seen.contains(&s) {
                        seen.push(s);
                        rd[s].push(reaction_index);
                    }
                }
            }
        }

        Simulation {
            substances,
            reactions,
            ri,
            rd,
            ri_static_probs,
            particles: ParticleList::new(),
            ion_map: HashMap::new(),
            concentrations: vec![0; n],
            n_steps: 0,
            sum_timestep: 0.0,
            ill_events: 0,
            non_grouped_fly_events: 0,
            random,
            callbacks,
            log_ill_events,
        }
    }

    /// Reads `path`, seeding the PRNG from OS entropy. Convenience for the
    /// standalone driver's normal (non-reproducible) operation.
    pub fn from_config_file(path: &Path, rate_constant_conversion_factor: f64) -> Result<Self, ConfigError> {
        let parsed = ConfigParser::parse(path, rate_constant_conversion_factor)?;
        Ok(Simulation::new(parsed, Box::new(SystemRandom::from_entropy()), None, true))
    }

    /// As `from_config_file`, but seeds the PRNG deterministically.
    pub fn from_config_file_seeded(
        path: &Path,
        rate_constant_conversion_factor: f64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let parsed = ConfigParser::parse(path, rate_constant_conversion_factor)?;
        Ok(Simulation::new(parsed, Box::new(SystemRandom::seeded(seed)), None, true))
    }

    pub fn substances(&self) -> &SubstanceTable {
        &self.substances
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn particles(&self) -> &ParticleList {
        &self.particles
    }

    /// Live particle count for the substance at 0-based position `pos`.
    pub fn concentration_of(&self, pos: usize) -> u64 {
        self.concentrations.get(pos).copied().unwrap_or(0)
    }

    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    pub fn sum_timestep(&self) -> f64 {
        self.sum_timestep
    }

    pub fn ill_events(&self) -> u64 {
        self.ill_events
    }

    pub fn non_grouped_fly_events(&self) -> u64 {
        self.non_grouped_fly_events
    }

    /// The live handle `index` currently maps to, if any.
    pub fn handle_of(&self, index: ParticleIndex) -> Option<SlabIndex> {
        self.ion_map.get(&index).copied()
    }

    /// The 0-based substance position of the particle currently mapped to
    /// `index`.
    pub fn substance_at(&self, index: ParticleIndex) -> Option<usize> {
        let handle = self.handle_of(index)?;
        self.particles.get(handle).map(|p| p.substance)
    }

    /// Draws one uniform real in `[0, 1)` from the simulation's own PRNG.
    /// Exposed for callers (the standalone driver) that need to place an
    /// initial population with the same reproducibility guarantee as the
    /// reaction loop itself.
    pub fn next_unit(&mut self) -> f64 {
        self.random.next_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParser;
    use crate::random::ScriptedRandom;
    use std::io::Write;

    fn parse(contents: &str) -> ParsedConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        ConfigParser::parse(file.path(), 1.0).unwrap()
    }

    #[test]
    fn independent_reactions_are_indexed_by_their_sole_discrete_educt() {
        let parsed = parse(
            "[substances]\nA discrete 1 1\nB discrete 1 1\nC discrete 1 1\n\
             [reactions]\nA => B ; 1.0\nA => C ; 2.0\n",
        );
        let simulation = Simulation::new(parsed, Box::new(ScriptedRandom::new([0.0])), None, true);
        let a = simulation.substances().position_of("A").unwrap();

        assert_eq!(simulation.ri[a].len(), 2);
        assert_eq!(simulation.ri_static_probs[a], vec![1.0, 2.0]);
        assert_eq!(simulation.concentration_of(a), 0);
        assert_eq!(simulation.n_steps(), 0);
        assert_eq!(simulation.ill_events(), 0);
    }

    #[test]
    fn dependent_reactions_are_indexed_into_rd_not_ri() {
        let parsed = parse(
            "[substances]\nA discrete 1 1\nB discrete 1 1\nC discrete 1 1\n\
             [reactions]\nA + B => C ; 1.0\n",
        );
        let simulation = Simulation::new(parsed, Box::new(ScriptedRandom::new([0.0])), None, true);
        let a = simulation.substances().position_of("A").unwrap();
        let b = simulation.substances().position_of("B").unwrap();

        assert!(simulation.ri[a].is_empty());
        assert_eq!(simulation.rd[a].len(), 1);
        assert_eq!(simulation.rd[b].len(), 1);
    }
}
