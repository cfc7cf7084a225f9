//! End-to-end scenarios from spec §8, exercised purely through the public
//! crate API (the way an external embedding would use it).

use std::io::Write;

use reaction_engine::config::ConfigParser;
use reaction_engine::{Particle, ScriptedRandom, Simulation, Vec3};

fn config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn s4_static_probability_composition_survives_config_round_trip() {
    let file = config(
        "[substances]\n\
         M isotropic 2\n\
         A discrete 1 1\n\
         B discrete 1 1\n\
         [reactions]\n\
         A + 2M => B ; 0.5\n",
    );
    let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
    assert_eq!(parsed.reactions[0].static_probability(), 2.0);
}

#[test]
fn s5_replace_in_place_through_the_parser() {
    let file = config(
        "[substances]\n\
         X isotropic 1\n\
         X discrete 10 1\n\
         [reactions]\n",
    );
    let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
    assert_eq!(parsed.substances.index_of("X"), Some(1));
    assert_eq!(parsed.substances.discrete_len(), 1);
    assert!(parsed.substances.by_discrete_index(1).unwrap().kind().is_discrete());
}

#[test]
fn independent_reaction_conserves_particle_count_and_moves_position_forward() {
    let file = config("[substances]\nA discrete 1 1\nB discrete 1 1\n[reactions]\nA => B ; 1.0\n");
    let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
    let mut simulation = Simulation::new(parsed, Box::new(ScriptedRandom::new([0.1])), None, true);

    let a = simulation.substances().position_of("A").unwrap();
    let b = simulation.substances().position_of("B").unwrap();
    let position = Vec3::new(3.0, 4.0, 5.0);
    simulation.add_particle(Particle::new(a, position), 7);

    simulation.react(7, 0.0, 1.0);

    assert_eq!(simulation.concentration_of(a), 0);
    assert_eq!(simulation.concentration_of(b), 1);
    assert_eq!(simulation.particles().size(), 1);
    let handle = simulation.handle_of(7).unwrap();
    assert_eq!(simulation.particles().get(handle).unwrap().position, position);
}

#[test]
fn ill_events_are_monotonic_across_repeated_firings() {
    let file = config("[substances]\nA discrete 1 1\nB discrete 1 1\n[reactions]\nA => B ; 3.0\n");
    let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
    // Every draw is below 1.0, so every particle's lone candidate reaction
    // fires, and every firing has prob = 3.0 * 1.0 >= 1, so every firing is ill.
    let mut simulation = Simulation::new(parsed, Box::new(ScriptedRandom::new([0.1; 5])), None, false);

    let a = simulation.substances().position_of("A").unwrap();
    for i in 0..5u64 {
        simulation.add_particle(Particle::new(a, Vec3::zero()), i + 1);
    }

    let mut previous = 0;
    for i in 1..=5u64 {
        simulation.react(i, 0.0, 1.0);
        assert!(simulation.ill_events() >= previous);
        previous = simulation.ill_events();
    }
    assert_eq!(simulation.ill_events(), 5);
}

#[test]
fn substance_at_reports_none_after_pure_destruction_so_a_driver_wont_react_a_dead_index() {
    // A product-less reaction leaves `ion_map[index]` pointing at a freed
    // `SlabIndex` (spec §4.7 — step d, which rewrites the map, is skipped
    // when there's no product). A driver that gates its next `react` call
    // on `substance_at(index).is_some()` must see the index as dead, not
    // panic on a stale handle.
    let file = config("[substances]\nA discrete 1 1\n[reactions]\nA => ; 1.0\n");
    let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
    let mut simulation = Simulation::new(parsed, Box::new(ScriptedRandom::new([0.1])), None, false);

    let a = simulation.substances().position_of("A").unwrap();
    simulation.add_particle(Particle::new(a, Vec3::zero()), 1);

    simulation.react(1, 0.0, 1.0);

    assert!(simulation.substance_at(1).is_none());
    // Re-running the driver's per-step liveness-gated loop must not reach
    // `react` again for this index, and must not panic.
    if simulation.substance_at(1).is_some() {
        simulation.react(1, 0.0, 1.0);
    }
}
