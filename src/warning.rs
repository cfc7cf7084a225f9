//! Non-fatal runtime signals (spec §7), distinct from the fatal
//! `ConfigError` taxonomy: observing one never changes engine behaviour,
//! only a counter and an optional log line.

/// A non-fatal, informational runtime condition.
///
/// `IllReactionEvent` is raised internally by [`crate::Simulation::react`]
/// whenever a firing reaction's `static_probability * dt >= 1` — the step
/// was too coarse for the configured rate. `NonGroupedFly` is raised by an
/// external embedding via [`crate::Embedding::report_non_grouped_fly`],
/// reporting that its own statistics grouping may be inaccurate for the
/// current step; the engine has no way to detect this on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineWarning {
    IllReactionEvent { probability: f64, reaction_index: usize },
    NonGroupedFly,
}
