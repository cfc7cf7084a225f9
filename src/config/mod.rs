//! Reads the two-section configuration text format (spec §4.1, §6) and
//! yields a `SubstanceTable` plus a fully constructed reaction set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::reaction::{Reaction, Stoichiometry};
use crate::substance::{Substance, SubstanceKind};
use crate::substance_table::SubstanceTable;

/// Fatal configuration errors (spec §7). All of them abort construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    FileUnreadable { path: PathBuf, #[source] source: std::io::Error },

    #[error("line {line}: malformed reaction line")]
    BadReactionLine { line: usize },

    #[error("line {line}: discrete substance '{name}' is missing mass and/or charge")]
    DiscreteMissingPhysics { name: String, line: usize },

    #[error("line {line}: unknown substance kind '{kind}'")]
    UnknownKind { kind: String, line: usize },

    #[error("line {line}: unknown species '{name}'")]
    UnknownSpecies { name: String, line: usize },
}

/// Non-fatal conditions the parser notices but that don't stop a load
/// (spec §7).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// An `isotropic` line omitted its concentration; 0 was substituted.
    MissingIsotropicConcentration { name: String, line: usize },
    /// A reaction lists an `isotropic` or `field` substance as a product;
    /// it is treated as a static background and produces no particle.
    IsotropicOrFieldProduct { reaction_index: usize, substance: String },
}

/// Everything a configuration file yields: the populated substance
/// registry, the constructed reaction set (in file order), and any
/// warnings collected along the way.
pub struct ParsedConfig {
    pub substances: SubstanceTable,
    pub reactions: Vec<Reaction>,
    pub warnings: Vec<ConfigWarning>,
}

enum Section {
    Preamble,
    Substances,
    Reactions,
}

/// Reads the configuration text and yields a `SubstanceTable` plus a
/// reaction set (spec §2, §4.1).
pub struct ConfigParser;

impl ConfigParser {
    /// Parses `path`. `rate_constant_conversion_factor` divides every
    /// parsed rate constant before it is stored (spec §4.1 — e.g. `1e6` to
    /// convert s⁻¹ input into the engine's µs⁻¹ basis).
    pub fn parse(path: &Path, rate_constant_conversion_factor: f64) -> Result<ParsedConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::FileUnreadable { path: path.to_path_buf(), source })?;

        let mut substances = SubstanceTable::new();
        let mut reactions = Vec::new();
        let mut warnings = Vec::new();
        let mut section = Section::Preamble;

        for (idx, raw_line) in content.lines().enumerate() {
            let lineno = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            match line {
                "[substances]" => {
                    section = Section::Substances;
                    continue;
                }
                "[reactions]" => {
                    section = Section::Reactions;
                    continue;
                }
                _ => {}
            }

            match section {
                Section::Preamble => continue,
                Section::Substances => {
                    parse_substance_line(line, lineno, &mut substances, &mut warnings)?;
                }
                Section::Reactions => {
                    let (educts, products, rate_constant, activation_energy) =
                        parse_reaction_line(line, lineno, &substances, rate_constant_conversion_factor)?;

                    let reaction_index = reactions.len();
                    for &(pos, _) in &products {
                        if let Some(subst) = substances.get(pos) {
                            if subst.kind().is_isotropic() || subst.kind().is_field() {
                                log::warn!(
                                    "reaction {reaction_index} (line {lineno}) lists non-discrete product '{}': treated as static",
                                    subst.name()
                                );
                                warnings.push(ConfigWarning::IsotropicOrFieldProduct {
                                    reaction_index,
                                    substance: subst.name().to_string(),
                                });
                            }
                        }
                    }

                    reactions.push(Reaction::new(educts, products, rate_constant, activation_energy, &substances));
                }
            }
        }

        Ok(ParsedConfig { substances, reactions, warnings })
    }
}

fn parse_substance_line(
    line: &str,
    lineno: usize,
    table: &mut SubstanceTable,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<(), ConfigError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let name = tokens.first().copied().unwrap_or_default();
    let kind_str = tokens.get(1).copied().unwrap_or_default();

    match kind_str {
        "isotropic" => {
            let concentration = match tokens.get(2).and_then(|s| s.parse::<f64>().ok()) {
                Some(c) => c,
                None => {
                    log::warn!("substance '{name}' (line {lineno}) has no static concentration; defaulting to 0");
                    warnings.push(ConfigWarning::MissingIsotropicConcentration { name: name.to_string(), line: lineno });
                    0.0
                }
            };
            table.add(name, Substance::new(name, SubstanceKind::Isotropic { static_concentration: concentration }));
        }
        "discrete" => {
            let mass = tokens.get(2).and_then(|s| s.parse::<f64>().ok());
            let charge = tokens.get(3).and_then(|s| s.parse::<f64>().ok());
            match (mass, charge) {
                (Some(mass), Some(charge)) => {
                    table.add(name, Substance::new(name, SubstanceKind::Discrete { mass, charge }));
                }
                _ => {
                    return Err(ConfigError::DiscreteMissingPhysics { name: name.to_string(), line: lineno });
                }
            }
        }
        "field" => {
            table.add(name, Substance::new(name, SubstanceKind::Field));
        }
        other => {
            return Err(ConfigError::UnknownKind { kind: other.to_string(), line: lineno });
        }
    }

    Ok(())
}

type RawReaction = (Stoichiometry, Stoichiometry, f64, Option<f64>);

fn parse_reaction_line(
    line: &str,
    lineno: usize,
    table: &SubstanceTable,
    rate_constant_conversion_factor: f64,
) -> Result<RawReaction, ConfigError> {
    // Whitespace inside a reaction line carries no meaning; strip it before
    // any further parsing (spec §4.1).
    let stripped: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let parts: Vec<&str> = stripped.split(';').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(ConfigError::BadReactionLine { line: lineno });
    }

    let (educt_expr, product_expr) =
        parts[0].split_once("=>").ok_or(ConfigError::BadReactionLine { line: lineno })?;

    let educts = parse_terms(educt_expr, table, lineno)?;
    let products = parse_terms(product_expr, table, lineno)?;

    let raw_rate: f64 = parts[1].parse().map_err(|_| ConfigError::BadReactionLine { line: lineno })?;
    let rate_constant = raw_rate / rate_constant_conversion_factor;

    let activation_energy = match parts.get(2) {
        Some(s) => Some(s.parse::<f64>().map_err(|_| ConfigError::BadReactionLine { line: lineno })?),
        None => None,
    };

    Ok((educts, products, rate_constant, activation_energy))
}

/// Parses a `+`-separated list of `[multiplier]name` terms, accumulating
/// repeated substances into one coefficient each, in first-seen order.
fn parse_terms(expr: &str, table: &SubstanceTable, lineno: usize) -> Result<Stoichiometry, ConfigError> {
    if expr.is_empty() {
        return Ok(Vec::new());
    }

    let mut coefficients: HashMap<usize, u32> = HashMap::new();
    let mut first_seen_order: Vec<usize> = Vec::new();

    for term in expr.split('+') {
        if term.is_empty() {
            return Err(ConfigError::BadReactionLine { line: lineno });
        }

        let digit_count = term.chars().take_while(|c| c.is_ascii_digit()).count();
        let (multiplier_str, name) = term.split_at(digit_count);
        if name.is_empty() {
            return Err(ConfigError::BadReactionLine { line: lineno });
        }

        let multiplier: u32 = if multiplier_str.is_empty() {
            1
        } else {
            multiplier_str.parse().map_err(|_| ConfigError::BadReactionLine { line: lineno })?
        };

        let pos = table
            .position_of(name)
            .ok_or_else(|| ConfigError::UnknownSpecies { name: name.to_string(), line: lineno })?;

        if !coefficients.contains_key(&pos) {
            first_seen_order.push(pos);
        }
        *coefficients.entry(pos).or_insert(0) += multiplier;
    }

    Ok(first_seen_order.into_iter().map(|pos| (pos, coefficients[&pos])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp config file");
        file.write_all(contents.as_bytes()).expect("write temp config file");
        file
    }

    #[test]
    fn parses_substances_and_an_independent_reaction() {
        let file = write_config(
            "# prolog comment\n\
             [substances]\n\
             A discrete 100 1\n\
             B discrete 100 1\n\
             [reactions]\n\
             A => B ; 1.0\n",
        );

        let parsed = ConfigParser::parse(file.path(), 1.0).expect("parse should succeed");
        assert_eq!(parsed.substances.len(), 2);
        assert_eq!(parsed.reactions.len(), 1);
        assert!(parsed.reactions[0].is_independent());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn divides_rate_constant_by_conversion_factor() {
        let file = write_config(
            "[substances]\n\
             A discrete 1 1\n\
             B discrete 1 1\n\
             [reactions]\n\
             A => B ; 2.0\n",
        );

        let parsed = ConfigParser::parse(file.path(), 1_000_000.0).unwrap();
        assert_eq!(parsed.reactions[0].rate_constant(), 2.0 / 1_000_000.0);
    }

    #[test]
    fn missing_isotropic_concentration_warns_and_defaults_to_zero() {
        let file = write_config("[substances]\nM isotropic\n[reactions]\n");
        let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
        assert_eq!(parsed.substances.by_name("M").unwrap().static_concentration(), Some(0.0));
        assert_eq!(
            parsed.warnings,
            vec![ConfigWarning::MissingIsotropicConcentration { name: "M".into(), line: 2 }]
        );
    }

    #[test]
    fn discrete_missing_physics_is_fatal() {
        let file = write_config("[substances]\nA discrete\n[reactions]\n");
        let err = ConfigParser::parse(file.path(), 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::DiscreteMissingPhysics { name, line: 2 } if name == "A"));
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let file = write_config("[substances]\nA plasma 1 1\n[reactions]\n");
        let err = ConfigParser::parse(file.path(), 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind { kind, line: 2 } if kind == "plasma"));
    }

    #[test]
    fn unknown_species_in_reaction_is_fatal() {
        let file = write_config("[substances]\nA discrete 1 1\n[reactions]\nA => Ghost ; 1.0\n");
        let err = ConfigParser::parse(file.path(), 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSpecies { name, line: 3 } if name == "Ghost"));
    }

    #[test]
    fn wrong_semicolon_count_is_fatal() {
        let file = write_config("[substances]\nA discrete 1 1\n[reactions]\nA => A\n");
        let err = ConfigParser::parse(file.path(), 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::BadReactionLine { line: 3 }));
    }

    #[test]
    fn isotropic_product_warns_but_still_loads() {
        let file = write_config(
            "[substances]\n\
             M isotropic 1\n\
             A discrete 1 1\n\
             [reactions]\n\
             A => M ; 1.0\n",
        );
        let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
        assert_eq!(parsed.reactions.len(), 1);
        assert!(parsed.reactions[0].discrete_product_multiset().is_empty());
        assert_eq!(
            parsed.warnings,
            vec![ConfigWarning::IsotropicOrFieldProduct { reaction_index: 0, substance: "M".into() }]
        );
    }

    #[test]
    fn repeated_educt_accumulates_coefficient() {
        let file = write_config(
            "[substances]\n\
             M isotropic 2\n\
             A discrete 1 1\n\
             B discrete 1 1\n\
             [reactions]\n\
             A + 2M => B ; 0.5\n",
        );
        let parsed = ConfigParser::parse(file.path(), 1.0).unwrap();
        assert_eq!(parsed.reactions[0].static_probability(), 0.5 * 2.0f64.powi(2));
    }

    #[test]
    fn file_unreadable_is_fatal() {
        let err = ConfigParser::parse(Path::new("/nonexistent/path/to/config.txt"), 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::FileUnreadable { .. }));
    }
}
