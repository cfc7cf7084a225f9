//! One elementary reaction: educts, products, rate, and the quantities
//! derived from them once at construction time (spec §3, §4.4).

use crate::substance_table::SubstanceTable;

/// A reaction partner together with its stoichiometric coefficient, keyed
/// by 0-based primary position in the owning `SubstanceTable`.
pub type Stoichiometry = Vec<(usize, u32)>;

/// One elementary reaction. Constructed once from parser output and
/// thereafter immutable.
#[derive(Debug, Clone)]
pub struct Reaction {
    educts: Stoichiometry,
    products: Stoichiometry,
    rate_constant: f64,
    activation_energy: Option<f64>,

    discrete_educts: Stoichiometry,
    discrete_product_multiset: Vec<usize>,
    static_probability: f64,
    independent: bool,
}

impl Reaction {
    /// Builds a `Reaction` from educt/product stoichiometry and validates
    /// and derives everything spec §4.4 lists:
    ///
    /// 1. expands `discrete_product_multiset` by repeating each discrete
    ///    product by its coefficient;
    /// 2. computes `static_probability` as `rate_constant` times the
    ///    product of `concentration^coefficient` over isotropic educts;
    /// 3. sums discrete-educt coefficients to decide `independent`;
    /// 4. records `discrete_educts`.
    ///
    /// The parser is responsible for rejecting non-discrete products before
    /// this is called; this constructor trusts its input, per spec §4.4.
    pub fn new(
        educts: Stoichiometry,
        products: Stoichiometry,
        rate_constant: f64,
        activation_energy: Option<f64>,
        substances: &SubstanceTable,
    ) -> Self {
        let discrete_educts: Stoichiometry = educts
            .iter()
            .copied()
            .filter(|&(pos, _)| substances.get(pos).is_some_and(|s| s.kind().is_discrete()))
            .collect();

        let discrete_product_multiset: Vec<usize> = products
            .iter()
            .filter(|&&(pos, _)| substances.get(pos).is_some_and(|s| s.kind().is_discrete()))
            .flat_map(|&(pos, factor)| std::iter::repeat(pos).take(factor as usize))
            .collect();

        let mut static_probability = rate_constant;
        for &(pos, factor) in &educts {
            if let Some(c) = substances.get(pos).and_then(|s| s.static_concentration()) {
                static_probability *= c.powi(factor as i32);
            }
        }

        let n_discrete: u32 = discrete_educts.iter().map(|&(_, factor)| factor).sum();
        let independent = n_discrete == 1;

        Reaction {
            educts,
            products,
            rate_constant,
            activation_energy,
            discrete_educts,
            discrete_product_multiset,
            static_probability,
            independent,
        }
    }

    pub fn educts(&self) -> &[(usize, u32)] {
        &self.educts
    }

    pub fn products(&self) -> &[(usize, u32)] {
        &self.products
    }

    pub fn rate_constant(&self) -> f64 {
        self.rate_constant
    }

    pub fn activation_energy(&self) -> Option<f64> {
        self.activation_energy
    }

    pub fn discrete_educts(&self) -> &[(usize, u32)] {
        &self.discrete_educts
    }

    pub fn discrete_product_multiset(&self) -> &[usize] {
        &self.discrete_product_multiset
    }

    pub fn static_probability(&self) -> f64 {
        self.static_probability
    }

    /// True iff the sum of discrete-educt coefficients is exactly 1.
    pub fn is_independent(&self) -> bool {
        self.independent
    }

    /// The sole discrete educt of an independent reaction. Panics if the
    /// reaction is not independent — callers (the `Simulation` indexer)
    /// only ever call this after checking `is_independent`.
    pub fn sole_discrete_educt(&self) -> usize {
        assert!(self.independent, "sole_discrete_educt called on a non-independent reaction");
        self.discrete_educts[0].0
    }
}
