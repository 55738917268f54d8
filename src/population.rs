use serde::{Deserialize, Serialize};

/// Aggregate head count for one species.
///
/// `size` never drops below zero and is kept at whole organisms: every
/// mutation rounds its delta before applying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    species: String,
    size: f64,
    pub base_growth_rate: f64,
    pub base_mortality_rate: f64,
}

impl Population {
    pub fn new(
        species: impl Into<String>,
        size: f64,
        base_growth_rate: f64,
        base_mortality_rate: f64,
    ) -> Self {
        Self {
            species: species.into(),
            size: size.round().max(0.0),
            base_growth_rate,
            base_mortality_rate,
        }
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn current_size(&self) -> f64 {
        self.size
    }

    pub fn is_extinct(&self) -> bool {
        self.size <= 0.0
    }

    /// `size += round(size * growth * multiplier)`. No carrying capacity.
    pub fn grow_by(&mut self, multiplier: f64) {
        let growth = (self.size * self.base_growth_rate * multiplier).round();
        self.size = (self.size + growth).max(0.0);
    }

    /// `size -= round(size * mortality * multiplier)`, clamped at zero.
    pub fn shrink_by(&mut self, multiplier: f64) {
        let deaths = (self.size * self.base_mortality_rate * multiplier).round();
        self.size = (self.size - deaths).max(0.0);
    }

    /// Applies an absolute head-count change and returns the new size.
    pub fn adjust_by(&mut self, delta: f64) -> f64 {
        self.size = (self.size + delta).round().max(0.0);
        self.size
    }

    pub fn set_size(&mut self, size: f64) {
        self.size = size.round().max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_then_mortality_uses_grown_size() {
        let mut pop = Population::new("A", 100.0, 0.1, 0.05);
        pop.grow_by(1.0);
        assert_eq!(pop.current_size(), 110.0);
        pop.shrink_by(1.0);
        // round(110 * 0.05) = round(5.5) = 6
        assert_eq!(pop.current_size(), 104.0);
    }

    #[test]
    fn multiplier_scales_the_rate() {
        let mut pop = Population::new("A", 100.0, 0.1, 0.05);
        pop.grow_by(2.0);
        assert_eq!(pop.current_size(), 120.0);
        pop.shrink_by(0.5);
        assert_eq!(pop.current_size(), 117.0);
    }

    #[test]
    fn shrink_never_goes_below_zero() {
        let mut pop = Population::new("A", 10.0, 0.0, 0.5);
        pop.shrink_by(5.0);
        assert_eq!(pop.current_size(), 0.0);
        assert!(pop.is_extinct());
        pop.shrink_by(1.0);
        assert_eq!(pop.current_size(), 0.0);
    }

    #[test]
    fn adjust_rounds_and_clamps() {
        let mut pop = Population::new("Rabbit", 200.0, 0.08, 0.05);
        assert_eq!(pop.adjust_by(45.0), 245.0);
        assert_eq!(pop.adjust_by(0.4), 245.0);
        assert_eq!(pop.adjust_by(-2000.0), 0.0);
    }

    #[test]
    fn construction_rounds_and_clamps_size() {
        assert_eq!(Population::new("A", 12.6, 0.1, 0.1).current_size(), 13.0);
        assert_eq!(Population::new("A", -4.0, 0.1, 0.1).current_size(), 0.0);
    }
}
