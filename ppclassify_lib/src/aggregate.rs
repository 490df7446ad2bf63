//! Portfolio-level aggregation of per-security category weights.

use uuid::Uuid;

use crate::portfolio::Security;
use crate::taxonomy::{TaxonomyKind, COLORS};

/// One security's contribution to an output category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// 1-based position of the security among the document's security records.
    pub security_position: usize,
    /// Weight in basis points.
    pub weight: i64,
    /// Sequential rank, from a single counter spanning the whole kind.
    pub rank: u32,
}

/// One output category for one taxonomy kind.
#[derive(Debug, Clone)]
pub struct AggregatedCategory {
    pub name: String,
    /// Freshly generated per run; re-runs are semantically identical but not
    /// byte-identical.
    pub id: String,
    pub color: String,
    pub assignments: Vec<Assignment>,
}

impl AggregatedCategory {
    /// Derived total: always the sum of the assignment weights.
    pub fn total_weight(&self) -> i64 {
        self.assignments.iter().map(|a| a.weight).sum()
    }
}

/// Aggregates the loaded securities' weights for one taxonomy kind.
///
/// Categories appear in first-encounter order (iterating securities, then
/// each security's categories), which fixes the color assignment; ranks
/// increase by one per assignment across the whole kind.
pub fn aggregate(securities: &[Security], kind: TaxonomyKind) -> Vec<AggregatedCategory> {
    let mut categories: Vec<AggregatedCategory> = Vec::new();
    let mut rank = 1u32;

    for security in securities {
        let Some(report) = security.holdings() else {
            continue;
        };
        for (name, fraction) in report.weights(kind).iter() {
            let weight = (fraction * 100.0 * 100.0).round() as i64;
            let index = match categories.iter().position(|c| c.name == name) {
                Some(index) => index,
                None => {
                    categories.push(AggregatedCategory {
                        name: name.to_string(),
                        id: Uuid::new_v4().to_string(),
                        color: COLORS[categories.len() % COLORS.len()].to_string(),
                        assignments: Vec::new(),
                    });
                    categories.len() - 1
                }
            };
            categories[index].assignments.push(Assignment {
                security_position: security.position,
                weight,
                rank,
            });
            rank += 1;
        }
    }

    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::HoldingReport;
    use crate::normalize::WeightTable;

    fn security_with(
        position: usize,
        kind: TaxonomyKind,
        rows: &[(&str, f64)],
    ) -> Security {
        let mut table = WeightTable::default();
        for (name, fraction) in rows {
            table.add(name.to_string(), *fraction);
        }
        Security::from_parts(
            &format!("Security {}", position),
            &format!("LU000000000{}", position),
            &format!("uuid-{}", position),
            position,
            Some(HoldingReport::from_parts(
                &format!("0P000000{}", position),
                Some(1.0),
                vec![(kind, table)],
            )),
        )
    }

    #[test]
    fn shared_category_collects_both_assignments() {
        let securities = vec![
            security_with(1, TaxonomyKind::Sector, &[("Technology", 0.3)]),
            security_with(2, TaxonomyKind::Sector, &[("Technology", 0.2)]),
        ];
        let categories = aggregate(&securities, TaxonomyKind::Sector);
        assert_eq!(categories.len(), 1);
        let tech = &categories[0];
        assert_eq!(tech.name, "Technology");
        assert_eq!(tech.assignments.len(), 2);
        assert_eq!(tech.assignments[0].weight, 3000);
        assert_eq!(tech.assignments[1].weight, 2000);
        assert_eq!(tech.total_weight(), 5000);
    }

    #[test]
    fn ranks_increase_across_the_whole_kind() {
        let securities = vec![
            security_with(
                1,
                TaxonomyKind::Sector,
                &[("Technology", 0.3), ("Energy", 0.1)],
            ),
            security_with(
                2,
                TaxonomyKind::Sector,
                &[("Energy", 0.2), ("Healthcare", 0.05)],
            ),
        ];
        let categories = aggregate(&securities, TaxonomyKind::Sector);
        let mut ranks: Vec<u32> = categories
            .iter()
            .flat_map(|c| c.assignments.iter().map(|a| a.rank))
            .collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn categories_keep_first_encounter_order_and_cycle_colors() {
        let securities = vec![
            security_with(
                1,
                TaxonomyKind::Sector,
                &[("Technology", 0.3), ("Energy", 0.1)],
            ),
            security_with(
                2,
                TaxonomyKind::Sector,
                &[("Utilities", 0.2), ("Technology", 0.1)],
            ),
        ];
        let categories = aggregate(&securities, TaxonomyKind::Sector);
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Technology", "Energy", "Utilities"]);
        assert_eq!(categories[0].color, COLORS[0]);
        assert_eq!(categories[1].color, COLORS[1]);
        assert_eq!(categories[2].color, COLORS[2]);
    }

    #[test]
    fn total_weight_is_derived_from_assignments() {
        let securities = vec![security_with(
            1,
            TaxonomyKind::Country,
            &[("Germany", 0.6), ("France", 0.4)],
        )];
        let categories = aggregate(&securities, TaxonomyKind::Country);
        for category in &categories {
            let sum: i64 = category.assignments.iter().map(|a| a.weight).sum();
            assert_eq!(category.total_weight(), sum);
        }
    }

    #[test]
    fn ids_are_fresh_per_run() {
        let securities = vec![security_with(1, TaxonomyKind::Sector, &[("Technology", 0.3)])];
        let first = aggregate(&securities, TaxonomyKind::Sector);
        let second = aggregate(&securities, TaxonomyKind::Sector);
        assert_ne!(first[0].id, second[0].id);
        assert_eq!(first[0].name, second[0].name);
        assert_eq!(
            first[0].assignments[0].weight,
            second[0].assignments[0].weight
        );
    }

    #[test]
    fn securities_without_reports_contribute_nothing() {
        let bare = Security::from_parts("Bare", "LU1", "uuid-9", 3, None);
        let categories = aggregate(&[bare], TaxonomyKind::Sector);
        assert!(categories.is_empty());
    }
}
