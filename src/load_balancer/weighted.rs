//! Weighted random selection.

use std::sync::Arc;

use rand::Rng;

use crate::load_balancer::backend::InstanceDefinition;

/// Pick an instance with probability proportional to its weight.
///
/// Draws `r` uniformly from `[0, total)` and returns the first instance whose
/// cumulative weight exceeds `r`. With a zero total weight the first instance
/// is returned. `None` only for an empty slice.
pub fn select_by_weight<'a, R: Rng + ?Sized>(
    instances: &'a [Arc<InstanceDefinition>],
    rng: &mut R,
) -> Option<&'a Arc<InstanceDefinition>> {
    let first = instances.first()?;
    let total: u64 = instances.iter().map(|i| u64::from(i.weight)).sum();
    if total == 0 {
        return Some(first);
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for instance in instances {
        cumulative += u64::from(instance.weight);
        if cumulative > draw {
            return Some(instance);
        }
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn instances(weights: &[u32]) -> Vec<Arc<InstanceDefinition>> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| Arc::new(InstanceDefinition::new(format!("i{i}"), format!("http://127.0.0.1:{}", 9000 + i), *w)))
            .collect()
    }

    #[test]
    fn test_equal_weights_spread_evenly() {
        let pool = instances(&[1, 1]);
        let mut rng = rand::thread_rng();
        let mut first = 0;
        let trials = 10_000;
        for _ in 0..trials {
            if select_by_weight(&pool, &mut rng).unwrap().id == "i0" {
                first += 1;
            }
        }
        let share = first as f64 / trials as f64;
        assert!((0.45..0.55).contains(&share), "share was {share}");
    }

    #[test]
    fn test_proportional_to_weight() {
        let pool = instances(&[1, 3]);
        let mut rng = rand::thread_rng();
        let heavy = (0..10_000)
            .filter(|_| select_by_weight(&pool, &mut rng).unwrap().id == "i1")
            .count();
        assert!((7_000..8_000).contains(&heavy), "heavy picked {heavy} times");
    }

    #[test]
    fn test_zero_weight_instances_are_skipped() {
        let pool = instances(&[0, 5, 0]);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert_eq!(select_by_weight(&pool, &mut rng).unwrap().id, "i1");
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        let mut rng = StepRng::new(0, 1);
        assert!(select_by_weight(&[], &mut rng).is_none());
        let zero = instances(&[0, 0]);
        assert_eq!(select_by_weight(&zero, &mut rng).unwrap().id, "i0");
    }
}
