//! How a search kernel reacts to a heuristic's preferred-operator set (`--preferred-ops`).

use plan_core::OpId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreferredOpsPolicy {
    /// Ignore preferred operators entirely; expand every applicable operator in generation order.
    #[default]
    None,
    /// Expand preferred operators first, then the rest — useful for EHC, where finding an
    /// improving successor early prunes the rest of the breadth-first layer.
    Prefer,
    /// Expand only the preferred operators. Falls back to every applicable operator when the
    /// heuristic reports none preferred (e.g. at a dead end, or for heuristics that never
    /// populate the set), since restricting to an empty set would silently break completeness.
    Only,
}

impl PreferredOpsPolicy {
    /// Reorders `applicable` in place according to this policy given `preferred`.
    pub fn order(&self, applicable: &mut Vec<OpId>, preferred: &[OpId]) {
        match self {
            PreferredOpsPolicy::None => {}
            PreferredOpsPolicy::Prefer => {
                let pref: std::collections::HashSet<OpId> = preferred.iter().copied().collect();
                applicable.sort_by_key(|op| !pref.contains(op));
            }
            PreferredOpsPolicy::Only => {
                if !preferred.is_empty() {
                    let pref: std::collections::HashSet<OpId> = preferred.iter().copied().collect();
                    applicable.retain(|op| pref.contains(op));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefer_moves_preferred_ops_first_without_dropping_others() {
        let mut applicable = vec![OpId::from(0usize), OpId::from(1usize), OpId::from(2usize)];
        let preferred = vec![OpId::from(2usize)];
        PreferredOpsPolicy::Prefer.order(&mut applicable, &preferred);
        assert_eq!(applicable[0], OpId::from(2usize));
        assert_eq!(applicable.len(), 3);
    }

    #[test]
    fn only_restricts_to_preferred_unless_empty() {
        let mut applicable = vec![OpId::from(0usize), OpId::from(1usize)];
        PreferredOpsPolicy::Only.order(&mut applicable, &[OpId::from(1usize)]);
        assert_eq!(applicable, vec![OpId::from(1usize)]);

        let mut applicable = vec![OpId::from(0usize), OpId::from(1usize)];
        PreferredOpsPolicy::Only.order(&mut applicable, &[]);
        assert_eq!(applicable, vec![OpId::from(0usize), OpId::from(1usize)]);
    }
}
