/// A maximum matching between variables and values, found with augmenting paths.
///
/// The matching of the previous call is used as a starting point; pairs which are no longer
/// possible are dropped, so after a few removals only a handful of variables need a new
/// augmenting path. It is scratch data: after backtracking it may simply be less useful.
#[derive(Debug, Clone, Default)]
pub(super) struct MaximumMatching {
    variable_match: Vec<Option<i32>>,
    /// Indexed by `value - min_value`.
    value_match: Vec<Option<usize>>,
    min_value: i32,
    visited: Vec<bool>,
}

impl MaximumMatching {
    /// Computes a maximum matching for the given domains, whose values lie in
    /// `[min_value, max_value]`, and returns its size.
    pub(super) fn compute(&mut self, domains: &[Vec<i32>], min_value: i32, max_value: i32) -> usize {
        let num_values = (max_value as i64 - min_value as i64 + 1) as usize;

        self.variable_match.resize(domains.len(), None);
        self.value_match.clear();
        self.value_match.resize(num_values, None);
        self.min_value = min_value;

        let mut size = 0;
        for (variable, domain) in domains.iter().enumerate() {
            match self.variable_match[variable] {
                Some(value)
                    if domain.contains(&value)
                        && self.value_match[self.index(value)].is_none() =>
                {
                    let index = self.index(value);
                    self.value_match[index] = Some(variable);
                    size += 1;
                }
                _ => self.variable_match[variable] = None,
            }
        }

        for variable in 0..domains.len() {
            if self.variable_match[variable].is_some() {
                continue;
            }
            self.visited.clear();
            self.visited.resize(num_values, false);
            if self.augment(variable, domains) {
                size += 1;
            }
        }

        size
    }

    fn index(&self, value: i32) -> usize {
        (value - self.min_value) as usize
    }

    /// Looks for an alternating path from `variable` to a free value and flips it.
    fn augment(&mut self, variable: usize, domains: &[Vec<i32>]) -> bool {
        for &value in &domains[variable] {
            let index = self.index(value);
            if self.visited[index] {
                continue;
            }
            self.visited[index] = true;

            let is_available = match self.value_match[index] {
                None => true,
                Some(other) => self.augment(other, domains),
            };
            if is_available {
                self.value_match[index] = Some(variable);
                self.variable_match[variable] = Some(value);
                return true;
            }
        }

        false
    }

    pub(super) fn value_of(&self, variable: usize) -> Option<i32> {
        self.variable_match.get(variable).copied().flatten()
    }

    pub(super) fn is_value_matched(&self, value: i32) -> bool {
        self.value_match[self.index(value)].is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_a_perfect_matching_when_one_exists() {
        let domains = vec![vec![1, 2], vec![1], vec![2, 3]];
        let mut matching = MaximumMatching::default();

        assert_eq!(matching.compute(&domains, 1, 3), 3);
        assert_eq!(matching.value_of(0), Some(2));
        assert_eq!(matching.value_of(1), Some(1));
        assert_eq!(matching.value_of(2), Some(3));
    }

    #[test]
    fn reports_the_deficiency_of_an_overconstrained_graph() {
        let domains = vec![vec![0, 1], vec![0, 1], vec![0, 1]];
        let mut matching = MaximumMatching::default();

        assert_eq!(matching.compute(&domains, 0, 1), 2);
    }

    #[test]
    fn repairs_the_previous_matching() {
        let mut matching = MaximumMatching::default();
        assert_eq!(matching.compute(&[vec![0, 1], vec![0, 1]], 0, 1), 2);
        let first = matching.value_of(0);

        let domains = if first == Some(0) {
            vec![vec![1], vec![0, 1]]
        } else {
            vec![vec![0], vec![0, 1]]
        };
        assert_eq!(matching.compute(&domains, 0, 1), 2);
        assert_ne!(matching.value_of(0), first);
        assert!(matching.is_value_matched(0) && matching.is_value_matched(1));
    }
}
