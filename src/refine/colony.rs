//! Elitist Ant System for small TSP instances.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Ant-colony parameters.
#[derive(Debug, Clone)]
pub struct AcoConfig {
    pub n_ants: usize,
    pub n_iterations: usize,
    /// Pheromone weight.
    pub alpha: f64,
    /// Heuristic (inverse distance) weight.
    pub beta: f64,
    /// Evaporation rate ρ; trails decay by `1 − ρ` each iteration.
    pub evaporation: f64,
    /// Deposit constant.
    pub q: f64,
    /// Elite ants depositing each iteration.
    pub n_best: usize,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            n_ants: 20,
            n_iterations: 50,
            alpha: 1.0,
            beta: 2.0,
            evaporation: 0.5,
            q: 100.0,
            n_best: 5,
        }
    }
}

/// Symmetric Euclidean distance matrix over raw coordinate pairs.
pub fn euclidean_matrix(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = points[i].0 - points[j].0;
            let dy = points[i].1 - points[j].1;
            let d = (dx * dx + dy * dy).sqrt();
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }
    dist
}

/// Ant-colony optimizer over a fixed distance matrix.
pub struct AntColony {
    config: AcoConfig,
    n: usize,
    dist: Vec<Vec<f64>>,
    pheromones: Vec<Vec<f64>>,
    heuristic: Vec<Vec<f64>>,
    best_tour: Option<Vec<usize>>,
    best_length: f64,
    history: Vec<f64>,
    rng: StdRng,
}

impl AntColony {
    pub fn new(dist: Vec<Vec<f64>>, config: AcoConfig) -> Self {
        Self::with_rng(dist, config, StdRng::from_entropy())
    }

    /// Seeded variant for reproducible runs.
    pub fn with_seed(dist: Vec<Vec<f64>>, config: AcoConfig, seed: u64) -> Self {
        Self::with_rng(dist, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(dist: Vec<Vec<f64>>, config: AcoConfig, rng: StdRng) -> Self {
        let n = dist.len();
        let heuristic = dist
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&d| if d > 0.0 { 1.0 / d } else { 0.0 })
                    .collect()
            })
            .collect();
        Self {
            config,
            n,
            dist,
            pheromones: vec![vec![1.0; n]; n],
            heuristic,
            best_tour: None,
            best_length: f64::INFINITY,
            history: Vec::new(),
            rng,
        }
    }

    /// Best tour length per iteration, for convergence inspection.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Runs the configured iteration budget and returns the best closed
    /// tour (as a city permutation) with its length.
    pub fn optimize(&mut self) -> (Vec<usize>, f64) {
        if self.n <= 1 {
            return ((0..self.n).collect(), 0.0);
        }

        for _ in 0..self.config.n_iterations {
            let mut tours: Vec<(Vec<usize>, f64)> = (0..self.config.n_ants)
                .map(|_| self.construct_tour())
                .collect();

            for (tour, length) in &tours {
                if *length < self.best_length {
                    self.best_length = *length;
                    self.best_tour = Some(tour.clone());
                }
            }

            self.evaporate();
            tours.sort_by(|a, b| a.1.total_cmp(&b.1));
            for (tour, length) in tours.iter().take(self.config.n_best) {
                self.deposit(tour, self.config.q / length);
            }
            // Extra reinforcement along the global best.
            if let Some(best) = self.best_tour.clone() {
                self.deposit(&best, 2.0 * self.config.q / self.best_length);
            }

            self.history.push(self.best_length);
        }

        (
            self.best_tour.clone().unwrap_or_else(|| (0..self.n).collect()),
            self.best_length,
        )
    }

    /// One ant: random start, roulette-wheel steps over τ^α · η^β.
    fn construct_tour(&mut self) -> (Vec<usize>, f64) {
        let start = self.rng.gen_range(0..self.n);
        let mut visited = vec![false; self.n];
        let mut tour = Vec::with_capacity(self.n);
        visited[start] = true;
        tour.push(start);
        let mut current = start;
        let mut length = 0.0;

        for _ in 1..self.n {
            let next = self.pick_next(current, &visited);
            length += self.dist[current][next];
            visited[next] = true;
            tour.push(next);
            current = next;
        }
        length += self.dist[current][start];
        (tour, length)
    }

    fn pick_next(&mut self, current: usize, visited: &[bool]) -> usize {
        let mut weights = vec![0.0; self.n];
        let mut total = 0.0;
        for j in 0..self.n {
            if !visited[j] {
                let w = self.pheromones[current][j].powf(self.config.alpha)
                    * self.heuristic[current][j].powf(self.config.beta);
                weights[j] = w;
                total += w;
            }
        }

        if total > 0.0 {
            let target = self.rng.gen::<f64>() * total;
            let mut acc = 0.0;
            for j in 0..self.n {
                if visited[j] {
                    continue;
                }
                acc += weights[j];
                if acc >= target {
                    return j;
                }
            }
        }
        // All remaining weights are zero (coincident points); take the
        // first unvisited city.
        visited.iter().position(|v| !v).expect("unvisited city exists")
    }

    fn evaporate(&mut self) {
        for row in &mut self.pheromones {
            for p in row.iter_mut() {
                *p *= 1.0 - self.config.evaporation;
            }
        }
    }

    /// Deposits along every edge of a closed tour, both directions.
    fn deposit(&mut self, tour: &[usize], amount: f64) {
        for pair in tour.windows(2) {
            self.pheromones[pair[0]][pair[1]] += amount;
            self.pheromones[pair[1]][pair[0]] += amount;
        }
        if let (Some(&first), Some(&last)) = (tour.first(), tour.last()) {
            self.pheromones[last][first] += amount;
            self.pheromones[first][last] += amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec<f64>> {
        euclidean_matrix(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])
    }

    fn tour_length(dist: &[Vec<f64>], tour: &[usize]) -> f64 {
        let mut total = 0.0;
        for pair in tour.windows(2) {
            total += dist[pair[0]][pair[1]];
        }
        total + dist[tour[tour.len() - 1]][tour[0]]
    }

    #[test]
    fn finds_the_square_perimeter() {
        let mut colony = AntColony::with_seed(square(), AcoConfig::default(), 7);
        let (tour, length) = colony.optimize();
        assert_eq!(tour.len(), 4);
        assert!((length - 4.0).abs() < 1e-9, "got {length}");
    }

    #[test]
    fn reported_length_matches_tour() {
        let dist = square();
        let mut colony = AntColony::with_seed(dist.clone(), AcoConfig::default(), 11);
        let (tour, length) = colony.optimize();
        assert!((tour_length(&dist, &tour) - length).abs() < 1e-9);
    }

    #[test]
    fn tour_is_a_permutation() {
        let points: Vec<(f64, f64)> = (0..12)
            .map(|i| ((i * 7 % 12) as f64, (i * 5 % 12) as f64))
            .collect();
        let mut colony =
            AntColony::with_seed(euclidean_matrix(&points), AcoConfig::default(), 3);
        let (tour, _) = colony.optimize();
        let mut sorted = tour.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn history_is_monotone_non_increasing() {
        let mut colony = AntColony::with_seed(square(), AcoConfig::default(), 5);
        colony.optimize();
        let history = colony.history();
        assert_eq!(history.len(), AcoConfig::default().n_iterations);
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn beats_identity_order_on_scattered_points() {
        // A deliberately bad input order on a ring of points.
        let n = 10usize;
        let points: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let angle = (i * 7 % n) as f64 / n as f64 * std::f64::consts::TAU;
                (angle.cos(), angle.sin())
            })
            .collect();
        let dist = euclidean_matrix(&points);
        let identity: Vec<usize> = (0..n).collect();
        let identity_len = tour_length(&dist, &identity);

        let mut colony = AntColony::with_seed(dist, AcoConfig::default(), 42);
        let (_, best) = colony.optimize();
        assert!(best < identity_len);
    }

    #[test]
    fn degenerate_inputs_are_harmless() {
        let mut single = AntColony::with_seed(euclidean_matrix(&[(0.0, 0.0)]), AcoConfig::default(), 1);
        assert_eq!(single.optimize(), (vec![0], 0.0));

        // Coincident points give zero heuristic everywhere.
        let mut flat = AntColony::with_seed(
            euclidean_matrix(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]),
            AcoConfig::default(),
            2,
        );
        let (tour, length) = flat.optimize();
        assert_eq!(tour.len(), 3);
        assert_eq!(length, 0.0);
    }
}
