use ndarray::Array1;
use std::collections::HashMap;
use std::f64::consts::{E, PI};

/// Test function type definition
pub type TestFunction = fn(&Array1<f64>) -> f64;

/// A benchmark objective with its conventional search box and optimum.
#[derive(Clone, Copy, Debug)]
pub struct BenchmarkFunction {
    /// Registry name.
    pub name: &'static str,
    /// The function itself.
    pub func: TestFunction,
    /// Per-dimension (lower, upper) bounds.
    pub bounds: (f64, f64),
    /// Coordinate of the global minimum (the same in every dimension).
    pub argmin: f64,
    /// Global minimum value.
    pub minimum: f64,
}

impl BenchmarkFunction {
    /// Bounds for an `n`-dimensional problem.
    pub fn bounds_for(&self, n: usize) -> Vec<(f64, f64)> {
        vec![self.bounds; n]
    }
}

/// Sum of squares; unimodal.
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi * xi).sum()
}

/// Rosenbrock's banana valley.
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    (1..x.len())
        .map(|i| 100.0 * (x[i] - x[i - 1] * x[i - 1]).powi(2) + (1.0 - x[i - 1]).powi(2))
        .sum()
}

/// Rastrigin: a regular grid of local minima.
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    10.0 * x.len() as f64
        + x.iter()
            .map(|&xi| xi * xi - 10.0 * (2.0 * PI * xi).cos())
            .sum::<f64>()
}

/// Ackley: nearly flat outer region with a deep central hole.
pub fn ackley(x: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    let sum_sq: f64 = x.iter().map(|&xi| xi.powi(2)).sum();
    let sum_cos: f64 = x.iter().map(|&xi| (2.0 * PI * xi).cos()).sum();
    -20.0 * (-0.2 * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp() + 20.0 + E
}

/// Griewank: product of cosines over a quadratic bowl.
pub fn griewank(x: &Array1<f64>) -> f64 {
    let sum = x.iter().map(|&xi| xi * xi).sum::<f64>() / 4000.0;
    let prod: f64 = x
        .iter()
        .enumerate()
        .map(|(i, &xi)| (xi / ((i + 1) as f64).sqrt()).cos())
        .product();
    sum - prod + 1.0
}

/// Function registry mapping names to benchmark objectives.
pub struct FunctionRegistry {
    functions: HashMap<&'static str, BenchmarkFunction>,
}

impl FunctionRegistry {
    /// Creates a registry with the standard test functions.
    pub fn new() -> Self {
        let entries = [
            BenchmarkFunction {
                name: "sphere",
                func: sphere,
                bounds: (-5.0, 5.0),
                argmin: 0.0,
                minimum: 0.0,
            },
            BenchmarkFunction {
                name: "rosenbrock",
                func: rosenbrock,
                bounds: (-2.048, 2.048),
                argmin: 1.0,
                minimum: 0.0,
            },
            BenchmarkFunction {
                name: "rastrigin",
                func: rastrigin,
                bounds: (-5.12, 5.12),
                argmin: 0.0,
                minimum: 0.0,
            },
            BenchmarkFunction {
                name: "ackley",
                func: ackley,
                bounds: (-32.768, 32.768),
                argmin: 0.0,
                minimum: 0.0,
            },
            BenchmarkFunction {
                name: "griewank",
                func: griewank,
                bounds: (-600.0, 600.0),
                argmin: 0.0,
                minimum: 0.0,
            },
        ];
        let functions = entries.into_iter().map(|b| (b.name, b)).collect();
        Self { functions }
    }

    /// Gets a benchmark by name.
    pub fn get(&self, name: &str) -> Option<BenchmarkFunction> {
        self.functions.get(name).copied()
    }

    /// Lists all available function names, sorted alphabetically.
    pub fn list_functions(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
