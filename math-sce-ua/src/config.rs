//! Optimizer settings, complex layout and the JSON calibration file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::parallel_eval::ParallelConfig;
use crate::parameter_space::{ParameterSpace, ParameterSpec};
use crate::{CallbackFn, Result, SCEError};

/// Default number of complexes.
pub const DEFAULT_NGS: usize = 10;
/// Default evaluation budget.
pub const DEFAULT_MAXN: usize = 5000;
/// Default plateau window (shuffle loops).
pub const DEFAULT_KSTOP: usize = 15;
/// Default plateau threshold on the relative change of the best value.
pub const DEFAULT_PCENTO: f64 = 0.1;
/// Default threshold on the normalized geometric range of the population.
pub const DEFAULT_PEPS: f64 = 0.001;
/// Default cap on rejected draws before a sampled point is clamped to the box.
pub const DEFAULT_MAX_SAMPLE_ATTEMPTS: usize = 1000;

/// Configuration for the SCE-UA optimizer.
///
/// `npg`, `nps` and `beta` default to formulas of the problem dimension and
/// are resolved by [`SCEConfig::layout`].
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct SCEConfig {
    /// Number of complexes.
    pub ngs: usize,
    /// Points per complex (default `2*nopt + 1`).
    pub npg: Option<usize>,
    /// Points per simplex (default `nopt + 1`).
    pub nps: Option<usize>,
    /// Simplex evolution steps per selected simplex.
    pub alpha: usize,
    /// Simplex selections per complex and loop (default `2*nopt + 1`).
    pub beta: Option<usize>,
    /// Maximum number of objective evaluations.
    pub maxn: usize,
    /// Number of shuffle loops in the plateau window.
    pub kstop: usize,
    /// Relative change of the best value under which the run has plateaued.
    pub pcento: f64,
    /// Normalized geometric range under which the population has collapsed.
    pub peps: f64,
    /// Put the configured initial values into the first population slot.
    pub include_initial_guess: bool,
    /// Optional random seed for reproducibility.
    pub seed: Option<u64>,
    /// Rejected draws allowed before a sampled point is clamped to the box.
    pub max_sample_attempts: usize,
    /// Parallel complex evolution.
    pub parallel: ParallelConfig,
    /// Print progress for every shuffle loop.
    pub disp: bool,
    /// Optional per-loop callback (may stop early).
    #[serde(skip)]
    pub callback: Option<CallbackFn>,
}

impl Default for SCEConfig {
    fn default() -> Self {
        Self {
            ngs: DEFAULT_NGS,
            npg: None,
            nps: None,
            alpha: 1,
            beta: None,
            maxn: DEFAULT_MAXN,
            kstop: DEFAULT_KSTOP,
            pcento: DEFAULT_PCENTO,
            peps: DEFAULT_PEPS,
            include_initial_guess: true,
            seed: None,
            max_sample_attempts: DEFAULT_MAX_SAMPLE_ATTEMPTS,
            parallel: ParallelConfig::default(),
            disp: false,
            callback: None,
        }
    }
}

impl fmt::Debug for SCEConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SCEConfig")
            .field("ngs", &self.ngs)
            .field("npg", &self.npg)
            .field("nps", &self.nps)
            .field("alpha", &self.alpha)
            .field("beta", &self.beta)
            .field("maxn", &self.maxn)
            .field("kstop", &self.kstop)
            .field("pcento", &self.pcento)
            .field("peps", &self.peps)
            .field("include_initial_guess", &self.include_initial_guess)
            .field("seed", &self.seed)
            .field("max_sample_attempts", &self.max_sample_attempts)
            .field("parallel", &self.parallel)
            .field("disp", &self.disp)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Complex sizes resolved for a given problem dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexLayout {
    /// Problem dimension.
    pub nopt: usize,
    /// Number of complexes.
    pub ngs: usize,
    /// Points per complex.
    pub npg: usize,
    /// Points per simplex.
    pub nps: usize,
    /// Evolution steps per simplex.
    pub alpha: usize,
    /// Simplex selections per complex.
    pub beta: usize,
    /// Population size `ngs * npg`.
    pub npt: usize,
}

impl ComplexLayout {
    /// Worst-case number of evaluations one complex spends in one loop.
    pub fn complex_cost(&self) -> usize {
        3 * self.alpha * self.beta
    }
}

fn invalid(name: &'static str, value: usize, reason: &'static str) -> SCEError {
    SCEError::InvalidSetting {
        name,
        value,
        reason,
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SCEError::InvalidThreshold {
            name,
            value,
            reason: "must be finite and >= 0",
        })
    }
}

impl SCEConfig {
    /// Resolves and validates the complex layout for `nopt` dimensions.
    ///
    /// # Errors
    ///
    /// Returns `SCEError::EmptyParameterSpace` for `nopt == 0`,
    /// `SCEError::InvalidSetting` for any out-of-range size and
    /// `SCEError::InvalidThreshold` for a negative or non-finite `pcento`/`peps`.
    pub fn layout(&self, nopt: usize) -> Result<ComplexLayout> {
        if nopt == 0 {
            return Err(SCEError::EmptyParameterSpace);
        }
        let npg = self.npg.unwrap_or(2 * nopt + 1);
        let nps = self.nps.unwrap_or(nopt + 1);
        let beta = self.beta.unwrap_or(2 * nopt + 1);
        if self.ngs == 0 {
            return Err(invalid("ngs", self.ngs, "at least one complex is required"));
        }
        if npg == 0 {
            return Err(invalid("npg", npg, "a complex needs at least one point"));
        }
        if nps < 2 {
            return Err(invalid("nps", nps, "a simplex needs at least 2 points"));
        }
        if nps > npg {
            return Err(invalid("nps", nps, "a simplex cannot be larger than its complex (npg)"));
        }
        if self.alpha == 0 {
            return Err(invalid("alpha", self.alpha, "must be >= 1"));
        }
        if beta == 0 {
            return Err(invalid("beta", beta, "must be >= 1"));
        }
        if self.kstop == 0 {
            return Err(invalid("kstop", self.kstop, "must be >= 1"));
        }
        check_threshold("pcento", self.pcento)?;
        check_threshold("peps", self.peps)?;
        Ok(ComplexLayout {
            nopt,
            ngs: self.ngs,
            npg,
            nps,
            alpha: self.alpha,
            beta,
            npt: self.ngs * npg,
        })
    }
}

/// Fluent builder for `SCEConfig`.
///
/// # Example
///
/// ```rust
/// use math_audio_sce_ua::SCEConfigBuilder;
///
/// let config = SCEConfigBuilder::new()
///     .ngs(4)
///     .maxn(2000)
///     .kstop(10)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.ngs, 4);
/// ```
pub struct SCEConfigBuilder {
    cfg: SCEConfig,
}

impl Default for SCEConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SCEConfigBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            cfg: SCEConfig::default(),
        }
    }
    /// Sets the number of complexes.
    pub fn ngs(mut self, v: usize) -> Self {
        self.cfg.ngs = v;
        self
    }
    /// Sets the number of points per complex.
    pub fn npg(mut self, v: usize) -> Self {
        self.cfg.npg = Some(v);
        self
    }
    /// Sets the number of points per simplex.
    pub fn nps(mut self, v: usize) -> Self {
        self.cfg.nps = Some(v);
        self
    }
    /// Sets the number of evolution steps per simplex.
    pub fn alpha(mut self, v: usize) -> Self {
        self.cfg.alpha = v;
        self
    }
    /// Sets the number of simplex selections per complex.
    pub fn beta(mut self, v: usize) -> Self {
        self.cfg.beta = Some(v);
        self
    }
    /// Sets the evaluation budget.
    pub fn maxn(mut self, v: usize) -> Self {
        self.cfg.maxn = v;
        self
    }
    /// Sets the plateau window length.
    pub fn kstop(mut self, v: usize) -> Self {
        self.cfg.kstop = v;
        self
    }
    /// Sets the plateau threshold.
    pub fn pcento(mut self, v: f64) -> Self {
        self.cfg.pcento = v;
        self
    }
    /// Sets the space-collapse threshold.
    pub fn peps(mut self, v: f64) -> Self {
        self.cfg.peps = v;
        self
    }
    /// Includes (or not) the initial values in the first population.
    pub fn include_initial_guess(mut self, v: bool) -> Self {
        self.cfg.include_initial_guess = v;
        self
    }
    /// Sets the random seed for reproducibility.
    pub fn seed(mut self, v: u64) -> Self {
        self.cfg.seed = Some(v);
        self
    }
    /// Sets the rejection-sampling cap.
    pub fn max_sample_attempts(mut self, v: usize) -> Self {
        self.cfg.max_sample_attempts = v;
        self
    }
    /// Sets the parallel evaluation configuration.
    pub fn parallel(mut self, v: ParallelConfig) -> Self {
        self.cfg.parallel = v;
        self
    }
    /// Enables/disables progress display.
    pub fn disp(mut self, v: bool) -> Self {
        self.cfg.disp = v;
        self
    }
    /// Sets a per-loop callback function.
    pub fn callback(mut self, cb: CallbackFn) -> Self {
        self.cfg.callback = Some(cb);
        self
    }
    /// Builds and validates the configuration.
    ///
    /// Sizes that depend on the problem dimension are checked again when the
    /// optimizer resolves its layout.
    ///
    /// # Errors
    ///
    /// Returns `SCEError::InvalidSetting` if a size is out of range and
    /// `SCEError::InvalidThreshold` if `pcento` or `peps` is negative or not finite.
    pub fn build(self) -> Result<SCEConfig> {
        let cfg = &self.cfg;
        if cfg.ngs == 0 {
            return Err(invalid("ngs", cfg.ngs, "at least one complex is required"));
        }
        if cfg.npg == Some(0) {
            return Err(invalid("npg", 0, "a complex needs at least one point"));
        }
        if let Some(nps) = cfg.nps {
            if nps < 2 {
                return Err(invalid("nps", nps, "a simplex needs at least 2 points"));
            }
            if cfg.npg.is_some_and(|npg| nps > npg) {
                return Err(invalid("nps", nps, "a simplex cannot be larger than its complex (npg)"));
            }
        }
        if cfg.alpha == 0 {
            return Err(invalid("alpha", cfg.alpha, "must be >= 1"));
        }
        if cfg.beta == Some(0) {
            return Err(invalid("beta", 0, "must be >= 1"));
        }
        if cfg.kstop == 0 {
            return Err(invalid("kstop", cfg.kstop, "must be >= 1"));
        }
        if cfg.max_sample_attempts == 0 {
            return Err(invalid(
                "max_sample_attempts",
                0,
                "at least one draw is required",
            ));
        }
        check_threshold("pcento", cfg.pcento)?;
        check_threshold("peps", cfg.peps)?;
        Ok(self.cfg)
    }
}

/// A calibration problem as stored on disk: parameters plus optimizer settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Parameters to calibrate, in order.
    pub parameters: Vec<ParameterSpec>,
    /// Optimizer settings.
    #[serde(default)]
    pub sce: SCEConfig,
}

impl CalibrationConfig {
    /// Load a calibration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SCEError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&contents)
    }

    /// Parse a calibration from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| SCEError::Config(format!("Failed to parse JSON: {}", e)))
    }

    /// Save the calibration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SCEError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, json)
            .map_err(|e| SCEError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Validated parameter space.
    pub fn parameter_space(&self) -> Result<ParameterSpace> {
        ParameterSpace::new(&self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_formulas() {
        let layout = SCEConfig::default().layout(7).unwrap();
        assert_eq!(layout.ngs, 10);
        assert_eq!(layout.npg, 15);
        assert_eq!(layout.nps, 8);
        assert_eq!(layout.alpha, 1);
        assert_eq!(layout.beta, 15);
        assert_eq!(layout.npt, 150);
        assert_eq!(layout.complex_cost(), 45);
    }

    #[test]
    fn test_layout_rejects_bad_sizes() {
        let err = SCEConfigBuilder::new().ngs(0).build().unwrap_err();
        assert!(matches!(err, SCEError::InvalidSetting { name: "ngs", .. }));

        let err = SCEConfigBuilder::new().nps(1).build().unwrap_err();
        assert!(matches!(err, SCEError::InvalidSetting { name: "nps", .. }));

        let err = SCEConfigBuilder::new().npg(3).nps(4).build().unwrap_err();
        assert!(err.is_config_error());

        let err = SCEConfigBuilder::new().kstop(0).build().unwrap_err();
        assert!(matches!(err, SCEError::InvalidSetting { name: "kstop", .. }));

        let err = SCEConfigBuilder::new().max_sample_attempts(0).build().unwrap_err();
        assert!(err.is_config_error());

        assert!(matches!(
            SCEConfig::default().layout(0),
            Err(SCEError::EmptyParameterSpace)
        ));
    }

    #[test]
    fn test_thresholds_must_be_finite_and_non_negative() {
        let err = SCEConfigBuilder::new().pcento(f64::NAN).build().unwrap_err();
        assert!(matches!(err, SCEError::InvalidThreshold { name: "pcento", .. }));
        assert!(err.is_config_error());

        let err = SCEConfigBuilder::new().peps(-1e-3).build().unwrap_err();
        assert!(matches!(err, SCEError::InvalidThreshold { name: "peps", .. }));

        let err = SCEConfigBuilder::new().peps(f64::INFINITY).build().unwrap_err();
        assert!(matches!(err, SCEError::InvalidThreshold { name: "peps", .. }));

        // zero disables the criterion and stays valid
        assert!(SCEConfigBuilder::new().pcento(0.0).peps(0.0).build().is_ok());

        // fields set directly (or read from a file) are caught when the layout is resolved
        let cfg = SCEConfig {
            pcento: f64::NAN,
            ..SCEConfig::default()
        };
        assert!(matches!(
            cfg.layout(2),
            Err(SCEError::InvalidThreshold { name: "pcento", .. })
        ));
    }

    #[test]
    fn test_builder_accepts_sizes_that_fit_larger_problems() {
        // npg defaults to 3 for nopt = 1, but nps alone cannot be judged before nopt is known
        let cfg = SCEConfigBuilder::new().nps(4).build().unwrap();
        assert!(cfg.layout(3).is_ok());
        assert!(cfg.layout(1).is_err());
    }

    #[test]
    fn test_dimension_dependent_check() {
        // nps = 5 fits the defaults for nopt = 2 (npg = 5) but not for nopt = 1 (npg = 3)
        let cfg = SCEConfig {
            nps: Some(5),
            ..SCEConfig::default()
        };
        assert!(cfg.layout(2).is_ok());
        assert!(cfg.layout(1).is_err());
    }

    #[test]
    fn test_calibration_json_roundtrip_with_defaults() {
        let json = r#"{
            "parameters": [
                {"name": "KC", "initial": 0.8, "lower": 0.2, "upper": 1.5},
                {"name": "CS", "initial": 0.5, "lower": 0.0, "upper": 1.0}
            ],
            "sce": {"ngs": 4, "maxn": 3000, "seed": 7}
        }"#;
        let cal = CalibrationConfig::from_json(json).unwrap();
        assert_eq!(cal.parameters.len(), 2);
        assert_eq!(cal.sce.ngs, 4);
        assert_eq!(cal.sce.maxn, 3000);
        assert_eq!(cal.sce.seed, Some(7));
        assert_eq!(cal.sce.kstop, DEFAULT_KSTOP);
        assert!(cal.sce.include_initial_guess);
        let space = cal.parameter_space().unwrap();
        assert_eq!(space.names()[0], "KC");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        cal.to_file(&path).unwrap();
        let back = CalibrationConfig::from_file(&path).unwrap();
        assert_eq!(back.parameters, cal.parameters);
        assert_eq!(back.sce.maxn, 3000);
    }

    #[test]
    fn test_calibration_errors() {
        let err = CalibrationConfig::from_json("{ not json").unwrap_err();
        assert!(err.is_config_error());
        let err = CalibrationConfig::from_file("/nonexistent/calibration.json").unwrap_err();
        assert!(err.to_string().starts_with("configuration error: Failed to read"));
    }
}
