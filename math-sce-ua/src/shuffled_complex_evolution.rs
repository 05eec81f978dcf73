use crate::{
    CalibrationConfig, Objective, ParameterSpace, Result, SCEConfig, SCEReport, ShuffledComplexEvolution,
};

/// Runs SCE-UA optimization on a function over a box.
///
/// This is a convenience function mirroring the classic `sceua(func, bl, bu)`
/// entry point. Parameters are named `x1..xn` and start from the midpoint of
/// their interval.
///
/// # Arguments
///
/// * `func` - The objective to minimize; closures `Fn(&Array1<f64>) -> f64` qualify
/// * `bounds` - Slice of (lower, upper) bound pairs for each dimension
/// * `config` - SCE-UA configuration (use `SCEConfigBuilder` to construct)
///
/// # Errors
///
/// Returns `SCEError::InvalidBounds` if any bound pair has `upper <= lower`,
/// and any configuration or initialization error of the run.
///
/// # Example
///
/// ```rust
/// use math_audio_sce_ua::{shuffled_complex_evolution, SCEConfigBuilder};
/// use ndarray::Array1;
///
/// let result = shuffled_complex_evolution(
///     &|x: &Array1<f64>| x[0].powi(2) + x[1].powi(2),
///     &[(-5.0, 5.0), (-5.0, 5.0)],
///     SCEConfigBuilder::new().maxn(2000).seed(42).build().expect("valid config"),
/// ).expect("optimization failed");
///
/// assert!(result.fun < 0.01);
/// ```
pub fn shuffled_complex_evolution<O>(func: &O, bounds: &[(f64, f64)], config: SCEConfig) -> Result<SCEReport>
where
    O: Objective + Sync + ?Sized,
{
    let space = ParameterSpace::from_bounds(bounds)?;
    let mut sce = ShuffledComplexEvolution::new(func, space);
    *sce.config_mut() = config;
    sce.solve()
}

/// Calibrates `objective` over the parameters and settings of a calibration file.
///
/// # Errors
///
/// Invalid parameter records, configuration errors and initialization failures.
pub fn calibrate<O>(objective: &O, calibration: CalibrationConfig) -> Result<SCEReport>
where
    O: Objective + Sync + ?Sized,
{
    let space = calibration.parameter_space()?;
    ShuffledComplexEvolution::new(objective, space)
        .with_config(calibration.sce)
        .solve()
}
