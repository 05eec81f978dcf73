use math_audio_sce_ua::function_registry::FunctionRegistry;
use math_audio_sce_ua::{
    CalibrationConfig, EvaluationError, FnSimulator, NashSutcliffeObjective, ParameterSpace, ParameterSpec,
    SCEConfigBuilder, SCEError, ShuffledComplexEvolution, TerminationReason, calibrate,
    shuffled_complex_evolution,
};
use ndarray::{Array1, array};

#[test]
fn test_registry_benchmarks_reach_their_minimum() {
    let registry = FunctionRegistry::new();
    for (name, tol) in [("sphere", 1e-4), ("rosenbrock", 1e-2)] {
        let bench = registry.get(name).unwrap();
        let config = SCEConfigBuilder::new()
            .maxn(10_000)
            .pcento(1e-3)
            .include_initial_guess(false)
            .seed(42)
            .build()
            .unwrap();
        let report = shuffled_complex_evolution(&bench.func, &bench.bounds_for(2), config).unwrap();
        assert!(
            (report.fun - bench.minimum).abs() < tol,
            "{name}: f={} ({})",
            report.fun,
            report.message
        );
    }
}

#[test]
fn test_calibration_file_drives_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calibration.json");
    let json = r#"{
        "parameters": [
            {"name": "x", "initial": 1.0, "lower": -4.0, "upper": 4.0},
            {"name": "y", "initial": -1.0, "lower": -4.0, "upper": 4.0}
        ],
        "sce": {"ngs": 5, "maxn": 3000, "kstop": 10, "seed": 17}
    }"#;
    std::fs::write(&path, json).unwrap();

    let calibration = CalibrationConfig::from_file(&path).unwrap();
    assert_eq!(calibration.sce.ngs, 5);
    assert!(calibration.sce.include_initial_guess);

    let shifted = |p: &Array1<f64>| (p[0] - 1.5).powi(2) + (p[1] + 0.5).powi(2);
    let report = calibrate(&shifted, calibration).unwrap();
    assert!(report.fun < 1e-3, "f={}", report.fun);
    assert!((report.x[0] - 1.5).abs() < 0.05);
    assert!((report.x[1] + 0.5).abs() < 0.05);
    // 5 complexes of 5 points
    assert_eq!(report.population.nrows(), 25);
}

#[test]
fn test_nse_objective_with_failing_simulator_regions() {
    // recession curve q_t = q0 * exp(-t / tau); tau below 3 makes the model blow up
    let times = Array1::<f64>::linspace(0.0, 9.0, 10);
    let observed = times.mapv(|t| 50.0 * (-t / 4.0).exp());
    let t = times.clone();
    let simulator = FnSimulator(move |p: &Array1<f64>| {
        if p[1] < 3.0 {
            return Err(EvaluationError::Simulation(format!("unstable time constant {}", p[1])));
        }
        Ok(t.mapv(|ti| p[0] * (-ti / p[1]).exp()))
    });
    let objective = NashSutcliffeObjective::new(simulator, observed);

    let space = ParameterSpace::new(&[
        ParameterSpec::new("q0", 20.0, 1.0, 100.0),
        ParameterSpec::new("tau", 8.0, 0.5, 20.0),
    ])
    .unwrap();
    let config = SCEConfigBuilder::new().maxn(4000).seed(9).build().unwrap();
    let report = ShuffledComplexEvolution::new(&objective, space)
        .with_config(config)
        .solve()
        .unwrap();
    assert!(report.nfail > 0);
    assert!(report.fun < 1e-4, "1 - NSE = {}", report.fun);
    assert!((report.x[0] - 50.0).abs() < 1.0);
    assert!((report.x[1] - 4.0).abs() < 0.1);
}

#[test]
fn test_termination_reasons_are_reported() {
    let sphere = |x: &Array1<f64>| x.iter().map(|v| v * v).sum::<f64>();
    let config = SCEConfigBuilder::new().maxn(60).seed(1).build().unwrap();
    let report = shuffled_complex_evolution(&sphere, &[(-1.0, 1.0)], config).unwrap();
    assert!(matches!(report.reason, TerminationReason::MaxEvaluations { maxn: 60 }));
    assert_eq!(report.message, report.reason.to_string());
    assert!(report.message.contains("60"));
}

#[test]
fn test_bad_inputs_surface_as_errors() {
    let sphere = |x: &Array1<f64>| x.iter().map(|v| v * v).sum::<f64>();
    let err = shuffled_complex_evolution(&sphere, &[], SCEConfigBuilder::new().build().unwrap()).unwrap_err();
    assert!(matches!(err, SCEError::EmptyParameterSpace));
    assert!(err.is_bounds_error());

    let err = CalibrationConfig::from_json("{ not json").unwrap_err();
    assert!(err.is_config_error());

    let err = ParameterSpace::from_bounds(&[(0.0, 1.0)])
        .unwrap()
        .with_initial(array![0.5, 0.5])
        .unwrap_err();
    assert!(matches!(
        err,
        SCEError::InitialGuessDimensionMismatch { expected: 1, got: 2 }
    ));
}
