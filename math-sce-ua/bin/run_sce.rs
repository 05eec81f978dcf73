use clap::Parser;
use math_audio_sce_ua::{
    CalibrationConfig, Objective, ParallelConfig, ParameterSpace, SCEConfig, SCEReport, ShuffledComplexEvolution,
    function_registry::{BenchmarkFunction, FunctionRegistry},
};
use ndarray::Array1;
use std::fmt::Write as FmtWrite;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "run_sce",
    about = "Minimize a benchmark function with the SCE-UA optimizer"
)]
struct Cli {
    /// Name of the benchmark function to optimize (use --list-functions to see available options)
    #[arg(long, default_value = "sphere")]
    function: String,

    /// Dimensionality of the problem (ignored with --config)
    #[arg(long, default_value_t = 2)]
    dim: usize,

    /// Calibration JSON file with parameter bounds and optimizer settings; the
    /// objective is still the benchmark chosen with --function
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of objective evaluations
    #[arg(long)]
    maxn: Option<usize>,

    /// Number of complexes
    #[arg(long)]
    ngs: Option<usize>,

    /// Number of shuffle loops in the plateau window
    #[arg(long)]
    kstop: Option<usize>,

    /// Plateau threshold on the relative change of the best value
    #[arg(long)]
    pcento: Option<f64>,

    /// Threshold on the normalized geometric range of the population
    #[arg(long)]
    peps: Option<f64>,

    /// Optional random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Start from random points only, without the initial parameter values
    #[arg(long)]
    no_initial_guess: bool,

    /// Evolve the complexes of each loop in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of threads for parallel evolution (0 = use all available cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Print optimizer progress to stderr
    #[arg(long)]
    disp: bool,

    /// List all available functions and exit
    #[arg(long)]
    list_functions: bool,
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let registry = FunctionRegistry::new();

    if args.list_functions {
        list_available_functions(&registry);
        return;
    }

    let bench = match resolve_function(&registry, args.function.trim()) {
        Some(b) => b,
        None => {
            eprintln!(
                "Error: function '{}' not found. Use --list-functions to inspect available names.",
                args.function
            );
            process::exit(2);
        }
    };

    let (space, mut config) = match load_problem(&args, &bench) {
        Ok(problem) => problem,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    apply_overrides(&args, &mut config);

    let objective = |x: &Array1<f64>| (bench.func)(x);

    print_parameter_table(&space);
    match objective.evaluate(space.initial()) {
        Ok(f) => println!("Objective at initial values: {:.6e}", f),
        Err(e) => println!("Objective at initial values: failed ({})", e),
    }

    println!(
        "Running SCE-UA on '{}' ({}D)...",
        bench.name,
        space.nopt()
    );
    let start = Instant::now();
    let mut sce = ShuffledComplexEvolution::new(&objective, space).with_config(config);
    let report = match sce.solve() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: optimization failed: {}", e);
            process::exit(2);
        }
    };

    println!("\nOptimization completed in {:.2?}", start.elapsed());
    print_report(sce.space(), &report, &bench);
}

fn load_problem(args: &Cli, bench: &BenchmarkFunction) -> math_audio_sce_ua::Result<(ParameterSpace, SCEConfig)> {
    match &args.config {
        Some(path) => {
            let calibration = CalibrationConfig::from_file(path)?;
            let space = calibration.parameter_space()?;
            Ok((space, calibration.sce))
        }
        None => {
            let space = ParameterSpace::from_bounds(&bench.bounds_for(args.dim))?;
            Ok((space, SCEConfig::default()))
        }
    }
}

fn apply_overrides(args: &Cli, config: &mut SCEConfig) {
    if let Some(maxn) = args.maxn {
        config.maxn = maxn;
    }
    if let Some(ngs) = args.ngs {
        config.ngs = ngs;
    }
    if let Some(kstop) = args.kstop {
        config.kstop = kstop;
    }
    if let Some(pcento) = args.pcento {
        config.pcento = pcento;
    }
    if let Some(peps) = args.peps {
        config.peps = peps;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_initial_guess {
        config.include_initial_guess = false;
    }
    if args.parallel {
        config.parallel = ParallelConfig {
            enabled: true,
            num_threads: if args.threads == 0 {
                None
            } else {
                Some(args.threads)
            },
        };
    }
    config.disp |= args.disp;
}

fn list_available_functions(registry: &FunctionRegistry) {
    let names = registry.list_functions();
    println!("Available test functions ({}):", names.len());
    for name in names {
        println!("- {name}");
    }
}

fn resolve_function(registry: &FunctionRegistry, requested: &str) -> Option<BenchmarkFunction> {
    registry
        .get(requested)
        .or_else(|| registry.get(&requested.to_lowercase()))
}

fn print_parameter_table(space: &ParameterSpace) {
    println!("{:<12} {:>14} {:>14} {:>14}", "parameter", "initial", "lower", "upper");
    for i in 0..space.nopt() {
        println!(
            "{:<12} {:>14.6} {:>14.6} {:>14.6}",
            space.names()[i],
            space.initial()[i],
            space.lower()[i],
            space.upper()[i]
        );
    }
}

fn print_report(space: &ParameterSpace, report: &SCEReport, bench: &BenchmarkFunction) {
    println!("Status: {}", report.message);
    println!(
        "Loops: {} | Evaluations: {} (failed {}) | Success: {}",
        report.nloop, report.nfev, report.nfail, report.success
    );
    println!(
        "Best objective: {:.6e} (known minimum {:.1})",
        report.fun, bench.minimum
    );
    println!("Best parameters:");
    for (name, value) in space.names().iter().zip(report.x.iter()) {
        println!("  {:<12} {:>14.6}", name, value);
    }
    println!(
        "Simplex steps: {} reflections, {} contractions, {} mutations ({} failed)",
        report.stats.reflections, report.stats.contractions, report.stats.mutations, report.stats.failed_mutations
    );

    println!("\n{:>5} {:>8} {:>14} {:>12} {:>12}", "loop", "nfev", "best_f", "ratio", "gnrng");
    for rec in report.history.records() {
        let mut ratio = String::new();
        match rec.ratio {
            Some(r) => {
                let _ = write!(&mut ratio, "{r:.3e}");
            }
            None => ratio.push('-'),
        }
        println!(
            "{:>5} {:>8} {:>14.6e} {:>12} {:>12.3e}",
            rec.nloop, rec.nfev, rec.fun, ratio, rec.gnrng
        );
    }
}
