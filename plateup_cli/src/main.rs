use clap::{Parser, Subcommand, ValueEnum};
use plateup_core::body_metrics::{bmi_category, body_fat_category};
use plateup_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "plateup")]
#[command(about = "Percentage-based strength training tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a percentage of a max into a loadable weight
    Weight {
        #[arg(long)]
        max: f64,
        #[arg(long)]
        percent: f64,
        /// Rounding step (defaults to 5 lb or 2.5 kg)
        #[arg(long)]
        increment: Option<f64>,
        /// Floor for the result (defaults to the configured bar)
        #[arg(long)]
        min: Option<f64>,
    },

    /// Show a warm-up ladder up to the working max
    Warmup {
        #[arg(long)]
        max: f64,
        #[arg(long)]
        increment: Option<f64>,
        #[arg(long)]
        bar: Option<f64>,
    },

    /// Show which plates to load for a target weight
    Plates {
        #[arg(long)]
        target: f64,
        #[arg(long)]
        bar: Option<f64>,
    },

    /// Estimate body fat with the US Navy method (inches / pounds)
    BodyFat {
        #[arg(long, value_enum)]
        gender: GenderArg,
        #[arg(long)]
        height: f64,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        waist: f64,
        #[arg(long)]
        neck: f64,
        #[arg(long)]
        hip: Option<f64>,
        /// Save the measurement to history
        #[arg(long)]
        save: bool,
    },

    /// Manage the exercise library
    Exercise {
        #[command(subcommand)]
        action: ExerciseAction,
    },

    /// Manage routines
    Routine {
        #[command(subcommand)]
        action: RoutineAction,
    },

    /// Run a workout from a routine
    Workout {
        #[arg(long)]
        routine: Uuid,

        /// Log every set at its target (for testing)
        #[arg(long)]
        auto_complete: bool,

        /// Do not wait for rest timers
        #[arg(long)]
        no_rest: bool,
    },

    /// Export finished workouts to CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ExerciseAction {
    /// Add an exercise
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        max: f64,
        /// Progression step (defaults to 5 lb or 2.5 kg)
        #[arg(long)]
        increment: Option<f64>,
        /// Rest between sets (defaults to the configured rest)
        #[arg(long)]
        rest: Option<u32>,
        /// Bar or implement weight if not the standard bar
        #[arg(long)]
        baseline: Option<f64>,
        /// Enable auto-progression regardless of the configured default
        #[arg(long, conflicts_with = "no_auto")]
        auto: bool,
        /// Disable auto-progression
        #[arg(long, conflicts_with = "auto")]
        no_auto: bool,
    },
    /// List exercises
    List,
    /// Set a new max
    SetMax {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        max: f64,
    },
}

#[derive(Subcommand)]
enum RoutineAction {
    /// Add a routine, e.g. --exercise <ID>:60x5,80x3,100x5 --exercise <ID>:@135x8,barx10
    Add {
        #[arg(long)]
        name: String,
        #[arg(long = "exercise", value_parser = parse_routine_exercise, required = true)]
        exercises: Vec<RoutineExercise>,
    },
    /// List routines
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

fn main() -> Result<()> {
    plateup_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let store = JsonFileStore::new(data_dir.join("store"));

    match cli.command {
        Commands::Weight {
            max,
            percent,
            increment,
            min,
        } => {
            let increment = increment.unwrap_or_else(|| config.units().default_increment());
            let min = min.unwrap_or_else(|| config.bar_weight());
            let weight = calculate_weight_from_percentage(max, percent, increment, min);
            println!(
                "{}% of {} = {} {}",
                format_weight(percent),
                format_weight(max),
                format_weight(weight),
                config.units().label()
            );
            Ok(())
        }
        Commands::Warmup {
            max,
            increment,
            bar,
        } => {
            let increment = increment.unwrap_or_else(|| config.units().default_increment());
            let bar = bar.unwrap_or_else(|| config.bar_weight());
            let ladder: Vec<String> = generate_warmup_sets(max, increment, bar)
                .into_iter()
                .map(format_weight)
                .collect();
            println!("Warm-up: {}", ladder.join(", "));
            Ok(())
        }
        Commands::Plates { target, bar } => cmd_plates(&store, &config, target, bar),
        Commands::BodyFat {
            gender,
            height,
            weight,
            waist,
            neck,
            hip,
            save,
        } => {
            let measurements = BodyMeasurements {
                gender: gender.into(),
                height_inches: height,
                weight_lbs: weight,
                waist_inches: waist,
                neck_inches: neck,
                hip_inches: hip,
            };
            cmd_body_fat(store, measurements, save)
        }
        Commands::Exercise { action } => cmd_exercise(store, &config, action),
        Commands::Routine { action } => cmd_routine(store, action),
        Commands::Workout {
            routine,
            auto_complete,
            no_rest,
        } => cmd_workout(store, &config, routine, auto_complete, no_rest),
        Commands::Export { out } => {
            let workouts: Vec<WorkoutSession> = store.list()?;
            let count = export_workouts_csv(&workouts, &out)?;
            println!("✓ Exported {} sets to {}", count, out.display());
            Ok(())
        }
    }
}

/// Parse `<exercise id>:<set>,<set>,...` where a set is `70x5` (percent),
/// `@135x5` (fixed weight) or `barx10`, optionally followed by `/rest`
fn parse_routine_exercise(input: &str) -> std::result::Result<RoutineExercise, String> {
    let (id, sets) = input
        .split_once(':')
        .ok_or_else(|| format!("expected <exercise id>:<sets>, got '{}'", input))?;
    let exercise_id = Uuid::parse_str(id.trim()).map_err(|e| format!("bad exercise id: {}", e))?;

    let sets = sets
        .split(',')
        .map(|s| parse_set_plan(s.trim()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RoutineExercise { exercise_id, sets })
}

fn parse_set_plan(input: &str) -> std::result::Result<SetPlan, String> {
    let (body, rest) = match input.split_once('/') {
        Some((body, rest)) => (
            body,
            Some(rest.parse::<u32>().map_err(|_| format!("bad rest in '{}'", input))?),
        ),
        None => (input, None),
    };

    let (load, reps) = body
        .rsplit_once('x')
        .ok_or_else(|| format!("expected <load>x<reps>, got '{}'", input))?;
    let reps: u32 = reps.parse().map_err(|_| format!("bad reps in '{}'", input))?;

    let mut plan = if load.eq_ignore_ascii_case("bar") {
        SetPlan::bar_only(reps)
    } else if let Some(fixed) = load.strip_prefix('@') {
        let weight = fixed.parse().map_err(|_| format!("bad weight in '{}'", input))?;
        SetPlan::fixed(weight, reps)
    } else {
        let percent = load
            .trim_end_matches('%')
            .parse()
            .map_err(|_| format!("bad percentage in '{}'", input))?;
        SetPlan::percentage(percent, reps)
    };
    plan.rest_seconds_override = rest;
    Ok(plan)
}

fn cmd_plates(store: &JsonFileStore, config: &Config, target: f64, bar: Option<f64>) -> Result<()> {
    let bar = bar.unwrap_or_else(|| config.bar_weight());
    let mut inventory: Vec<PlateInventoryEntry> = store.list()?;
    if inventory.is_empty() {
        inventory = config.plate_inventory();
    }

    let plan = calculate_plates(target, bar, &inventory);
    println!("{}", format_plate_calculation(&plan));
    if !plan.is_exact {
        println!(
            "  Closest loadable: {} {}",
            format_weight(plan.achievable_weight),
            config.units().label()
        );
    }
    Ok(())
}

fn cmd_body_fat(
    mut store: JsonFileStore,
    measurements: BodyMeasurements,
    save: bool,
) -> Result<()> {
    let metrics = calculate_body_metrics(&measurements)?;

    println!(
        "Body fat: {}% ({})",
        metrics.body_fat_percentage,
        body_fat_category(metrics.body_fat_percentage, measurements.gender)
    );
    println!("Fat mass: {} lb", metrics.fat_mass);
    println!("Lean mass: {} lb", metrics.lean_mass);
    println!("BMI: {} ({})", metrics.bmi, bmi_category(metrics.bmi));

    if save {
        let entry = BodyCompositionEntry {
            id: Uuid::new_v4(),
            recorded_at: chrono::Utc::now(),
            measurements,
            metrics,
        };
        store.insert(&entry)?;
        println!("\n✓ Measurement saved");
    }
    Ok(())
}

fn cmd_exercise(mut store: JsonFileStore, config: &Config, action: ExerciseAction) -> Result<()> {
    match action {
        ExerciseAction::Add {
            name,
            max,
            increment,
            rest,
            baseline,
            auto,
            no_auto,
        } => {
            let increment = increment.unwrap_or_else(|| config.units().default_increment());
            let mut profile = ExerciseProfile::new(name, max, increment);
            profile.default_rest_seconds = rest.unwrap_or_else(|| config.default_rest_seconds());
            profile.auto_progression_enabled = if auto {
                true
            } else if no_auto {
                false
            } else {
                config.auto_progression_default()
            };
            profile.equipment_baseline = baseline;
            store.insert(&profile)?;

            println!("✓ Added exercise '{}'", profile.name);
            println!("  id: {}", profile.id);
        }
        ExerciseAction::List => {
            let mut exercises: Vec<ExerciseProfile> = store.list()?;
            exercises.sort_by(|a, b| a.name.cmp(&b.name));
            if exercises.is_empty() {
                println!("No exercises yet.");
            }
            for e in exercises {
                println!(
                    "{}  {}  max {} {} (+{}){}",
                    e.id,
                    e.name,
                    format_weight(e.max_weight),
                    config.units().label(),
                    format_weight(e.weight_increment),
                    if e.auto_progression_enabled { "" } else { "  [manual]" }
                );
            }
        }
        ExerciseAction::SetMax { id, max } => {
            let mut profile: ExerciseProfile = store.require(id)?;
            profile.max_weight = max;
            store.update(&profile)?;
            println!("✓ {} max set to {}", profile.name, format_weight(max));
        }
    }
    Ok(())
}

fn cmd_routine(mut store: JsonFileStore, action: RoutineAction) -> Result<()> {
    match action {
        RoutineAction::Add { name, exercises } => {
            for planned in &exercises {
                store.require::<ExerciseProfile>(planned.exercise_id)?;
            }

            let routine = Routine {
                id: Uuid::new_v4(),
                name,
                exercises,
            };
            store.insert(&routine)?;

            println!("✓ Added routine '{}'", routine.name);
            println!("  id: {}", routine.id);
        }
        RoutineAction::List => {
            let routines: Vec<Routine> = store.list()?;
            if routines.is_empty() {
                println!("No routines yet.");
            }
            for r in routines {
                let sets: usize = r.exercises.iter().map(|e| e.sets.len()).sum();
                println!(
                    "{}  {}  ({} exercises, {} sets)",
                    r.id,
                    r.name,
                    r.exercises.len(),
                    sets
                );
            }
        }
    }
    Ok(())
}

enum SetAction {
    Done(u32),
    Skip,
    Quit,
}

fn prompt_set(target_reps: u32) -> Result<SetAction> {
    print!("  reps [{}], 's' skip, 'q' cancel workout > ", target_reps);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let action = match input.trim().to_lowercase().as_str() {
        "" => SetAction::Done(target_reps),
        "s" => SetAction::Skip,
        "q" => SetAction::Quit,
        other => match other.parse() {
            Ok(reps) => SetAction::Done(reps),
            Err(_) => {
                println!("  Not a number, logging target reps");
                SetAction::Done(target_reps)
            }
        },
    };
    Ok(action)
}

fn run_rest_timer<S: RecordStore, F: Feedback>(engine: &mut SessionEngine<S, F>) -> Result<()> {
    while engine.rest_timer().is_running {
        print!("\r  Rest: {:>3}s ", engine.rest_timer().remaining_seconds);
        io::stdout().flush()?;
        std::thread::sleep(Duration::from_secs(1));
        if engine.tick() {
            println!("\r  Rest complete.   ");
        }
    }
    Ok(())
}

/// Walk every set of the started workout
///
/// Returns false when the user cancelled; the workout is already discarded.
fn run_sets<S: RecordStore, F: Feedback>(
    engine: &mut SessionEngine<S, F>,
    units: &str,
    auto_complete: bool,
    no_rest: bool,
) -> Result<bool> {
    let layout: Vec<(String, usize)> = engine
        .session()
        .map(|s| s.exercises.iter().map(|e| (e.name.clone(), e.sets.len())).collect())
        .unwrap_or_default();

    for (exercise_index, (name, set_count)) in layout.iter().enumerate() {
        engine.set_current_exercise(exercise_index)?;

        let warmups: Vec<String> = engine
            .warmup_sets(exercise_index)?
            .into_iter()
            .map(format_weight)
            .collect();
        println!("\n  {}", name);
        println!("  Warm-up ladder: {}", warmups.join(", "));

        for set_index in 0..*set_count {
            let current = engine.session().and_then(|s| s.set(exercise_index, set_index));
            let Some(set) = current.cloned() else {
                continue;
            };
            let plan = engine.plate_plan(exercise_index, set_index)?;

            let percent = set
                .percentage_of_max
                .map(|p| format!(" ({}%)", format_weight(p)))
                .unwrap_or_default();
            println!(
                "\n  Set {}: {} {} x {}{}",
                set_index + 1,
                format_weight(set.target_weight),
                units,
                set.target_reps,
                percent
            );
            println!("  Plates: {}", format_plate_calculation(&plan));

            let action = if auto_complete {
                SetAction::Done(set.target_reps)
            } else {
                prompt_set(set.target_reps)?
            };

            match action {
                SetAction::Done(reps) => {
                    engine.complete_set(exercise_index, set_index, set.target_weight, reps)?;
                    println!("  ✓ Logged {} reps", reps);
                    if no_rest {
                        engine.skip_rest_timer();
                    } else {
                        run_rest_timer(engine)?;
                    }
                }
                SetAction::Skip => println!("  Skipped"),
                SetAction::Quit => {
                    engine.cancel_workout()?;
                    println!("\nWorkout cancelled. Nothing was saved.");
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}

fn cmd_workout(
    store: JsonFileStore,
    config: &Config,
    routine_id: Uuid,
    auto_complete: bool,
    no_rest: bool,
) -> Result<()> {
    let routine: Routine = store.require(routine_id)?;
    let units = config.units().label();

    let mut engine = SessionEngine::new(store, LogFeedback::new(config.feedback), config);
    engine.start(&routine)?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", routine.name);
    println!("╰─────────────────────────────────────────╯");

    let outcome = match run_sets(&mut engine, units, auto_complete, no_rest) {
        Ok(true) => engine.complete_workout(),
        Ok(false) => return Ok(()),
        Err(e) => Err(e),
    };

    let results = match outcome {
        Ok(results) => results,
        Err(e) => {
            // Leave no half-finished workout behind
            match engine.cancel_workout() {
                Ok(_) => eprintln!("\nWorkout discarded: {}", e),
                Err(cleanup) => tracing::warn!("Could not discard workout: {}", cleanup),
            }
            return Err(e);
        }
    };

    println!("\n✓ Workout complete!");
    for result in &results {
        let name = engine
            .session()
            .and_then(|s| s.exercises.iter().find(|e| e.exercise_id == result.exercise_id))
            .map_or("?", |e| e.name.as_str());
        if result.should_progress {
            println!(
                "  ↑ {}: max {} → {} {}",
                name,
                format_weight(result.previous_max_weight),
                format_weight(result.new_max_weight),
                units
            );
        } else {
            println!("  = {}: {}", name, result.reason);
        }
    }

    Ok(())
}
