//! glycorisk CLI
//!
//! Diabetes risk scoring from daily health metrics.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glycorisk::{
    config::Config,
    core::{FhirBuilder, RiskResult, RiskScorer},
    input::{DailyEntry, DailyForm, FormFields, ProfileForm, UserProfile},
    transparency::TransparencyLog,
    wizard::{Wizard, WizardError, WizardStep},
    MEDICAL_DISCLAIMER, VERSION,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Exit code for rejected input.
const EXIT_INVALID_INPUT: i32 = 2;

#[derive(Parser)]
#[command(name = "glycorisk")]
#[command(version = VERSION)]
#[command(about = "Diabetes risk scoring from daily health metrics", long_about = None)]
struct Cli {
    /// Log scoring details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ArtifactArgs {
    /// Model artifact (defaults to the configured path)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Scaler artifact (defaults to the configured path)
    #[arg(long)]
    scaler: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one profile and daily entry given as flags
    Assess {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Age in years
        #[arg(long)]
        age: Option<String>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<String>,
        /// Height in cm
        #[arg(long)]
        height: Option<String>,
        /// Blood glucose in mg/dL
        #[arg(long)]
        glucose: Option<String>,
        /// Physical activity in minutes
        #[arg(long)]
        activity: Option<String>,
        /// healthy or unhealthy
        #[arg(long)]
        diet: Option<String>,
        /// good or poor
        #[arg(long)]
        adherence: Option<String>,
        /// low, medium or high
        #[arg(long)]
        stress: Option<String>,
        /// Hours of sleep
        #[arg(long)]
        sleep: Option<String>,
        /// yes or no
        #[arg(long)]
        hydration: Option<String>,

        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Write a FHIR export
        #[arg(long)]
        export: bool,

        /// Export directory (defaults to the configured path)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enter a profile and daily metrics interactively
    Wizard {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Show artifact availability and usage statistics
    Status,

    /// Show or update configuration
    Config {
        /// IANA time zone for export timestamps
        #[arg(long)]
        timezone: Option<String>,

        /// Default model artifact path
        #[arg(long)]
        model: Option<PathBuf>,

        /// Default scaler artifact path
        #[arg(long)]
        scaler: Option<PathBuf>,

        /// Default export directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Export after every assessment
        #[arg(long)]
        auto_export: Option<bool>,
    },

    /// Display the medical disclaimer
    Disclaimer,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Assess {
            user_id,
            name,
            age,
            weight,
            height,
            glucose,
            activity,
            diet,
            adherence,
            stress,
            sleep,
            hydration,
            artifacts,
            export,
            output,
            json,
        } => {
            let profile = ProfileForm {
                user_id,
                name,
                age,
                weight,
                height,
            };
            let daily = DailyForm {
                glucose,
                activity_minutes: activity,
                diet,
                adherence,
                stress,
                sleep_hours: sleep,
                hydration,
            };
            cmd_assess(&profile, &daily, &artifacts, export, output, json)
        }
        Commands::Wizard { artifacts } => cmd_wizard(&artifacts),
        Commands::Status => cmd_status(),
        Commands::Config {
            timezone,
            model,
            scaler,
            export_dir,
            auto_export,
        } => cmd_config(timezone, model, scaler, export_dir, auto_export),
        Commands::Disclaimer => {
            cmd_disclaimer();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config() -> anyhow::Result<Config> {
    Config::load().with_context(|| format!("Could not load {:?}", Config::config_path()))
}

fn load_scorer(config: &Config, artifacts: &ArtifactArgs) -> anyhow::Result<RiskScorer> {
    let model_path = artifacts.model.as_ref().unwrap_or(&config.model_path);
    let scaler_path = artifacts.scaler.as_ref().unwrap_or(&config.scaler_path);

    RiskScorer::load(model_path, scaler_path)
        .context("Risk model unavailable; check the model and scaler paths")
}

fn cmd_assess(
    profile_form: &ProfileForm,
    daily_form: &DailyForm,
    artifacts: &ArtifactArgs,
    export: bool,
    output: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let timezone = config.timezone()?;
    let scorer = load_scorer(&config, artifacts)?;
    let mut usage = Usage::open(&config);

    let validated = profile_form
        .validate()
        .and_then(|profile| daily_form.validate().map(|entry| (profile, entry)));
    let (profile, entry) = match validated {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Input error: {e}");
            usage.log.record_validation_rejection();
            usage.save();
            std::process::exit(EXIT_INVALID_INPUT);
        }
    };

    let result = scorer.assess(&profile, &entry)?;
    usage.log.record_assessment(result.category);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&profile, &result);
    }

    if export || output.is_some() || config.auto_export {
        let dir = output.unwrap_or_else(|| config.export_path.clone());
        let builder = FhirBuilder::new(timezone);
        export_assessment(&builder, &profile, &entry, &result, &dir, &mut usage);
    }

    usage.save();
    Ok(())
}

fn cmd_wizard(artifacts: &ArtifactArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let builder = FhirBuilder::new(config.timezone()?);
    let scorer = load_scorer(&config, artifacts)?;
    let mut usage = Usage::open(&config);

    println!("glycorisk v{VERSION}");
    println!("Enter your details. Blank or invalid answers are asked again.");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut wizard = Wizard::new();

    loop {
        match wizard.step() {
            WizardStep::Profile => {
                println!();
                println!("Step 1 of 2: Profile");
                let mut form = ProfileForm::default();
                loop {
                    if !fill_form(&mut input, &mut form)? {
                        return finish(&mut usage);
                    }
                    match wizard.submit_profile(&form) {
                        Ok(_) => break,
                        Err(e) => retry_field(&mut form, e, &mut usage)?,
                    }
                }
            }
            WizardStep::Daily => {
                println!();
                println!("Step 2 of 2: Daily metrics");
                let mut form = DailyForm::default();
                loop {
                    if !fill_form(&mut input, &mut form)? {
                        return finish(&mut usage);
                    }
                    match wizard.submit_daily(&form, &scorer) {
                        Ok(result) => {
                            usage.log.record_assessment(result.category);
                            break;
                        }
                        Err(e) => retry_field(&mut form, e, &mut usage)?,
                    }
                }
            }
            WizardStep::Result => {
                let (Some(profile), Some(entry), Some(result)) =
                    (wizard.profile(), wizard.entry(), wizard.result())
                else {
                    bail!("wizard reached the result step without a result");
                };
                print_result(profile, result);

                let export = config.auto_export
                    || matches!(
                        prompt(&mut input, "Export FHIR bundle? [y/N]")?.as_deref(),
                        Some("y" | "Y" | "yes")
                    );
                if export {
                    export_assessment(
                        &builder,
                        profile,
                        entry,
                        result,
                        &config.export_path,
                        &mut usage,
                    );
                }

                match prompt(&mut input, "[n]ew entry, [r]estart, [q]uit")?.as_deref() {
                    Some("n" | "N") => wizard.new_entry(),
                    Some("r" | "R") => wizard.restart(),
                    _ => return finish(&mut usage),
                }
            }
        }
    }
}

/// Prompt for every empty field. Returns false on end of input.
fn fill_form<F: FormFields>(input: &mut impl BufRead, form: &mut F) -> anyhow::Result<bool> {
    for (field, label) in F::FIELDS {
        let Some(slot) = form.field_mut(field) else {
            continue;
        };
        if slot.is_some() {
            continue;
        }
        match prompt(input, label)? {
            Some(value) => *slot = Some(value),
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Report a rejected submission and clear the field for re-entry.
fn retry_field<F: FormFields>(
    form: &mut F,
    error: WizardError,
    usage: &mut Usage,
) -> anyhow::Result<()> {
    let Some(field) = error.validation().map(|v| v.field) else {
        return Err(error.into());
    };
    eprintln!("  {error}");
    usage.log.record_validation_rejection();
    form.clear(field);
    Ok(())
}

fn prompt(input: &mut impl BufRead, label: &str) -> anyhow::Result<Option<String>> {
    print!("  {label}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn finish(usage: &mut Usage) -> anyhow::Result<()> {
    usage.save();
    println!();
    println!("{}", usage.log.summary());
    Ok(())
}

/// Usage counters for this run and where they are persisted.
struct Usage {
    log: TransparencyLog,
    path: PathBuf,
}

impl Usage {
    fn open(config: &Config) -> Self {
        let path = config.transparency_log_path();
        Self {
            log: TransparencyLog::load_or_default(&path),
            path,
        }
    }

    fn save(&mut self) {
        if let Err(e) = self.log.save(&self.path) {
            tracing::warn!("Could not save transparency stats: {e}");
        }
    }
}

/// Write an export; failures are reported without discarding the result.
fn export_assessment(
    builder: &FhirBuilder,
    profile: &UserProfile,
    entry: &DailyEntry,
    result: &RiskResult,
    dir: &Path,
    usage: &mut Usage,
) {
    let bundle = builder.build(profile, entry, result);
    match builder.write(&bundle, &profile.user_id, dir) {
        Ok(path) => {
            usage.log.record_export();
            println!("Exported to {path:?}");
        }
        Err(e) => eprintln!("Error writing export: {e}"),
    }
}

fn print_result(profile: &UserProfile, result: &RiskResult) {
    println!();
    println!("Diabetes Risk Assessment for {}", profile.name);
    println!("==============================");
    println!();
    println!(
        "Risk level: {} ({:.1}/100)",
        result.category.label(),
        result.final_score
    );
    println!("  {}", result.category.description());
    println!();
    println!("  Model score: {:.1}", result.base_score);
    if result.applied_modifiers.is_empty() {
        println!("  Risk modifiers: none");
    } else {
        println!("  Risk modifiers:");
        for modifier in &result.applied_modifiers {
            println!("    +{:<4} {}", modifier.points, modifier.description);
        }
    }
    println!(
        "  BMI: {:.1} ({})",
        result.bmi,
        result.bmi_category.label()
    );
    println!("  Activity: {}", result.activity_level.label());
    println!();
    println!("Recommendations:");
    for rec in &result.recommendations {
        println!("  {} ({}): {}", rec.metric, rec.value, rec.advice);
    }
    println!();
    println!("This is not a medical diagnosis. Run 'glycorisk disclaimer' for details.");
}

fn cmd_status() -> anyhow::Result<()> {
    let config = load_config()?;

    println!("glycorisk Status");
    println!("================");
    println!();

    println!("Artifacts:");
    for (label, path) in [("Model", &config.model_path), ("Scaler", &config.scaler_path)] {
        println!(
            "  {label}: {:?} {}",
            path,
            if path.exists() { "✓" } else { "(missing) ✗" }
        );
    }
    match RiskScorer::load(&config.model_path, &config.scaler_path) {
        Ok(_) => println!("  Scoring: available"),
        Err(e) => println!("  Scoring: unavailable ({e})"),
    }
    println!();

    println!("Exports: {:?}", config.export_path);
    println!("Time zone: {}", config.timezone);
    println!("Auto export: {}", config.auto_export);
    println!();

    let stats_path = config.transparency_log_path();
    if stats_path.exists() {
        let log = TransparencyLog::load(&stats_path)
            .with_context(|| format!("Could not read {stats_path:?}"))?;
        println!("{}", log.summary());
    } else {
        println!("No previous session data found.");
    }

    Ok(())
}

fn cmd_config(
    timezone: Option<String>,
    model: Option<PathBuf>,
    scaler: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    auto_export: Option<bool>,
) -> anyhow::Result<()> {
    let mut config = load_config()?;
    let changed = timezone.is_some()
        || model.is_some()
        || scaler.is_some()
        || export_dir.is_some()
        || auto_export.is_some();

    if let Some(tz) = timezone {
        config.timezone = tz;
        config.timezone()?;
    }
    if let Some(path) = model {
        config.model_path = path;
    }
    if let Some(path) = scaler {
        config.scaler_path = path;
    }
    if let Some(path) = export_dir {
        config.export_path = path;
    }
    if let Some(enabled) = auto_export {
        config.auto_export = enabled;
    }

    if changed {
        config.save().context("Could not save configuration")?;
        if let Err(e) = config.ensure_directories() {
            eprintln!("Warning: Could not create directories: {e}");
        }
        println!("Configuration updated.");
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn cmd_disclaimer() {
    println!("{MEDICAL_DISCLAIMER}");
}
