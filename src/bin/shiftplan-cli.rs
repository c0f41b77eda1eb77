#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shiftplan::{
    audit, io, schedule,
    model::ShiftAssignment,
    scheduler::RotationMode,
    validate::validate,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI minimaliste du moteur d'affectation (entrée/sortie JSON)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Rotation {
    LeastUsed,
    Weekly,
}

impl From<Rotation> for RotationMode {
    fn from(r: Rotation) -> Self {
        match r {
            Rotation::LeastUsed => RotationMode::LeastUsed,
            Rotation::Weekly => RotationMode::Weekly,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer un plan
    Schedule {
        /// Options JSON (employés, équipes, shifts, règles, ...)
        #[arg(long)]
        input: String,
        /// Fichier de sortie JSON (stdout sinon)
        #[arg(long)]
        out: Option<String>,
        /// Ne garder que les affectations existantes verrouillées
        #[arg(long)]
        keep_locked: bool,
        #[arg(long, value_enum)]
        rotation: Option<Rotation>,
    },

    /// Vérifier la cohérence des entrées
    Validate {
        #[arg(long)]
        input: String,
    },

    /// Contrôler les affectations existantes (double réservation, règles, dispo)
    Check {
        #[arg(long)]
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Schedule {
            input,
            out,
            keep_locked,
            rotation,
        } => {
            let mut opts = io::load_options(&input)?;
            if keep_locked {
                ShiftAssignment::retain_locked(&mut opts.existing_assignments);
            }
            if let Some(r) = rotation {
                opts.config.rotation = r.into();
            }

            let issues = validate(&opts);
            for issue in &issues {
                eprintln!("warning: {issue}");
            }
            if let Some(fatal) = issues.iter().find(|i| i.is_fatal()) {
                bail!("{fatal}");
            }

            let result = schedule(&opts)?;
            match out {
                Some(path) => io::write_result(path, &result)?,
                None => println!("{}", io::result_to_json(&result)?),
            }
            eprintln!(
                "{} assignment(s), {} conflict(s)",
                result.statistics.total_assignments, result.statistics.unassigned_shifts
            );
            for c in &result.conflicts {
                eprintln!("conflict: {c}");
            }
            // Code 2 = WARNING/INCOMPLETE
            if result.conflicts.is_empty() {
                0
            } else {
                2
            }
        }
        Commands::Validate { input } => {
            let opts = io::load_options(&input)?;
            let issues = validate(&opts);
            if issues.is_empty() {
                println!("OK: no issues");
                0
            } else {
                for issue in &issues {
                    println!("{issue}");
                }
                2
            }
        }
        Commands::Check { input } => {
            let opts = io::load_options(&input)?;
            let violations = audit(&opts, &opts.existing_assignments);
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    println!(
                        "{} | {} | {} | {} | {:?}",
                        v.employee,
                        v.date,
                        v.shift_a,
                        v.shift_b.as_ref().map_or("-", |s| s.as_str()),
                        v.kind
                    );
                }
                2
            }
        }
    };

    std::process::exit(code);
}
