//! dossier-fusion - fuse saved provider responses into one profile
//!
//! Reads provider responses (one JSON file per provider), runs identity
//! gating and record fusion around the query anchor, and prints the fused
//! profile as JSON on stdout. Logs go to stderr or the configured log file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use serde::Serialize;
use tracing::{info, warn};

use dossier_common::logging::init_logging;
use dossier_fusion::config::{self, DossierConfig};
use dossier_fusion::display::DisplayView;
use dossier_fusion::input::load_provider_file;
use dossier_fusion::{Anchor, FusionTrace, GateMode, ProfileAssembler, ProfileEntity};

/// Command-line arguments for dossier-fusion
#[derive(Parser, Debug)]
#[command(name = "dossier-fusion")]
#[command(about = "Identity resolution and record fusion for people-lookup results")]
#[command(version)]
struct Args {
    /// Configuration file (overrides DOSSIER_CONFIG and the platform config file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subject name from the query
    #[arg(long)]
    name: Option<String>,

    /// Subject phone from the query
    #[arg(long)]
    phone: Option<String>,

    /// Subject email from the query
    #[arg(long)]
    email: Option<String>,

    /// Response from a provider that joined on the query phone/email.
    /// Files are ingested in command-line order across --linked and --strict
    #[arg(long, value_name = "FILE")]
    linked: Vec<PathBuf>,

    /// Response from a name-search provider; records must match the subject's name
    #[arg(long, value_name = "FILE")]
    strict: Vec<PathBuf>,

    /// Include the fusion trace in the output
    #[arg(long)]
    trace: bool,

    /// Print the top-N display view instead of the full profile
    #[arg(long, conflicts_with = "trace")]
    display: bool,

    /// Reference date for the derived age (YYYY-MM-DD)
    #[arg(long, env = "DOSSIER_AS_OF")]
    as_of: Option<NaiveDate>,
}

/// Profile plus the audit trail of the run that produced it
#[derive(Serialize)]
struct TracedOutput<'a> {
    profile: &'a ProfileEntity,
    trace: &'a FusionTrace,
}

/// Input files with their gating, in command-line order
fn ordered_inputs(matches: &ArgMatches) -> Vec<(PathBuf, GateMode)> {
    let mut inputs: Vec<(usize, PathBuf, GateMode)> = Vec::new();
    for (id, gating) in [("linked", GateMode::Linked), ("strict", GateMode::Strict)] {
        if let (Some(paths), Some(indices)) = (matches.get_many::<PathBuf>(id), matches.indices_of(id)) {
            inputs.extend(indices.zip(paths).map(|(index, path)| (index, path.clone(), gating)));
        }
    }
    inputs.sort_by_key(|(index, _, _)| *index);
    inputs.into_iter().map(|(_, path, gating)| (path, gating)).collect()
}

fn main() -> Result<()> {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let inputs = ordered_inputs(&matches);

    let (dossier_config, source) =
        DossierConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&dossier_config.logging).context("Failed to initialize logging")?;

    info!("Starting dossier-fusion v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", source);
    info!(
        "Inputs: {} linked, {} strict",
        args.linked.len(),
        args.strict.len()
    );

    let fusion_config = config::install(dossier_config.fusion);

    let mut anchor = Anchor::new();
    anchor.name = args.name;
    anchor.phone = args.phone;
    anchor.email = args.email;
    if anchor.name.is_none() && anchor.phone.is_none() && anchor.email.is_none() {
        warn!("No anchor given; strict records cannot be gated by name");
    }

    let mut assembler = ProfileAssembler::new(anchor, fusion_config);
    if let Some(date) = args.as_of {
        assembler = assembler.with_reference_date(date);
    }

    for (path, gating) in &inputs {
        match load_provider_file(path, *gating) {
            Ok(response) => assembler.ingest(&response),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                let provider = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                assembler.note_unavailable(&provider, &e.to_string());
            }
        }
    }

    let (profile, trace) = assembler.finish();
    info!("Fusion run {} finished", trace.run_id);

    let rendered = if args.display {
        serde_json::to_string_pretty(&DisplayView::from_profile(
            &profile,
            fusion_config.display.top_n,
        ))
    } else if args.trace {
        serde_json::to_string_pretty(&TracedOutput {
            profile: &profile,
            trace: &trace,
        })
    } else {
        serde_json::to_string_pretty(&profile)
    };
    let output = rendered.context("Failed to serialize output")?;

    println!("{}", output);
    Ok(())
}
