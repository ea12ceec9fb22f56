use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

use carenav_engine::AssessmentEngine;
use carenav_manifest::{AnswerSet, ManifestLoader, ModuleManifest};
use carenav_outcome::StateKey;
use carenav_scoring::{compute_flags, ScoringConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Command::new("carenav")
        .version(carenav_engine::VERSION)
        .about("CareNav assessment and scoring engine")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("validate")
                .about("Validate a manifest (and optionally a scoring config against it)")
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .required(true)
                        .help("Path to the manifest document (.json or .yaml)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("Path to a scoring config to bind against the manifest"),
                ),
        )
        .subcommand(
            Command::new("score")
                .about("Score an answer set and print the published outcome")
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .required(true)
                        .help("Path to the manifest document (.json or .yaml)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .required(true)
                        .help("Path to the scoring config"),
                )
                .arg(
                    Arg::new("answers")
                        .long("answers")
                        .required(true)
                        .help("Path to a JSON object of question id to answer value"),
                )
                .arg(
                    Arg::new("key")
                        .long("key")
                        .default_value("local")
                        .help("State key to publish the outcome under"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the outcome as JSON instead of a report"),
                ),
        )
        .subcommand(
            Command::new("flags")
                .about("Print the flag set derived from an answer set")
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .required(true)
                        .help("Path to the manifest document (.json or .yaml)"),
                )
                .arg(
                    Arg::new("answers")
                        .long("answers")
                        .required(true)
                        .help("Path to a JSON object of question id to answer value"),
                ),
        );

    let matches = cli.get_matches();
    let result = match matches.subcommand() {
        Some(("validate", args)) => run_validate(
            args.get_one::<String>("manifest").unwrap(),
            args.get_one::<String>("config").map(String::as_str),
        ),
        Some(("score", args)) => run_score(
            args.get_one::<String>("manifest").unwrap(),
            args.get_one::<String>("config").unwrap(),
            args.get_one::<String>("answers").unwrap(),
            args.get_one::<String>("key").unwrap(),
            args.get_flag("json"),
        ),
        Some(("flags", args)) => run_flags(
            args.get_one::<String>("manifest").unwrap(),
            args.get_one::<String>("answers").unwrap(),
        ),
        _ => Ok(()),
    };

    if let Err(error) = result {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn load_manifest(path: &str) -> Result<ModuleManifest> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading manifest {path}"))?;
    let manifest = if is_yaml(path) {
        ManifestLoader::from_yaml(&raw)
    } else {
        ManifestLoader::from_json(&raw)
    }
    .with_context(|| format!("loading manifest {path}"))?;
    Ok(manifest)
}

fn is_yaml(path: &str) -> bool {
    matches!(
        Path::new(path).extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn load_answers(path: &str) -> Result<AnswerSet> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading answers {path}"))?;
    let answers: AnswerSet =
        serde_json::from_str(&raw).with_context(|| format!("parsing answers {path}"))?;
    Ok(answers)
}

fn run_validate(manifest_path: &str, config_path: Option<&str>) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    println!(
        "manifest {} v{}: {} sections, {} questions, {} flags",
        manifest.module.id,
        manifest.module.version,
        manifest.sections.len(),
        manifest.questions().count(),
        manifest.declared_flags().len(),
    );

    if let Some(config_path) = config_path {
        let raw =
            fs::read_to_string(config_path).with_context(|| format!("reading config {config_path}"))?;
        let config = ScoringConfig::from_json(&raw)
            .with_context(|| format!("parsing config {config_path}"))?;
        config
            .bind(&manifest)
            .with_context(|| format!("binding config {config_path}"))?;
        println!(
            "config: {} point rules, {} overrides, {} modifiers (binds cleanly)",
            config.points.len(),
            config.overrides.len(),
            config.modifiers.len(),
        );
    }
    Ok(())
}

fn run_score(
    manifest_path: &str,
    config_path: &str,
    answers_path: &str,
    key: &str,
    json: bool,
) -> Result<()> {
    let manifest_raw =
        fs::read_to_string(manifest_path).with_context(|| format!("reading manifest {manifest_path}"))?;
    let config_raw =
        fs::read_to_string(config_path).with_context(|| format!("reading config {config_path}"))?;
    let config = ScoringConfig::from_json(&config_raw)
        .with_context(|| format!("parsing config {config_path}"))?;

    let engine = AssessmentEngine::new();
    let manifest = if is_yaml(manifest_path) {
        engine.register_module_yaml(&manifest_raw, config)
    } else {
        engine.register_module(&manifest_raw, config)
    }
    .context("registering module")?;

    let answers = load_answers(answers_path)?;
    let (result, flags) = engine
        .score_answers(&manifest.module.id, &answers)
        .context("scoring answers")?;

    let state_key = StateKey::from(key);
    let outcome = carenav_outcome::publish(
        engine.store().as_ref(),
        state_key,
        manifest.module.clone(),
        &result,
        flags,
    )
    .context("publishing outcome")?;

    if json {
        println!("{}", serde_json::to_string_pretty(outcome.as_ref())?);
    } else {
        println!("Recommendation: {}", outcome.recommendation().label());
        println!("Confidence:     {:.2}", outcome.confidence());
        println!(
            "Raw score:      {:.1} (base {}, final {})",
            result.raw_score,
            result.base_tier.label(),
            result.final_tier.label(),
        );
        for (domain, score) in outcome.domain_scores() {
            println!("  {domain}: {score:.1}");
        }
        if !result.rationale.is_empty() {
            println!("Rationale:");
            for line in &result.rationale {
                println!("  - {line}");
            }
        }
        println!("Digest:         {}", outcome.digest().short());
    }
    Ok(())
}

fn run_flags(manifest_path: &str, answers_path: &str) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let answers = load_answers(answers_path)?;

    let effective = carenav_flow::visibility::effective_answers(&manifest, &answers);
    let flags = compute_flags(&manifest, &effective);
    for (flag, set) in flags.iter() {
        println!("{flag}: {}", if set { "raised" } else { "clear" });
    }
    Ok(())
}
