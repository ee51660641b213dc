use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use log::info;

use sdg_core::config::{self, CONFIG_FILE_NAME, GenerationRun, SpecInfo};
use sdg_core::{BackendProvider, SpecDrivenGenerator};
use sdg_spring_server::SpringServerProvider;

#[derive(Parser)]
#[command(name = "sdg", about = "Spec-driven server code generator for OpenAPI 3.x", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for every configured document
    Generate(GenerateArgs),

    /// Check configuration, sources and backend without emitting
    Validate {
        /// Config file (defaults to .sdg.yaml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List available backends
    Backends {
        /// Extra directories holding <backend>/backend.yaml manifests
        #[arg(long = "plugin-dir")]
        plugin_dirs: Vec<PathBuf>,
    },

    /// Initialize a new sdg configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Config file (defaults to .sdg.yaml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Add a document (path or http(s) URL) to the run
    #[arg(short, long)]
    input: Option<String>,

    /// Package for generated API code of --input
    #[arg(long, requires = "input")]
    api_package: Option<String>,

    /// Package for generated model code of --input
    #[arg(long, requires = "input")]
    model_package: Option<String>,

    /// Backend name or path to a backend manifest
    #[arg(short, long)]
    backend: Option<String>,

    /// Output root
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use the backend's builder style for models, if it has one
    #[arg(long)]
    builder: bool,

    /// Skip backend supporting files
    #[arg(long)]
    exclude_supporting_files: bool,

    /// Model names that are never generated
    #[arg(long = "exclude-model", value_name = "NAME")]
    excluded_models: Vec<String>,

    /// Backend property override, KEY=VALUE (VALUE is parsed as JSON, else kept as a string)
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, serde_json::Value)>,

    /// Extra directories holding <backend>/backend.yaml manifests
    #[arg(long = "plugin-dir")]
    plugin_dirs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("sdg=info,sdg_core=info,sdg_spring_server=info"),
    )
    .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => cmd_generate(args),

        Commands::Validate { config } => cmd_validate(config),

        Commands::Backends { plugin_dirs } => cmd_backends(plugin_dirs),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "sdg", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn providers() -> Vec<Arc<dyn BackendProvider>> {
    vec![Arc::new(SpringServerProvider)]
}

/// Load the config file, or start from defaults when it doesn't exist.
fn load_run(path: Option<&Path>) -> Result<GenerationRun> {
    let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE_NAME));
    let run = config::load_config(path)?;
    if run.is_none() {
        info!("{} not found, using defaults", path.display());
    }
    Ok(run.unwrap_or_default())
}

/// `KEY=VALUE`, with VALUE read as JSON when it parses.
fn parse_property(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

/// Flags override whatever the config file says.
fn apply_overrides(run: &mut GenerationRun, args: GenerateArgs) {
    if let Some(source) = args.input {
        let mut spec = SpecInfo::new(source);
        spec.api_package = args.api_package;
        spec.model_package = args.model_package;
        run.specs.push(spec);
    }
    if let Some(backend) = args.backend {
        run.backend = backend;
    }
    if let Some(output) = args.output {
        run.output = output;
    }
    run.enable_builder_support |= args.builder;
    run.exclude_supporting_files |= args.exclude_supporting_files;
    run.excluded_models.extend(args.excluded_models);
    run.properties.extend(args.properties);
    run.plugin_dirs.extend(args.plugin_dirs);
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let mut run = load_run(args.config.as_deref())?;
    apply_overrides(&mut run, args);

    if run.specs.is_empty() {
        anyhow::bail!("no documents configured. Add a `specs` section to {CONFIG_FILE_NAME} or pass --input.");
    }

    eprintln!(
        "Generating {} document(s) with {} → {}",
        run.specs.len(),
        run.backend,
        run.output.display()
    );
    let report = SpecDrivenGenerator::new(providers())
        .generate(run)
        .context("generation failed")?;

    for file in &report.files {
        eprintln!("  wrote {}", file.display());
    }
    eprintln!("Generated {} files", report.file_count());

    let root = fs::canonicalize(&report.output_root).with_context(|| {
        format!("failed to resolve output root {}", report.output_root.display())
    })?;
    println!("{}", root.display());
    Ok(())
}

fn cmd_validate(config_path: Option<PathBuf>) -> Result<()> {
    let mut run = load_run(config_path.as_deref())?;
    let generator = SpecDrivenGenerator::new(providers());

    generator.validate(&mut run).context("validation failed")?;

    let mut registry = generator.registry(&run);
    let backend = registry
        .resolve(&run.backend)
        .context("validation failed")?;
    eprintln!("Backend: {} ({})", backend.name(), backend.kind());

    for spec in &run.specs {
        eprintln!("  {}", spec.source);
        if spec.generates_api() {
            eprintln!("    api:   {}", spec.api_package().unwrap_or_default());
        }
        if spec.generates_models() {
            eprintln!("    model: {}", spec.model_package().unwrap_or_default());
        }
    }
    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_backends(plugin_dirs: Vec<PathBuf>) -> Result<()> {
    let run = GenerationRun {
        plugin_dirs,
        ..GenerationRun::default()
    };
    let registry = SpecDrivenGenerator::new(providers()).registry(&run);

    for backend in registry.iter() {
        println!(
            "{:<24} {:<14} {}",
            backend.name(),
            backend.kind().to_string(),
            backend.help()
        );
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
