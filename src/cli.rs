use crate::adapter::actix::ActixSourceAdapter;
use crate::adapter::axum::AxumSourceAdapter;
use crate::adapter::RouterAdapter;
use crate::api::Api;
use crate::openapi_builder::OpenApiDocument;
use crate::serializer::{serialize, write_to_file, OutputFormat};
use crate::source::{Framework, SourceSet};
use anyhow::Result;
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;

/// OpenAPI synthesizer - build an OpenAPI document from the routers of a Rust web project
#[derive(Parser, Debug)]
#[command(name = "openapi-synth")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Specify the web framework to read routes from (if not specified, auto-detect)
    #[arg(short = 'w', long = "framework", value_enum)]
    pub framework: Option<Framework>,

    /// API title
    #[arg(long = "title", default_value = "Generated API")]
    pub title: String,

    /// API version
    #[arg(long = "api-version", default_value = "1.0.0")]
    pub api_version: String,

    /// API description
    #[arg(long = "description")]
    pub description: Option<String>,

    /// Module prefix stripped from component names (repeatable)
    #[arg(long = "strip", value_name = "PREFIX")]
    pub strip: Vec<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Validate and log already-parsed arguments
pub fn validate_args(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }
    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }
    match &args.framework {
        Some(framework) => info!("Framework: {:?}", framework),
        None => info!("Framework: auto-detect"),
    }

    Ok(args)
}

/// Read the project's routers and assemble the document
pub fn generate(args: &CliArgs) -> Result<OpenApiDocument> {
    info!("Scanning project directory...");
    let sources = SourceSet::load(&args.project_path)?;
    for warning in &sources.warnings {
        warn!("{}", warning);
    }
    if sources.files.is_empty() {
        anyhow::bail!("No Rust files could be parsed in the project directory");
    }
    info!("Parsed {} Rust files", sources.files.len());

    let frameworks = match args.framework {
        Some(framework) => {
            info!("Using user-specified framework: {:?}", framework);
            vec![framework]
        }
        None => {
            let detected = sources.detect_frameworks();
            if detected.is_empty() {
                anyhow::bail!(
                    "No supported web framework detected. Please specify a framework using --framework option.\n\
                     Supported frameworks: axum, actix-web"
                );
            }
            info!("Detected frameworks: {:?}", detected);
            detected
        }
    };

    let mut api = Api::new(&args.title, &args.api_version);
    api.info_mut().description = args.description.clone();
    api.set_strip_pkg_paths(args.strip.clone());

    for framework in &frameworks {
        let adapter: Box<dyn RouterAdapter> = match framework {
            Framework::Axum => Box::new(AxumSourceAdapter::from_sources(&sources)),
            Framework::ActixWeb => Box::new(ActixSourceAdapter::from_sources(&sources)),
        };
        api.merge(adapter.as_ref())?;
    }

    if api.routes().is_empty() {
        warn!("No routes found in the project");
    }
    info!("Assembled {} routes", api.routes().len());

    Ok(api.spec()?)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let document = generate(&args)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = serialize(&document, args.output_format)?;

    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Successfully wrote OpenAPI document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    info!("Generation complete: {} paths", document.paths.len());
    Ok(())
}
