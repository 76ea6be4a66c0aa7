//! DQF packet command-line tool
//!
//! Inspects the field registry, previews overlays, validates answers, fills
//! the packet template and manages saved drafts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dqf_fill::{
    dqf_packet, generate_summary, get_page_count, get_page_dimensions, produce_document_async,
    render_page, validate_required, AnswerMap, AnswerStore, AnswerValue, DocumentOutcome,
    DraftStore, FieldRegistry, FileDraftStore, FileTemplate, FillConfig, GenerationGate, OwnerKey,
    PageDimensions, TemplateSource,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "dqf")]
#[command(version, about = "Fill the driver qualification file packet")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON field registry (defaults to the built-in packet table)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registry fields
    Fields {
        #[arg(long)]
        page: Option<u32>,
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare the registry against a template
    Check {
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Print the overlay for one page as JSON
    Overlay {
        #[arg(long)]
        page: u32,
        #[arg(long)]
        scale: Option<f64>,
        #[arg(long)]
        answers: Option<PathBuf>,
        /// Take the page size from this template instead of assuming Letter
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Report required fields that have no answer
    Validate {
        #[arg(long)]
        answers: PathBuf,
    },
    /// Fill the template, falling back to a summary if it cannot be loaded
    Fill {
        #[arg(long)]
        answers: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long)]
        skip_validation: bool,
    },
    /// Write the degraded summary without touching the template
    Summary {
        #[arg(long)]
        answers: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Inspect or edit a saved draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
        /// Applicant email
        #[arg(long, global = true)]
        owner: Option<String>,
        #[arg(long, global = true)]
        drafts_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum DraftAction {
    Show,
    /// Set one answer; `true`/`false` are stored as checkbox states
    Set { field: String, value: String },
    Clear,
}

fn load_config(args: &Args) -> anyhow::Result<FillConfig> {
    let mut config = match &args.config {
        Some(path) => FillConfig::from_file(path)?,
        None => FillConfig::default(),
    };
    if let Some(registry) = &args.registry {
        config.registry_path = Some(registry.clone());
    }
    Ok(config)
}

fn load_registry(config: &FillConfig) -> anyhow::Result<Arc<FieldRegistry>> {
    match &config.registry_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read registry: {}", path.display()))?;
            let registry = FieldRegistry::from_json(&json)
                .with_context(|| format!("Invalid registry: {}", path.display()))?;
            Ok(Arc::new(registry))
        }
        None => Ok(Arc::new(dqf_packet().clone())),
    }
}

fn load_answers(path: &Path) -> anyhow::Result<AnswerMap> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers: {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid answers JSON: {}", path.display()))
}

fn parse_value(raw: &str) -> AnswerValue {
    match raw {
        "true" => AnswerValue::Bool(true),
        "false" => AnswerValue::Bool(false),
        _ => AnswerValue::Text(raw.to_string()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_fields(registry: &FieldRegistry, page: Option<u32>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", registry.to_json()?);
        return Ok(());
    }
    let fields: Vec<_> = match page {
        Some(page) => registry.fields_on_page(page),
        None => registry.fields().iter().collect(),
    };
    for field in fields {
        println!(
            "{:>3}  {:<24} {:<9} ({:.1}, {:.1}) {:.1}x{:.1}{}",
            field.page,
            field.id,
            format!("{:?}", field.kind).to_lowercase(),
            field.x,
            field.y,
            field.width,
            field.height,
            if field.required { "  required" } else { "" }
        );
    }
    Ok(())
}

fn cmd_check(registry: &FieldRegistry, template: &FileTemplate) -> anyhow::Result<()> {
    let bytes = template.fetch()?;
    let page_count = get_page_count(&bytes)?;
    println!("template: {} ({} pages)", template.describe(), page_count);
    println!("registry: {} fields, max page {}", registry.len(), registry.max_page());

    let internal: Vec<String> = registry.internal_pages().iter().map(u32::to_string).collect();
    println!("internal pages: {}", internal.join(", "));

    let out_of_range = registry.pages_out_of_range(page_count);
    if out_of_range.is_empty() {
        println!("all fields fit the template");
    } else {
        for field in &out_of_range {
            warn!(field = %field.id, page = field.page, page_count, "Field targets a missing page");
        }
        println!("{} field(s) target pages beyond the template", out_of_range.len());
    }
    Ok(())
}

fn cmd_validate(registry: &FieldRegistry, answers: &AnswerMap) -> anyhow::Result<()> {
    match validate_required(registry, answers) {
        Ok(()) => {
            println!("all required fields answered");
            Ok(())
        }
        Err(err) => {
            for missing in &err.missing {
                println!("page {:>2}  {:<24} {}", missing.page, missing.id, missing.section);
            }
            Err(err.into())
        }
    }
}

async fn cmd_fill(
    config: &FillConfig,
    registry: Arc<FieldRegistry>,
    answers: AnswerMap,
    out: &Path,
    skip_validation: bool,
) -> anyhow::Result<()> {
    if !skip_validation {
        validate_required(&registry, &answers)?;
    }

    let gate = GenerationGate::new();
    let template = FileTemplate::new(&config.template_path);
    let outcome = produce_document_async(
        template.fetch(),
        registry,
        answers,
        config.generation_timeout_ms,
        gate.begin()?,
    )
    .await?;

    std::fs::write(out, outcome.bytes())
        .with_context(|| format!("Failed to write {}", out.display()))?;

    match &outcome {
        DocumentOutcome::Filled { report, .. } => {
            info!(out = %out.display(), drawn = report.drawn.len(), "Wrote filled packet");
            print_json(report)?;
        }
        DocumentOutcome::Degraded { reason, .. } => {
            warn!(out = %out.display(), %reason, "Template unavailable; wrote degraded summary");
        }
    }
    Ok(())
}

fn cmd_draft(config: &FillConfig, action: DraftAction, owner: Option<String>) -> anyhow::Result<()> {
    let owner = owner.context("--owner is required for draft commands")?;
    let owner = OwnerKey::new(&owner)?;
    let drafts = FileDraftStore::new(&config.drafts_dir);

    match action {
        DraftAction::Show => match drafts.load(&owner)? {
            Some(draft) => print_json(&draft)?,
            None => println!("no draft for {}", owner),
        },
        DraftAction::Set { field, value } => {
            let registry = load_registry(config)?;
            anyhow::ensure!(registry.contains(&field), "unknown field: {}", field);
            let mut store = AnswerStore::load_persisted(&drafts, &owner);
            store.set(field, parse_value(&value));
            store.persist(&drafts, &owner)?;
            println!("saved {}", drafts.path_for(&owner).display());
        }
        DraftAction::Clear => {
            drafts.clear(&owner)?;
            println!("cleared draft for {}", owner);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load_config(&args)?;

    match args.command {
        Command::Fields { page, json } => cmd_fields(&*load_registry(&config)?, page, json),
        Command::Check { template } => {
            let path = template.unwrap_or_else(|| config.template_path.clone());
            cmd_check(&*load_registry(&config)?, &FileTemplate::new(path))
        }
        Command::Overlay {
            page,
            scale,
            answers,
            template,
        } => {
            let registry = load_registry(&config)?;
            let answers = match answers {
                Some(path) => load_answers(&path)?,
                None => AnswerMap::new(),
            };
            let (page_count, dims) = match template {
                Some(path) => {
                    let bytes = FileTemplate::new(path).fetch()?;
                    let pages = get_page_dimensions(&bytes)?;
                    let dims = pages
                        .get(page.saturating_sub(1) as usize)
                        .copied()
                        .unwrap_or_default();
                    (pages.len() as u32, dims)
                }
                None => (registry.max_page(), PageDimensions::letter()),
            };
            let scale = scale.unwrap_or(config.default_scale);
            print_json(&render_page(&registry, page, page_count, dims, scale, &answers))
        }
        Command::Validate { answers } => {
            cmd_validate(&*load_registry(&config)?, &load_answers(&answers)?)
        }
        Command::Fill {
            answers,
            out,
            template,
            skip_validation,
        } => {
            if let Some(template) = template {
                config.template_path = template;
            }
            let registry = load_registry(&config)?;
            let answers = load_answers(&answers)?;
            cmd_fill(&config, registry, answers, &out, skip_validation).await
        }
        Command::Summary { answers, out } => {
            let registry = load_registry(&config)?;
            let bytes = generate_summary(&registry, &load_answers(&answers)?)?;
            std::fs::write(&out, bytes)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!(out = %out.display(), "Wrote summary");
            Ok(())
        }
        Command::Draft {
            action,
            owner,
            drafts_dir,
        } => {
            if let Some(dir) = drafts_dir {
                config.drafts_dir = dir;
            }
            cmd_draft(&config, action, owner)
        }
    }
}
