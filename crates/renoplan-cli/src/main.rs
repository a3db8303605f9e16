use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use renoplan_contracts::providers::{ImageDelivery, ImageResult};
use renoplan_contracts::request::PlanError;
use renoplan_engine::{
    default_provider_chain, DryrunProvider, GeminiTextClient, ImageChain, ImageProvider,
    RenovationEngine,
};

#[derive(Debug, Parser)]
#[command(name = "renoplan", version, about = "AI home renovation planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a renovation plan and a matching interior image.
    Plan(PlanArgs),
    /// Print the configured image provider chain in priority order.
    Providers(ProvidersArgs),
}

#[derive(Debug, Parser)]
struct PlanArgs {
    /// Free-text renovation request, e.g. "Modern kitchen, ₹50,000 budget".
    #[arg(long)]
    request: String,
    /// Run directory for the plan, image and event trail.
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long, default_value = "gemini-2.0-flash")]
    text_model: String,
    #[arg(long, value_enum, default_value_t = DeliveryArg::Bytes)]
    delivery: DeliveryArg,
    /// Replace the hosted image chain with the local placeholder provider.
    #[arg(long)]
    dryrun: bool,
}

#[derive(Debug, Parser)]
struct ProvidersArgs {
    #[arg(long, value_enum, default_value_t = DeliveryArg::Bytes)]
    delivery: DeliveryArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DeliveryArg {
    /// Download image bytes and validate them locally.
    Bytes,
    /// Return the provider URL without fetching.
    Url,
}

impl From<DeliveryArg> for ImageDelivery {
    fn from(value: DeliveryArg) -> Self {
        match value {
            DeliveryArg::Bytes => ImageDelivery::FetchBytes,
            DeliveryArg::Url => ImageDelivery::UrlOnly,
        }
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("renoplan error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Providers(args) => {
            print_providers(args);
            Ok(0)
        }
    }
}

fn run_plan(args: PlanArgs) -> Result<i32> {
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let delivery = ImageDelivery::from(args.delivery);
    let chain = if args.dryrun {
        let providers: Vec<Box<dyn ImageProvider>> = vec![Box::new(DryrunProvider::new())];
        ImageChain::new(providers)
    } else {
        default_provider_chain(delivery)
    };
    let engine = RenovationEngine::with_components(
        &args.out,
        &events_path,
        Box::new(GeminiTextClient::new(Some(args.text_model))),
        chain,
    )?;

    let outcome = match engine.plan(&args.request) {
        Ok(outcome) => outcome,
        Err(PlanError::EmptyRequest) => {
            eprintln!("please enter a renovation request");
            return Ok(2);
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}", outcome.plan_text);
    println!();
    match &outcome.image {
        ImageResult::Bytes { .. } => {
            if let Some(path) = &outcome.image_path {
                println!("image saved to {}", path.display());
            }
        }
        ImageResult::Url { url } => println!("image available at {url}"),
        ImageResult::Absent { .. } => {}
    }
    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }
    println!("plan saved to {}", outcome.plan_path.display());
    engine.finish()?;
    Ok(0)
}

fn print_providers(args: ProvidersArgs) {
    let chain = default_provider_chain(ImageDelivery::from(args.delivery));
    for spec in chain.specs() {
        println!(
            "{:<14} endpoint={} credential={} timeout={}s retry_on_unavailable={} prompt_limit={}",
            spec.name,
            spec.endpoint,
            if spec.requires_credential { "required" } else { "none" },
            spec.timeout.as_secs(),
            spec.retry_on_unavailable,
            spec.prompt_limit,
        );
    }
}
