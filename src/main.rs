use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};
use snapwatch::configuration::config::Config;
use snapwatch::configuration::types::FlowCatalogue;
use snapwatch::controller::controller_handler::{build_detector, build_orchestrator, Controller};
use snapwatch::page_driver::{ChromiumDriver, PageDriver};
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "snapwatch")]
#[command(version)]
#[command(about = "Watches a web UI for changes and refreshes its documentation screenshots")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Health-gated monitoring loop (default)
    Monitor,
    /// Run one change-detection pass and print what drifted
    CheckOnce,
    /// Capture every flow, or the flows of one category
    Capture {
        #[arg(long)]
        category: Option<String>,
    },
    /// Print the configured flows
    ListFlows,
    /// Print the flow categories
    ListCategories,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let code = match cli.command.unwrap_or(Command::Monitor) {
        Command::Monitor => monitor(&cli.config).await,
        Command::CheckOnce => check_once(&cli.config).await,
        Command::Capture { category } => capture(&cli.config, category.as_deref()).await,
        Command::ListFlows => with_catalogue(&cli.config, list_flows),
        Command::ListCategories => with_catalogue(&cli.config, list_categories),
    };
    std::process::exit(code);
}

async fn monitor(config: &Config) -> i32 {
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stopping (Ctrl+C)");
            let _ = stop_tx.send(true);
        }
    });

    let mut controller = match Controller::new(config, stop_rx).await {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to start the controller: {}", e);
            return 1;
        }
    };
    let reason = controller.run().await;
    if reason.is_fatal() {
        1
    } else {
        0
    }
}

async fn check_once(config: &Config) -> i32 {
    let catalogue = match load(config) {
        Some(catalogue) => catalogue,
        None => return 1,
    };
    let mut detector = match build_detector(config) {
        Ok(detector) => detector,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };
    let mut driver = match ChromiumDriver::launch(&config.browser).await {
        Ok(driver) => driver,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    let changes = detector.check_all(&mut driver, &catalogue.endpoints).await;
    close(&mut driver).await;
    if changes.is_empty() {
        println!("No UI changes");
    } else {
        println!("{} UI change(s):", changes.len());
        for change in &changes {
            println!("  {} ({})", change.endpoint_name, change.source_path);
        }
    }
    0
}

async fn capture(config: &Config, category: Option<&str>) -> i32 {
    let catalogue = match load(config) {
        Some(catalogue) => catalogue,
        None => return 1,
    };
    if let Some(category) = category {
        if !catalogue.categories().iter().any(|c| c == category) {
            error!(
                "Unknown category `{}`, available: {}",
                category,
                catalogue.categories().join(", ")
            );
            return 1;
        }
    }

    let mut driver = match ChromiumDriver::launch(&config.browser).await {
        Ok(driver) => driver,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };
    let orchestrator = build_orchestrator(config);
    let result = match category {
        Some(category) => {
            orchestrator
                .run_category(&mut driver, &catalogue.flows, category)
                .await
        }
        None => orchestrator.run(&mut driver, &catalogue.flows).await,
    };
    close(&mut driver).await;

    match result {
        Ok(report) => {
            println!(
                "Captured {}/{} (failed {}, skipped {})",
                report.succeeded, report.total, report.failed, report.skipped
            );
            if report.failed > 0 {
                1
            } else {
                0
            }
        }
        Err(e) => {
            error!("Capture run rejected: {}", e);
            1
        }
    }
}

fn list_flows(catalogue: &FlowCatalogue) {
    for category in catalogue.categories() {
        println!("{}:", category);
        for flow in catalogue.flows_in_category(&category) {
            let marker = if flow.optional { " [optional]" } else { "" };
            println!(
                "  {:<28} {:<24} {}{}",
                flow.name, flow.target, flow.output_filename, marker
            );
        }
    }
}

fn list_categories(catalogue: &FlowCatalogue) {
    for category in catalogue.categories() {
        println!(
            "{:<12} {} flow(s)",
            category,
            catalogue.flows_in_category(&category).len()
        );
    }
}

fn with_catalogue(config: &Config, print: fn(&FlowCatalogue)) -> i32 {
    match load(config) {
        Some(catalogue) => {
            print(&catalogue);
            0
        }
        None => 1,
    }
}

fn load(config: &Config) -> Option<FlowCatalogue> {
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return None;
    }
    match config.load_catalogue() {
        Ok(catalogue) => Some(catalogue),
        Err(e) => {
            error!("Unable to load flows: {}", e);
            None
        }
    }
}

async fn close(driver: &mut ChromiumDriver) {
    if let Err(e) = driver.close().await {
        warn!("Failed to close browser: {}", e);
    }
}
