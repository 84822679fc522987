pub mod config;
pub mod console;
pub mod forms;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod service;
pub mod views;

use std::io;

use tracing_subscriber::EnvFilter;

use crate::console::Console;
use crate::orchestrator::Orchestrator;
use crate::service::HttpMedicationService;

pub fn run() {
    // Logs go to stderr so they never interleave with the console screen.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let service = match HttpMedicationService::from_env() {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Cannot build medication service client");
            return;
        }
    };
    tracing::info!(base_url = %service.base_url(), "Using medication service");

    let mut orchestrator = Orchestrator::new(service);
    orchestrator.initialize();

    let mut console = Console::new(orchestrator);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if let Err(e) = console.run(stdin.lock(), &mut stdout) {
        tracing::error!(error = %e, "Console stopped");
    }

    tracing::info!("{} exiting", config::APP_NAME);
}
