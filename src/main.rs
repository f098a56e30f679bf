// src/main.rs

use ripplewatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    // Failures degrade to diagnostics; the exit status is always success.
    if let Err(err) = run_main().await {
        eprintln!("ripplewatch error: {err:?}");
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    if let Err(e) = logging::init_logging(args.log_level) {
        eprintln!("ripplewatch: {e}");
    }
    run(args).await
}
