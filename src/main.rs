// src/main.rs

use stagehand::errors::StagehandError;
use stagehand::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("stagehand error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(()) => {}
        Err(StagehandError::Run(failure)) => {
            // Pipeline failure: name the stage and who exited with what.
            eprintln!("stagehand: stage `{}` failed", failure.stage);
            for (role, code) in &failure.codes {
                eprintln!("  {role} exited with code {code}");
            }
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("stagehand error: {err}");
            std::process::exit(1);
        }
    }
}
