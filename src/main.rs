// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;
use zorro_core::config::{load_and_validate_config, RuntimeBuilder};
use zorro_core::tools::{Action, ExecutionType, Tool};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Print the output and logs of every command of `action`, depth first.
fn print_outputs(action: &Action, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, child) in action.children() {
        match &child.tool {
            Tool::Action(nested) => {
                println!("{}📁 {} ({})", indent, key, nested.name());
                print_outputs(nested, depth + 1);
            }
            Tool::Command(command) => {
                let base = command.snapshot();
                println!("{}⚙️  {} ({}) [{}]", indent, key, base.display_name(), base.status);
                println!("{}   output: {}", indent, base.output.to_json());
                for line in base.logs.values() {
                    println!("{}   log: {}", indent, line);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <config.yaml|config.toml> [action.json]", args[0]);
        eprintln!("Example: {} configs/zorro.yaml configs/actions/greet.json", args[0]);
        eprintln!("Without an action file the engine serves workers until interrupted.");
        std::process::exit(1);
    }

    init_tracing();

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("could not load configuration {}", args[1]))?;
    let runtime = RuntimeBuilder::from_config(&config)
        .await
        .context("could not start the engine")?;

    let status = runtime.server_status();
    println!("🚀 zorro-core listening on {}:{}", status.host, status.port);

    let Some(action_path) = args.get(2) else {
        tokio::signal::ctrl_c().await.context("could not wait for ctrl-c")?;
        runtime.shutdown().await?;
        return Ok(());
    };

    let action = Arc::new(
        Action::load(action_path).with_context(|| format!("could not load action {}", action_path))?,
    );
    println!("▶️  Executing action '{}'", action.name());

    let started = Instant::now();
    let result = runtime.execute_action(&action, ExecutionType::Execute).await;
    let elapsed = started.elapsed();

    print_outputs(&action, 1);
    let processed = runtime.shutdown().await?;

    match result {
        Ok(()) => {
            println!("✅ Action '{}' completed in {:?} ({} commands)", action.name(), elapsed, processed);
            Ok(())
        }
        Err(e) => {
            println!("❌ Action '{}' failed after {:?}", action.name(), elapsed);
            Err(e.into())
        }
    }
}
