//! listguard: product identity validation service for marketplace listings.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use listguard_core::ListguardConfig;
use listguard_server::{build_router, cli, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = ListguardConfig::from_env();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "serve" => {}
            "--validate" | "validate" => {
                if args.len() < 3 {
                    eprintln!("Usage: listguard validate <listings.json>");
                    std::process::exit(1);
                }
                let state = AppState::new(config)?;
                let report = cli::validate_file(&state, &PathBuf::from(&args[2])).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            "rules" => {
                let path = args.get(2).map(PathBuf::from).or(config.rules_path.clone());
                match path {
                    Some(path) => match cli::check_rules(&path) {
                        Ok(categories) => {
                            println!("{}: {} categories OK", path.display(), categories.len());
                            cli::print_categories(&categories);
                        }
                        Err(e) => {
                            eprintln!("{}: {:#}", path.display(), e);
                            std::process::exit(1);
                        }
                    },
                    None => {
                        let registry = listguard_rules::RuleRegistry::builtin()?;
                        println!("builtin: {} categories", registry.categories().len());
                        cli::print_categories(&registry.categories());
                    }
                }
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("listguard — product identity validation for marketplace listings");
                println!();
                println!("Usage: listguard [command]");
                println!();
                println!("Commands:");
                println!("  (none) | serve           Start the server");
                println!("  validate <file.json>     Validate listings from a file and print the report");
                println!("  rules [file.json]        Check a rules file (default: LISTGUARD_RULES or built-in)");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'listguard help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let port = config.port;
    info!(
        "Rules: {}",
        config
            .rules_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin".into())
    );

    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listguard server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
