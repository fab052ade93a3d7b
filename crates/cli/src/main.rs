//! Neotech CLI - headless storefront client.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the persisted user, or create a guest
//! neotech session bootstrap
//!
//! # Show / forget the persisted user
//! neotech session show
//! neotech session reset
//!
//! # List the catalog
//! neotech products
//!
//! # Add product 3 to the order twice
//! neotech cart add 3 --times 2
//! ```
//!
//! # Commands
//!
//! - `session` - Bootstrap, inspect or reset the local session
//! - `products` - List the product catalog
//! - `cart` - Run cart line actions through the cart controller
//!
//! Local storage lives in `--state-dir` (default `STOREFRONT_STATE_DIR`, then
//! `.neotech`). The API root comes from `NEOTECH_API_URL` unless `--api-url`
//! is given.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Command output goes to the terminal.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use neotech_core::{ProductId, QuantityAdjustment};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "neotech")]
#[command(author, version, about = "Neotech storefront CLI")]
struct Cli {
    /// Directory holding local storage
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Neotech API root (overrides `NEOTECH_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// List the product catalog
    Products,
    /// Change a product's quantity in the open order
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Fetch the persisted user, or create and persist a guest
    Bootstrap,
    /// Print the persisted user
    Show,
    /// Forget the persisted user
    Reset,
}

#[derive(Subcommand)]
enum CartAction {
    /// Increment a product
    Add(LineArgs),
    /// Decrement a product
    Remove(LineArgs),
    /// Remove a product's line entirely
    Delete(LineArgs),
}

#[derive(clap::Args)]
struct LineArgs {
    /// Product id
    product_id: ProductId,

    /// How many times to run the action
    #[arg(short, long, default_value_t = 1)]
    times: u32,
}

impl CartAction {
    const fn split(&self) -> (QuantityAdjustment, &LineArgs) {
        match self {
            Self::Add(args) => (QuantityAdjustment::AddItem, args),
            Self::Remove(args) => (QuantityAdjustment::RemoveItem, args),
            Self::Delete(args) => (QuantityAdjustment::DeleteItem, args),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env before reading any configuration
    let _ = dotenvy::dotenv();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "neotech_storefront=warn,neotech=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new(cli.state_dir, cli.api_url.as_deref())?;

    match cli.command {
        Commands::Session { action } => match action {
            SessionAction::Bootstrap => commands::session::bootstrap(&ctx).await?,
            SessionAction::Show => commands::session::show(&ctx),
            SessionAction::Reset => commands::session::reset(&ctx),
        },
        Commands::Products => commands::products::list(&ctx).await?,
        Commands::Cart { action } => {
            let (adjustment, args) = action.split();
            commands::cart::run(&ctx, args.product_id, adjustment, args.times).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cart_add_with_times() {
        let cli = Cli::try_parse_from(["neotech", "cart", "add", "7", "--times", "3"]).unwrap();
        let Commands::Cart { action } = cli.command else {
            panic!("expected cart command");
        };
        let (adjustment, args) = action.split();
        assert_eq!(adjustment, QuantityAdjustment::AddItem);
        assert_eq!(args.product_id, ProductId::new(7));
        assert_eq!(args.times, 3);
    }

    #[test]
    fn test_parse_global_state_dir() {
        let cli = Cli::try_parse_from(["neotech", "session", "show", "--state-dir", "/tmp/x"])
            .unwrap();
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.command,
            Commands::Session {
                action: SessionAction::Show
            }
        ));
    }

    #[test]
    fn test_rejects_non_numeric_product_id() {
        assert!(Cli::try_parse_from(["neotech", "cart", "delete", "abc"]).is_err());
    }
}
