//! Beanpass CLI - account and location management against a remote
//! Beanpass service, plus an offline demo mode.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (and its customer profile)
//! beanpass account signup -e ada@example.com -p hunter2468 --first Ada --last Lovelace
//!
//! # Sign in and show the identity summary (scan token, balance)
//! beanpass account login -e ada@example.com -p hunter2468
//!
//! # Connect to a café by join code
//! beanpass location connect -e ada@example.com -p hunter2468 CAFE01
//!
//! # List saved locations / promote one to home
//! beanpass location list -e ada@example.com -p hunter2468
//! beanpass location set-home -e ada@example.com -p hunter2468 2
//!
//! # Extract a join token from scanned text (deep link or bare code)
//! beanpass scan "https://beanpass.app/join/cafe01"
//!
//! # Run the full customer journey against an in-memory service
//! beanpass demo
//! ```
//!
//! # Environment Variables
//!
//! - `BEANPASS_SERVICE_URL` - Base URL of the remote account service
//! - `BEANPASS_SERVICE_KEY` - Publishable API key for the service
//! - `BEANPASS_DATA_DIR` - Client data directory (default `.beanpass`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "beanpass")]
#[command(author, version, about = "Beanpass client tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the customer account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Manage saved café locations
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },
    /// Extract a join token from scanned QR text
    Scan {
        /// The decoded QR text (deep link or bare code)
        text: String,
    },
    /// Run the full customer journey against an in-memory service
    Demo,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create an account and customer profile
    Signup {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// First name
        #[arg(long)]
        first: String,

        /// Last name
        #[arg(long)]
        last: String,
    },
    /// Sign in and print the identity summary
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum LocationAction {
    /// Connect to a location by join code
    Connect {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// The join code printed on the café's QR sign
        code: String,
    },
    /// List saved locations (home first)
    List {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Make a saved location the home location
    SetHome {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Position in `location list` output (1-based)
        position: usize,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Account { action } => match action {
            AccountAction::Signup {
                email,
                password,
                first,
                last,
            } => commands::account::signup(&email, &password, &first, &last).await?,
            AccountAction::Login { email, password } => {
                commands::account::login(&email, &password).await?;
            }
        },
        Commands::Location { action } => match action {
            LocationAction::Connect {
                email,
                password,
                code,
            } => commands::location::connect(&email, &password, &code).await?,
            LocationAction::List { email, password } => {
                commands::location::list(&email, &password).await?;
            }
            LocationAction::SetHome {
                email,
                password,
                position,
            } => commands::location::set_home(&email, &password, position).await?,
        },
        Commands::Scan { text } => commands::scan::extract(&text)?,
        Commands::Demo => commands::demo::run().await?,
    }
    Ok(())
}
