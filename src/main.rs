use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use topup::api::models::{AirtimeRequest, CableRequest, DataRequest, PurchaseReceipt};
use topup::api::ApiResponse;
use topup::bootstrap::{initialize_app_context, AppContext};
use topup::config::Config;

#[derive(Parser, Debug)]
#[command(name = "topup", version, about = "Wallet funding and bill payment client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fund the wallet through the hosted checkout and wait for confirmation
    Fund {
        #[arg(long)]
        email: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Show the fee breakdown for a deposit
    Charge {
        #[arg(long)]
        amount: Decimal,
    },
    /// Buy airtime
    Airtime {
        #[arg(long)]
        network: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Buy a data bundle
    Data {
        #[arg(long)]
        network: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        plan: String,
    },
    /// Pay a cable TV subscription
    Cable {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        smartcard: String,
        #[arg(long)]
        plan: String,
    },
    /// Fetch dashboard data from an API path
    Dashboard {
        path: String,
        /// Ignore cached data
        #[arg(long)]
        refresh: bool,
    },
}

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,topup=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let context = initialize_app_context(config)?;

    match cli.command {
        Commands::Fund { email, amount } => fund_wallet(&context, &email, amount).await?,
        Commands::Charge { amount } => {
            let charge = context.funding.quote(amount).await?;
            println!("{}", serde_json::to_string_pretty(&charge)?);
        }
        Commands::Airtime { network, phone, amount } => {
            let response = context
                .api
                .buy_airtime(&AirtimeRequest { network, phone, amount })
                .await?;
            print_receipt(response)?;
        }
        Commands::Data { network, phone, plan } => {
            let response = context
                .api
                .buy_data(&DataRequest {
                    network,
                    phone,
                    plan_id: plan,
                })
                .await?;
            print_receipt(response)?;
        }
        Commands::Cable { provider, smartcard, plan } => {
            let response = context
                .api
                .subscribe_cable(&CableRequest {
                    provider,
                    smartcard_number: smartcard,
                    plan_id: plan,
                })
                .await?;
            print_receipt(response)?;
        }
        Commands::Dashboard { path, refresh } => {
            let data = if refresh {
                context.refresh_dashboard(&path).await?
            } else {
                context.load_dashboard(&path).await?
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}

fn print_receipt(response: ApiResponse<PurchaseReceipt>) -> anyhow::Result<()> {
    let (receipt, message) = response.into_result()?;
    println!("✓ {}", message);
    if let Some(receipt) = receipt {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    }
    Ok(())
}

/// Start a deposit, then relay checkout navigation from stdin until settled
async fn fund_wallet(context: &AppContext, email: &str, amount: Decimal) -> anyhow::Result<()> {
    let session = context.funding.begin(email, amount).await?;

    println!("Total to pay: {}", session.charge.total_to_pay);
    println!("Open checkout: {}", session.attempt.authorization_url);
    println!("Paste each URL the checkout page navigates to; Ctrl-C cancels.");

    let mut events = session.handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = events.changed() => {
                if changed.is_err() || events.borrow().outcome.is_terminal() {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(url)) if !url.trim().is_empty() => session.handle.navigated(url.trim()),
                    Ok(Some(_)) => {}
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("stdin closed: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Cancel requested");
                session.handle.cancel();
            }
        }
    }

    let report = session.handle.finished().await?;
    println!("[{}] {}", report.event.outcome, report.event.message);
    info!(
        reference = %report.attempt.reference,
        check_count = report.check_count,
        "Funding attempt settled"
    );

    Ok(())
}
