use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::info;
use vpcdown_cloud::{NetworkTeardown, RetryConfig, TeardownConfig};
use vpcdown_cloud_aws::Ec2NetworkProvider;

#[derive(Parser)]
#[command(name = "vpcdown")]
#[command(
    about = "Tear down a VPC and everything inside it, in dependency-safe order",
    long_about = None
)]
struct Cli {
    /// ID of the VPC to delete (e.g. vpc-0abc123)
    vpc_id: String,

    /// AWS region the VPC lives in
    #[arg(short, long, env = "AWS_REGION")]
    region: String,

    /// List what would be deleted without touching anything
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Seconds to pause before the final VPC delete, so provider-side
    /// propagation of the child deletions can catch up
    #[arg(long, default_value_t = 15)]
    settle_secs: u64,

    /// Number of full teardown passes before giving up
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,
}

fn confirm(vpc_id: &str, region: &str) -> anyhow::Result<bool> {
    print!(
        "Delete VPC {} in {} and everything inside it? [y/N] ",
        vpc_id.cyan(),
        region.cyan()
    );
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if !cli.yes && !cli.dry_run && !confirm(&cli.vpc_id, &cli.region)? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }

    info!(vpc_id = %cli.vpc_id, region = %cli.region, "Starting teardown");
    let provider = Ec2NetworkProvider::new(&cli.region).await;
    let config = TeardownConfig {
        settle_delay: Duration::from_secs(cli.settle_secs),
        retry: RetryConfig {
            max_attempts: cli.max_attempts,
            ..RetryConfig::default()
        },
        dry_run: cli.dry_run,
        ..TeardownConfig::default()
    };
    let teardown = NetworkTeardown::new(&provider, config);
    let report = teardown.run(&cli.vpc_id).await?;

    println!();
    if cli.dry_run {
        println!(
            "{}",
            format!("[dry run] {} resources would be deleted", report.skipped).yellow()
        );
    } else if report.network_deleted {
        println!("{}", format!("✓ VPC {} deleted", cli.vpc_id).green());
    } else {
        println!(
            "{}",
            format!("VPC {} does not exist, nothing to do", cli.vpc_id).yellow()
        );
    }
    println!("  {report}");
    Ok(())
}
