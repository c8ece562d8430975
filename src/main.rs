use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use update_feed::config::Config;
use update_feed::feed::{self, FetchOptions, ReleaseTarget};
use update_feed::model::{BuildNumber, ChannelStatus, OsSuffix, Product};
use update_feed::util::{is_remote_source, validate_url};

/// Get the config directory path (~/.config/update-feed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("update-feed"))
}

#[derive(Parser, Debug)]
#[command(
    name = "update-feed",
    about = "Resolve product update metadata from an update feed or GitHub release"
)]
struct Args {
    /// Feed location: file path or http(s) URL (defaults to `feed_url` from the config)
    source: Option<String>,

    /// Config file (defaults to ~/.config/update-feed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Product code to resolve, e.g. IU
    #[arg(long, short)]
    product: Option<String>,

    /// Product display name used for GitHub releases
    #[arg(long)]
    name: Option<String>,

    /// Update channel: eap, milestone, beta or release
    #[arg(long)]
    channel: Option<String>,

    /// Treat the source as a GitHub release JSON object
    #[arg(long)]
    release: bool,

    /// Repository URL for GitHub release links
    #[arg(long, value_name = "URL")]
    repository: Option<String>,

    /// Installed build number; prints the newer builds in the selected channel
    #[arg(long, value_name = "BUILD")]
    current: Option<String>,
}

async fn read_source(source: &str, config: &Config) -> Result<String> {
    let bytes = if is_remote_source(source) {
        let client = reqwest::Client::builder()
            .user_agent(concat!("update-feed/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let options = FetchOptions {
            max_size: config.max_feed_size_bytes(),
            ..FetchOptions::default()
        };
        feed::fetch_feed(&client, source, &options)
            .await
            .with_context(|| format!("Failed to fetch {source}"))?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read {source}"))?
    };
    String::from_utf8(bytes).with_context(|| format!("{source} is not valid UTF-8"))
}

fn print_product(product: &Product) {
    println!("{} ({})", product.name, product.code);
    if product.disable_machine_id {
        println!("  machine id: disabled");
    }
    for channel in &product.channels {
        println!(
            "  channel {} [{}, licensing {}, eval {} days]",
            channel.id,
            channel.status.display_name(),
            channel.licensing.code(),
            channel.eval_days
        );
        for build in &channel.builds {
            let date = build
                .release_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("    {} {} ({})", build.number, build.version, date);
        }
    }
}

fn report_updates(product: &Product, status: ChannelStatus, current: &BuildNumber) {
    let Some(channel) = product.channel_with_status(status) else {
        println!("No {status} channel for {product}");
        return;
    };

    let newer: Vec<_> = channel.builds_newer_than(current).collect();
    if newer.is_empty() {
        println!("{current} is up to date on {}", channel.id);
        return;
    }

    println!("Updates for {current} on {}:", channel.id);
    for build in &newer {
        println!("  {} {}", build.number, build.version);
    }

    if let Some(latest) = channel.latest_build() {
        match latest.patch_from(current) {
            Some(patch) => println!(
                "Patch available to {} (size: {})",
                latest.number,
                patch.size.as_deref().unwrap_or("unknown")
            ),
            None => match &latest.download_url {
                Some(url) => println!("Full download required: {url}"),
                None => println!("Full download required"),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let product_code = args
        .product
        .or_else(|| config.product_code.clone())
        .context("No product code: pass --product or set product_code in the config")?;
    let channel = match &args.channel {
        Some(code) => code
            .parse::<ChannelStatus>()
            .with_context(|| format!("Invalid --channel {code:?}"))?,
        None => config.channel_status()?,
    };
    let source = args
        .source
        .or_else(|| config.feed_url.clone())
        .context("No feed source: pass a file/URL or set feed_url in the config")?;

    let content = read_source(&source, &config).await?;

    let product = if args.release {
        let repository = args
            .repository
            .or_else(|| config.repository_url.clone())
            .context("GitHub releases need --repository or repository_url in the config")?;
        validate_url(&repository).with_context(|| format!("Invalid repository URL {repository}"))?;
        let name = args
            .name
            .or_else(|| config.product_name.clone())
            .unwrap_or_else(|| product_code.clone());

        feed::from_release_str(
            &content,
            &ReleaseTarget {
                product_code: &product_code,
                product_name: &name,
                channel,
                repository_url: &repository,
            },
        )
    } else {
        feed::parse_feed(&content, &product_code, OsSuffix::current())
    }
    .with_context(|| format!("Failed to parse update information from {source}"))?;

    let Some(product) = product else {
        eprintln!("No update information for product {product_code} in {source}");
        std::process::exit(1);
    };

    print_product(&product);

    if let Some(current) = &args.current {
        let current = BuildNumber::parse(current)
            .with_context(|| format!("Invalid --current build number {current:?}"))?;
        report_updates(&product, channel, &current);
    }

    Ok(())
}
