//! Run the retention transform against files on disk, laid out as
//! `<root>/<bucket>/<key>`, through the same handler the Lambda uses.

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use csv_retention::{
    config::Config,
    event::{S3Event, S3EventRecord},
    handler::Handler,
    store::LocalStore,
};
use glob::glob;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
struct Args {
    /// Directory holding one sub-directory per bucket
    #[arg(long)]
    root: PathBuf,

    /// Bucket (sub-directory of root)
    #[arg(long)]
    bucket: String,

    /// Object key to process; repeatable
    #[arg(long = "key")]
    keys: Vec<String>,

    /// Glob, relative to the bucket directory, selecting more keys (e.g. `raw/**/*.csv`)
    #[arg(long)]
    pattern: Option<String>,

    /// YAML config file; environment overrides are not applied when given
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the lookback window in days
    #[arg(long)]
    lookback_days: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_yaml_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(days) = args.lookback_days {
        config.lookback_days = days;
    }

    let keys = collect_keys(&args)?;
    if keys.is_empty() {
        bail!("no keys given; use --key or --pattern");
    }
    info!(bucket = %args.bucket, keys = keys.len(), "processing local objects");

    let event = S3Event {
        records: keys
            .iter()
            .map(|k| S3EventRecord::for_object(&args.bucket, k))
            .collect(),
    };

    let handler = Handler::new(Arc::new(LocalStore::new(&args.root)), config);
    let resp = handler.handle(&event).await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

fn collect_keys(args: &Args) -> Result<Vec<String>> {
    let mut keys = args.keys.clone();
    let Some(pattern) = &args.pattern else {
        return Ok(keys);
    };

    let bucket_dir = args.root.join(&args.bucket);
    let full = format!("{}/{}", bucket_dir.display(), pattern);
    for entry in glob(&full).with_context(|| format!("invalid glob pattern {}", pattern))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!("cannot read glob entry: {:?}", e);
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let rel = path
            .strip_prefix(&bucket_dir)
            .with_context(|| format!("{} is not under {}", path.display(), bucket_dir.display()))?;
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        keys.push(key);
    }
    keys.sort();
    keys.dedup();
    Ok(keys)
}
