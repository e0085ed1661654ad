//! The `wardrobe analyze` command.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use wardrobe_core::{
    output::OutputFormat as CoreOutputFormat, Config, GarmentAnalyzer, ImageReport, ReportWriter,
};

use super::open_store;

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object, or an array for several images
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image files to analyze
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Run general item recognition instead of garment classification
    #[arg(long)]
    pub items: bool,

    /// Output format (defaults to `[output] format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let format = resolve_format(args.format, &config.output.format)?;
    let pretty = args.pretty || config.output.pretty;

    let store = open_store(config)?;
    let analyzer = GarmentAnalyzer::from_config(config, Arc::new(store));

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = ReportWriter::new(sink, format, pretty);

    for path in &args.images {
        let label = path.display().to_string();
        tracing::info!("Analyzing {label}");

        let report = match analyze_path(&analyzer, path, args.items).await {
            Ok(result) => ImageReport::success(label, result),
            Err(e) => {
                tracing::error!("Failed to analyze {label}: {e:#}");
                ImageReport::failure(label, format!("{e:#}"))
            }
        };
        writer.write(&report)?;
    }

    let (succeeded, failed_count) = (writer.succeeded(), writer.failed());
    writer.finish()?;

    tracing::info!("Analyzed {succeeded} image(s), {failed_count} failed");
    if succeeded == 0 {
        anyhow::bail!("All {failed_count} image(s) failed to analyze");
    }
    Ok(())
}

/// Read one image and run the selected analysis over it.
async fn analyze_path(
    analyzer: &GarmentAnalyzer,
    path: &Path,
    items: bool,
) -> anyhow::Result<serde_json::Value> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if items {
        let obj = analyzer.analyze_items(&bytes).await?;
        Ok(serde_json::Value::Object(obj))
    } else {
        let record = analyzer.analyze_garment(&bytes).await?;
        Ok(serde_json::to_value(record)?)
    }
}

fn resolve_format(
    cli: Option<OutputFormat>,
    configured: &str,
) -> anyhow::Result<CoreOutputFormat> {
    match cli {
        Some(format) => Ok(format.into()),
        None => CoreOutputFormat::parse(configured).with_context(|| {
            format!("Unknown output format '{configured}' in config (expected json or jsonl)")
        }),
    }
}
