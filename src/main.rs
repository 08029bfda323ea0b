use anyhow::{Context, Result};
use benchscore::cli::{Cli, OutputFormat, ReportKind};
use benchscore::csv_output::CsvOutput;
use benchscore::json_output::JsonOutput;
use benchscore::pipeline::Pipeline;
use benchscore::properties::platform_diff;
use benchscore::report;
use benchscore::scoring::{RankOrder, ScoreConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Cli) -> Result<ScoreConfig> {
    let config = match &args.config {
        Some(path) => ScoreConfig::from_toml_file(path)?,
        None => ScoreConfig::default(),
    };
    Ok(args.apply_overrides(config))
}

fn render(args: &Cli, pipeline: &Pipeline) -> Result<String> {
    let query = args.storage_query();
    let data = query
        .load()
        .with_context(|| format!("Failed to load benchmark data from {}", query.root.display()))?;
    if data.samples.is_empty() {
        anyhow::bail!(
            "No benchmark results found under {} for category '{}' (actor '{}', set '{}')",
            query.root.display(),
            query.category,
            query.actor_pattern(),
            query.set_pattern()
        );
    }

    let output = match args.report {
        ReportKind::Ranking => {
            let analysis = pipeline.analyze(&data.samples, &data.platforms)?;
            let table = match args.order {
                RankOrder::Worst => analysis.worst,
                RankOrder::Best => analysis.best,
            };
            match args.format {
                OutputFormat::Text => format!(
                    "{}{}",
                    report::render_exclusions(&analysis.exclusions),
                    report::render_ranking(&table, args.condensed)
                ),
                OutputFormat::Json => JsonOutput::new(args.report.name())
                    .with_ranking(table, &analysis.exclusions)
                    .to_json()?,
                OutputFormat::Csv => CsvOutput::ranking(&table, args.condensed).to_csv()?,
            }
        }
        ReportKind::Trends => {
            let trends = pipeline.trends(&data.samples, &data.platforms)?;
            match args.format {
                OutputFormat::Text => report::render_trends(&trends),
                OutputFormat::Json => JsonOutput::new(args.report.name())
                    .with_trends(trends)
                    .to_json()?,
                OutputFormat::Csv => CsvOutput::trends(&trends).to_csv()?,
            }
        }
        ReportKind::Changes => {
            let changes = pipeline.changes(&data.samples, &data.platforms)?;
            match args.format {
                OutputFormat::Text => report::render_changes(&changes),
                OutputFormat::Json => JsonOutput::new(args.report.name())
                    .with_changes(changes)
                    .to_json()?,
                OutputFormat::Csv => CsvOutput::changes(&changes).to_csv()?,
            }
        }
        ReportKind::Compare => {
            let table = pipeline.compare_sets(&data.samples, args.set_order)?;
            match args.format {
                OutputFormat::Text => report::render_comparison(&table),
                OutputFormat::Csv => CsvOutput::comparison(&table).to_csv()?,
                OutputFormat::Json => JsonOutput::new(args.report.name())
                    .with_comparison(table)
                    .to_json()?,
            }
        }
        ReportKind::Records => {
            let records =
                pipeline.annotated_records(&data.samples, &data.platforms, &data.metrics)?;
            match args.format {
                OutputFormat::Text => report::render_records(&records),
                OutputFormat::Csv => CsvOutput::records(&records).to_csv()?,
                OutputFormat::Json => JsonOutput::new(args.report.name())
                    .with_records(records)
                    .to_json()?,
            }
        }
        ReportKind::Platform => {
            let diff = platform_diff(&data.platforms, &pipeline.config().origin);
            match args.format {
                OutputFormat::Text => report::render_platform_diff(&diff),
                OutputFormat::Csv => CsvOutput::platform_diff(&diff).to_csv()?,
                OutputFormat::Json => JsonOutput::new(args.report.name())
                    .with_platform_diff(diff)
                    .to_json()?,
            }
        }
    };
    Ok(output)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;
    let pipeline = Pipeline::new(config).context("Invalid scoring configuration")?;

    let output = render(&args, &pipeline)?;
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
