use clap::Parser;
use landmark_gesture::batch::evaluate_dir;
use landmark_gesture::config::{EngineConfig, Strategy};
use landmark_gesture::io::{EvaluationReport, format_table, write_report};
use landmark_gesture::template::TemplateStore;
use std::collections::HashSet;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct LgrsCli {
    /// models directory holding `poses/` and `gestures/`
    templates: String,

    /// directory of recorded samples, searched recursively for *.json
    samples: String,

    #[arg(short, long, default_value_t = 8)]
    workers: usize,

    /// only load these template names (repeatable)
    #[arg(short, long)]
    include: Vec<String>,

    /// label every sample should have been classified as
    #[arg(short, long)]
    expected: Option<String>,

    /// engine configuration json
    #[arg(short, long)]
    config: Option<String>,

    /// overrides the matching strategy of the configuration
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// where to write the evaluation report json
    #[arg(short, long)]
    report: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = LgrsCli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    let include: Option<HashSet<String>> =
        (!cli.include.is_empty()).then(|| cli.include.iter().cloned().collect());
    let store = TemplateStore::load_dir(&cli.templates, include.as_ref())?;
    if store.is_empty() {
        log::warn!("no templates loaded from {}", cli.templates);
    }

    let now = Instant::now();
    let table = evaluate_dir(&cli.samples, &config, &store, cli.workers)?;
    println!("evaluation took {:.6} sec", now.elapsed().as_secs_f64());
    print!("{}", format_table(&table));

    let report = EvaluationReport::new(table, cli.expected.as_deref());
    if let Some(accuracy) = report.accuracy {
        println!("accuracy: {:.2}%", accuracy * 100.0);
    }
    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }
    Ok(())
}
