extern crate pretty_env_logger;

#[macro_use]
extern crate log;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;

use shardmeans::{read_dataset, run_local, write_report, ArgParser, RunReport};

fn main() {
    let args = ArgParser::parse();
    let level = if args.io.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    pretty_env_logger::formatted_timed_builder()
        .filter_level(level)
        .init();

    info!("starting");
    info!("params: {:#?}", args);
    if !args.validate() {
        error!("please fix arguments");
        std::process::exit(1);
    }

    let dataset = match read_dataset(&args.io.input, args.km.dim) {
        Ok(data) => data,
        Err(e) => {
            error!("unable to read --input: {}", e);
            std::process::exit(1);
        }
    };
    if dataset.is_empty() {
        error!("no elements to cluster");
        std::process::exit(1);
    }
    let dim = args.km.dim.unwrap_or(dataset[0].len());
    let config = args.km.config(dim);
    info!("clustering {} elements of dimension {}", dataset.len(), dim);

    let sty = ProgressStyle::with_template(
        " [{elapsed_precise}] {bar:44.cyan/blue} > {pos} generations",
    )
    .unwrap()
    .progress_chars("##-");
    let pbar = ProgressBar::new(config.max_generations as u64).with_style(sty);

    let outcome = match run_local(
        dataset,
        config,
        args.km.metric.build(),
        args.km.seeding.build(args.km.seed),
        Some(pbar),
    ) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("clustering failed: {}", e);
            std::process::exit(1);
        }
    };

    let clusters = outcome.clusters.clone().unwrap_or_default();
    for (idx, cluster) in clusters.iter().enumerate() {
        info!("cluster {}: {} members", idx, cluster.members.len());
        debug!("cluster {} centroid [{}]", idx, cluster.centroid.iter().join(","));
    }

    if let Err(e) = write_report(
        &args.io.output,
        &RunReport::new(&args.km, &outcome, &clusters),
    ) {
        error!("unable to write output: {}", e);
        std::process::exit(1);
    }
    info!("finished");
}
