// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Voxset CLI
//! Dataset inspection, voxel IoU evaluation and reconstruction runs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use voxset::cli::{progress_bar, Reporter};
use voxset::config::{SourceConfig, VoxsetConfig};
use voxset::dataset::{build_dataset, collect_source, DatasetSplit, PathTemplate};
use voxset::evaluation::{
    iou, maximize_iou, threshold_iou, write_evaluations, EvaluationReport, Reporter as ReportWriter,
};
use voxset::reconstruction::{
    evaluate_taxonomies, reconstruct, ReconstructionRunner, ScanEvaluator, ScanLayout,
};
use voxset::voxel::{ply_to_grid, read_binvox, read_volume, write_binvox};
use voxset::VoxsetError;

#[derive(Parser)]
#[command(name = "voxset")]
#[command(about = "Multi-view voxel dataset tools and IoU evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./voxset.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Shapenet,
    Mvs,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect a split and print per-taxonomy sample counts
    Index {
        #[arg(long, value_enum, default_value = "shapenet")]
        source: Source,

        #[arg(long, default_value = "train", value_parser = parse_split)]
        split: DatasetSplit,

        /// Write the collected index as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Decode one entry of the configured dataset
    Sample {
        #[arg(long, default_value = "train", value_parser = parse_split)]
        split: DatasetSplit,

        /// Position in the dataset
        index: usize,

        /// Views to draw (defaults to the configured count)
        #[arg(long)]
        views: Option<usize>,

        /// Seed for training-mode view selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// IoU of two volumes
    Iou {
        result: PathBuf,
        truth: PathBuf,

        /// Binarise the result at this threshold (any volume format)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Search the circular shift of a result that maximises IoU
    Align {
        result: PathBuf,
        truth: PathBuf,

        #[arg(long)]
        max_shift: Option<u32>,

        /// Write the aligned result here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// IoU of reconstructed MVS scans in an inclusive range
    ScanIou {
        first: u32,
        last: u32,

        /// Evaluate the previously aligned results
        #[arg(long)]
        maximized: bool,

        /// Run the shift search and write aligned results
        #[arg(long, conflicts_with = "maximized")]
        align: bool,
    },

    /// Voxelise a PLY point cloud into a binvox file
    Voxelize {
        input: PathBuf,
        output: PathBuf,

        #[arg(long)]
        dim: Option<usize>,
    },

    /// Run the reconstruction pipeline on one MVS scan
    Reconstruct {
        scan: u32,

        /// Resize inputs to fit this square size first
        #[arg(long)]
        resize: Option<u32>,
    },

    /// Evaluate reconstructions of a split per taxonomy
    TaxonomyIou {
        #[arg(long, value_enum, default_value = "shapenet")]
        source: Source,

        #[arg(long, default_value = "test", value_parser = parse_split)]
        split: DatasetSplit,
    },
}

fn parse_split(s: &str) -> std::result::Result<DatasetSplit, String> {
    DatasetSplit::parse(s).ok_or_else(|| format!("unknown split '{}'", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Reporter::report_error(&format!("{:#}", e));
            let fatal = e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<VoxsetError>())
                .any(VoxsetError::is_fatal);
            if fatal {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = VoxsetConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Index {
            source,
            split,
            json,
        } => index_command(&config, *source, *split, json.as_deref()),
        Commands::Sample {
            split,
            index,
            views,
            seed,
        } => sample_command(&config, *split, *index, *views, *seed),
        Commands::Iou {
            result,
            truth,
            threshold,
        } => iou_command(result, truth, *threshold),
        Commands::Align {
            result,
            truth,
            max_shift,
            out,
        } => align_command(
            result,
            truth,
            max_shift.unwrap_or(config.evaluation.max_shift),
            out.as_deref(),
        ),
        Commands::ScanIou {
            first,
            last,
            maximized,
            align,
        } => scan_iou_command(&config, *first, *last, *maximized, *align, cli.verbose),
        Commands::Voxelize { input, output, dim } => {
            voxelize_command(input, output, dim.unwrap_or(config.evaluation.voxel_dim))
        }
        Commands::Reconstruct { scan, resize } => {
            reconstruct_command(&config, *scan, resize.or(config.reconstruction.resize))
        }
        Commands::TaxonomyIou { source, split } => {
            taxonomy_iou_command(&config, *source, *split, cli.verbose)
        }
    }
}

fn source_config(config: &VoxsetConfig, source: Source) -> &SourceConfig {
    match source {
        Source::Shapenet => &config.shapenet,
        Source::Mvs => &config.mvs,
    }
}

fn index_command(
    config: &VoxsetConfig,
    source: Source,
    split: DatasetSplit,
    json: Option<&Path>,
) -> Result<()> {
    let index = collect_source(source_config(config, source), split)?;
    Reporter::report_index(&index);

    if let Some(path) = json {
        let content = serde_json::to_string_pretty(&index)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Reporter::success(&format!("Index written to {}", path.display()));
    }
    Ok(())
}

fn sample_command(
    config: &VoxsetConfig,
    split: DatasetSplit,
    index: usize,
    views: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let dataset = build_dataset(config, split)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    let k = views.unwrap_or_else(|| dataset.view_count());
    let sample = dataset.get_with_views(index, k, &mut rng)?;
    Reporter::report_sample(&sample, start.elapsed());
    Ok(())
}

fn iou_command(result: &Path, truth: &Path, threshold: Option<f32>) -> Result<()> {
    let score = match threshold {
        Some(threshold) => threshold_iou(&read_volume(result)?, &read_volume(truth)?, threshold)?,
        None => iou(&read_binvox(result)?, &read_binvox(truth)?)?,
    };
    Reporter::report_iou(&score);
    Ok(())
}

fn align_command(result: &Path, truth: &Path, max_shift: u32, out: Option<&Path>) -> Result<()> {
    let result_grid = read_binvox(result).with_context(|| format!("Failed to read {:?}", result))?;
    let truth_grid = read_binvox(truth).with_context(|| format!("Failed to read {:?}", truth))?;

    let start = Instant::now();
    let alignment = maximize_iou(&result_grid, &truth_grid, max_shift)?;
    Reporter::report_alignment(&alignment, start.elapsed());

    if let Some(out) = out {
        write_binvox(&alignment.grid, out)?;
        Reporter::success(&format!("Aligned result written to {}", out.display()));
    }
    Ok(())
}

fn scan_iou_command(
    config: &VoxsetConfig,
    first: u32,
    last: u32,
    maximized: bool,
    align: bool,
    verbose: bool,
) -> Result<()> {
    if first > last {
        bail!("Empty scan range {}..={}", first, last);
    }

    println!(
        "{} scans {} to {} (maximized: {}, align: {})",
        "Calculating IoU for".bold(),
        first,
        last,
        maximized,
        align
    );

    let layout = ScanLayout::new(
        config
            .reconstruction
            .data_dir
            .join(&config.reconstruction.mvs_dir),
    );
    let evaluator = ScanEvaluator::new(layout)
        .with_maximized(maximized)
        .with_alignment(align.then_some(config.evaluation.max_shift));

    let pb = progress_bar(u64::from(last - first + 1), !verbose);
    let report = evaluator.evaluate_range(first, last, |scan| {
        pb.set_message(ScanLayout::scan_name(scan));
        pb.inc(1);
    });
    pb.finish_and_clear();

    for result in &report.results {
        println!("IoU {}: {:.4}", result.sample, result.aligned_iou);
    }
    write_report(config, &report, "scan_iou")?;
    Reporter::report_summary(&report);
    Ok(())
}

fn voxelize_command(input: &Path, output: &Path, dim: usize) -> Result<()> {
    let grid = ply_to_grid(input, dim).with_context(|| format!("Failed to voxelise {:?}", input))?;
    write_binvox(&grid, output)?;
    Reporter::success(&format!(
        "{} occupied cells written to {}",
        grid.occupied_count(),
        output.display()
    ));
    Ok(())
}

fn reconstruct_command(config: &VoxsetConfig, scan: u32, resize: Option<u32>) -> Result<()> {
    let layout = ScanLayout::new(
        config
            .reconstruction
            .data_dir
            .join(&config.reconstruction.mvs_dir),
    );
    let runner = ReconstructionRunner::from_config(&config.reconstruction);
    let output = layout.output(scan);

    let grid = reconstruct(
        &runner,
        &layout.images_dir(scan),
        &output,
        resize,
        config.evaluation.voxel_dim,
    )?;
    Reporter::success(&format!(
        "{} reconstructed: {} occupied cells in {}",
        ScanLayout::scan_name(scan),
        grid.occupied_count(),
        output.voxels().display()
    ));
    Ok(())
}

fn taxonomy_iou_command(
    config: &VoxsetConfig,
    source: Source,
    split: DatasetSplit,
    verbose: bool,
) -> Result<()> {
    let index = collect_source(source_config(config, source), split)?;
    let results = PathTemplate::parse(&config.reconstruction.result_template)
        .context("Invalid reconstruction result template")?;

    let pb = progress_bar(index.len() as u64, !verbose);
    let (table, report) =
        evaluate_taxonomies(&index, &results, config.evaluation.voxel_dim, |_| pb.inc(1))?;
    pb.finish_and_clear();

    std::fs::create_dir_all(&config.output_dir)?;
    let json_path = config.output_dir.join("taxonomy_iou.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&table)?)?;
    write_report(config, &report, "taxonomy_iou")?;

    Reporter::report_taxonomies(&table);
    Reporter::report_summary(&report);
    Ok(())
}

/// Write JSON, Markdown and CSV renditions of `report` into the output directory
fn write_report(config: &VoxsetConfig, report: &EvaluationReport, stem: &str) -> Result<()> {
    let output_dir = &config.output_dir;
    std::fs::create_dir_all(output_dir)?;

    ReportWriter::write_json(report, &output_dir.join(format!("{}.json", stem)))?;
    ReportWriter::write_markdown(report, &output_dir.join(format!("{}.md", stem)))?;
    write_evaluations(output_dir.join(format!("{}.csv", stem)), &report.results)?;

    Reporter::report_info(&format!("Reports written to {}", output_dir.display()));
    Ok(())
}
