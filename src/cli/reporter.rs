// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::dataset::{DatasetIndex, Sample};
use crate::evaluation::{Alignment, EvaluationReport, IouScore, TaxonomyIouTable};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Per-taxonomy counts of a collected split
    pub fn report_index(index: &DatasetIndex) {
        println!();
        Self::rule();
        println!(
            "{} {} ({} samples)",
            "Split:".bold(),
            index.split().to_string().cyan(),
            index.len()
        );
        Self::rule();

        for category in index.categories() {
            let skipped = if category.skipped > 0 {
                format!("{} skipped", category.skipped).yellow()
            } else {
                String::new().normal()
            };
            println!(
                "  {} {:<24} {:>6} {}",
                category.taxonomy_id.bright_black(),
                category.taxonomy_name,
                category.len.to_string().cyan(),
                skipped
            );
        }
        Self::rule();
    }

    /// Shapes of one decoded sample
    pub fn report_sample(sample: &Sample, duration: Duration) {
        println!();
        Self::rule();
        println!(
            "{} {}/{}",
            "Sample:".bold(),
            sample.taxonomy_id.cyan(),
            sample.sample_id.cyan()
        );
        Self::rule();
        println!(
            "  {} {:?}",
            "Views:".bright_black(),
            sample.view_indices
        );
        match sample.view_shape() {
            Some(shape) => println!(
                "  {} [{}, {}, {}, {}]",
                "Images:".bright_black(),
                sample.images.len(),
                shape[0],
                shape[1],
                shape[2]
            ),
            None => println!("  {} {}", "Images:".bright_black(), "shapes differ".red()),
        }
        println!(
            "  {} {:?}",
            "Volume:".bright_black(),
            sample.volume.dimensions
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        Self::rule();
    }

    pub fn report_iou(score: &IouScore) {
        let value = format!("{:.4}", score.value);
        println!(
            "{} {} {}",
            "IoU:".bold(),
            Self::colored_iou(score.value, &value),
            format!("({} / {})", score.intersection, score.union).bright_black()
        );
        if score.degenerate {
            Self::report_warning("both grids are empty; IoU reported as 0");
        }
    }

    pub fn report_alignment(alignment: &Alignment, duration: Duration) {
        println!();
        Self::rule();
        println!(
            "  {} {:.4}",
            "Baseline IoU:".bright_black(),
            alignment.baseline.value
        );
        match alignment.best {
            Some(best) => {
                let value = format!("{:.4}", best.score.value);
                println!(
                    "  {} {} at shift {:?}",
                    "Aligned IoU:".bright_black(),
                    Self::colored_iou(best.score.value, &value),
                    best.shift
                );
            }
            None => println!(
                "  {} {}",
                "Aligned IoU:".bright_black(),
                "no shift improved on zero".yellow()
            ),
        }
        println!(
            "  {} {} shifts in {}",
            "Searched:".bright_black(),
            alignment.candidates,
            Self::format_duration(duration).yellow()
        );
        Self::rule();
    }

    pub fn report_summary(report: &EvaluationReport) {
        println!(
            "{} {} of {} ({:.1}%)",
            "Evaluated:".green(),
            report.evaluated(),
            report.total_samples,
            report.success_rate()
        );
        println!("{} {}", "Errors:".yellow(), report.errors);
        println!(
            "{} {:.4} {} {:.4}",
            "Mean IoU:".bold(),
            report.mean_baseline_iou,
            "aligned:".bright_black(),
            report.mean_aligned_iou
        );
    }

    pub fn report_taxonomies(table: &TaxonomyIouTable) {
        println!();
        Self::rule();
        for (taxonomy_id, entry) in table.iter() {
            let mean = entry.mean().unwrap_or(0.0);
            let value = format!("{:.4}", mean);
            println!(
                "  {} {:>6} {}",
                taxonomy_id.bright_black(),
                entry.n_samples,
                Self::colored_iou(mean, &value)
            );
        }
        if let Some(mean) = table.overall_mean() {
            println!("  {} {:.4}", "Overall:".bold(), mean);
        }
        Self::rule();
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn colored_iou(iou: f64, text: &str) -> ColoredString {
        if iou >= 0.5 {
            text.green()
        } else if iou >= 0.2 {
            text.yellow()
        } else {
            text.red()
        }
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
