// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Subprocess runner for the containerised photogrammetry pipeline

use crate::config::ReconstructionConfig;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// Mount point of the data directory inside the container
const CONTAINER_DATA: &str = "/data";

/// Runs the pipeline container on an image directory
#[derive(Debug, Clone)]
pub struct ReconstructionRunner {
    image: String,
    data_dir: PathBuf,
    focal_length: u32,
    extra_args: Vec<String>,
}

impl ReconstructionRunner {
    pub fn new(image: impl Into<String>, data_dir: impl Into<PathBuf>, focal_length: u32) -> Self {
        Self {
            image: image.into(),
            data_dir: data_dir.into(),
            focal_length,
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ReconstructionConfig) -> Self {
        Self::new(&config.image, &config.data_dir, config.focal_length)
            .with_extra_args(config.extra_args.clone())
    }

    /// Additional pipeline flags, e.g. densification presets
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of `host` as seen from inside the container
    pub fn container_path(&self, host: &Path) -> Result<String> {
        let relative = host.strip_prefix(&self.data_dir).with_context(|| {
            format!(
                "{:?} is not inside the mounted data directory {:?}",
                host, self.data_dir
            )
        })?;

        let mut path = CONTAINER_DATA.to_string();
        for component in relative.components() {
            path.push('/');
            path.push_str(&component.as_os_str().to_string_lossy());
        }
        Ok(path)
    }

    /// Build the `docker run` invocation for `input` -> `output`
    pub fn command(&self, input: &Path, output: &Path) -> Result<Command> {
        let data_dir = std::path::absolute(&self.data_dir)
            .with_context(|| format!("Failed to resolve data directory {:?}", self.data_dir))?;

        let mut command = Command::new("docker");
        command
            .arg("run")
            .arg("-v")
            .arg(format!("{}:{}", data_dir.display(), CONTAINER_DATA))
            .args(["--user", "0", "--rm"])
            .arg(&self.image)
            .arg("pipeline.py")
            .arg("--input")
            .arg(self.container_path(input)?)
            .arg("--output")
            .arg(self.container_path(output)?)
            .args(["--sfm-type", "global"])
            .arg("--flength")
            .arg(self.focal_length.to_string())
            .args(["--geomodel", "e", "--run-openmvg", "--run-openmvs"])
            .args(&self.extra_args)
            .args(["--rmcuda", "--output-obj", "--densify-only"]);
        Ok(command)
    }

    /// Run the pipeline and wait for it
    pub fn run(&self, input: &Path, output: &Path) -> Result<Duration> {
        if !self.is_docker_available() {
            bail!("docker is not installed or not in PATH");
        }

        log::info!("Reconstructing {:?} into {:?}", input, output);
        let start = Instant::now();

        let status = self
            .command(input, output)?
            .status()
            .context("Failed to execute reconstruction pipeline")?;

        if !status.success() {
            bail!("Reconstruction pipeline exited with status: {}", status);
        }

        Ok(start.elapsed())
    }

    /// Check if docker is available
    pub fn is_docker_available(&self) -> bool {
        Command::new("docker").arg("--version").output().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_path() {
        let runner = ReconstructionRunner::new("img", "/srv/data", 1920);
        assert_eq!(
            runner
                .container_path(Path::new("/srv/data/mvs_dataset/images/scan1"))
                .unwrap(),
            "/data/mvs_dataset/images/scan1"
        );
        assert!(runner.container_path(Path::new("/tmp/scan1")).is_err());
    }

    #[test]
    fn test_command_arguments() {
        let runner = ReconstructionRunner::new("spedenaave/dpg", "/srv/data", 400)
            .with_extra_args(vec!["--dpreset".to_string(), "ULTRA".to_string()]);
        let command = runner
            .command(
                Path::new("/srv/data/in"),
                Path::new("/srv/data/results/out"),
            )
            .unwrap();

        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(command.get_program(), "docker");
        assert_eq!(args[2], "/srv/data:/data");
        assert!(args.windows(2).any(|w| w == ["--input", "/data/in"]));
        assert!(args.windows(2).any(|w| w == ["--output", "/data/results/out"]));
        assert!(args.windows(2).any(|w| w == ["--flength", "400"]));
        assert!(args.windows(2).any(|w| w == ["--dpreset", "ULTRA"]));
        assert_eq!(args.last().map(String::as_str), Some("--densify-only"));
    }
}
