//! Benchmark assets: one folder per Pokémon generation.
//!
//! A benchmark folder holds `images.json`, `labels.txt` and
//! `ground_truth.jsonl`, plus the per-model predictions and scores written by
//! benchmark runs.

pub mod builder;

use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::DatasetError;
use crate::leaderboard::model_slug;

pub use builder::{BenchmarkAssets, DatasetBuilder, DatasetSummary};

/// A Pokémon generation, 1 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u8);

impl Generation {
    pub fn new(number: u8) -> Result<Self, DatasetError> {
        if (1..=9).contains(&number) {
            Ok(Self(number))
        } else {
            Err(DatasetError::UnknownGeneration(number))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// National Dex ids covered by this generation.
    ///
    /// Generation 7 starts at 777; 722-776 are left out.
    pub fn dex_range(self) -> RangeInclusive<u32> {
        match self.0 {
            1 => 1..=151,
            2 => 152..=251,
            3 => 252..=386,
            4 => 387..=493,
            5 => 494..=649,
            6 => 650..=721,
            7 => 777..=809,
            8 => 810..=898,
            _ => 899..=1025,
        }
    }

    /// Folder name, e.g. `gen1`.
    pub fn slug(self) -> String {
        format!("gen{}", self.0)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

impl FromStr for Generation {
    type Err = DatasetError;

    /// Accepts `gen<N>` (case-insensitive) or a bare number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        let digits = trimmed.strip_prefix("gen").unwrap_or(&trimmed);
        let number: u8 = digits
            .parse()
            .map_err(|_| DatasetError::InvalidBenchmark(s.to_string()))?;
        Self::new(number)
    }
}

/// File layout of one benchmark folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkPaths {
    pub dir: PathBuf,
    pub images: PathBuf,
    pub labels: PathBuf,
    pub ground_truth: PathBuf,
}

impl BenchmarkPaths {
    pub fn new(root: &Path, generation: Generation) -> Self {
        let dir = root.join(generation.slug());
        Self {
            images: dir.join("images.json"),
            labels: dir.join("labels.txt"),
            ground_truth: dir.join("ground_truth.jsonl"),
            dir,
        }
    }

    pub fn predictions(&self, model: &str) -> PathBuf {
        self.dir.join(format!("predictions_{}.json", model_slug(model)))
    }

    pub fn scores(&self, model: &str) -> PathBuf {
        self.dir.join(format!("scores_{}.json", model_slug(model)))
    }

    pub fn exists(&self) -> bool {
        self.images.is_file() && self.labels.is_file() && self.ground_truth.is_file()
    }
}
