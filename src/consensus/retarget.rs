//! Retarget rule selection
//!
//! The chain has changed its retarget rule over time. Each rule stays an
//! independent pure function; this module only picks which one applies at a
//! given height.

use crate::consensus::difficulty::{
    next_difficulty_v2, next_difficulty_v3, next_difficulty_v4, unzip_samples, DifficultyError,
    DifficultySample,
};
use crate::constants::{DIFFICULTY_BLOCKS_COUNT_V2, DIFFICULTY_WINDOW_V2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// One generation of the retarget rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyAlgorithm {
    /// Floating-point LWMA
    V2,
    /// Integer LWMA with a 67%..150% clamp and jump rule
    V3,
    /// LWMA-4 with solve-time tempering and digit rounding
    V4,
}

impl DifficultyAlgorithm {
    /// Compute the next difficulty from a window of chain history.
    pub fn next_difficulty(
        &self,
        timestamps: &[u64],
        cumulative_difficulties: &[u64],
        target_seconds: u64,
    ) -> Result<u64, DifficultyError> {
        match self {
            DifficultyAlgorithm::V2 => {
                next_difficulty_v2(timestamps, cumulative_difficulties, target_seconds)
            }
            DifficultyAlgorithm::V3 => {
                next_difficulty_v3(timestamps, cumulative_difficulties, target_seconds)
            }
            DifficultyAlgorithm::V4 => next_difficulty_v4(timestamps, cumulative_difficulties),
        }
    }

    /// How many trailing samples the chain should supply.
    pub fn blocks_count(&self) -> usize {
        match self {
            DifficultyAlgorithm::V2 => DIFFICULTY_WINDOW_V2 as usize,
            DifficultyAlgorithm::V3 | DifficultyAlgorithm::V4 => DIFFICULTY_BLOCKS_COUNT_V2 as usize,
        }
    }
}

impl fmt::Display for DifficultyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DifficultyAlgorithm::V2 => "v2",
            DifficultyAlgorithm::V3 => "v3",
            DifficultyAlgorithm::V4 => "v4",
        };
        f.write_str(name)
    }
}

impl FromStr for DifficultyAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v2" | "lwma" => Ok(DifficultyAlgorithm::V2),
            "v3" => Ok(DifficultyAlgorithm::V3),
            "v4" | "lwma4" => Ok(DifficultyAlgorithm::V4),
            other => Err(format!("unknown difficulty algorithm: {}", other)),
        }
    }
}

/// Activation heights for each retarget rule, ordered by height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetargetSchedule {
    activations: Vec<(u64, DifficultyAlgorithm)>,
}

impl RetargetSchedule {
    /// Build a schedule. The first activation must be at height 0 and
    /// heights must strictly increase.
    pub fn new(activations: Vec<(u64, DifficultyAlgorithm)>) -> Result<Self, DifficultyError> {
        let first = activations.first().ok_or(DifficultyError::EmptySchedule)?;
        if first.0 != 0 {
            return Err(DifficultyError::ScheduleStartsLate(first.0));
        }
        for pair in activations.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(DifficultyError::UnorderedActivation(pair[1].0));
            }
        }
        Ok(Self { activations })
    }

    /// Single rule for the whole chain
    pub fn fixed(algorithm: DifficultyAlgorithm) -> Self {
        Self {
            activations: vec![(0, algorithm)],
        }
    }

    /// The rule in force for a block at `height`.
    pub fn algorithm_at(&self, height: u64) -> DifficultyAlgorithm {
        let idx = self.activations.partition_point(|(start, _)| *start <= height);
        // Index 0 always activates at height 0, so idx >= 1.
        self.activations[idx.saturating_sub(1)].1
    }

    /// Next difficulty for a block at `height`.
    pub fn next_difficulty(
        &self,
        height: u64,
        timestamps: &[u64],
        cumulative_difficulties: &[u64],
        target_seconds: u64,
    ) -> Result<u64, DifficultyError> {
        let algorithm = self.algorithm_at(height);
        let difficulty =
            algorithm.next_difficulty(timestamps, cumulative_difficulties, target_seconds)?;
        debug!(height, %algorithm, difficulty, "computed next difficulty");
        Ok(difficulty)
    }

    /// Next difficulty from recorded history, oldest first. Only the
    /// trailing window the rule at `height` consumes is used.
    pub fn next_difficulty_from_samples(
        &self,
        height: u64,
        samples: &[DifficultySample],
        target_seconds: u64,
    ) -> Result<u64, DifficultyError> {
        let blocks_count = self.algorithm_at(height).blocks_count();
        let window = &samples[samples.len().saturating_sub(blocks_count)..];
        let (timestamps, cumulative_difficulties) = unzip_samples(window);
        self.next_difficulty(height, &timestamps, &cumulative_difficulties, target_seconds)
    }
}

impl Default for RetargetSchedule {
    fn default() -> Self {
        Self::fixed(DifficultyAlgorithm::V2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DIFFICULTY_TARGET_V2;

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("v2".parse::<DifficultyAlgorithm>(), Ok(DifficultyAlgorithm::V2));
        assert_eq!("LWMA".parse::<DifficultyAlgorithm>(), Ok(DifficultyAlgorithm::V2));
        assert_eq!("v3".parse::<DifficultyAlgorithm>(), Ok(DifficultyAlgorithm::V3));
        assert_eq!("V4".parse::<DifficultyAlgorithm>(), Ok(DifficultyAlgorithm::V4));
        assert!("v5".parse::<DifficultyAlgorithm>().is_err());
        assert_eq!(DifficultyAlgorithm::V4.to_string(), "v4");
    }

    #[test]
    fn test_schedule_validation() {
        assert_eq!(RetargetSchedule::new(vec![]), Err(DifficultyError::EmptySchedule));
        assert_eq!(
            RetargetSchedule::new(vec![(5, DifficultyAlgorithm::V2)]),
            Err(DifficultyError::ScheduleStartsLate(5))
        );
        assert_eq!(
            RetargetSchedule::new(vec![
                (0, DifficultyAlgorithm::V2),
                (10, DifficultyAlgorithm::V3),
                (10, DifficultyAlgorithm::V4),
            ]),
            Err(DifficultyError::UnorderedActivation(10))
        );
    }

    #[test]
    fn test_algorithm_at_height() {
        let schedule = RetargetSchedule::new(vec![
            (0, DifficultyAlgorithm::V2),
            (1000, DifficultyAlgorithm::V3),
            (5000, DifficultyAlgorithm::V4),
        ])
        .unwrap();
        assert_eq!(schedule.algorithm_at(0), DifficultyAlgorithm::V2);
        assert_eq!(schedule.algorithm_at(999), DifficultyAlgorithm::V2);
        assert_eq!(schedule.algorithm_at(1000), DifficultyAlgorithm::V3);
        assert_eq!(schedule.algorithm_at(4999), DifficultyAlgorithm::V3);
        assert_eq!(schedule.algorithm_at(5000), DifficultyAlgorithm::V4);
        assert_eq!(schedule.algorithm_at(u64::MAX), DifficultyAlgorithm::V4);
    }

    #[test]
    fn test_schedule_dispatches_bootstrap_values() {
        let schedule = RetargetSchedule::new(vec![
            (0, DifficultyAlgorithm::V2),
            (100, DifficultyAlgorithm::V4),
        ])
        .unwrap();
        let ts = [1, 2, 3];
        let cd = [1, 2, 3];
        assert_eq!(schedule.next_difficulty(50, &ts, &cd, DIFFICULTY_TARGET_V2), Ok(1));
        assert_eq!(schedule.next_difficulty(150, &ts, &cd, DIFFICULTY_TARGET_V2), Ok(100));
    }

    #[test]
    fn test_blocks_count() {
        assert_eq!(DifficultyAlgorithm::V2.blocks_count(), 60);
        assert_eq!(DifficultyAlgorithm::V3.blocks_count(), 61);
        assert_eq!(DifficultyAlgorithm::V4.blocks_count(), 61);
    }

    #[test]
    fn test_next_difficulty_from_samples_follows_schedule() {
        let schedule = RetargetSchedule::new(vec![
            (0, DifficultyAlgorithm::V2),
            (100, DifficultyAlgorithm::V3),
            (200, DifficultyAlgorithm::V4),
        ])
        .unwrap();
        let samples: Vec<DifficultySample> = (0..101u64)
            .map(|i| DifficultySample {
                timestamp: 1_000_000 + i * DIFFICULTY_TARGET_V2,
                cumulative_difficulty: (i + 1) * 1001,
            })
            .collect();
        let next = |height| {
            schedule.next_difficulty_from_samples(height, &samples, DIFFICULTY_TARGET_V2)
        };
        // 1001 * 0.998
        assert_eq!(next(50), Ok(998));
        // 60060 * 120 * 61 * 99 / (200 * 219600)
        assert_eq!(next(150), Ok(990));
        // 1001 * 60 * 61 * 120 * 97 / (200 * 219600)
        assert_eq!(next(250), Ok(970));
        assert_eq!(
            schedule.next_difficulty_from_samples(250, &samples[..5], DIFFICULTY_TARGET_V2),
            Ok(100)
        );
    }

    #[test]
    fn test_default_schedule_is_lwma() {
        assert_eq!(RetargetSchedule::default().algorithm_at(123), DifficultyAlgorithm::V2);
    }
}
