//! Difficulty retarget algorithms
//!
//! Three generations of the retarget rule are consensus history and must be
//! reproduced exactly. Each takes `timestamps[0..=N]` and
//! `cumulative_difficulties[0..=N]`, oldest first, and returns the
//! difficulty required of the next block.
//!
//! v3 and v4 are pure `u64` arithmetic that wraps on overflow exactly like
//! the deployed rule; v2 accumulates its LWMA in `f64`.

use crate::constants::{
    BOOTSTRAP_DIFFICULTY_GUESS, BOOTSTRAP_DIFFICULTY_V2, DIFFICULTY_TARGET_V2,
    DIFFICULTY_WINDOW_V2, LWMA_V2_ADJUST,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One block of chain history fed to the retarget rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultySample {
    pub timestamp: u64,
    pub cumulative_difficulty: u64,
}

/// Split samples into the parallel timestamp and cumulative difficulty
/// sequences the retarget functions take.
pub fn unzip_samples(samples: &[DifficultySample]) -> (Vec<u64>, Vec<u64>) {
    samples
        .iter()
        .map(|s| (s.timestamp, s.cumulative_difficulty))
        .unzip()
}

/// Difficulty computation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DifficultyError {
    #[error("window length mismatch: {timestamps} timestamps, {cumulative_difficulties} cumulative difficulties")]
    WindowLengthMismatch {
        timestamps: usize,
        cumulative_difficulties: usize,
    },
    #[error("retarget schedule is empty")]
    EmptySchedule,
    #[error("retarget schedule must start at height 0, first activation is {0}")]
    ScheduleStartsLate(u64),
    #[error("retarget activation heights must strictly increase (height {0})")]
    UnorderedActivation(u64),
}

fn check_window(timestamps: &[u64], cumulative_difficulties: &[u64]) -> Result<(), DifficultyError> {
    if timestamps.len() != cumulative_difficulties.len() {
        return Err(DifficultyError::WindowLengthMismatch {
            timestamps: timestamps.len(),
            cumulative_difficulties: cumulative_difficulties.len(),
        });
    }
    Ok(())
}

/// The most recent `count` samples of the window.
fn recent<'a>(
    timestamps: &'a [u64],
    cumulative_difficulties: &'a [u64],
    count: usize,
) -> (&'a [u64], &'a [u64]) {
    let start = timestamps.len().saturating_sub(count);
    (&timestamps[start..], &cumulative_difficulties[start..])
}

/// LWMA difficulty: `harmonic_mean(D) * T / LWMA(solvetimes)`.
///
/// Solve times may be negative and are only clamped to `[-7T, 7T]`; they are
/// never raised to a positive minimum, which would let a miner drive the
/// difficulty down with out-of-order timestamps.
pub fn next_difficulty_v2(
    timestamps: &[u64],
    cumulative_difficulties: &[u64],
    target_seconds: u64,
) -> Result<u64, DifficultyError> {
    check_window(timestamps, cumulative_difficulties)?;
    // Targets past i64::MAX saturate.
    let t = i64::try_from(target_seconds).unwrap_or(i64::MAX);
    let max_solve_time = t.saturating_mul(7);

    if timestamps.len() < 4 {
        return Ok(BOOTSTRAP_DIFFICULTY_V2);
    }
    let mut n = (DIFFICULTY_WINDOW_V2 - 1) as usize;
    if timestamps.len() - 1 < n {
        n = timestamps.len() - 1;
    }
    let (timestamps, cumulative_difficulties) = recent(timestamps, cumulative_difficulties, n + 1);

    // Normalizes the weighted sum back to a plain average.
    let k = (n * (n + 1) / 2) as f64;

    let mut lwma = 0f64;
    let mut sum_inverse_difficulty = 0f64;
    for i in 1..=n {
        let solve_time = (timestamps[i] as i64).wrapping_sub(timestamps[i - 1] as i64);
        let solve_time = solve_time.clamp(-max_solve_time, max_solve_time);
        let difficulty = cumulative_difficulties[i].wrapping_sub(cumulative_difficulties[i - 1]);
        lwma += solve_time as f64 * i as f64 / k;
        sum_inverse_difficulty += 1.0 / difficulty as f64;
    }

    let harmonic_mean_difficulty = n as f64 / sum_inverse_difficulty;

    if (lwma.round() as i64) < t / 20 {
        lwma = (t / 20) as f64;
    }

    let next_difficulty = harmonic_mean_difficulty * t as f64 / lwma * LWMA_V2_ADJUST;
    let next_difficulty = next_difficulty as u64;

    Ok(next_difficulty.max(1))
}

/// Linearly weighted retarget with a symmetric clamp and a jump rule.
///
/// `target_seconds` is accepted for signature compatibility but the
/// compiled-in `DIFFICULTY_TARGET_V2` is what the deployed rule uses.
pub fn next_difficulty_v3(
    timestamps: &[u64],
    cumulative_difficulties: &[u64],
    _target_seconds: u64,
) -> Result<u64, DifficultyError> {
    check_window(timestamps, cumulative_difficulties)?;
    let t = DIFFICULTY_TARGET_V2;
    let mut n = DIFFICULTY_WINDOW_V2 as usize;

    if timestamps.len() <= 10 {
        return Ok(BOOTSTRAP_DIFFICULTY_GUESS);
    }
    let (timestamps, cumulative_difficulties) = recent(timestamps, cumulative_difficulties, n + 1);
    if timestamps.len() < n + 1 {
        n = timestamps.len() - 1;
    }

    let mut weighted_solve_time = 0u64;
    let mut sum_last_3 = 0u64;
    let mut previous_timestamp = timestamps[0];
    for i in 1..=n {
        // Non-increasing timestamps count as a one second solve.
        let this_timestamp = if timestamps[i] > previous_timestamp {
            timestamps[i]
        } else {
            previous_timestamp.wrapping_add(1)
        };
        let solve_time = (6 * t).min(this_timestamp.wrapping_sub(previous_timestamp));
        previous_timestamp = this_timestamp;
        weighted_solve_time = weighted_solve_time.wrapping_add(solve_time.wrapping_mul(i as u64));
        if i > n - 3 {
            sum_last_3 = sum_last_3.wrapping_add(solve_time);
        }
    }

    let n64 = n as u64;
    let total_difficulty = cumulative_difficulties[n].wrapping_sub(cumulative_difficulties[0]);
    let mut next_difficulty = total_difficulty
        .wrapping_mul(t)
        .wrapping_mul(n64 + 1)
        .wrapping_mul(99)
        / (100 * 2 * weighted_solve_time);

    let prev_difficulty = cumulative_difficulties[n].wrapping_sub(cumulative_difficulties[n - 1]);
    next_difficulty = (prev_difficulty.wrapping_mul(67) / 100)
        .max(next_difficulty.min(prev_difficulty.wrapping_mul(150) / 100));

    if sum_last_3 < (8 * t) / 10 {
        next_difficulty = next_difficulty.max(prev_difficulty.wrapping_mul(108) / 100);
    }

    Ok(next_difficulty.max(1))
}

/// LWMA-4: tempered solve times, a 10% jump rule and a rounded result whose
/// last three digits carry the recent average solve time.
pub fn next_difficulty_v4(
    timestamps: &[u64],
    cumulative_difficulties: &[u64],
) -> Result<u64, DifficultyError> {
    check_window(timestamps, cumulative_difficulties)?;
    let t = DIFFICULTY_TARGET_V2;
    let mut n = DIFFICULTY_WINDOW_V2 as usize;

    if timestamps.len() <= 12 {
        return Ok(BOOTSTRAP_DIFFICULTY_GUESS);
    }
    let (timestamps, cumulative_difficulties) = recent(timestamps, cumulative_difficulties, n + 1);
    if timestamps.len() < n + 1 {
        n = timestamps.len() - 1;
    }

    // Out-of-sequence timestamps become zero solve times.
    let mut ts = Vec::with_capacity(n + 1);
    ts.push(timestamps[0]);
    for i in 1..=n {
        let previous = ts[i - 1];
        ts.push(if timestamps[i] > previous { timestamps[i] } else { previous });
    }

    let mut weighted_solve_time = 0u64;
    for i in 1..=n {
        let gap = ts[i] - ts[i - 1];
        let solve_time = if i > 4 && gap > 5 * t && ts[i - 1] - ts[i - 4] < (14 * t) / 10 {
            2 * t
        } else if i > 7 && gap > 5 * t && ts[i - 1] - ts[i - 7] < 4 * t {
            2 * t
        } else {
            (5 * t).min(gap)
        };
        weighted_solve_time = weighted_solve_time.wrapping_add(solve_time.wrapping_mul(i as u64));
    }

    let n64 = n as u64;
    let floor = n64 * n64 * t / 20;
    if weighted_solve_time < floor {
        weighted_solve_time = floor;
    }

    let avg_difficulty = cumulative_difficulties[n].wrapping_sub(cumulative_difficulties[0]) / n64;
    let scale = n64 * (n64 + 1) * t * 97;

    let mut next_difficulty = if avg_difficulty > 2_000_000 * n64 * n64 * t {
        (avg_difficulty / (200 * weighted_solve_time)).wrapping_mul(scale)
    } else {
        avg_difficulty.wrapping_mul(scale) / (200 * weighted_solve_time)
    };

    let prev_difficulty = cumulative_difficulties[n].wrapping_sub(cumulative_difficulties[n - 1]);

    if ts[n] - ts[n - 1] < (2 * t) / 10
        || ts[n] - ts[n - 2] < (5 * t) / 10
        || ts[n] - ts[n - 3] < (8 * t) / 10
    {
        let jump_floor = (prev_difficulty.wrapping_mul(110) / 100)
            .min(avg_difficulty.wrapping_mul(105) / 100);
        next_difficulty = next_difficulty.max(jump_floor);
    }

    // Zero the insignificant digits.
    let mut unit = 1_000_000_000u64;
    while unit > 1 {
        if next_difficulty > unit * 100 {
            next_difficulty = (next_difficulty.wrapping_add(unit / 2) / unit) * unit;
            break;
        }
        unit /= 10;
    }

    // Last three digits hold the average of the past 10 solve times.
    if next_difficulty > 100_000 {
        next_difficulty = (next_difficulty.wrapping_add(500) / 1000) * 1000
            + 999.min((ts[n] - ts[n - 10]) / 10);
    }

    Ok(next_difficulty.max(1))
}
