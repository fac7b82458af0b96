//! Experience and level curve
//!
//! Level 1 starts at 0 XP. Reaching level `n + 1` costs `PER_LEVEL_XP[n - 1]` on top of
//! the cost of level `n`. Past the end of the table each level costs 50% more than the
//! last tabled step, compounding.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// XP needed to go from level `i + 1` to level `i + 2`
pub const PER_LEVEL_XP: [u64; 20] = [
    150, 300, 450, 650, 900, 1_200, 1_600, 2_000, 2_500, 3_000, 4_000, 5_500, 7_000, 9_000,
    12_000, 15_000, 20_000, 30_000, 45_000, 75_000,
];

/// Growth factor applied per level beyond the table
pub const EXTRAPOLATION_FACTOR: f64 = 1.5;

/// Inclusive range of XP granted per locked piece
pub const XP_GAIN_MIN: u32 = 1;
pub const XP_GAIN_MAX: u32 = 5;

/// XP cost of leaving `level` for `level + 1`
pub fn level_step_xp(level: u32) -> u64 {
    let last_tabled = PER_LEVEL_XP.len() as u32;
    if level == 0 {
        return 0;
    }
    if level <= last_tabled {
        return PER_LEVEL_XP[(level - 1) as usize];
    }
    let last = PER_LEVEL_XP[PER_LEVEL_XP.len() - 1] as f64;
    let extra = (level - last_tabled) as i32;
    // `as` saturates, so absurd levels clamp to u64::MAX instead of wrapping
    (last * EXTRAPOLATION_FACTOR.powi(extra)).floor() as u64
}

/// Cumulative XP needed to reach `level` (level 1 requires 0)
pub fn xp_required_for_level(level: u32) -> u64 {
    (1..level).fold(0u64, |total, l| total.saturating_add(level_step_xp(l)))
}

/// Highest level whose threshold is at or below `total_xp`
pub fn level_from_xp(total_xp: u64) -> u32 {
    let mut level = 1;
    let mut threshold = 0u64;
    loop {
        let next = threshold.saturating_add(level_step_xp(level));
        if next > total_xp || next == threshold {
            return level;
        }
        threshold = next;
        level += 1;
    }
}

/// Random XP reward for one locked piece, uniform in `[XP_GAIN_MIN, XP_GAIN_MAX]`
pub fn xp_gain<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(XP_GAIN_MIN..=XP_GAIN_MAX)
}

/// Position of a player inside their current level, for progress bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    /// XP earned since reaching `level`
    pub current: u64,
    /// XP span of `level`
    pub required: u64,
    /// `current / required` as a whole percentage (floored)
    pub percentage: u32,
}

/// Break `total_xp` down into level and progress toward the next one
pub fn progress(total_xp: u64) -> LevelProgress {
    let level = level_from_xp(total_xp);
    let floor = xp_required_for_level(level);
    let required = level_step_xp(level);
    let current = total_xp - floor;
    let percentage = if required == 0 {
        100
    } else {
        ((u128::from(current) * 100) / u128::from(required)) as u32
    };
    LevelProgress {
        level,
        current,
        required,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_thresholds_from_table() {
        assert_eq!(xp_required_for_level(0), 0);
        assert_eq!(xp_required_for_level(1), 0);
        assert_eq!(xp_required_for_level(2), 150);
        assert_eq!(xp_required_for_level(3), 450);
        assert_eq!(xp_required_for_level(4), 900);
        assert_eq!(xp_required_for_level(21), PER_LEVEL_XP.iter().sum::<u64>());
    }

    #[test]
    fn test_thresholds_extrapolated() {
        let table_total: u64 = PER_LEVEL_XP.iter().sum();
        // Level 21 -> 22 costs 75000 * 1.5
        assert_eq!(xp_required_for_level(22), table_total + 112_500);
        // Level 22 -> 23 costs 75000 * 1.5^2
        assert_eq!(xp_required_for_level(23), table_total + 112_500 + 168_750);
    }

    #[test]
    fn test_level_from_xp_boundaries() {
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(149), 1);
        assert_eq!(level_from_xp(150), 2);
        assert_eq!(level_from_xp(449), 2);
        assert_eq!(level_from_xp(450), 3);
    }

    #[test]
    fn test_level_from_xp_saturates() {
        // Must terminate and give a sane level for the largest possible total
        let level = level_from_xp(u64::MAX);
        assert!(level > 21);
        assert_eq!(level_from_xp(xp_required_for_level(level)), level);
    }

    #[test]
    fn test_progress() {
        let p = progress(225);
        assert_eq!(p.level, 2);
        assert_eq!(p.current, 75);
        assert_eq!(p.required, 300);
        assert_eq!(p.percentage, 25);

        let p = progress(0);
        assert_eq!(p.level, 1);
        assert_eq!(p.current, 0);
        assert_eq!(p.required, 150);
        assert_eq!(p.percentage, 0);
    }

    #[test]
    fn test_xp_gain_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [false; 6];
        for _ in 0..500 {
            let gain = xp_gain(&mut rng);
            assert!((XP_GAIN_MIN..=XP_GAIN_MAX).contains(&gain));
            seen[gain as usize] = true;
        }
        assert!(seen[1..].iter().all(|s| *s), "every value in 1..=5 should appear");
    }
}
