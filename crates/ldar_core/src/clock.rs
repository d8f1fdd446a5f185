//! Simulation calendar: tracks the current simulated date and timestep index.
//!
//! The engine advances in whole-day steps. Date arithmetic uses the civil
//! calendar conversion of Howard Hinnant's `days_from_civil` algorithm so the
//! clock needs no external time crate.

use bevy_ecs::prelude::Resource;

/// A civil calendar date (proleptic Gregorian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl SimDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        debug_assert!((1..=12).contains(&month), "month must be in 1..=12");
        debug_assert!((1..=31).contains(&day), "day must be in 1..=31");
        Self { year, month, day }
    }

    /// Days since 1970-01-01 (negative before the epoch).
    pub fn days_from_epoch(&self) -> i64 {
        let y = if self.month <= 2 {
            self.year - 1
        } else {
            self.year
        } as i64;
        let era = if y >= 0 { y } else { y - 399 } / 400;
        let yoe = y - era * 400;
        let m = self.month as i64;
        let d = self.day as i64;
        let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + d - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }

    /// Inverse of [days_from_epoch].
    pub fn from_days_from_epoch(days: i64) -> Self {
        let z = days + 719_468;
        let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
        let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
        Self {
            year: (if m <= 2 { y + 1 } else { y }) as i32,
            month: m,
            day: d,
        }
    }

    /// Day of year, 1-based (Jan 1 = 1).
    pub fn day_of_year(&self) -> u32 {
        let jan1 = SimDate::new(self.year, 1, 1);
        (self.days_from_epoch() - jan1.days_from_epoch()) as u32 + 1
    }

    pub fn plus_days(&self, days: u32) -> Self {
        Self::from_days_from_epoch(self.days_from_epoch() + days as i64)
    }
}

/// Tracks the current simulated day. Owned by the runner; every system reads
/// the timestep index and date from here.
#[derive(Debug, Clone, Resource)]
pub struct SimulationClock {
    start: SimDate,
    day_index: u32,
    total_days: u32,
}

impl SimulationClock {
    pub fn new(start: SimDate, total_days: u32) -> Self {
        Self {
            start,
            day_index: 0,
            total_days,
        }
    }

    /// Current timestep index (0-based; day 0 is the first simulated day).
    pub fn day_index(&self) -> u32 {
        self.day_index
    }

    /// Current simulated date.
    pub fn date(&self) -> SimDate {
        self.start.plus_days(self.day_index)
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    pub fn is_finished(&self) -> bool {
        self.day_index >= self.total_days
    }

    /// True on January 1st (annual survey counters reset on this boundary).
    pub fn is_year_start(&self) -> bool {
        let date = self.date();
        date.month == 1 && date.day == 1
    }

    /// Advance one simulated day. Returns the new timestep index.
    pub fn advance_day(&mut self) -> u32 {
        debug_assert!(
            self.day_index < self.total_days,
            "advanced past end of simulation"
        );
        self.day_index += 1;
        self.day_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_date_round_trips() {
        for &(y, m, d) in &[
            (1970, 1, 1),
            (2000, 2, 29),
            (2017, 1, 1),
            (2020, 12, 31),
            (2024, 2, 29),
        ] {
            let date = SimDate::new(y, m, d);
            assert_eq!(SimDate::from_days_from_epoch(date.days_from_epoch()), date);
        }
    }

    #[test]
    fn epoch_day_is_zero() {
        assert_eq!(SimDate::new(1970, 1, 1).days_from_epoch(), 0);
        assert_eq!(SimDate::new(1970, 1, 2).days_from_epoch(), 1);
    }

    #[test]
    fn clock_advances_and_crosses_year_boundary() {
        let mut clock = SimulationClock::new(SimDate::new(2017, 12, 30), 10);
        assert_eq!(clock.day_index(), 0);
        assert_eq!(clock.date(), SimDate::new(2017, 12, 30));
        assert!(!clock.is_year_start());

        clock.advance_day();
        clock.advance_day();
        assert_eq!(clock.date(), SimDate::new(2018, 1, 1));
        assert!(clock.is_year_start());
    }

    #[test]
    fn day_of_year_counts_from_one() {
        assert_eq!(SimDate::new(2019, 1, 1).day_of_year(), 1);
        assert_eq!(SimDate::new(2019, 12, 31).day_of_year(), 365);
        assert_eq!(SimDate::new(2020, 12, 31).day_of_year(), 366);
    }
}
