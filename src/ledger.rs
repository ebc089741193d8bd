//! Running totals for one day plus a bounded history of daily totals. A
//! mutation for a different day reloads the running totals from that day's
//! record (or zero) before applying.

use crate::config::EvictionPolicy;
use crate::models::{DailyTotals, EntryBatch, MacroTotals};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

pub const HISTORY_DAYS: usize = 7;

#[derive(Debug, Clone)]
pub struct Ledger {
    today: NaiveDate,
    running: MacroTotals,
    history: BTreeMap<NaiveDate, MacroTotals>,
    eviction: EvictionPolicy,
}

impl Ledger {
    pub fn new(today: NaiveDate, eviction: EvictionPolicy) -> Self {
        Self {
            today,
            running: MacroTotals::default(),
            history: BTreeMap::new(),
            eviction,
        }
    }

    pub fn add_entry(&mut self, today: NaiveDate, delta: MacroTotals) -> DailyTotals {
        self.roll_to(today);
        self.running += delta.sanitized();
        self.sync_today();
        self.evict_stale();
        self.current()
    }

    /// Consumed calories never drop below zero.
    pub fn apply_exercise_burn(&mut self, today: NaiveDate, calories: f64) -> DailyTotals {
        self.roll_to(today);
        let burned = MacroTotals::new(calories, 0.0, 0.0, 0.0).sanitized().calories;
        self.running.calories = (self.running.calories - burned).max(0.0);
        self.sync_today();
        self.evict_stale();
        self.current()
    }

    pub fn apply_batch(&mut self, today: NaiveDate, batch: &EntryBatch) -> DailyTotals {
        match batch {
            EntryBatch::Food(items) => {
                for item in items {
                    self.add_entry(today, item.delta());
                }
            }
            EntryBatch::Exercise(items) => {
                for item in items {
                    self.apply_exercise_burn(today, item.calories);
                }
            }
        }
        self.roll_to(today);
        self.current()
    }

    pub fn seed_today(&mut self, today: NaiveDate) -> DailyTotals {
        self.roll_to(today);
        self.sync_today();
        self.evict_stale();
        self.current()
    }

    pub fn set_eviction_policy(&mut self, policy: EvictionPolicy) {
        self.eviction = policy;
        self.evict_stale();
    }

    pub fn evict_stale(&mut self) {
        if self.eviction == EvictionPolicy::CalendarWindow {
            let cutoff = self.today - Duration::days(HISTORY_DAYS as i64 - 1);
            self.history.retain(|date, _| *date >= cutoff);
        }

        while self.history.len() > HISTORY_DAYS {
            let Some((oldest, _)) = self.history.pop_first() else {
                break;
            };
            debug!(%oldest, "evicted stale day");
        }
    }

    pub fn weekly_window(&self, today: NaiveDate) -> Vec<DailyTotals> {
        let mut window = Vec::with_capacity(HISTORY_DAYS);
        for offset in (0..HISTORY_DAYS as i64).rev() {
            let date = today - Duration::days(offset);
            let totals = self.history.get(&date).copied().unwrap_or_default();
            window.push(DailyTotals::new(date, totals));
        }
        window
    }

    /// Read-only; does not roll the ledger.
    pub fn totals_on(&self, date: NaiveDate) -> DailyTotals {
        if date == self.today {
            return self.current();
        }
        let totals = self.history.get(&date).copied().unwrap_or_default();
        DailyTotals::new(date, totals)
    }

    pub fn current_day(&self) -> NaiveDate {
        self.today
    }

    pub fn running_totals(&self) -> MacroTotals {
        self.running
    }

    pub fn history(&self) -> Vec<DailyTotals> {
        self.history
            .iter()
            .map(|(date, totals)| DailyTotals::new(*date, *totals))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn current(&self) -> DailyTotals {
        DailyTotals::new(self.today, self.running)
    }

    fn roll_to(&mut self, today: NaiveDate) {
        if today == self.today {
            return;
        }
        debug!(from = %self.today, to = %today, "rolling running totals to new day");
        self.today = today;
        self.running = self.history.get(&today).copied().unwrap_or_default();
    }

    fn sync_today(&mut self) {
        self.history.insert(self.today, self.running);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseEntry, FoodEntry};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn meal(calories: f64, protein: f64, fat: f64, carbs: f64) -> MacroTotals {
        MacroTotals::new(calories, protein, fat, carbs)
    }

    fn assert_today_synced(ledger: &Ledger) {
        let record = ledger
            .history()
            .into_iter()
            .find(|d| d.date == ledger.current_day())
            .expect("missing today's record");
        assert_eq!(record.totals, ledger.running_totals());
    }

    #[test]
    fn add_entry_updates_running_totals_and_record() {
        let mut ledger = Ledger::new(day(5), EvictionPolicy::RecordCount);
        let today = ledger.add_entry(day(5), meal(500.0, 30.0, 10.0, 40.0));

        assert_eq!(today.totals, meal(500.0, 30.0, 10.0, 40.0));
        assert_eq!(ledger.running_totals().calories, 500.0);
        assert_eq!(ledger.len(), 1);
        assert_today_synced(&ledger);
    }

    #[test]
    fn repeated_entries_never_duplicate_the_day() {
        let mut ledger = Ledger::new(day(5), EvictionPolicy::RecordCount);
        for _ in 0..5 {
            ledger.add_entry(day(5), meal(100.0, 5.0, 2.0, 10.0));
            assert_today_synced(&ledger);
        }
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.running_totals(), meal(500.0, 25.0, 10.0, 50.0));
    }

    #[test]
    fn eight_days_keep_seven_records_and_drop_the_earliest() {
        let mut ledger = Ledger::new(day(1), EvictionPolicy::RecordCount);
        for d in 1..=8 {
            ledger.add_entry(day(d), meal(100.0 * d as f64, 0.0, 0.0, 0.0));
            assert!(ledger.len() <= HISTORY_DAYS);
            assert_today_synced(&ledger);
        }

        let history = ledger.history();
        assert_eq!(history.len(), 7);
        assert_eq!(history.first().unwrap().date, day(2));
        assert_eq!(history.last().unwrap().date, day(8));
        assert_eq!(ledger.running_totals().calories, 800.0);
    }

    #[test]
    fn backdated_day_is_evicted_first_when_full() {
        let mut ledger = Ledger::new(day(2), EvictionPolicy::RecordCount);
        for d in 2..=8 {
            ledger.add_entry(day(d), meal(100.0, 0.0, 0.0, 0.0));
        }
        ledger.add_entry(day(1), meal(300.0, 0.0, 0.0, 0.0));

        let dates: Vec<_> = ledger.history().into_iter().map(|d| d.date).collect();
        assert_eq!(dates, (2..=8).map(day).collect::<Vec<_>>());

        ledger.add_entry(day(9), meal(50.0, 0.0, 0.0, 0.0));
        let history = ledger.history();
        assert_eq!(history.first().unwrap().date, day(3));
        assert_eq!(history.last().unwrap().totals.calories, 50.0);
        assert_today_synced(&ledger);
    }

    #[test]
    fn new_day_starts_from_zero() {
        let mut ledger = Ledger::new(day(5), EvictionPolicy::RecordCount);
        ledger.add_entry(day(5), meal(900.0, 50.0, 20.0, 80.0));
        let next = ledger.add_entry(day(6), meal(200.0, 10.0, 5.0, 20.0));

        assert_eq!(next.totals, meal(200.0, 10.0, 5.0, 20.0));
        assert_eq!(ledger.totals_on(day(5)).totals.calories, 900.0);
    }

    #[test]
    fn exercise_burn_reduces_calories_only() {
        let mut ledger = Ledger::new(day(5), EvictionPolicy::RecordCount);
        ledger.add_entry(day(5), meal(500.0, 30.0, 10.0, 40.0));
        let today = ledger.apply_exercise_burn(day(5), 300.0);

        assert_eq!(today.totals, meal(200.0, 30.0, 10.0, 40.0));
        assert_today_synced(&ledger);

        let floored = ledger.apply_exercise_burn(day(5), 1000.0);
        assert_eq!(floored.totals.calories, 0.0);
        assert_eq!(floored.totals.protein, 30.0);
    }

    #[test]
    fn garbage_input_is_treated_as_zero() {
        let mut ledger = Ledger::new(day(5), EvictionPolicy::RecordCount);
        ledger.add_entry(day(5), meal(f64::NAN, -10.0, f64::INFINITY, 12.0));
        ledger.apply_exercise_burn(day(5), f64::NAN);
        assert_eq!(ledger.running_totals(), meal(0.0, 0.0, 0.0, 12.0));
    }

    #[test]
    fn weekly_window_always_has_seven_days() {
        let ledger = Ledger::new(day(10), EvictionPolicy::RecordCount);
        let window = ledger.weekly_window(day(10));
        assert_eq!(window.len(), 7);
        assert_eq!(window.first().unwrap().date, day(4));
        assert_eq!(window.last().unwrap().date, day(10));
        assert!(window.iter().all(|d| d.totals == MacroTotals::default()));
    }

    #[test]
    fn weekly_window_ignores_records_outside_calendar_range() {
        let mut ledger = Ledger::new(day(1), EvictionPolicy::RecordCount);
        ledger.add_entry(day(1), meal(700.0, 0.0, 0.0, 0.0));
        ledger.add_entry(day(9), meal(400.0, 0.0, 0.0, 0.0));

        let window = ledger.weekly_window(day(9));
        assert_eq!(ledger.len(), 2);
        assert_eq!(window.iter().map(|d| d.totals.calories).sum::<f64>(), 400.0);
    }

    #[test]
    fn calendar_policy_drops_days_outside_the_window() {
        let mut ledger = Ledger::new(day(1), EvictionPolicy::CalendarWindow);
        ledger.add_entry(day(1), meal(700.0, 0.0, 0.0, 0.0));
        ledger.add_entry(day(3), meal(300.0, 0.0, 0.0, 0.0));
        ledger.add_entry(day(9), meal(400.0, 0.0, 0.0, 0.0));

        let dates: Vec<_> = ledger.history().into_iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(3), day(9)]);
    }

    #[test]
    fn switching_to_calendar_policy_evicts_immediately() {
        let mut ledger = Ledger::new(day(1), EvictionPolicy::RecordCount);
        ledger.add_entry(day(1), meal(700.0, 0.0, 0.0, 0.0));
        ledger.add_entry(day(20), meal(100.0, 0.0, 0.0, 0.0));
        ledger.set_eviction_policy(EvictionPolicy::CalendarWindow);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn seed_today_creates_zero_record_once() {
        let mut ledger = Ledger::new(day(5), EvictionPolicy::RecordCount);
        ledger.seed_today(day(5));
        ledger.add_entry(day(5), meal(250.0, 0.0, 0.0, 0.0));
        ledger.seed_today(day(5));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.running_totals().calories, 250.0);
    }

    #[test]
    fn batch_applies_every_item() {
        let mut ledger = Ledger::new(day(5), EvictionPolicy::RecordCount);
        let food = EntryBatch::Food(vec![
            FoodEntry {
                food: "eggs".to_string(),
                calories: 150.0,
                protein: 12.0,
                fat: 10.0,
                carb: 1.0,
            },
            FoodEntry {
                food: "toast".to_string(),
                calories: 200.0,
                protein: 6.0,
                fat: 3.0,
                carb: 35.0,
            },
        ]);
        ledger.apply_batch(day(5), &food);

        let exercise = EntryBatch::Exercise(vec![ExerciseEntry {
            name: "walk".to_string(),
            calories: 100.0,
        }]);
        let today = ledger.apply_batch(day(5), &exercise);

        assert_eq!(today.totals, meal(250.0, 18.0, 13.0, 36.0));
        assert_today_synced(&ledger);
    }
}
