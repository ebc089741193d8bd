use crate::config::{AveragePolicy, Settings};
use crate::ledger::HISTORY_DAYS;
use crate::models::{AppData, DailyTotals, MacroTotals};
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub value: f64,
    pub goal: f64,
    /// Unclamped; `fill` is the ring value.
    pub ratio: f64,
    pub fill: f64,
    pub over: f64,
}

impl Progress {
    pub fn new(value: f64, goal: f64) -> Self {
        let ratio = ratio(value, goal);
        Self {
            value,
            goal,
            ratio,
            fill: ratio.clamp(0.0, 1.0),
            over: (ratio - 1.0).max(0.0),
        }
    }
}

pub fn ratio(value: f64, goal: f64) -> f64 {
    if !(goal > 0.0) || !value.is_finite() {
        return 0.0;
    }
    let ratio = value / goal;
    if ratio.is_finite() { ratio } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BalanceLabel {
    Deficit,
    Surplus,
    Even,
}

/// Energy expenditure minus calories consumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetBalance {
    pub label: BalanceLabel,
    pub diff: f64,
}

impl NetBalance {
    pub fn new(tdee: f64, calories: f64) -> Self {
        let diff = tdee - calories;
        let label = if diff > 0.0 {
            BalanceLabel::Deficit
        } else if diff < 0.0 {
            BalanceLabel::Surplus
        } else {
            BalanceLabel::Even
        };
        Self { label, diff }
    }

    /// e.g. `Deficit: +350` or `Surplus: -120`.
    pub fn display(&self) -> String {
        let sign = if self.diff > 0.0 { "+" } else { "" };
        format!("{:?}: {sign}{}", self.label, self.diff.round())
    }
}

pub fn compute_averages(window: &[DailyTotals], policy: AveragePolicy) -> MacroTotals {
    let mut sum = MacroTotals::default();
    let mut logged = 0usize;
    for day in window {
        if policy == AveragePolicy::Sparse && day.totals.calories <= 0.0 {
            continue;
        }
        sum += day.totals;
        logged += 1;
    }

    let denom = match policy {
        AveragePolicy::Sparse => logged,
        AveragePolicy::Dense => HISTORY_DAYS,
    };
    if denom == 0 {
        return MacroTotals::default();
    }
    sum.scaled(1.0 / denom as f64)
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub date: String,
    pub label: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub deficit: f64,
    pub bar_height: f64,
}

#[derive(Debug, Serialize)]
pub struct WeeklySummary {
    pub days: Vec<WeeklyPoint>,
    pub average_policy: AveragePolicy,
    /// Averages rounded to whole units.
    pub averages: MacroTotals,
    pub average_balance: NetBalance,
    pub scale_max: f64,
    pub average_bar: f64,
    pub goal_marker: f64,
    pub tdee_marker: f64,
    pub protein: Progress,
    pub fat: Progress,
    pub carbs: Progress,
}

#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub date: String,
    pub settings_revision: u64,
    pub today: DailyTotals,
    pub balance: NetBalance,
    pub calories: Progress,
    pub protein: Progress,
    pub fat: Progress,
    pub carbs: Progress,
    pub bmr_marker: f64,
    pub week: WeeklySummary,
}

pub fn build_snapshot(data: &AppData) -> Snapshot {
    build_snapshot_at(Local::now().date_naive(), data)
}

pub fn build_snapshot_at(today: NaiveDate, data: &AppData) -> Snapshot {
    let settings = &data.settings;
    let current = data.ledger.totals_on(today);
    let totals = current.totals;
    let window = data.ledger.weekly_window(today);

    Snapshot {
        date: today.to_string(),
        settings_revision: settings.revision,
        today: current,
        balance: NetBalance::new(settings.tdee, totals.calories),
        calories: Progress::new(totals.calories, settings.daily_calorie_goal),
        protein: Progress::new(totals.protein, settings.protein_goal),
        fat: Progress::new(totals.fat, settings.fat_goal),
        carbs: Progress::new(totals.carbs, settings.carb_goal),
        bmr_marker: ratio(settings.bmr, settings.daily_calorie_goal),
        week: build_weekly(&window, settings),
    }
}

fn build_weekly(window: &[DailyTotals], settings: &Settings) -> WeeklySummary {
    let scale_max = window
        .iter()
        .map(|day| day.totals.calories)
        .fold(1.0f64, f64::max)
        .max(settings.daily_calorie_goal)
        .max(settings.tdee);

    let days = window
        .iter()
        .map(|day| WeeklyPoint {
            date: day.date.to_string(),
            label: short_label(day.date),
            calories: day.totals.calories,
            protein: day.totals.protein,
            fat: day.totals.fat,
            carbs: day.totals.carbs,
            deficit: settings.tdee - day.totals.calories,
            bar_height: ratio(day.totals.calories, scale_max),
        })
        .collect();

    let averages = compute_averages(window, settings.average_policy).rounded();

    WeeklySummary {
        days,
        average_policy: settings.average_policy,
        averages,
        average_balance: NetBalance::new(settings.tdee, averages.calories),
        scale_max,
        average_bar: ratio(averages.calories, scale_max).min(1.0),
        goal_marker: ratio(settings.daily_calorie_goal, scale_max),
        tdee_marker: ratio(settings.tdee, scale_max),
        protein: Progress::new(averages.protein, settings.protein_goal),
        fat: Progress::new(averages.fat, settings.fat_goal),
        carbs: Progress::new(averages.carbs, settings.carb_goal),
    }
}

fn short_label(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn data_with(settings: Settings) -> AppData {
        AppData::new(today(), settings)
    }

    #[test]
    fn progress_guards_non_positive_goals() {
        for goal in [0.0, -100.0, f64::NAN] {
            let p = Progress::new(500.0, goal);
            assert_eq!(p.ratio, 0.0);
            assert_eq!(p.fill, 0.0);
            assert_eq!(p.over, 0.0);
        }
    }

    #[test]
    fn progress_exposes_over_goal() {
        let p = Progress::new(3000.0, 2000.0);
        assert_eq!(p.ratio, 1.5);
        assert_eq!(p.fill, 1.0);
        assert_eq!(p.over, 0.5);
    }

    #[test]
    fn sparse_average_of_empty_window_is_zero() {
        let window: Vec<_> = (0..7)
            .map(|offset| DailyTotals::empty(today() - Duration::days(offset)))
            .collect();
        let avg = compute_averages(&window, AveragePolicy::Sparse);
        assert_eq!(avg, MacroTotals::default());
        assert!(!avg.calories.is_nan());
    }

    #[test]
    fn sparse_and_dense_averages_differ() {
        let mut window: Vec<_> = (0..7)
            .rev()
            .map(|offset| DailyTotals::empty(today() - Duration::days(offset)))
            .collect();
        window[5].totals = MacroTotals::new(1400.0, 70.0, 0.0, 0.0);
        window[6].totals = MacroTotals::new(2100.0, 140.0, 0.0, 0.0);

        let sparse = compute_averages(&window, AveragePolicy::Sparse);
        let dense = compute_averages(&window, AveragePolicy::Dense);
        assert_eq!(sparse.calories, 1750.0);
        assert_eq!(sparse.protein, 105.0);
        assert_eq!(dense.calories, 500.0);
        assert_eq!(dense.protein, 30.0);
    }

    #[test]
    fn snapshot_reflects_first_entry() {
        let mut data = data_with(Settings {
            daily_calorie_goal: 2000.0,
            ..Settings::default()
        });
        data.ledger
            .add_entry(today(), MacroTotals::new(500.0, 30.0, 10.0, 40.0));

        let snapshot = build_snapshot_at(today(), &data);
        assert_eq!(snapshot.today.totals.calories, 500.0);
        assert_eq!(snapshot.calories.ratio, 0.25);
        assert_eq!(snapshot.protein.ratio, 0.2);
        assert_eq!(snapshot.week.days.len(), 7);
        assert_eq!(snapshot.week.days.last().unwrap().label, "1/5");
        assert_eq!(snapshot.week.averages.calories, 500.0);
        assert_eq!(snapshot.balance.label, BalanceLabel::Deficit);
        assert_eq!(snapshot.balance.diff, 1350.0);
    }

    #[test]
    fn snapshot_scale_includes_goal_and_tdee() {
        let mut data = data_with(Settings::default());
        data.ledger
            .add_entry(today(), MacroTotals::new(4600.0, 0.0, 0.0, 0.0));

        let snapshot = build_snapshot_at(today(), &data);
        assert_eq!(snapshot.week.scale_max, 4600.0);
        assert_eq!(snapshot.week.goal_marker, 0.5);
        assert_eq!(snapshot.week.days.last().unwrap().bar_height, 1.0);
        assert_eq!(snapshot.balance.label, BalanceLabel::Surplus);
    }

    #[test]
    fn snapshot_with_zero_goals_has_no_nan() {
        let data = data_with(Settings {
            daily_calorie_goal: 0.0,
            tdee: 0.0,
            protein_goal: 0.0,
            fat_goal: 0.0,
            carb_goal: 0.0,
            ..Settings::default()
        });
        let snapshot = build_snapshot_at(today(), &data);
        assert_eq!(snapshot.week.scale_max, 1.0);
        assert_eq!(snapshot.calories.ratio, 0.0);
        assert_eq!(snapshot.bmr_marker, 0.0);
        assert_eq!(snapshot.balance.label, BalanceLabel::Even);
        let encoded = serde_json::to_string(&snapshot).unwrap();
        assert!(!encoded.contains("null"));
    }

    #[test]
    fn balance_display_signs() {
        assert_eq!(NetBalance::new(1850.0, 1500.0).display(), "Deficit: +350");
        assert_eq!(NetBalance::new(1850.0, 2000.0).display(), "Surplus: -150");
        assert_eq!(NetBalance::new(1850.0, 1850.0).display(), "Even: 0");
    }
}
