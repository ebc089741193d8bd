use crate::config::Settings;
use crate::ledger::Ledger;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::ops::AddAssign;

/// Calorie and macro amounts, either a delta or an accumulated total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MacroTotals {
    /// kcal
    pub calories: f64,
    /// grams
    pub protein: f64,
    /// grams
    pub fat: f64,
    /// grams
    pub carbs: f64,
}

impl MacroTotals {
    pub fn new(calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            calories,
            protein,
            fat,
            carbs,
        }
    }

    /// Clamps every field to a finite, non-negative amount.
    pub fn sanitized(self) -> Self {
        Self {
            calories: non_negative(self.calories),
            protein: non_negative(self.protein),
            fat: non_negative(self.fat),
            carbs: non_negative(self.carbs),
        }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            carbs: self.carbs * factor,
        }
    }

    pub fn rounded(self) -> Self {
        Self {
            calories: self.calories.round(),
            protein: self.protein.round(),
            fat: self.fat.round(),
            carbs: self.carbs.round(),
        }
    }
}

impl AddAssign for MacroTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.fat += rhs.fat;
        self.carbs += rhs.carbs;
    }
}

/// One calendar day of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: MacroTotals,
}

impl DailyTotals {
    pub fn new(date: NaiveDate, totals: MacroTotals) -> Self {
        Self { date, totals }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, MacroTotals::default())
    }
}

/// A food item as confirmed by the user or returned by the chat service.
///
/// Carbohydrates are accepted as either `carb` or `carbs`; `carb` wins when
/// it is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFoodEntry")]
pub struct FoodEntry {
    pub food: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carb: f64,
}

impl FoodEntry {
    pub fn delta(&self) -> MacroTotals {
        MacroTotals::new(self.calories, self.protein, self.fat, self.carb)
    }
}

#[derive(Deserialize)]
struct RawFoodEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    food: String,
    #[serde(default, deserialize_with = "lenient_number")]
    calories: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    protein: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    fat: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    carb: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    carbs: f64,
}

impl From<RawFoodEntry> for FoodEntry {
    fn from(raw: RawFoodEntry) -> Self {
        let carb = if raw.carb != 0.0 { raw.carb } else { raw.carbs };
        Self {
            food: raw.food,
            calories: raw.calories,
            protein: raw.protein,
            fat: raw.fat,
            carb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: f64,
}

/// A list of entries of a single kind, as produced by the chat boundary.
///
/// Serialized as `{"type": "food" | "exercise", "items": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum EntryBatch {
    Food(Vec<FoodEntry>),
    Exercise(Vec<ExerciseEntry>),
}

impl EntryBatch {
    pub fn len(&self) -> usize {
        match self {
            EntryBatch::Food(items) => items.len(),
            EntryBatch::Exercise(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EntryBatch::Food(_) => "food",
            EntryBatch::Exercise(_) => "exercise",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodEntriesRequest {
    pub items: Vec<FoodEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseRequest {
    pub items: Vec<ExerciseEntry>,
}

/// Everything the server owns: the ledger and the settings it is read against.
#[derive(Debug, Clone)]
pub struct AppData {
    pub ledger: Ledger,
    pub settings: Settings,
}

impl AppData {
    pub fn new(today: NaiveDate, settings: Settings) -> Self {
        Self {
            ledger: Ledger::new(today, settings.eviction_policy),
            settings,
        }
    }
}

/// Numeric coercion used at every input boundary: numbers pass through,
/// numeric strings are parsed, `true` is 1, anything else is 0.
pub fn coerce_number(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if number.is_finite() { number } else { 0.0 }
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

pub(crate) fn lenient_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_number(&other)),
    })
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}
