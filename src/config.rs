use crate::models::{lenient_number, lenient_option, lenient_text};
use serde::{Deserialize, Serialize};
use std::{env, fmt::Display, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_DAILY_GOAL: f64 = 2300.0;
pub const DEFAULT_TDEE: f64 = 1850.0;
pub const DEFAULT_BMR: f64 = 1850.0;
pub const DEFAULT_PROTEIN_GOAL: f64 = 150.0;
pub const DEFAULT_FAT_GOAL: f64 = 70.0;
pub const DEFAULT_CARB_GOAL: f64 = 250.0;

/// Multiplier applied to BMR to estimate daily energy expenditure.
pub const ACTIVITY_FACTOR: f64 = 1.45;

const KG_PER_LB: f64 = 0.453592;
const CM_PER_IN: f64 = 2.54;

/// Denominator used for weekly averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AveragePolicy {
    /// Average only over days that have calories logged.
    #[default]
    Sparse,
    /// Average over all seven window slots.
    Dense,
}

impl FromStr for AveragePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sparse" => Ok(Self::Sparse),
            "dense" => Ok(Self::Dense),
            other => Err(format!("unknown average policy '{other}'")),
        }
    }
}

/// How the ledger decides which history records are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep the seven most recent records, whatever their dates.
    #[default]
    RecordCount,
    /// Also drop records older than today and the six days before it.
    CalendarWindow,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" | "record_count" => Ok(Self::RecordCount),
            "calendar" | "calendar_window" => Ok(Self::CalendarWindow),
            other => Err(format!("unknown eviction policy '{other}'")),
        }
    }
}

/// Goal and energy configuration read by the ledger derivations.
///
/// `revision` increases on every change so clients can tell which
/// configuration a snapshot was computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub revision: u64,
    pub name: String,
    pub daily_calorie_goal: f64,
    pub tdee: f64,
    pub bmr: f64,
    pub protein_goal: f64,
    pub fat_goal: f64,
    pub carb_goal: f64,
    pub average_policy: AveragePolicy,
    pub eviction_policy: EvictionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            revision: 1,
            name: "User".to_string(),
            daily_calorie_goal: DEFAULT_DAILY_GOAL,
            tdee: DEFAULT_TDEE,
            bmr: DEFAULT_BMR,
            protein_goal: DEFAULT_PROTEIN_GOAL,
            fat_goal: DEFAULT_FAT_GOAL,
            carb_goal: DEFAULT_CARB_GOAL,
            average_policy: AveragePolicy::default(),
            eviction_policy: EvictionPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            daily_calorie_goal: try_load("APP_DAILY_GOAL", DEFAULT_DAILY_GOAL),
            tdee: try_load("APP_TDEE", DEFAULT_TDEE),
            bmr: try_load("APP_BMR", DEFAULT_BMR),
            protein_goal: try_load("APP_PROTEIN_GOAL", DEFAULT_PROTEIN_GOAL),
            fat_goal: try_load("APP_FAT_GOAL", DEFAULT_FAT_GOAL),
            carb_goal: try_load("APP_CARB_GOAL", DEFAULT_CARB_GOAL),
            average_policy: try_load("APP_AVERAGE_POLICY", AveragePolicy::default()),
            eviction_policy: try_load("APP_EVICTION_POLICY", EvictionPolicy::default()),
            ..Self::default()
        }
    }

    /// Applies a partial update. Profile-derived energy figures are applied
    /// first so explicit fields in the same update take precedence.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(profile) = update.profile {
            self.apply_profile(&profile);
        }
        if let Some(name) = update.name {
            self.name = display_name(&name);
        }
        if let Some(goal) = update.daily_calorie_goal {
            self.daily_calorie_goal = goal;
        }
        if let Some(tdee) = update.tdee {
            self.tdee = tdee;
        }
        if let Some(bmr) = update.bmr {
            self.bmr = bmr;
        }
        if let Some(goal) = update.protein_goal {
            self.protein_goal = goal;
        }
        if let Some(goal) = update.fat_goal {
            self.fat_goal = goal;
        }
        if let Some(goal) = update.carb_goal {
            self.carb_goal = goal;
        }
        if let Some(policy) = update.average_policy {
            self.average_policy = policy;
        }
        if let Some(policy) = update.eviction_policy {
            self.eviction_policy = policy;
        }
        self.revision += 1;
    }

    /// Onboarding variant of a profile update: every body measurement and the
    /// goal must be non-zero.
    pub fn onboard(&mut self, profile: &Profile) -> Result<(), OnboardingError> {
        let required = [
            ("weight_lb", profile.weight_lb),
            ("height_in", profile.height_in),
            ("age", profile.age),
            ("goal_calories", profile.goal_calories),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| *value == 0.0) {
            return Err(OnboardingError::MissingMeasurement(*field));
        }
        self.apply_profile(profile);
        self.revision += 1;
        Ok(())
    }

    fn apply_profile(&mut self, profile: &Profile) {
        self.name = display_name(&profile.name);
        self.daily_calorie_goal = profile.goal_calories;
        self.bmr = profile.bmr();
        self.tdee = profile.tdee();
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OnboardingError {
    #[error("{0} must be non-zero")]
    MissingMeasurement(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

/// Body measurements in imperial units, as entered during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight_lb: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub height_in: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub age: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub goal_calories: f64,
}

impl Profile {
    /// Mifflin-St Jeor basal metabolic rate, rounded to whole kcal.
    pub fn bmr(&self) -> f64 {
        let kg = self.weight_lb * KG_PER_LB;
        let cm = self.height_in * CM_PER_IN;
        let base = 10.0 * kg + 6.25 * cm - 5.0 * self.age;
        let offset = match self.sex {
            Sex::Male => 5.0,
            Sex::Female => -161.0,
        };
        (base + offset).round()
    }

    pub fn tdee(&self) -> f64 {
        (self.bmr() * ACTIVITY_FACTOR).round()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub daily_calorie_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub tdee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub bmr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub protein_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub fat_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub carb_goal: Option<f64>,
    #[serde(default)]
    pub average_policy: Option<AveragePolicy>,
    #[serde(default)]
    pub eviction_policy: Option<EvictionPolicy>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

pub fn resolve_port() -> u16 {
    try_load("PORT", 8080)
}

fn display_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "User".to_string()
    } else {
        trimmed.to_string()
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|err| {
            warn!("invalid {key} value '{raw}': {err}, using default {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

impl Display for AveragePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AveragePolicy::Sparse => f.write_str("sparse"),
            AveragePolicy::Dense => f.write_str("dense"),
        }
    }
}

impl Display for EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvictionPolicy::RecordCount => f.write_str("count"),
            EvictionPolicy::CalendarWindow => f.write_str("calendar"),
        }
    }
}
