use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

// --- Time of day ---

/// A wall-clock time with no date component, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (h, m) = s
            .split_once(':')
            .with_context(|| format!("Invalid time '{s}'. Use HH:MM (e.g. 07:30)"))?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if h.is_empty() || h.len() > 2 || m.len() != 2 || !digits(h) || !digits(m) {
            bail!("Invalid time '{s}'. Use HH:MM (e.g. 07:30)");
        }
        let hour: u32 = h
            .parse()
            .with_context(|| format!("Invalid hour in '{s}'"))?;
        let minute: u32 = m
            .parse()
            .with_context(|| format!("Invalid minute in '{s}'"))?;
        Self::from_hm(hour, minute)
            .with_context(|| format!("Time '{s}' is out of range (00:00-23:59)"))
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    #[must_use]
    pub fn minutes_since_midnight(self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    /// The instant at this time of day on `date`, seconds zeroed.
    #[must_use]
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Hours slept between `bedtime` and `wakeup`. A wake time earlier in the day
/// than the bedtime is an overnight sleep and wraps past midnight.
#[must_use]
pub fn sleep_duration_hours(bedtime: TimeOfDay, wakeup: TimeOfDay) -> f64 {
    let bed = bedtime.minutes_since_midnight();
    let mut wake = wakeup.minutes_since_midnight();
    if wake < bed {
        wake += 24 * 60;
    }
    f64::from(wake - bed) / 60.0
}

// --- Categories ---

/// Notification category. Also the `type` tag carried in every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Meal,
    Workout,
    Sleep,
    Summary,
}

pub const CATEGORIES: &[Category] = &[
    Category::Meal,
    Category::Workout,
    Category::Sleep,
    Category::Summary,
];

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Meal => "meal",
            Category::Workout => "workout",
            Category::Sleep => "sleep",
            Category::Summary => "summary",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "meal" | "meals" => Ok(Category::Meal),
            "workout" | "workouts" => Ok(Category::Workout),
            "sleep" => Ok(Category::Sleep),
            "summary" => Ok(Category::Summary),
            _ => bail!("Invalid category '{s}'. Must be one of: meal, workout, sleep, summary"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Meals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

impl MealType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => bail!(
                "Invalid meal type '{s}'. Must be one of: {}",
                MEAL_TYPES.join(", ")
            ),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub calories: u32,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub time: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Meal {
    /// Parsed `time`, or `None` when the stored value is malformed.
    #[must_use]
    pub fn time_of_day(&self) -> Option<TimeOfDay> {
        TimeOfDay::parse(&self.time).ok()
    }
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub calories: u32,
    pub meal_type: MealType,
    pub time: TimeOfDay,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMeal {
    pub name: Option<String>,
    pub calories: Option<u32>,
    pub meal_type: Option<MealType>,
    pub time: Option<TimeOfDay>,
    pub date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

pub fn validate_meal_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Meal name must not be empty");
    }
    Ok(trimmed.to_string())
}

/// Order meals by time of day. Stable, so meals sharing a time keep their
/// insertion order; malformed times sort last.
pub fn sort_meals(meals: &mut [Meal]) {
    meals.sort_by_key(|m| {
        let t = m.time_of_day();
        (t.is_none(), t)
    });
}

// --- Sleep ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SleepQuality {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SleepQuality::Excellent => "excellent",
            SleepQuality::Good => "good",
            SleepQuality::Fair => "fair",
            SleepQuality::Poor => "poor",
        }
    }
}

impl FromStr for SleepQuality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "excellent" => Ok(SleepQuality::Excellent),
            "good" => Ok(SleepQuality::Good),
            "fair" => Ok(SleepQuality::Fair),
            "poor" => Ok(SleepQuality::Poor),
            _ => bail!("Invalid sleep quality '{s}'. Must be one of: excellent, good, fair, poor"),
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub id: String,
    pub date: NaiveDate,
    pub bedtime: String,
    pub wakeup: String,
    pub duration: f64,
    pub quality: SleepQuality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSleepRecord {
    pub date: NaiveDate,
    pub bedtime: TimeOfDay,
    pub wakeup: TimeOfDay,
    pub quality: SleepQuality,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSleepRecord {
    pub bedtime: Option<TimeOfDay>,
    pub wakeup: Option<TimeOfDay>,
    pub quality: Option<SleepQuality>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_goal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
}

// --- Notification settings ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct NotificationSettings {
    pub global_enabled: bool,
    pub meals: bool,
    pub workouts: bool,
    pub sleep: bool,
    pub daily_summary: bool,
    pub sound: bool,
    pub vibration: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            global_enabled: true,
            meals: true,
            workouts: true,
            sleep: true,
            daily_summary: true,
            sound: true,
            vibration: true,
        }
    }
}

impl NotificationSettings {
    /// Whether reminders of `category` may be outstanding.
    #[must_use]
    pub fn allows(&self, category: Category) -> bool {
        self.global_enabled
            && match category {
                Category::Meal => self.meals,
                Category::Workout => self.workouts,
                Category::Sleep => self.sleep,
                Category::Summary => self.daily_summary,
            }
    }

    /// Set one of the named flags. Accepts the category names plus `global`,
    /// `sound` and `vibration`.
    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<()> {
        match name.to_lowercase().as_str() {
            "global" | "all" => self.global_enabled = value,
            "meal" | "meals" => self.meals = value,
            "workout" | "workouts" => self.workouts = value,
            "sleep" => self.sleep = value,
            "summary" | "daily-summary" => self.daily_summary = value,
            "sound" => self.sound = value,
            "vibration" => self.vibration = value,
            _ => bail!(
                "Unknown setting '{name}'. Use global, meals, workouts, sleep, summary, sound, or vibration"
            ),
        }
        Ok(())
    }
}

// --- Weekly plan ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub time: String,
}

impl WorkoutPlan {
    /// Rest days carry a workout slot but nothing to remind about.
    #[must_use]
    pub fn is_rest(&self) -> bool {
        self.duration == 0 || self.kind.eq_ignore_ascii_case("rest")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealTimes {
    #[serde(default)]
    pub breakfast: String,
    #[serde(default)]
    pub lunch: String,
    #[serde(default)]
    pub dinner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepWindow {
    #[serde(default)]
    pub bedtime: String,
    #[serde(default)]
    pub wakeup: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default)]
    pub workout: WorkoutPlan,
    #[serde(default)]
    pub meals: MealTimes,
    #[serde(default)]
    pub sleep: SleepWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSlot {
    Workout,
    Breakfast,
    Lunch,
    Dinner,
    SleepWindow,
}

impl PlanSlot {
    #[must_use]
    pub fn category(self) -> Category {
        match self {
            PlanSlot::Workout => Category::Workout,
            PlanSlot::Breakfast | PlanSlot::Lunch | PlanSlot::Dinner => Category::Meal,
            PlanSlot::SleepWindow => Category::Sleep,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlanSlot::Workout => "workout",
            PlanSlot::Breakfast => "breakfast",
            PlanSlot::Lunch => "lunch",
            PlanSlot::Dinner => "dinner",
            PlanSlot::SleepWindow => "sleep",
        }
    }
}

/// One reminder-worthy slot of a day plan. `time` is kept raw so a
/// malformed entry can be skipped instead of failing the whole plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub id: String,
    pub name: String,
    pub slot: PlanSlot,
    pub time: String,
}

impl PlanEntry {
    #[must_use]
    pub fn category(&self) -> Category {
        self.slot.category()
    }

    /// Parsed time, or `None` when the entry is missing a usable time or name.
    #[must_use]
    pub fn reminder_time(&self) -> Option<TimeOfDay> {
        if self.name.trim().is_empty() {
            return None;
        }
        TimeOfDay::parse(&self.time).ok()
    }
}

impl DayPlan {
    fn new(workout: (&str, u32, &str), meals: [&str; 3], sleep: (&str, &str)) -> Self {
        Self {
            workout: WorkoutPlan {
                kind: workout.0.to_string(),
                duration: workout.1,
                time: workout.2.to_string(),
            },
            meals: MealTimes {
                breakfast: meals[0].to_string(),
                lunch: meals[1].to_string(),
                dinner: meals[2].to_string(),
            },
            sleep: SleepWindow {
                bedtime: sleep.0.to_string(),
                wakeup: sleep.1.to_string(),
            },
        }
    }

    /// Flatten the plan into entries. Rest-day workouts are left out.
    #[must_use]
    pub fn entries(&self, weekday: Weekday) -> Vec<PlanEntry> {
        let day = weekday_key(weekday);
        let entry = |slot: PlanSlot, name: &str, time: &str| PlanEntry {
            id: format!("{day}-{}", slot.as_str()),
            name: name.to_string(),
            slot,
            time: time.to_string(),
        };

        let mut entries = Vec::with_capacity(5);
        if !self.workout.is_rest() {
            entries.push(entry(PlanSlot::Workout, &self.workout.kind, &self.workout.time));
        }
        entries.push(entry(PlanSlot::Breakfast, "Breakfast", &self.meals.breakfast));
        entries.push(entry(PlanSlot::Lunch, "Lunch", &self.meals.lunch));
        entries.push(entry(PlanSlot::Dinner, "Dinner", &self.meals.dinner));
        entries.push(entry(PlanSlot::SleepWindow, "Bedtime", &self.sleep.bedtime));
        entries
    }
}

pub const WEEKDAYS: &[Weekday] = &[
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[must_use]
pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub fn parse_weekday(s: &str) -> Result<Weekday> {
    match s.to_lowercase().as_str() {
        "monday" | "mon" => Ok(Weekday::Mon),
        "tuesday" | "tue" => Ok(Weekday::Tue),
        "wednesday" | "wed" => Ok(Weekday::Wed),
        "thursday" | "thu" => Ok(Weekday::Thu),
        "friday" | "fri" => Ok(Weekday::Fri),
        "saturday" | "sat" => Ok(Weekday::Sat),
        "sunday" | "sun" => Ok(Weekday::Sun),
        _ => bail!("Invalid day: {s}. Use monday-sunday or mon-sun"),
    }
}

/// Plans keyed by lowercase weekday name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyPlan {
    pub days: BTreeMap<String, DayPlan>,
}

impl WeeklyPlan {
    #[must_use]
    pub fn day(&self, weekday: Weekday) -> Option<&DayPlan> {
        self.days.get(weekday_key(weekday))
    }

    pub fn set_day(&mut self, weekday: Weekday, plan: DayPlan) {
        self.days.insert(weekday_key(weekday).to_string(), plan);
    }
}

impl Default for WeeklyPlan {
    fn default() -> Self {
        let weekday = |kind: &str, duration: u32| {
            DayPlan::new(
                (kind, duration, "07:00"),
                ["07:30", "12:30", "19:00"],
                ("22:30", "06:30"),
            )
        };
        let weekend = || {
            DayPlan::new(
                ("Rest", 0, "08:00"),
                ["08:30", "13:00", "19:30"],
                ("23:00", "07:00"),
            )
        };

        let mut plan = WeeklyPlan {
            days: BTreeMap::new(),
        };
        plan.set_day(Weekday::Mon, weekday("Cardio", 30));
        plan.set_day(Weekday::Tue, weekday("Strength", 45));
        plan.set_day(Weekday::Wed, weekday("Yoga", 30));
        plan.set_day(Weekday::Thu, weekday("Cardio", 30));
        plan.set_day(Weekday::Fri, weekday("Strength", 45));
        plan.set_day(Weekday::Sat, weekend());
        plan.set_day(Weekday::Sun, weekend());
        plan
    }
}

// --- Completed activities ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Workout,
    Breakfast,
    Lunch,
    Dinner,
    Sleep,
}

impl FromStr for Activity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "workout" => Ok(Activity::Workout),
            "breakfast" => Ok(Activity::Breakfast),
            "lunch" => Ok(Activity::Lunch),
            "dinner" => Ok(Activity::Dinner),
            "sleep" => Ok(Activity::Sleep),
            _ => bail!(
                "Invalid activity '{s}'. Must be one of: workout, breakfast, lunch, dinner, sleep"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DayActivities {
    pub workout: bool,
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
    pub sleep: bool,
}

impl DayActivities {
    pub fn set(&mut self, activity: Activity, completed: bool) {
        match activity {
            Activity::Workout => self.workout = completed,
            Activity::Breakfast => self.breakfast = completed,
            Activity::Lunch => self.lunch = completed,
            Activity::Dinner => self.dinner = completed,
            Activity::Sleep => self.sleep = completed,
        }
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        [
            self.workout,
            self.breakfast,
            self.lunch,
            self.dinner,
            self.sleep,
        ]
        .iter()
        .filter(|done| **done)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn meal_at(id: &str, time: &str) -> Meal {
        Meal {
            id: id.to_string(),
            name: format!("Meal {id}"),
            calories: 500,
            meal_type: MealType::Lunch,
            time: time.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_parse_time_of_day() {
        let time = t("07:30");
        assert_eq!(time.hour(), 7);
        assert_eq!(time.minute(), 30);
        assert_eq!(time.to_string(), "07:30");
        assert_eq!(t("7:05").to_string(), "07:05");
        assert_eq!(t(" 23:59 ").minutes_since_midnight(), 23 * 60 + 59);
    }

    #[test]
    fn test_parse_time_of_day_invalid() {
        assert!(TimeOfDay::parse("").is_err());
        assert!(TimeOfDay::parse("0730").is_err());
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
        assert!(TimeOfDay::parse("12:5").is_err());
        assert!(TimeOfDay::parse("ab:cd").is_err());
        assert!(TimeOfDay::parse("+7:30").is_err());
        assert!(TimeOfDay::parse("07:+5").is_err());
        assert!(TimeOfDay::parse("-1:00").is_err());
    }

    #[test]
    fn test_sleep_duration_overnight() {
        let hours = sleep_duration_hours(t("23:00"), t("07:00"));
        assert!((hours - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sleep_duration_same_day() {
        let hours = sleep_duration_hours(t("07:00"), t("22:30"));
        assert!((hours - 15.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sleep_duration_equal_times_is_zero() {
        let hours = sleep_duration_hours(t("22:00"), t("22:00"));
        assert!(hours.abs() < f64::EPSILON);
    }

    #[test]
    fn test_sort_meals_by_time() {
        let mut meals = vec![
            meal_at("a", "13:00"),
            meal_at("b", "08:30"),
            meal_at("c", "19:30"),
        ];
        sort_meals(&mut meals);
        let times: Vec<&str> = meals.iter().map(|m| m.time.as_str()).collect();
        assert_eq!(times, vec!["08:30", "13:00", "19:30"]);
    }

    #[test]
    fn test_sort_meals_stable_and_malformed_last() {
        let mut meals = vec![
            meal_at("bad", "noon"),
            meal_at("first", "12:00"),
            meal_at("second", "12:00"),
            meal_at("early", "06:00"),
        ];
        sort_meals(&mut meals);
        let ids: Vec<&str> = meals.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "first", "second", "bad"]);
    }

    #[test]
    fn test_meal_type_parse() {
        assert_eq!("Lunch".parse::<MealType>().unwrap(), MealType::Lunch);
        assert_eq!("SNACK".parse::<MealType>().unwrap(), MealType::Snack);
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn test_meal_serializes_type_field() {
        let json = serde_json::to_value(meal_at("a", "12:00")).unwrap();
        assert_eq!(json["type"], "lunch");
        assert_eq!(json["date"], "2024-06-15");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_validate_meal_name() {
        assert_eq!(validate_meal_name("  Oatmeal ").unwrap(), "Oatmeal");
        assert!(validate_meal_name("   ").is_err());
    }

    #[test]
    fn test_category_round_trip_names() {
        for category in CATEGORIES {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
        }
        assert_eq!("meals".parse::<Category>().unwrap(), Category::Meal);
        assert!("alarm".parse::<Category>().is_err());
    }

    #[test]
    fn test_notification_settings_default_all_enabled() {
        let settings = NotificationSettings::default();
        for category in CATEGORIES {
            assert!(settings.allows(*category));
        }
        assert!(settings.sound);
        assert!(settings.vibration);
    }

    #[test]
    fn test_notification_settings_global_off_blocks_everything() {
        let settings = NotificationSettings {
            global_enabled: false,
            ..NotificationSettings::default()
        };
        for category in CATEGORIES {
            assert!(!settings.allows(*category));
        }
    }

    #[test]
    fn test_notification_settings_set_flag() {
        let mut settings = NotificationSettings::default();
        settings.set_flag("workouts", false).unwrap();
        assert!(!settings.allows(Category::Workout));
        assert!(settings.allows(Category::Meal));
        settings.set_flag("summary", false).unwrap();
        assert!(!settings.daily_summary);
        assert!(settings.set_flag("volume", true).is_err());
    }

    #[test]
    fn test_notification_settings_json_shape() {
        let json = serde_json::to_value(NotificationSettings::default()).unwrap();
        assert_eq!(json["globalEnabled"], true);
        assert_eq!(json["dailySummary"], true);
    }

    #[test]
    fn test_default_weekly_plan() {
        let plan = WeeklyPlan::default();
        assert_eq!(plan.days.len(), 7);
        let monday = plan.day(Weekday::Mon).unwrap();
        assert_eq!(monday.workout.kind, "Cardio");
        assert_eq!(monday.meals.breakfast, "07:30");
        assert_eq!(monday.sleep.bedtime, "22:30");
        let sunday = plan.day(Weekday::Sun).unwrap();
        assert!(sunday.workout.is_rest());
        assert_eq!(sunday.meals.dinner, "19:30");
    }

    #[test]
    fn test_day_plan_entries() {
        let plan = WeeklyPlan::default();
        let entries = plan.day(Weekday::Tue).unwrap().entries(Weekday::Tue);
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].id, "tuesday-workout");
        assert_eq!(entries[0].name, "Strength");
        assert_eq!(entries[0].category(), Category::Workout);
        assert_eq!(entries[1].id, "tuesday-breakfast");
        assert_eq!(entries[1].category(), Category::Meal);
        assert_eq!(entries[4].category(), Category::Sleep);
    }

    #[test]
    fn test_day_plan_entries_skip_rest_workout() {
        let plan = WeeklyPlan::default();
        let entries = plan.day(Weekday::Sat).unwrap().entries(Weekday::Sat);
        assert!(entries.iter().all(|e| e.slot != PlanSlot::Workout));
    }

    #[test]
    fn test_plan_entry_reminder_time_malformed() {
        let entry = PlanEntry {
            id: "monday-lunch".to_string(),
            name: "Lunch".to_string(),
            slot: PlanSlot::Lunch,
            time: String::new(),
        };
        assert!(entry.reminder_time().is_none());

        let unnamed = PlanEntry {
            name: " ".to_string(),
            time: "12:00".to_string(),
            ..entry
        };
        assert!(unnamed.reminder_time().is_none());
    }

    #[test]
    fn test_weekly_plan_json_keys_and_partial_days() {
        let json = r#"{"monday": {"meals": {"breakfast": "09:00"}}}"#;
        let plan: WeeklyPlan = serde_json::from_str(json).unwrap();
        let monday = plan.day(Weekday::Mon).unwrap();
        assert_eq!(monday.meals.breakfast, "09:00");
        assert!(monday.meals.lunch.is_empty());
        assert!(monday.workout.is_rest());
        assert!(plan.day(Weekday::Tue).is_none());
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("sunday").unwrap(), Weekday::Sun);
        assert!(parse_weekday("someday").is_err());
    }

    #[test]
    fn test_day_activities() {
        let mut day = DayActivities::default();
        day.set("lunch".parse().unwrap(), true);
        day.set(Activity::Sleep, true);
        assert_eq!(day.completed_count(), 2);
        day.set(Activity::Sleep, false);
        assert_eq!(day.completed_count(), 1);
        assert!("nap".parse::<Activity>().is_err());
    }
}
