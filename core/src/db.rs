use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Weekday};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::models::{
    Activity, DayActivities, DayPlan, Meal, NewMeal, NewSleepRecord, NotificationSettings,
    SleepRecord, SleepSettings, TimeOfDay, UpdateMeal, UpdateSleepRecord, WeeklyPlan,
    sleep_duration_hours, sort_meals,
};

const WEEKLY_PLAN_KEY: &str = "vitalflow_weekly_plan";
const MEALS_PREFIX: &str = "vitalflow_meals/";
const SLEEP_RECORDS_KEY: &str = "vitalflow_sleep_records";
const COMPLETED_PREFIX: &str = "vitalflow_completed/";
const SLEEP_SETTINGS_KEY: &str = "sleep_settings";
const NOTIFICATION_SETTINGS_KEY: &str = "notification_settings";
const LAST_SCHEDULE_KEY: &str = "last_notification_schedule";

/// Local store: a flat key-value table whose values are JSON documents.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Raw key-value access ---

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn delete_key(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{escaped}%");
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_store WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key")?;
        let keys = stmt
            .query_map(params![pattern], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Corrupt value stored under '{key}'"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    // --- Weekly plan ---

    /// Stored plan, or the default plan when none has been saved.
    pub fn get_weekly_plan(&self) -> Result<WeeklyPlan> {
        Ok(self.get_json(WEEKLY_PLAN_KEY)?.unwrap_or_default())
    }

    pub fn save_weekly_plan(&self, plan: &WeeklyPlan) -> Result<()> {
        self.set_json(WEEKLY_PLAN_KEY, plan)
    }

    pub fn update_day_plan(&self, weekday: Weekday, day: DayPlan) -> Result<WeeklyPlan> {
        let mut plan = self.get_weekly_plan()?;
        plan.set_day(weekday, day);
        self.save_weekly_plan(&plan)?;
        Ok(plan)
    }

    pub fn reset_weekly_plan(&self) -> Result<WeeklyPlan> {
        let plan = WeeklyPlan::default();
        self.save_weekly_plan(&plan)?;
        Ok(plan)
    }

    // --- Meals ---

    fn meals_key(date: NaiveDate) -> String {
        format!("{MEALS_PREFIX}{}", date.format("%Y-%m-%d"))
    }

    fn save_meals_for_date(&self, date: NaiveDate, meals: &mut [Meal]) -> Result<()> {
        let key = Self::meals_key(date);
        if meals.is_empty() {
            self.delete_key(&key)?;
            return Ok(());
        }
        sort_meals(meals);
        self.set_json(&key, &*meals)
    }

    /// Meals logged for `date`, ordered by time of day.
    pub fn get_meals_for_date(&self, date: NaiveDate) -> Result<Vec<Meal>> {
        Ok(self.get_json(&Self::meals_key(date))?.unwrap_or_default())
    }

    /// Every logged meal, oldest date first.
    pub fn get_all_meals(&self) -> Result<Vec<Meal>> {
        let mut all = Vec::new();
        for key in self.keys_with_prefix(MEALS_PREFIX)? {
            let meals: Vec<Meal> = self.get_json(&key)?.unwrap_or_default();
            all.extend(meals);
        }
        Ok(all)
    }

    /// Meals dated `from` or later, oldest date first.
    pub fn get_meals_from(&self, from: NaiveDate) -> Result<Vec<Meal>> {
        Ok(self
            .get_all_meals()?
            .into_iter()
            .filter(|m| m.date >= from)
            .collect())
    }

    pub fn insert_meal(&self, meal: &NewMeal) -> Result<Meal> {
        let created = Meal {
            id: Uuid::new_v4().to_string(),
            name: meal.name.clone(),
            calories: meal.calories,
            meal_type: meal.meal_type,
            time: meal.time.to_string(),
            date: meal.date,
            notes: meal.notes.clone(),
        };
        let mut meals = self.get_meals_for_date(meal.date)?;
        meals.push(created.clone());
        self.save_meals_for_date(meal.date, &mut meals)?;
        Ok(created)
    }

    pub fn find_meal(&self, id: &str) -> Result<Option<Meal>> {
        Ok(self.get_all_meals()?.into_iter().find(|m| m.id == id))
    }

    pub fn get_meal(&self, id: &str) -> Result<Meal> {
        self.find_meal(id)?.context("Meal not found")
    }

    pub fn update_meal(&self, id: &str, update: &UpdateMeal) -> Result<Meal> {
        let existing = self.get_meal(id)?;
        let mut meal = existing.clone();

        if let Some(ref name) = update.name {
            meal.name.clone_from(name);
        }
        if let Some(calories) = update.calories {
            meal.calories = calories;
        }
        if let Some(meal_type) = update.meal_type {
            meal.meal_type = meal_type;
        }
        if let Some(time) = update.time {
            meal.time = time.to_string();
        }
        if let Some(date) = update.date {
            meal.date = date;
        }
        if let Some(ref notes) = update.notes {
            meal.notes.clone_from(notes);
        }

        let mut old_list = self.get_meals_for_date(existing.date)?;
        old_list.retain(|m| m.id != id);
        if meal.date == existing.date {
            old_list.push(meal.clone());
            self.save_meals_for_date(existing.date, &mut old_list)?;
        } else {
            self.save_meals_for_date(existing.date, &mut old_list)?;
            let mut new_list = self.get_meals_for_date(meal.date)?;
            new_list.push(meal.clone());
            self.save_meals_for_date(meal.date, &mut new_list)?;
        }

        Ok(meal)
    }

    pub fn delete_meal(&self, id: &str) -> Result<bool> {
        let Some(existing) = self.find_meal(id)? else {
            return Ok(false);
        };
        let mut meals = self.get_meals_for_date(existing.date)?;
        meals.retain(|m| m.id != id);
        self.save_meals_for_date(existing.date, &mut meals)?;
        Ok(true)
    }

    // --- Sleep records ---

    /// All sleep records, most recently logged first.
    pub fn get_sleep_records(&self) -> Result<Vec<SleepRecord>> {
        Ok(self.get_json(SLEEP_RECORDS_KEY)?.unwrap_or_default())
    }

    fn save_sleep_records(&self, records: &[SleepRecord]) -> Result<()> {
        self.set_json(SLEEP_RECORDS_KEY, records)
    }

    pub fn get_sleep_record(&self, id: &str) -> Result<Option<SleepRecord>> {
        Ok(self.get_sleep_records()?.into_iter().find(|r| r.id == id))
    }

    pub fn insert_sleep_record(&self, record: &NewSleepRecord) -> Result<SleepRecord> {
        let created = SleepRecord {
            id: Uuid::new_v4().to_string(),
            date: record.date,
            bedtime: record.bedtime.to_string(),
            wakeup: record.wakeup.to_string(),
            duration: sleep_duration_hours(record.bedtime, record.wakeup),
            quality: record.quality,
            notes: record.notes.clone(),
        };
        let mut records = self.get_sleep_records()?;
        records.insert(0, created.clone());
        self.save_sleep_records(&records)?;
        Ok(created)
    }

    pub fn update_sleep_record(&self, id: &str, update: &UpdateSleepRecord) -> Result<SleepRecord> {
        let mut records = self.get_sleep_records()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .context("Sleep record not found")?;

        if let Some(bedtime) = update.bedtime {
            record.bedtime = bedtime.to_string();
        }
        if let Some(wakeup) = update.wakeup {
            record.wakeup = wakeup.to_string();
        }
        if update.bedtime.is_some() || update.wakeup.is_some() {
            let bedtime = TimeOfDay::parse(&record.bedtime)?;
            let wakeup = TimeOfDay::parse(&record.wakeup)?;
            record.duration = sleep_duration_hours(bedtime, wakeup);
        }
        if let Some(quality) = update.quality {
            record.quality = quality;
        }
        if let Some(ref notes) = update.notes {
            record.notes.clone_from(notes);
        }

        let updated = record.clone();
        self.save_sleep_records(&records)?;
        Ok(updated)
    }

    pub fn delete_sleep_record(&self, id: &str) -> Result<bool> {
        let mut records = self.get_sleep_records()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save_sleep_records(&records)?;
        Ok(true)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn get_average_sleep(&self) -> Result<f64> {
        let records = self.get_sleep_records()?;
        if records.is_empty() {
            return Ok(0.0);
        }
        let total: f64 = records.iter().map(|r| r.duration).sum();
        Ok(total / records.len() as f64)
    }

    // --- Settings ---

    pub fn get_sleep_settings(&self) -> Result<SleepSettings> {
        Ok(self.get_json(SLEEP_SETTINGS_KEY)?.unwrap_or_default())
    }

    pub fn save_sleep_settings(&self, settings: &SleepSettings) -> Result<()> {
        self.set_json(SLEEP_SETTINGS_KEY, settings)
    }

    /// Stored notification settings, or everything enabled when unset.
    pub fn get_notification_settings(&self) -> Result<NotificationSettings> {
        Ok(self
            .get_json(NOTIFICATION_SETTINGS_KEY)?
            .unwrap_or_default())
    }

    pub fn save_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        self.set_json(NOTIFICATION_SETTINGS_KEY, settings)
    }

    pub fn get_last_notification_schedule(&self) -> Result<Option<NaiveDate>> {
        match self.get_raw(LAST_SCHEDULE_KEY)? {
            Some(v) => Ok(Some(NaiveDate::parse_from_str(&v, "%Y-%m-%d")?)),
            None => Ok(None),
        }
    }

    pub fn set_last_notification_schedule(&self, date: NaiveDate) -> Result<()> {
        self.set_raw(LAST_SCHEDULE_KEY, &date.format("%Y-%m-%d").to_string())
    }

    // --- Completed activities ---

    fn completed_key(date: NaiveDate) -> String {
        format!("{COMPLETED_PREFIX}{}", date.format("%Y-%m-%d"))
    }

    pub fn get_activities(&self, date: NaiveDate) -> Result<DayActivities> {
        Ok(self
            .get_json(&Self::completed_key(date))?
            .unwrap_or_default())
    }

    pub fn mark_activity(
        &self,
        date: NaiveDate,
        activity: Activity,
        completed: bool,
    ) -> Result<DayActivities> {
        let mut day = self.get_activities(date)?;
        day.set(activity, completed);
        self.set_json(&Self::completed_key(date), &day)?;
        Ok(day)
    }

    /// Remove every stored value.
    pub fn clear_all_data(&self) -> Result<()> {
        self.conn.execute("DELETE FROM kv_store", [])?;
        Ok(())
    }
}
