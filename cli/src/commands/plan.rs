use anyhow::{Result, bail};
use chrono::Weekday;
use tabled::{Table, Tabled, settings::Style};

use vitalflow_core::db::Database;
use vitalflow_core::models::{DayPlan, TimeOfDay, WEEKDAYS, parse_weekday, weekday_key};

use super::Scheduler;

/// Field-level edits to one day of the weekly plan.
#[derive(Debug, Default)]
pub(crate) struct DayPlanEdit {
    pub workout: Option<String>,
    pub duration: Option<u32>,
    pub workout_time: Option<String>,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
    pub bedtime: Option<String>,
    pub wakeup: Option<String>,
}

/// Normalize an `HH:MM` field. An empty value clears the slot.
fn plan_time(value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Ok(String::new());
    }
    Ok(TimeOfDay::parse(value)?.to_string())
}

impl DayPlanEdit {
    fn is_empty(&self) -> bool {
        self.workout.is_none()
            && self.duration.is_none()
            && self.workout_time.is_none()
            && self.breakfast.is_none()
            && self.lunch.is_none()
            && self.dinner.is_none()
            && self.bedtime.is_none()
            && self.wakeup.is_none()
    }

    fn apply(self, day: &mut DayPlan) -> Result<()> {
        if let Some(kind) = self.workout {
            day.workout.kind = kind.trim().to_string();
        }
        if let Some(duration) = self.duration {
            day.workout.duration = duration;
        }
        if let Some(time) = self.workout_time {
            day.workout.time = plan_time(&time)?;
        }
        if let Some(time) = self.breakfast {
            day.meals.breakfast = plan_time(&time)?;
        }
        if let Some(time) = self.lunch {
            day.meals.lunch = plan_time(&time)?;
        }
        if let Some(time) = self.dinner {
            day.meals.dinner = plan_time(&time)?;
        }
        if let Some(time) = self.bedtime {
            day.sleep.bedtime = plan_time(&time)?;
        }
        if let Some(time) = self.wakeup {
            day.sleep.wakeup = plan_time(&time)?;
        }
        Ok(())
    }
}

fn reschedule_plan(scheduler: &mut Scheduler<'_>) {
    scheduler.schedule_meal_notifications();
    scheduler.schedule_workout_notifications();
    scheduler.schedule_sleep_notifications();
}

fn print_plan(days: &[(Weekday, DayPlan)]) {
    #[derive(Tabled)]
    struct PlanRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Workout")]
        workout: String,
        #[tabled(rename = "Breakfast")]
        breakfast: String,
        #[tabled(rename = "Lunch")]
        lunch: String,
        #[tabled(rename = "Dinner")]
        dinner: String,
        #[tabled(rename = "Sleep")]
        sleep: String,
    }

    let dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    let rows: Vec<PlanRow> = days
        .iter()
        .map(|(weekday, plan)| PlanRow {
            day: weekday_key(*weekday).to_string(),
            workout: if plan.workout.is_rest() {
                "Rest".to_string()
            } else {
                format!(
                    "{} {}m @ {}",
                    plan.workout.kind,
                    plan.workout.duration,
                    dash(&plan.workout.time)
                )
            },
            breakfast: dash(&plan.meals.breakfast),
            lunch: dash(&plan.meals.lunch),
            dinner: dash(&plan.meals.dinner),
            sleep: format!("{}-{}", dash(&plan.sleep.bedtime), dash(&plan.sleep.wakeup)),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn cmd_plan_show(db: &Database, day: Option<&str>, json: bool) -> Result<()> {
    let plan = db.get_weekly_plan()?;
    let selected: Vec<Weekday> = match day {
        Some(d) => vec![parse_weekday(d)?],
        None => WEEKDAYS.to_vec(),
    };
    let days: Vec<(Weekday, DayPlan)> = selected
        .into_iter()
        .map(|w| (w, plan.day(w).cloned().unwrap_or_default()))
        .collect();

    if json {
        if let [(weekday, single)] = days.as_slice() {
            let out = serde_json::json!({ "day": weekday_key(*weekday), "plan": single });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    } else {
        print_plan(&days);
    }
    Ok(())
}

pub(crate) fn cmd_plan_set(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    day: &str,
    edit: DayPlanEdit,
    json: bool,
) -> Result<()> {
    let weekday = parse_weekday(day)?;
    if edit.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of --workout, --duration, --workout-time, --breakfast, --lunch, --dinner, --bedtime, or --wakeup"
        );
    }

    let mut day_plan = db
        .get_weekly_plan()?
        .day(weekday)
        .cloned()
        .unwrap_or_default();
    edit.apply(&mut day_plan)?;
    db.update_day_plan(weekday, day_plan.clone())?;
    reschedule_plan(scheduler);

    if json {
        let out = serde_json::json!({ "day": weekday_key(weekday), "plan": day_plan });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Updated plan for {}", weekday_key(weekday));
        print_plan(&[(weekday, day_plan)]);
    }
    Ok(())
}

pub(crate) fn cmd_plan_reset(db: &Database, scheduler: &mut Scheduler<'_>, json: bool) -> Result<()> {
    let plan = db.reset_weekly_plan()?;
    reschedule_plan(scheduler);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("Weekly plan reset to defaults");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{fires_at, payload_str, queued, scheduler};
    use chrono::{Datelike, Local};
    use vitalflow_core::models::{Category, WeeklyPlan};

    #[test]
    fn test_apply_edit_normalizes_times() {
        let mut day = WeeklyPlan::default().day(Weekday::Mon).cloned().unwrap();
        let edit = DayPlanEdit {
            workout: Some("Swim".to_string()),
            lunch: Some("12:05".to_string()),
            dinner: Some("7:45".to_string()),
            ..DayPlanEdit::default()
        };
        edit.apply(&mut day).unwrap();

        assert_eq!(day.workout.kind, "Swim");
        assert_eq!(day.workout.duration, 30);
        assert_eq!(day.meals.lunch, "12:05");
        assert_eq!(day.meals.dinner, "07:45");
        assert_eq!(day.meals.breakfast, "07:30");
    }

    #[test]
    fn test_apply_edit_clears_slot() {
        let mut day = WeeklyPlan::default().day(Weekday::Mon).cloned().unwrap();
        let edit = DayPlanEdit {
            breakfast: Some(String::new()),
            ..DayPlanEdit::default()
        };
        edit.apply(&mut day).unwrap();
        assert_eq!(day.meals.breakfast, "");
    }

    #[test]
    fn test_apply_edit_rejects_bad_time() {
        let mut day = DayPlan::default();
        let edit = DayPlanEdit {
            bedtime: Some("late".to_string()),
            ..DayPlanEdit::default()
        };
        assert!(edit.apply(&mut day).is_err());
    }

    #[test]
    fn test_empty_edit() {
        assert!(DayPlanEdit::default().is_empty());
        let edit = DayPlanEdit {
            duration: Some(0),
            ..DayPlanEdit::default()
        };
        assert!(!edit.is_empty());
    }

    #[test]
    fn test_plan_changes_reschedule_reminders() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut scheduler = scheduler(&db, &dir);
        let today = weekday_key(Local::now().weekday());

        let edit = DayPlanEdit {
            workout: Some("Yoga".to_string()),
            duration: Some(20),
            workout_time: Some("23:58".to_string()),
            lunch: Some("23:59".to_string()),
            bedtime: Some("23:57".to_string()),
            ..DayPlanEdit::default()
        };
        cmd_plan_set(&db, &mut scheduler, today, edit, false).unwrap();

        let lunch_prefix = format!("meal_{today}-lunch_");
        let meals = queued(&scheduler, Category::Meal);
        let lunch = meals.iter().find(|r| r.id.starts_with(&lunch_prefix)).unwrap();
        assert_eq!(fires_at(lunch), "23:59");

        let workouts = queued(&scheduler, Category::Workout);
        assert_eq!(workouts.len(), 1);
        assert_eq!(payload_str(&workouts[0], "workoutName"), "Yoga");
        assert_eq!(fires_at(&workouts[0]), "23:58");

        let sleep = queued(&scheduler, Category::Sleep);
        let bed = sleep
            .iter()
            .find(|r| payload_str(r, "action") == "bedtime")
            .unwrap();
        assert_eq!(fires_at(bed), "23:57");

        cmd_plan_reset(&db, &mut scheduler, false).unwrap();
        assert!(
            queued(&scheduler, Category::Meal)
                .iter()
                .all(|r| fires_at(r) != "23:59")
        );
        assert!(
            queued(&scheduler, Category::Workout)
                .iter()
                .all(|r| payload_str(r, "workoutName") != "Yoga")
        );
        assert!(
            queued(&scheduler, Category::Sleep)
                .iter()
                .all(|r| fires_at(r) != "23:57")
        );
    }
}
