use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitalflow_core::db::Database;
use vitalflow_core::models::{MealType, NewMeal, TimeOfDay, UpdateMeal, validate_meal_name};

use super::Scheduler;
use super::helpers::{
    exit_not_found, notes_update, parse_date, parse_time_opt, short_id, truncate,
};

/// Full meal id for an id or unambiguous id prefix.
fn resolve_meal_id(db: &Database, id: &str) -> Result<Option<String>> {
    let matches: Vec<String> = db
        .get_all_meals()?
        .into_iter()
        .map(|m| m.id)
        .filter(|m| m.starts_with(id))
        .collect();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.into_iter().next()),
        n => bail!("Meal id '{id}' is ambiguous ({n} matches). Use more characters"),
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_meal_add(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    name: &str,
    calories: u32,
    meal_type: &str,
    time: &str,
    date: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let meal = NewMeal {
        name: validate_meal_name(name)?,
        calories,
        meal_type: meal_type.parse()?,
        time: TimeOfDay::parse(time)?,
        date: parse_date(date)?,
        notes: notes.filter(|n| !n.trim().is_empty()),
    };
    let meal = db.insert_meal(&meal)?;
    scheduler.schedule_meal_notifications();

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        println!(
            "Added {} ({} kcal) for {} at {} on {} [{}]",
            meal.name,
            meal.calories,
            meal.meal_type,
            meal.time,
            meal.date.format("%Y-%m-%d"),
            short_id(&meal.id)
        );
    }
    Ok(())
}

pub(crate) fn cmd_meal_list(db: &Database, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let meals = db.get_meals_for_date(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }
    if meals.is_empty() {
        eprintln!(
            "No meals logged for {}. Use `vitalflow meal add` to log one.",
            date.format("%Y-%m-%d")
        );
        return Ok(());
    }

    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Type")]
        meal_type: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: u32,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: short_id(&m.id),
            time: m.time.clone(),
            meal_type: m.meal_type.to_string(),
            name: truncate(&m.name, 30),
            calories: m.calories,
            notes: m.notes.as_deref().map(|n| truncate(n, 30)).unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let total: u32 = meals.iter().map(|m| m.calories).sum();
    println!("Total: {total} kcal across {} meals", meals.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_meal_edit(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    id: &str,
    name: Option<&str>,
    calories: Option<u32>,
    meal_type: Option<&str>,
    time: Option<&str>,
    date: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    if name.is_none()
        && calories.is_none()
        && meal_type.is_none()
        && time.is_none()
        && date.is_none()
        && notes.is_none()
    {
        bail!(
            "Nothing to update. Provide at least one of --name, --calories, --type, --time, --date, or --notes"
        );
    }

    let Some(full_id) = resolve_meal_id(db, id)? else {
        exit_not_found(&format!("Meal {id} not found"), json);
    };

    let update = UpdateMeal {
        name: name.map(validate_meal_name).transpose()?,
        calories,
        meal_type: meal_type.map(str::parse::<MealType>).transpose()?,
        time: parse_time_opt(time)?,
        date: date.map(Some).map(parse_date).transpose()?,
        notes: notes_update(notes),
    };
    let meal = db.update_meal(&full_id, &update)?;
    scheduler.schedule_meal_notifications();

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        println!(
            "Updated {}: {} ({} kcal) at {} on {}",
            short_id(&meal.id),
            meal.name,
            meal.calories,
            meal.time,
            meal.date.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub(crate) fn cmd_meal_delete(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    id: &str,
    json: bool,
) -> Result<()> {
    let Some(full_id) = resolve_meal_id(db, id)? else {
        exit_not_found(&format!("Meal {id} not found"), json);
    };
    db.delete_meal(&full_id)?;
    scheduler.schedule_meal_notifications();

    if json {
        println!("{}", serde_json::json!({ "deleted": full_id }));
    } else {
        println!("Deleted meal {}", short_id(&full_id));
    }
    Ok(())
}
