use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitalflow_core::db::Database;
use vitalflow_core::models::{NewSleepRecord, SleepQuality, TimeOfDay, UpdateSleepRecord};

use super::Scheduler;
use super::helpers::{exit_not_found, notes_update, parse_date, parse_time_opt, short_id};

fn resolve_sleep_id(db: &Database, id: &str) -> Result<Option<String>> {
    let matches: Vec<String> = db
        .get_sleep_records()?
        .into_iter()
        .map(|r| r.id)
        .filter(|r| r.starts_with(id))
        .collect();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.into_iter().next()),
        n => bail!("Sleep record id '{id}' is ambiguous ({n} matches). Use more characters"),
    }
}

pub(crate) fn cmd_sleep_log(
    db: &Database,
    bedtime: &str,
    wakeup: &str,
    quality: &str,
    date: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let record = db.insert_sleep_record(&NewSleepRecord {
        date: parse_date(date)?,
        bedtime: TimeOfDay::parse(bedtime)?,
        wakeup: TimeOfDay::parse(wakeup)?,
        quality: quality.parse()?,
        notes: notes.filter(|n| !n.trim().is_empty()),
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "Logged {:.1}h of {} sleep ({} to {}) for {} [{}]",
            record.duration,
            record.quality,
            record.bedtime,
            record.wakeup,
            record.date.format("%Y-%m-%d"),
            short_id(&record.id)
        );
    }
    Ok(())
}

pub(crate) fn cmd_sleep_list(db: &Database, limit: Option<usize>, json: bool) -> Result<()> {
    let mut records = db.get_sleep_records()?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        eprintln!("No sleep records yet. Use `vitalflow sleep log` to add one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct SleepRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Bedtime")]
        bedtime: String,
        #[tabled(rename = "Wake-up")]
        wakeup: String,
        #[tabled(rename = "Hours")]
        hours: String,
        #[tabled(rename = "Quality")]
        quality: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<SleepRow> = records
        .iter()
        .map(|r| SleepRow {
            id: short_id(&r.id),
            date: r.date.format("%Y-%m-%d").to_string(),
            bedtime: r.bedtime.clone(),
            wakeup: r.wakeup.clone(),
            hours: format!("{:.1}", r.duration),
            quality: r.quality.to_string(),
            notes: r.notes.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("Average: {:.1}h per night", db.get_average_sleep()?);
    Ok(())
}

pub(crate) fn cmd_sleep_edit(
    db: &Database,
    id: &str,
    bedtime: Option<&str>,
    wakeup: Option<&str>,
    quality: Option<&str>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    if bedtime.is_none() && wakeup.is_none() && quality.is_none() && notes.is_none() {
        bail!("Nothing to update. Provide at least one of --bedtime, --wakeup, --quality, or --notes");
    }
    let Some(full_id) = resolve_sleep_id(db, id)? else {
        exit_not_found(&format!("Sleep record {id} not found"), json);
    };

    let update = UpdateSleepRecord {
        bedtime: parse_time_opt(bedtime)?,
        wakeup: parse_time_opt(wakeup)?,
        quality: quality.map(str::parse::<SleepQuality>).transpose()?,
        notes: notes_update(notes),
    };
    let record = db.update_sleep_record(&full_id, &update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "Updated {}: {} to {} ({:.1}h, {})",
            short_id(&record.id),
            record.bedtime,
            record.wakeup,
            record.duration,
            record.quality
        );
    }
    Ok(())
}

pub(crate) fn cmd_sleep_delete(db: &Database, id: &str, json: bool) -> Result<()> {
    let Some(full_id) = resolve_sleep_id(db, id)? else {
        exit_not_found(&format!("Sleep record {id} not found"), json);
    };
    db.delete_sleep_record(&full_id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": full_id }));
    } else {
        println!("Deleted sleep record {}", short_id(&full_id));
    }
    Ok(())
}

/// Show the sleep settings, or update them and reschedule sleep reminders.
pub(crate) fn cmd_sleep_settings(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    bedtime: Option<&str>,
    wake_time: Option<&str>,
    goal: Option<f64>,
    json: bool,
) -> Result<()> {
    let mut settings = db.get_sleep_settings()?;
    let changed = bedtime.is_some() || wake_time.is_some() || goal.is_some();

    if changed {
        if let Some(bedtime) = parse_time_opt(bedtime)? {
            settings.bedtime = Some(bedtime.to_string());
        }
        if let Some(wake_time) = parse_time_opt(wake_time)? {
            settings.wake_time = Some(wake_time.to_string());
        }
        if let Some(goal) = goal {
            if !(0.0..=24.0).contains(&goal) {
                bail!("Sleep goal must be between 0 and 24 hours");
            }
            settings.sleep_goal = Some(goal);
        }
        db.save_sleep_settings(&settings)?;
        scheduler.schedule_sleep_notifications();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        let unset = || "(not set)".to_string();
        println!("Bedtime:    {}", settings.bedtime.clone().unwrap_or_else(unset));
        println!("Wake time:  {}", settings.wake_time.clone().unwrap_or_else(unset));
        println!(
            "Sleep goal: {}",
            settings
                .sleep_goal
                .map_or_else(unset, |g| format!("{g:.1}h"))
        );
    }
    Ok(())
}
