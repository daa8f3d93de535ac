use anyhow::Result;

use vitalflow_core::db::Database;
use vitalflow_core::models::Activity;

use super::helpers::parse_date;

pub(crate) fn cmd_done(
    db: &Database,
    activity: &str,
    date: Option<String>,
    undo: bool,
    json: bool,
) -> Result<()> {
    let parsed: Activity = activity.parse()?;
    let date = parse_date(date)?;
    let day = db.mark_activity(date, parsed, !undo)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "date": date, "activities": day, "completed": day.completed_count() })
        );
    } else {
        let verb = if undo { "Unmarked" } else { "Completed" };
        println!(
            "{verb} {} for {} ({}/5 done)",
            activity.to_lowercase(),
            date.format("%Y-%m-%d"),
            day.completed_count()
        );
    }
    Ok(())
}
