use anyhow::{Result, bail};
use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::{Table, Tabled, settings::Style};

use vitalflow_core::db::Database;
use vitalflow_core::models::{CATEGORIES, Category, NotificationSettings};
use vitalflow_core::notify::{NotificationRequest, Permission};
use vitalflow_core::scheduler::ScheduleReport;

use super::Scheduler;
use super::helpers::truncate;

fn print_report(label: &str, report: &ScheduleReport) {
    println!(
        "{label}: {} scheduled, {} failed, {} skipped, {} cancelled",
        report.scheduled, report.failed, report.skipped, report.cancelled
    );
}

fn print_requests(requests: &[NotificationRequest]) {
    #[derive(Tabled)]
    struct NotificationRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Type")]
        category: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Body")]
        body: String,
        #[tabled(rename = "Next")]
        next: String,
        #[tabled(rename = "Repeats")]
        repeats: String,
    }

    let now = Local::now().naive_local();
    let rows: Vec<NotificationRow> = requests
        .iter()
        .map(|r| NotificationRow {
            id: truncate(&r.id, 40),
            category: r.category_tag().unwrap_or("-").to_string(),
            title: r.title.clone(),
            body: truncate(&r.body, 30),
            next: r
                .trigger
                .next_fire(now)
                .map_or("-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
            repeats: if r.trigger.repeats() { "daily" } else { "once" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn cmd_notify_init(scheduler: &mut Scheduler<'_>, json: bool) -> Result<()> {
    let permission = scheduler.initialize();

    if json {
        println!("{}", serde_json::json!({ "permission": permission }));
    } else {
        match permission {
            Permission::Granted => println!("Notifications enabled"),
            Permission::Denied => {
                println!("Notification permission denied; reminders will not be scheduled");
            }
            Permission::Undetermined => println!("Notification permission is undetermined"),
        }
    }
    Ok(())
}

/// Run the daily pass. Without `force` it only runs once per day.
pub(crate) fn cmd_notify_schedule(
    scheduler: &mut Scheduler<'_>,
    force: bool,
    json: bool,
) -> Result<()> {
    let report = if force {
        Some(scheduler.schedule_daily_notifications())
    } else {
        scheduler.schedule_daily_if_due()
    };
    let Some(report) = report else {
        if json {
            println!("{}", serde_json::json!({ "ran": false }));
        } else {
            println!("Reminders already scheduled today. Use --force to reschedule");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::json!({ "ran": true, "report": report }));
    } else {
        print_report("Reminders", &report);
    }
    Ok(())
}

pub(crate) fn cmd_notify_list(
    scheduler: &Scheduler<'_>,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let category: Option<Category> = category.map(str::parse).transpose()?;
    let requests: Vec<NotificationRequest> = scheduler
        .scheduled_notifications()
        .into_iter()
        .filter(|r| category.is_none_or(|c| r.is_category(c)))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&requests)?);
    } else if requests.is_empty() {
        eprintln!("No reminders scheduled. Use `vitalflow notify schedule --force` to schedule them.");
    } else {
        print_requests(&requests);
    }
    Ok(())
}

pub(crate) fn cmd_notify_cancel(
    scheduler: &mut Scheduler<'_>,
    category: &str,
    json: bool,
) -> Result<()> {
    let category: Category = category.parse()?;
    let cancelled = scheduler.cancel_notifications_by_type(category);

    if json {
        println!(
            "{}",
            serde_json::json!({ "category": category, "cancelled": cancelled })
        );
    } else {
        println!("Cancelled {cancelled} {category} reminders");
    }
    Ok(())
}

pub(crate) fn cmd_notify_cancel_all(scheduler: &mut Scheduler<'_>, json: bool) -> Result<()> {
    let cancelled = scheduler.cancel_all_notifications();

    if json {
        println!("{}", serde_json::json!({ "cancelled": cancelled }));
    } else {
        println!("Cancelled {cancelled} reminders");
    }
    Ok(())
}

pub(crate) fn cmd_notify_test(scheduler: &mut Scheduler<'_>, json: bool) -> Result<()> {
    let mut data = Map::new();
    data.insert("source".into(), Value::from("cli"));
    let Some(id) = scheduler.send_immediate_notification(
        "🔔 Test Notification",
        "This is a test notification from VitalFlow",
        Some(data),
    ) else {
        bail!("Test notification could not be sent. Run `vitalflow notify init` first");
    };

    if json {
        println!("{}", serde_json::json!({ "sent": id }));
    } else {
        for request in scheduler.platform().delivered() {
            println!("{}\n  {}", request.title, request.body);
        }
    }
    Ok(())
}

/// Show the notification settings, or change flags and apply them.
pub(crate) fn cmd_notify_settings(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    enable: &[String],
    disable: &[String],
    json: bool,
) -> Result<()> {
    let mut settings = db.get_notification_settings()?;
    let mut report = None;

    if !enable.is_empty() || !disable.is_empty() {
        for name in enable {
            settings.set_flag(name, true)?;
        }
        for name in disable {
            settings.set_flag(name, false)?;
        }
        report = Some(scheduler.apply_settings(&settings));
    }

    if json {
        #[derive(Serialize)]
        struct SettingsOutput<'a> {
            settings: &'a NotificationSettings,
            #[serde(skip_serializing_if = "Option::is_none")]
            report: Option<ScheduleReport>,
        }
        let out = SettingsOutput {
            settings: &settings,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let on_off = |b: bool| if b { "on" } else { "off" };
    println!("Notifications: {}", on_off(settings.global_enabled));
    for category in CATEGORIES {
        println!("  {:<8} {}", category.as_str(), on_off(settings.allows(*category)));
    }
    println!("Sound:         {}", on_off(settings.sound));
    println!("Vibration:     {}", on_off(settings.vibration));
    if let Some(report) = report {
        print_report("Applied", &report);
    }
    Ok(())
}

/// Deliver every reminder that is due now.
pub(crate) fn cmd_notify_fire(scheduler: &mut Scheduler<'_>, json: bool) -> Result<()> {
    let now = Local::now().naive_local();
    let due = scheduler.platform_mut().deliver_due(now)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&due)?);
    } else {
        for request in &due {
            println!("{}\n  {}", request.title, request.body);
        }
    }
    Ok(())
}
