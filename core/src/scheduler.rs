//! Reminder scheduling.
//!
//! Turns the stored plan, meals, sleep settings and notification settings into
//! platform triggers. Every operation is idempotent: a category is cancelled
//! before it is rescheduled, and the platform's queue is re-read on every
//! cancellation instead of being mirrored locally.

use std::ops::AddAssign;

use chrono::{Datelike, Duration, Local, NaiveDateTime};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Category, NotificationSettings, TimeOfDay};
use crate::notify::{
    DEFAULT_CHANNEL, NotificationPlatform, NotificationRequest, NotifyError, Permission,
    channel_for, default_channels,
};
use crate::trigger::{Trigger, composite_key, next_occurrence};

/// Wake-up reminders fire this long after the bedtime reminder.
pub const WAKEUP_OFFSET_HOURS: i64 = 8;

pub const DAILY_SUMMARY_HOUR: u32 = 22;

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    pub scheduled: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl AddAssign for ScheduleReport {
    fn add_assign(&mut self, other: Self) {
        self.scheduled += other.scheduled;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.cancelled += other.cancelled;
    }
}

impl ScheduleReport {
    fn skip(&mut self, entry_id: &str) {
        debug!("{}", NotifyError::MalformedEntry(entry_id.to_string()));
        self.skipped += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    Uninitialized,
    Ready,
    PermissionDenied,
}

/// Everything needed to build one reminder request.
struct Reminder<'a> {
    category: Category,
    entity_id: &'a str,
    at: NaiveDateTime,
    repeats: bool,
    title: &'a str,
    body: String,
    fields: Vec<(&'static str, String)>,
}

impl Reminder<'_> {
    fn into_request(self, settings: &NotificationSettings) -> NotificationRequest {
        let mut payload = Map::new();
        payload.insert("type".into(), Value::from(self.category.as_str()));
        for (key, value) in self.fields {
            payload.insert(key.into(), Value::from(value));
        }
        let trigger = if self.repeats {
            Trigger::Daily { first: self.at }
        } else {
            Trigger::Once { at: self.at }
        };
        NotificationRequest {
            id: composite_key(self.category, self.entity_id, self.at),
            title: self.title.to_string(),
            body: self.body,
            payload,
            trigger,
            channel_id: channel_for(self.category).to_string(),
            sound: settings.sound,
            vibrate: settings.vibration,
        }
    }
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct NotificationScheduler<'db, P> {
    db: &'db Database,
    platform: P,
    session: Session,
}

impl<'db, P: NotificationPlatform> NotificationScheduler<'db, P> {
    pub fn new(db: &'db Database, platform: P) -> Self {
        Self {
            db,
            platform,
            session: Session::Uninitialized,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.session == Session::Ready
    }

    #[must_use]
    pub fn permission_denied(&self) -> bool {
        self.session == Session::PermissionDenied
    }

    // --- Session ---

    /// Ask for permission and configure channels. A denial turns every
    /// scheduling call into a no-op until this is called again.
    pub fn initialize(&mut self) -> Permission {
        if self.session == Session::Ready {
            return Permission::Granted;
        }

        let mut status = match self.platform.permission_status() {
            Ok(status) => status,
            Err(e) => {
                error!("Failed to read notification permission: {e}");
                return Permission::Undetermined;
            }
        };
        if status != Permission::Granted {
            status = match self.platform.request_permission() {
                Ok(status) => status,
                Err(e) => {
                    error!("Failed to request notification permission: {e}");
                    return Permission::Undetermined;
                }
            };
        }
        if status != Permission::Granted {
            warn!("{}", NotifyError::PermissionDenied);
            self.session = Session::PermissionDenied;
            return status;
        }

        for channel in default_channels() {
            if let Err(e) = self.platform.create_channel(&channel) {
                warn!("Failed to configure channel '{}': {e}", channel.id);
            }
        }
        self.session = Session::Ready;
        info!("Notification scheduler initialized");
        Permission::Granted
    }

    // --- Helpers ---

    fn load_settings(&self) -> Option<NotificationSettings> {
        match self.db.get_notification_settings() {
            Ok(settings) => Some(settings),
            Err(e) => {
                error!("Failed to read notification settings: {e:#}");
                None
            }
        }
    }

    /// `Some(report)` when `category` must not be scheduled right now.
    fn gate(&mut self, category: Category, settings: &NotificationSettings) -> Option<ScheduleReport> {
        if self.session == Session::PermissionDenied {
            debug!("Permission denied; not scheduling {category} reminders");
            return Some(ScheduleReport::default());
        }
        if settings.allows(category) {
            return None;
        }
        let cancelled = self.cancel_notifications_by_type(category);
        debug!("{category} reminders disabled; cancelled {cancelled}");
        Some(ScheduleReport {
            cancelled,
            ..ScheduleReport::default()
        })
    }

    fn submit(&mut self, request: NotificationRequest, report: &mut ScheduleReport) {
        let id = request.id.clone();
        match self.platform.schedule(request) {
            Ok(_) => {
                debug!("Notification scheduled: {id}");
                report.scheduled += 1;
            }
            Err(e) => {
                warn!("{e}");
                report.failed += 1;
            }
        }
    }

    fn log_report(category: Category, report: &ScheduleReport) {
        info!(
            "Scheduled {} {category} reminders ({} failed, {} skipped, {} cancelled)",
            report.scheduled, report.failed, report.skipped, report.cancelled
        );
    }

    // --- Meals ---

    pub fn schedule_meal_notifications(&mut self) -> ScheduleReport {
        self.schedule_meal_notifications_at(now_local())
    }

    pub fn schedule_meal_notifications_at(&mut self, now: NaiveDateTime) -> ScheduleReport {
        match self.load_settings() {
            Some(settings) => self.schedule_meals_with(&settings, now),
            None => ScheduleReport::default(),
        }
    }

    fn schedule_meals_with(
        &mut self,
        settings: &NotificationSettings,
        now: NaiveDateTime,
    ) -> ScheduleReport {
        if let Some(report) = self.gate(Category::Meal, settings) {
            return report;
        }

        let weekday = now.weekday();
        let planned = match self.db.get_weekly_plan() {
            Ok(plan) => plan.day(weekday).map(|d| d.entries(weekday)).unwrap_or_default(),
            Err(e) => {
                error!("Failed to read weekly plan: {e:#}");
                return ScheduleReport::default();
            }
        };
        let today = now.date();
        let logged = match self.db.get_meals_from(today) {
            Ok(meals) => meals,
            Err(e) => {
                error!("Failed to read meals: {e:#}");
                return ScheduleReport::default();
            }
        };

        let mut report = ScheduleReport {
            cancelled: self.cancel_notifications_by_type(Category::Meal),
            ..ScheduleReport::default()
        };

        for entry in planned.iter().filter(|e| e.category() == Category::Meal) {
            let Some(time) = entry.reminder_time() else {
                report.skip(&entry.id);
                continue;
            };
            let request = Reminder {
                category: Category::Meal,
                entity_id: &entry.id,
                at: next_occurrence(time, now),
                repeats: false,
                title: "🍽️ Meal Time!",
                body: format!("Time for {}", entry.name),
                fields: vec![("mealId", entry.id.clone()), ("mealName", entry.name.clone())],
            }
            .into_request(settings);
            self.submit(request, &mut report);
        }

        for meal in &logged {
            let time = meal.time_of_day().filter(|_| !meal.name.trim().is_empty());
            let Some(time) = time else {
                report.skip(&meal.id);
                continue;
            };
            // Future-dated meals fire on their own day; today's roll over if passed.
            let at = if meal.date == today {
                next_occurrence(time, now)
            } else {
                time.on(meal.date)
            };
            let request = Reminder {
                category: Category::Meal,
                entity_id: &meal.id,
                at,
                repeats: false,
                title: "🍽️ Meal Reminder",
                body: format!("Don't forget: {}", meal.name),
                fields: vec![("mealId", meal.id.clone()), ("mealName", meal.name.clone())],
            }
            .into_request(settings);
            self.submit(request, &mut report);
        }

        Self::log_report(Category::Meal, &report);
        report
    }

    // --- Workouts ---

    pub fn schedule_workout_notifications(&mut self) -> ScheduleReport {
        self.schedule_workout_notifications_at(now_local())
    }

    pub fn schedule_workout_notifications_at(&mut self, now: NaiveDateTime) -> ScheduleReport {
        match self.load_settings() {
            Some(settings) => self.schedule_workouts_with(&settings, now),
            None => ScheduleReport::default(),
        }
    }

    fn schedule_workouts_with(
        &mut self,
        settings: &NotificationSettings,
        now: NaiveDateTime,
    ) -> ScheduleReport {
        if let Some(report) = self.gate(Category::Workout, settings) {
            return report;
        }

        let weekday = now.weekday();
        let planned = match self.db.get_weekly_plan() {
            Ok(plan) => plan.day(weekday).map(|d| d.entries(weekday)).unwrap_or_default(),
            Err(e) => {
                error!("Failed to read weekly plan: {e:#}");
                return ScheduleReport::default();
            }
        };

        let mut report = ScheduleReport {
            cancelled: self.cancel_notifications_by_type(Category::Workout),
            ..ScheduleReport::default()
        };

        for entry in planned.iter().filter(|e| e.category() == Category::Workout) {
            let Some(time) = entry.reminder_time() else {
                report.skip(&entry.id);
                continue;
            };
            let request = Reminder {
                category: Category::Workout,
                entity_id: &entry.id,
                at: next_occurrence(time, now),
                repeats: false,
                title: "💪 Workout Time!",
                body: format!("Time for {}", entry.name),
                fields: vec![
                    ("workoutId", entry.id.clone()),
                    ("workoutName", entry.name.clone()),
                ],
            }
            .into_request(settings);
            self.submit(request, &mut report);
        }

        Self::log_report(Category::Workout, &report);
        report
    }

    // --- Sleep ---

    pub fn schedule_sleep_notifications(&mut self) -> ScheduleReport {
        self.schedule_sleep_notifications_at(now_local())
    }

    pub fn schedule_sleep_notifications_at(&mut self, now: NaiveDateTime) -> ScheduleReport {
        match self.load_settings() {
            Some(settings) => self.schedule_sleep_with(&settings, now),
            None => ScheduleReport::default(),
        }
    }

    /// Bedtime from the sleep settings, falling back to today's plan.
    fn configured_bedtime(&self, now: NaiveDateTime) -> anyhow::Result<Option<String>> {
        let from_settings = self
            .db
            .get_sleep_settings()?
            .bedtime
            .filter(|b| !b.trim().is_empty());
        if from_settings.is_some() {
            return Ok(from_settings);
        }
        let plan = self.db.get_weekly_plan()?;
        Ok(plan
            .day(now.weekday())
            .map(|d| d.sleep.bedtime.clone())
            .filter(|b| !b.trim().is_empty()))
    }

    fn schedule_sleep_with(
        &mut self,
        settings: &NotificationSettings,
        now: NaiveDateTime,
    ) -> ScheduleReport {
        if let Some(report) = self.gate(Category::Sleep, settings) {
            return report;
        }

        let bedtime = match self.configured_bedtime(now) {
            Ok(bedtime) => bedtime,
            Err(e) => {
                error!("Failed to read sleep settings: {e:#}");
                return ScheduleReport::default();
            }
        };

        let mut report = ScheduleReport {
            cancelled: self.cancel_notifications_by_type(Category::Sleep),
            ..ScheduleReport::default()
        };

        let Some(raw) = bedtime else {
            debug!("No bedtime configured; sleep reminders not scheduled");
            return report;
        };
        let Ok(bedtime) = TimeOfDay::parse(&raw) else {
            report.skip("bedtime");
            return report;
        };

        let bed_at = next_occurrence(bedtime, now);
        let wake_at = bed_at + Duration::hours(WAKEUP_OFFSET_HOURS);

        let bed = Reminder {
            category: Category::Sleep,
            entity_id: "bedtime",
            at: bed_at,
            repeats: true,
            title: "😴 Bedtime Reminder",
            body: "Time to prepare for sleep".to_string(),
            fields: vec![("action", "bedtime".to_string())],
        }
        .into_request(settings);
        self.submit(bed, &mut report);

        let wake = Reminder {
            category: Category::Sleep,
            entity_id: "wakeup",
            at: wake_at,
            repeats: true,
            title: "🌅 Good Morning!",
            body: "Time to start your day".to_string(),
            fields: vec![("action", "wakeup".to_string())],
        }
        .into_request(settings);
        self.submit(wake, &mut report);

        Self::log_report(Category::Sleep, &report);
        report
    }

    // --- Daily summary ---

    pub fn schedule_daily_summary(&mut self) -> ScheduleReport {
        self.schedule_daily_summary_at(now_local())
    }

    pub fn schedule_daily_summary_at(&mut self, now: NaiveDateTime) -> ScheduleReport {
        match self.load_settings() {
            Some(settings) => self.schedule_summary_with(&settings, now),
            None => ScheduleReport::default(),
        }
    }

    fn schedule_summary_with(
        &mut self,
        settings: &NotificationSettings,
        now: NaiveDateTime,
    ) -> ScheduleReport {
        if let Some(report) = self.gate(Category::Summary, settings) {
            return report;
        }

        let mut report = ScheduleReport {
            cancelled: self.cancel_notifications_by_type(Category::Summary),
            ..ScheduleReport::default()
        };

        let Some(summary_time) = TimeOfDay::from_hm(DAILY_SUMMARY_HOUR, 0) else {
            return report;
        };
        let request = Reminder {
            category: Category::Summary,
            entity_id: "daily",
            at: next_occurrence(summary_time, now),
            repeats: true,
            title: "📊 Daily Summary",
            body: "Check your progress for today".to_string(),
            fields: Vec::new(),
        }
        .into_request(settings);
        self.submit(request, &mut report);

        Self::log_report(Category::Summary, &report);
        report
    }

    // --- Composite passes ---

    pub fn schedule_daily_notifications(&mut self) -> ScheduleReport {
        self.schedule_daily_notifications_at(now_local())
    }

    pub fn schedule_daily_notifications_at(&mut self, now: NaiveDateTime) -> ScheduleReport {
        match self.load_settings() {
            Some(settings) => self.schedule_all_with(&settings, now),
            None => ScheduleReport::default(),
        }
    }

    fn schedule_all_with(
        &mut self,
        settings: &NotificationSettings,
        now: NaiveDateTime,
    ) -> ScheduleReport {
        let mut report = self.schedule_meals_with(settings, now);
        report += self.schedule_workouts_with(settings, now);
        report += self.schedule_sleep_with(settings, now);
        report += self.schedule_summary_with(settings, now);
        report
    }

    /// Run the daily pass unless it already ran today. `None` when skipped.
    pub fn schedule_daily_if_due(&mut self) -> Option<ScheduleReport> {
        self.schedule_daily_if_due_at(now_local())
    }

    pub fn schedule_daily_if_due_at(&mut self, now: NaiveDateTime) -> Option<ScheduleReport> {
        if self.session == Session::PermissionDenied {
            return None;
        }
        let today = now.date();
        match self.db.get_last_notification_schedule() {
            Ok(Some(last)) if last == today => {
                debug!("Daily notifications already scheduled for {today}");
                return None;
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read last schedule date, scheduling anyway: {e:#}"),
        }

        let report = self.schedule_daily_notifications_at(now);
        if let Err(e) = self.db.set_last_notification_schedule(today) {
            warn!("Failed to record schedule date: {e:#}");
        }
        info!(
            "Daily notifications scheduled for {today}: {} scheduled, {} failed",
            report.scheduled, report.failed
        );
        Some(report)
    }

    /// Persist `settings` and bring the platform queue in line with them.
    pub fn apply_settings(&mut self, settings: &NotificationSettings) -> ScheduleReport {
        self.apply_settings_at(settings, now_local())
    }

    pub fn apply_settings_at(
        &mut self,
        settings: &NotificationSettings,
        now: NaiveDateTime,
    ) -> ScheduleReport {
        if let Err(e) = self.db.save_notification_settings(settings) {
            error!("Failed to save notification settings: {e:#}");
        }
        if !settings.global_enabled {
            let cancelled = self.cancel_all_notifications();
            info!("Notifications disabled; cleared {cancelled} scheduled");
            return ScheduleReport {
                cancelled,
                ..ScheduleReport::default()
            };
        }
        self.schedule_all_with(settings, now)
    }

    // --- Cancellation and queries ---

    /// Cancel every scheduled notification whose payload `type` is `category`.
    /// Returns how many were cancelled.
    pub fn cancel_notifications_by_type(&mut self, category: Category) -> usize {
        let scheduled = match self.platform.list_scheduled() {
            Ok(scheduled) => scheduled,
            Err(e) => {
                error!("Failed to cancel {category} notifications: {e}");
                return 0;
            }
        };

        let mut cancelled = 0;
        for request in scheduled.iter().filter(|r| r.is_category(category)) {
            match self.platform.cancel(&request.id) {
                Ok(()) => cancelled += 1,
                Err(e) => warn!("{e}"),
            }
        }
        debug!("Cancelled {cancelled} {category} notifications");
        cancelled
    }

    /// Clear the whole queue regardless of category. Returns how many were
    /// outstanding beforehand.
    pub fn cancel_all_notifications(&mut self) -> usize {
        let outstanding = self.platform.list_scheduled().map_or(0, |s| s.len());
        match self.platform.cancel_all() {
            Ok(()) => {
                info!("All notifications cancelled");
                outstanding
            }
            Err(e) => {
                error!("Failed to cancel all notifications: {e}");
                0
            }
        }
    }

    /// Deliver a notification right away, outside any category.
    pub fn send_immediate_notification(
        &mut self,
        title: &str,
        body: &str,
        data: Option<Map<String, Value>>,
    ) -> Option<String> {
        if self.session == Session::PermissionDenied {
            debug!("Permission denied; immediate notification dropped");
            return None;
        }
        let settings = self.load_settings().unwrap_or_default();
        let request = NotificationRequest {
            id: format!("immediate_{}", Uuid::new_v4()),
            title: title.to_string(),
            body: body.to_string(),
            payload: data.unwrap_or_default(),
            trigger: Trigger::Immediate,
            channel_id: DEFAULT_CHANNEL.to_string(),
            sound: settings.sound,
            vibrate: settings.vibration,
        };
        match self.platform.schedule(request) {
            Ok(id) => Some(id),
            Err(e) => {
                error!("Failed to send immediate notification: {e}");
                None
            }
        }
    }

    /// The platform's current queue.
    pub fn scheduled_notifications(&self) -> Vec<NotificationRequest> {
        self.platform.list_scheduled().unwrap_or_else(|e| {
            error!("Failed to get scheduled notifications: {e}");
            Vec::new()
        })
    }
}
