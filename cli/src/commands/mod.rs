mod done;
mod helpers;
mod meal;
mod notify;
mod plan;
mod sleep;

use vitalflow_core::scheduler::NotificationScheduler;

use crate::platform::FilePlatform;

pub(crate) type Scheduler<'db> = NotificationScheduler<'db, FilePlatform>;

pub(crate) use done::cmd_done;
pub(crate) use meal::{cmd_meal_add, cmd_meal_delete, cmd_meal_edit, cmd_meal_list};
pub(crate) use notify::{
    cmd_notify_cancel, cmd_notify_cancel_all, cmd_notify_fire, cmd_notify_init, cmd_notify_list,
    cmd_notify_schedule, cmd_notify_settings, cmd_notify_test,
};
pub(crate) use plan::{DayPlanEdit, cmd_plan_reset, cmd_plan_set, cmd_plan_show};
pub(crate) use sleep::{
    cmd_sleep_delete, cmd_sleep_edit, cmd_sleep_list, cmd_sleep_log, cmd_sleep_settings,
};

#[cfg(test)]
pub(crate) mod testing {
    use vitalflow_core::db::Database;
    use vitalflow_core::models::Category;
    use vitalflow_core::notify::NotificationRequest;

    use super::Scheduler;
    use crate::platform::FilePlatform;

    /// An initialized scheduler whose queue file lives in `dir`.
    pub(crate) fn scheduler<'db>(db: &'db Database, dir: &tempfile::TempDir) -> Scheduler<'db> {
        let platform = FilePlatform::open(&dir.path().join("notifications.json")).unwrap();
        let mut scheduler = Scheduler::new(db, platform);
        scheduler.initialize();
        scheduler
    }

    pub(crate) fn queued(scheduler: &Scheduler<'_>, category: Category) -> Vec<NotificationRequest> {
        scheduler
            .scheduled_notifications()
            .into_iter()
            .filter(|r| r.is_category(category))
            .collect()
    }

    /// `HH:MM` of the request's first firing.
    pub(crate) fn fires_at(request: &NotificationRequest) -> String {
        request
            .trigger
            .anchor()
            .map(|a| a.format("%H:%M").to_string())
            .unwrap_or_default()
    }

    pub(crate) fn payload_str<'a>(request: &'a NotificationRequest, key: &str) -> &'a str {
        request.payload.get(key).and_then(|v| v.as_str()).unwrap_or_default()
    }
}
