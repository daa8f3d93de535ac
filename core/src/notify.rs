//! Host notification platform abstraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::Category;
use crate::trigger::Trigger;

/// Failures reported by (or about) the notification platform.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification permission was not granted")]
    PermissionDenied,

    #[error("Failed to schedule notification '{id}': {reason}")]
    Schedule { id: String, reason: String },

    #[error("Failed to cancel notification '{id}': {reason}")]
    Cancel { id: String, reason: String },

    #[error("Notification platform error: {0}")]
    Platform(String),

    #[error("Skipped malformed reminder entry '{0}'")]
    MalformedEntry(String),
}

pub type Result<T, E = NotifyError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Max,
    High,
    Medium,
}

/// Delivery channel (Android notification channel, or the equivalent grouping
/// on other hosts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub vibration_pattern: Vec<u32>,
    pub light_color: String,
}

pub const DEFAULT_CHANNEL: &str = "default";

fn channel(id: &str, name: &str, importance: Importance, pattern: &[u32], color: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: name.to_string(),
        importance,
        vibration_pattern: pattern.to_vec(),
        light_color: color.to_string(),
    }
}

/// Channels configured once at initialization.
#[must_use]
pub fn default_channels() -> Vec<Channel> {
    vec![
        channel(DEFAULT_CHANNEL, "default", Importance::Max, &[0, 250, 250, 250], "#FF231F7C"),
        channel("meals", "Meal Reminders", Importance::High, &[0, 250, 250, 250], "#00E676"),
        channel("workouts", "Workout Reminders", Importance::High, &[0, 500, 250, 500], "#FF5252"),
        channel("sleep", "Sleep Reminders", Importance::Medium, &[0, 250, 250, 250], "#2979FF"),
    ]
}

/// Channel a category's reminders are delivered on.
#[must_use]
pub fn channel_for(category: Category) -> &'static str {
    match category {
        Category::Meal => "meals",
        Category::Workout => "workouts",
        Category::Sleep => "sleep",
        Category::Summary => DEFAULT_CHANNEL,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    pub trigger: Trigger,
    pub channel_id: String,
    #[serde(default = "enabled")]
    pub sound: bool,
    #[serde(default = "enabled")]
    pub vibrate: bool,
}

fn enabled() -> bool {
    true
}

impl NotificationRequest {
    /// The payload's `type` tag.
    #[must_use]
    pub fn category_tag(&self) -> Option<&str> {
        self.payload.get("type").and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_category(&self, category: Category) -> bool {
        self.category_tag() == Some(category.as_str())
    }
}

/// Platform-native notification scheduler.
///
/// iOS implements this with `UNUserNotificationCenter`, Android with
/// `AlarmManager`, the CLI with a JSON queue on disk. The scheduler never
/// keeps its own copy of what is scheduled; `list_scheduled` is the truth.
pub trait NotificationPlatform {
    fn permission_status(&self) -> Result<Permission>;
    fn request_permission(&mut self) -> Result<Permission>;
    fn create_channel(&mut self, channel: &Channel) -> Result<()>;
    /// Register `request`, replacing any request with the same id.
    fn schedule(&mut self, request: NotificationRequest) -> Result<String>;
    fn cancel(&mut self, id: &str) -> Result<()>;
    fn list_scheduled(&self) -> Result<Vec<NotificationRequest>>;
    fn cancel_all(&mut self) -> Result<()>;
}

/// In-process platform. Immediate requests are recorded as delivered rather
/// than queued.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    permission: Permission,
    grant_on_request: bool,
    channels: Vec<Channel>,
    scheduled: BTreeMap<String, NotificationRequest>,
    delivered: Vec<NotificationRequest>,
}

impl MemoryPlatform {
    /// A platform that grants permission when asked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grant_on_request: true,
            ..Self::default()
        }
    }

    /// A platform whose user refuses the permission prompt.
    #[must_use]
    pub fn denying() -> Self {
        Self {
            grant_on_request: false,
            ..Self::default()
        }
    }

    pub fn set_grant_on_request(&mut self, grant: bool) {
        self.grant_on_request = grant;
    }

    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[must_use]
    pub fn delivered(&self) -> &[NotificationRequest] {
        &self.delivered
    }

    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NotificationRequest> {
        self.scheduled.get(id)
    }
}

impl NotificationPlatform for MemoryPlatform {
    fn permission_status(&self) -> Result<Permission> {
        Ok(self.permission)
    }

    fn request_permission(&mut self) -> Result<Permission> {
        self.permission = if self.grant_on_request {
            Permission::Granted
        } else {
            Permission::Denied
        };
        Ok(self.permission)
    }

    fn create_channel(&mut self, channel: &Channel) -> Result<()> {
        self.channels.retain(|c| c.id != channel.id);
        self.channels.push(channel.clone());
        Ok(())
    }

    fn schedule(&mut self, request: NotificationRequest) -> Result<String> {
        let id = request.id.clone();
        if request.trigger == Trigger::Immediate {
            self.delivered.push(request);
        } else {
            self.scheduled.insert(id.clone(), request);
        }
        Ok(id)
    }

    fn cancel(&mut self, id: &str) -> Result<()> {
        self.scheduled.remove(id);
        Ok(())
    }

    fn list_scheduled(&self) -> Result<Vec<NotificationRequest>> {
        Ok(self.scheduled.values().cloned().collect())
    }

    fn cancel_all(&mut self) -> Result<()> {
        self.scheduled.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn request(id: &str, category: Category) -> NotificationRequest {
        let at = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let Value::Object(payload) = json!({ "type": category.as_str() }) else {
            unreachable!()
        };
        NotificationRequest {
            id: id.to_string(),
            title: "Title".to_string(),
            body: "Body".to_string(),
            payload,
            trigger: Trigger::Once { at },
            channel_id: channel_for(category).to_string(),
            sound: true,
            vibrate: true,
        }
    }

    #[test]
    fn test_default_channels() {
        let channels = default_channels();
        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["default", "meals", "workouts", "sleep"]);
        assert_eq!(channels[2].vibration_pattern, vec![0, 500, 250, 500]);
        assert_eq!(channels[3].importance, Importance::Medium);
    }

    #[test]
    fn test_request_category_tag() {
        let req = request("meal_1", Category::Meal);
        assert_eq!(req.category_tag(), Some("meal"));
        assert!(req.is_category(Category::Meal));
        assert!(!req.is_category(Category::Sleep));

        let mut untagged = req.clone();
        untagged.payload.clear();
        assert!(untagged.category_tag().is_none());
    }

    #[test]
    fn test_memory_platform_permission() {
        let mut granting = MemoryPlatform::new();
        assert_eq!(granting.permission_status().unwrap(), Permission::Undetermined);
        assert_eq!(granting.request_permission().unwrap(), Permission::Granted);

        let mut denying = MemoryPlatform::denying();
        assert_eq!(denying.request_permission().unwrap(), Permission::Denied);
        assert_eq!(denying.permission_status().unwrap(), Permission::Denied);
    }

    #[test]
    fn test_memory_platform_schedule_replaces_same_id() {
        let mut platform = MemoryPlatform::new();
        platform.schedule(request("a", Category::Meal)).unwrap();
        let mut again = request("a", Category::Meal);
        again.title = "Updated".to_string();
        platform.schedule(again).unwrap();

        assert_eq!(platform.scheduled_count(), 1);
        assert_eq!(platform.get("a").unwrap().title, "Updated");
    }

    #[test]
    fn test_memory_platform_cancel_and_clear() {
        let mut platform = MemoryPlatform::new();
        platform.schedule(request("a", Category::Meal)).unwrap();
        platform.schedule(request("b", Category::Sleep)).unwrap();

        platform.cancel("a").unwrap();
        let ids: Vec<String> = platform
            .list_scheduled()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b"]);

        platform.cancel_all().unwrap();
        assert_eq!(platform.scheduled_count(), 0);
    }

    #[test]
    fn test_memory_platform_immediate_is_delivered() {
        let mut platform = MemoryPlatform::new();
        let mut req = request("now", Category::Summary);
        req.trigger = Trigger::Immediate;
        platform.schedule(req).unwrap();

        assert_eq!(platform.scheduled_count(), 0);
        assert_eq!(platform.delivered().len(), 1);
    }

    #[test]
    fn test_create_channel_replaces_same_id() {
        let mut platform = MemoryPlatform::new();
        for c in default_channels() {
            platform.create_channel(&c).unwrap();
        }
        platform.create_channel(&default_channels()[1]).unwrap();
        assert_eq!(platform.channels().len(), 4);
    }
}
