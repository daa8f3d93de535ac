//! Notification platform backed by a JSON queue file.
//!
//! A terminal has no system notification center, so scheduled requests are
//! kept on disk and delivered by `vitalflow notify fire` (run it from cron or
//! a systemd timer).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

use vitalflow_core::notify::{
    Channel, NotificationPlatform, NotificationRequest, NotifyError, Permission, Result,
};
use vitalflow_core::trigger::Trigger;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct QueueFile {
    #[serde(default)]
    permission: Permission,
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    scheduled: BTreeMap<String, NotificationRequest>,
}

pub struct FilePlatform {
    path: PathBuf,
    queue: QueueFile,
    delivered: Vec<NotificationRequest>,
}

impl FilePlatform {
    /// Load the queue at `path`. A missing file is an empty queue.
    pub fn open(path: &Path) -> Result<Self> {
        let queue = match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                NotifyError::Platform(format!("Corrupt queue file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => QueueFile::default(),
            Err(e) => {
                return Err(NotifyError::Platform(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            queue,
            delivered: Vec::new(),
        })
    }

    /// Apply `change` to a copy of the queue. The copy replaces the
    /// in-memory queue only once it is written.
    fn commit(&mut self, change: impl FnOnce(&mut QueueFile)) -> Result<()> {
        let mut next = self.queue.clone();
        change(&mut next);
        let text =
            serde_json::to_string_pretty(&next).map_err(|e| NotifyError::Platform(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| {
            NotifyError::Platform(format!("Failed to write {}: {e}", self.path.display()))
        })?;
        self.queue = next;
        Ok(())
    }

    /// Requests delivered immediately during this process.
    pub fn delivered(&self) -> &[NotificationRequest] {
        &self.delivered
    }

    /// Take every request due at `now`. One-shots leave the queue; daily
    /// triggers move on to their next occurrence.
    pub fn deliver_due(&mut self, now: NaiveDateTime) -> Result<Vec<NotificationRequest>> {
        let due: Vec<NotificationRequest> = self
            .queue
            .scheduled
            .values()
            .filter(|r| r.trigger.anchor().is_some_and(|anchor| anchor <= now))
            .cloned()
            .collect();

        if !due.is_empty() {
            self.commit(|queue| {
                for request in &due {
                    match request.trigger.next_fire(now + Duration::seconds(1)) {
                        Some(next) if request.trigger.repeats() => {
                            if let Some(queued) = queue.scheduled.get_mut(&request.id) {
                                queued.trigger = Trigger::Daily { first: next };
                            }
                        }
                        _ => {
                            queue.scheduled.remove(&request.id);
                        }
                    }
                }
            })?;
        }
        debug!("Delivered {} due notifications", due.len());
        Ok(due)
    }
}

impl NotificationPlatform for FilePlatform {
    fn permission_status(&self) -> Result<Permission> {
        Ok(self.queue.permission)
    }

    fn request_permission(&mut self) -> Result<Permission> {
        self.commit(|queue| queue.permission = Permission::Granted)?;
        Ok(self.queue.permission)
    }

    fn create_channel(&mut self, channel: &Channel) -> Result<()> {
        if self.queue.channels.contains(channel) {
            return Ok(());
        }
        self.commit(|queue| {
            queue.channels.retain(|c| c.id != channel.id);
            queue.channels.push(channel.clone());
        })
    }

    fn schedule(&mut self, request: NotificationRequest) -> Result<String> {
        let id = request.id.clone();
        if request.trigger == Trigger::Immediate {
            self.delivered.push(request);
            return Ok(id);
        }
        self.commit(|queue| {
            queue.scheduled.insert(request.id.clone(), request);
        })
        .map_err(|e| NotifyError::Schedule {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        Ok(id)
    }

    fn cancel(&mut self, id: &str) -> Result<()> {
        if !self.queue.scheduled.contains_key(id) {
            return Ok(());
        }
        self.commit(|queue| {
            queue.scheduled.remove(id);
        })
        .map_err(|e| NotifyError::Cancel {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }

    fn list_scheduled(&self) -> Result<Vec<NotificationRequest>> {
        Ok(self.queue.scheduled.values().cloned().collect())
    }

    fn cancel_all(&mut self) -> Result<()> {
        self.commit(|queue| queue.scheduled.clear())
    }
}
