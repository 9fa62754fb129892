/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;

pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CONTACT: &str = "contact";

/// A notification for the host to display, shaped like the options of
/// `showNotification()` so it can be passed to a page as JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// Build the notification shown for a push message.
/// An empty or missing payload gets the default body.
pub fn push_notification(
    config: &NotificationConfig,
    payload: Option<&str>,
    date_of_arrival: i64,
) -> Notification {
    let body = match payload {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => config.default_body.clone(),
    };

    Notification {
        title: config.title.clone(),
        body,
        icon: config.icon.clone(),
        badge: config.badge.clone(),
        vibrate: config.vibrate.clone(),
        data: NotificationData {
            date_of_arrival,
            primary_key: 1,
        },
        actions: vec![
            NotificationAction {
                action: ACTION_EXPLORE.to_string(),
                title: config.explore_title.clone(),
                icon: config.action_icon.clone(),
            },
            NotificationAction {
                action: ACTION_CONTACT.to_string(),
                title: config.contact_title.clone(),
                icon: config.action_icon.clone(),
            },
        ],
    }
}

/// The URL to open when a notification is clicked
pub fn click_target<'a>(config: &'a NotificationConfig, action: Option<&str>) -> &'a str {
    match action {
        Some(ACTION_EXPLORE) => &config.explore_url,
        Some(ACTION_CONTACT) => &config.contact_url,
        _ => &config.default_url,
    }
}
