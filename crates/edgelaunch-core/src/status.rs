use edgelaunch_types::{StatusAction, StatusNotice};

use crate::utils::now_millis;

const TITLE: &str = "edgelaunch";

/// Builds status notices, keeping the time of the first post so refreshes
/// do not reorder the indicator.
#[derive(Debug, Default)]
pub struct StatusBoard {
    posted_at_ms: Option<u64>,
}

impl StatusBoard {
    pub fn notice(&mut self, active: bool) -> StatusNotice {
        let posted_at_ms = *self.posted_at_ms.get_or_insert_with(now_millis);
        let (text, action) = if active {
            ("Swipe from the screen edge to open", StatusAction::Pause)
        } else {
            ("Paused", StatusAction::Play)
        };

        StatusNotice {
            active,
            title: TITLE.to_string(),
            text: text.to_string(),
            action,
            posted_at_ms,
        }
    }
}
