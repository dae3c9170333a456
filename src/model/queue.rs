use crate::model::run::TriggeredBy;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueItem {
    pub profile_id: i64,
    pub triggered_by: TriggeredBy,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub running: Vec<i64>,
    pub queued: Vec<i64>,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemTaskStatus {
    pub ssh: bool,
    pub samba: bool,
}
