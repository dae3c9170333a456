use crate::model::error::misc::MiscError;
use crate::model::profile::ScheduleFrequency;
use crate::model::run::{RunSnapshot, RunStatus};
use crate::platform::constants::{RETRY_BACKOFF_SECONDS, SCHEDULE_TIME_FORMAT};
use chrono::{
    DateTime, Days, Months, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc,
};

/// A daily wall-clock slot repeated at a fixed frequency, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub time: NaiveTime,
    pub frequency: ScheduleFrequency,
}

impl Schedule {
    pub fn parse(time: &str, frequency: ScheduleFrequency) -> Result<Self, MiscError> {
        let time = NaiveTime::parse_from_str(time.trim(), SCHEDULE_TIME_FORMAT)
            .map_err(|_| MiscError::InvalidScheduleTime(time))?;
        Ok(Self { time, frequency })
    }

    /// Minute granularity, seconds never matter.
    pub fn slot_reached<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        (now.hour(), now.minute()) >= (self.time.hour(), self.time.minute())
    }

    /// First slot after the one that produced a run started at `started`.
    pub fn next_slot_after(&self, started: NaiveDateTime) -> Option<NaiveDateTime> {
        let base = started.date().and_time(self.time);
        match self.frequency {
            ScheduleFrequency::Day => base.checked_add_days(Days::new(1)),
            ScheduleFrequency::Week => base.checked_add_days(Days::new(7)),
            ScheduleFrequency::Month => base.checked_add_months(Months::new(1)),
            ScheduleFrequency::Year => base.checked_add_months(Months::new(12)),
        }
    }

    pub fn is_due<Tz: TimeZone>(&self, now: &DateTime<Tz>, last_run: Option<&RunSnapshot>) -> bool {
        if !self.slot_reached(now) {
            return false;
        }
        let Some(last_run) = last_run else {
            return true;
        };

        match last_run.status {
            RunStatus::Success => self.due_after_success(now, last_run),
            // Unfinished runs are never retried, finished failures after a back-off.
            RunStatus::Running | RunStatus::Failed => last_run.finished_at.is_some_and(|finished| {
                now.with_timezone(&Utc) - finished >= TimeDelta::seconds(RETRY_BACKOFF_SECONDS)
            }),
        }
    }

    fn due_after_success<Tz: TimeZone>(&self, now: &DateTime<Tz>, last_run: &RunSnapshot) -> bool {
        let now_local = now.naive_local();
        let started_local = last_run.started_at.with_timezone(&now.timezone()).naive_local();

        // Started earlier today but before the slot, today's slot is still unconsumed.
        let slot_minutes = (self.time.hour(), self.time.minute());
        if started_local.date() == now_local.date()
            && (started_local.hour(), started_local.minute()) < slot_minutes
        {
            return true;
        }

        self.next_slot_after(started_local)
            .is_none_or(|next_slot| now_local >= next_slot)
    }
}
