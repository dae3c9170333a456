pub const SCHEDULER_ENABLED: &str = "scheduler_enabled";
pub const SSH_CONFIG: &str = "ssh_config";
pub const SAMBA_CONFIG: &str = "samba_config";
pub const SSH_SCHEDULE_ENABLED: &str = "ssh_schedule_enabled";
pub const SSH_SCHEDULE_TIME: &str = "ssh_schedule_time";
pub const SSH_SCHEDULE_FREQUENCY: &str = "ssh_schedule_frequency";
pub const SSH_LAST_SCHEDULED_DATE: &str = "ssh_last_scheduled_date";

pub const ENABLED: &str = "1";
pub const DISABLED: &str = "0";

pub fn is_enabled(value: Option<&str>) -> bool {
    value.map(str::trim) == Some(ENABLED)
}
