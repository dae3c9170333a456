pub mod profile;
pub mod run;
pub mod setting;
pub mod system_run;
