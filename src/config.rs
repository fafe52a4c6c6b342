use std::env;

use anyhow::Context;

use crate::models::{BusinessHours, TimeOfDay};
use crate::services::scheduling::SchedulingSettings;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub api_token: String,
    pub open_time: TimeOfDay,
    pub close_time: TimeOfDay,
    pub default_duration_minutes: u32,
    /// `random` or `lowest_id`.
    pub staff_selection: String,
    pub business_name: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let open_time = parse_time_var("OPEN_TIME", "08:00:00")?;
        let close_time = parse_time_var("CLOSE_TIME", "21:00:00")?;
        anyhow::ensure!(
            open_time < close_time,
            "OPEN_TIME ({open_time}) must be before CLOSE_TIME ({close_time})"
        );

        let default_duration_minutes = match env::var("DEFAULT_DURATION_MINUTES") {
            Ok(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|m| *m > 0)
                .with_context(|| format!("DEFAULT_DURATION_MINUTES must be a positive integer, got {v:?}"))?,
            Err(_) => 60,
        };

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "spabook.db".to_string()),
            api_token: env::var("API_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            open_time,
            close_time,
            default_duration_minutes,
            staff_selection: env::var("STAFF_SELECTION").unwrap_or_else(|_| "random".to_string()),
            business_name: env::var("BUSINESS_NAME").unwrap_or_else(|_| "Spa".to_string()),
        })
    }

    pub fn scheduling(&self) -> SchedulingSettings {
        SchedulingSettings {
            hours: BusinessHours::new(self.open_time, self.close_time),
            default_duration_minutes: self.default_duration_minutes,
        }
    }
}

fn parse_time_var(name: &str, default: &str) -> anyhow::Result<TimeOfDay> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    TimeOfDay::parse(raw.trim()).with_context(|| format!("{name} is not a valid time: {raw:?}"))
}
