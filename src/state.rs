use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::repository::SqliteRepository;
use crate::services::booking::BookingService;
use crate::services::scheduling::{SchedulingSettings, StaffPicker};

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub repository: SqliteRepository,
    pub scheduling: SchedulingSettings,
    pub staff_picker: Box<dyn StaffPicker>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig, staff_picker: Box<dyn StaffPicker>) -> Self {
        let db = Arc::new(Mutex::new(conn));
        Self {
            repository: SqliteRepository::new(db.clone()),
            scheduling: config.scheduling(),
            db,
            config,
            staff_picker,
        }
    }

    pub fn bookings(&self) -> BookingService<'_> {
        BookingService::new(&self.repository, &self.scheduling, self.staff_picker.as_ref())
    }
}
