use crate::models::{Appointment, AppointmentStatus};

/// Names shown alongside an appointment in calendar exports.
#[derive(Debug, Clone)]
pub struct CalendarLabels<'a> {
    pub business_name: &'a str,
    pub room_name: &'a str,
    pub staff_name: &'a str,
}

pub fn generate_ics(appointment: &Appointment, labels: &CalendarLabels<'_>) -> String {
    let day = appointment.booking_date.format("%Y%m%d");
    let start = appointment.interval.start;
    let end = appointment.interval.end;
    let dtstart = format!("{day}T{:02}{:02}00", start.hour(), start.minute());
    let dtend = format!("{day}T{:02}{:02}00", end.hour(), end.minute());
    let dtstamp = appointment.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@spabook", appointment.id);

    let summary = escape_text(&format!("Spa appointment at {}", labels.business_name));
    let mut description = format!(
        "Room: {}\\nTherapist: {}\\nGuests: {}",
        escape_text(labels.room_name),
        escape_text(labels.staff_name),
        appointment.party_size
    );
    if let Some(note) = appointment.note.as_deref().filter(|n| !n.trim().is_empty()) {
        description.push_str("\\n");
        description.push_str(&escape_text(note));
    }
    let status = match appointment.status {
        AppointmentStatus::Cancelled => "CANCELLED",
        _ => "CONFIRMED",
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Spabook//Scheduling//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

/// RFC 5545 TEXT escaping.
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::models::{AppointmentStatus, Interval, RoomId, StaffId, TimeOfDay};

    fn appointment(note: Option<&str>, status: AppointmentStatus) -> Appointment {
        let created =
            NaiveDateTime::parse_from_str("2025-06-10 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        Appointment {
            id: "appt-123".to_string(),
            customer_name: "Alice".to_string(),
            customer_phone: "+84900000001".to_string(),
            room_id: RoomId(1),
            staff_id: StaffId(2),
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            interval: Interval::new(
                TimeOfDay::parse("14:00").unwrap(),
                TimeOfDay::parse("15:30").unwrap(),
            )
            .unwrap(),
            party_size: 2,
            status,
            note: note.map(str::to_string),
            service_ids: vec![],
            created_at: created,
            updated_at: created,
        }
    }

    fn labels() -> CalendarLabels<'static> {
        CalendarLabels {
            business_name: "Lotus Spa",
            room_name: "Jasmine, upstairs",
            staff_name: "Mai",
        }
    }

    #[test]
    fn test_generate_ics() {
        let ics = generate_ics(&appointment(Some("Hot stone"), AppointmentStatus::Booked), &labels());
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("UID:appt-123@spabook"));
        assert!(ics.contains("DTSTAMP:20250610T100000"));
        assert!(ics.contains("DTSTART:20250616T140000"));
        assert!(ics.contains("DTEND:20250616T153000"));
        assert!(ics.contains("SUMMARY:Spa appointment at Lotus Spa"));
        assert!(ics.contains(
            "DESCRIPTION:Room: Jasmine\\, upstairs\\nTherapist: Mai\\nGuests: 2\\nHot stone"
        ));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_generate_ics_cancelled_without_note() {
        let ics = generate_ics(&appointment(None, AppointmentStatus::Cancelled), &labels());
        assert!(ics.contains("Guests: 2\r\n"));
        assert!(ics.contains("STATUS:CANCELLED"));
    }
}
