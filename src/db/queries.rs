use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Appointment, Mode, NewAppointment, Priority, Session, Slot, TimeOfDay, Urgency,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Slots ──

pub fn delete_all_slots(conn: &Connection) -> anyhow::Result<usize> {
    let count = conn.execute("DELETE FROM available_slots", [])?;
    Ok(count)
}

pub fn insert_slots(
    conn: &Connection,
    slots: &[(String, String, Priority, Mode)],
) -> anyhow::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO available_slots (clinic, time, priority, mode_of_consultation, is_booked)
         VALUES (?1, ?2, ?3, ?4, 0)",
    )?;
    for (clinic, time, priority, mode) in slots {
        stmt.execute(params![clinic, time, priority.as_str(), mode.as_str()])?;
    }
    Ok(slots.len())
}

pub fn count_slots(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM available_slots", [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

pub fn list_slots(conn: &Connection) -> anyhow::Result<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic, time, priority, mode_of_consultation, is_booked
         FROM available_slots ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_slot_row(row)))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row??);
    }
    Ok(slots)
}

pub fn get_slot(conn: &Connection, id: i64) -> anyhow::Result<Option<Slot>> {
    let result = conn
        .query_row(
            "SELECT id, clinic, time, priority, mode_of_consultation, is_booked
             FROM available_slots WHERE id = ?1",
            params![id],
            |row| Ok(parse_slot_row(row)),
        )
        .optional()?;

    result.transpose()
}

/// Looks up unbooked slots one time tick at a time and concatenates the
/// results in the order of `times`.
pub fn find_unbooked_slots(
    conn: &Connection,
    clinic: &str,
    times: &[String],
    mode: Mode,
    priority: Option<Priority>,
) -> anyhow::Result<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic, time, priority, mode_of_consultation, is_booked
         FROM available_slots
         WHERE clinic = ?1 AND time = ?2 AND mode_of_consultation = ?3
           AND (?4 IS NULL OR priority = ?4)
           AND is_booked = 0
         ORDER BY id ASC",
    )?;

    let priority = priority.map(|p| p.as_str());
    let mut slots = vec![];
    for time in times {
        let rows = stmt.query_map(params![clinic, time, mode.as_str(), priority], |row| {
            Ok(parse_slot_row(row))
        })?;
        for row in rows {
            slots.push(row??);
        }
    }
    Ok(slots)
}

/// Flips `is_booked` only if the slot is still free. Returns whether a row
/// changed.
pub fn mark_slot_booked(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE available_slots SET is_booked = 1 WHERE id = ?1 AND is_booked = 0",
        params![id],
    )?;
    Ok(count > 0)
}

fn parse_slot_row(row: &rusqlite::Row) -> anyhow::Result<Slot> {
    let priority_str: String = row.get(3)?;
    let mode_str: String = row.get(4)?;

    Ok(Slot {
        id: row.get(0)?,
        clinic: row.get(1)?,
        time: row.get(2)?,
        priority: Priority::parse(&priority_str)
            .ok_or_else(|| anyhow::anyhow!("unknown priority in slot row: {priority_str}"))?,
        mode: Mode::parse(&mode_str)
            .ok_or_else(|| anyhow::anyhow!("unknown mode in slot row: {mode_str}"))?,
        is_booked: row.get::<_, i32>(5)? != 0,
    })
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appt: &NewAppointment) -> anyhow::Result<i64> {
    let created_at = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let date_of_birth = appt.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string());

    conn.execute(
        "INSERT INTO appointments (name, priority, clinic, time_preference, mode_of_consultation,
            phone_number, symptoms_summary, severity_classification, date_of_birth, has_symptoms,
            emergency_contraception, needs_translator, translator_language, slot_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            appt.name,
            appt.priority.as_str(),
            appt.clinic,
            appt.time_preference.as_str(),
            appt.mode.as_str(),
            appt.phone_number,
            appt.symptoms_summary,
            appt.severity_classification.as_str(),
            date_of_birth,
            appt.has_symptoms,
            appt.emergency_contraception,
            appt.needs_translator,
            appt.translator_language,
            appt.slot_id,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const APPOINTMENT_COLUMNS: &str = "id, name, priority, clinic, time_preference, mode_of_consultation, \
     phone_number, symptoms_summary, severity_classification, date_of_birth, has_symptoms, \
     emergency_contraception, needs_translator, translator_language, slot_id, created_at";

pub fn get_appointment(conn: &Connection, id: i64) -> anyhow::Result<Option<Appointment>> {
    let result = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            |row| Ok(parse_appointment_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn list_appointments(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY id DESC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let priority_str: String = row.get(2)?;
    let time_preference: String = row.get(4)?;
    let mode_str: String = row.get(5)?;
    let severity: String = row.get(8)?;
    let date_of_birth: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(15)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Appointment {
        id: row.get(0)?,
        details: NewAppointment {
            name: row.get(1)?,
            priority: Priority::parse(&priority_str)
                .ok_or_else(|| anyhow::anyhow!("unknown priority in appointment: {priority_str}"))?,
            clinic: row.get(3)?,
            time_preference: TimeOfDay::parse(&time_preference),
            mode: Mode::parse(&mode_str)
                .ok_or_else(|| anyhow::anyhow!("unknown mode in appointment: {mode_str}"))?,
            phone_number: row.get(6)?,
            symptoms_summary: row.get(7)?,
            severity_classification: if severity == "urgent" {
                Urgency::Urgent
            } else {
                Urgency::Routine
            },
            date_of_birth: date_of_birth
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            has_symptoms: row.get(10)?,
            emergency_contraception: row.get(11)?,
            needs_translator: row.get(12)?,
            translator_language: row.get(13)?,
            slot_id: row.get(14)?,
        },
        created_at,
    })
}

// ── Sessions ──

pub fn get_session(conn: &Connection, id: &str) -> anyhow::Result<Option<Session>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM sessions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match data {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    let data = serde_json::to_string(session)?;
    let created_at = session.created_at.format(TIMESTAMP_FORMAT).to_string();
    let updated_at = session.updated_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO sessions (id, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           data = excluded.data,
           updated_at = excluded.updated_at",
        params![session.id, data, created_at, updated_at],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn sample_appointment(slot_id: i64) -> NewAppointment {
        NewAppointment {
            name: "Alex Smith".to_string(),
            priority: Priority::RoutineSymptoms,
            clinic: "Clinic A".to_string(),
            time_preference: TimeOfDay::Evening,
            mode: Mode::Telephone,
            phone_number: Some("07700900123".to_string()),
            symptoms_summary: "Name: Alex Smith".to_string(),
            severity_classification: Urgency::Routine,
            date_of_birth: NaiveDate::from_ymd_opt(1992, 3, 14),
            has_symptoms: Some(true),
            emergency_contraception: Some(false),
            needs_translator: Some(false),
            translator_language: None,
            slot_id,
        }
    }

    #[test]
    fn test_appointment_round_trip() {
        let conn = setup_db();
        let id = create_appointment(&conn, &sample_appointment(42)).unwrap();

        let loaded = get_appointment(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.details, sample_appointment(42));
        assert!(get_appointment(&conn, id + 1).unwrap().is_none());
        assert_eq!(list_appointments(&conn, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_conditional_booking_update() {
        let conn = setup_db();
        insert_slots(
            &conn,
            &[(
                "Clinic A".to_string(),
                "09:00".to_string(),
                Priority::High,
                Mode::Telephone,
            )],
        )
        .unwrap();
        let slot = list_slots(&conn).unwrap().remove(0);

        assert!(mark_slot_booked(&conn, slot.id).unwrap());
        assert!(!mark_slot_booked(&conn, slot.id).unwrap());
        assert!(get_slot(&conn, slot.id).unwrap().unwrap().is_booked);
    }

    #[test]
    fn test_priority_filter_is_optional() {
        let conn = setup_db();
        insert_slots(
            &conn,
            &[
                ("Clinic A".to_string(), "09:00".to_string(), Priority::High, Mode::Telephone),
                ("Clinic A".to_string(), "09:00".to_string(), Priority::Low, Mode::Telephone),
            ],
        )
        .unwrap();
        let times = vec!["09:00".to_string()];

        let any = find_unbooked_slots(&conn, "Clinic A", &times, Mode::Telephone, None).unwrap();
        assert_eq!(any.len(), 2);

        let high = find_unbooked_slots(
            &conn,
            "Clinic A",
            &times,
            Mode::Telephone,
            Some(Priority::High),
        )
        .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].priority, Priority::High);
    }
}
