use rusqlite::Connection;

use crate::db::queries;
use crate::models::{format_minute, Mode, NewAppointment, Priority, Slot, TimeOfDay};

const TICK_MINUTES: u32 = 15;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("slot {0} is no longer available")]
    SlotUnavailable(i64),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for BookingError {
    fn from(e: rusqlite::Error) -> Self {
        BookingError::Database(e.into())
    }
}

#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub clinic: String,
    pub time_of_day: TimeOfDay,
    pub mode: Mode,
    /// Only set for deployments that key bookings by triage priority.
    pub priority: Option<Priority>,
}

pub fn tick_times(time_of_day: TimeOfDay) -> Vec<String> {
    let (start_hour, end_hour) = time_of_day.hour_range();
    (start_hour * 60..end_hour * 60)
        .step_by(TICK_MINUTES as usize)
        .map(format_minute)
        .collect()
}

/// Unbooked slots matching the query, earliest tick first. An empty result
/// means no slots; the search is never widened.
pub fn find_available_slots(conn: &Connection, query: &SlotQuery) -> anyhow::Result<Vec<Slot>> {
    let times = tick_times(query.time_of_day);
    queries::find_unbooked_slots(conn, &query.clinic, &times, query.mode, query.priority)
}

pub fn book(conn: &Connection, slot_id: i64) -> Result<(), BookingError> {
    if !queries::mark_slot_booked(conn, slot_id)? {
        tracing::warn!(slot_id, "slot already booked or missing");
        return Err(BookingError::SlotUnavailable(slot_id));
    }
    tracing::info!(slot_id, "slot booked");
    Ok(())
}

/// Books the slot and records the appointment atomically. If the slot was
/// taken in the meantime nothing is written.
pub fn book_appointment(
    conn: &Connection,
    appointment: &NewAppointment,
) -> Result<i64, BookingError> {
    let tx = conn.unchecked_transaction()?;
    book(&tx, appointment.slot_id)?;
    let id = queries::create_appointment(&tx, appointment)?;
    tx.commit()?;
    Ok(id)
}
