use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::Serialize;

use crate::types::{Booking, BookingStatus};

/// Display name stored on and shown for closed slots.
pub const CLOSED_LABEL: &str = "Fechado";

pub const SLOT_TAKEN_MESSAGE: &str = "Este horário já foi agendado ou fechado.";

/// Upper bound for a resource's `min_agendamento_dias`.
pub const MAX_ADVANCE_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Open,
    Booked,
    Closed,
}

impl SlotState {
    #[must_use]
    pub fn of(booking: Option<&Booking>) -> SlotState {
        match booking.map(|b| b.status) {
            None => SlotState::Open,
            Some(BookingStatus::Booked) => SlotState::Booked,
            Some(BookingStatus::Closed) => SlotState::Closed,
        }
    }
}

/// The server's local calendar date.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Values outside `0..=MAX_ADVANCE_DAYS` are clamped; saturates at `NaiveDate::MAX`.
#[must_use]
pub fn earliest_booking_date(today: NaiveDate, min_days: i64) -> NaiveDate {
    today
        .checked_add_signed(Duration::days(min_days.clamp(0, MAX_ADVANCE_DAYS)))
        .unwrap_or(NaiveDate::MAX)
}

/// Admins book any date; everyone else must respect the resource's advance window.
///
/// On rejection returns the earliest date the actor may book.
pub fn check_advance(
    today: NaiveDate,
    date: NaiveDate,
    min_days: i64,
    actor_is_admin: bool,
) -> Result<(), NaiveDate> {
    if actor_is_admin {
        return Ok(());
    }
    let earliest = earliest_booking_date(today, min_days);
    if date < earliest {
        return Err(earliest);
    }
    Ok(())
}

#[must_use]
pub fn can_remove(actor_id: &str, actor_is_admin: bool, booking: &Booking) -> bool {
    actor_is_admin || booking.usuario_id == actor_id
}

/// Weekends open the agenda on the following Monday.
#[must_use]
pub fn initial_agenda_date(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        Weekday::Sat => today + Duration::days(2),
        Weekday::Sun => today + Duration::days(1),
        _ => today,
    }
}

#[must_use]
pub fn weekday_pt(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::Shift;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn booking(usuario_id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: "b1".to_string(),
            escola_id: "e1".to_string(),
            resource_id: "r1".to_string(),
            usuario_id: usuario_id.to_string(),
            teacher_name: "Ana".to_string(),
            date: date("2024-06-12"),
            shift: Shift::Matutino,
            slot_name: "08:00".to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_advance_window_for_teachers() {
        let today = date("2024-06-10");
        assert_eq!(
            check_advance(today, date("2024-06-11"), 2, false),
            Err(date("2024-06-12"))
        );
        assert_eq!(check_advance(today, date("2024-06-12"), 2, false), Ok(()));
        assert_eq!(check_advance(today, today, 0, false), Ok(()));
        assert!(check_advance(today, date("2024-06-09"), 0, false).is_err());
    }

    #[test]
    fn test_advance_window_is_clamped() {
        let today = date("2024-06-10");
        assert_eq!(
            earliest_booking_date(today, i64::MAX),
            today + Duration::days(MAX_ADVANCE_DAYS)
        );
        assert_eq!(earliest_booking_date(today, -5), today);
        assert_eq!(earliest_booking_date(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert!(check_advance(today, date("2024-06-11"), 200_000_000, false).is_err());
    }

    #[test]
    fn test_admins_skip_advance_window() {
        let today = date("2024-06-10");
        assert_eq!(check_advance(today, date("2024-06-11"), 2, true), Ok(()));
        assert_eq!(check_advance(today, date("2024-06-01"), 2, true), Ok(()));
    }

    #[test]
    fn test_can_remove() {
        let own = booking("u1", BookingStatus::Booked);
        assert!(can_remove("u1", false, &own));
        assert!(!can_remove("u2", false, &own));
        assert!(can_remove("u2", true, &own));

        let closed = booking("admin", BookingStatus::Closed);
        assert!(can_remove("other-admin", true, &closed));
        assert!(!can_remove("teacher", false, &closed));
    }

    #[test]
    fn test_slot_state() {
        assert_eq!(SlotState::of(None), SlotState::Open);
        assert_eq!(
            SlotState::of(Some(&booking("u1", BookingStatus::Booked))),
            SlotState::Booked
        );
        assert_eq!(
            SlotState::of(Some(&booking("u1", BookingStatus::Closed))),
            SlotState::Closed
        );
    }

    #[test]
    fn test_initial_agenda_date_skips_weekend() {
        assert_eq!(initial_agenda_date(date("2024-06-15")), date("2024-06-17"));
        assert_eq!(initial_agenda_date(date("2024-06-16")), date("2024-06-17"));
        assert_eq!(initial_agenda_date(date("2024-06-12")), date("2024-06-12"));
    }

    #[test]
    fn test_weekday_pt() {
        assert_eq!(weekday_pt(date("2024-06-10")), "Segunda-feira");
        assert_eq!(weekday_pt(date("2024-06-15")), "Sábado");
        assert_eq!(weekday_pt(date("2024-06-16")), "Domingo");
    }
}
