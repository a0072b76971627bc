//! Booking rules and the agenda views built from templates and bookings.
//!
//! Everything here is pure: callers pass `today` and the rows they loaded.

mod agenda;
mod rules;
mod week;

pub use agenda::{AgendaSlot, DayAgenda, day_agenda};
pub use rules::{
    CLOSED_LABEL, MAX_ADVANCE_DAYS, SLOT_TAKEN_MESSAGE, SlotState, can_remove, check_advance,
    earliest_booking_date, initial_agenda_date, today, weekday_pt,
};
pub use week::{WeekBooking, WeekHeader, WeekSummary, WeekView, week_bounds, week_view};
