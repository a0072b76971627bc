use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::rules::{CLOSED_LABEL, SlotState};
use crate::types::{Booking, BookingStatus, ScheduleTemplate, Shift};

#[derive(Debug, Clone, Serialize)]
pub struct AgendaSlot {
    pub name: String,
    #[serde(rename = "type")]
    pub slot_type: String,
    pub state: SlotState,
    pub booked_by: Option<String>,
    pub booking_id: Option<String>,
    pub status: Option<BookingStatus>,
    pub is_mine: bool,
    pub is_admin: bool,
}

/// One day of a resource, keyed by shift.
pub type DayAgenda = BTreeMap<Shift, Vec<AgendaSlot>>;

pub fn day_agenda(
    templates: &[ScheduleTemplate],
    bookings: &[Booking],
    viewer_id: &str,
    viewer_is_admin: bool,
) -> DayAgenda {
    let by_slot: HashMap<(Shift, &str), &Booking> = bookings
        .iter()
        .map(|b| ((b.shift, b.slot_name.as_str()), b))
        .collect();

    templates
        .iter()
        .map(|template| {
            let slots = template
                .slots
                .iter()
                .map(|slot| {
                    let booking = by_slot.get(&(template.shift, slot.name.as_str())).copied();
                    AgendaSlot {
                        name: slot.name.clone(),
                        slot_type: slot.slot_type.clone(),
                        state: SlotState::of(booking),
                        booked_by: booking.map(|b| match b.status {
                            BookingStatus::Closed => CLOSED_LABEL.to_string(),
                            BookingStatus::Booked => b.teacher_name.clone(),
                        }),
                        booking_id: booking.map(|b| b.id.clone()),
                        status: booking.map(|b| b.status),
                        is_mine: booking.is_some_and(|b| b.usuario_id == viewer_id),
                        is_admin: viewer_is_admin,
                    }
                })
                .collect();
            (template.shift, slots)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::types::Slot;

    fn template(shift: Shift, names: &[&str]) -> ScheduleTemplate {
        ScheduleTemplate {
            id: format!("t-{shift}"),
            resource_id: "r1".to_string(),
            shift,
            slots: names
                .iter()
                .map(|n| Slot {
                    name: n.to_string(),
                    slot_type: if *n == "Intervalo" { "intervalo" } else { "aula" }.to_string(),
                })
                .collect(),
        }
    }

    fn booking(shift: Shift, slot: &str, usuario_id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: format!("b-{slot}"),
            escola_id: "e1".to_string(),
            resource_id: "r1".to_string(),
            usuario_id: usuario_id.to_string(),
            teacher_name: "Prof. Ana".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            shift,
            slot_name: slot.to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_day_agenda_marks_bookings() {
        let templates = vec![
            template(Shift::Matutino, &["07:00", "Intervalo", "08:00"]),
            template(Shift::Vespertino, &["13:00"]),
        ];
        let bookings = vec![
            booking(Shift::Matutino, "07:00", "ana", BookingStatus::Booked),
            booking(Shift::Matutino, "08:00", "admin", BookingStatus::Closed),
        ];

        let agenda = day_agenda(&templates, &bookings, "ana", false);
        let morning = &agenda[&Shift::Matutino];
        assert_eq!(morning.len(), 3);

        assert_eq!(morning[0].booked_by.as_deref(), Some("Prof. Ana"));
        assert!(morning[0].is_mine);
        assert_eq!(morning[0].state, SlotState::Booked);

        assert_eq!(morning[1].slot_type, "intervalo");
        assert_eq!(morning[1].state, SlotState::Open);
        assert!(morning[1].booking_id.is_none());

        assert_eq!(morning[2].booked_by.as_deref(), Some("Fechado"));
        assert!(!morning[2].is_mine);
        assert_eq!(morning[2].status, Some(BookingStatus::Closed));

        assert_eq!(agenda[&Shift::Vespertino][0].state, SlotState::Open);
    }

    #[test]
    fn test_same_slot_name_in_other_shift_is_separate() {
        let templates = vec![
            template(Shift::Matutino, &["1ª aula"]),
            template(Shift::Vespertino, &["1ª aula"]),
        ];
        let bookings = vec![booking(Shift::Vespertino, "1ª aula", "ana", BookingStatus::Booked)];

        let agenda = day_agenda(&templates, &bookings, "joao", true);
        assert_eq!(agenda[&Shift::Matutino][0].state, SlotState::Open);
        assert_eq!(agenda[&Shift::Vespertino][0].state, SlotState::Booked);
        assert!(agenda[&Shift::Vespertino][0].is_admin);
    }

    #[test]
    fn test_agenda_serializes_shift_keys() {
        let agenda = day_agenda(&[template(Shift::Matutino, &["07:00"])], &[], "ana", false);
        let json = serde_json::to_value(&agenda).unwrap();
        assert_eq!(json["matutino"][0]["name"], "07:00");
        assert_eq!(json["matutino"][0]["type"], "aula");
        assert!(json["matutino"][0]["booked_by"].is_null());
    }
}
