use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::types::{Booking, BookingStatus, Resource, ScheduleTemplate, Shift, Slot};

const COLOR_CLASSES: [&str; 6] = [
    "bg-success",
    "bg-primary",
    "bg-warning",
    "bg-info",
    "bg-secondary",
    "bg-dark",
];

const DAY_NAMES: [&str; 5] = ["Segunda", "Terça", "Quarta", "Quinta", "Sexta"];

#[derive(Debug, Clone, Serialize)]
pub struct WeekHeader {
    pub name: &'static str,
    /// `dd/mm`
    pub date: String,
    pub iso_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekBooking {
    pub id: String,
    pub usuario_id: String,
    pub teacher_name: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub resource_id: String,
    pub title: String,
    pub icon: String,
    pub color_class: &'static str,
    pub shift: Shift,
    pub slots: Vec<Slot>,
    /// Day name, then slot name.
    pub bookings: BTreeMap<&'static str, BTreeMap<String, WeekBooking>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_date_formatted: String,
    pub end_date_formatted: String,
    pub prev_week: NaiveDate,
    pub next_week: NaiveDate,
    pub headers: Vec<WeekHeader>,
    pub summaries: Vec<WeekSummary>,
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

/// Monday and Friday of the week containing `date`, or `None` at the edges
/// of the calendar.
#[must_use]
pub fn week_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let monday = add_days(date, -i64::from(date.weekday().num_days_from_monday()))?;
    Some((monday, add_days(monday, 4)?))
}

/// Builds the Monday..Friday grid for every resource that has templates.
///
/// `resources` is expected in display order; templates and bookings may
/// belong to any of them. Returns `None` when the week or its neighbours
/// fall outside the representable calendar.
pub fn week_view(
    base_date: NaiveDate,
    resources: &[Resource],
    templates: &[ScheduleTemplate],
    bookings: &[Booking],
) -> Option<WeekView> {
    let (start, end) = week_bounds(base_date)?;
    let prev_week = add_days(start, -7)?;
    let next_week = add_days(start, 7)?;

    let headers: Vec<WeekHeader> = start
        .iter_days()
        .zip(DAY_NAMES)
        .map(|(day, name)| WeekHeader {
            name,
            date: day.format("%d/%m").to_string(),
            iso_date: day,
        })
        .collect();

    let mut summaries = Vec::new();
    for (index, resource) in resources.iter().enumerate() {
        let mut own: Vec<&ScheduleTemplate> = templates
            .iter()
            .filter(|t| t.resource_id == resource.id)
            .collect();
        own.sort_by_key(|t| t.shift);

        for template in own {
            let mut by_day: BTreeMap<&'static str, BTreeMap<String, WeekBooking>> = BTreeMap::new();
            for booking in bookings.iter().filter(|b| {
                b.resource_id == resource.id
                    && b.shift == template.shift
                    && b.date >= start
                    && b.date <= end
            }) {
                let offset = (booking.date - start).num_days() as usize;
                by_day.entry(DAY_NAMES[offset]).or_default().insert(
                    booking.slot_name.clone(),
                    WeekBooking {
                        id: booking.id.clone(),
                        usuario_id: booking.usuario_id.clone(),
                        teacher_name: booking.teacher_name.clone(),
                        status: booking.status,
                    },
                );
            }

            summaries.push(WeekSummary {
                resource_id: resource.id.clone(),
                title: format!("{} - {}", resource.name, template.shift.label()),
                icon: resource.icon.clone(),
                color_class: COLOR_CLASSES[index % COLOR_CLASSES.len()],
                shift: template.shift,
                slots: template.slots.clone(),
                bookings: by_day,
            });
        }
    }

    Some(WeekView {
        start_date: start,
        end_date: end,
        start_date_formatted: start.format("%d/%m/%Y").to_string(),
        end_date_formatted: end.format("%d/%m/%Y").to_string(),
        prev_week,
        next_week,
        headers,
        summaries,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn resource(id: &str, name: &str) -> Resource {
        Resource {
            id: id.to_string(),
            escola_id: "e1".to_string(),
            name: name.to_string(),
            description: None,
            icon: "bi-laptop".to_string(),
            sort_order: 0,
            min_agendamento_dias: 0,
            created_at: Utc::now(),
        }
    }

    fn template(resource_id: &str, shift: Shift) -> ScheduleTemplate {
        ScheduleTemplate {
            id: format!("{resource_id}-{shift}"),
            resource_id: resource_id.to_string(),
            shift,
            slots: vec![Slot {
                name: "1ª aula".to_string(),
                slot_type: "aula".to_string(),
            }],
        }
    }

    fn booking(resource_id: &str, day: &str, shift: Shift) -> Booking {
        Booking {
            id: format!("b-{day}"),
            escola_id: "e1".to_string(),
            resource_id: resource_id.to_string(),
            usuario_id: "u1".to_string(),
            teacher_name: "Ana".to_string(),
            date: date(day),
            shift,
            slot_name: "1ª aula".to_string(),
            status: BookingStatus::Booked,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_week_bounds() {
        let week = Some((date("2024-06-10"), date("2024-06-14")));
        assert_eq!(week_bounds(date("2024-06-12")), week);
        assert_eq!(week_bounds(date("2024-06-16")), week);
        assert_eq!(week_bounds(date("2024-06-10")), week);
    }

    #[test]
    fn test_week_at_calendar_edges() {
        assert!(week_view(NaiveDate::MIN, &[], &[], &[]).is_none());
        assert!(week_view(NaiveDate::MAX, &[], &[], &[]).is_none());
    }

    #[test]
    fn test_week_view_layout() {
        let resources = vec![resource("r1", "Laboratório"), resource("r2", "Projetor")];
        let templates = vec![
            template("r1", Shift::Vespertino),
            template("r1", Shift::Matutino),
        ];
        let bookings = vec![
            booking("r1", "2024-06-12", Shift::Matutino),
            booking("r1", "2024-06-17", Shift::Matutino),
            booking("r1", "2024-06-14", Shift::Vespertino),
        ];

        let view = week_view(date("2024-06-12"), &resources, &templates, &bookings).unwrap();

        assert_eq!(view.start_date_formatted, "10/06/2024");
        assert_eq!(view.end_date_formatted, "14/06/2024");
        assert_eq!(view.prev_week, date("2024-06-03"));
        assert_eq!(view.next_week, date("2024-06-17"));
        assert_eq!(view.headers[0].name, "Segunda");
        assert_eq!(view.headers[0].date, "10/06");
        assert_eq!(view.headers[4].date, "14/06");

        // r2 has no templates
        assert_eq!(view.summaries.len(), 2);
        assert_eq!(view.summaries[0].title, "Laboratório - Matutino");
        assert_eq!(view.summaries[1].title, "Laboratório - Vespertino");
        assert_eq!(view.summaries[0].color_class, "bg-success");

        let morning = &view.summaries[0].bookings;
        assert_eq!(morning.len(), 1);
        assert_eq!(morning["Quarta"]["1ª aula"].teacher_name, "Ana");

        assert!(view.summaries[1].bookings["Sexta"].contains_key("1ª aula"));
    }

    #[test]
    fn test_colors_cycle_per_resource() {
        let resources: Vec<Resource> = (0..7)
            .map(|i| resource(&format!("r{i}"), &format!("Sala {i}")))
            .collect();
        let templates: Vec<ScheduleTemplate> = resources
            .iter()
            .map(|r| template(&r.id, Shift::Matutino))
            .collect();

        let view = week_view(date("2024-06-12"), &resources, &templates, &[]).unwrap();
        assert_eq!(view.summaries[1].color_class, "bg-primary");
        assert_eq!(view.summaries[5].color_class, "bg-dark");
        assert_eq!(view.summaries[6].color_class, "bg-success");
    }
}
