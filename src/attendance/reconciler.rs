use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use tracing::debug;

use crate::model::attendance::{DailyAttendance, RawEvent};
use crate::model::employee::{RosterEntry, name_sort_key};

/// Morning punches are before noon, afternoon punches from noon on.
const NOON: u32 = 12;

#[derive(Debug, Default, Clone, Copy)]
struct Punches {
    first_in: Option<DateTime<FixedOffset>>,
    last_out: Option<DateTime<FixedOffset>>,
}

impl Punches {
    fn observe(&mut self, at: DateTime<FixedOffset>) {
        if at.hour() < NOON {
            if self.first_in.is_none_or(|current| at < current) {
                self.first_in = Some(at);
            }
        } else if self.last_out.is_none_or(|current| at > current) {
            self.last_out = Some(at);
        }
    }
}

/// Reduce raw events to one first-in/last-out row per employee and day.
///
/// Every roster entry is present in the result. Entries without events get a
/// single empty row dated `day`. Rows are ordered by the last word of the
/// employee name; equal keys keep roster order, then date order.
pub fn reconcile(
    events: &[RawEvent],
    employees: &[RosterEntry],
    day: NaiveDate,
) -> Vec<DailyAttendance> {
    let mut groups: HashMap<&str, BTreeMap<NaiveDate, Punches>> = HashMap::new();

    for event in events {
        groups
            .entry(event.employee_id.as_str())
            .or_default()
            .entry(event.timestamp.date_naive())
            .or_default()
            .observe(event.timestamp);
    }

    let mut rows = Vec::with_capacity(employees.len());

    for employee in employees {
        let row = |date: NaiveDate, punches: Punches| DailyAttendance {
            employee_id: employee.employee_id.clone(),
            employee_no: employee.employee_no.clone(),
            name: employee.name.clone(),
            date,
            first_in: punches.first_in,
            last_out: punches.last_out,
        };

        match groups.get(employee.employee_id.as_str()) {
            Some(days) => rows.extend(days.iter().map(|(date, punches)| row(*date, *punches))),
            None => rows.push(row(day, Punches::default())),
        }
    }

    let unknown = groups
        .keys()
        .filter(|id| !employees.iter().any(|e| e.employee_id == **id))
        .count();
    if unknown > 0 {
        debug!(unknown, "Ignoring events of employees outside the roster");
    }

    rows.sort_by(|a, b| name_sort_key(&a.name).cmp(name_sort_key(&b.name)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, day};

    #[test]
    fn picks_earliest_morning_and_latest_afternoon() {
        let events = vec![
            at("7", "Nguyen Van An", "08:15"),
            at("7", "Nguyen Van An", "17:00"),
            at("7", "Nguyen Van An", "08:00"),
            at("7", "Nguyen Van An", "17:30"),
        ];
        let roster = vec![RosterEntry::new("7", "Nguyen Van An")];

        let rows = reconcile(&events, &roster, day());

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.first_in.unwrap().format("%H:%M").to_string(), "08:00");
        assert_eq!(row.last_out.unwrap().format("%H:%M").to_string(), "17:30");
        assert_eq!(row.date, day());
    }

    #[test]
    fn employee_without_events_is_still_listed() {
        let events = vec![at("1", "Tran Thi Binh", "07:20")];
        let roster = vec![
            RosterEntry::new("1", "Tran Thi Binh"),
            RosterEntry::new("2", "Le Van Cuong"),
        ];

        let rows = reconcile(&events, &roster, day());

        assert_eq!(rows.len(), 2);
        let cuong = rows.iter().find(|r| r.employee_id == "2").unwrap();
        assert_eq!(cuong.first_in, None);
        assert_eq!(cuong.last_out, None);
        assert_eq!(cuong.date, day());
    }

    #[test]
    fn only_morning_or_only_afternoon() {
        let events = vec![at("1", "A", "11:59"), at("2", "B", "12:00")];
        let roster = vec![RosterEntry::new("1", "A"), RosterEntry::new("2", "B")];

        let rows = reconcile(&events, &roster, day());

        assert!(rows[0].first_in.is_some() && rows[0].last_out.is_none());
        assert!(rows[1].first_in.is_none() && rows[1].last_out.is_some());
    }

    #[test]
    fn orders_by_last_name_token() {
        let roster = vec![
            RosterEntry::new("1", "Tran Thi Binh"),
            RosterEntry::new("2", "Nguyen Van An"),
            RosterEntry::new("3", "Le Cuong"),
        ];

        let rows = reconcile(&[], &roster, day());
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["Nguyen Van An", "Tran Thi Binh", "Le Cuong"]);
    }

    #[test]
    fn duplicate_last_tokens_keep_roster_order() {
        let roster = vec![
            RosterEntry::new("30", "Pham Van An"),
            RosterEntry::new("10", "Bui Binh"),
            RosterEntry::new("20", "Nguyen Thi An"),
            RosterEntry::new("40", "Do An"),
        ];

        let rows = reconcile(&[], &roster, day());
        let ids: Vec<_> = rows.iter().map(|r| r.employee_id.as_str()).collect();

        assert_eq!(ids, vec!["30", "20", "40", "10"]);
    }

    #[test]
    fn events_outside_roster_are_ignored() {
        let events = vec![at("99", "Visitor", "09:00")];
        let roster = vec![RosterEntry::new("1", "Tran Thi Binh")];

        let rows = reconcile(&events, &roster, day());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "1");
        assert!(!rows[0].has_punch());
    }

    #[test]
    fn grouping_uses_the_device_local_date() {
        // 23:30 at +07:00 is still the 9th locally although it is the 9th 16:30 UTC
        let late_evening = chrono::DateTime::parse_from_rfc3339("2025-10-09T23:30:00+07:00").unwrap();
        let next_morning = chrono::DateTime::parse_from_rfc3339("2025-10-10T06:45:00+07:00").unwrap();
        let events = vec![
            RawEvent::new("1", "A", late_evening),
            RawEvent::new("1", "A", next_morning),
        ];
        let roster = vec![RosterEntry::new("1", "A")];

        let rows = reconcile(&events, &roster, day());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 10, 9).unwrap());
        assert_eq!(rows[0].last_out, Some(late_evening));
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2025, 10, 10).unwrap());
        assert_eq!(rows[1].first_in, Some(next_morning));
    }
}
