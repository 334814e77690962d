//! Presentation rows.
//!
//! A [`TicketView`] is everything a front end needs to draw one ticket: the
//! stored fields, totals projected to the refresh instant, and which actions
//! are available. Building a view never mutates the ticket.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::lifecycle::{self, ActionGates};
use crate::model::ticket::Ticket;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    /// 1-based position, as shown to users.
    pub row: usize,
    #[serde(flatten)]
    pub ticket: Ticket,
    pub displayed_hours: f64,
    pub displayed_live_seconds: f64,
    /// `displayed_hours` rounded to two decimals.
    pub hours_text: String,
    /// `displayed_live_seconds` as `HH:MM:SS`.
    pub live_clock: String,
    pub pause_label: &'static str,
    pub actions: ActionGates,
}

impl TicketView {
    #[must_use]
    pub fn new(index: usize, ticket: &Ticket, now: DateTime<Utc>) -> Self {
        let totals = lifecycle::current_totals(ticket, now);
        Self {
            row: index + 1,
            ticket: ticket.clone(),
            displayed_hours: totals.hours,
            displayed_live_seconds: totals.live_seconds,
            hours_text: format_hours(totals.hours),
            live_clock: format_seconds(totals.live_seconds),
            pause_label: lifecycle::pause_label(ticket),
            actions: ActionGates::for_ticket(ticket),
        }
    }
}

/// Whole seconds as `HH:MM:SS`. Hours grow past two digits when needed.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn format_seconds(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let seconds = whole % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[must_use]
pub fn format_hours(hours: f64) -> String {
    format!("{hours:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::pause_resume;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn format_seconds_pads_and_floors() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(59.9), "00:00:59");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(360_000.0), "100:00:00");
        assert_eq!(format_seconds(-5.0), "00:00:00");
        assert_eq!(format_seconds(f64::NAN), "00:00:00");
    }

    #[test]
    fn format_hours_uses_two_decimals() {
        assert_eq!(format_hours(0.0), "0.00");
        assert_eq!(format_hours(1.0 / 3.0), "0.33");
        assert_eq!(format_hours(2.5), "2.50");
    }

    #[test]
    fn running_ticket_view_projects_elapsed_time() {
        let ticket = Ticket::new("P1", "ana", "high", t(0));
        let view = TicketView::new(0, &ticket, t(5400));
        assert_eq!(view.row, 1);
        assert_eq!(view.hours_text, "1.50");
        assert_eq!(view.live_clock, "01:30:00");
        assert_eq!(view.pause_label, "Pause");
        assert!(view.actions.complete);
        assert!(view.ticket.live_seconds.abs() < f64::EPSILON);
    }

    #[test]
    fn paused_ticket_view_is_frozen() {
        let mut ticket = Ticket::new("P1", "ana", "high", t(0));
        pause_resume(&mut ticket, t(75));
        let early = TicketView::new(2, &ticket, t(100));
        let late = TicketView::new(2, &ticket, t(10_000));
        assert_eq!(early.live_clock, "00:01:15");
        assert_eq!(early.live_clock, late.live_clock);
        assert_eq!(late.pause_label, "Resume");
        assert_eq!(late.row, 3);
    }

    #[test]
    fn view_json_flattens_ticket_fields() {
        let ticket = Ticket::new("P9", "bo", "low", t(0));
        let json = serde_json::to_value(TicketView::new(0, &ticket, t(60))).unwrap();
        assert_eq!(json["projectId"], "P9");
        assert_eq!(json["row"], 1);
        assert_eq!(json["liveClock"], "00:01:00");
        assert_eq!(json["actions"]["startTask"], false);
    }
}
