//! Plain-text rendering of schedule views and the player state.

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;
use onair_core::util::time::{format_clock, format_dt, iso_to_local_date, ms_to_hms};
use onair_schedule::model::Event;
use onair_schedule::occurrence::Occurrence;
use onair_schedule::player::Countdown;
use onair_schedule::status::OccurrenceStatus;
use onair_schedule::streams::{StreamDirectory, choose_channel};
use onair_schedule::view::ScheduleView;

/// Zone and locale every rendered timestamp is expressed in.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub tz: Tz,
    pub locale: Locale,
}

impl RenderContext {
    fn dt(&self, dt: &DateTime<Tz>) -> String {
        format_dt(&dt.with_timezone(&self.tz), self.locale)
    }
}

fn channels_label(channels: &[String]) -> String {
    if channels.is_empty() {
        "Channels: -".to_string()
    } else {
        format!("Channels: {}", channels.join(" · "))
    }
}

fn card(occ: &Occurrence, status: OccurrenceStatus, now: &DateTime<Utc>, ctx: &RenderContext) -> String {
    let when = if status == OccurrenceStatus::Live {
        format!("Ends: {}", ctx.dt(&occ.end_dt))
    } else {
        format!("Starts: {}", ctx.dt(&occ.start_dt))
    };
    format!(
        "  [{}] {} | {} | Time: {} - {} | {} | {}",
        status.as_str().to_uppercase(),
        occ.event_name,
        when,
        occ.time.start,
        occ.time.end,
        Countdown::for_occurrence(occ, now),
        channels_label(&occ.channels),
    )
}

/// Live and upcoming sections of the home page.
#[must_use]
pub fn render_home(view: &ScheduleView, upcoming_limit: usize, ctx: &RenderContext) -> String {
    let now = view.now();
    let mut lines = vec![format!(
        "{} {}",
        onair_core::constants::APP_NAME,
        format_clock(&now.with_timezone(&ctx.tz))
    )];

    lines.push("LIVE".to_string());
    let live = view.live();
    if live.is_empty() {
        lines.push("  Nothing live right now.".to_string());
    }
    lines.extend(live.iter().map(|occ| card(occ, OccurrenceStatus::Live, &now, ctx)));

    lines.push("UPCOMING".to_string());
    let upcoming = view.upcoming(upcoming_limit);
    if upcoming.is_empty() {
        lines.push("  Nothing scheduled.".to_string());
    }
    lines.extend(
        upcoming
            .iter()
            .map(|occ| card(occ, OccurrenceStatus::Upcoming, &now, ctx)),
    );

    lines.join("\n")
}

/// Day-by-day listing of the next `days` days.
#[must_use]
pub fn render_timeline(view: &ScheduleView, days: u32, ctx: &RenderContext) -> String {
    let now = view.now();
    let timeline = view.timeline(days);
    if timeline.is_empty() {
        return format!("No scheduled occurrences in the next {days} days (or filtered out).");
    }

    let mut lines = Vec::new();
    for day in timeline {
        let count = day.occurrences.len();
        lines.push(format!(
            "{} ({count} occurrence{})",
            iso_to_local_date(day.date, ctx.tz).format_localized("%A, %b %-d", ctx.locale),
            if count == 1 { "" } else { "s" }
        ));
        for occ in day.occurrences {
            let status = occ.status(&now);
            let channels = match occ.channels.len() {
                0 => "No channels".to_string(),
                1 => "1 channel".to_string(),
                n => format!("{n} channels"),
            };
            lines.push(format!(
                "  {} - {}  {}  {}  {}  {}",
                occ.time.start,
                occ.time.end,
                occ.event_name,
                status.as_str().to_uppercase(),
                Countdown::for_occurrence(occ, &now),
                channels,
            ));
        }
    }
    lines.join("\n")
}

/// Shown in place of the schedule when the events document cannot be loaded.
#[must_use]
pub fn render_unavailable(reason: &str) -> String {
    format!("Failed to load events.\n  {reason}")
}

/// Countdown to the next scheduled reload, `MM:SS`, or the hard period.
#[must_use]
pub fn render_refresh_in(next_wake: Option<DateTime<Utc>>, now: &DateTime<Utc>, hard_refresh_secs: u64) -> String {
    let hms = match next_wake {
        Some(wake) => ms_to_hms((wake - *now).num_milliseconds()),
        None => ms_to_hms(i64::try_from(hard_refresh_secs.saturating_mul(1000)).unwrap_or(i64::MAX)),
    };
    let mm_ss = hms.split_once(':').map_or(hms.as_str(), |(_, rest)| rest);
    format!("Refresh in {mm_ss}")
}

/// ## Summary
/// Player page state for one event.
///
/// The stream URL is only shown once the occurrence is live.
#[must_use]
pub fn render_player(
    event: &Event,
    occ: Option<&Occurrence>,
    streams: &StreamDirectory,
    channel: Option<&str>,
    now: &DateTime<Utc>,
    ctx: &RenderContext,
) -> String {
    let title: &str = if event.event_name.is_empty() { "Event" } else { &event.event_name };
    let Some(occ) = occ else {
        return [
            title.to_string(),
            "Status: ENDED".to_string(),
            "No occurrence found in window".to_string(),
        ]
        .join("\n");
    };

    let status = occ.status(now);
    let mut lines = vec![
        title.to_string(),
        format!("Status: {}", status.as_str().to_uppercase()),
        format!("Time: {} - {}", occ.time.start, occ.time.end),
        format!("Start: {}", ctx.dt(&occ.start_dt)),
        format!("occ={}", occ.occ_key),
    ];

    match status {
        OccurrenceStatus::Upcoming => {
            lines.push(format!("Starts at {}", ctx.dt(&occ.start_dt)));
            lines.push(Countdown::for_occurrence(occ, now).to_string());
        }
        OccurrenceStatus::Live => {
            lines.push(Countdown::for_occurrence(occ, now).to_string());
            match choose_channel(&event.channels, channel) {
                Some(chosen) => {
                    lines.push(format!("Channel: {chosen}"));
                    lines.push(format!("Stream: {}", streams.resolve(chosen).unwrap_or("about:blank")));
                }
                None => lines.push("No channels configured for this event.".to_string()),
            }
        }
        OccurrenceStatus::Ended | OccurrenceStatus::Invalid => {
            lines.push("This occurrence has ended.".to_string());
        }
    }

    lines.join("\n")
}
