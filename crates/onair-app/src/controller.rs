//! Page assembly and the refresh loop behind `onair watch`.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use onair_core::config::{RefreshConfig, ScheduleConfig, Settings};
use onair_schedule::player::pick_occurrence;
use onair_schedule::streams::StreamDirectory;
use onair_schedule::view::ScheduleView;

use crate::error::AppResult;
use crate::render::{
    RenderContext, render_home, render_player, render_refresh_in, render_timeline,
    render_unavailable,
};
use crate::source::DataSources;

fn millis(ms: u64) -> TimeDelta {
    TimeDelta::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

/// ## Summary
/// When to reload next: just past the next status boundary, never sooner
/// than `min_delay` and never later than the hard refresh period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPlan {
    hard_refresh: TimeDelta,
    slack: TimeDelta,
    min_delay: TimeDelta,
}

impl RefreshPlan {
    #[must_use]
    pub fn new(config: &RefreshConfig) -> Self {
        Self {
            hard_refresh: millis(config.hard_refresh_secs.saturating_mul(1000)),
            slack: millis(config.boundary_slack_ms),
            min_delay: millis(config.min_delay_ms),
        }
    }

    /// Instant of the next reload given the next status boundary, if any.
    #[must_use]
    pub fn next_wake(&self, boundary: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
        let delay = boundary.map_or(self.hard_refresh, |at| {
            (at - now + self.slack).max(self.min_delay).min(self.hard_refresh)
        });
        now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    #[must_use]
    pub fn next_delay(&self, boundary: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        (self.next_wake(boundary, now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl From<&RefreshConfig> for RefreshPlan {
    fn from(config: &RefreshConfig) -> Self {
        Self::new(config)
    }
}

/// Builds every page the CLI prints. Each call reloads the documents.
#[derive(Debug, Clone)]
pub struct Controller {
    sources: DataSources,
    schedule: ScheduleConfig,
    refresh_secs: u64,
    plan: RefreshPlan,
    ctx: RenderContext,
    filter: Option<String>,
}

impl Controller {
    /// ## Summary
    /// Resolves zone and locale from `settings` and prepares the sources.
    ///
    /// ## Errors
    /// Returns a core error for an unknown zone or locale and
    /// `AppError::Fetch` if the HTTP client cannot be built.
    pub fn new(settings: &Settings, filter: Option<String>) -> AppResult<Self> {
        let ctx = RenderContext {
            tz: settings.schedule.tz()?,
            locale: settings.schedule.locale()?,
        };

        Ok(Self {
            sources: DataSources::new(&settings.sources)?,
            schedule: settings.schedule.clone(),
            refresh_secs: settings.refresh.hard_refresh_secs,
            plan: RefreshPlan::from(&settings.refresh),
            ctx,
            filter,
        })
    }

    async fn view(&self, now: DateTime<Utc>) -> AppResult<ScheduleView> {
        let events = self.sources.load_events().await?;
        let view = ScheduleView::build(&events, now, self.ctx.tz, self.schedule.horizon_days);
        Ok(match &self.filter {
            Some(query) => view.with_filter(query),
            None => view,
        })
    }

    /// ## Summary
    /// Live and upcoming lists as of `now`.
    ///
    /// ## Errors
    /// Returns an error if the events document cannot be loaded.
    pub async fn home_page(&self, now: DateTime<Utc>) -> AppResult<String> {
        let view = self.view(now).await?;
        Ok(render_home(&view, self.schedule.upcoming_limit, &self.ctx))
    }

    /// ## Summary
    /// Day-by-day timeline as of `now`.
    ///
    /// ## Errors
    /// Returns an error if the events document cannot be loaded.
    pub async fn timeline_page(&self, now: DateTime<Utc>) -> AppResult<String> {
        let view = self.view(now).await?;
        Ok(render_timeline(&view, self.schedule.timeline_days, &self.ctx))
    }

    /// ## Summary
    /// Player state for `event_id`, optionally pinned to one occurrence.
    ///
    /// A streams document that fails to load leaves the player without URLs
    /// instead of failing the page.
    ///
    /// ## Errors
    /// Returns an error if the events document cannot be loaded.
    pub async fn player_page(
        &self,
        event_id: &str,
        occ_key: Option<&str>,
        channel: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let events = self.sources.load_events().await?;
        let Some(event) = events.iter().find(|e| e.event_id == event_id) else {
            tracing::info!(event_id = %event_id, "Event not found");
            return Ok(format!("Event not found: {event_id}"));
        };

        let streams = match self.sources.load_streams().await {
            Ok(streams) if streams.is_empty() => {
                tracing::warn!("Streams document lists no playable channels");
                streams
            }
            Ok(streams) => streams,
            Err(e) => {
                tracing::warn!(error = %e, "Streams unavailable, continuing without stream URLs");
                StreamDirectory::default()
            }
        };

        let occ = pick_occurrence(event, occ_key, &now, self.ctx.tz);
        Ok(render_player(event, occ.as_ref(), &streams, channel, &now, &self.ctx))
    }

    /// ## Summary
    /// One frame of the watch screen and the delay until the next one.
    ///
    /// A failed load renders the error state and waits the hard refresh
    /// period before retrying.
    pub async fn watch_frame(&self, now: DateTime<Utc>) -> (String, Duration) {
        let view = match self.view(now).await {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!(error = %e, "Events unavailable");
                let wake = self.plan.next_wake(None, now);
                let frame = format!(
                    "{}\n\n{}",
                    render_unavailable(&e.to_string()),
                    render_refresh_in(Some(wake), &now, self.refresh_secs)
                );
                return (frame, self.plan.next_delay(None, now));
            }
        };

        let boundary = view.next_boundary();
        let wake = self.plan.next_wake(boundary, now);
        tracing::debug!(boundary = ?boundary, wake = %wake, "Scheduled next refresh");

        let frame = format!(
            "{}\n\nTIMELINE\n{}\n\n{}",
            render_home(&view, self.schedule.upcoming_limit, &self.ctx),
            render_timeline(&view, self.schedule.timeline_days, &self.ctx),
            render_refresh_in(Some(wake), &now, self.refresh_secs)
        );
        (frame, self.plan.next_delay(boundary, now))
    }

    /// ## Summary
    /// Re-renders the watch screen until Ctrl-C.
    ///
    /// ## Errors
    /// Never fails on data errors; those render as the error state.
    pub async fn watch(&self) -> AppResult<()> {
        tracing::info!(filter = ?self.filter, "Watching schedule");
        loop {
            let now = Utc::now();
            let (frame, delay) = self.watch_frame(now).await;
            println!("{frame}\n");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    tracing::info!("Stopping watch");
                    return Ok(());
                }
            }
        }
    }
}
