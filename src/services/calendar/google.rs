use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;

use super::CalendarProvider;
use crate::models::{AppointmentSlot, BusyInterval};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar v3 over plain HTTP with a pre-issued bearer token.
pub struct GoogleCalendarProvider {
    access_token: String,
    calendar_id: String,
    timezone: Tz,
    client: reqwest::Client,
}

impl GoogleCalendarProvider {
    pub fn new(access_token: String, calendar_id: String, timezone: Tz) -> Self {
        Self {
            access_token,
            calendar_id,
            timezone,
            client: reqwest::Client::new(),
        }
    }

    fn rfc3339(&self, local: NaiveDateTime) -> anyhow::Result<String> {
        self.timezone
            .from_local_datetime(&local)
            .earliest()
            .map(|t| t.to_rfc3339())
            .ok_or_else(|| anyhow::anyhow!("{local} does not exist in {}", self.timezone))
    }
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: std::collections::HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<FreeBusyPeriod>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyPeriod {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

fn parse_busy(
    response: FreeBusyResponse,
    calendar_id: &str,
    tz: Tz,
) -> anyhow::Result<Vec<BusyInterval>> {
    let calendar = response
        .calendars
        .get(calendar_id)
        .ok_or_else(|| anyhow::anyhow!("calendar {calendar_id} missing from free/busy response"))?;

    if !calendar.errors.is_empty() {
        anyhow::bail!(
            "free/busy errors for {calendar_id}: {}",
            serde_json::Value::from(calendar.errors.clone())
        );
    }

    calendar
        .busy
        .iter()
        .map(|period| {
            let start = DateTime::parse_from_rfc3339(&period.start)
                .with_context(|| format!("bad busy start: {}", period.start))?;
            let end = DateTime::parse_from_rfc3339(&period.end)
                .with_context(|| format!("bad busy end: {}", period.end))?;
            Ok(BusyInterval {
                start: start.with_timezone(&tz).naive_local(),
                end: end.with_timezone(&tz).naive_local(),
            })
        })
        .collect()
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn query_busy(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Vec<BusyInterval>> {
        let body = json!({
            "timeMin": self.rfc3339(start)?,
            "timeMax": self.rfc3339(end)?,
            "timeZone": self.timezone.name(),
            "items": [{ "id": self.calendar_id }],
        });

        let resp = self
            .client
            .post(format!("{API_BASE}/freeBusy"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("failed to call Google free/busy API")?
            .error_for_status()
            .context("Google free/busy API returned error")?;

        let data: FreeBusyResponse = resp
            .json()
            .await
            .context("failed to parse free/busy response")?;

        parse_busy(data, &self.calendar_id, self.timezone)
    }

    async fn create_event(
        &self,
        slot: &AppointmentSlot,
        summary: &str,
        description: &str,
        attendees: &[String],
    ) -> anyhow::Result<String> {
        let mut url = reqwest::Url::parse(API_BASE).context("invalid calendar API base")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("calendar API base cannot take a path"))?
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        url.query_pairs_mut().append_pair("sendUpdates", "all");

        let tz = self.timezone.name();
        let body = json!({
            "summary": summary,
            "description": description,
            "start": {
                "dateTime": slot.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": tz,
            },
            "end": {
                "dateTime": slot.end().format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": tz,
            },
            "attendees": attendees
                .iter()
                .map(|email| json!({ "email": email }))
                .collect::<Vec<_>>(),
        });

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("failed to call Google events API")?
            .error_for_status()
            .context("Google events API returned error")?;

        let event: InsertedEvent = resp
            .json()
            .await
            .context("failed to parse inserted event")?;

        tracing::info!(event_id = %event.id, start = %slot.start, "calendar event created");
        Ok(event.id)
    }
}
