//! Action Scheduler
//!
//! One tokio task per action. Interval actions use `tokio::time::interval`
//! with delayed missed ticks; daily actions sleep until the next wall-clock
//! time (UTC). An action never overlaps itself because each task awaits its
//! own run before waiting for the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use pulse_engine::{Action, PulseAgent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    Every {
        #[serde(rename = "secs", serialize_with = "as_secs")]
        period: Duration,
    },
    /// Once a day at a UTC time
    DailyAt { at: NaiveTime },
    Disabled,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// Time left until the next occurrence of `at` after `now`
pub fn until_next(now: DateTime<Utc>, at: NaiveTime) -> Duration {
    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now { today } else { today + chrono::Duration::days(1) };
    (next - now).to_std().unwrap_or_default()
}

#[derive(Clone, Debug, Serialize)]
pub struct ScheduleConfig {
    pub market_pulse: Cadence,
    pub analysis_thread: Cadence,
    pub term_of_the_day: Cadence,
    pub trusted_repost: Cadence,
    pub engage_mentions: Cadence,

    /// Post a market pulse immediately at startup
    pub pulse_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            market_pulse: Cadence::Every {
                period: Duration::from_secs(3 * 60 * 60),
            },
            analysis_thread: Cadence::DailyAt {
                at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            },
            term_of_the_day: Cadence::DailyAt {
                at: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN),
            },
            trusted_repost: Cadence::Every {
                period: Duration::from_secs(30 * 60),
            },
            engage_mentions: Cadence::Every {
                period: Duration::from_secs(5 * 60),
            },
            pulse_on_start: true,
        }
    }
}

/// `"off"`, a number of seconds, or `HH:MM` for a daily run
fn parse_cadence(raw: &str) -> Option<Cadence> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("off") {
        return Some(Cadence::Disabled);
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return (secs > 0).then(|| Cadence::Every {
            period: Duration::from_secs(secs),
        });
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .map(|at| Cadence::DailyAt { at })
}

impl ScheduleConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cadence = |key: &str, default: Cadence| match std::env::var(key) {
            Ok(raw) => parse_cadence(&raw).unwrap_or_else(|| {
                tracing::warn!(key, value = %raw, "Ignoring invalid schedule");
                default
            }),
            Err(_) => default,
        };

        Self {
            market_pulse: cadence("PULSE_SCHEDULE_MARKET_PULSE", defaults.market_pulse),
            analysis_thread: cadence("PULSE_SCHEDULE_ANALYSIS_THREAD", defaults.analysis_thread),
            term_of_the_day: cadence("PULSE_SCHEDULE_TERM", defaults.term_of_the_day),
            trusted_repost: cadence("PULSE_SCHEDULE_REPOST", defaults.trusted_repost),
            engage_mentions: cadence("PULSE_SCHEDULE_MENTIONS", defaults.engage_mentions),
            pulse_on_start: std::env::var("PULSE_ON_START")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pulse_on_start),
        }
    }

    pub const fn cadence(&self, action: Action) -> Cadence {
        match action {
            Action::MarketPulse => self.market_pulse,
            Action::AnalysisThread => self.analysis_thread,
            Action::TermOfTheDay => self.term_of_the_day,
            Action::TrustedRepost => self.trusted_repost,
            Action::EngageMentions => self.engage_mentions,
        }
    }
}

async fn run_every(agent: Arc<PulseAgent>, action: Action, period: Duration, immediately: bool) {
    let start = if immediately { Instant::now() } else { Instant::now() + period };
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut rng = StdRng::from_entropy();

    loop {
        ticker.tick().await;
        agent.run(action, &mut rng).await;
    }
}

async fn run_daily(agent: Arc<PulseAgent>, action: Action, at: NaiveTime) {
    let mut rng = StdRng::from_entropy();
    loop {
        let wait = until_next(Utc::now(), at);
        tracing::debug!(action = %action, wait_secs = wait.as_secs(), "Waiting for daily run");
        tokio::time::sleep(wait).await;
        agent.run(action, &mut rng).await;
    }
}

/// Spawn one task per enabled action
pub fn spawn(agent: &Arc<PulseAgent>, schedule: &ScheduleConfig) -> Vec<JoinHandle<()>> {
    Action::ALL
        .iter()
        .filter_map(|&action| {
            let agent = agent.clone();
            let cadence = schedule.cadence(action);
            tracing::info!(action = %action, cadence = ?cadence, "Scheduling");
            match cadence {
                Cadence::Every { period } => {
                    let immediately = action == Action::MarketPulse && schedule.pulse_on_start;
                    Some(tokio::spawn(run_every(agent, action, period, immediately)))
                }
                Cadence::DailyAt { at } => Some(tokio::spawn(run_daily(agent, action, at))),
                Cadence::Disabled => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_until_next_same_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(until_next(now, at), Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_until_next_rolls_over() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap();
        let at = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        assert_eq!(until_next(now, at), Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn test_parse_cadence() {
        assert_eq!(parse_cadence("off"), Some(Cadence::Disabled));
        assert_eq!(
            parse_cadence("300"),
            Some(Cadence::Every {
                period: Duration::from_secs(300)
            })
        );
        assert_eq!(
            parse_cadence("09:00"),
            Some(Cadence::DailyAt {
                at: NaiveTime::from_hms_opt(9, 0, 0).unwrap()
            })
        );
        assert_eq!(parse_cadence("0"), None);
        assert_eq!(parse_cadence("soon"), None);
    }

    #[test]
    fn test_defaults_follow_bot_rhythm() {
        let schedule = ScheduleConfig::default();
        assert!(schedule.pulse_on_start);
        assert_eq!(
            schedule.cadence(Action::EngageMentions),
            Cadence::Every {
                period: Duration::from_secs(300)
            }
        );
        assert!(matches!(schedule.cadence(Action::TermOfTheDay), Cadence::DailyAt { .. }));
    }
}
