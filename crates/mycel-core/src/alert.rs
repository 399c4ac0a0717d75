//! Alert lifecycle management with dedup and hysteresis.
//!
//! One logical owner per unit: the manager holds at most one non-resolved
//! alert per unit and serializes its transitions. Escalation replaces the
//! open alert's severity instead of opening a second one; resolution
//! requires a run of consecutive clear evaluations so a single good
//! reading inside a bad stretch never closes an alert.

use crate::parameter::ParameterKind;
use crate::tier::Tier;
use crate::trend::EarlyWarning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Severity classes, ascending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Predictive: an early warning with no breached threshold yet.
    Watch,
    Warning,
    Critical,
    Collapse,
}

impl AlertSeverity {
    /// Severity implied by a tier, if the tier breaches at all.
    pub fn from_tier(tier: Tier) -> Option<AlertSeverity> {
        match tier {
            Tier::Excellent | Tier::Good => None,
            Tier::Moderate => Some(AlertSeverity::Warning),
            Tier::Critical => Some(AlertSeverity::Critical),
            Tier::Collapse => Some(AlertSeverity::Collapse),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Open,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: Uuid,
    pub unit_id: String,
    pub site_id: String,
    pub severity: AlertSeverity,
    pub state: AlertState,
    pub opened_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Parameters pinned low when the alert opened or escalated.
    pub trigger_parameters: Vec<ParameterKind>,
}

/// State change produced by one evaluation, for audit and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertTransition {
    Opened {
        alert_id: Uuid,
        unit_id: String,
        severity: AlertSeverity,
    },
    Escalated {
        alert_id: Uuid,
        from: AlertSeverity,
        to: AlertSeverity,
    },
    Deescalated {
        alert_id: Uuid,
        from: AlertSeverity,
        to: AlertSeverity,
    },
    Acknowledged {
        alert_id: Uuid,
    },
    Resolved {
        alert_id: Uuid,
        unit_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Consecutive clear evaluations required before resolution.
    pub clear_streak: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { clear_streak: 2 }
    }
}

/// Per-unit alert state machine.
#[derive(Debug, Clone, Default)]
pub struct AlertManager {
    config: AlertConfig,
    active: BTreeMap<String, Alert>,
    clear_streaks: BTreeMap<String, u32>,
    resolved: Vec<Alert>,
}

impl AlertManager {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Feed one evaluation for one unit. Returns the transitions it caused,
    /// possibly none.
    pub fn evaluate(
        &mut self,
        unit_id: &str,
        site_id: &str,
        tier: Tier,
        early_warning: Option<&EarlyWarning>,
        triggers: &[ParameterKind],
        now: DateTime<Utc>,
    ) -> Vec<AlertTransition> {
        let target = AlertSeverity::from_tier(tier)
            .or_else(|| early_warning.map(|_| AlertSeverity::Watch));

        match target {
            Some(severity) => {
                self.clear_streaks.insert(unit_id.to_string(), 0);
                self.raise(unit_id, site_id, severity, triggers, now)
            }
            None => self.record_clear(unit_id, now),
        }
    }

    fn raise(
        &mut self,
        unit_id: &str,
        site_id: &str,
        severity: AlertSeverity,
        triggers: &[ParameterKind],
        now: DateTime<Utc>,
    ) -> Vec<AlertTransition> {
        match self.active.get_mut(unit_id) {
            None => {
                let alert = Alert {
                    alert_id: Uuid::new_v4(),
                    unit_id: unit_id.to_string(),
                    site_id: site_id.to_string(),
                    severity,
                    state: AlertState::Open,
                    opened_at: now,
                    acknowledged_at: None,
                    resolved_at: None,
                    trigger_parameters: triggers.to_vec(),
                };
                let transition = AlertTransition::Opened {
                    alert_id: alert.alert_id,
                    unit_id: unit_id.to_string(),
                    severity,
                };
                self.active.insert(unit_id.to_string(), alert);
                vec![transition]
            }
            Some(alert) if severity > alert.severity => {
                let from = alert.severity;
                alert.severity = severity;
                for kind in triggers {
                    if !alert.trigger_parameters.contains(kind) {
                        alert.trigger_parameters.push(*kind);
                    }
                }
                vec![AlertTransition::Escalated {
                    alert_id: alert.alert_id,
                    from,
                    to: severity,
                }]
            }
            Some(alert) if severity < alert.severity => {
                let from = alert.severity;
                alert.severity = severity;
                vec![AlertTransition::Deescalated {
                    alert_id: alert.alert_id,
                    from,
                    to: severity,
                }]
            }
            // Equal severity already tracked: dedup, no new alert.
            Some(_) => Vec::new(),
        }
    }

    fn record_clear(&mut self, unit_id: &str, now: DateTime<Utc>) -> Vec<AlertTransition> {
        if !self.active.contains_key(unit_id) {
            return Vec::new();
        }
        let streak = self
            .clear_streaks
            .entry(unit_id.to_string())
            .or_insert(0);
        *streak += 1;
        if *streak < self.config.clear_streak {
            return Vec::new();
        }

        let Some(mut alert) = self.active.remove(unit_id) else {
            return Vec::new();
        };
        self.clear_streaks.remove(unit_id);
        alert.state = AlertState::Resolved;
        alert.resolved_at = Some(now);
        let transition = AlertTransition::Resolved {
            alert_id: alert.alert_id,
            unit_id: unit_id.to_string(),
        };
        self.resolved.push(alert);
        vec![transition]
    }

    /// Operator acknowledgement: OPEN → ACKNOWLEDGED.
    pub fn acknowledge(&mut self, alert_id: Uuid, now: DateTime<Utc>) -> Option<AlertTransition> {
        let alert = self
            .active
            .values_mut()
            .find(|a| a.alert_id == alert_id && a.state == AlertState::Open)?;
        alert.state = AlertState::Acknowledged;
        alert.acknowledged_at = Some(now);
        Some(AlertTransition::Acknowledged { alert_id })
    }

    /// The unit's non-resolved alert, if any.
    pub fn open_alert(&self, unit_id: &str) -> Option<&Alert> {
        self.active.get(unit_id)
    }

    pub fn open_count(&self) -> usize {
        self.active.len()
    }

    /// Resolved alerts, oldest first. Never deleted.
    pub fn resolved_history(&self) -> &[Alert] {
        &self.resolved
    }
}
