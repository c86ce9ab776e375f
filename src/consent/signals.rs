//! Consent-mode signal channels derived from a decision.

use super::decision::{ConsentDecision, NECESSARY, STATISTICS};
use crate::page::tag_manager::CONSENT_UPDATE_EVENT;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SignalChannel {
    AdStorage,
    AnalyticsStorage,
    PersonalizationStorage,
    FunctionalityStorage,
    SecurityStorage,
}

impl SignalChannel {
    pub const ALL: [SignalChannel; 5] = [
        SignalChannel::AdStorage,
        SignalChannel::AnalyticsStorage,
        SignalChannel::PersonalizationStorage,
        SignalChannel::FunctionalityStorage,
        SignalChannel::SecurityStorage,
    ];

    /// The category that grants this channel; `None` for always-granted.
    pub fn category(self) -> Option<&'static str> {
        match self {
            SignalChannel::AdStorage => Some("marketing"),
            SignalChannel::AnalyticsStorage => Some(STATISTICS),
            SignalChannel::PersonalizationStorage => Some("preferences"),
            SignalChannel::FunctionalityStorage => Some(NECESSARY),
            SignalChannel::SecurityStorage => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SignalValue {
    Granted,
    Denied,
}

impl From<bool> for SignalValue {
    fn from(granted: bool) -> Self {
        if granted { Self::Granted } else { Self::Denied }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConsentStatus {
    AllAccepted,
    Partial,
    /// No decision recorded yet.
    Pending,
}

/// Channel → granted/denied. Always holds all five channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentSignalState(BTreeMap<SignalChannel, SignalValue>);

impl ConsentSignalState {
    /// Recompute every channel from `decision`; absent means denied.
    pub fn from_decision(decision: Option<&ConsentDecision>) -> Self {
        Self(
            SignalChannel::ALL
                .into_iter()
                .map(|channel| {
                    let granted = match channel.category() {
                        None => true,
                        Some(key) => decision.is_some_and(|decision| decision.is_granted(key)),
                    };
                    (channel, SignalValue::from(granted))
                })
                .collect(),
        )
    }

    pub fn get(&self, channel: SignalChannel) -> SignalValue {
        self.0
            .get(&channel)
            .copied()
            .unwrap_or(SignalValue::Denied)
    }

    pub fn is_granted(&self, channel: SignalChannel) -> bool {
        self.get(channel) == SignalValue::Granted
    }

    pub fn channels(&self) -> impl Iterator<Item = (SignalChannel, SignalValue)> + '_ {
        self.0.iter().map(|(channel, value)| (*channel, *value))
    }
}

/// The `consent_update` entry pushed onto the tag-manager queue.
pub fn consent_update_event(
    signals: &ConsentSignalState,
    decision: Option<&ConsentDecision>,
) -> Value {
    let (categories, status) = match decision {
        Some(decision) if decision.all_granted() => {
            (decision.granted_keys(), ConsentStatus::AllAccepted)
        }
        Some(decision) => (decision.granted_keys(), ConsentStatus::Partial),
        None => (Vec::new(), ConsentStatus::Pending),
    };
    json!({
        "event": CONSENT_UPDATE_EVENT,
        "consent_state": signals,
        "consent_categories": categories,
        "consent_status": status,
    })
}
