use std::fmt;

use claimsync_types::{Address, Claim, ClaimId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message bus topics (exchange names on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// A claim was written and its address is now known.
    #[serde(rename = "CLAIM_IPFS_HASH")]
    ClaimAddressKnown,
    /// A previously unresolved address was fetched and validated.
    #[serde(rename = "CLAIMS_DOWNLOADED")]
    ClaimResolved,
}

impl Topic {
    /// The exchange name used on the bus.
    pub fn exchange(&self) -> &'static str {
        match self {
            Self::ClaimAddressKnown => "CLAIM_IPFS_HASH",
            Self::ClaimResolved => "CLAIMS_DOWNLOADED",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.exchange())
    }
}

/// Payload carried by a claim event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimEvent {
    /// `{ claimId, address }` published by the write path.
    #[serde(rename_all = "camelCase")]
    AddressKnown { claim_id: ClaimId, address: Address },
    /// `{ claim, address }` published by the read path.
    Resolved { claim: Claim, address: Address },
}

impl ClaimEvent {
    /// The topic this payload is published on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::AddressKnown { .. } => Topic::ClaimAddressKnown,
            Self::Resolved { .. } => Topic::ClaimResolved,
        }
    }

    /// The content address the event refers to.
    pub fn address(&self) -> &Address {
        match self {
            Self::AddressKnown { address, .. } | Self::Resolved { address, .. } => address,
        }
    }

    /// The claim id the event refers to.
    pub fn claim_id(&self) -> &ClaimId {
        match self {
            Self::AddressKnown { claim_id, .. } => claim_id,
            Self::Resolved { claim, .. } => &claim.id,
        }
    }
}

/// Unique identifier of one publication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// A new time-ordered identifier (UUID v7).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt:{}", self.0)
    }
}

/// An event as it went out on the bus.
///
/// Republishing the same payload produces a new `id` and `published_at`
/// but an identical `payload`, so consumers deduplicate on content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedEvent {
    pub id: EventId,
    pub topic: Topic,
    pub published_at: Timestamp,
    pub payload: ClaimEvent,
}

impl PublishedEvent {
    pub fn new(payload: ClaimEvent) -> Self {
        Self {
            id: EventId::new(),
            topic: payload.topic(),
            published_at: Timestamp::now(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use claimsync_types::ClaimType;

    fn claim() -> Claim {
        Claim {
            id: ClaimId::new("c1"),
            claim_type: ClaimType::Work,
            public_key: "pk".into(),
            signature: "sig".into(),
            date_created: chrono::Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap(),
            attributes: Default::default(),
        }
    }

    #[test]
    fn topics_map_to_exchange_names() {
        assert_eq!(Topic::ClaimAddressKnown.exchange(), "CLAIM_IPFS_HASH");
        assert_eq!(Topic::ClaimResolved.to_string(), "CLAIMS_DOWNLOADED");
        assert_eq!(
            serde_json::to_string(&Topic::ClaimResolved).unwrap(),
            "\"CLAIMS_DOWNLOADED\""
        );
    }

    #[test]
    fn address_known_payload_shape() {
        let event = ClaimEvent::AddressKnown {
            claim_id: ClaimId::new("c1"),
            address: Address::new("h1").unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({ "claimId": "c1", "address": "h1" }));
        assert_eq!(event.topic(), Topic::ClaimAddressKnown);
    }

    #[test]
    fn resolved_payload_carries_claim() {
        let event = ClaimEvent::Resolved {
            claim: claim(),
            address: Address::new("h1").unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["claim"]["id"], "c1");
        assert_eq!(json["address"], "h1");
        assert_eq!(event.claim_id().as_str(), "c1");
        assert_eq!(event.topic(), Topic::ClaimResolved);
    }

    #[test]
    fn republishing_keeps_payload_but_not_id() {
        let payload = ClaimEvent::AddressKnown {
            claim_id: ClaimId::new("c1"),
            address: Address::new("h1").unwrap(),
        };
        let a = PublishedEvent::new(payload.clone());
        let b = PublishedEvent::new(payload);
        assert_ne!(a.id, b.id);
        assert_eq!(a.payload, b.payload);
    }
}
