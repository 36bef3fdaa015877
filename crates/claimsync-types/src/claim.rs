use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a claim, assigned by its author.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(String);

impl ClaimId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimId({})", self.0)
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of a claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    Identity,
    Work,
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Identity => "Identity",
            Self::Work => "Work",
        };
        write!(f, "{s}")
    }
}

/// An immutable signed record.
///
/// Signature verification belongs to the caller that admits a claim on the
/// write path. On the read path bytes arrive from an untrusted store, so
/// [`Claim::from_slice`] re-checks that they decode into a well-formed claim.
///
/// Field order is fixed by this struct and attributes are held in a
/// `BTreeMap`, so [`Claim::to_canonical_bytes`] is deterministic: the same
/// claim always maps to the same content address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: ClaimId,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    pub public_key: String,
    pub signature: String,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Claim {
    /// Decode a claim from bytes and check that it is well formed.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let claim: Claim = serde_json::from_slice(bytes)
            .map_err(|e| TypeError::MalformedClaim(e.to_string()))?;
        claim.validate()?;
        Ok(claim)
    }

    /// Canonical byte form used when storing the claim.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Structural well-formedness check: identifying fields must be present.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.id.is_empty() {
            return Err(TypeError::MalformedClaim("missing id".into()));
        }
        if self.public_key.trim().is_empty() {
            return Err(TypeError::MalformedClaim("missing publicKey".into()));
        }
        if self.signature.trim().is_empty() {
            return Err(TypeError::MalformedClaim("missing signature".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Claim {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), "The Raven".to_string());
        attributes.insert("author".to_string(), "Edgar Allan Poe".to_string());
        Claim {
            id: ClaimId::new("a1b2c3"),
            claim_type: ClaimType::Work,
            public_key: "02db393ae2d5".into(),
            signature: "304402201d".into(),
            date_created: Utc.with_ymd_and_hms(2018, 3, 1, 12, 0, 0).unwrap(),
            attributes,
        }
    }

    #[test]
    fn canonical_bytes_are_stable() {
        let claim = sample();
        assert_eq!(
            claim.to_canonical_bytes().unwrap(),
            claim.clone().to_canonical_bytes().unwrap()
        );
    }

    #[test]
    fn wire_form_uses_camel_case_and_type_key() {
        let json: serde_json::Value =
            serde_json::from_slice(&sample().to_canonical_bytes().unwrap()).unwrap();
        assert_eq!(json["type"], "Work");
        assert_eq!(json["publicKey"], "02db393ae2d5");
        assert!(json.get("dateCreated").is_some());
    }

    #[test]
    fn decodes_canonical_bytes() {
        let claim = sample();
        let decoded = Claim::from_slice(&claim.to_canonical_bytes().unwrap()).unwrap();
        assert_eq!(decoded, claim);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = Claim::from_slice(b"not json at all").unwrap_err();
        assert!(matches!(err, TypeError::MalformedClaim(_)));
    }

    #[test]
    fn json_that_is_not_a_claim_is_malformed() {
        let err = Claim::from_slice(br#"{"hello":"world"}"#).unwrap_err();
        assert!(matches!(err, TypeError::MalformedClaim(_)));
    }

    #[test]
    fn empty_signature_is_malformed() {
        let mut claim = sample();
        claim.signature = String::new();
        let bytes = serde_json::to_vec(&claim).unwrap();
        let err = Claim::from_slice(&bytes).unwrap_err();
        assert_eq!(err, TypeError::MalformedClaim("missing signature".into()));
    }

    #[test]
    fn missing_attributes_default_to_empty() {
        let raw = br#"{
            "id": "x",
            "type": "Identity",
            "publicKey": "pk",
            "signature": "sig",
            "dateCreated": "2018-03-01T12:00:00Z"
        }"#;
        let claim = Claim::from_slice(raw).unwrap();
        assert_eq!(claim.claim_type, ClaimType::Identity);
        assert!(claim.attributes.is_empty());
    }
}
