//! Submission schema shared by the composer and the relay.
//!
//! Both sides speak the same wire names: the composer when it builds the
//! multipart body, the relay when it rebuilds the payload for the collector.
//! The normalization rules live here so the relay can re-apply them at the
//! boundary closest to the collector.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire name of the county field.
pub const COUNTY_FIELD: &str = "county";

/// The value the collector expects for the state's most populous
/// county-equivalent, whichever display variant was selected.
pub const CANONICAL_COUNTY: &str = "Saint Louis";

const COUNTY_VARIANTS: &[&str] = &["Saint Louis County", "Saint Louis City"];

/// Value supplied for a field switched into "not applicable" mode.
pub const NOT_APPLICABLE: &str = "NA";

/// Media type used for a file part that did not declare one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Path of the submission endpoint. The name is historical.
pub const SUBMIT_PATH: &str = "/api/county";

/// JSON body returned by the submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ack {
    Success { success: bool },
    Error { error: String },
    Message { message: String },
}

impl Ack {
    pub fn success() -> Self {
        Ack::Success { success: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Ack::Error {
            error: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Ack::Message {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Ack::Success { success: true })
    }

    /// Human readable text carried by a non-success acknowledgment.
    pub fn text(&self) -> Option<&str> {
        match self {
            Ack::Success { .. } => None,
            Ack::Error { error } => Some(error),
            Ack::Message { message } => Some(message),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    InsuredName,
    StreetAddress,
    City,
    State,
    ZipCode,
    County,
    PolicyNumber,
    ClaimNumber,
    DateOfLoss,
    InsuranceCompany,
    InsuranceStreetAddress,
    InsuranceCity,
    InsuranceState,
    InsuranceZipCode,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::InsuredName,
        Field::StreetAddress,
        Field::City,
        Field::State,
        Field::ZipCode,
        Field::County,
        Field::PolicyNumber,
        Field::ClaimNumber,
        Field::DateOfLoss,
        Field::InsuranceCompany,
        Field::InsuranceStreetAddress,
        Field::InsuranceCity,
        Field::InsuranceState,
        Field::InsuranceZipCode,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Field::InsuredName => "insuredName",
            Field::StreetAddress => "streetAddress",
            Field::City => "city",
            Field::State => "state",
            Field::ZipCode => "zipCode",
            Field::County => COUNTY_FIELD,
            Field::PolicyNumber => "policyNumber",
            Field::ClaimNumber => "claimNumber",
            Field::DateOfLoss => "dateOfLoss",
            Field::InsuranceCompany => "insuranceCompany",
            Field::InsuranceStreetAddress => "insuranceStreetAddress",
            Field::InsuranceCity => "insuranceCity",
            Field::InsuranceState => "insuranceState",
            Field::InsuranceZipCode => "insuranceZipCode",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Every field is required by the form gate.
    pub const fn is_required(&self) -> bool {
        true
    }

    /// The county is picked from a fixed list, so it has no "not applicable"
    /// mode. Every free-text field does.
    pub fn accepts_not_applicable(&self) -> bool {
        *self != Field::County
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named document category a file may be placed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentSlot {
    AobContract,
    DamagePicture,
    Denial,
    HoverReport1,
    ItelReport,
    InsuranceEstimate,
    HisHersEstimate,
    Correspondent,
}

impl AttachmentSlot {
    pub const ALL: [AttachmentSlot; 8] = [
        AttachmentSlot::AobContract,
        AttachmentSlot::DamagePicture,
        AttachmentSlot::Denial,
        AttachmentSlot::HoverReport1,
        AttachmentSlot::ItelReport,
        AttachmentSlot::InsuranceEstimate,
        AttachmentSlot::HisHersEstimate,
        AttachmentSlot::Correspondent,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            AttachmentSlot::AobContract => "aobContract",
            AttachmentSlot::DamagePicture => "damagePicture",
            AttachmentSlot::Denial => "denial",
            AttachmentSlot::HoverReport1 => "hoverReport1",
            AttachmentSlot::ItelReport => "itelReport",
            AttachmentSlot::InsuranceEstimate => "insuranceEstimate",
            AttachmentSlot::HisHersEstimate => "hisHersEstimate",
            AttachmentSlot::Correspondent => "correspondent",
        }
    }

    pub fn from_name(name: &str) -> Option<AttachmentSlot> {
        AttachmentSlot::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Only the contract document is mandatory.
    pub const fn is_required(&self) -> bool {
        matches!(self, AttachmentSlot::AobContract)
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapses both display variants of the largest county-equivalent into the
/// name the collector expects. Other values pass through.
pub fn canonical_county(value: &str) -> &str {
    if COUNTY_VARIANTS.contains(&value) {
        CANONICAL_COUNTY
    } else {
        value
    }
}

/// Trims a field value and applies the county rewrite when `name` is the
/// county field.
pub fn normalize_field(name: &str, value: &str) -> String {
    let trimmed = value.trim();
    if name == COUNTY_FIELD {
        canonical_county(trimmed).to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name used for a part that arrived without one.
pub fn fallback_file_name(part_name: &str) -> String {
    format!("{part_name}.file")
}
