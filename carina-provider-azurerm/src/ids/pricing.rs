//! ID of a Microsoft Defender for Cloud (Security Center) pricing

use std::fmt;

use super::{IdError, Segment, SegmentTemplate};

const TEMPLATE: SegmentTemplate = SegmentTemplate {
    kind: "Pricing",
    segments: &[
        Segment::Static("subscriptions"),
        Segment::User("subscriptionId"),
        Segment::Static("providers"),
        Segment::Static("Microsoft.Security"),
        Segment::Static("pricings"),
        Segment::User("pricingName"),
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PricingId {
    pub subscription_id: String,
    pub pricing_name: String,
}

impl PricingId {
    pub fn new(subscription_id: impl Into<String>, pricing_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            pricing_name: pricing_name.into(),
        }
    }

    pub fn id(&self) -> String {
        format!(
            "/subscriptions/{}/providers/Microsoft.Security/pricings/{}",
            self.subscription_id, self.pricing_name
        )
    }

    /// Parse with case-sensitive literal segments
    pub fn parse(input: &str) -> Result<Self, IdError> {
        Self::from_values(TEMPLATE.match_input(input, false)?)
    }

    /// Parse accepting literal segments in any casing
    pub fn parse_insensitively(input: &str) -> Result<Self, IdError> {
        Self::from_values(TEMPLATE.match_input(input, true)?)
    }

    fn from_values(values: Vec<String>) -> Result<Self, IdError> {
        let mut values = values.into_iter();
        match (values.next(), values.next()) {
            (Some(subscription_id), Some(pricing_name)) => Ok(Self {
                subscription_id,
                pricing_name,
            }),
            _ => Err(IdError::MissingSegment("pricingName".to_string())),
        }
    }

    /// Import-ID check
    pub fn validate(input: &str) -> Result<(), String> {
        Self::parse(input).map(|_| ()).map_err(|e| e.to_string())
    }
}

impl fmt::Display for PricingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pricing (Subscription: {:?}, Pricing Name: {:?})",
            self.subscription_id, self.pricing_name
        )
    }
}
