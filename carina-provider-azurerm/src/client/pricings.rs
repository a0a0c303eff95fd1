//! Defender for Cloud pricing operations (Microsoft.Security, 2023-01-01)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ArmClient, ArmResult};
use crate::ids::PricingId;

pub const API_VERSION: &str = "2023-01-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingTier {
    Free,
    Standard,
}

impl PricingTier {
    pub const ALL: [PricingTier; 2] = [PricingTier::Free, PricingTier::Standard];

    pub fn as_str(&self) -> &'static str {
        match self {
            PricingTier::Free => "Free",
            PricingTier::Standard => "Standard",
        }
    }
}

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PricingTier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown pricing tier {:?}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PricingProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingProperties {
    pub pricing_tier: PricingTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_plan: Option<String>,
    /// Read-only
    #[serde(default, skip_serializing)]
    pub free_trial_remaining_time: Option<String>,
}

impl Pricing {
    /// Request body setting a tier and optional sub-plan
    pub fn with_tier(tier: PricingTier, sub_plan: Option<String>) -> Self {
        Self {
            id: None,
            name: None,
            properties: Some(PricingProperties {
                pricing_tier: tier,
                sub_plan,
                free_trial_remaining_time: None,
            }),
        }
    }

    pub fn tier(&self) -> Option<PricingTier> {
        self.properties.as_ref().map(|p| p.pricing_tier)
    }
}

/// Typed client for subscription pricings
#[derive(Clone)]
pub struct PricingsClient {
    arm: ArmClient,
}

impl PricingsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    /// `None` when the pricing does not exist; an empty success body is a
    /// pricing without properties
    pub async fn get(&self, id: &PricingId) -> ArmResult<Option<Pricing>> {
        match self.arm.get(&id.id(), API_VERSION).await {
            Ok(response) => match response.body {
                Some(body) => Ok(Some(serde_json::from_value(body)?)),
                None => Ok(Some(Pricing::default())),
            },
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn update(&self, id: &PricingId, pricing: &Pricing) -> ArmResult<()> {
        let body = serde_json::to_value(pricing)?;
        self.arm.put(&id.id(), API_VERSION, Some(body)).await?;
        Ok(())
    }
}
