use serde::{Deserialize, Serialize};

/// A product as served by the product entity service.
///
/// `service_address` is stamped at read time to identify which physical
/// instance answered; it is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: i32,
    pub name: String,
    pub weight: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
}

impl Product {
    pub fn new(product_id: i32, name: impl Into<String>, weight: i32) -> Self {
        Self {
            product_id,
            name: name.into(),
            weight,
            service_address: None,
        }
    }
}

/// A recommendation, keyed by (product_id, recommendation_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub product_id: i32,
    pub recommendation_id: i32,
    pub author: String,
    pub rate: i32,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
}

/// A review, keyed by (product_id, review_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub product_id: i32,
    pub review_id: i32,
    pub author: String,
    pub subject: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
}

/// Recommendation fields exposed through the composite view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSummary {
    pub recommendation_id: i32,
    pub author: String,
    pub rate: i32,
    pub content: String,
}

impl From<&Recommendation> for RecommendationSummary {
    fn from(r: &Recommendation) -> Self {
        Self {
            recommendation_id: r.recommendation_id,
            author: r.author.clone(),
            rate: r.rate,
            content: r.content.clone(),
        }
    }
}

/// Review fields exposed through the composite view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub review_id: i32,
    pub author: String,
    pub subject: String,
    pub content: String,
}

impl From<&Review> for ReviewSummary {
    fn from(r: &Review) -> Self {
        Self {
            review_id: r.review_id,
            author: r.author.clone(),
            subject: r.subject.clone(),
            content: r.content.clone(),
        }
    }
}

/// The addresses of every instance involved in answering a composite read.
///
/// A branch that contributed nothing (empty collection) reports an empty
/// string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAddresses {
    pub composite: String,
    pub product: String,
    pub recommendation: String,
    pub review: String,
}

/// The composite view of a product and its dependent collections.
///
/// Ephemeral: built per request from whatever the three backing services
/// returned, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAggregate {
    pub product_id: i32,
    pub name: String,
    pub weight: i32,
    #[serde(default)]
    pub recommendations: Vec<RecommendationSummary>,
    #[serde(default)]
    pub reviews: Vec<ReviewSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_addresses: Option<ServiceAddresses>,
}
