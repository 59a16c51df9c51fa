use serde::{Deserialize, Serialize};

/// Health of a single component or of the whole composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Up,
    Down,
}

impl Status {
    pub fn is_up(&self) -> bool {
        matches!(self, Status::Up)
    }
}

/// Per-dependency health of the three backing services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthComponents {
    pub product: Status,
    pub recommendation: Status,
    pub review: Status,
}

/// The aggregated health view: overall status plus one entry per dependency.
///
/// Overall status is DOWN as soon as any component is DOWN; producing this
/// report never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: Status,
    pub components: HealthComponents,
}

impl HealthReport {
    pub fn new(product: Status, recommendation: Status, review: Status) -> Self {
        let status = if product.is_up() && recommendation.is_up() && review.is_up() {
            Status::Up
        } else {
            Status::Down
        };
        Self {
            status,
            components: HealthComponents {
                product,
                recommendation,
                review,
            },
        }
    }
}
