//! Composite orchestration layer.
//!
//! Builds the product aggregate from three independently available backing
//! services (concurrent fan-out, per-branch failure isolation) and fans
//! writes out as events over the channel, accepting eventual consistency in
//! exchange for never needing a distributed transaction.

pub mod aggregator;
pub mod gateway;
pub mod health;
pub mod transport;

pub use aggregator::{
    PRODUCTS_BINDING, RECOMMENDATIONS_BINDING, REVIEWS_BINDING, ProductCompositeService,
};
pub use gateway::{
    CoreGateway, HealthProbe, ProductReads, RecommendationReads, ReviewReads,
};
pub use health::{HealthComponents, HealthReport, Status};
pub use transport::{Transport, TransportError};
