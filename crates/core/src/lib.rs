//! The three backing entity services.
//!
//! Each service owns its store exclusively: reads are synchronous, writes
//! happen only by consuming CREATE/DELETE events from its channel binding.
//! The repository traits stand in for the real persistence engines, which
//! are external collaborators.

pub mod error;
pub mod product;
pub mod recommendation;
pub mod review;

pub use error::RepositoryError;
pub use product::{InMemoryProductRepository, ProductEventConsumer, ProductRepository, ProductService};
pub use recommendation::{
    InMemoryRecommendationRepository, RecommendationEventConsumer, RecommendationRepository,
    RecommendationService,
};
pub use review::{InMemoryReviewRepository, ReviewEventConsumer, ReviewRepository, ReviewService};
