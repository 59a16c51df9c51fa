pub mod error;
pub mod types;
pub mod util;

pub use error::{ErrorKind, HttpErrorInfo, Result, ServiceError};
pub use types::{
    Product, ProductAggregate, Recommendation, RecommendationSummary, Review, ReviewSummary,
    ServiceAddresses,
};
pub use util::ServiceUtil;
