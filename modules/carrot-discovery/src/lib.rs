pub mod plan;
pub mod planner;
pub mod quote;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod validator;
pub mod vetter;

pub use plan::{build_fallback_plan, ensure_plan_defaults, DiscoveryPlan, PlannerSeedCandidate};
pub use planner::{seed_frontier_from_plan, Planner, PlannerOptions, SeedingReport};
pub use quote::{extract_fair_use_quote, FairUseQuote};
pub use traits::{FrontierItem, FrontierStore, PlanStore};
pub use validator::{validate_planner_plan, PlanRejection, PlanValidation};
pub use vetter::{VetInput, Vetter, VetterError, VetterOptions, VetterResult};
