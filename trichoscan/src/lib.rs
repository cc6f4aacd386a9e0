//! AI hair & scalp analysis orchestration over a pool of Gemini credentials.
//!
//! The library exposes two operations: [`Analyzer::analyze`] turns user
//! images into categorized findings (or a rejection when the images are not
//! a valid subject), and [`Recommender::recommend`] turns a questionnaire
//! profile, findings, goals and a product catalog into a personalized care
//! routine. Both run against a [`FailoverChain`] of credential-bound Gemini
//! clients built by [`CredentialPoolBuilder`].

mod analysis;
mod catalog;
mod pool;
mod profile;
mod routine;

pub use analysis::{
    AnalysisOutcome, Analyzer, BoundingBox, Condition, ConditionBox, ConditionCategory,
    ANALYSIS_CATEGORIES,
};
pub use catalog::Product;
pub use pool::{CredentialPoolBuilder, API_KEYS_ENV, DEFAULT_MODEL};
pub use profile::{HairProfile, ProfileAnswer};
pub use routine::{AlternativeProduct, Recommendation, Recommender, RoutinePlan, RoutineStep};

pub use trichoscan_core::{
    FailoverChain, Generate, GenerationConfig, GenerationRequest, GenerationResponse, ImageBlob,
    InlinePart, Part, ProviderErrorKind, TrichoscanError,
};
pub use trichoscan_gemini::GeminiClient;
