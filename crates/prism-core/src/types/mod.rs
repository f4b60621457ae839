//! Data model for PRISM: identifiers, response records, scale definitions,
//! cohort windows, and the persisted result rows.

pub mod cohort;
pub mod identifiers;
pub mod responses;
pub mod results;

pub use cohort::CohortWindow;
pub use identifiers::{QuestionId, ResultsVersion, ScaleCode, SessionId, UserId};
pub use responses::{ResponseRecord, RetestCandidate, ScaleDefinition, ScaleItem};
pub use results::{
    CfaFitResult, ItemStatResult, LoadingResult, ReliabilityResult, RetestPairResult,
    ScaleResultBatch, ScaleResultScope,
};
