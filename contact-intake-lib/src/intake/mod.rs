pub mod payload;
pub mod pipeline;
pub mod rejection;
pub mod response;
pub mod validator;

pub use payload::{SubmissionPayload, SubmissionRecord, ValidSubmission};
pub use pipeline::IntakePipeline;
pub use rejection::Rejection;
pub use response::{IntakeResponse, ResponseBody};
pub use validator::{validate, RequiredField, ValidationError};
