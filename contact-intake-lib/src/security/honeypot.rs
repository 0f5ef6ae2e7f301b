use crate::intake::SubmissionPayload;

/// Returns true when the hidden honeypot field was filled in.
///
/// Humans never see the field, so any content (whitespace included) marks
/// the submission as automated.
pub fn is_spam(payload: &SubmissionPayload) -> bool {
    payload.honeypot.as_deref().is_some_and(|v| !v.is_empty())
}
