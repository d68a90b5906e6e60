use std::collections::BTreeSet;

use serde::Serialize;

pub const SUCCESS_FEEDBACK: &str = "Perfect! Your entire body is visible and well-positioned.";

const HINT_SEPARATOR: &str = " • ";

/// User-facing guidance. Declaration order is presentation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackHint {
    ShowFace,
    ShowFeet,
    ShowFullBody,
    MoveCloser,
    StepBack,
    CenterYourself,
    LeaveMargin,
    AdjustPosition,
}

impl FeedbackHint {
    pub fn message(self) -> &'static str {
        match self {
            FeedbackHint::ShowFace => "Ensure your face is visible",
            FeedbackHint::ShowFeet => "Ensure your feet and ankles are visible (legs are cut off)",
            FeedbackHint::ShowFullBody => "Ensure your entire body is visible",
            FeedbackHint::MoveCloser => "Move closer to the camera",
            FeedbackHint::StepBack => "Step back so your head and feet both fit in the frame",
            FeedbackHint::CenterYourself => "Center yourself in the frame",
            FeedbackHint::LeaveMargin => "Leave some space above your head and below your feet",
            FeedbackHint::AdjustPosition => "Adjust your position so your full body is clearly visible",
        }
    }
}

/// Render hints in their fixed order. An invalid result with no specific hint
/// still gets the generic one.
pub fn render_feedback(is_valid: bool, hints: &BTreeSet<FeedbackHint>) -> String {
    if is_valid {
        return SUCCESS_FEEDBACK.to_string();
    }
    if hints.is_empty() {
        return FeedbackHint::AdjustPosition.message().to_string();
    }
    hints
        .iter()
        .map(|h| h.message())
        .collect::<Vec<_>>()
        .join(HINT_SEPARATOR)
}
