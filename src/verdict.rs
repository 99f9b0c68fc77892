use crate::types::Prediction;

pub const HOTDOG_LABEL: &str = "hotdog";
pub const HOTDOG_MESSAGE: &str = "Yes, that looks like a hot dog";
pub const UNKNOWN_MESSAGE: &str = "Could not determine what that is.  Try another image.";

/// True when the classifier's top-ranked label is exactly `hotdog`.
pub fn is_hotdog(predictions: &[Prediction]) -> bool {
    predictions
        .first()
        .is_some_and(|top| top.label == HOTDOG_LABEL)
}

pub fn best_guess_message(labels: &[Prediction]) -> String {
    match labels.first() {
        Some(best) => format!("My best guess is that's a {}", best.label),
        None => UNKNOWN_MESSAGE.to_string(),
    }
}
