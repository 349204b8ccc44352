//! Prompt templates for the two transform modes.

use crate::error::CulinaryError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the model should restage the dish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Contextual replating: setting, utensils and garnish chosen to suit the dish.
    #[default]
    Reimagine,
    /// Fixed studio shot on a white plate, 45-degree angle.
    Polish,
}

impl TransformMode {
    /// All modes, in display order.
    pub const ALL: [TransformMode; 2] = [Self::Reimagine, Self::Polish];

    /// Returns the mode identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reimagine => "reimagine",
            Self::Polish => "polish",
        }
    }

    /// Returns a short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Reimagine => "Reimagine plating and setting to suit the dish",
            Self::Polish => "Clean white-plate studio shot at a 45-degree angle",
        }
    }

    /// Whether the prompt for this mode uses the food label.
    pub fn uses_label(&self) -> bool {
        matches!(self, Self::Reimagine)
    }
}

impl std::fmt::Display for TransformMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformMode {
    type Err = CulinaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reimagine" => Ok(Self::Reimagine),
            "polish" => Ok(Self::Polish),
            other => Err(CulinaryError::InvalidRequest(format!(
                "unknown mode '{other}' (expected reimagine or polish)"
            ))),
        }
    }
}

const POLISH_PROMPT: &str = "A professional food photography shot of the dish from the reference image. \
The dish should be artfully arranged on a clean, pristine white ceramic plate. \
The photo is taken from a 45-degree angle in a bright, minimalist studio environment with soft, diffused lighting. \
The focus is sharp on the food, with a slightly blurred background. \
Photorealistic, high detail, appetizing. The final image must have a 1:1 aspect ratio.";

/// Trims a food label, treating empty or blank labels as absent.
pub fn normalize_label(label: Option<&str>) -> Option<&str> {
    label.map(str::trim).filter(|l| !l.is_empty())
}

/// Builds the instruction sent to the model alongside the photo.
///
/// `Polish` ignores the label entirely.
pub fn build_prompt(mode: TransformMode, label: Option<&str>) -> String {
    match mode {
        TransformMode::Reimagine => {
            let subject = match normalize_label(label) {
                Some(label) => format!("of {label}"),
                None => "of food".to_string(),
            };
            format!(
                "Transform this image {subject} into a professional food photograph. \
The photo must have a 1:1 aspect ratio and professional food photography lighting. \
Reimagine the plating and presentation to be highly contextual and authentic to the dish. \
For example, rustic pasta might be in a warm, ceramic bowl, while delicate sushi could be on a minimalist slate. \
The setting, utensils, and garnishes must complement the food's origin and style. \
The final composition should be elegant, making the dish look incredibly delicious and appetizing. \
Enhance colors and textures to make the dish pop."
            )
        }
        TransformMode::Polish => POLISH_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reimagine_uses_label() {
        let prompt = build_prompt(TransformMode::Reimagine, Some("Angus Burger"));
        assert!(prompt.contains("of Angus Burger"));
        assert!(!prompt.contains("of food"));
        assert!(prompt.contains("1:1 aspect ratio"));
    }

    #[test]
    fn test_reimagine_without_label_falls_back_to_food() {
        let prompt = build_prompt(TransformMode::Reimagine, None);
        assert!(prompt.contains("of food"));
        assert!(prompt.contains("lighting"));
    }

    #[test]
    fn test_blank_label_counts_as_missing() {
        assert_eq!(
            build_prompt(TransformMode::Reimagine, Some("   ")),
            build_prompt(TransformMode::Reimagine, None)
        );
        assert!(build_prompt(TransformMode::Reimagine, Some("  Ramen ")).contains("of Ramen into"));
    }

    #[test]
    fn test_polish_ignores_label() {
        let without = build_prompt(TransformMode::Polish, None);
        let with = build_prompt(TransformMode::Polish, Some("Angus Burger"));
        assert_eq!(without, with);
        assert!(without.contains("white ceramic plate"));
        assert!(without.contains("45-degree angle"));
        assert!(without.contains("1:1 aspect ratio"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("reimagine".parse::<TransformMode>().unwrap(), TransformMode::Reimagine);
        assert_eq!(" Polish ".parse::<TransformMode>().unwrap(), TransformMode::Polish);
        assert!(matches!(
            "sepia".parse::<TransformMode>(),
            Err(CulinaryError::InvalidRequest(ref m)) if m.contains("sepia")
        ));
        assert_eq!(TransformMode::default(), TransformMode::Reimagine);
    }

    #[test]
    fn test_mode_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransformMode::Polish).unwrap(),
            "\"polish\""
        );
        let mode: TransformMode = serde_json::from_str("\"reimagine\"").unwrap();
        assert_eq!(mode, TransformMode::Reimagine);
    }
}
