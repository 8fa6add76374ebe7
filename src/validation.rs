use std::fmt;

use crate::config::OptionLimits;
use crate::error::ValidationError;
use crate::models::{GenerationOptions, ModelVariant};

/// Non-fatal notice that some supplied options will not reach the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub variant: ModelVariant,
    pub ignored: Vec<&'static str>,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let other = match self.variant {
            ModelVariant::Pro => ModelVariant::Ultra,
            ModelVariant::Ultra => ModelVariant::Pro,
        };
        write!(
            f,
            "{} model params ignored for {} model: {}",
            capitalize(&other.to_string()),
            capitalize(&self.variant.to_string()),
            self.ignored.join(", ")
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Options that belong to the other variant and will be dropped from the payload.
pub fn advisories(options: &GenerationOptions) -> Vec<Advisory> {
    let mut ignored = Vec::new();
    match options.variant {
        ModelVariant::Ultra => {
            if options.image_size.is_some() {
                ignored.push("image_size");
            }
            if options.width.is_some() {
                ignored.push("width");
            }
            if options.height.is_some() {
                ignored.push("height");
            }
            if options.guidance_scale.is_some() {
                ignored.push("guidance_scale");
            }
            if options.num_inference_steps.is_some() {
                ignored.push("num_inference_steps");
            }
        }
        ModelVariant::Pro => {
            if options.aspect_ratio.is_some() {
                ignored.push("aspect_ratio");
            }
            if options.raw {
                ignored.push("raw");
            }
        }
    }

    if ignored.is_empty() {
        Vec::new()
    } else {
        vec![Advisory {
            variant: options.variant,
            ignored,
        }]
    }
}

/// Rejects option sets that must never reach the network.
pub fn validate(options: &GenerationOptions, limits: &OptionLimits) -> Result<(), ValidationError> {
    if options.prompt.trim().is_empty() {
        return Err(ValidationError::empty_prompt("prompt must not be empty"));
    }

    if options.count == 0 {
        return Err(ValidationError::out_of_range("count must be at least 1"));
    }

    if let Some(level) = options.safety_tolerance {
        let (min, max) = limits.safety;
        if !(min..=max).contains(&level) {
            return Err(ValidationError::out_of_range(format!(
                "safety tolerance must be between {} and {}",
                min, max
            )));
        }
    }

    if options.variant == ModelVariant::Pro {
        validate_pro(options, limits)?;
    }

    Ok(())
}

fn validate_pro(options: &GenerationOptions, limits: &OptionLimits) -> Result<(), ValidationError> {
    if let Some(guidance) = options.guidance_scale {
        let (min, max) = limits.guidance;
        if !(min..=max).contains(&guidance) {
            return Err(ValidationError::out_of_range(format!(
                "guidance must be between {} and {}",
                min, max
            )));
        }
    }

    if let Some(steps) = options.num_inference_steps {
        let (min, max) = limits.steps;
        if !(min..=max).contains(&steps) {
            return Err(ValidationError::out_of_range(format!(
                "steps must be between {} and {}",
                min, max
            )));
        }
    }

    match (options.width, options.height) {
        (Some(width), Some(height)) => {
            let (min, max) = limits.dimension;
            let range = min..=max;
            if !range.contains(&width) || !range.contains(&height) {
                return Err(ValidationError::out_of_range(format!(
                    "dimensions must be between {} and {}",
                    min, max
                )));
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ValidationError::missing_pair(
                "width and height must be provided together",
            ));
        }
        (None, None) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use crate::models::{AspectRatio, ImageSizePreset};

    fn pro() -> GenerationOptions {
        GenerationOptions::new("a red fox in snow", "out")
    }

    fn check(options: &GenerationOptions) -> Result<(), ValidationError> {
        validate(options, &OptionLimits::default())
    }

    #[test]
    fn test_guidance_range() {
        for bad in [0.5, 0.99, 20.01, 21.0] {
            let mut options = pro();
            options.guidance_scale = Some(bad);
            assert_eq!(check(&options).unwrap_err().kind, ValidationErrorKind::OutOfRange);
        }
        for good in [1.0, 3.5, 20.0] {
            let mut options = pro();
            options.guidance_scale = Some(good);
            assert!(check(&options).is_ok());
        }
    }

    #[test]
    fn test_steps_range() {
        for bad in [0, 51] {
            let mut options = pro();
            options.num_inference_steps = Some(bad);
            assert_eq!(check(&options).unwrap_err().kind, ValidationErrorKind::OutOfRange);
        }
        for good in [1, 28, 50] {
            let mut options = pro();
            options.num_inference_steps = Some(good);
            assert!(check(&options).is_ok());
        }
    }

    #[test]
    fn test_dimensions_must_be_paired() {
        let mut options = pro();
        options.width = Some(512);
        assert_eq!(check(&options).unwrap_err().kind, ValidationErrorKind::MissingPair);

        let mut options = pro();
        options.height = Some(512);
        assert_eq!(check(&options).unwrap_err().kind, ValidationErrorKind::MissingPair);
    }

    #[test]
    fn test_dimension_range() {
        assert!(check(&pro().with_dimensions(256, 14142)).is_ok());
        assert_eq!(
            check(&pro().with_dimensions(255, 512)).unwrap_err().kind,
            ValidationErrorKind::OutOfRange
        );
        assert_eq!(
            check(&pro().with_dimensions(512, 14143)).unwrap_err().kind,
            ValidationErrorKind::OutOfRange
        );
    }

    #[test]
    fn test_ultra_skips_pro_rules() {
        let mut options = pro().with_variant(ModelVariant::Ultra);
        options.guidance_scale = Some(99.0);
        options.width = Some(10);
        assert!(check(&options).is_ok());
    }

    #[test]
    fn test_prompt_count_and_safety() {
        let options = GenerationOptions::new("   ", "out");
        assert_eq!(check(&options).unwrap_err().kind, ValidationErrorKind::EmptyPrompt);

        assert_eq!(
            check(&pro().with_count(0)).unwrap_err().kind,
            ValidationErrorKind::OutOfRange
        );

        let mut options = pro();
        options.safety_tolerance = Some(7);
        assert_eq!(check(&options).unwrap_err().kind, ValidationErrorKind::OutOfRange);
        options.safety_tolerance = Some(6);
        assert!(check(&options).is_ok());
    }

    #[test]
    fn test_advisories() {
        assert!(advisories(&pro()).is_empty());

        let mut options = pro();
        options.aspect_ratio = Some(AspectRatio::Square);
        options.raw = true;
        let notes = advisories(&options);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].ignored, vec!["aspect_ratio", "raw"]);
        assert_eq!(
            notes[0].to_string(),
            "Ultra model params ignored for Pro model: aspect_ratio, raw"
        );

        let mut options = pro().with_variant(ModelVariant::Ultra);
        options.image_size = Some(ImageSizePreset::Square);
        options.guidance_scale = Some(3.0);
        let notes = advisories(&options);
        assert_eq!(notes[0].ignored, vec!["image_size", "guidance_scale"]);
    }
}
