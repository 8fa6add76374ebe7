//! Turns validated options into the body sent to a FLUX endpoint.
//!
//! Optional keys are written only when the matching option was supplied, and
//! only for the variant that understands them.

use serde_json::json;

use crate::models::{GenerationOptions, ModelVariant, RequestPayload};

/// Fields shared by both variants. Every request asks for exactly one image.
pub fn build_base_payload(options: &GenerationOptions) -> RequestPayload {
    let mut payload = RequestPayload::new();
    payload.insert("prompt", options.prompt.as_str());
    payload.insert("num_images", 1_u32);

    if let Some(format) = options.output_format {
        payload.insert("output_format", format.as_str());
    }
    if let Some(level) = options.safety_tolerance {
        payload.insert("safety_tolerance", level.to_string());
    }
    if let Some(enabled) = options.enable_safety_checker {
        payload.insert("enable_safety_checker", enabled);
    }
    if let Some(sync) = options.sync_mode {
        payload.insert("sync_mode", sync);
    }

    payload
}

pub fn add_ultra_fields(payload: &mut RequestPayload, options: &GenerationOptions) {
    if let Some(ratio) = options.aspect_ratio {
        payload.insert("aspect_ratio", ratio.as_str());
    }
    if options.raw {
        payload.insert("raw", true);
    }
}

pub fn add_pro_fields(payload: &mut RequestPayload, options: &GenerationOptions) {
    match (options.width, options.height, options.image_size) {
        (Some(width), Some(height), _) => {
            payload.insert("image_size", json!({ "width": width, "height": height }));
        }
        (None, None, Some(preset)) => {
            payload.insert("image_size", preset.as_str());
        }
        _ => {}
    }
    if let Some(guidance) = options.guidance_scale {
        payload.insert("guidance_scale", guidance);
    }
    if let Some(steps) = options.num_inference_steps {
        payload.insert("num_inference_steps", steps);
    }
}

/// Base payload extended with the fields of the selected variant.
pub fn build_payload(options: &GenerationOptions) -> RequestPayload {
    let mut payload = build_base_payload(options);
    match options.variant {
        ModelVariant::Ultra => add_ultra_fields(&mut payload, options),
        ModelVariant::Pro => add_pro_fields(&mut payload, options),
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectRatio, ImageSizePreset, OutputFormat};
    use serde_json::Value;

    fn options() -> GenerationOptions {
        GenerationOptions::new("A sample prompt", "out")
    }

    #[test]
    fn test_base_payload_minimal() {
        let payload = build_base_payload(&options());
        assert_eq!(payload.get("prompt"), Some(&json!("A sample prompt")));
        assert_eq!(payload.get("num_images"), Some(&json!(1)));
        let keys: Vec<&str> = payload.keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(!payload.contains_key("enable_safety_checker"));
        assert!(!payload.contains_key("sync_mode"));
    }

    #[test]
    fn test_base_payload_full() {
        let mut opts = options();
        opts.output_format = Some(OutputFormat::Png);
        opts.safety_tolerance = Some(3);
        opts.enable_safety_checker = Some(true);
        opts.sync_mode = Some(false);

        let payload = build_base_payload(&opts);
        assert_eq!(payload.get("output_format"), Some(&json!("png")));
        assert_eq!(payload.get("safety_tolerance"), Some(&json!("3")));
        assert_eq!(payload.get("enable_safety_checker"), Some(&json!(true)));
        assert_eq!(payload.get("sync_mode"), Some(&json!(false)));
    }

    #[test]
    fn test_raw_only_written_when_true() {
        let mut opts = options().with_variant(ModelVariant::Ultra);
        opts.aspect_ratio = Some(AspectRatio::Standard);
        let payload = build_payload(&opts);
        assert_eq!(payload.get("aspect_ratio"), Some(&json!("4:3")));
        assert!(!payload.contains_key("raw"));

        opts.raw = true;
        assert_eq!(build_payload(&opts).get("raw"), Some(&json!(true)));
    }

    #[test]
    fn test_image_size_forms() {
        let mut opts = options().with_dimensions(512, 512);
        opts.image_size = Some(ImageSizePreset::Square);
        assert_eq!(
            build_payload(&opts).get("image_size"),
            Some(&json!({"width": 512, "height": 512}))
        );

        let mut opts = options();
        opts.image_size = Some(ImageSizePreset::Landscape16x9);
        assert_eq!(
            build_payload(&opts).get("image_size"),
            Some(&json!("landscape_16_9"))
        );

        assert!(!build_payload(&options()).contains_key("image_size"));
    }

    #[test]
    fn test_pro_sampling_fields() {
        let mut opts = options();
        opts.guidance_scale = Some(3.5);
        opts.num_inference_steps = Some(28);
        let payload = build_payload(&opts);
        assert_eq!(payload.get("guidance_scale"), Some(&json!(3.5)));
        assert_eq!(payload.get("num_inference_steps"), Some(&json!(28)));
    }

    #[test]
    fn test_no_cross_variant_keys() {
        let mut opts = options().with_variant(ModelVariant::Ultra);
        opts.image_size = Some(ImageSizePreset::Square);
        opts.guidance_scale = Some(3.5);
        opts.width = Some(512);
        opts.height = Some(512);
        let payload = build_payload(&opts);
        for key in ["image_size", "guidance_scale", "num_inference_steps"] {
            assert!(!payload.contains_key(key), "unexpected key {}", key);
        }

        let mut opts = options();
        opts.aspect_ratio = Some(AspectRatio::Square);
        opts.raw = true;
        let payload = build_payload(&opts);
        assert!(!payload.contains_key("aspect_ratio"));
        assert!(!payload.contains_key("raw"));
        assert!(payload.get("prompt").map(Value::is_string).unwrap_or(false));
    }
}
