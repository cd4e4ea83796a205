//! Calming image generation

use crate::client::{ModelClient, RetryPolicy};
use crate::{Result, SolaceError};

fn vision_prompt(subject: &str) -> String {
    format!(
        "A hyper-realistic, meditative, calming zen masterpiece of: {}. \
         Soft lighting, detailed textures, high resolution, 4k.",
        subject
    )
}

/// Generate a calming image for the given subject; returns encoded image
/// bytes ready to display or save
pub fn manifest(
    model: &dyn ModelClient,
    retry: &RetryPolicy,
    subject: &str,
) -> Result<Vec<u8>> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(SolaceError::ValidationError(
            "describe the place first".to_string(),
        ));
    }

    retry.run(|| model.generate_image(&vision_prompt(subject)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ModelRequest, ModelResponse};

    struct ImageModel;

    impl ModelClient for ImageModel {
        fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse> {
            Err(SolaceError::RequestFailure("unsupported".to_string()))
        }

        fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
            assert!(prompt.contains("a bioluminescent forest"));
            assert!(prompt.contains("calming zen masterpiece"));
            Ok(vec![1, 2, 3])
        }

        fn generate_speech(&self, _text: &str) -> Result<Vec<u8>> {
            Err(SolaceError::RequestFailure("unsupported".to_string()))
        }
    }

    #[test]
    fn test_manifest_wraps_subject() {
        let bytes = manifest(&ImageModel, &RetryPolicy::none(), "a bioluminescent forest").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_blank_subject_rejected() {
        assert!(manifest(&ImageModel, &RetryPolicy::none(), "  ").is_err());
    }
}
