use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use trichoscan::{
    AnalysisOutcome, Analyzer, Generate, GenerationRequest, GenerationResponse, ImageBlob, Part,
    TrichoscanError,
};

struct CannedProvider {
    reply: String,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl CannedProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> GenerationRequest {
        self.last_request
            .lock()
            .unwrap()
            .clone()
            .expect("provider was never called")
    }
}

#[async_trait::async_trait]
impl Generate for CannedProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, TrichoscanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        Ok(GenerationResponse {
            text: self.reply.clone(),
        })
    }
}

fn scalp_images(count: usize) -> Vec<ImageBlob> {
    (0..count)
        .map(|index| ImageBlob::new(vec![index as u8; 4], "image/jpeg"))
        .collect()
}

#[tokio::test]
async fn empty_input_is_rejected_before_any_remote_call() {
    let provider = CannedProvider::new("{}");
    let analyzer = Analyzer::new(provider.clone());

    let err = analyzer.analyze(&[]).await.unwrap_err();
    assert!(matches!(err, TrichoscanError::InvalidInput(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn irrelevant_images_map_to_a_rejection() {
    let provider = CannedProvider::new(
        r#"{"error": "irrelevant_image", "message": "Please upload a photo of your scalp.", "analysis": null}"#,
    );
    let analyzer = Analyzer::new(provider.clone());

    let outcome = analyzer.analyze(&scalp_images(1)).await.unwrap();
    assert_eq!(
        outcome,
        AnalysisOutcome::Rejected {
            code: "irrelevant_image".to_string(),
            message: "Please upload a photo of your scalp.".to_string(),
        }
    );
}

#[tokio::test]
async fn findings_are_parsed_into_categories() {
    let provider = CannedProvider::new(
        r#"{
            "error": null,
            "message": null,
            "analysis": [
                {
                    "category": "Scalp Conditions",
                    "conditions": [
                        {
                            "name": "Dandruff",
                            "confidence": 80,
                            "location": "General Scalp",
                            "boundingBoxes": []
                        }
                    ]
                }
            ]
        }"#,
    );
    let analyzer = Analyzer::new(provider.clone());

    let outcome = analyzer.analyze(&scalp_images(1)).await.unwrap();
    let AnalysisOutcome::Findings(categories) = outcome else {
        panic!("expected findings");
    };
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].category, "Scalp Conditions");
    assert_eq!(categories[0].conditions.len(), 1);

    let condition = &categories[0].conditions[0];
    assert_eq!(condition.name, "Dandruff");
    assert_eq!(condition.confidence, 80.0);
    assert_eq!(condition.location, "General Scalp");
    assert!(condition.bounding_boxes.is_empty());
}

#[tokio::test]
async fn bounding_boxes_carry_the_source_image_index() {
    let provider = CannedProvider::new(
        r#"{
            "error": null,
            "message": null,
            "analysis": [
                {
                    "category": "Patchy Hair Loss",
                    "conditions": [
                        {
                            "name": "Alopecia Areata",
                            "confidence": 72.5,
                            "location": "Left temple",
                            "boundingBoxes": [
                                {"imageId": 1, "box": {"x1": 0.1, "y1": 0.2, "x2": 0.4, "y2": 0.5}}
                            ]
                        }
                    ]
                }
            ]
        }"#,
    );
    let analyzer = Analyzer::new(provider.clone());

    let outcome = analyzer.analyze(&scalp_images(2)).await.unwrap();
    let AnalysisOutcome::Findings(categories) = outcome else {
        panic!("expected findings");
    };
    let boxes = &categories[0].conditions[0].bounding_boxes;
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].image_id, 1);
    assert_eq!(boxes[0].region.x1, 0.1);
    assert_eq!(boxes[0].region.y2, 0.5);
}

#[tokio::test]
async fn request_carries_images_in_order_plus_the_prompt() {
    let provider = CannedProvider::new(r#"{"error": null, "message": null, "analysis": []}"#);
    let analyzer = Analyzer::new(provider.clone());

    let first = ImageBlob::new(vec![1u8, 2, 3], "image/jpeg");
    let second = ImageBlob::new(vec![9u8, 8, 7], "image/png");
    analyzer
        .analyze(&[first.clone(), second.clone()])
        .await
        .unwrap();

    let request = provider.last_request();
    assert_eq!(request.parts.len(), 3);
    assert_eq!(request.parts[0], Part::Inline(first.to_inline_part()));
    assert_eq!(request.parts[1], Part::Inline(second.to_inline_part()));

    let Part::Text(prompt) = &request.parts[2] else {
        panic!("expected the prompt as the final part");
    };
    assert!(prompt.contains("trichologist"));
    assert!(prompt.contains("irrelevant_image"));

    let config = request.config.expect("structured output config");
    assert_eq!(config.response_mime_type, "application/json");
    assert!(config.response_schema["properties"]["analysis"].is_object());
}

#[tokio::test]
async fn malformed_reply_surfaces_the_generic_failure() {
    let provider = CannedProvider::new("this is not json");
    let analyzer = Analyzer::new(provider.clone());

    let err = analyzer.analyze(&scalp_images(1)).await.unwrap_err();
    assert!(matches!(err, TrichoscanError::AnalysisFailed));
}

#[tokio::test]
async fn reply_without_findings_or_error_is_a_failure_not_a_healthy_scalp() {
    let provider = CannedProvider::new(r#"{"error": null, "message": null, "analysis": null}"#);
    let analyzer = Analyzer::new(provider.clone());

    let err = analyzer.analyze(&scalp_images(1)).await.unwrap_err();
    assert!(matches!(err, TrichoscanError::AnalysisFailed));
}

#[tokio::test]
async fn provider_failures_surface_the_generic_failure() {
    struct FailingProvider;

    #[async_trait::async_trait]
    impl Generate for FailingProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, TrichoscanError> {
            Err(TrichoscanError::ProvidersExhausted {
                attempts: 3,
                last: "quota exceeded".to_string(),
            })
        }
    }

    let analyzer = Analyzer::new(Arc::new(FailingProvider));
    let err = analyzer.analyze(&scalp_images(1)).await.unwrap_err();
    assert!(matches!(err, TrichoscanError::AnalysisFailed));
}

#[tokio::test]
async fn empty_findings_list_is_a_valid_outcome() {
    let provider = CannedProvider::new(r#"{"error": null, "message": null, "analysis": []}"#);
    let analyzer = Analyzer::new(provider.clone());

    let outcome = analyzer.analyze(&scalp_images(1)).await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Findings(vec![]));
}
