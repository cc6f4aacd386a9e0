use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use trichoscan_core::{
    Generate, GenerationConfig, GenerationRequest, ImageBlob, Part, TrichoscanError,
};

use crate::pool::DEFAULT_MODEL;

/// The fixed grouping labels findings are reported under.
pub const ANALYSIS_CATEGORIES: [&str; 8] = [
    "Pattern Hair Loss",
    "Diffuse Thinning",
    "Patchy Hair Loss",
    "Hairline Recession",
    "Scalp Conditions",
    "Hair Breakage",
    "Hair Quality",
    "Hair & Scalp Type",
];

/// Normalized rectangle locating a finding within one source image.
/// Coordinates are in [0, 1] with x1 < x2 and y1 < y2 expected, not enforced.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// A bounding box tagged with the 0-based index of the image it applies to.
/// The index space is the order images were passed to [`Analyzer::analyze`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionBox {
    pub image_id: u32,
    #[serde(rename = "box")]
    pub region: BoundingBox,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    /// Model confidence, 0-100.
    pub confidence: f64,
    pub location: String,
    #[serde(default)]
    pub bounding_boxes: Vec<ConditionBox>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ConditionCategory {
    pub category: String,
    pub conditions: Vec<Condition>,
}

/// Outcome of an analysis call: findings, or a rejection when the images
/// were not a valid subject for hair and scalp analysis.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisOutcome {
    Findings(Vec<ConditionCategory>),
    Rejected { code: String, message: String },
}

/// The reply shape the model is instructed to produce. Exactly one of
/// `analysis` and `error` must be populated; the parser enforces this.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalysisReply {
    analysis: Option<Vec<ConditionCategory>>,
    error: Option<String>,
    message: Option<String>,
}

/// Runs the hair & scalp image analysis against a provider chain.
pub struct Analyzer {
    provider: Arc<dyn Generate>,
    model: String,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn Generate>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Analyzes one or more images of the user's hair and scalp.
    ///
    /// Image order is preserved; it defines the `image_id` index space used
    /// by the returned bounding boxes. Provider and parse failures are
    /// logged with full detail and surfaced as the generic
    /// [`TrichoscanError::AnalysisFailed`].
    pub async fn analyze(&self, images: &[ImageBlob]) -> Result<AnalysisOutcome, TrichoscanError> {
        if images.is_empty() {
            return Err(TrichoscanError::InvalidInput(
                "no images provided for analysis".to_string(),
            ));
        }

        match self.request_analysis(images).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                tracing::error!(error = %err, "hair and scalp analysis failed");
                Err(TrichoscanError::AnalysisFailed)
            }
        }
    }

    async fn request_analysis(
        &self,
        images: &[ImageBlob],
    ) -> Result<AnalysisOutcome, TrichoscanError> {
        let mut parts: Vec<Part> = images
            .iter()
            .map(|image| Part::Inline(image.to_inline_part()))
            .collect();
        parts.push(Part::Text(analysis_prompt()));

        let request = GenerationRequest {
            model: self.model.clone(),
            parts,
            config: Some(GenerationConfig::json(analysis_schema())),
        };

        let response = self.provider.generate(request).await?;
        let text = response.text.trim();

        let reply: AnalysisReply =
            serde_json::from_str(text).map_err(|err| TrichoscanError::ParseFailed {
                output: text.to_string(),
                reason: err.to_string(),
            })?;

        if let Some(code) = reply.error {
            return Ok(AnalysisOutcome::Rejected {
                code,
                message: reply.message.unwrap_or_default(),
            });
        }

        match reply.analysis {
            Some(categories) => Ok(AnalysisOutcome::Findings(categories)),
            // The contract requires either findings or an error code. A reply
            // with neither is a contract violation, never a healthy scalp.
            None => Err(TrichoscanError::ParseFailed {
                output: text.to_string(),
                reason: "reply carries neither analysis nor an error code".to_string(),
            }),
        }
    }
}

fn analysis_prompt() -> String {
    r#"You are an expert AI trichologist. Your primary task is to analyze images of a person's hair and scalp.

**Step 1: Image Validity Check**
First, determine if the uploaded image(s) are relevant for a hair and scalp analysis. A relevant image must clearly show a human head, hair, or scalp. Images of objects (like flowers), animals, landscapes, or other body parts are not relevant.

- If the image(s) ARE NOT RELEVANT, you MUST return a JSON object with an "error" field set to "irrelevant_image" and a user-friendly "message" explaining the issue. The "analysis" field should be null.
- If the image(s) ARE RELEVANT, proceed to Step 2. The "error" and "message" fields should be null, and the "analysis" field should contain your findings.

**Step 2: Detailed Analysis (only if images are relevant)**
Analyze these relevant images in detail. The images may show different angles (e.g., front/hairline, top/crown, temples, back). Provide one single, consolidated analysis based on all images provided.

Your task is to identify all potential conditions and characteristics from the comprehensive list below.

**Comprehensive List of Detectable Items:**

**1. Hair Loss Types:**
- **Common Types:** Androgenetic Alopecia (Genetic / Pattern Hair Loss), Telogen Effluvium (stress/illness related shedding), Anagen Effluvium (chemotherapy induced), Alopecia Areata (autoimmune, patchy bald spots), Traction Alopecia (from tight hairstyles), Cicatricial Alopecia (Scarring types), Trichotillomania (compulsive hair pulling), Diffuse Alopecia (systemic causes).
- **Types More Common in Men:** Male Pattern Baldness (receding hairline + crown thinning), Crown & Vertex Baldness.
- **Types More Common in Women:** Female Pattern Hair Loss (diffuse thinning, widened part), Postpartum Hair Loss, Menopausal Hair Loss, PCOS-related Hair Loss.

**2. Scalp Conditions & Infestations:**
- Seborrheic Dermatitis, Dandruff (Mild Seborrhea), Psoriasis, Tinea Capitis (Fungal), Folliculitis / Folliculitis Decalvans, Xerosis (Dry Scalp), Oily Scalp / Sebaceous Hypersecretion, Contact / Atopic Dermatitis, Pityriasis Amiantacea, Cradle Cap (Infant), Pediculosis Capitis (Lice / Nits), Demodex Infestation.

**3. Hair Shaft Disorders & Damage:**
- Trichorrhexis Nodosa, Monilethrix, Pili Torti, Loose Anagen Hair, Bubble Hair, Split Ends / Weathering, Color Damage, Heat Damage, Breakage.

**4. Cosmetic Quality:**
- Frizz, Porosity, Product Build-up.

**5. Hair & Scalp Typing:**
- Hair Density (Low / Medium / High), Hair Fiber Thickness (Fine / Medium / Coarse), Curl Type (1A-4C), Scalp Type (Dry / Normal / Oily / Combination).

After identifying conditions or characteristics, group them into the most relevant category from the list below. Use your expert judgment. For example, 'Androgenetic Alopecia' goes into 'Pattern Hair Loss', 'Dandruff' goes into 'Scalp Conditions', and 'Frizz' would go into 'Hair Quality'.
**Categories for Grouping:**
- 'Pattern Hair Loss'
- 'Diffuse Thinning'
- 'Patchy Hair Loss'
- 'Hairline Recession'
- 'Scalp Conditions' (Includes infestations and fungal infections like Tinea Capitis)
- 'Hair Breakage' (Includes hair shaft disorders and damage)
- 'Hair Quality' (Includes cosmetic quality issues like frizz and porosity)
- 'Hair & Scalp Type' (For hair and scalp typing characteristics)

For each specific condition or characteristic you identify, provide:
1. A 'name' (e.g., 'Androgenetic Alopecia', 'Dandruff', 'Frizz', 'High Density').
2. A 'confidence' score from 0 to 100 on how certain you are.
3. A 'location' string describing the primary area (e.g., "Crown", "Hairline", "General Scalp"). For typing, use "General Scalp".
4. An array of 'boundingBoxes'. Each box must have an 'imageId' (0-based index) and normalized coordinates (x1, y1, x2, y2). If a condition is general (like Diffuse Thinning or Hair Density) and not localized to a specific box, use a location like "General Scalp" and return an empty array for boundingBoxes.

Provide the output strictly in JSON format according to the provided schema. Be thorough. If the scalp and hair appear healthy with no issues, include a 'Healthy Hair & Scalp' category.
"#
    .to_string()
}

/// Response schema declared to the provider. Kept in this module, next to
/// [`AnalysisReply`], so the declared shape and the parser stay in lock-step.
fn analysis_schema() -> Value {
    let bounding_box = json!({
        "type": "OBJECT",
        "properties": {
            "imageId": {
                "type": "NUMBER",
                "description": "0-based index of the image this box applies to."
            },
            "box": {
                "type": "OBJECT",
                "properties": {
                    "x1": { "type": "NUMBER", "description": "Normalized top-left x coordinate." },
                    "y1": { "type": "NUMBER", "description": "Normalized top-left y coordinate." },
                    "x2": { "type": "NUMBER", "description": "Normalized bottom-right x coordinate." },
                    "y2": { "type": "NUMBER", "description": "Normalized bottom-right y coordinate." }
                },
                "required": ["x1", "y1", "x2", "y2"]
            }
        },
        "required": ["imageId", "box"]
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "analysis": {
                "type": "ARRAY",
                "nullable": true,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": {
                            "type": "STRING",
                            "description": "The category of hair/scalp conditions, e.g., 'Pattern Hair Loss'."
                        },
                        "conditions": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "name": {
                                        "type": "STRING",
                                        "description": "The specific hair/scalp condition name, e.g., 'Androgenetic Alopecia'."
                                    },
                                    "confidence": {
                                        "type": "NUMBER",
                                        "description": "The confidence score from 0 to 100."
                                    },
                                    "location": {
                                        "type": "STRING",
                                        "description": "The primary scalp location of the condition, e.g., 'Crown'."
                                    },
                                    "boundingBoxes": {
                                        "type": "ARRAY",
                                        "description": "Array of bounding boxes for this condition.",
                                        "items": bounding_box
                                    }
                                },
                                "required": ["name", "confidence", "location", "boundingBoxes"]
                            }
                        }
                    },
                    "required": ["category", "conditions"]
                }
            },
            "error": {
                "type": "STRING",
                "nullable": true,
                "description": "An error code like 'irrelevant_image' if the image is not valid."
            },
            "message": {
                "type": "STRING",
                "nullable": true,
                "description": "An error message if the image is not valid."
            }
        }
    })
}
