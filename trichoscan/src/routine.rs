use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use trichoscan_core::{Generate, GenerationConfig, GenerationRequest, Part, TrichoscanError};

use crate::analysis::ConditionCategory;
use crate::catalog::Product;
use crate::pool::DEFAULT_MODEL;
use crate::profile::HairProfile;

/// An alternative product suggestion attached to a routine step.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeProduct {
    pub product_id: String,
    pub variant_id: String,
    pub product_name: String,
    pub product_url: String,
    pub product_image_url: String,
    pub price: String,
    pub original_price: String,
    pub key_ingredients: Vec<String>,
}

/// One step of the recommended routine, referencing a catalog product.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutineStep {
    pub step_type: String,
    pub product_id: String,
    pub variant_id: String,
    pub product_name: String,
    pub product_url: String,
    pub product_image_url: String,
    /// Why this product was chosen for this user specifically.
    pub purpose: String,
    #[serde(default)]
    pub alternatives: Vec<AlternativeProduct>,
    pub price: String,
    pub original_price: String,
    pub key_ingredients: Vec<String>,
}

/// The routine body: AM and PM step lists plus supporting guidance.
/// A general routine puts every step in `am` and leaves `pm` empty.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub introduction: String,
    pub am: Vec<RoutineStep>,
    pub pm: Vec<RoutineStep>,
    pub key_ingredients: Vec<String>,
    pub lifestyle_tips: Vec<String>,
    pub disclaimer: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RoutinePlan {
    pub title: String,
    pub recommendation: Recommendation,
}

/// Generates a personalized care routine against a provider chain.
///
/// Returned product identifiers are passed through as the model produced
/// them; they are not cross-checked against the catalog.
pub struct Recommender {
    provider: Arc<dyn Generate>,
    model: String,
    brand: String,
}

impl Recommender {
    pub fn new(provider: Arc<dyn Generate>, brand: impl Into<String>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
            brand: brand.into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builds a routine from the questionnaire profile, the image analysis
    /// (possibly empty), the user's goals and the product catalog.
    ///
    /// Provider and parse failures are logged with full detail and surfaced
    /// as the generic [`TrichoscanError::RoutineFailed`].
    pub async fn recommend(
        &self,
        profile: &HairProfile,
        analysis: &[ConditionCategory],
        goals: &[String],
        catalog: &[Product],
    ) -> Result<RoutinePlan, TrichoscanError> {
        match self.request_routine(profile, analysis, goals, catalog).await {
            Ok(plan) => Ok(plan),
            Err(err) => {
                tracing::error!(error = %err, "routine generation failed");
                Err(TrichoscanError::RoutineFailed)
            }
        }
    }

    async fn request_routine(
        &self,
        profile: &HairProfile,
        analysis: &[ConditionCategory],
        goals: &[String],
        catalog: &[Product],
    ) -> Result<RoutinePlan, TrichoscanError> {
        let prompt = routine_prompt(&self.brand, profile, analysis, goals, catalog)?;

        let request = GenerationRequest {
            model: self.model.clone(),
            parts: vec![Part::Text(prompt)],
            config: Some(GenerationConfig::json(routine_schema())),
        };

        let response = self.provider.generate(request).await?;
        let text = response.text.trim();

        serde_json::from_str(text).map_err(|err| TrichoscanError::ParseFailed {
            output: text.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Flattens analysis categories to the one-line summary the prompt embeds.
fn flatten_analysis(analysis: &[ConditionCategory]) -> String {
    let rendered = analysis
        .iter()
        .map(|category| {
            let conditions = category
                .conditions
                .iter()
                .map(|condition| {
                    format!(
                        "{} at {} ({}% confidence)",
                        condition.name, condition.location, condition.confidence
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {}", category.category, conditions)
        })
        .collect::<Vec<_>>()
        .join("; ");

    if rendered.is_empty() {
        "Not provided.".to_string()
    } else {
        rendered
    }
}

fn routine_prompt(
    brand: &str,
    profile: &HairProfile,
    analysis: &[ConditionCategory],
    goals: &[String],
    catalog: &[Product],
) -> Result<String, TrichoscanError> {
    let analysis_text = flatten_analysis(analysis);
    let goals_text = goals.join(", ");
    let profile_json = serde_json::to_string_pretty(profile)?;
    let catalog_json = serde_json::to_string_pretty(catalog)?;

    Ok(format!(
        r#"**ROLE & GOAL:**
You are an expert dermatological AI for the brand "{brand}". Your mission is to create the single BEST, scientifically-backed, and hyper-personalized haircare routine for a user. Your recommendations must be effective, easy to follow, and safe. You MUST use products exclusively from the provided {brand} catalog.

**USER DATA (In Order of Priority):**
1.  **AI Hair & Scalp Analysis (PRIMARY DATA):** This is your most critical input. The conditions identified here are the primary problems you must solve.
2.  **User Hair Profile from Questionnaire (SECONDARY DATA):** Use this to understand the user's history, lifestyle, and concerns not visible in photos. If AI Analysis is not provided, this becomes your primary data source.
3.  **Primary Haircare Goals (DESIRED OUTCOME):** The user's stated goals. Your routine must directly address these goals, using the analysis and questionnaire to inform HOW you achieve them.

**User's Information:**
- **AI Analysis:** {analysis_text}
- **Questionnaire Profile:** {profile_json}
- **Goals:** {goals_text}

**{brand} Product Catalog:**
{catalog_json}

**YOUR TASK (Follow these steps precisely):**

**STEP 1: Synthesize a Clinical Summary.**
Based on all user data, write a brief, internal summary of the user's condition.
*Example:* "User presents with moderate androgenetic alopecia on the crown (95% confidence) and reports high stress, which may exacerbate hair shedding. Goal is to reduce hair fall."

**STEP 2: Devise a Treatment Strategy.**
Based on your summary, outline a clear strategy.
*Example:* "Strategy: 1. Aggressively target follicular miniaturization using a topical solution with proven actives. 2. Support scalp health with a gentle, pH-balanced cleanser. 3. Reduce breakage reported in the questionnaire with a strengthening conditioner."

**STEP 3: Select Products Using an Ingredient-First Approach.**
For each part of your strategy, scan the catalog for the best product match.
- **Prioritize Active Ingredients:** Match products based on their effectiveness for the diagnosed conditions (e.g., for hair loss, look for Minoxidil, Finasteride, Procapil; for dandruff, look for Ketoconazole).
- **Use 'suitableFor' as a Filter:** Ensure the product's intended use matches the user's condition.
- **Build the Routine:** Construct a simple but powerful AM and PM routine (or a single "General" routine). Start with the 2-4 most critical products. Only add more if truly necessary.

**STEP 4: Generate the Final JSON Output.**
Provide your response in the specified JSON format. Your explanations must be exceptional.

- **`purpose` Field is CRITICAL:** For each product, write a highly personalized 'purpose'. Directly reference the user's data.
    - **GOOD example:** "Because your analysis identified 'Androgenetic Alopecia' and you want to 'Promote Hair Growth', this solution containing 5% Minoxidil is the most effective choice to reactivate hair follicles."
    - **BAD example:** "This product is for hair loss."
- **`keyIngredients` is MANDATORY:** Extract these directly from the catalog data for each product.
- **`alternatives`:** If available, provide 1-2 suitable alternatives from the catalog for the primary recommended product.
- **Lifestyle Tips:** Provide actionable, personalized tips that complement the routine.
- **Routine Title:** Create a powerful, goal-oriented title.

**OUTPUT FORMAT:**
Return a single JSON object. The root object must have "title" and "recommendation" keys. The "recommendation" object must contain "introduction", "am", "pm", "keyIngredients", "lifestyleTips", and "disclaimer". If a general routine is best, put all steps in the "am" array and leave "pm" empty. DO NOT recommend any products not in the provided catalog.
"#
    ))
}

/// Response schema declared to the provider. Kept next to the plan types it
/// must deserialize into.
fn routine_schema() -> Value {
    let alternative_product = json!({
        "type": "OBJECT",
        "properties": {
            "productId": { "type": "STRING" },
            "variantId": { "type": "STRING" },
            "productName": { "type": "STRING" },
            "productUrl": { "type": "STRING" },
            "productImageUrl": { "type": "STRING" },
            "price": { "type": "STRING" },
            "originalPrice": { "type": "STRING" },
            "keyIngredients": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": [
            "productId", "variantId", "productName", "productUrl",
            "productImageUrl", "price", "originalPrice", "keyIngredients"
        ]
    });

    let routine_step = json!({
        "type": "OBJECT",
        "properties": {
            "stepType": {
                "type": "STRING",
                "description": "A single, descriptive word for the routine step."
            },
            "productId": {
                "type": "STRING",
                "description": "The exact ID of the product from the catalog."
            },
            "variantId": {
                "type": "STRING",
                "description": "The exact variant ID for the product."
            },
            "productName": {
                "type": "STRING",
                "description": "The full name of the recommended product."
            },
            "productUrl": {
                "type": "STRING",
                "description": "The direct URL to the product page."
            },
            "productImageUrl": {
                "type": "STRING",
                "description": "The direct URL to the product's image from the catalog."
            },
            "purpose": {
                "type": "STRING",
                "description": "Why this specific product is recommended for the user."
            },
            "alternatives": {
                "type": "ARRAY",
                "description": "Suitable alternative products from the catalog for this step. Can be empty.",
                "items": alternative_product
            },
            "price": { "type": "STRING" },
            "originalPrice": { "type": "STRING" },
            "keyIngredients": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": [
            "stepType", "productId", "variantId", "productName", "productUrl",
            "productImageUrl", "purpose", "alternatives", "price",
            "originalPrice", "keyIngredients"
        ]
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "A short, powerful title for the plan."
            },
            "recommendation": {
                "type": "OBJECT",
                "properties": {
                    "introduction": {
                        "type": "STRING",
                        "description": "A brief, encouraging intro to the plan."
                    },
                    "am": {
                        "type": "ARRAY",
                        "items": routine_step.clone(),
                        "description": "Steps for the morning/main routine."
                    },
                    "pm": {
                        "type": "ARRAY",
                        "items": routine_step,
                        "description": "Steps for the evening/secondary routine. Can be empty."
                    },
                    "keyIngredients": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Key ingredient names from the recommended products."
                    },
                    "lifestyleTips": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Lifestyle and wellness tips."
                    },
                    "disclaimer": {
                        "type": "STRING",
                        "description": "A final important disclaimer message."
                    }
                },
                "required": [
                    "introduction", "am", "pm", "keyIngredients",
                    "lifestyleTips", "disclaimer"
                ]
            }
        },
        "required": ["title", "recommendation"]
    })
}
