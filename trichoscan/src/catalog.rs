use serde::{Deserialize, Serialize};

/// A catalog product, in the exact projection the routine prompt embeds.
///
/// Prices are strings because the catalog carries formatted amounts
/// ("₹649.00") and the model echoes them back verbatim.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub description: String,
    pub suitable_for: Vec<String>,
    pub key_ingredients: Vec<String>,
    pub variant_id: String,
    pub price: String,
    pub original_price: String,
}
