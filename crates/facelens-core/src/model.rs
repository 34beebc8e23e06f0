//! Face analysis domain model.
//!
//! Mirrors the JSON object the vision model is asked to produce. Percentages
//! are independent per-item confidences in [0, 100]; they are not expected to
//! sum to 100.

use serde::{Deserialize, Serialize};

/// Body of an analysis request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Complete analysis returned for one image.
///
/// The model's object is returned field for field, not byte for byte:
/// percentages are held as `f64`, so an integer such as `87` comes back as
/// `87.0`, and unknown extra fields are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ancestry: Vec<AncestryPrediction>,
    pub origin: Vec<OriginPrediction>,
    pub emotions: Vec<EmotionPrediction>,
    pub description: String,
}

/// Broad ethnic or geographic heritage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncestryPrediction {
    pub region: String,
    pub percentage: f64,
}

/// Likely country of origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginPrediction {
    pub country: String,
    pub percentage: f64,
}

/// Expressed emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    pub emotion: String,
    pub percentage: f64,
}

/// A labelled confidence value.
pub trait Prediction {
    fn label(&self) -> &str;
    fn percentage(&self) -> f64;
}

impl Prediction for AncestryPrediction {
    fn label(&self) -> &str {
        &self.region
    }

    fn percentage(&self) -> f64 {
        self.percentage
    }
}

impl Prediction for OriginPrediction {
    fn label(&self) -> &str {
        &self.country
    }

    fn percentage(&self) -> f64 {
        self.percentage
    }
}

impl Prediction for EmotionPrediction {
    fn label(&self) -> &str {
        &self.emotion
    }

    fn percentage(&self) -> f64 {
        self.percentage
    }
}

/// Sort predictions by descending confidence. Ties keep their original order.
pub fn ranked<P: Prediction>(items: &[P]) -> Vec<&P> {
    let mut sorted: Vec<&P> = items.iter().collect();
    sorted.sort_by(|a, b| b.percentage().total_cmp(&a.percentage()));
    sorted
}

fn top<P: Prediction>(items: &[P]) -> Option<&P> {
    ranked(items).into_iter().next()
}

impl AnalysisResult {
    /// Most likely ancestry region.
    pub fn top_ancestry(&self) -> Option<&AncestryPrediction> {
        top(&self.ancestry)
    }

    /// Most likely country of origin.
    pub fn top_origin(&self) -> Option<&OriginPrediction> {
        top(&self.origin)
    }

    /// Dominant emotion.
    pub fn dominant_emotion(&self) -> Option<&EmotionPrediction> {
        top(&self.emotions)
    }

    /// Check field shapes the JSON schema alone cannot express.
    ///
    /// Returns a human readable reason for the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        check_list("ancestry", &self.ancestry)?;
        check_list("origin", &self.origin)?;
        check_list("emotions", &self.emotions)?;
        Ok(())
    }
}

fn check_list<P: Prediction>(field: &str, items: &[P]) -> Result<(), String> {
    for (i, item) in items.iter().enumerate() {
        if item.label().trim().is_empty() {
            return Err(format!("{}[{}] has an empty label", field, i));
        }
        let pct = item.percentage();
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(format!(
                "{}[{}] percentage {} is outside 0-100",
                field, i, pct
            ));
        }
    }
    Ok(())
}

/// An entry of the sample gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFace {
    pub id: u32,
    pub url: String,
    pub name: String,
}
