use crate::training::{combined_text, MatchFeatures, MatchPipeline};

/// Shapes a feature record can be offered to a model in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelInput<'a> {
    /// The four training columns.
    Columns(&'a MatchFeatures),
    /// A single `text` column holding the tagged concatenation.
    TextColumn(&'a str),
    /// A bare list of tagged texts.
    TextList(&'a [String]),
}

impl ModelInput<'_> {
    pub fn shape(&self) -> &'static str {
        match self {
            ModelInput::Columns(_) => "columns",
            ModelInput::TextColumn(_) => "text_column",
            ModelInput::TextList(_) => "text_list",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model does not accept {shape} input")]
    UnsupportedInput { shape: &'static str },
    #[error("model failed to score input: {0}")]
    Scoring(String),
}

/// Anything that turns a feature record into a match probability.
pub trait ProbabilityModel: Send + Sync {
    fn predict_proba(&self, input: ModelInput<'_>) -> Result<f64, ModelError>;
}

impl ProbabilityModel for MatchPipeline {
    fn predict_proba(&self, input: ModelInput<'_>) -> Result<f64, ModelError> {
        match input {
            ModelInput::Columns(features) => MatchPipeline::predict_proba(self, features)
                .map_err(|error| ModelError::Scoring(error.to_string())),
            other => Err(ModelError::UnsupportedInput {
                shape: other.shape(),
            }),
        }
    }
}

/// Offer `features` as full columns, then as a text column, then as a text
/// list. The first probability wins; when every shape fails the last error is returned.
pub fn predict_flexible(
    model: &dyn ProbabilityModel,
    features: &MatchFeatures,
) -> Result<f64, ModelError> {
    if let Ok(probability) = model.predict_proba(ModelInput::Columns(features)) {
        return Ok(probability);
    }

    let text = combined_text(features);
    if let Ok(probability) = model.predict_proba(ModelInput::TextColumn(&text)) {
        return Ok(probability);
    }

    model.predict_proba(ModelInput::TextList(std::slice::from_ref(&text)))
}
