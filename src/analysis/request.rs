//! Analysis request construction.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::auth::Identity;

/// Preconditions checked before anything is sent to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("user not authenticated")]
    Unauthenticated,

    #[error("document text is empty")]
    EmptyInput,
}

/// A request bound to an identity, ready for the engine. Only obtainable
/// through [`AnalysisRequestBuilder::build`], so an unauthenticated or
/// empty request can't exist.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    identity: Identity,
    document_text: String,
    variant: Option<String>,
    params: BTreeMap<String, String>,
}

impl AnalysisRequest {
    pub fn builder() -> AnalysisRequestBuilder {
        AnalysisRequestBuilder::default()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Free-form context passed through to the engine.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

#[derive(Debug, Default)]
pub struct AnalysisRequestBuilder {
    identity: Option<Identity>,
    document_text: Option<String>,
    variant: Option<String>,
    params: BTreeMap<String, String>,
}

impl AnalysisRequestBuilder {
    pub fn identity(mut self, identity: Option<Identity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.document_text = Some(text.into());
        self
    }

    pub fn variant(mut self, variant: Option<&str>) -> Self {
        self.variant = variant
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        self
    }

    /// Add an auxiliary parameter. Blank keys are ignored.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.params.insert(key.trim().to_string(), value.into());
        }
        self
    }

    pub fn params<K, V>(self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .fold(self, |builder, (k, v)| builder.param(k, v))
    }

    /// Check preconditions (identity first) and build the request. The text
    /// is kept exactly as given.
    pub fn build(self) -> Result<AnalysisRequest, RequestError> {
        let identity = self.identity.ok_or(RequestError::Unauthenticated)?;
        let document_text = self
            .document_text
            .filter(|t| !t.trim().is_empty())
            .ok_or(RequestError::EmptyInput)?;

        Ok(AnalysisRequest {
            identity,
            document_text,
            variant: self.variant,
            params: self.params,
        })
    }
}
