use serde::{Deserialize, Serialize};

use crate::finder::{Method, VerificationVerdict};

#[derive(Debug, Default, Deserialize)]
pub struct CheckEmailRequest {
    pub name: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateEmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckEmailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_patterns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<VerificationVerdict>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidateEmailResponse {
    pub success: bool,
    pub syntax: bool,
    pub deliverable: bool,
    pub method: Method,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mx_host: Option<String>,
}

impl From<VerificationVerdict> for ValidateEmailResponse {
    fn from(verdict: VerificationVerdict) -> Self {
        Self {
            success: true,
            syntax: true,
            deliverable: verdict.is_deliverable(),
            method: verdict.method,
            confidence: verdict.confidence,
            reason: verdict.reason,
            mx_host: verdict.mx_host,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}
