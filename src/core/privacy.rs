use crate::utils::error::{EtlError, Result};

/// Scans anonymized output for literal values that must never survive
/// anonymization (city names, operator names, ...). Matching is
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct PrivacyGuard {
    tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub token: String,
    pub occurrences: usize,
}

impl PrivacyGuard {
    pub fn new(tokens: &[String]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn scan(&self, data: &[u8]) -> Vec<Finding> {
        let haystack = String::from_utf8_lossy(data).to_lowercase();
        self.tokens
            .iter()
            .filter_map(|token| {
                let occurrences = haystack.matches(&token.to_lowercase()).count();
                (occurrences > 0).then(|| Finding {
                    token: token.clone(),
                    occurrences,
                })
            })
            .collect()
    }

    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let findings = self.scan(data);
        for finding in &findings {
            tracing::error!(
                "🚫 Forbidden token '{}' found {} time(s) in anonymized output",
                finding.token,
                finding.occurrences
            );
        }
        match findings.into_iter().next() {
            Some(first) => Err(EtlError::PrivacyViolationError {
                token: first.token,
                occurrences: first.occurrences,
            }),
            None => {
                tracing::debug!("Privacy scan passed ({} tokens)", self.tokens.len());
                Ok(())
            }
        }
    }
}
