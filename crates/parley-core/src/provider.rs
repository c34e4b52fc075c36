#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Perplexity,
    Mock,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Perplexity => "perplexity",
            Provider::Mock => "mock",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "perplexity" => Some(Provider::Perplexity),
            "mock" => Some(Provider::Mock),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::Perplexity, Provider::Mock]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Perplexity => "Perplexity",
            Provider::Mock => "Mock (no network)",
        }
    }

    /// Whether sending through this provider needs an API key.
    pub fn needs_api_key(&self) -> bool {
        matches!(self, Provider::Perplexity)
    }
}
