use super::contract::Decline;
use crate::domain::ports::ProviderHandle;

/// Resolves provider capabilities by stable name, by payment-method label,
/// or by the configured default.
///
/// Registration order matters for inference: the first enabled provider
/// advertising a label wins.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderHandle>,
    default_provider: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: ProviderHandle) {
        self.providers.push(provider);
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_provider = Some(name.into());
    }

    /// Resolves by explicit name. Enablement is enforced here so a disabled
    /// provider cannot be reached even when named directly.
    pub fn by_name(&self, name: &str) -> Result<ProviderHandle, Decline> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| Decline::UnknownProvider(name.to_string()))?;
        if !provider.enabled() {
            return Err(Decline::ProviderDisabled(name.to_string()));
        }
        Ok(provider.clone())
    }

    /// Resolves the first enabled provider advertising the method label.
    pub fn for_method(&self, method: &str) -> Result<ProviderHandle, Decline> {
        self.providers
            .iter()
            .find(|p| p.enabled() && p.supported_methods().iter().any(|m| m == method))
            .cloned()
            .ok_or_else(|| Decline::NoProviderForMethod(method.to_string()))
    }

    pub fn default_provider(&self) -> Result<ProviderHandle, Decline> {
        match &self.default_provider {
            Some(name) => self.by_name(name),
            None => Err(Decline::NoDefaultProvider),
        }
    }

    /// Resolution order for a request: explicit name, then method-label
    /// inference, then the configured default.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        method: Option<&str>,
    ) -> Result<ProviderHandle, Decline> {
        if let Some(name) = explicit {
            return self.by_name(name);
        }
        if let Some(label) = method {
            return self.for_method(label);
        }
        self.default_provider()
    }

    /// Discovery listing: every enabled provider with its supported labels.
    pub fn enabled_providers(&self) -> Vec<(String, Vec<String>)> {
        self.providers
            .iter()
            .filter(|p| p.enabled())
            .map(|p| (p.name().to_string(), p.supported_methods().to_vec()))
            .collect()
    }
}
