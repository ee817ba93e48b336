use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::canonical::ParamSet;
use super::gateway_trait::{CallbackOutcome, PaymentGateway, RedirectRequest, RedirectResponse};
use super::vnpay::VnpayGateway;
use crate::config::GatewaysConfig;
use crate::core::{AppError, Result};
use crate::modules::gateways::models::{GatewayEnvironment, GatewayProvider, ProviderConfig};

/// Service for managing and routing to payment gateways
pub struct GatewayService {
    gateways: HashMap<GatewayProvider, Arc<dyn PaymentGateway>>,
    configs: HashMap<GatewayProvider, ProviderConfig>,
}

impl GatewayService {
    /// Empty registry; every provider reports as not configured
    pub fn new() -> Self {
        Self {
            gateways: HashMap::new(),
            configs: HashMap::new(),
        }
    }

    /// Registry with one gateway per provider that has a redirect protocol
    pub fn from_config(config: &GatewaysConfig) -> Self {
        let mut service = Self::new();

        for provider_config in config.all() {
            service
                .configs
                .insert(provider_config.provider, provider_config.clone());
        }

        service.register_gateway(Arc::new(VnpayGateway::new(config.vnpay.clone())));

        for provider_config in config.all() {
            if provider_config.enabled && !service.gateways.contains_key(&provider_config.provider)
            {
                warn!(
                    provider = %provider_config.provider,
                    "Provider enabled but no redirect protocol is implemented for it"
                );
            }
        }

        service
    }

    /// Register a gateway
    pub fn register_gateway(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    /// Get a gateway whose configuration can sign
    pub fn get_gateway(&self, provider: GatewayProvider) -> Result<Arc<dyn PaymentGateway>> {
        if let Some(config) = self.configs.get(&provider) {
            config.ensure_usable()?;
        }

        self.gateways
            .get(&provider)
            .cloned()
            .ok_or_else(|| AppError::gateway_not_configured(provider.to_string()))
    }

    /// Build a signed redirect with the given provider
    pub fn build_redirect(
        &self,
        provider: GatewayProvider,
        request: &RedirectRequest,
    ) -> Result<RedirectResponse> {
        let gateway = self.get_gateway(provider)?;
        let response = gateway.build_redirect(request)?;

        info!(
            provider = %provider,
            order_id = %request.order_id,
            txn_ref = %response.transaction_ref,
            "Gateway redirect created"
        );

        Ok(response)
    }

    /// Authenticate a provider callback
    pub fn verify_callback(
        &self,
        provider: GatewayProvider,
        params: &ParamSet,
    ) -> Result<CallbackOutcome> {
        let gateway = self.get_gateway(provider)?;

        gateway.verify_callback(params).map_err(|e| {
            if matches!(e, AppError::SignatureMismatch(_)) {
                warn!(provider = %provider, error = %e, "Rejected tampered gateway callback");
            }
            e
        })
    }

    /// List configured providers and whether they can take payments
    pub fn list_gateways(&self) -> Vec<GatewayInfo> {
        let mut infos: Vec<GatewayInfo> = GatewayProvider::ALL
            .iter()
            .map(|provider| {
                let config = self.configs.get(provider);
                GatewayInfo {
                    name: *provider,
                    enabled: config.map_or(false, |c| c.enabled),
                    available: self.get_gateway(*provider).is_ok(),
                    environment: config.map(|c| c.environment),
                }
            })
            .collect();
        infos.sort_by_key(|info| info.name.as_str());
        infos
    }
}

impl Default for GatewayService {
    fn default() -> Self {
        Self::new()
    }
}

/// Gateway information for listing
#[derive(Debug, Clone, Serialize)]
pub struct GatewayInfo {
    pub name: GatewayProvider,
    pub enabled: bool,
    pub available: bool,
    pub environment: Option<GatewayEnvironment>,
}
