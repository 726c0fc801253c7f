use std::collections::BTreeMap;

use sealgate_types::prelude::{paths, RequestScope};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::authorizer::{unwrap_result, Authorizer};
use crate::errors::{self, AuthzError};

/// `acct -> service -> features`.
pub type AcctEntitlements = BTreeMap<String, BTreeMap<String, Vec<String>>>;
/// `service -> features`.
pub type ServiceFeatures = BTreeMap<String, Vec<String>>;

impl Authorizer {
    /// Features each account is entitled to, limited to `services`.
    pub async fn acct_entitlements(
        &self,
        scope: &RequestScope,
        acct_ids: &[String],
        services: &[String],
    ) -> Result<AcctEntitlements, AuthzError> {
        let input = json!({
            "acct_entitlements_acct_ids": acct_ids,
            "acct_entitlements_services": services,
        });
        let value = self
            .query_document(scope, paths::ACCT_ENTITLEMENTS_API, input)
            .await?;
        decode(value, errors::invalid_entitled_features)
    }

    pub async fn current_user_compartments(
        &self,
        scope: &RequestScope,
    ) -> Result<Vec<String>, AuthzError> {
        let jwt = self.raw_jwt(scope)?;
        let value = self
            .query_document(scope, paths::CURRENT_USER_COMPARTMENTS, json!({ "jwt": jwt }))
            .await?;
        decode(value, errors::unknown)
    }

    /// Subset of `permissions` the caller holds in its compartments.
    pub async fn filter_compartment_permissions(
        &self,
        scope: &RequestScope,
        permissions: &[String],
    ) -> Result<Vec<String>, AuthzError> {
        let jwt = self.raw_jwt(scope)?;
        let input = json!({
            "application": self.application(),
            "jwt": jwt,
            "permissions": permissions,
        });
        let value = self
            .query_document(scope, paths::FILTER_COMPARTMENT_PERMISSIONS_API, input)
            .await?;
        decode(value, errors::unknown)
    }

    /// Subset of `features` the caller may use in its compartments.
    pub async fn filter_compartment_features(
        &self,
        scope: &RequestScope,
        features: &ServiceFeatures,
    ) -> Result<ServiceFeatures, AuthzError> {
        let jwt = self.raw_jwt(scope)?;
        let input = json!({
            "application": self.application(),
            "jwt": jwt,
            "entitled_features": features,
        });
        let value = self
            .query_document(scope, paths::FILTER_COMPARTMENT_FEATURES_API, input)
            .await?;
        decode(value, errors::invalid_entitled_features)
    }

    /// Sends `input` to `document` as is and returns the unwrapped response.
    pub async fn opa_query(
        &self,
        scope: &RequestScope,
        document: &str,
        input: &Value,
    ) -> Result<Map<String, Value>, AuthzError> {
        let request_id = Self::request_id(scope);
        let response = self
            .call_evaluator(scope, document, input, &request_id)
            .await?;
        Ok(unwrap_result(response))
    }

    async fn query_document(
        &self,
        scope: &RequestScope,
        document: &str,
        input: Value,
    ) -> Result<Value, AuthzError> {
        let request_id = Self::request_id(scope);
        let body = json!({ "input": input });
        let mut response = self
            .call_evaluator(scope, document, &body, &request_id)
            .await?;
        Ok(match response.remove("result") {
            Some(value) => value,
            None if response.is_empty() => Value::Null,
            None => Value::Object(response),
        })
    }
}

/// Null decodes to the empty value of `T`.
fn decode<T>(value: Value, on_error: fn(&str) -> AuthzError) -> Result<T, AuthzError>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|err| on_error(&format!("unexpected query result: {err}")))
}
