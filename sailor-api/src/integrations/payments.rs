//! Payment gateway for saved cards
//!
//! Covers the admin billing page (find or create a customer, save a card
//! through a setup intent, charge it later) and charging after service.

use async_trait::async_trait;
use reqwest::Client;
use sailor_common::config::StripeConfig;
use sailor_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

const STRIPE_API_URL: &str = "https://api.stripe.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for customer search and its list fallback
const SEARCH_PAGE: usize = 100;

/// Charge against a customer's saved payment method, without them present
#[derive(Debug, Clone, PartialEq)]
pub struct OffSessionCharge {
    pub customer_id: String,
    pub payment_method: String,
    pub amount_cents: i64,
    pub currency: String,
    pub description: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
}

/// Billing customer as stored by the payment provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentCustomer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Unix seconds
    #[serde(default)]
    pub created: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPaymentCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub metadata: Vec<(String, String)>,
}

/// First card saved for a customer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCard {
    pub id: String,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<u32>,
    pub exp_year: Option<u32>,
    /// Cardholder name from the billing details
    pub billing_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// The customer's default payment method, if one is saved
    async fn default_payment_method(&self, customer_id: &str) -> Result<Option<String>>;

    /// Create and confirm a payment intent
    async fn charge_off_session(&self, charge: &OffSessionCharge) -> Result<PaymentIntent>;

    /// Candidate customers for the billing page
    ///
    /// With a search term the provider's own search runs first and an empty
    /// result falls back to the most recent page, leaving the final match to
    /// the caller. Without one, the `limit` most recent customers.
    async fn find_customers(&self, search: Option<&str>, limit: usize) -> Result<Vec<PaymentCustomer>>;

    async fn card_on_file(&self, customer_id: &str) -> Result<Option<SavedCard>>;

    async fn create_customer(&self, customer: &NewPaymentCustomer) -> Result<PaymentCustomer>;

    /// Setup intent for saving a card to charge off-session later
    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent>;

    /// Attach a card and make it the customer's default
    async fn attach_payment_method(&self, customer_id: &str, payment_method_id: &str) -> Result<()>;

    /// Set metadata keys; keys not listed keep their values
    async fn update_customer_metadata(&self, customer_id: &str, metadata: &[(String, String)]) -> Result<()>;
}

/// Stripe REST API client (form-encoded requests)
pub struct StripeClient {
    http_client: Client,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    #[serde(default)]
    invoice_settings: Option<InvoiceSettings>,
    #[serde(default)]
    default_source: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct InvoiceSettings {
    default_payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripePaymentMethod {
    id: String,
    #[serde(default)]
    card: Option<StripeCard>,
    #[serde(default)]
    billing_details: Option<StripeBillingDetails>,
}

#[derive(Debug, Deserialize)]
struct StripeCard {
    brand: Option<String>,
    last4: Option<String>,
    exp_month: Option<u32>,
    exp_year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StripeBillingDetails {
    name: Option<String>,
}

impl From<StripePaymentMethod> for SavedCard {
    fn from(pm: StripePaymentMethod) -> Self {
        let card = pm.card;
        SavedCard {
            id: pm.id,
            brand: card.as_ref().and_then(|c| c.brand.clone()),
            last4: card.as_ref().and_then(|c| c.last4.clone()),
            exp_month: card.as_ref().and_then(|c| c.exp_month),
            exp_year: card.as_ref().and_then(|c| c.exp_year),
            billing_name: pm.billing_details.and_then(|b| b.name).filter(|n| !n.is_empty()),
        }
    }
}

/// Stripe search query matching email or name; quotes in the term are escaped
fn customer_search_query(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('"', "\\\"");
    format!("email~\"{0}\" OR name~\"{0}\"", escaped)
}

fn metadata_form(metadata: &[(String, String)]) -> impl Iterator<Item = (String, String)> + '_ {
    metadata.iter().map(|(k, v)| (format!("metadata[{}]", k), v.clone()))
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeCustomer {
    /// Invoice default first, then a legacy default source
    fn payment_method(&self) -> Option<String> {
        let invoice_default = self
            .invoice_settings
            .as_ref()
            .and_then(|s| s.default_payment_method.clone());

        invoice_default.or_else(|| match &self.default_source {
            Some(serde_json::Value::String(id)) => Some(id.clone()),
            Some(source) => source.get("id").and_then(|v| v.as_str()).map(str::to_string),
            None => None,
        })
    }
}

impl OffSessionCharge {
    fn form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("amount".to_string(), self.amount_cents.to_string()),
            ("currency".to_string(), self.currency.clone()),
            ("customer".to_string(), self.customer_id.clone()),
            ("payment_method".to_string(), self.payment_method.clone()),
            ("off_session".to_string(), "true".to_string()),
            ("confirm".to_string(), "true".to_string()),
            ("description".to_string(), self.description.clone()),
        ];
        form.extend(metadata_form(&self.metadata));
        form
    }
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Integration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            secret_key: config.secret_key.clone(),
        })
    }

    async fn into_result<T: serde::de::DeserializeOwned>(response: reqwest::Response, action: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&text)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(text);
            warn!(%status, action, "Stripe request failed");
            return Err(Error::Integration(message));
        }
        response
            .json()
            .await
            .map_err(|e| Error::Integration(format!("Invalid Stripe {} response: {}", action, e)))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str, query: &[(&str, String)], action: &str) -> Result<T> {
        let response = self
            .http_client
            .get(format!("{}/{}", STRIPE_API_URL, path))
            .bearer_auth(&self.secret_key)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Integration(format!("Stripe {} failed: {}", action, e)))?;
        Self::into_result(response, action).await
    }

    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, form: &[(String, String)], action: &str) -> Result<T> {
        let response = self
            .http_client
            .post(format!("{}/{}", STRIPE_API_URL, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::Integration(format!("Stripe {} failed: {}", action, e)))?;
        Self::into_result(response, action).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PaymentCustomer>> {
        let page: StripeList<PaymentCustomer> = self
            .get("customers", &[("limit", limit.clamp(1, SEARCH_PAGE).to_string())], "customers.list")
            .await?;
        Ok(page.data)
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn default_payment_method(&self, customer_id: &str) -> Result<Option<String>> {
        let response = self
            .http_client
            .get(format!("{}/customers/{}", STRIPE_API_URL, customer_id))
            .bearer_auth(&self.secret_key)
            .query(&[("expand[]", "default_source")])
            .send()
            .await
            .map_err(|e| Error::Integration(format!("Stripe customer lookup failed: {}", e)))?;

        let customer: StripeCustomer = Self::into_result(response, "customers.retrieve").await?;
        Ok(customer.payment_method())
    }

    async fn charge_off_session(&self, charge: &OffSessionCharge) -> Result<PaymentIntent> {
        let response = self
            .http_client
            .post(format!("{}/payment_intents", STRIPE_API_URL))
            .bearer_auth(&self.secret_key)
            .form(&charge.form())
            .send()
            .await
            .map_err(|e| Error::Integration(format!("Stripe payment request failed: {}", e)))?;

        let intent: PaymentIntent = Self::into_result(response, "payment_intents.create").await?;
        info!(payment_intent = %intent.id, amount = intent.amount, status = %intent.status, "Payment intent confirmed");
        Ok(intent)
    }

    async fn find_customers(&self, search: Option<&str>, limit: usize) -> Result<Vec<PaymentCustomer>> {
        let Some(term) = search else {
            return self.list_recent(limit).await;
        };

        let found: StripeList<PaymentCustomer> = self
            .get(
                "customers/search",
                &[
                    ("query", customer_search_query(term)),
                    ("limit", SEARCH_PAGE.to_string()),
                ],
                "customers.search",
            )
            .await?;
        if !found.data.is_empty() {
            return Ok(found.data);
        }

        // Search misses billing names and boat names; scan the latest page instead
        self.list_recent(SEARCH_PAGE).await
    }

    async fn card_on_file(&self, customer_id: &str) -> Result<Option<SavedCard>> {
        let cards: StripeList<StripePaymentMethod> = self
            .get(
                "payment_methods",
                &[
                    ("customer", customer_id.to_string()),
                    ("type", "card".to_string()),
                    ("limit", "1".to_string()),
                ],
                "payment_methods.list",
            )
            .await?;
        Ok(cards.data.into_iter().next().map(SavedCard::from))
    }

    async fn create_customer(&self, customer: &NewPaymentCustomer) -> Result<PaymentCustomer> {
        let mut form = vec![
            ("name".to_string(), customer.name.clone()),
            ("email".to_string(), customer.email.clone()),
        ];
        if let Some(phone) = &customer.phone {
            form.push(("phone".to_string(), phone.clone()));
        }
        if let Some(description) = &customer.description {
            form.push(("description".to_string(), description.clone()));
        }
        form.extend(metadata_form(&customer.metadata));

        let created: PaymentCustomer = self.post("customers", &form, "customers.create").await?;
        info!(customer_id = %created.id, "Stripe customer created");
        Ok(created)
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent> {
        let form = [
            ("customer".to_string(), customer_id.to_string()),
            ("payment_method_types[]".to_string(), "card".to_string()),
            ("usage".to_string(), "off_session".to_string()),
        ];
        self.post("setup_intents", &form, "setup_intents.create").await
    }

    async fn attach_payment_method(&self, customer_id: &str, payment_method_id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post(
                &format!("payment_methods/{}/attach", payment_method_id),
                &[("customer".to_string(), customer_id.to_string())],
                "payment_methods.attach",
            )
            .await?;

        let _: serde_json::Value = self
            .post(
                &format!("customers/{}", customer_id),
                &[(
                    "invoice_settings[default_payment_method]".to_string(),
                    payment_method_id.to_string(),
                )],
                "customers.update",
            )
            .await?;

        info!(customer_id, payment_method_id, "Default payment method set");
        Ok(())
    }

    async fn update_customer_metadata(&self, customer_id: &str, metadata: &[(String, String)]) -> Result<()> {
        if metadata.is_empty() {
            return Ok(());
        }
        let form: Vec<_> = metadata_form(metadata).collect();
        let _: serde_json::Value = self
            .post(&format!("customers/{}", customer_id), &form, "customers.update")
            .await?;
        Ok(())
    }
}

/// Gateway used when no Stripe key is configured
pub struct DisabledPayments;

fn not_configured<T>() -> Result<T> {
    Err(Error::Integration("Payments are not configured".into()))
}

#[async_trait]
impl PaymentGateway for DisabledPayments {
    async fn default_payment_method(&self, _customer_id: &str) -> Result<Option<String>> {
        not_configured()
    }

    async fn charge_off_session(&self, _charge: &OffSessionCharge) -> Result<PaymentIntent> {
        not_configured()
    }

    async fn find_customers(&self, _search: Option<&str>, _limit: usize) -> Result<Vec<PaymentCustomer>> {
        not_configured()
    }

    async fn card_on_file(&self, _customer_id: &str) -> Result<Option<SavedCard>> {
        not_configured()
    }

    async fn create_customer(&self, _customer: &NewPaymentCustomer) -> Result<PaymentCustomer> {
        not_configured()
    }

    async fn create_setup_intent(&self, _customer_id: &str) -> Result<SetupIntent> {
        not_configured()
    }

    async fn attach_payment_method(&self, _customer_id: &str, _payment_method_id: &str) -> Result<()> {
        not_configured()
    }

    async fn update_customer_metadata(&self, _customer_id: &str, _metadata: &[(String, String)]) -> Result<()> {
        not_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_method_prefers_invoice_default() {
        let customer: StripeCustomer = serde_json::from_value(json!({
            "invoice_settings": { "default_payment_method": "pm_invoice" },
            "default_source": { "id": "card_legacy" }
        }))
        .unwrap();
        assert_eq!(customer.payment_method().as_deref(), Some("pm_invoice"));

        let legacy: StripeCustomer = serde_json::from_value(json!({
            "invoice_settings": { "default_payment_method": null },
            "default_source": { "id": "card_legacy" }
        }))
        .unwrap();
        assert_eq!(legacy.payment_method().as_deref(), Some("card_legacy"));

        let none: StripeCustomer = serde_json::from_value(json!({})).unwrap();
        assert!(none.payment_method().is_none());
    }

    #[test]
    fn test_charge_form_encodes_metadata() {
        let charge = OffSessionCharge {
            customer_id: "cus_1".into(),
            payment_method: "pm_1".into(),
            amount_cents: 19950,
            currency: "usd".into(),
            description: "Recurring Cleaning - Order SO-1".into(),
            metadata: vec![("order_id".into(), "o-1".into())],
        };
        let form = charge.form();
        assert!(form.contains(&("amount".into(), "19950".into())));
        assert!(form.contains(&("off_session".into(), "true".into())));
        assert!(form.contains(&("metadata[order_id]".into(), "o-1".into())));
    }

    #[test]
    fn test_payment_method_list_to_card() {
        let list: StripeList<StripePaymentMethod> = serde_json::from_value(json!({
            "object": "list",
            "data": [{
                "id": "pm_1",
                "card": { "brand": "visa", "last4": "4242", "exp_month": 8, "exp_year": 2030 },
                "billing_details": { "name": "Brian Cline" }
            }]
        }))
        .unwrap();
        let card = SavedCard::from(list.data.into_iter().next().unwrap());
        assert_eq!(card.last4.as_deref(), Some("4242"));
        assert_eq!(card.billing_name.as_deref(), Some("Brian Cline"));
    }

    #[test]
    fn test_search_query_escapes_quotes() {
        assert_eq!(customer_search_query("pat"), r#"email~"pat" OR name~"pat""#);
        assert_eq!(customer_search_query(r#"a"b"#), r#"email~"a\"b" OR name~"a\"b""#);
    }

    #[tokio::test]
    async fn test_disabled_gateway_errors() {
        let result = DisabledPayments.default_payment_method("cus_1").await;
        assert!(matches!(result, Err(Error::Integration(_))));
    }
}
