use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored payment method: a provider-issued token plus display metadata.
///
/// Raw card data never enters this record; `token` is the provider's opaque
/// handle and the brand/last4/expiry fields exist only so callers can render
/// the method. At most one record exists per `(provider, token)` pair, and at
/// most one method per customer carries `is_default`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub customer_id: String,
    pub provider: String,
    pub token: String,
    pub method_type: String,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<u8>,
    pub exp_year: Option<u16>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serialization_roundtrip() {
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            customer_id: "cust-1".to_string(),
            provider: "alphapay".to_string(),
            token: "alphapay-tok-1".to_string(),
            method_type: "card".to_string(),
            brand: Some("visa".to_string()),
            last4: Some("4242".to_string()),
            exp_month: Some(12),
            exp_year: Some(2030),
            is_default: true,
            created_at: Utc::now(),
            created_by: "tests".to_string(),
            updated_at: Utc::now(),
        };

        let bytes = serde_json::to_vec(&method).unwrap();
        let back: PaymentMethod = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, method);
    }
}
