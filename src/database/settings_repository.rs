use crate::database::error::DatabaseError;
use serde::{Deserialize, Serialize};
use sqlx::{types::BigDecimal, FromRow, PgPool};

/// Fixed primary key of the singleton settings row
pub const SETTINGS_ID: &str = "default";

/// Platform settings entity (singleton row)
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub id: String,
    pub maintenance_mode: bool,
    pub min_buy_amount: i32,
    pub price_source: String,
    pub manual_price: Option<BigDecimal>,
    pub features: Option<serde_json::Value>,
    pub banner: Option<serde_json::Value>,
    pub trust: Option<serde_json::Value>,
    pub fees: Option<serde_json::Value>,
    pub disclosures: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Partial update; absent fields leave the stored column untouched.
/// Blob columns are replaced wholesale when present, matching a top-level
/// entity merge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub maintenance_mode: Option<bool>,
    pub min_buy_amount: Option<i32>,
    pub price_source: Option<String>,
    pub manual_price: Option<BigDecimal>,
    pub features: Option<serde_json::Value>,
    pub banner: Option<serde_json::Value>,
    pub trust: Option<serde_json::Value>,
    pub fees: Option<serde_json::Value>,
    pub disclosures: Option<serde_json::Value>,
}

const SETTINGS_COLUMNS: &str = "id, maintenance_mode, min_buy_amount, price_source, manual_price, \
     features, banner, trust, fees, disclosures, created_at, updated_at";

pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the singleton settings row, creating it with platform defaults
    /// on first access. The upsert is keyed by the fixed id, so concurrent
    /// first reads converge on a single row.
    pub async fn get_or_create(&self) -> Result<AdminSettings, DatabaseError> {
        sqlx::query(
            "INSERT INTO admin_settings \
             (id, maintenance_mode, min_buy_amount, price_source, manual_price, \
              features, banner, trust, fees, disclosures) \
             VALUES ($1, FALSE, 10, 'live', NULL, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(SETTINGS_ID)
        .bind(default_features())
        .bind(default_banner())
        .bind(default_trust())
        .bind(default_fees())
        .bind(serde_json::json!({}))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        sqlx::query_as::<_, AdminSettings>(&format!(
            "SELECT {} FROM admin_settings WHERE id = $1",
            SETTINGS_COLUMNS
        ))
        .bind(SETTINGS_ID)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Apply a partial update to the singleton row and return the merged
    /// record. Fields absent from the patch are unchanged.
    pub async fn patch(&self, patch: &SettingsPatch) -> Result<AdminSettings, DatabaseError> {
        // Make sure the row exists before patching it
        self.get_or_create().await?;

        sqlx::query_as::<_, AdminSettings>(&format!(
            "UPDATE admin_settings SET \
                 maintenance_mode = COALESCE($2, maintenance_mode), \
                 min_buy_amount = COALESCE($3, min_buy_amount), \
                 price_source = COALESCE($4, price_source), \
                 manual_price = COALESCE($5, manual_price), \
                 features = COALESCE($6, features), \
                 banner = COALESCE($7, banner), \
                 trust = COALESCE($8, trust), \
                 fees = COALESCE($9, fees), \
                 disclosures = COALESCE($10, disclosures), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            SETTINGS_COLUMNS
        ))
        .bind(SETTINGS_ID)
        .bind(patch.maintenance_mode)
        .bind(patch.min_buy_amount)
        .bind(patch.price_source.as_deref())
        .bind(patch.manual_price.clone())
        .bind(patch.features.clone())
        .bind(patch.banner.clone())
        .bind(patch.trust.clone())
        .bind(patch.fees.clone())
        .bind(patch.disclosures.clone())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

pub fn default_features() -> serde_json::Value {
    serde_json::json!({ "buy": true, "sell": true, "sip": true, "admin": true })
}

pub fn default_banner() -> serde_json::Value {
    serde_json::json!({ "show": false, "text": "", "type": "info" })
}

pub fn default_trust() -> serde_json::Value {
    serde_json::json!({ "partnerName": "", "purity": "24K 99.9", "insured": true })
}

pub fn default_fees() -> serde_json::Value {
    serde_json::json!({ "spreadBps": 0, "convenienceFeeBps": 0, "gstRate": 3 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fees_carry_gst_only() {
        let fees = default_fees();
        assert_eq!(fees["spreadBps"], 0);
        assert_eq!(fees["convenienceFeeBps"], 0);
        assert_eq!(fees["gstRate"], 3);
    }

    #[test]
    fn settings_patch_deserializes_partial_body() {
        let patch: SettingsPatch =
            serde_json::from_value(serde_json::json!({ "minBuyAmount": 50 }))
                .expect("partial patch should deserialize");
        assert_eq!(patch.min_buy_amount, Some(50));
        assert!(patch.maintenance_mode.is_none());
        assert!(patch.fees.is_none());
    }
}
