//! Pharmacy — the tenant root.
//!
//! Every other entity carries an explicit `pharmacy_id`, and every scoped
//! store operation filters on it. Pharmacies are never hard-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pharmacy {
  pub pharmacy_id: Uuid,
  pub name:        String,
  /// Unique, stored lowercased.
  pub email:       String,
  /// Argon2 PHC string. Never serialised to API responses; the API layer
  /// exposes its own view type.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::RefillStore::add_pharmacy`]. The credential is
/// already hashed by the caller; the core never sees a plaintext password.
#[derive(Debug, Clone)]
pub struct NewPharmacy {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
}

impl NewPharmacy {
  pub fn validate(&self) -> crate::Result<()> {
    if self.name.trim().is_empty() {
      return Err(crate::Error::Validation("pharmacy name is required".into()));
    }
    if !self.email.contains('@') {
      return Err(crate::Error::Validation(format!(
        "invalid email address: {:?}",
        self.email
      )));
    }
    Ok(())
  }
}
