//! Post-seed verification checks.
//!
//! Each check is a named count query. Checks are evaluated independently:
//! a check whose query fails (missing table, missing column) becomes
//! [`CheckValue::Unavailable`] and the remaining checks still run.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::SeedSession;

/// Module name the reference data is seeded for.
pub const MODULE_NAME: &str = "CRM";

/// Picklist types the seed script is expected to create.
pub const PICKLIST_TYPES: &[&str] = &[
    "Lead Status",
    "Lead Source",
    "Opportunity Stage",
    "Activity Type",
    "Industry",
];

/// A named query returning a single count.
///
/// The first column of the first row must be an integer (`SMALLINT`,
/// `INTEGER` or `BIGINT`). Other types make the check unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub name: String,
    pub sql: String,
}

impl VerificationCheck {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// The fixed checks run after seeding reference data.
pub fn default_checks() -> Vec<VerificationCheck> {
    let picklist_types = PICKLIST_TYPES
        .iter()
        .map(|t| format!("'{t}'"))
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        VerificationCheck::new(
            "module_count",
            format!(r#"SELECT COUNT(*) FROM "mstModule" WHERE "strName" = '{MODULE_NAME}'"#),
        ),
        VerificationCheck::new(
            "template_count",
            format!(
                r#"SELECT COUNT(*) FROM "mstPageTemplate" WHERE "strTemplateName" LIKE '{MODULE_NAME}\_%'"#
            ),
        ),
        VerificationCheck::new(
            "picklist_type_count",
            format!(
                r#"SELECT COUNT(*) FROM "mstPicklistType" WHERE "strType" IN ({picklist_types})"#
            ),
        ),
        VerificationCheck::new(
            "menu_count",
            format!(r#"SELECT COUNT(*) FROM "mstMenu" WHERE "strMenuCategory" = '{MODULE_NAME}'"#),
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckValue {
    Count(i64),
    Unavailable { reason: String },
}

impl CheckValue {
    pub fn count(&self) -> Option<i64> {
        match self {
            CheckValue::Count(n) => Some(*n),
            CheckValue::Unavailable { .. } => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, CheckValue::Unavailable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub name: String,
    pub value: CheckValue,
}

/// Runs every check in order. Never fails as a whole.
pub async fn run_checks<S>(session: &mut S, checks: &[VerificationCheck]) -> Vec<VerificationResult>
where
    S: SeedSession + ?Sized,
{
    info!("Running {} verification checks...", checks.len());

    let mut results = Vec::with_capacity(checks.len());
    for check in checks {
        let value = match session.query_count(&check.sql).await {
            Ok(count) => CheckValue::Count(count),
            Err(e) => {
                warn!("Verification check {} unavailable: {}", check.name, e.reason());
                CheckValue::Unavailable { reason: e.reason() }
            }
        };
        results.push(VerificationResult {
            name: check.name.clone(),
            value,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_checks_names_and_order() {
        let names: Vec<_> = default_checks().into_iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "module_count",
                "template_count",
                "picklist_type_count",
                "menu_count"
            ]
        );
    }

    #[test]
    fn test_default_check_queries() {
        let checks = default_checks();

        assert!(checks[0].sql.contains(r#""strName" = 'CRM'"#));
        assert!(checks[1].sql.contains(r#"LIKE 'CRM\_%'"#));
        assert!(checks[2].sql.contains("'Lead Status', 'Lead Source'"));
        assert!(checks[3].sql.contains(r#""strMenuCategory" = 'CRM'"#));
        assert!(checks.iter().all(|c| c.sql.starts_with("SELECT COUNT(*)")));
    }

    #[test]
    fn test_check_value_accessors() {
        assert_eq!(CheckValue::Count(4).count(), Some(4));
        let missing = CheckValue::Unavailable {
            reason: "relation does not exist".into(),
        };
        assert_eq!(missing.count(), None);
        assert!(missing.is_unavailable());
    }

    #[test]
    fn test_check_value_json() {
        let json = serde_json::to_value(CheckValue::Count(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "count": 7 }));

        let json = serde_json::to_value(CheckValue::Unavailable {
            reason: "missing".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "unavailable": { "reason": "missing" } })
        );
    }
}
