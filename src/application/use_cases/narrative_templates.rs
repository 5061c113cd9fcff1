use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::dataset::Dataset;

/// Shown when the dataset has no columns.
pub const MISSING_COLUMN_PLACEHOLDER: &str = "N/A";
/// Shown when the dataset has no rows.
pub const MISSING_VALUE_PLACEHOLDER: &str = "—";

/// Selectable SAR narrative bodies for the default provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeTemplate {
    /// Elder financial exploitation, single subject.
    #[default]
    ElderExploitation,
    /// Elder financial exploitation with a high-risk jurisdiction subject.
    ElderExploitationHighRisk,
    /// Cash deposits structured under the reporting threshold.
    CashStructuring,
}

impl NarrativeTemplate {
    pub const ALL: [NarrativeTemplate; 3] = [
        NarrativeTemplate::ElderExploitation,
        NarrativeTemplate::ElderExploitationHighRisk,
        NarrativeTemplate::CashStructuring,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            NarrativeTemplate::ElderExploitation => "elder_exploitation",
            NarrativeTemplate::ElderExploitationHighRisk => "elder_exploitation_high_risk",
            NarrativeTemplate::CashStructuring => "cash_structuring",
        }
    }

    /// Fill the template. Output depends only on the context.
    pub fn render(&self, context: &NarrativeContext) -> String {
        let body = self
            .body()
            .replace("{date}", &context.report_date.format("%B %-d, %Y").to_string());

        let footer = format!(
            "Source data reviewed on {}: {} rows across {} columns (first field \"{}\", sample value \"{}\").",
            context.report_date.format("%Y-%m-%d"),
            context.rows,
            context.columns,
            context.first_column,
            context.sample_value
        );

        format!("{}\n\n{}", body.trim(), footer)
    }

    fn body(&self) -> &'static str {
        match self {
            NarrativeTemplate::ElderExploitation => ELDER_EXPLOITATION,
            NarrativeTemplate::ElderExploitationHighRisk => ELDER_EXPLOITATION_HIGH_RISK,
            NarrativeTemplate::CashStructuring => CASH_STRUCTURING,
        }
    }
}

impl fmt::Display for NarrativeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for NarrativeTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|template| template.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|t| t.id()).collect();
                format!("unknown narrative template '{}' (known: {})", s, known.join(", "))
            })
    }
}

/// Values a template may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeContext {
    pub report_date: NaiveDate,
    pub rows: usize,
    pub columns: usize,
    pub first_column: String,
    pub sample_value: String,
}

impl NarrativeContext {
    /// Never indexes into empty data; placeholders stand in instead.
    pub fn from_dataset(dataset: &Dataset, report_date: NaiveDate) -> Self {
        let first_column = dataset
            .first_column_name()
            .unwrap_or(MISSING_COLUMN_PLACEHOLDER)
            .to_string();
        let sample_value = dataset
            .first_value()
            .map(|cell| cell.to_string())
            .unwrap_or_else(|| MISSING_VALUE_PLACEHOLDER.to_string());

        Self {
            report_date,
            rows: dataset.row_count(),
            columns: dataset.column_count(),
            first_column,
            sample_value,
        }
    }
}

const ELDER_EXPLOITATION: &str = r#"
This SAR is being filed because:
1) John Doe, a 25-year-old resident of a high-risk jurisdiction, has been identified as the recipient of payments, mostly from elderly individuals located in the US, GB, and other countries, with no clear purpose for the activity;
2) The suspicious activity occurred between January 1, 2023, and March 31, 2023, involving credit amounts greater than $2,000 from 12 elderly counterparties with an average age of 54; and
3) John Doe has been identified as the subject in this matter.

The platform operates an online payment system that allows individuals and businesses to send and receive money globally through an account created with an email address provided by the account holder. Funds can be loaded with a bank account or credit/debit card and used to make purchases, pay bills, or transfer money directly to anyone with an email address; to receive funds the recipient must hold an account associated with that address.

Between January 1, 2023, and March 31, 2023, John Doe received multiple payments from accounts based in the US, GB, and other countries. The volume and frequency of these transfers, combined with the significant age disparity between John Doe and the elderly senders, raise strong concerns consistent with Elder Financial Exploitation (EFE) typologies outlined in AML rule 2105. Notes associated with the credit transactions included emojis and references to "friends and family," which do not indicate a clear purpose for the transactions.

The transfers suggest a coordinated pattern of potentially exploitative activity whereby funds are moved from elderly individuals' accounts to a younger individual in a high-risk jurisdiction. This activity aligns with known red flags for elder exploitation, including age disparity, geographic risk, and multiple elderly source accounts.

Given the typology and evidence, these transactions warrant enhanced scrutiny and ongoing monitoring. The associated accounts are flagged for potential law enforcement reporting and additional documentation can be provided to support further investigation.
"#;

const ELDER_EXPLOITATION_HIGH_RISK: &str = r#"
This SAR is being filed because:
1) Jane Roe, a 24-year-old resident of Kenya, a high-risk jurisdiction, has been identified as the recipient of payments, mostly from elderly individuals located in the US, GB, and other countries, with no clear purpose for the activity;
2) The suspicious activity occurred between August 1, 2024, and October 31, 2024, involving credit amounts greater than $2,000 from 12 elderly counterparties with an average age of 54; and
3) Jane Roe has been identified as the subject in this matter.

Between August 1, 2024, and October 31, 2024, Jane Roe received multiple payments from accounts based in the US, GB, and other countries. The volume and frequency of these transfers, combined with the significant age disparity between the subject and the elderly senders, raise strong concerns consistent with Elder Financial Exploitation (EFE) typologies outlined in AML rule 2105. Transaction notes included emojis and references to "friends and family," which do not indicate a clear purpose.

The transfers suggest a coordinated pattern of potentially exploitative activity whereby funds are moved from elderly individuals' accounts to a younger individual in a high-risk jurisdiction, matching known red flags: age disparity, geographic risk, and multiple elderly source accounts.

These transactions warrant enhanced scrutiny and ongoing monitoring. The associated accounts are flagged for potential law enforcement reporting.
"#;

const CASH_STRUCTURING: &str = r#"
On {date}, customer John Smith (Account Number ****1234) conducted unusual cash deposit activity involving multiple transactions totaling $250,000.

WHO: John Smith, 45-year-old business owner, account holder since 2020.

WHAT: 25 cash deposits ranging from $8,500 to $9,950, all below the $10,000 reporting threshold.

WHEN: Concentrated over a 6-day period (January 10-15, 2024), representing a 300% increase from normal activity.

WHERE: Deposits made across three different branch locations within a 50-mile radius of the customer's primary address.

WHY: Transactions appear designed to evade Currency Transaction Report (CTR) filing requirements. The customer was unable to provide a satisfactory explanation for the source of funds.

HOW: Detected via the Large Cash Deposits AML rule. Pattern analysis revealed systematic structuring behavior inconsistent with the customer's historical transaction profile and stated business activities.

Recommendation: Proceed with manual review and consider filing a SAR if further investigation confirms suspicious intent.
"#;
