//! Field catalogs: the fields a mapping task expects and the sheet they live in.
//!
//! Catalogs can be declared in code or loaded from JSON:
//!
//! ```
//! use sheet_mapper::catalog::FieldCatalog;
//! use sheet_mapper::types::DataType;
//!
//! let catalog = FieldCatalog::from_json_str(r#"{
//!     "sheet": "Payments",
//!     "fields": [
//!         {"name": "amount", "data_type": "double", "synonyms": ["Importe", "Amount"]},
//!         {"name": "paidOn", "data_type": "date"}
//!     ]
//! }"#).unwrap();
//! assert_eq!(catalog.field("amount").map(|f| f.data_type), Some(DataType::Double));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MappingResult;
use crate::types::Field;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCatalog {
    /// Fragment of the sheet name the fields are read from.
    pub sheet: String,
    pub fields: Vec<Field>,
}

impl FieldCatalog {
    pub fn new(sheet: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            sheet: sheet.into(),
            fields,
        }
    }

    pub fn from_json_str(json: &str) -> MappingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Loan "Raw Data" sheets.
pub mod raw_data {
    use chrono::NaiveDate;
    use serde::{Deserialize, Serialize};

    use super::FieldCatalog;
    use crate::error::MappingResult;
    use crate::mapping::{Searcher, SerdePopulate, SheetMapper, Validator};
    use crate::types::{DataType, Field, MapperResponse, ValidationResult};

    pub const SHEET: &str = "Raw Data";

    const FIELDS: [(&str, DataType, &str); 18] = [
        ("reportDate", DataType::Date, "Report Date"),
        ("funder", DataType::String, "Funder"),
        ("product", DataType::String, "Product"),
        ("contractDisbursementDate", DataType::Date, "Contract Disbursement Date"),
        ("contractId", DataType::Long, "Contract Id"),
        ("contractNumber", DataType::Long, "Contract Number"),
        ("fullName", DataType::String, "Full Name"),
        ("idNumber", DataType::String, "ID Number"),
        ("contract", DataType::String, "Contract Status"),
        ("loanAmount", DataType::Long, "Loan Amount"),
        ("termMonths", DataType::Int, "Term Months"),
        ("repaymentFrequency", DataType::String, "Repayment Frequency"),
        ("loanRepaymentAmount", DataType::Long, "Loan Repayment Amount"),
        ("totalOutstandingBalance", DataType::Long, "Total Outstanding Balance"),
        ("outstandingPrincipalBalance", DataType::Long, "Outstanding Principal Balance"),
        (
            "outstandingInterestAndFeesBalance",
            DataType::Long,
            "Outstanding Interest and Fees Balance",
        ),
        ("arrearsBucket", DataType::String, "Arrears Bucket"),
        ("apr", DataType::String, "APR"),
    ];

    pub fn catalog() -> FieldCatalog {
        let fields = FIELDS
            .iter()
            .map(|(name, data_type, label)| Field::new(*name, *data_type).with_synonyms([*label]))
            .collect();
        FieldCatalog::new(SHEET, fields)
    }

    /// One loan row.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct RawDataRecord {
        pub report_date: Option<NaiveDate>,
        pub funder: Option<String>,
        pub product: Option<String>,
        pub contract_disbursement_date: Option<NaiveDate>,
        pub contract_id: Option<i64>,
        pub contract_number: Option<i64>,
        pub full_name: Option<String>,
        pub id_number: Option<String>,
        pub contract: Option<String>,
        pub loan_amount: Option<i64>,
        pub term_months: Option<i32>,
        pub repayment_frequency: Option<String>,
        pub loan_repayment_amount: Option<i64>,
        pub total_outstanding_balance: Option<i64>,
        pub outstanding_principal_balance: Option<i64>,
        pub outstanding_interest_and_fees_balance: Option<i64>,
        pub arrears_bucket: Option<String>,
        pub apr: Option<String>,
    }

    /// Rejects rows with neither a contract id nor a product (blank or `0`).
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RawDataValidator;

    impl Validator<RawDataRecord> for RawDataValidator {
        fn validate(&self, record: &RawDataRecord) -> ValidationResult {
            let no_contract = matches!(record.contract_id, None | Some(0));
            let no_product = record
                .product
                .as_deref()
                .is_none_or(|p| p.trim().is_empty() || p == "0");
            if no_contract && no_product {
                ValidationResult::error("missing contract id and product")
            } else {
                ValidationResult::ok()
            }
        }
    }

    /// Maps the workbook's raw-data sheet.
    pub fn map_raw_data<S: Searcher>(
        mapper: &mut SheetMapper<S>,
    ) -> MappingResult<MapperResponse<RawDataRecord>> {
        let catalog = catalog();
        mapper.map_sheet_to_records(
            &catalog.fields,
            &catalog.sheet,
            Some(&RawDataValidator),
            &SerdePopulate::<RawDataRecord>::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::raw_data::{RawDataRecord, RawDataValidator, catalog};
    use super::*;
    use crate::mapping::Validator;
    use crate::types::{CorrectnessLevel, DataType};

    #[test]
    fn raw_data_catalog_declares_all_fields() {
        let c = catalog();
        assert_eq!(c.sheet, "Raw Data");
        assert_eq!(c.fields.len(), 18);
        let term = c.field("termMonths").unwrap();
        assert_eq!(term.data_type, DataType::Int);
        assert_eq!(term.synonyms, vec!["Term Months".to_string()]);
    }

    #[test]
    fn catalogs_load_from_json() {
        let c = FieldCatalog::from_json_str(
            r#"{"sheet": "Clients", "fields": [{"name": "id", "data_type": "long", "column_offset": 1}]}"#,
        )
        .unwrap();
        let id = c.field("id").unwrap();
        assert_eq!(id.column_offset, 1);
        assert!(id.synonyms.is_empty());
        assert!(FieldCatalog::from_json_str("{\"sheet\": 3}").is_err());
    }

    #[test]
    fn validator_flags_rows_without_contract_or_product() {
        let empty = RawDataRecord {
            contract_id: Some(0),
            product: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(RawDataValidator.validate(&empty).level, CorrectnessLevel::Error);

        let with_product = RawDataRecord {
            product: Some("Nano loan".to_string()),
            ..Default::default()
        };
        assert_eq!(RawDataValidator.validate(&with_product).level, CorrectnessLevel::Ok);
    }
}
