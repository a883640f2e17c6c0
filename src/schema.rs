//! Customer record schema and request validation
//!
//! The raw record has ten fields. Identifier columns present in the
//! historical data (`RowNumber`, `CustomerId`, `Surname`) have no slot in
//! [`CustomerRecord`], so they can never reach the feature transformer.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema columns in declared (CSV) order.
pub const CUSTOMER_COLUMNS: [&str; 10] = [
    "CreditScore",
    "Geography",
    "Gender",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
    "EstimatedSalary",
];

/// Columns dropped before modeling.
pub const IDENTIFIER_COLUMNS: [&str; 3] = ["RowNumber", "CustomerId", "Surname"];

/// Label column, present only in training data.
pub const TARGET_COLUMN: &str = "Exited";

/// A single cell as seen by the feature transformer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

/// Anything the feature transformer can read columns from.
pub trait Record {
    /// Value of `column`, or `None` if the record has no such column.
    fn field(&self, column: &str) -> Option<FieldValue<'_>>;
}

/// One bank customer, without identifiers or label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerRecord {
    pub credit_score: i64,
    pub geography: String,
    pub gender: String,
    pub age: i64,
    pub tenure: i64,
    pub balance: f64,
    pub num_of_products: i64,
    pub has_cr_card: u8,
    pub is_active_member: u8,
    pub estimated_salary: f64,
}

impl Record for CustomerRecord {
    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        let value = match column {
            "CreditScore" => FieldValue::Number(self.credit_score as f64),
            "Geography" => FieldValue::Text(&self.geography),
            "Gender" => FieldValue::Text(&self.gender),
            "Age" => FieldValue::Number(self.age as f64),
            "Tenure" => FieldValue::Number(self.tenure as f64),
            "Balance" => FieldValue::Number(self.balance),
            "NumOfProducts" => FieldValue::Number(self.num_of_products as f64),
            "HasCrCard" => FieldValue::Number(self.has_cr_card as f64),
            "IsActiveMember" => FieldValue::Number(self.is_active_member as f64),
            "EstimatedSalary" => FieldValue::Number(self.estimated_salary),
            _ => return None,
        };
        Some(value)
    }
}

impl CustomerRecord {
    /// Validate an untyped JSON payload against the 10-field schema.
    ///
    /// Fields are checked in schema order and the first failure is returned.
    /// Unknown fields are ignored.
    pub fn from_json(value: &Value) -> std::result::Result<Self, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(json_type(value)))?;

        Ok(Self {
            credit_score: int_field(obj, "CreditScore")?,
            geography: text_field(obj, "Geography")?,
            gender: text_field(obj, "Gender")?,
            age: int_field(obj, "Age")?,
            tenure: int_field(obj, "Tenure")?,
            balance: float_field(obj, "Balance")?,
            num_of_products: int_field(obj, "NumOfProducts")?,
            has_cr_card: flag_field(obj, "HasCrCard")?,
            is_active_member: flag_field(obj, "IsActiveMember")?,
            estimated_salary: float_field(obj, "EstimatedSalary")?,
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> std::result::Result<&'a Value, ValidationError> {
    obj.get(field).ok_or(ValidationError::MissingField(field))
}

fn int_field(obj: &Map<String, Value>, field: &'static str) -> std::result::Result<i64, ValidationError> {
    let value = require(obj, field)?;
    let wrong_type = || ValidationError::WrongType {
        field,
        expected: "an integer",
        actual: match value {
            Value::Number(n) => n.to_string(),
            other => json_type(other).to_string(),
        },
    };

    if let Some(i) = value.as_i64() {
        return Ok(i);
    }
    // 650.0 is accepted, 650.5 is not
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(wrong_type()),
    }
}

fn float_field(obj: &Map<String, Value>, field: &'static str) -> std::result::Result<f64, ValidationError> {
    let value = require(obj, field)?;
    value.as_f64().ok_or_else(|| ValidationError::WrongType {
        field,
        expected: "a number",
        actual: json_type(value).to_string(),
    })
}

fn text_field(obj: &Map<String, Value>, field: &'static str) -> std::result::Result<String, ValidationError> {
    let value = require(obj, field)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::WrongType {
            field,
            expected: "a string",
            actual: json_type(value).to_string(),
        })
}

fn flag_field(obj: &Map<String, Value>, field: &'static str) -> std::result::Result<u8, ValidationError> {
    match int_field(obj, field)? {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(ValidationError::OutOfRange {
            field,
            reason: format!("expected 0 or 1, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "CreditScore": 650,
            "Geography": "France",
            "Gender": "Female",
            "Age": 40,
            "Tenure": 5,
            "Balance": 0.0,
            "NumOfProducts": 2,
            "HasCrCard": 1,
            "IsActiveMember": 1,
            "EstimatedSalary": 50000
        })
    }

    #[test]
    fn test_valid_payload_parses() {
        let record = CustomerRecord::from_json(&valid_payload()).unwrap();
        assert_eq!(record.credit_score, 650);
        assert_eq!(record.geography, "France");
        assert_eq!(record.estimated_salary, 50000.0);
        assert_eq!(record.has_cr_card, 1);
    }

    #[test]
    fn test_missing_credit_score_rejected() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("CreditScore");
        let err = CustomerRecord::from_json(&payload).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("CreditScore"));
    }

    #[test]
    fn test_wrong_types_rejected() {
        let mut payload = valid_payload();
        payload["Age"] = json!("forty");
        assert!(matches!(
            CustomerRecord::from_json(&payload),
            Err(ValidationError::WrongType { field: "Age", .. })
        ));

        let mut payload = valid_payload();
        payload["Geography"] = json!(3);
        assert!(matches!(
            CustomerRecord::from_json(&payload),
            Err(ValidationError::WrongType { field: "Geography", .. })
        ));

        let mut payload = valid_payload();
        payload["Tenure"] = json!(5.5);
        assert!(matches!(
            CustomerRecord::from_json(&payload),
            Err(ValidationError::WrongType { field: "Tenure", .. })
        ));
    }

    #[test]
    fn test_integral_float_accepted_for_int_field() {
        let mut payload = valid_payload();
        payload["CreditScore"] = json!(650.0);
        let record = CustomerRecord::from_json(&payload).unwrap();
        assert_eq!(record.credit_score, 650);
    }

    #[test]
    fn test_flag_out_of_range() {
        let mut payload = valid_payload();
        payload["HasCrCard"] = json!(2);
        assert!(matches!(
            CustomerRecord::from_json(&payload),
            Err(ValidationError::OutOfRange { field: "HasCrCard", .. })
        ));
    }

    #[test]
    fn test_identifiers_ignored() {
        let mut payload = valid_payload();
        payload["Surname"] = json!("Hargrave");
        payload["CustomerId"] = json!(15634602);
        assert!(CustomerRecord::from_json(&payload).is_ok());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = CustomerRecord::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject("array"));
    }

    #[test]
    fn test_record_fields_cover_schema() {
        let record = CustomerRecord::from_json(&valid_payload()).unwrap();
        for column in CUSTOMER_COLUMNS {
            assert!(record.field(column).is_some(), "missing {}", column);
        }
        for column in IDENTIFIER_COLUMNS {
            assert!(record.field(column).is_none());
        }
        assert_eq!(record.field("Gender"), Some(FieldValue::Text("Female")));
    }
}
