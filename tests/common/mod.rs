//! Synthetic bank customers shared by the integration tests

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use retention_engine::data::LabeledDataset;
use retention_engine::schema::CustomerRecord;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "RowNumber,CustomerId,Surname,CreditScore,Geography,Gender,Age,Tenure,Balance,NumOfProducts,HasCrCard,IsActiveMember,EstimatedSalary,Exited";

/// Customers whose churn mostly follows age, activity and country.
pub fn generate_customers(n: usize, seed: u64) -> LabeledDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let geographies = ["France", "Germany", "Spain"];
    let genders = ["Female", "Male"];

    let mut records = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for _ in 0..n {
        let age: i64 = rng.gen_range(18..80);
        let is_active_member: u8 = rng.gen_range(0..2);
        let geography = geographies[rng.gen_range(0..3)];
        let balance = if rng.gen_bool(0.3) {
            0.0
        } else {
            (rng.gen_range(1_000.0..200_000.0f64) * 100.0).round() / 100.0
        };
        let record = CustomerRecord {
            credit_score: rng.gen_range(350..851),
            geography: geography.to_string(),
            gender: genders[rng.gen_range(0..2)].to_string(),
            age,
            tenure: rng.gen_range(0..11),
            balance,
            num_of_products: rng.gen_range(1..5),
            has_cr_card: rng.gen_range(0..2),
            is_active_member,
            estimated_salary: (rng.gen_range(10_000.0..200_000.0f64) * 100.0).round() / 100.0,
        };

        let mut risk = 0.05;
        if age > 45 {
            risk += 0.5;
        }
        if is_active_member == 0 {
            risk += 0.2;
        }
        if geography == "Germany" {
            risk += 0.15;
        }
        labels.push(u8::from(rng.gen_bool(f64::min(risk, 0.95))));
        records.push(record);
    }

    LabeledDataset::new(records, labels).unwrap()
}

/// Write `dataset` as the historical CSV, identifiers included.
pub fn write_csv(dataset: &LabeledDataset, dir: &Path) -> PathBuf {
    let path = dir.join("churn_data.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for (i, (r, label)) in dataset.records.iter().zip(&dataset.labels).enumerate() {
        writeln!(
            file,
            "{},{},Surname{},{},{},{},{},{},{:.2},{},{},{},{:.2},{}",
            i + 1,
            15_600_000 + i,
            i,
            r.credit_score,
            r.geography,
            r.gender,
            r.age,
            r.tenure,
            r.balance,
            r.num_of_products,
            r.has_cr_card,
            r.is_active_member,
            r.estimated_salary,
            label
        )
        .unwrap();
    }
    path
}

/// The reference customer used by the end-to-end scenario.
pub fn reference_payload() -> Value {
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
