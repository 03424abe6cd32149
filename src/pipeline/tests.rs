use super::{
    amount_category, final_validation, risk_level, risk_score, BusinessRule, CustomerSet, DropReason, PipelineError,
    RunContext, Stage, TransactionPipeline
};

use std::collections::HashSet;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{TimeDelta, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::config::PipelineConfig;
use crate::models::{AmountCategory, CleanTransaction, Record, RecordBatch, RiskLevel, Status};
use crate::types::{Coercible, Timestamp};

// A Sunday.
fn evaluation_time() -> Timestamp {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn days_ago(days: i64) -> Timestamp {
    evaluation_time() - TimeDelta::days(days)
}

fn create_record(transaction_id: &str, customer_id: Option<&str>, date: Timestamp, amount: &str, status: &str) -> Record {
    Record {
        transaction_id: Some(transaction_id.to_string()),
        customer_id: customer_id.map(str::to_string),
        transaction_date: Some(Coercible::raw(date.format("%Y-%m-%d %H:%M:%S").to_string())),
        amount: Some(Coercible::raw(amount)),
        merchant_id: Some("merch001".to_string()),
        category: Some("groceries".to_string()),
        status: Some(status.to_string()),
        payment_method: Some("credit_card".to_string()),
        enrichment: None
    }
}

fn decimal(value: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(value)?)
}

#[test]
fn test_dirty_batch_shrinks_to_clean_unique_records() -> Result<()> {
    let batch = RecordBatch::new("transactions", vec![
        create_record("TXN001", Some("CUST001"), days_ago(1), "100.50", "completed"),
        create_record("TXN002", Some("CUST002"), days_ago(2), "250.00", "completed"),
        create_record("TXN002", Some("CUST003"), days_ago(3), "75.00", "completed"),
        create_record("TXN004", None, days_ago(4), "20.00", "pending"),
        create_record("TXN005", Some("CUST005"), days_ago(5), "-10", "completed"),
    ]);

    let mut pipeline = TransactionPipeline::default();
    let outcome = pipeline.transform_at(batch, evaluation_time())?;

    let ids: Vec<&str> = outcome.records.iter().map(|record| record.transaction_id.as_str()).collect();

    assert_eq!(ids, vec!["TXN001", "TXN002"]);
    assert_eq!(outcome.records[1].customer_id, "CUST002");
    assert_eq!(outcome.report.initial_records, 5);
    assert_eq!(outcome.report.final_records, 2);
    assert_eq!(outcome.report.removed_count, 3);
    assert_eq!(outcome.report.removal_percentage, 60.0);
    assert_eq!(outcome.report.removed_for(DropReason::DuplicateTransactionId), 1);
    assert_eq!(outcome.report.removed_for(DropReason::MissingField("customer_id")), 1);
    assert_eq!(outcome.report.removed_for(DropReason::BusinessRule(BusinessRule::PositiveAmount)), 1);

    Ok(())
}

#[test]
fn test_risk_contributions_accumulate_past_critical_boundary() -> Result<()> {
    let sunday_night = Utc.with_ymd_and_hms(2025, 6, 15, 2, 0, 0).unwrap();
    let batch = RecordBatch::new("transactions", vec![
        create_record("TXN001", Some("CUST001"), sunday_night, "12000", "failed"),
    ]);

    let outcome = TransactionPipeline::default().transform_at(batch, evaluation_time())?;
    let record = outcome.records.first().ok_or_else(|| anyhow!("record missing from output"))?;

    assert_eq!(record.transaction_dayofweek, 6);
    assert_eq!(record.transaction_hour, 2);
    assert_eq!(record.risk_score, 150.0);
    assert_eq!(record.risk_level, RiskLevel::Critical);
    assert_eq!(record.amount_category, AmountCategory::Exceptional);

    Ok(())
}

#[test]
fn test_derived_calendar_fields_and_processing_timestamp() -> Result<()> {
    let date = Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap();
    let batch = RecordBatch::new("transactions", vec![
        create_record("TXN001", Some("CUST001"), date, "250.0", "completed"),
        create_record("TXN002", Some("CUST002"), date, "20.0", "pending"),
    ]);

    let outcome = TransactionPipeline::default().transform_at(batch, evaluation_time())?;
    let record = &outcome.records[0];

    assert_eq!((record.transaction_year, record.transaction_month, record.transaction_day), (2025, 1, 15));
    assert_eq!(record.transaction_dayofweek, 2);
    assert_eq!(record.transaction_hour, 14);
    assert_eq!(record.amount_category, AmountCategory::Large);
    assert_eq!(record.risk_score, 0.0);
    assert_eq!(record.risk_level, RiskLevel::Low);
    assert!(outcome.records.iter().all(|record| record.processed_at == evaluation_time()));

    Ok(())
}

#[test]
fn test_amount_buckets_are_closed_on_the_right() -> Result<()> {
    let test_cases = vec![
        ("0.01", Some(AmountCategory::Small)),
        ("50.00", Some(AmountCategory::Small)),
        ("50.01", Some(AmountCategory::Medium)),
        ("200", Some(AmountCategory::Medium)),
        ("200.01", Some(AmountCategory::Large)),
        ("500", Some(AmountCategory::Large)),
        ("500.01", Some(AmountCategory::VeryLarge)),
        ("1000", Some(AmountCategory::VeryLarge)),
        ("1000.01", Some(AmountCategory::Exceptional)),
        ("1000000", Some(AmountCategory::Exceptional)),
        ("0", None),
        ("-5", None),
    ];

    for (amount, expected) in test_cases {
        assert_eq!(amount_category(decimal(amount)?), expected, "amount: {amount}");
    }

    Ok(())
}

#[test]
fn test_risk_levels_use_open_ended_top_bucket() {
    let test_cases = vec![
        (0.0, RiskLevel::Low),
        (20.0, RiskLevel::Low),
        (30.0, RiskLevel::Medium),
        (50.0, RiskLevel::Medium),
        (60.0, RiskLevel::High),
        (80.0, RiskLevel::High),
        (90.0, RiskLevel::Critical),
        (100.0, RiskLevel::Critical),
        (170.0, RiskLevel::Critical),
    ];

    for (score, expected) in test_cases {
        assert_eq!(risk_level(score), expected, "score: {score}");
    }
}

#[test]
fn test_risk_score_contributions_are_independent() -> Result<()> {
    assert_eq!(risk_score(decimal("5000")?, Some(Status::Completed), 0, 12), 0.0);
    assert_eq!(risk_score(decimal("5000.01")?, Some(Status::Completed), 0, 12), 30.0);
    assert_eq!(risk_score(decimal("10000.01")?, Some(Status::Completed), 0, 12), 70.0);
    assert_eq!(risk_score(decimal("10")?, Some(Status::Failed), 0, 12), 50.0);
    assert_eq!(risk_score(decimal("10")?, Some(Status::Pending), 5, 12), 10.0);
    assert_eq!(risk_score(decimal("10")?, Some(Status::Pending), 4, 5), 20.0);
    assert_eq!(risk_score(decimal("10")?, Some(Status::Pending), 4, 6), 0.0);

    Ok(())
}

#[test]
fn test_deduplicate_is_idempotent_and_keeps_first_occurrence() {
    let config = PipelineConfig::default();
    let context = RunContext::new(&config, evaluation_time());
    let records = vec![
        create_record("TXN001", Some("CUST001"), days_ago(1), "10", "completed"),
        create_record(" txn001 ", Some("CUST002"), days_ago(1), "20", "completed"),
        create_record("TXN002", Some("CUST003"), days_ago(1), "30", "completed"),
        create_record("TXN002", Some("CUST004"), days_ago(1), "40", "completed"),
    ];

    let once = Stage::Deduplicate.apply(records, &context);
    let customers: Vec<_> = once.records.iter().map(|record| record.customer_id.clone()).collect();

    assert_eq!(customers, vec![Some("CUST001".to_string()), Some("CUST003".to_string())]);
    assert_eq!(once.removals[0].count, 2);

    let twice = Stage::Deduplicate.apply(once.records.clone(), &context);

    assert_eq!(twice.records, once.records);
    assert!(twice.removals.is_empty());
}

#[test]
fn test_missing_values_drop_critical_fields_and_fill_sentinels() {
    let config = PipelineConfig::default();
    let context = RunContext::new(&config, evaluation_time());

    let mut missing_amount = create_record("TXN002", Some("CUST002"), days_ago(1), "", "completed");
    missing_amount.amount = None;

    let mut sparse = create_record("TXN003", Some("CUST003"), days_ago(1), "10", "completed");
    sparse.merchant_id = None;
    sparse.category = Some("  ".to_string());
    sparse.payment_method = None;

    let records = vec![
        create_record("  ", Some("CUST001"), days_ago(1), "10", "completed"),
        missing_amount,
        sparse,
        create_record("TXN004", Some(""), days_ago(1), "", "completed"),
    ];

    let outcome = Stage::HandleMissing.apply(records, &context);

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].merchant_id.as_deref(), Some("UNKNOWN"));
    assert_eq!(outcome.records[0].category.as_deref(), Some("unknown"));
    assert_eq!(outcome.records[0].payment_method.as_deref(), Some("unknown"));

    let reasons: Vec<_> = outcome.removals.iter().map(|removal| (removal.reason, removal.count)).collect();

    assert_eq!(reasons, vec![
        (DropReason::MissingField("transaction_id"), 1),
        (DropReason::MissingField("customer_id"), 1),
        (DropReason::MissingField("amount"), 1),
    ]);
}

#[test]
fn test_coercion_drops_unparseable_values_and_normalizes_strings() -> Result<()> {
    let config = PipelineConfig::default();
    let context = RunContext::new(&config, evaluation_time());

    let mut messy = create_record(" txn001 ", Some(" cust001"), days_ago(1), " 42.50 ", " Completed ");
    messy.merchant_id = Some("merch009 ".to_string());
    messy.category = Some(" Groceries".to_string());
    messy.payment_method = Some("CREDIT_CARD".to_string());

    let mut bad_date = create_record("TXN002", Some("CUST002"), days_ago(1), "10", "completed");
    bad_date.transaction_date = Some(Coercible::raw("not-a-date"));

    let mut no_date = create_record("TXN003", Some("CUST003"), days_ago(1), "10", "completed");
    no_date.transaction_date = None;

    let records = vec![
        messy,
        bad_date,
        no_date,
        create_record("TXN004", Some("CUST004"), days_ago(1), "ten", "completed"),
    ];

    let outcome = Stage::CoerceTypes.apply(records, &context);

    assert_eq!(outcome.records.len(), 1);

    let record = &outcome.records[0];

    assert_eq!(record.transaction_id.as_deref(), Some("TXN001"));
    assert_eq!(record.customer_id.as_deref(), Some("CUST001"));
    assert_eq!(record.merchant_id.as_deref(), Some("MERCH009"));
    assert_eq!(record.category.as_deref(), Some("groceries"));
    assert_eq!(record.status.as_deref(), Some("completed"));
    assert_eq!(record.payment_method.as_deref(), Some("credit_card"));
    assert_eq!(record.amount_value(), Some(&decimal("42.50")?));
    assert!(record.date().is_some());

    let reasons: Vec<_> = outcome.removals.iter().map(|removal| (removal.reason, removal.count)).collect();

    assert_eq!(reasons, vec![
        (DropReason::InvalidValue("transaction_date"), 2),
        (DropReason::InvalidValue("amount"), 1),
    ]);

    Ok(())
}

#[test]
fn test_typed_values_skip_coercion() -> Result<()> {
    let mut record = create_record("TXN001", Some("CUST001"), days_ago(1), "0", "completed");
    record.transaction_date = Some(days_ago(3).into());
    record.amount = Some(decimal("99.99")?.into());

    let outcome = TransactionPipeline::default()
        .transform_at(RecordBatch::new("typed", vec![record]), evaluation_time())?;

    assert_eq!(outcome.records[0].transaction_date, days_ago(3));
    assert_eq!(outcome.records[0].amount, decimal("99.99")?);
    assert_eq!(outcome.records[0].amount_category, AmountCategory::Medium);

    Ok(())
}

#[test]
fn test_business_rules_count_removals_sequentially() -> Result<()> {
    let batch = RecordBatch::new("transactions", vec![
        create_record("TXN001", Some("CUST001"), days_ago(1), "10", "completed"),
        create_record("TXN002", Some("CUST002"), days_ago(1), "0", "bogus"),
        create_record("TXN003", Some("CUST003"), days_ago(1), "1000000.01", "pending"),
        create_record("TXN004", Some("CUST004"), days_ago(1), "1000000", "pending"),
        create_record("TXN005", Some("CUST005"), days_ago(1), "10", "refunded"),
        create_record("TXN006", Some("CUST006"), days_ago(-1), "10", "completed"),
        create_record("TXN007", Some("CUST007"), days_ago(731), "10", "completed"),
        create_record("TXN008", Some("CUST008"), days_ago(730), "10", "completed"),
        create_record("TXN009", Some("CUST009"), evaluation_time(), "10", "completed"),
    ]);

    let outcome = TransactionPipeline::default().transform_at(batch, evaluation_time())?;
    let ids: Vec<&str> = outcome.records.iter().map(|record| record.transaction_id.as_str()).collect();

    assert_eq!(ids, vec!["TXN001", "TXN004", "TXN008", "TXN009"]);

    let rule_counts: Vec<_> = outcome.report.removals.iter().map(|removal| (removal.reason, removal.count)).collect();

    assert_eq!(rule_counts, vec![
        (DropReason::BusinessRule(BusinessRule::PositiveAmount), 1),
        (DropReason::BusinessRule(BusinessRule::MaxAmount), 1),
        (DropReason::BusinessRule(BusinessRule::ValidStatus), 1),
        (DropReason::BusinessRule(BusinessRule::NotFuture), 1),
        (DropReason::BusinessRule(BusinessRule::MaxAge), 1),
    ]);

    Ok(())
}

#[test]
fn test_configured_limits_replace_default_rules() -> Result<()> {
    let config = PipelineConfig {
        max_amount: Decimal::from(100),
        max_age_days: 7,
        ..PipelineConfig::default()
    };

    let batch = RecordBatch::new("transactions", vec![
        create_record("TXN001", Some("CUST001"), days_ago(1), "100", "completed"),
        create_record("TXN002", Some("CUST002"), days_ago(1), "100.01", "completed"),
        create_record("TXN003", Some("CUST003"), days_ago(8), "10", "completed"),
    ]);

    let outcome = TransactionPipeline::new(config).transform_at(batch, evaluation_time())?;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].transaction_id, "TXN001");

    Ok(())
}

#[test]
fn test_stage_sequence_applies_every_rule_in_order() {
    let rules: Vec<BusinessRule> = Stage::SEQUENCE.iter()
        .filter_map(|stage| match stage {
            Stage::BusinessRule(rule) => Some(*rule),
            _ => None
        })
        .collect();

    assert_eq!(rules, BusinessRule::ALL);
    assert_eq!(Stage::SEQUENCE.first(), Some(&Stage::Deduplicate));
    assert_eq!(Stage::SEQUENCE.last(), Some(&Stage::DeriveFields));
    assert_eq!(Stage::BusinessRule(BusinessRule::MaxAge).to_string(), "business_rules:max_age");
}

#[test]
fn test_missing_input_columns_are_fatal() {
    let batch = RecordBatch::with_columns(
        "transactions",
        vec!["transaction_id".to_string(), "customer_id".to_string(), "amount".to_string()],
        vec![Record::default()]
    );

    let mut pipeline = TransactionPipeline::default();
    let result = pipeline.transform_at(batch, evaluation_time());

    assert!(matches!(result, Err(PipelineError::MissingColumns { ref columns, .. }) if columns.len() == 5));
    assert!(pipeline.quality_report().is_empty());
}

#[test]
fn test_final_validation_rejects_whole_batch_on_null_required_fields() -> Result<()> {
    let config = PipelineConfig::default();
    let context = RunContext::new(&config, evaluation_time());
    let records = vec![
        create_record("TXN001", Some("CUST001"), days_ago(1), "10", "completed"),
        create_record("TXN002", Some("CUST002"), days_ago(1), "10", "completed"),
    ];

    let coerced = Stage::CoerceTypes.apply(records, &context);
    let mut derived = Stage::DeriveFields.apply(coerced.records, &context).records;
    derived[1].enrichment = None;

    let result = final_validation("transactions", derived);

    match result {
        Err(PipelineError::FinalValidation { null_counts, .. }) => {
            assert_eq!(null_counts.get("risk_score"), Some(&1));
            assert_eq!(null_counts.get("risk_level"), Some(&1));
            assert_eq!(null_counts.len(), 2);
        }
        other => return Err(anyhow!("expected final validation failure, got {other:?}"))
    }

    Ok(())
}

#[test]
fn test_empty_batch_yields_empty_output_and_zero_removal() -> Result<()> {
    let outcome = TransactionPipeline::default()
        .transform_at(RecordBatch::new("empty", Vec::new()), evaluation_time())?;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.report.removed_count, 0);
    assert_eq!(outcome.report.removal_percentage, 0.0);

    Ok(())
}

#[test]
fn test_quality_report_accumulates_per_dataset_and_overwrites_repeats() -> Result<()> {
    let mut pipeline = TransactionPipeline::default();

    pipeline.transform_at(RecordBatch::new("january", vec![
        create_record("TXN001", Some("CUST001"), days_ago(1), "10", "completed"),
    ]), evaluation_time())?;

    pipeline.transform_at(RecordBatch::new("february", vec![
        create_record("TXN002", Some("CUST002"), days_ago(1), "10", "completed"),
        create_record("TXN002", Some("CUST002"), days_ago(1), "10", "completed"),
    ]), evaluation_time())?;

    pipeline.transform_at(RecordBatch::new("january", vec![
        create_record("TXN003", Some("CUST003"), days_ago(1), "10", "completed"),
        create_record("TXN004", Some("CUST004"), days_ago(1), "-1", "completed"),
    ]), evaluation_time())?;

    let report = pipeline.quality_report();

    assert_eq!(report.len(), 2);

    let january = report.get("january").ok_or_else(|| anyhow!("january report missing"))?;

    assert_eq!(january.initial_records, 2);
    assert_eq!(january.final_records, 1);

    let february = report.get("february").ok_or_else(|| anyhow!("february report missing"))?;

    assert_eq!(february.removed_count, 1);
    assert_eq!(february.removal_percentage, 50.0);
    assert!(february.null_counts.values().all(|count| *count == 0));
    assert_eq!(february.null_counts.len(), 17);

    let json = serde_json::to_value(report)?;

    assert_eq!(json["february"]["removals"][0]["reason"]["kind"], "duplicate_transaction_id");
    assert_eq!(json["january"]["removals"][0]["reason"]["detail"], "positive_amount");

    Ok(())
}

#[test]
fn test_validate_against_customers_drops_unknown_customers() -> Result<()> {
    let records: Vec<Record> = (0..10)
        .map(|index| create_record(&format!("TXN{index:03}"), Some(&format!("CUST{index:03}")), days_ago(1), "10", "completed"))
        .collect();

    let mut pipeline = TransactionPipeline::default();
    let outcome = pipeline.transform_at(RecordBatch::new("transactions", records), evaluation_time())?;

    let customers: CustomerSet = (0..7).map(|index| format!(" cust{index:03} ")).collect();
    let validated = pipeline.validate_against_customers(outcome.records, &customers);

    assert_eq!(validated.len(), 7);
    assert!(validated.iter().all(|record| customers.contains(&record.customer_id)));

    Ok(())
}

fn random_record<R: Rng>(rng: &mut R, index: usize) -> Record {
    let transaction_id = match rng.gen_range(0..20) {
        0 => None,
        1 => Some(format!(" txn{:04} ", rng.gen_range(0..index.max(1)))),
        _ => Some(format!("TXN{index:04}"))
    };

    let amount = match rng.gen_range(0..20) {
        0 => None,
        1 => Some(Coercible::raw("abc")),
        2 => Some(Coercible::raw(format!("-{}", rng.gen_range(1..500)))),
        3 => Some(Coercible::raw("2000000")),
        _ => Some(Coercible::raw(format!("{}.{:02}", rng.gen_range(0..20_000), rng.gen_range(0..100))))
    };

    let date = match rng.gen_range(0..20) {
        0 => None,
        1 => Some(Coercible::raw("garbage")),
        _ => {
            let offset = TimeDelta::minutes(rng.gen_range(-10_000..1_100_000));
            Some(Coercible::raw((evaluation_time() - offset).to_rfc3339()))
        }
    };

    let statuses = ["completed", "PENDING", " failed", "unknown", ""];

    Record {
        transaction_id,
        customer_id: (rng.gen_range(0..15) > 0).then(|| format!("cust{:03}", rng.gen_range(0..50))),
        transaction_date: date,
        amount,
        merchant_id: (rng.gen_range(0..5) > 0).then(|| "merch001".to_string()),
        category: (rng.gen_range(0..5) > 0).then(|| "Retail".to_string()),
        status: Some(statuses[rng.gen_range(0..statuses.len())].to_string()),
        payment_method: (rng.gen_range(0..5) > 0).then(|| "cash".to_string()),
        enrichment: None
    }
}

#[test]
fn test_random_batches_uphold_output_invariants() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let config = PipelineConfig::default();
    let context = RunContext::new(&config, evaluation_time());

    for round in 0..20 {
        let size = rng.gen_range(0..300);
        let records: Vec<Record> = (0..size).map(|index| random_record(&mut rng, index)).collect();

        let mut staged = records.clone();

        for stage in Stage::SEQUENCE {
            let before = staged.len();
            staged = stage.apply(staged, &context).records;
            assert!(staged.len() <= before, "stage {stage} grew the batch");
        }

        let mut pipeline = TransactionPipeline::default();
        let outcome = pipeline.transform_at(RecordBatch::new(format!("round-{round}"), records), evaluation_time())?;
        let report = &outcome.report;

        let ids: HashSet<&str> = outcome.records.iter().map(|record| record.transaction_id.as_str()).collect();

        assert_eq!(ids.len(), outcome.records.len());
        assert_eq!(outcome.records.len(), staged.len());
        assert_eq!(report.initial_records - report.final_records, report.removed_count);
        assert_eq!(report.removals.iter().map(|removal| removal.count).sum::<usize>(), report.removed_count);

        if report.initial_records > 0 {
            let expected = report.removed_count as f64 / report.initial_records as f64 * 100.0;
            assert!((report.removal_percentage - expected).abs() < 1e-9);
        }

        for record in &outcome.records {
            assert!(record.amount > Decimal::ZERO && record.amount <= Decimal::from(1_000_000));
            assert!(record.risk_score >= 0.0);
            assert!(record.transaction_date <= evaluation_time());
            assert!(record.transaction_date >= days_ago(730));
            assert!(matches!(record.status, Status::Completed | Status::Pending | Status::Failed));
            assert_eq!(record.risk_level, risk_level(record.risk_score));
            assert_eq!(Some(record.amount_category), amount_category(record.amount));
        }
    }

    Ok(())
}

#[test]
fn test_clean_records_serialize_in_output_schema_order() -> Result<()> {
    let outcome = TransactionPipeline::default().transform_at(RecordBatch::new("transactions", vec![
        create_record("TXN001", Some("CUST001"), days_ago(1), "10", "completed"),
    ]), evaluation_time())?;

    let mut buffer = Vec::new();

    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.serialize::<&CleanTransaction>(&outcome.records[0])?;
        writer.flush()?;
    }

    let output = String::from_utf8(buffer)?;
    let header = output.lines().next().ok_or_else(|| anyhow!("header missing"))?;

    assert_eq!(header, crate::models::CLEAN_COLUMNS.join(","));

    Ok(())
}
