use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMPLOYEE_CODE_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
pub fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Whether an employee code might already be in use (false positives possible).
pub fn might_exist(code: &str) -> bool {
    let code = normalize(code);
    EMPLOYEE_CODE_FILTER
        .read()
        .map(|filter| filter.contains(&code))
        // a poisoned filter can't rule anything out
        .unwrap_or(true)
}

pub fn insert(code: &str) {
    let code = normalize(code);
    if let Ok(mut filter) = EMPLOYEE_CODE_FILTER.write() {
        filter.add(&code);
    }
}

pub fn remove(code: &str) {
    let code = normalize(code);
    if let Ok(mut filter) = EMPLOYEE_CODE_FILTER.write() {
        filter.remove(&code);
    }
}

/// Load every employee code into the filter, streaming in batches.
pub async fn warmup_employee_code_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT employee_id FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Employee code filter warmup complete: {} employees", total);
    Ok(())
}

fn insert_batch(codes: &[String]) {
    if let Ok(mut filter) = EMPLOYEE_CODE_FILTER.write() {
        for code in codes {
            filter.add(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_codes_are_found_case_insensitively() {
        insert("FILTER-Test-01");

        assert!(might_exist("filter-test-01"));
        assert!(might_exist("  FILTER-TEST-01 "));
    }

    #[test]
    fn removed_codes_are_gone() {
        insert("FILTER-Test-02");
        remove("filter-test-02");

        assert!(!might_exist("FILTER-Test-02"));
    }
}
