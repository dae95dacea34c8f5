use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use super::employee_code_filter::normalize;

/// true => employee code is TAKEN; only taken codes are stored
pub static EMPLOYEE_CODE_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(code: &str) {
    EMPLOYEE_CODE_CACHE.insert(normalize(code), true).await;
}

pub async fn forget(code: &str) {
    EMPLOYEE_CODE_CACHE.invalidate(&normalize(code)).await;
}

pub async fn is_taken(code: &str) -> bool {
    EMPLOYEE_CODE_CACHE
        .get(&normalize(code))
        .await
        .unwrap_or(false)
}

async fn batch_mark(codes: &[String]) {
    let futures: Vec<_> = codes
        .iter()
        .map(|c| EMPLOYEE_CODE_CACHE.insert(normalize(c), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load codes of employees created in the last `days` days (batched).
pub async fn warmup_employee_code_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT employee_id
        FROM employees
        WHERE created_at >= NOW() - INTERVAL ? DAY
        ORDER BY created_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row?;
        batch.push(code);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Employee code cache warmup complete: {} recent employees (last {} days)",
        total_count,
        days
    );

    Ok(())
}
