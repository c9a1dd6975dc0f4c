use crate::attendance::store;
use crate::model::employee::EmployeeProfile;
use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// finger_id => employee profile with department policy.
/// Device punches arrive in bursts; the TTL keeps policy edits from going
/// stale for more than a few minutes.
pub static PROFILE_CACHE: Lazy<Cache<i64, EmployeeProfile>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(50_000) // tune based on headcount
        .time_to_live(Duration::from_secs(300)) // 5 min TTL
        .build()
});

/// Cache-through identity lookup. Unknown finger ids are not cached, so a
/// badge activated mid-shift resolves on its next punch.
pub async fn resolve(
    pool: &MySqlPool,
    finger_id: i64,
) -> Result<Option<EmployeeProfile>, sqlx::Error> {
    if let Some(profile) = PROFILE_CACHE.get(&finger_id).await {
        return Ok(Some(profile));
    }

    let profile = store::find_profile_by_finger_id(pool, finger_id).await?;
    if let Some(profile) = &profile {
        PROFILE_CACHE.insert(finger_id, profile.clone()).await;
    }
    Ok(profile)
}

/// Batch insert profiles
async fn batch_store(profiles: &[EmployeeProfile]) {
    let futures: Vec<_> = profiles
        .iter()
        .map(|p| PROFILE_CACHE.insert(p.finger_id, p.clone()))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load every active punch-tracked employee into the cache (batched)
pub async fn warmup_profile_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, EmployeeProfile>(
        r#"
        SELECT e.id, e.name, e.email, e.finger_id,
               d.working_time_start, d.working_time_end, d.weekly_working_days
        FROM employees e
        JOIN departments d ON d.id = e.department_id
        WHERE e.verified = TRUE AND e.status = 'ACTIVATE' AND e.finger_id IS NOT NULL
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let profile = row?;
        batch.push(profile);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_store(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining profiles
    if !batch.is_empty() {
        batch_store(&batch).await;
    }

    tracing::info!(total_count, "Profile cache warmup complete");

    Ok(())
}
