//! Walks through two admin sessions against an in-memory store.
//!
//! Run with `RUST_LOG=hrstore=debug cargo run --example admin_session` to see
//! cache hits, misses, and scope changes.

use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use hrstore::{AdminIdentity, CacheConfig, HrStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hrstore=debug")),
        )
        .init();

    let hr = HrStore::new(Arc::new(MemoryStore::new()), &CacheConfig::from_env()?);

    hr.session().login(AdminIdentity::new("Asha", "9000000001", "admin"))?;
    let ravi = hr.employees().create(&json!({ "name": "Ravi", "department": "Ops" })).await?;
    hr.employments()
        .create(&json!({ "employeeId": ravi.id, "designation": "Associate", "ctc": 600000.0 }))
        .await?;

    let listed = hr.employees().list().await?;
    let again = hr.employees().list().await?;
    println!("listed {} employee(s), second read from cache: {}", listed.len(), listed == again);

    hr.employees()
        .update(&ravi.id, &json!({ "department": "Finance" }))
        .await?;
    let updated = hr.employees().get(&ravi.id).await?;
    println!("after update: {:?}", updated.department);

    hr.session().login(AdminIdentity::new("Meera", "9000000002", "admin"))?;
    let jobs = hr.employments_for_employee(&ravi.id).await?;
    println!("{} employment(s) for {}", jobs.len(), ravi.name);

    hr.session().logout();
    println!("cache stats: {:?}", hr.cache_stats());
    Ok(())
}
