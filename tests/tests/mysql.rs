mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use querypilot::mysql::MySqlConnector;
    use querypilot::prelude::*;
    use querypilot::UNKNOWN_LABEL;
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn connector() -> MySqlConnector {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or(default.to_string());
        let password = std::env::var("QUERYPILOT_PASSWORD").ok();
        MySqlConnector::from_parts(
            &var("QUERYPILOT_HOST", "127.0.0.1"),
            var("QUERYPILOT_PORT", "3306").parse().unwrap(),
            &var("QUERYPILOT_USER", "root"),
            password.as_deref(),
            &var("QUERYPILOT_DATABASE", "employees"),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn employees_workload() -> anyhow::Result<()> {
        init();

        let pool = ConnectionPool::connect(
            connector(),
            NonZeroUsize::new(8).unwrap(),
            Duration::from_secs(5),
        )
        .await?;
        let pool = Arc::new(pool);

        let report = Workload::new(pool.clone(), RunConfig::new(500, 8)?)
            .query_timeout(Duration::from_secs(30))
            .await?;

        assert_eq!(report.total_requests, 500);
        assert_eq!(report.failure_count, 0, "{:?}", report.error_histogram);
        let registry = Registry::employees();
        assert!(report
            .label_histogram
            .iter()
            .all(|e| e.key != UNKNOWN_LABEL && registry.contains(&e.key)));
        assert!(pool.stats().high_water <= 8);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn live_convention() -> anyhow::Result<()> {
        init();

        let pool = ConnectionPool::connect(
            connector(),
            NonZeroUsize::new(4).unwrap(),
            Duration::from_secs(5),
        )
        .await?;

        let report = Workload::new(Arc::new(pool), RunConfig::new(100, 4)?)
            .active(ActiveRecord::Current)
            .seed(5)
            .await?;

        assert_eq!(report.success_count, 100, "{:?}", report.error_histogram);
        Ok(())
    }
}
