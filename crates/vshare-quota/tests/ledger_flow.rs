//! End-to-end ledger behavior as seen by the quota watcher and allocation pipeline

use std::sync::Arc;
use vshare_core::config::{DEFAULT_CORES_DIMENSION as CORES, DEFAULT_MEMORY_DIMENSION as MEM};
use vshare_core::{PodRef, ResourceQuota};
use vshare_dev::{generate_test_data, resource_quota, setup_test_logging, vendor_pod_devices};
use vshare_quota::{Quota, QuotaManager};

#[test]
fn test_watcher_and_pipeline_flow() {
    setup_test_logging();
    let ledger = QuotaManager::new();

    let quota: ResourceQuota = serde_yaml::from_str(
        r#"
name: gpu-quota
namespace: research
hard:
  requests.nvidia.com/gpumem: 8192
  requests.nvidia.com/gpucores: 100
  requests.cpu: "16"
"#,
    )
    .unwrap();
    assert_eq!(ledger.add_quota(&quota), 2);

    let trainer = PodRef::new("research", "trainer-0");
    let trainer_devices = vendor_pod_devices(&[&[(4096, 50)], &[(2048, 25)]]);
    assert!(ledger.fit_quota("research", 6144, 75));
    ledger.add_usage(&trainer, &trainer_devices);

    assert!(!ledger.fit_quota("research", 4096, 10));
    assert!(ledger.fit_quota("research", 2048, 25));

    ledger.rm_usage(&trainer, &trainer_devices).unwrap();
    assert_eq!(ledger.quota("research", MEM), Some(Quota::new(0, 8192)));
    assert!(ledger.fit_quota("research", 8192, 100));

    assert_eq!(ledger.del_quota(&quota).unwrap(), 2);
    assert_eq!(ledger.quota("research", CORES), Some(Quota::new(0, 0)));
    assert!(ledger.fit_quota("research", i64::MAX, i64::MAX));

    let stats = ledger.stats();
    assert_eq!(stats.usage_added, 1);
    assert_eq!(stats.usage_removed, 1);
    assert_eq!(stats.limits_set, 2);
    assert_eq!(stats.limits_reset, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_usage_on_disjoint_namespaces() {
    let ledger = Arc::new(QuotaManager::new());
    let mut generator = generate_test_data();

    let mut expected = Vec::new();
    let mut handles = Vec::new();
    for n in 0..8 {
        let namespace = format!("tenant-{}", n);
        let allocations: Vec<_> = (0..25).map(|_| generator.random_pod_devices()).collect();
        let total = allocations
            .iter()
            .map(|devices| ledger.count_usage(devices))
            .fold((0i64, 0i64), |(mem, cores), usage| {
                (mem + usage.memory, cores + usage.cores)
            });
        expected.push((namespace.clone(), total));

        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            for (i, devices) in allocations.iter().enumerate() {
                let pod = PodRef::new(namespace.as_str(), format!("pod-{}", i));
                ledger.add_usage(&pod, devices);
                tokio::task::yield_now().await;
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(ledger.namespace_count(), 8);
    for (namespace, (mem, cores)) in expected {
        assert_eq!(ledger.quota(&namespace, MEM).unwrap().used, mem);
        assert_eq!(ledger.quota(&namespace, CORES).unwrap().used, cores);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_usage_on_one_namespace_loses_nothing() {
    let ledger = Arc::new(QuotaManager::new());
    ledger.add_quota(&resource_quota("shared", 1 << 40, 1 << 20));

    let mut handles = Vec::new();
    for worker in 0..16 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            let devices = vendor_pod_devices(&[&[(100, 1)]]);
            for i in 0..200 {
                let pod = PodRef::new("shared", format!("pod-{}-{}", worker, i));
                ledger.add_usage(&pod, &devices);
                if i % 2 == 1 {
                    ledger.rm_usage(&pod, &devices).unwrap();
                }
                ledger.fit_quota("shared", 100, 1);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    // 16 workers keep half of their 200 allocations
    assert_eq!(ledger.quota("shared", MEM), Some(Quota::new(16 * 100 * 100, 1 << 40)));
    assert_eq!(ledger.quota("shared", CORES), Some(Quota::new(16 * 100, 1 << 20)));
    assert_eq!(ledger.stats().admitted, 16 * 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_limit_updates_race_with_admission() {
    let ledger = Arc::new(QuotaManager::new());
    ledger.add_quota(&resource_quota("team-a", 1000, 100));

    let writer = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            for i in 0..500 {
                let (mem, cores) = if i % 2 == 0 { (2000, 200) } else { (1000, 100) };
                ledger.add_quota(&resource_quota("team-a", mem, cores));
                tokio::task::yield_now().await;
            }
        })
    };

    let reader = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            let mut admitted = 0u64;
            for _ in 0..500 {
                // limits of one quota object are always observed together
                let quota = ledger.namespace_quota("team-a").unwrap();
                let mem = quota.get(MEM).unwrap().limit;
                let cores = quota.get(CORES).unwrap().limit;
                assert_eq!(mem / 10, cores);
                if ledger.fit_quota("team-a", 1500, 150) {
                    admitted += 1;
                }
                tokio::task::yield_now().await;
            }
            admitted
        })
    };

    writer.await.unwrap();
    let admitted = reader.await.unwrap();

    // every check was counted exactly once, and only the reader checked
    let stats = ledger.stats();
    assert_eq!(stats.admitted, admitted);
    assert_eq!(stats.admitted + stats.rejected, 500);

    // the writer finished on the tight pair
    assert_eq!(ledger.quota("team-a", MEM), Some(Quota::new(0, 1000)));
    assert_eq!(ledger.quota("team-a", CORES), Some(Quota::new(0, 100)));
    assert!(!ledger.fit_quota("team-a", 1500, 150));
    assert!(ledger.fit_quota("team-a", 1000, 100));
}
