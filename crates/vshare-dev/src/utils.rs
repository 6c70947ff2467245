//! Logging setup and random test data for vshare tests

use crate::fixtures::container_device;
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vshare_core::config::DEFAULT_VENDOR_MARKER;
use vshare_core::{ContainerDevice, Device, PodDevices, PodRef, PodSingleDevice};

/// Setup test logging with appropriate levels
pub fn setup_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vshare_quota=debug,vshare_registry=debug,vshare_core=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Create a generator for random ledger test data
pub fn generate_test_data() -> TestDataGenerator {
    TestDataGenerator::new()
}

/// Random but realistic devices, pods and allocations
pub struct TestDataGenerator {
    rng: rand::rngs::ThreadRng,
}

impl TestDataGenerator {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a random tenant namespace
    pub fn random_namespace(&mut self) -> String {
        let teams = ["research", "training", "inference", "analytics", "platform"];
        format!(
            "{}-{:03}",
            teams[self.rng.gen_range(0..teams.len())],
            self.rng.gen_range(0..1000)
        )
    }

    /// Generate a random GPU UUID
    pub fn random_gpu_uuid(&mut self) -> String {
        format!(
            "GPU-{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            self.rng.gen::<u32>(),
            self.rng.gen::<u16>(),
            self.rng.gen::<u16>(),
            self.rng.gen::<u16>(),
            self.rng.gen::<u64>() & 0xFFFF_FFFF_FFFF
        )
    }

    /// Generate a discovered device, sometimes a MIG partition
    pub fn random_device(&mut self) -> Device {
        let mut device = Device::new(self.random_gpu_uuid())
            .with_total_memory([16384, 24576, 40960, 81920][self.rng.gen_range(0..4)]);
        if self.rng.gen_bool(0.3) {
            device = device.with_index(format!(
                "{}:{}",
                self.rng.gen_range(0..8),
                self.rng.gen_range(0..7)
            ));
        }
        device
    }

    /// Generate a pod in the given namespace
    pub fn random_pod(&mut self, namespace: &str) -> PodRef {
        PodRef::new(namespace, format!("worker-{:05}", self.rng.gen_range(0..100_000)))
    }

    /// Generate a vendor device slice with realistic memory and core shares
    pub fn random_container_device(&mut self) -> ContainerDevice {
        let uuid = self.random_gpu_uuid();
        container_device(
            &uuid,
            self.rng.gen_range(1..=32) * 512,
            self.rng.gen_range(0..=10) * 10,
        )
        .with_idx(self.rng.gen_range(0..8))
    }

    /// Generate a vendor allocation with 1-3 containers of 1-2 devices each
    pub fn random_pod_devices(&mut self) -> PodDevices {
        let containers: PodSingleDevice = (0..self.rng.gen_range(1..=3))
            .map(|_| {
                (0..self.rng.gen_range(1..=2))
                    .map(|_| self.random_container_device())
                    .collect()
            })
            .collect();

        let mut pod_devices = PodDevices::new();
        pod_devices.insert(DEFAULT_VENDOR_MARKER.to_string(), containers);
        pod_devices
    }
}

impl Default for TestDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
