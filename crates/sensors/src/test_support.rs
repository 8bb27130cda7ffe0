//! Hand-driven sensor sources for unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    ActorId, ContractError, SensorDataCallback, SensorPacket, SensorSource, SensorSpawner,
    SensorSpec, SensorType,
};
use parking_lot::Mutex;

pub(crate) struct ManualInner {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub spec: SensorSpec,
    listening: AtomicBool,
    destroyed: AtomicBool,
    callback: Mutex<Option<SensorDataCallback>>,
}

impl ManualInner {
    /// Deliver like the simulator would: only while listening
    pub fn emit(&self, packet: SensorPacket) {
        if !self.listening.load(Ordering::SeqCst) {
            return;
        }
        if let Some(cb) = self.callback.lock().clone() {
            cb(packet);
        }
    }

    /// The registered callback, kept even after stop, to simulate a late event
    pub fn callback(&self) -> Option<SensorDataCallback> {
        self.callback.lock().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

struct ManualSource(Arc<ManualInner>);

impl SensorSource for ManualSource {
    fn sensor_id(&self) -> &str {
        &self.0.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        self.0.sensor_type
    }

    fn listen(&self, callback: SensorDataCallback) {
        if self.0.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.0.callback.lock() = Some(callback);
    }

    fn stop(&self) {
        self.0.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.0.listening.load(Ordering::SeqCst)
    }

    fn destroy(&self) {
        self.stop();
        self.0.destroyed.store(true, Ordering::SeqCst);
    }
}

/// Spawner that records every source it hands out
#[derive(Default)]
pub(crate) struct ManualSpawner {
    pub spawned: Mutex<Vec<Arc<ManualInner>>>,
    pub fail: AtomicBool,
}

impl ManualSpawner {
    pub fn last(&self) -> Arc<ManualInner> {
        self.spawned.lock().last().cloned().unwrap()
    }

    pub fn count(&self) -> usize {
        self.spawned.lock().len()
    }
}

impl SensorSpawner for ManualSpawner {
    fn spawn_sensor(
        &self,
        spec: &SensorSpec,
        parent: ActorId,
    ) -> Result<Box<dyn SensorSource>, ContractError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ContractError::spawn(&spec.blueprint, "spawn refused"));
        }
        let sensor_type = spec
            .sensor_type()
            .ok_or_else(|| ContractError::spawn(&spec.blueprint, "unknown sensor"))?;
        let mut spawned = self.spawned.lock();
        let inner = Arc::new(ManualInner {
            sensor_id: format!("{}#{}-{}", spec.blueprint, parent, spawned.len()),
            sensor_type,
            spec: spec.clone(),
            listening: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            callback: Mutex::new(None),
        });
        spawned.push(inner.clone());
        Ok(Box::new(ManualSource(inner)))
    }
}
