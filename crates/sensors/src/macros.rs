//! Sensor wrapper macros
//!
//! Collision, lane invasion and GNSS wrappers share the same lifecycle:
//! spawn one source, register one weak handler, destroy the source on drop.

/// Define a wrapper owning one sensor source and its observation state
///
/// The state type must provide `fn new(ctx: &SensorContext) -> Self` and the
/// named `fn(&self, SensorPacket)` handler.
///
/// # Usage
/// ```ignore
/// define_sensor_wrapper!(
///     GnssSensor,            // Wrapper name
///     GnssState,             // Observation state
///     "sensor.other.gnss",   // Blueprint
///     on_packet              // Handler method on the state
/// );
/// ```
macro_rules! define_sensor_wrapper {
    (
        $wrapper:ident,
        $state:ident,
        $blueprint:expr,
        $on_packet:ident
    ) => {
        pub struct $wrapper {
            state: ::std::sync::Arc<$state>,
            source: Box<dyn ::contracts::SensorSource>,
        }

        impl $wrapper {
            pub const BLUEPRINT: &'static str = $blueprint;

            /// Spawn the sensor on `parent` and start listening
            pub fn spawn<S>(
                spawner: &S,
                parent: ::contracts::ActorId,
                ctx: &$crate::handler::SensorContext,
            ) -> $crate::error::Result<Self>
            where
                S: ::contracts::SensorSpawner + ?Sized,
            {
                let state = ::std::sync::Arc::new($state::new(ctx));
                let spec = ::contracts::SensorSpec::new(Self::BLUEPRINT);
                let source = spawner.spawn_sensor(&spec, parent)?;
                source.listen($crate::handler::weak_handler(
                    &state,
                    source.sensor_type(),
                    ctx.metrics.clone(),
                    $state::$on_packet,
                ));
                ::tracing::debug!(
                    sensor_id = %source.sensor_id(),
                    parent,
                    "sensor attached"
                );
                Ok(Self { state, source })
            }

            pub fn sensor_id(&self) -> &str {
                self.source.sensor_id()
            }

            pub fn is_listening(&self) -> bool {
                self.source.is_listening()
            }

            /// Release the sensor; no event reaches the state afterwards
            pub fn destroy(self) {}
        }

        impl Drop for $wrapper {
            fn drop(&mut self) {
                self.source.destroy();
                ::tracing::debug!(sensor_id = %self.source.sensor_id(), "sensor destroyed");
            }
        }
    };
}

pub(crate) use define_sensor_wrapper;
