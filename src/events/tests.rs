//! Events Module Tests
//!
//! ## Test Scopes
//! - **Topics**: event-to-topic mapping.
//! - **Recording doubles**: capture order and payload fidelity.

#[cfg(test)]
mod tests {
    use crate::events::{
        BootstrapEvent, EventBus, RecordingBus, RecordingResolutionSink, Resolution,
        ResolutionSink,
    };
    use crate::queue::backoff::FailureReason;

    // ============================================================
    // TEST 1: Topic mapping
    // ============================================================

    #[test]
    fn test_event_topics() {
        let progress = BootstrapEvent::Progress {
            dedup_key: "bootstrap:wallet:ethereum:0xabc".to_string(),
            progress: 50,
            step: "compute_flows".to_string(),
            eta_seconds: 40,
        };
        assert_eq!(progress.topic(), "bootstrap.progress");

        let failed = BootstrapEvent::Failed {
            dedup_key: "bootstrap:wallet:ethereum:0xabc".to_string(),
            error: "boom".to_string(),
            failure_reason: FailureReason::Unknown,
        };
        assert_eq!(failed.topic(), "bootstrap.failed");
    }

    // ============================================================
    // TEST 2: Recording doubles
    // ============================================================

    #[test]
    fn test_recording_bus_captures_events_in_order() {
        let bus = RecordingBus::new();
        bus.emit(BootstrapEvent::Done {
            dedup_key: "a".to_string(),
        });
        bus.emit(BootstrapEvent::Done {
            dedup_key: "b".to_string(),
        });

        assert_eq!(bus.topics(), vec!["bootstrap.done", "bootstrap.done"]);
        let events = bus.events();
        assert_eq!(
            events[0],
            BootstrapEvent::Done {
                dedup_key: "a".to_string()
            }
        );
    }

    #[test]
    fn test_recording_resolution_sink() {
        let sink = RecordingResolutionSink::new();
        sink.resolve("bootstrap:token:base:0xdef", Resolution::Failed);

        assert_eq!(
            sink.resolutions(),
            vec![("bootstrap:token:base:0xdef".to_string(), Resolution::Failed)]
        );
    }
}
