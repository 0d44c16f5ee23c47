//! §2a ambient logging: register/reap emit structured `tracing` events
//! carrying the key and owner, captured the way this codebase captures
//! tracing output in tests — a custom `MakeWriter` backed by a shared
//! buffer, rather than `tracing-test`'s stdout-passthrough writer, so the
//! content can actually be asserted on.

use std::sync::{Arc, Mutex};

use process_registry::{DeathReason, LocalSupervisor, RegistryHandle};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct CapturingWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturingWriter {
    type Writer = CapturingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn registration_and_reap_emit_structured_events() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(CapturingWriter(buffer.clone()))
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let supervisor = LocalSupervisor::new();
    let registry: RegistryHandle<String> = RegistryHandle::spawn(supervisor.clone());
    let alice = supervisor.alloc_pid();

    registry.add_name(alice, "logged-key".to_string()).await.unwrap();
    supervisor.kill(alice, DeathReason::Normal);

    for _ in 0..100 {
        if registry
            .lookup_name("logged-key".to_string())
            .await
            .unwrap()
            .is_none()
        {
            break;
        }
        tokio::task::yield_now().await;
    }

    let log = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(log.contains("logged-key"), "log did not mention the key:\n{log}");
    assert!(
        log.contains("registered") && log.contains("reaped"),
        "log missing expected events:\n{log}"
    );
}
