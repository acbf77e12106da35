use super::*;

#[test]
fn trace_macros_compile() {
    // No-ops without the tracing feature.
    let steps = 3usize;
    trace!(steps, "trace message");
    debug!(steps, "debug message");
    info!("info message");
    warn!(limit = 8, "warn message");

    let _span = span!(Level::DEBUG, "test_span", value = 42);
    let _entered = debug_span!("entered_span").entered();
    let _rewrite = info_span!("rewrite", rule = "add_zero").entered();
}

#[test]
fn init_subscriber_is_idempotent() {
    init_subscriber();
    init_subscriber();
}
