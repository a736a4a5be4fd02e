/*!
 * Monitoring
 * Structured tracing for wait/notify primitives
 */

mod tracer;

pub use tracer::{init_tracing, WaitSpan, SLOW_WAIT_THRESHOLD};
