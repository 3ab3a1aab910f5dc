mod common;

use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use xforms_actions::{BindingStack, ContextStack, HandlerRegistry};

use common::{ScriptedEvaluator, TestContainer, TestHost, Value, action, record, root_frame, run};

#[derive(Clone, Default)]
struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter { buffer: Arc::clone(&self.buffer) }
    }
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer =
            self.buffer.lock().map_err(|_| io::Error::other("log buffer mutex poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `body` with debug logs of this crate captured.
fn capture(body: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("xforms_actions=debug"))
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, body);
    logs.contents()
}

#[test]
fn false_condition_is_logged_with_its_expression() {
    let evaluator = ScriptedEvaluator::new().condition("false()", false);
    let container = TestContainer::default();
    let mut registry = HandlerRegistry::<TestHost>::new();
    record(&mut registry, "setvalue");
    let mut stack = BindingStack::<TestHost>::new(&evaluator, root_frame());
    let node = action("setvalue", "sv").with_if("false()").build();

    let logs = capture(|| run(&evaluator, &container, &registry, &mut stack, &node).unwrap());

    assert!(logs.contains("not executing"), "{logs}");
    assert!(logs.contains("condition_type=if"), "{logs}");
    assert!(logs.contains("condition evaluated to 'false'"), "{logs}");
    assert!(logs.contains("condition=\"false()\""), "{logs}");
    assert!(!logs.contains(": done"), "{logs}");
}

#[test]
fn missing_context_is_logged_as_such() {
    let evaluator = ScriptedEvaluator::new().constant("nothing", Vec::new());
    let container = TestContainer::default();
    let mut registry = HandlerRegistry::<TestHost>::new();
    record(&mut registry, "setvalue");
    let mut stack = BindingStack::<TestHost>::new(&evaluator, root_frame());
    let node = action("setvalue", "sv").with_context("nothing").with_while("true()").build();

    let logs = capture(|| run(&evaluator, &container, &registry, &mut stack, &node).unwrap());

    assert!(logs.contains("condition_type=while"), "{logs}");
    assert!(logs.contains("missing context"), "{logs}");
    assert!(!logs.contains("evaluated to 'false'"), "{logs}");
}

#[test]
fn executions_run_inside_an_action_span() {
    let evaluator = ScriptedEvaluator::new()
        .constant("(1, 2)", vec![Value::Int(1), Value::Int(2)]);
    let container = TestContainer::default();
    let mut registry = HandlerRegistry::<TestHost>::new();
    record(&mut registry, "insert");
    let mut stack = BindingStack::<TestHost>::new(&evaluator, root_frame());
    let node = action("insert", "ins").with_iterate("(1, 2)").build();

    let logs = capture(|| run(&evaluator, &container, &registry, &mut stack, &node).unwrap());

    assert_eq!(logs.matches("action{name=insert}: executing").count(), 2, "{logs}");
    assert_eq!(logs.matches("action{name=insert}: done").count(), 2, "{logs}");
}

#[test]
fn popping_the_root_frame_warns() {
    let evaluator = ScriptedEvaluator::new();
    let mut stack = BindingStack::<TestHost>::new(&evaluator, root_frame());

    let logs = capture(|| stack.pop_binding());

    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("root binding frame"), "{logs}");
    assert_eq!(stack.depth(), 1);
}
