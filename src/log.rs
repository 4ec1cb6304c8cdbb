//! Process-wide message and error sinks.
//!
//! The evaluator narrates savepoint control and primitive actions through a
//! message hook, and routes every driver error through an error hook before
//! collapsing it to logical failure. Both hooks default to standard error
//! and can be replaced (or silenced) at runtime.

use std::sync::{LazyLock, RwLock};

use crate::Error;

type MessageHook = Box<dyn Fn(&str) + Send + Sync>;
type ErrorHook = Box<dyn Fn(&Error) + Send + Sync>;

static MESSAGE_HOOK: LazyLock<RwLock<Option<MessageHook>>> =
    LazyLock::new(|| RwLock::new(Some(Box::new(|msg| eprintln!("{msg}")))));

static ERROR_HOOK: LazyLock<RwLock<Option<ErrorHook>>> =
    LazyLock::new(|| RwLock::new(Some(Box::new(|err| eprintln!("{err}")))));

/// Install the message sink, or silence it with `None`.
///
/// The sink receives one line per savepoint control statement and per
/// primitive action. It must be callable from any thread that evaluates
/// expressions.
pub fn message_log<F>(hook: Option<F>)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    if let Ok(mut slot) = MESSAGE_HOOK.write() {
        *slot = hook.map(|f| Box::new(f) as MessageHook);
    }
}

/// Install the error sink, or silence it with `None`.
///
/// The sink only reports; classification of an outcome as success or
/// failure stays with [`log_error`].
pub fn error_log<F>(hook: Option<F>)
where
    F: Fn(&Error) + Send + Sync + 'static,
{
    if let Ok(mut slot) = ERROR_HOOK.write() {
        *slot = hook.map(|f| Box::new(f) as ErrorHook);
    }
}

/// Report an informational message to the installed sink.
pub fn log_message(msg: &str) {
    if let Ok(slot) = MESSAGE_HOOK.read() {
        if let Some(hook) = slot.as_ref() {
            hook(msg);
        }
    }
}

/// Classify a driver outcome: `true` for `Ok`, `false` for `Err`.
///
/// The error value is reported to the installed sink and then dropped:
/// combinators treat a fatal driver error exactly like a business-rule
/// failure, and callers who need to tell them apart listen on the sink.
pub fn log_error<T>(result: crate::Result<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => fail(err),
    }
}

/// Report `err` and return `false`.
pub(crate) fn fail(err: Error) -> bool {
    if let Ok(slot) = ERROR_HOOK.read() {
        if let Some(hook) = slot.as_ref() {
            hook(&err);
        }
    }
    false
}
