use biometrics::{Collector, Counter};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("smena.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("smena.client.request_errors");

pub(crate) static CHAT_DISPATCHES: Counter = Counter::new("smena.dispatch.sends");
pub(crate) static CHAT_FALLBACKS: Counter = Counter::new("smena.dispatch.fallbacks");
pub(crate) static CHAT_TIMEOUTS: Counter = Counter::new("smena.dispatch.timeouts");
pub(crate) static CHAT_REJECTED_BUSY: Counter = Counter::new("smena.dispatch.rejected_busy");

pub(crate) static HISTORY_SAVES: Counter = Counter::new("smena.history.saves");
pub(crate) static HISTORY_SAVE_ERRORS: Counter = Counter::new("smena.history.save_errors");
pub(crate) static HISTORY_LOAD_FALLBACKS: Counter = Counter::new("smena.history.load_fallbacks");

pub(crate) static STATUS_POLLS: Counter = Counter::new("smena.status.polls");
pub(crate) static STATUS_POLL_ERRORS: Counter = Counter::new("smena.status.poll_errors");

pub(crate) static TOKEN_STORE_ERRORS: Counter = Counter::new("smena.auth.token_store_errors");
pub(crate) static INTERACTION_LOG_ERRORS: Counter = Counter::new("smena.client.log_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&CHAT_DISPATCHES);
    collector.register_counter(&CHAT_FALLBACKS);
    collector.register_counter(&CHAT_TIMEOUTS);
    collector.register_counter(&CHAT_REJECTED_BUSY);

    collector.register_counter(&HISTORY_SAVES);
    collector.register_counter(&HISTORY_SAVE_ERRORS);
    collector.register_counter(&HISTORY_LOAD_FALLBACKS);

    collector.register_counter(&STATUS_POLLS);
    collector.register_counter(&STATUS_POLL_ERRORS);

    collector.register_counter(&TOKEN_STORE_ERRORS);
    collector.register_counter(&INTERACTION_LOG_ERRORS);
}
