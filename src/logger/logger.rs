use anyhow::{Result, anyhow};
use tracing::{Metadata, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::filter_fn,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

/// Field names that would carry a credential or a secret. Tokens are never
/// logged: an event or span declaring one of these is dropped before it is
/// formatted, whatever the filter level.
pub const CREDENTIAL_FIELDS: &[&str] = &[
    "authorization",
    "access_token",
    "refresh_token",
    "x_refresh_token",
    "token",
    "password",
    "new_password",
];

pub fn is_credential_field(name: &str) -> bool {
    CREDENTIAL_FIELDS
        .iter()
        .any(|field| field.eq_ignore_ascii_case(name))
}

pub fn carries_credential(metadata: &Metadata<'_>) -> bool {
    metadata
        .fields()
        .iter()
        .any(|field| is_credential_field(field.name()))
}

pub struct LogConfig {
    pub filter: String,
}

/// Logs go to stderr; stdout carries command output only.
pub struct Logger {
    reload_handle: reload::Handle<EnvFilter, Registry>,
}

impl Logger {
    pub fn new_bootstrap() -> Self {
        let filter = EnvFilter::new("info");
        let (filter, reload_handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer(std::io::stderr))
            .init();

        Self { reload_handle }
    }

    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        let filter = EnvFilter::try_new(&config.filter).map_err(|e| anyhow!(e))?;
        self.reload_handle.reload(filter).map_err(|e| anyhow!(e))?;
        Ok(())
    }
}

fn console_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(make_writer)
        .with_filter(filter_fn(|metadata| !carries_credential(metadata)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn credential_fields_are_recognised() {
        assert!(is_credential_field("authorization"));
        assert!(is_credential_field("Refresh_Token"));
        assert!(!is_credential_field("path"));
        assert!(!is_credential_field("rotated"));
    }

    #[test]
    fn events_carrying_tokens_never_reach_the_console() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::registry().with(console_layer(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(authorization = "Bearer eyJhbGciOi.secret", "attaching bearer");
            tracing::warn!(refresh_token = "eyJrefresh.secret", "refresh failed");
            tracing::info!(path = "/buckets", "sending request");
        });

        let logged = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("sending request"));
        assert!(!logged.contains("secret"));
        assert!(!logged.contains("attaching bearer"));
    }
}
