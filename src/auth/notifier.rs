//! Verification-link delivery abstraction.
//!
//! The lifecycle manager builds the absolute link and hands it over
//! together with the recipient address; whatever sits behind the trait
//! (SMTP relay, template pipeline, log line) owns delivery and its
//! failures. Nothing propagates back into the flows that called it.

use tracing::info;

/// Delivery seam for verification links.
pub trait VerificationNotifier: Send + Sync {
    /// Fire-and-forget hand-off of a ready-made link.
    fn notify_verification_link(&self, email: &str, link: &str);
}

/// Local dev notifier that logs the link instead of sending real email.
///
/// The logged link contains the raw token, which is the point: in offline
/// setups the log line is the inbox. Not for production composition.
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl VerificationNotifier for LogNotifier {
    fn notify_verification_link(&self, email: &str, link: &str) {
        info!(to_email = %email, link = %link, "verification email send stub");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::VerificationNotifier;
    use std::sync::Mutex;

    /// Captures deliveries so tests can fish raw tokens out of the links.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        pub(crate) fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub(crate) fn last_link(&self) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .last()
                .map(|(_, link)| link.clone())
        }

        pub(crate) fn last_recipient(&self) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .last()
                .map(|(email, _)| email.clone())
        }

        /// Raw token carried by the most recent link.
        pub(crate) fn last_raw_token(&self) -> Option<String> {
            self.last_link()
                .and_then(|link| link.split_once("token=").map(|(_, raw)| raw.to_string()))
        }
    }

    impl VerificationNotifier for RecordingNotifier {
        fn notify_verification_link(&self, email: &str, link: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), link.to_string()));
        }
    }
}
