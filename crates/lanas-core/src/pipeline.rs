//! Submission pipeline: validate, normalize, store, notify.
//!
//! The durable write is the only stage whose failure the caller sees. The
//! confirmation email is attempted once after the write and its failure is
//! logged, never retried, and never rolls the lead back.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{LeadStoreError, ValidationError};
use crate::form::{FormFields, FormState};
use crate::lead::Lead;
use crate::normalize::normalize;
use crate::notify::{Notifier, mask_email};
use crate::steps::StepPlan;
use crate::store::LeadStore;

/// The single result of a submission.
#[derive(Debug)]
pub enum Outcome {
    /// The lead was stored. Notification may or may not have succeeded.
    Success(Lead),
    /// The draft did not pass validation; nothing happened.
    Invalid(ValidationError),
    /// The durable write failed; nothing was stored.
    StorageError(LeadStoreError),
}

impl Outcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Runs submissions against a lead store and a notifier.
#[derive(Clone)]
pub struct SubmissionPipeline {
    plan: StepPlan,
    store: Arc<dyn LeadStore>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("steps", &self.plan.len())
            .field("store", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}

impl SubmissionPipeline {
    /// A pipeline validating against the lead-intake plan.
    #[must_use]
    pub fn new(store: Arc<dyn LeadStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_plan(StepPlan::lead_intake(), store, notifier)
    }

    #[must_use]
    pub fn with_plan(
        plan: StepPlan,
        store: Arc<dyn LeadStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            plan,
            store,
            notifier,
        }
    }

    /// The lead store, for read paths that share this pipeline's storage.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    /// Submit a complete draft.
    pub async fn submit(&self, fields: &FormFields) -> Outcome {
        // Every step is re-checked even though the form gated each advance.
        if let Err(e) = self.plan.validate_all(fields) {
            info!(issues = e.issues().len(), "submission rejected by validation");
            return Outcome::Invalid(e);
        }
        let record = match normalize(fields) {
            Ok(record) => record,
            Err(e) => {
                info!(error = %e, "submission rejected by normalization");
                return Outcome::Invalid(e);
            }
        };

        let lead = match self.store.insert(record).await {
            Ok(lead) => lead,
            Err(e) => {
                error!(error = %e, backend = self.store.backend_name(), "failed to store lead");
                return Outcome::StorageError(e);
            }
        };
        info!(lead_id = %lead.id, "lead captured");

        let email = &lead.record.email;
        match self
            .notifier
            .send_confirmation(&lead.record.name, email)
            .await
        {
            Ok(()) => info!(lead_id = %lead.id, to = %mask_email(email), "confirmation email sent"),
            Err(e) => warn!(
                lead_id = %lead.id,
                to = %mask_email(email),
                error = %e,
                "confirmation email not sent"
            ),
        }

        Outcome::Success(lead)
    }

    /// Submit a form session's draft; the form is reset on success and left
    /// untouched otherwise.
    pub async fn submit_form(&self, form: &mut FormState) -> Outcome {
        let outcome = self.submit(form.fields()).await;
        if outcome.is_success() {
            form.reset();
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use lanas_storage::{MemoryBackend, StorageBackend, StorageError};
    use uuid::Uuid;

    use super::*;
    use crate::error::NotificationError;
    use crate::form::FieldId;
    use crate::lead::NewLead;
    use crate::notify::LogNotifier;
    use crate::steps::tests::complete_fields;
    use crate::store::KvLeadStore;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_confirmation(&self, name: &str, email: &str) -> Result<(), NotificationError> {
            self.sent
                .lock()
                .unwrap()
                .push((name.to_owned(), email.to_owned()));
            Ok(())
        }
    }

    struct RejectingNotifier;

    #[async_trait::async_trait]
    impl Notifier for RejectingNotifier {
        async fn send_confirmation(&self, _: &str, _: &str) -> Result<(), NotificationError> {
            Err(NotificationError::Rejected {
                status: 422,
                message: "invalid recipient".into(),
            })
        }
    }

    /// Backend whose writes always fail.
    struct BrokenBackend;

    #[async_trait::async_trait]
    impl StorageBackend for BrokenBackend {
        async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }

        async fn put(&self, key: &str, _: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_owned(),
                reason: "disk full".into(),
            })
        }

        async fn list(&self, _: &str) -> Result<Vec<String>, StorageError> {
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    /// Store that counts inserts without persisting anything.
    #[derive(Default)]
    struct CountingStore {
        inserts: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl LeadStore for CountingStore {
        async fn insert(&self, record: NewLead) -> Result<Lead, LeadStoreError> {
            *self.inserts.lock().unwrap() += 1;
            Ok(Lead::new(record))
        }

        async fn list_all(&self) -> Result<Vec<Lead>, LeadStoreError> {
            Ok(Vec::new())
        }

        async fn get(&self, _: Uuid) -> Result<Option<Lead>, LeadStoreError> {
            Ok(None)
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    fn memory_store() -> Arc<KvLeadStore> {
        Arc::new(KvLeadStore::new(Arc::new(MemoryBackend::new())))
    }

    #[tokio::test]
    async fn success_stores_then_notifies() {
        let store = memory_store();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = SubmissionPipeline::new(store.clone(), notifier.clone());

        let Outcome::Success(lead) = pipeline.submit(&complete_fields()).await else {
            panic!("expected success");
        };
        assert_eq!(store.get(lead.id).await.unwrap(), Some(lead.clone()));
        assert_eq!(
            *notifier.sent.lock().unwrap(),
            vec![("Ana Souza".to_owned(), "ana@example.com".to_owned())]
        );
    }

    #[tokio::test]
    async fn notification_failure_still_succeeds_with_complete_record() {
        let store = memory_store();
        let pipeline = SubmissionPipeline::new(store.clone(), Arc::new(RejectingNotifier));

        let Outcome::Success(lead) = pipeline.submit(&complete_fields()).await else {
            panic!("expected success");
        };
        let stored = store.list_all().await.unwrap();
        assert_eq!(stored, vec![lead.clone()]);
        assert_eq!(lead.record, normalize(&complete_fields()).unwrap());
    }

    #[tokio::test]
    async fn unconfigured_notifier_does_not_fail_submission() {
        let pipeline = SubmissionPipeline::new(memory_store(), Arc::new(LogNotifier));
        assert!(pipeline.submit(&complete_fields()).await.is_success());
    }

    #[tokio::test]
    async fn storage_failure_reports_error_and_skips_notification() {
        let store = Arc::new(KvLeadStore::new(Arc::new(BrokenBackend)));
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = SubmissionPipeline::new(store.clone(), notifier.clone());

        let outcome = pipeline.submit(&complete_fields()).await;
        assert!(matches!(
            outcome,
            Outcome::StorageError(LeadStoreError::Storage(StorageError::Write { .. }))
        ));
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_has_no_side_effects() {
        let store = Arc::new(CountingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = SubmissionPipeline::new(store.clone(), notifier.clone());

        let mut fields = complete_fields();
        fields.set_text(FieldId::Availability, "").unwrap();

        let outcome = pipeline.submit(&fields).await;
        assert!(matches!(outcome, Outcome::Invalid(ValidationError::Step { step: 4, .. })));
        assert_eq!(*store.inserts.lock().unwrap(), 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_deduplication_of_identical_submissions() {
        let store = Arc::new(CountingStore::default());
        let pipeline = SubmissionPipeline::new(store.clone(), Arc::new(LogNotifier));
        pipeline.submit(&complete_fields()).await;
        pipeline.submit(&complete_fields()).await;
        assert_eq!(*store.inserts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn form_resets_after_success_and_equals_a_fresh_form() {
        let pipeline = SubmissionPipeline::new(memory_store(), Arc::new(LogNotifier));
        let mut form = FormState::lead_intake();
        for (field, value) in [
            (FieldId::Name, "Ana Souza"),
            (FieldId::Email, "ana@example.com"),
        ] {
            form.set_field(field, value).unwrap();
        }
        // Incomplete: validation fails and the draft is kept.
        assert!(matches!(
            pipeline.submit_form(&mut form).await,
            Outcome::Invalid(_)
        ));
        assert_eq!(form.fields().text(FieldId::Name), "Ana Souza");

        let mut form = FormState::lead_intake();
        let complete = complete_fields();
        for field in FieldId::ALL {
            if field.kind().is_single_valued() {
                form.set_field(field, complete.text(field)).unwrap();
            } else {
                form.set_selection(field, complete.selection(field).to_vec())
                    .unwrap();
            }
        }
        while form.advance().is_ok_and(|t| t != crate::form::Transition::ReadyToSubmit) {}
        assert!(form.is_last_step());

        assert!(pipeline.submit_form(&mut form).await.is_success());
        assert_eq!(form, FormState::lead_intake());
    }
}
