use crate::application_port::{ApiError, BucketService};
use crate::domain_model::{BucketDetails, CreateBucketInput};
use crate::domain_port::{Navigator, Notifier};
use crate::store::report;
use std::sync::Arc;
use tokio::sync::watch;

pub struct BucketStore {
    service: Arc<dyn BucketService>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    buckets: watch::Sender<Vec<BucketDetails>>,
    loading: watch::Sender<bool>,
}

impl BucketStore {
    pub fn new(
        service: Arc<dyn BucketService>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        landing_path: impl Into<String>,
    ) -> Self {
        BucketStore {
            service,
            notifier,
            navigator,
            landing_path: landing_path.into(),
            buckets: watch::channel(Vec::new()).0,
            loading: watch::channel(false).0,
        }
    }

    pub fn buckets(&self) -> Vec<BucketDetails> {
        self.buckets.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<BucketDetails>> {
        self.buckets.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn buckets_count(&self) -> usize {
        self.buckets.borrow().len()
    }

    /// Items across every loaded bucket.
    pub fn bucket_items_count(&self) -> usize {
        self.buckets
            .borrow()
            .iter()
            .map(|b| b.bucket_items.len())
            .sum()
    }

    pub fn bucket(&self, uid: &str) -> Option<BucketDetails> {
        self.buckets
            .borrow()
            .iter()
            .find(|b| b.bucket.uid == uid)
            .cloned()
    }

    pub async fn fetch_buckets(&self) -> Result<Vec<BucketDetails>, ApiError> {
        self.loading.send_replace(true);
        let result = self.service.list_buckets().await;
        match &result {
            Ok(buckets) => {
                self.buckets.send_replace(buckets.clone());
            }
            Err(e) => {
                report(&*self.notifier, "fetch buckets", e);
                self.buckets.send_replace(Vec::new());
            }
        }
        self.loading.send_replace(false);
        result
    }

    /// Loads one bucket with its items and merges it into the list.
    pub async fn fetch_bucket(&self, uid: &str) -> Result<BucketDetails, ApiError> {
        let details = self.service.find_bucket(uid).await.inspect_err(|e| {
            report(&*self.notifier, "fetch bucket", e);
        })?;
        self.buckets.send_modify(|buckets| {
            match buckets.iter_mut().find(|b| b.bucket.uid == uid) {
                Some(slot) => *slot = details.clone(),
                None => buckets.push(details.clone()),
            }
        });
        Ok(details)
    }

    pub async fn create_bucket(&self, input: CreateBucketInput) -> Result<BucketDetails, ApiError> {
        let created = self.service.create_bucket(input).await.inspect_err(|e| {
            report(&*self.notifier, "create bucket", e);
        })?;
        self.notifier.success("Bucket Created Successfully! 🎉");
        let _ = self.fetch_buckets().await;
        Ok(created)
    }

    pub async fn update_bucket(&self, uid: &str, input: CreateBucketInput) -> Result<(), ApiError> {
        self.service.update_bucket(uid, input).await.inspect_err(|e| {
            report(&*self.notifier, "update bucket", e);
        })?;
        self.notifier.success("Bucket Updated Successfully! 🎉");
        let _ = self.fetch_buckets().await;
        Ok(())
    }

    pub async fn delete_bucket(&self, uid: &str) -> Result<(), ApiError> {
        self.service.delete_bucket(uid).await.inspect_err(|e| {
            report(&*self.notifier, "delete bucket", e);
        })?;
        self.notifier.success("Bucket Deleted Successfully! 🎉");
        self.navigator.navigate(&self.landing_path);
        let _ = self.fetch_buckets().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain_model::CreateBucketInput;
    use crate::domain_port::{Notification, NotificationLevel};
    use crate::store::test_support::{harness, signed_in};

    fn input(name: &str) -> CreateBucketInput {
        CreateBucketInput {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_refetches_list() {
        let h = signed_in().await;
        let created = h.client.buckets.create_bucket(input("photos")).await.unwrap();

        assert_eq!(h.client.buckets.buckets_count(), 1);
        assert_eq!(
            h.client.buckets.bucket(&created.bucket.uid).unwrap().bucket.name,
            "photos"
        );
        assert!(!h.client.buckets.is_loading());
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::success("Bucket Created Successfully! 🎉")]
        );
    }

    #[tokio::test]
    async fn validation_failure_reports_server_error() {
        let h = signed_in().await;
        let err = h.client.buckets.create_bucket(input("x")).await.unwrap_err();
        assert_eq!(err.field_message("name"), "name must be at least 2 characters");

        let notes = h.notifier.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "Value must be at least 2 characters");
    }

    #[tokio::test]
    async fn failed_fetch_empties_list() {
        let h = harness();
        assert!(h.client.buckets.fetch_buckets().await.is_err());
        assert_eq!(h.client.buckets.buckets_count(), 0);
        assert!(!h.client.buckets.is_loading());
        assert_eq!(h.notifier.notifications().len(), 1);
    }

    #[tokio::test]
    async fn delete_returns_to_landing() {
        let h = signed_in().await;
        let created = h.client.buckets.create_bucket(input("photos")).await.unwrap();
        h.client.router.push(&format!("/dashboard/bucket/{}", created.bucket.uid));

        h.client.buckets.delete_bucket(&created.bucket.uid).await.unwrap();
        assert_eq!(h.client.buckets.buckets_count(), 0);
        assert_eq!(h.client.router.current(), "/dashboard");
    }
}
