use crate::application_port::{ApiError, BucketItemPage, BucketItemService};
use crate::domain_model::{BucketItem, BucketItemInput, PageQuery};
use crate::domain_port::Notifier;
use crate::store::report_prefixed;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// The item listing of one bucket and the item currently opened.
pub struct BucketItemStore {
    service: Arc<dyn BucketItemService>,
    notifier: Arc<dyn Notifier>,
    active_item: watch::Sender<Option<BucketItem>>,
    active_page: watch::Sender<Option<BucketItemPage>>,
    last_query: Mutex<PageQuery>,
}

impl BucketItemStore {
    pub fn new(service: Arc<dyn BucketItemService>, notifier: Arc<dyn Notifier>) -> Self {
        BucketItemStore {
            service,
            notifier,
            active_item: watch::channel(None).0,
            active_page: watch::channel(None).0,
            last_query: Mutex::new(PageQuery::default()),
        }
    }

    pub fn active_item(&self) -> Option<BucketItem> {
        self.active_item.borrow().clone()
    }

    pub fn active_page(&self) -> Option<BucketItemPage> {
        self.active_page.borrow().clone()
    }

    pub fn subscribe_page(&self) -> watch::Receiver<Option<BucketItemPage>> {
        self.active_page.subscribe()
    }

    pub fn set_active_item(&self, item: BucketItem) {
        self.active_item.send_replace(Some(item));
    }

    pub fn clear_active_item(&self) {
        self.active_item.send_replace(None);
    }

    pub async fn fetch_items(
        &self,
        bucket_uid: &str,
        page: PageQuery,
    ) -> Result<BucketItemPage, ApiError> {
        *self.last_query.lock().unwrap_or_else(PoisonError::into_inner) = page;
        let listing = self
            .service
            .list_items(bucket_uid, page)
            .await
            .inspect_err(|e| report_prefixed(&*self.notifier, "failed to fetch bucket items", e))?;
        self.active_page.send_replace(Some(listing.clone()));
        Ok(listing)
    }

    pub async fn fetch_item(&self, bucket_uid: &str, key: &str) -> Result<BucketItem, ApiError> {
        let item = self
            .service
            .find_item(bucket_uid, key)
            .await
            .inspect_err(|e| report_prefixed(&*self.notifier, "failed to fetch bucket item", e))?;
        self.set_active_item(item.clone());
        Ok(item)
    }

    pub async fn create_item(
        &self,
        bucket_uid: &str,
        input: BucketItemInput,
    ) -> Result<BucketItem, ApiError> {
        let item = self
            .service
            .create_item(bucket_uid, input)
            .await
            .inspect_err(|e| report_prefixed(&*self.notifier, "failed to create bucket item", e))?;
        self.notifier.success("Bucket item created successfully!");
        self.refetch(bucket_uid).await;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        bucket_uid: &str,
        key: &str,
        input: BucketItemInput,
    ) -> Result<(), ApiError> {
        self.service
            .update_item(bucket_uid, key, input)
            .await
            .inspect_err(|e| report_prefixed(&*self.notifier, "failed to update bucket item", e))?;
        self.notifier.success("Bucket item updated successfully!");
        self.refetch(bucket_uid).await;
        Ok(())
    }

    pub async fn delete_item(&self, bucket_uid: &str, key: &str) -> Result<(), ApiError> {
        self.service
            .delete_item(bucket_uid, key)
            .await
            .inspect_err(|e| report_prefixed(&*self.notifier, "failed to delete bucket item", e))?;
        self.notifier.success("Bucket item deleted successfully!");
        self.active_item.send_if_modified(|active| {
            let opened = active
                .as_ref()
                .is_some_and(|i| i.bucket_uid == bucket_uid && i.key == key);
            if opened {
                *active = None;
            }
            opened
        });
        self.refetch(bucket_uid).await;
        Ok(())
    }

    async fn refetch(&self, bucket_uid: &str) {
        let page = *self.last_query.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self.fetch_items(bucket_uid, page).await;
    }
}
