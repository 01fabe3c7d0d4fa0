//! Paged, time-windowed history scanning.
//!
//! Pages are requested newest first. Once a page reaches back past the
//! window start, nothing older can be in the window and scanning stops.
//! Pages that break the newest-first contract switch the scan to a plain
//! full read so results stay correct.

use tokio_util::sync::CancellationToken;

use crate::domain::{AppError, Message, MessageStore, Result, TimeWindow};

/// Reads a session's messages inside a window.
pub struct MessageScanner<'a> {
    store: &'a dyn MessageStore,
    page_size: usize,
    yield_every: usize,
    cancel: CancellationToken,
}

impl<'a> MessageScanner<'a> {
    pub const DEFAULT_PAGE_SIZE: usize = 5000;
    pub const DEFAULT_YIELD_EVERY: usize = 2;

    #[must_use]
    pub fn new(store: &'a dyn MessageStore) -> Self {
        Self {
            store,
            page_size: Self::DEFAULT_PAGE_SIZE,
            yield_every: Self::DEFAULT_YIELD_EVERY,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_yield_every(mut self, pages: usize) -> Self {
        self.yield_every = pages.max(1);
        self
    }

    /// Token checked after every cooperative yield.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Messages of `identifier` inside `window`, in store order.
    ///
    /// # Errors
    /// Returns the store's error if a page cannot be read, or
    /// `Cancelled` if the token fired during a yield.
    pub async fn scan(&self, identifier: &str, window: TimeWindow) -> Result<Vec<Message>> {
        self.scan_with_progress(identifier, window, |_| {}).await
    }

    /// Same as [`Self::scan`], reporting the running kept count after each page.
    ///
    /// # Errors
    /// See [`Self::scan`].
    pub async fn scan_with_progress<F>(
        &self,
        identifier: &str,
        window: TimeWindow,
        mut on_page: F,
    ) -> Result<Vec<Message>>
    where
        F: FnMut(usize),
    {
        let mut kept = Vec::new();
        let mut offset = 0;
        let mut pages = 0;
        let mut previous_oldest: Option<i64> = None;

        loop {
            let page = self.store.message_page(identifier, self.page_size, offset)?;
            pages += 1;
            let fetched = page.len();

            let (Some(newest), Some(oldest)) = (page.first(), page.last()) else {
                break;
            };
            let (newest, oldest) = (newest.create_time, oldest.create_time);

            if !is_newest_first(&page) || previous_oldest.is_some_and(|prev| newest > prev) {
                tracing::warn!(
                    session = identifier,
                    offset,
                    "Store returned a page out of newest-first order, falling back to full scan"
                );
                return self.full_scan(identifier, window, on_page).await;
            }
            previous_oldest = Some(oldest);

            if window.is_before_start(newest) {
                tracing::debug!(session = identifier, pages, "Page entirely before window");
                break;
            }

            kept.extend(page.into_iter().filter(|m| window.contains(m.create_time)));
            on_page(kept.len());

            if window.is_before_start(oldest) {
                tracing::debug!(session = identifier, pages, "Reached window start");
                break;
            }
            if fetched < self.page_size {
                break;
            }
            offset += self.page_size;

            if pages % self.yield_every == 0 {
                self.pause().await?;
            }
        }

        tracing::debug!(
            session = identifier,
            pages,
            kept = kept.len(),
            window = %window,
            "Scan finished"
        );
        Ok(kept)
    }

    /// Reads every page and filters, without relying on page order.
    async fn full_scan<F>(
        &self,
        identifier: &str,
        window: TimeWindow,
        mut on_page: F,
    ) -> Result<Vec<Message>>
    where
        F: FnMut(usize),
    {
        let mut kept = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            let page = self.store.message_page(identifier, self.page_size, offset)?;
            pages += 1;
            let fetched = page.len();

            kept.extend(page.into_iter().filter(|m| window.contains(m.create_time)));
            on_page(kept.len());

            if fetched < self.page_size {
                break;
            }
            offset += self.page_size;

            if pages % self.yield_every == 0 {
                self.pause().await?;
            }
        }

        Ok(kept)
    }

    async fn pause(&self) -> Result<()> {
        tokio::task::yield_now().await;
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }
}

fn is_newest_first(page: &[Message]) -> bool {
    page.windows(2)
        .all(|pair| pair[0].create_time >= pair[1].create_time)
}
