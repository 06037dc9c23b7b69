// Event-driven browser core. One task owns the page document and drains a
// single event channel; fetches and load-delay timers run as spawned tasks
// that post their results back into the same channel, so no request blocks
// event handling. Every search bumps a generation counter and every
// in-flight fetch carries the generation it was issued under; completions
// from an older generation are discarded instead of mutating the freshly
// cleared page.

use crate::api::{ApiError, Attraction, ScenicSpotApi};
use crate::page::PageDoc;
use crate::scroll::ScrollTrigger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

pub const MORE_DATA_TEXT: &str = "往下滑 更多景點...";
pub const NO_MORE_DATA_TEXT: &str = "沒有更多景點了";

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Records requested per page (`$top`).
    pub page_size: usize,
    /// Delay between reaching the bottom and requesting the next page.
    pub load_delay_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            load_delay_ms: 1000,
        }
    }
}

/// Events the browser loop consumes. `Search`, `Scrolled` and
/// `MoreActivated` come from the host page; the rest are posted internally
/// by spawned timer and fetch tasks.
#[derive(Debug)]
pub enum BrowserEvent {
    Search {
        city: String,
    },
    Scrolled {
        viewport_bottom: f64,
        document_height: f64,
    },
    /// The load-more indicator was activated directly.
    MoreActivated,
    /// A scheduled load's delay elapsed.
    LoadMore {
        generation: u64,
    },
    FirstPage {
        generation: u64,
        result: Result<Vec<Attraction>, ApiError>,
    },
    NextPage {
        generation: u64,
        result: Result<Vec<Attraction>, ApiError>,
    },
}

/// Handle held by the host page: feeds user events in and exposes the
/// shared page document for reading.
#[derive(Clone)]
pub struct BrowserHandle {
    tx: mpsc::Sender<BrowserEvent>,
    page: Arc<RwLock<PageDoc>>,
}

impl BrowserHandle {
    pub async fn search(&self, city: &str) {
        let _ = self
            .tx
            .send(BrowserEvent::Search {
                city: city.to_string(),
            })
            .await;
    }

    pub async fn scrolled(&self, viewport_bottom: f64, document_height: f64) {
        let _ = self
            .tx
            .send(BrowserEvent::Scrolled {
                viewport_bottom,
                document_height,
            })
            .await;
    }

    pub async fn activate_more(&self) {
        let _ = self.tx.send(BrowserEvent::MoreActivated).await;
    }

    pub fn page(&self) -> Arc<RwLock<PageDoc>> {
        self.page.clone()
    }
}

pub struct AttractionBrowser<A: ScenicSpotApi> {
    api: Arc<A>,
    config: BrowserConfig,
    page: Arc<RwLock<PageDoc>>,
    trigger: ScrollTrigger,
    city: String,
    generation: u64,
    tx: mpsc::Sender<BrowserEvent>,
}

impl<A: ScenicSpotApi> AttractionBrowser<A> {
    /// Spawn the browser loop and return the handle the host page drives it
    /// through. Must be called from within a tokio runtime.
    pub fn start(api: Arc<A>, config: BrowserConfig) -> BrowserHandle {
        let (tx, rx) = mpsc::channel(64);
        let page = Arc::new(RwLock::new(PageDoc::new()));
        let trigger = ScrollTrigger::new(Duration::from_millis(config.load_delay_ms));

        let browser = Self {
            api,
            config,
            page: page.clone(),
            trigger,
            city: String::new(),
            generation: 0,
            tx: tx.clone(),
        };
        tokio::spawn(browser.run(rx));

        BrowserHandle { tx, page }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<BrowserEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
    }

    async fn handle(&mut self, event: BrowserEvent) {
        match event {
            BrowserEvent::Search { city } => self.on_search(city).await,
            BrowserEvent::Scrolled {
                viewport_bottom,
                document_height,
            } => self.on_scrolled(viewport_bottom, document_height),
            BrowserEvent::MoreActivated => self.on_more_activated().await,
            BrowserEvent::LoadMore { generation } => self.on_load_more(generation).await,
            BrowserEvent::FirstPage { generation, result } => {
                self.on_first_page(generation, result).await
            }
            BrowserEvent::NextPage { generation, result } => {
                self.on_next_page(generation, result).await
            }
        }
    }

    /// A new search: clear the output, reset the indicator, re-arm the
    /// scroll trigger and request the first page under a new generation.
    async fn on_search(&mut self, city: String) {
        self.generation += 1;
        self.city = city;
        {
            let mut page = self.page.write().await;
            page.clear_output();
            page.more_data.text = MORE_DATA_TEXT.to_string();
            page.more_data.hidden = true;
        }
        self.trigger.arm();
        info!(city = %self.city, generation = self.generation, "new search");
        self.spawn_fetch(None, self.generation);
    }

    fn on_scrolled(&mut self, viewport_bottom: f64, document_height: f64) {
        if !self.trigger.on_scroll(viewport_bottom, document_height) {
            return;
        }
        let tx = self.tx.clone();
        let generation = self.generation;
        let delay = self.trigger.delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(BrowserEvent::LoadMore { generation }).await;
        });
    }

    async fn on_more_activated(&mut self) {
        // The indicator path skips the scroll delay but shares the
        // exhaustion gate.
        if !self.trigger.begin_load() {
            return;
        }
        let skip = self.page.read().await.rendered_count();
        self.spawn_fetch(Some(skip), self.generation);
    }

    async fn on_load_more(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "dropping load scheduled under an old search"
            );
            return;
        }
        if !self.trigger.begin_load() {
            return;
        }
        // The cursor is derived from the rendered container, never tracked.
        let skip = self.page.read().await.rendered_count();
        self.spawn_fetch(Some(skip), generation);
    }

    fn spawn_fetch(&self, skip: Option<usize>, generation: u64) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        let city = self.city.clone();
        let top = self.config.page_size;
        tokio::spawn(async move {
            let result = api.fetch_page(&city, top, skip).await;
            let event = match skip {
                None => BrowserEvent::FirstPage { generation, result },
                Some(_) => BrowserEvent::NextPage { generation, result },
            };
            let _ = tx.send(event).await;
        });
    }

    async fn on_first_page(&mut self, generation: u64, result: Result<Vec<Attraction>, ApiError>) {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "discarding stale first page"
            );
            return;
        }
        match result {
            Ok(records) => {
                let count = records.len();
                let mut page = self.page.write().await;
                for record in records {
                    // An empty description falls back to the detail text.
                    let description = if record.description.is_empty() {
                        record.description_detail
                    } else {
                        record.description
                    };
                    page.append_place(record.name, description);
                }
                page.more_data.hidden = false;
                debug!(count, "rendered first page");
            }
            Err(err) => self.report_error(err).await,
        }
    }

    async fn on_next_page(&mut self, generation: u64, result: Result<Vec<Attraction>, ApiError>) {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "discarding stale next page"
            );
            return;
        }
        match result {
            Ok(records) if !records.is_empty() => {
                let count = records.len();
                let mut page = self.page.write().await;
                // Paginated appends keep the raw description, even when
                // empty. Only the first page applies the detail fallback.
                for record in records {
                    page.append_place(record.name, record.description);
                }
                debug!(count, total = page.rendered_count(), "appended page");
            }
            Ok(_) => {
                self.trigger.exhaust();
                self.page.write().await.more_data.text = NO_MORE_DATA_TEXT.to_string();
                info!(city = %self.city, "no more attractions");
            }
            Err(err) => self.report_error(err).await,
        }
    }

    /// Terminal failure path: the message lands in the status area and the
    /// already rendered content stays.
    async fn report_error(&self, err: ApiError) {
        warn!(error = %err, "request failed");
        self.page.write().await.push_status(err.to_string());
    }
}
