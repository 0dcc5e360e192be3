//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Initializing the crawl directory and fetching robots.txt
//! - Managing the frontier queue and visited set
//! - Coordinating fetching, extraction, and link discovery
//! - Periodic checkpoints and resumption
//! - Writing the final manifest

use crate::config::{apply_env, validate, CrawlConfig};
use crate::crawler::fetcher::{
    build_http_client, FetchError, FetchedPage, PageFetcher, MAX_REDIRECTS,
};
use crate::crawler::scheduler::{effective_delay, Scheduler};
use crate::crawler::CrawlResult;
use crate::extract::{
    classify_page, extract_json_ld, extract_links, extract_metadata, extract_text,
};
use crate::output::CrawlManifest;
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::state::{CrawlPhase, CrawlState, FrontierItem};
use crate::storage::{page_id, FsStorage, PageRecord, Storage};
use crate::url::{extract_domain, is_same_site, normalize_parsed, normalize_url, UrlFilter};
use crate::{HarvestError, UrlError};
use chrono::Utc;
use reqwest::redirect::Policy;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Number of processed items between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Main crawler coordinator structure
///
/// Owns every piece of mutable crawl state; nothing is shared.
pub struct Coordinator {
    config: CrawlConfig,
    fetcher: Box<dyn PageFetcher>,
    storage: FsStorage,
    scheduler: Scheduler,
    robots: RobotsPolicy,
    filter: UrlFilter,
    manifest: CrawlManifest,
    seed: Url,
    delay: Duration,
    phase: CrawlPhase,
    processed: u64,
}

impl Coordinator {
    /// Prepares a fresh crawl
    ///
    /// Validates the configuration, creates the crawl directory, fetches
    /// robots.txt and seeds the frontier. The returned coordinator is in the
    /// `Crawling` phase.
    ///
    /// # Arguments
    ///
    /// * `config` - The resolved crawl configuration
    /// * `fetcher` - The page fetch strategy
    pub async fn start(
        config: CrawlConfig,
        fetcher: Box<dyn PageFetcher>,
    ) -> Result<Self, HarvestError> {
        let mut phase = CrawlPhase::Init;
        validate(&config)?;

        let seed = normalize_url(&config.seed_url)?;
        let domain = extract_domain(&seed).ok_or(UrlError::MissingDomain)?;

        let started_at = Utc::now();
        let (crawl_dir, suffix) = unused_crawl_dir(
            &config.output_dir.join(&domain),
            &started_at.format("%Y%m%dT%H%M%S").to_string(),
        );
        let crawl_id = format!("{}-{}{}", domain, started_at.format("%Y%m%d%H%M%S"), suffix);

        let storage = FsStorage::new(crawl_dir);
        storage.prepare()?;
        let filter = UrlFilter::new(&config.include_patterns, &config.exclude_patterns)?;

        phase.transition(CrawlPhase::FetchingRobots)?;
        let robots = load_robots(&config, &seed).await?;
        let delay = effective_delay(config.delay(), robots.crawl_delay(&config.user_agent));

        let mut scheduler = Scheduler::new();
        scheduler.enqueue(seed.to_string(), 0);

        let manifest = CrawlManifest::new(crawl_id, domain, config.clone(), started_at);
        storage.save_manifest(&manifest)?;

        phase.transition(CrawlPhase::Crawling)?;
        info!(
            "Starting crawl {} of {} with {} fetcher into {}",
            manifest.crawl_id,
            seed,
            fetcher.name(),
            storage.location().display()
        );

        Ok(Self {
            config,
            fetcher,
            storage,
            scheduler,
            robots,
            filter,
            manifest,
            seed,
            delay,
            phase,
            processed: 0,
        })
    }

    /// Restores an interrupted crawl from its checkpoint
    ///
    /// # Arguments
    ///
    /// * `state_path` - The checkpoint file or the crawl directory holding it
    /// * `fallback` - Configuration to use when the manifest is missing
    /// * `fetcher` - The page fetch strategy
    pub async fn restore(
        state_path: &Path,
        fallback: Option<CrawlConfig>,
        fetcher: Box<dyn PageFetcher>,
    ) -> Result<Self, HarvestError> {
        let mut phase = CrawlPhase::Init;
        phase.transition(CrawlPhase::Resuming)?;

        let storage = FsStorage::new(crawl_dir_of(state_path));
        let state = storage.load_state()?.ok_or_else(|| {
            HarvestError::Resume(format!(
                "no checkpoint found at {}",
                storage.state_path().display()
            ))
        })?;

        let saved = storage.load_manifest()?;
        let config = resolve_config(&storage, saved.as_ref(), fallback)?;
        validate(&config)?;

        let seed = normalize_url(&config.seed_url)?;
        let filter = UrlFilter::new(&config.include_patterns, &config.exclude_patterns)?;

        let mut manifest = match saved {
            Some(manifest) => manifest,
            None => {
                let domain = extract_domain(&seed).ok_or(UrlError::MissingDomain)?;
                CrawlManifest::new(state.crawl_id.clone(), domain, config.clone(), Utc::now())
            }
        };

        // Robots policies are not assumed to survive a pause
        let robots = load_robots(&config, &seed).await?;
        let delay = effective_delay(config.delay(), robots.crawl_delay(&config.user_agent));

        manifest.config = config.clone();
        manifest.crawl_id = state.crawl_id;
        manifest.stats = state.stats;
        manifest.completed_at = None;

        let scheduler = Scheduler::from_checkpoint(state.frontier, state.visited);

        phase.transition(CrawlPhase::Crawling)?;
        info!(
            "Resuming crawl {} from {} ({} queued, {} visited, {} pages so far)",
            manifest.crawl_id,
            state.checkpoint_at.to_rfc3339(),
            scheduler.frontier_len(),
            scheduler.visited_len(),
            manifest.stats.pages_succeeded
        );

        Ok(Self {
            config,
            fetcher,
            storage,
            scheduler,
            robots,
            filter,
            manifest,
            seed,
            delay,
            phase,
            processed: 0,
        })
    }

    /// Current phase of the crawl
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Directory the crawl writes into
    pub fn crawl_dir(&self) -> &Path {
        self.storage.location()
    }

    /// Identifier of the crawl
    pub fn crawl_id(&self) -> &str {
        &self.manifest.crawl_id
    }

    /// Pause between requests, after any robots.txt crawl-delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs the crawl loop to completion
    ///
    /// Page failures are recorded and never abort the crawl; a storage error
    /// does, leaving whatever is already on disk in place.
    pub async fn run(mut self) -> CrawlResult {
        match self.crawl_loop().await {
            Ok(()) => {
                info!(
                    "Crawl {} completed: {} succeeded, {} failed, {} left in frontier",
                    self.manifest.crawl_id,
                    self.manifest.stats.pages_succeeded,
                    self.manifest.stats.pages_failed,
                    self.scheduler.frontier_len()
                );
                self.result(None)
            }
            Err(e) => {
                error!("Crawl {} failed: {}", self.manifest.crawl_id, e);
                // Failed is reachable from every phase
                let _ = self.phase.transition(CrawlPhase::Failed);
                self.result(Some(e.to_string()))
            }
        }
    }

    async fn crawl_loop(&mut self) -> Result<(), HarvestError> {
        let start_time = Instant::now();
        let checkpoint_interval = u64::from(self.config.checkpoint_interval.max(1));

        while !self.budget_reached() {
            let Some(item) = self.scheduler.next_item() else {
                info!("Frontier is empty");
                break;
            };

            let Some(url) = self.admit(&item) else {
                continue;
            };

            self.scheduler.mark_visited(&item.url);
            if self.process(&item, url).await? {
                self.processed += 1;

                if self.processed % checkpoint_interval == 0 {
                    self.checkpoint()?;
                }

                if self.processed % PROGRESS_INTERVAL == 0 {
                    let rate =
                        self.processed as f64 / start_time.elapsed().as_secs_f64().max(1e-3);
                    info!(
                        "Progress: {} pages processed, {} succeeded, {} in frontier, {:.2} pages/sec",
                        self.processed,
                        self.manifest.stats.pages_succeeded,
                        self.scheduler.frontier_len(),
                        rate
                    );
                }
            }

            if !self.scheduler.is_empty() && !self.budget_reached() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        self.finish()
    }

    fn budget_reached(&self) -> bool {
        self.manifest.stats.pages_succeeded >= u64::from(self.config.max_pages)
    }

    /// Decides whether a dequeued item is fetched
    ///
    /// Skipped items are not errors; all but already-visited ones are marked
    /// visited so rediscovery does not queue them again.
    fn admit(&mut self, item: &FrontierItem) -> Option<Url> {
        if self.scheduler.is_visited(&item.url) {
            debug!("Skipping {}: already visited", item.url);
            return None;
        }

        let reason = match Url::parse(&item.url) {
            Err(e) => Err(format!("unparseable URL ({})", e)),
            Ok(_) if item.depth > self.config.max_depth => Err(format!(
                "depth {} exceeds max depth {}",
                item.depth, self.config.max_depth
            )),
            Ok(_)
                if self.config.respect_robots
                    && !self.robots.is_allowed(&item.url, &self.config.user_agent) =>
            {
                Err("disallowed by robots.txt".to_string())
            }
            Ok(url) if !self.filter.allows(&url) => Err("filtered by URL patterns".to_string()),
            Ok(url) => Ok(url),
        };

        match reason {
            Ok(url) => Some(url),
            Err(reason) => {
                debug!("Skipping {}: {}", item.url, reason);
                self.scheduler.mark_visited(&item.url);
                None
            }
        }
    }

    /// Fetches one page and records the outcome
    ///
    /// Returns false when the fetch was abandoned because a redirect led
    /// back into the visited set; nothing is recorded for it.
    async fn process(&mut self, item: &FrontierItem, url: Url) -> Result<bool, HarvestError> {
        debug!("Fetching {} (depth {})", item.url, item.depth);

        let scheduler = &self.scheduler;
        let visited = |target: &Url| {
            normalize_parsed(target.clone()).is_ok_and(|n| scheduler.is_visited(n.as_str()))
        };

        let started = Instant::now();
        let fetched = self.fetcher.fetch(&url, &visited).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match fetched {
            Err(FetchError::AlreadyVisited(target)) => {
                debug!("Skipping {}: redirects to already visited {}", item.url, target);
                return Ok(false);
            }
            Ok(page) => {
                if let Ok(final_url) = normalize_parsed(page.final_url.clone()) {
                    if final_url.as_str() != item.url {
                        self.scheduler.mark_visited(final_url.as_str());
                    }
                }

                let record = build_record(item, page, elapsed_ms);
                self.manifest.stats.record_success(
                    record.page_type,
                    record.content_length,
                    elapsed_ms,
                );
                self.storage.save_page(&record)?;
                self.manifest.add_page(&record);

                let mut discovered = 0;
                for link in &record.internal_links {
                    let same_site = Url::parse(link).is_ok_and(|l| is_same_site(&l, &self.seed));
                    if same_site && self.scheduler.enqueue(link.clone(), item.depth + 1) {
                        discovered += 1;
                    }
                }

                debug!(
                    "Fetched {} [{}] in {} ms, {} new links",
                    item.url, record.page_type, elapsed_ms, discovered
                );
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", item.url, e);
                let record =
                    PageRecord::failed(&item.url, item.depth, e.status_code(), e.to_string(), elapsed_ms);
                self.manifest.stats.record_failure();
                self.manifest.add_error(&record);
            }
        }

        Ok(true)
    }

    /// Writes the checkpoint and the manifest
    fn checkpoint(&self) -> Result<(), HarvestError> {
        let state = CrawlState {
            crawl_id: self.manifest.crawl_id.clone(),
            frontier: self.scheduler.frontier_snapshot(),
            visited: self.scheduler.visited_snapshot(),
            stats: self.manifest.stats.clone(),
            checkpoint_at: Utc::now(),
        };

        self.storage.save_state(&state)?;
        self.storage.save_manifest(&self.manifest)?;
        debug!(
            "Checkpoint written ({} queued, {} visited)",
            state.frontier.len(),
            state.visited.len()
        );
        Ok(())
    }

    /// Writes the final manifest and removes the checkpoint
    fn finish(&mut self) -> Result<(), HarvestError> {
        self.manifest.completed_at = Some(Utc::now());
        self.storage.save_manifest(&self.manifest)?;
        self.storage.clear_state()?;
        self.phase.transition(CrawlPhase::Completed)?;
        Ok(())
    }

    fn result(&self, error: Option<String>) -> CrawlResult {
        CrawlResult {
            success: error.is_none(),
            phase: self.phase,
            crawl_id: Some(self.manifest.crawl_id.clone()),
            crawl_dir: Some(self.storage.location().to_path_buf()),
            manifest_path: Some(self.storage.manifest_path()),
            pages_succeeded: self.manifest.stats.pages_succeeded,
            pages_failed: self.manifest.stats.pages_failed,
            frontier_remaining: self.scheduler.frontier_len(),
            error,
        }
    }
}

/// Runs every extractor over a fetched page
fn build_record(item: &FrontierItem, page: FetchedPage, response_time_ms: u64) -> PageRecord {
    let FetchedPage {
        final_url,
        status,
        body,
        ..
    } = page;

    let metadata = extract_metadata(&body, &final_url);
    let page_type = classify_page(&final_url, &metadata);
    let links = extract_links(&body, &final_url);

    PageRecord {
        id: page_id(&item.url),
        url: item.url.clone(),
        final_url: final_url.to_string(),
        status,
        page_type,
        metadata,
        text: extract_text(&body),
        internal_links: links.internal,
        external_links: links.external,
        json_ld: extract_json_ld(&body),
        fetched_at: Utc::now(),
        depth: item.depth,
        response_time_ms,
        content_length: body.len() as u64,
        error: None,
        html: body,
    }
}

/// Resolves the configuration an interrupted crawl continues with
///
/// The configuration saved in the crawl's manifest wins; `fallback` is used
/// only when there is no manifest, and otherwise contributes just the render
/// proxy key, which is never written to disk.
///
/// # Arguments
///
/// * `state_path` - The checkpoint file or the crawl directory holding it
/// * `fallback` - Configuration to use when the manifest is missing
pub fn resume_config(
    state_path: &Path,
    fallback: Option<CrawlConfig>,
) -> Result<CrawlConfig, HarvestError> {
    let storage = FsStorage::new(crawl_dir_of(state_path));
    let saved = storage.load_manifest()?;
    resolve_config(&storage, saved.as_ref(), fallback)
}

fn resolve_config(
    storage: &FsStorage,
    saved: Option<&CrawlManifest>,
    fallback: Option<CrawlConfig>,
) -> Result<CrawlConfig, HarvestError> {
    let mut config = match (saved, fallback) {
        (Some(manifest), fallback) => {
            let mut config = manifest.config.clone();
            if let Some(key) = fallback.and_then(|f| f.render_proxy_key) {
                config.render_proxy_key = Some(key);
            }
            config
        }
        (None, Some(fallback)) => fallback,
        (None, None) => {
            return Err(HarvestError::Resume(format!(
                "no manifest at {} and no configuration supplied",
                storage.manifest_path().display()
            )))
        }
    };

    apply_env(&mut config);
    Ok(config)
}

/// Fetches robots.txt when compliance is enabled
async fn load_robots(config: &CrawlConfig, seed: &Url) -> Result<RobotsPolicy, HarvestError> {
    if !config.respect_robots {
        debug!("robots.txt compliance disabled");
        return Ok(RobotsPolicy::allow_all());
    }

    let client = build_http_client(config, Policy::limited(MAX_REDIRECTS))?;
    Ok(fetch_robots(&client, seed, &config.user_agent, config.timeout()).await)
}

/// Picks a crawl directory under `parent` that no earlier crawl has used
///
/// Returns the directory and the suffix (`""` or `-N`) appended to `stamp`,
/// which the crawl id carries too.
fn unused_crawl_dir(parent: &Path, stamp: &str) -> (PathBuf, String) {
    let mut suffix = String::new();
    let mut n = 1;
    loop {
        let dir = parent.join(format!("{}{}", stamp, suffix));
        if !dir.exists() {
            return (dir, suffix);
        }
        suffix = format!("-{}", n);
        n += 1;
    }
}

/// Accepts either a checkpoint file or the crawl directory holding it
pub(crate) fn crawl_dir_of(state_path: &Path) -> PathBuf {
    if state_path.is_dir() {
        return state_path.to_path_buf();
    }

    // Anything that is not a directory is taken to be the checkpoint itself
    match state_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
