use crate::classify::{self, Partitioned};
use crate::ingest::{Batch, IngestError, Ingestor, SourceFile};
use crate::model::{EpisodeStream, FilterColumn, SongStream};
use crate::query::{self, QueryPage, QueryState};
use crate::stats;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything admitted by one successful upload batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub file_count: usize,
    pub songs: Vec<SongStream>,
    pub episodes: Vec<EpisodeStream>,
    pub dropped: usize,
    pub years: Vec<i32>,
}

impl Dataset {
    pub fn from_batch(batch: Batch) -> Self {
        let Partitioned {
            songs,
            episodes,
            dropped,
        } = classify::partition(batch.records);
        let years = stats::year_universe(&songs);
        Self {
            file_count: batch.file_count,
            songs,
            episodes,
            dropped,
            years,
        }
    }
}

/// What the presentation surface renders for the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub file_count: usize,
    pub song_streams: usize,
    pub track_count: usize,
    pub episode_count: usize,
    pub dropped: usize,
    pub years: Vec<i32>,
    pub page: QueryPage,
}

#[derive(Debug)]
pub struct Session {
    ingestor: Ingestor,
    dataset: Arc<Dataset>,
    query: QueryState,
    pub dirty: bool,
    pub status: String,
}

impl Session {
    pub fn new(ingestor: Ingestor, query: QueryState) -> Self {
        Self {
            ingestor,
            dataset: Arc::new(Dataset::default()),
            query,
            dirty: true,
            status: String::from("Ready. Load a streaming history export with :load <path>"),
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// The loaded dataset. Readers keep a consistent snapshot even if a new
    /// batch is loaded afterwards.
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset)
    }

    /// Replaces the loaded dataset with `files`, or leaves it untouched when
    /// any file in the batch is rejected.
    pub fn load_batch(&mut self, files: &[SourceFile]) -> Result<(), IngestError> {
        let batch = match self.ingestor.ingest(files) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(error = %err, files = files.len(), "session.load.rejected");
                self.set_status(&format!("Upload rejected: {err}"));
                return Err(err);
            }
        };

        let dataset = Dataset::from_batch(batch);
        info!(
            files = dataset.file_count,
            songs = dataset.songs.len(),
            episodes = dataset.episodes.len(),
            dropped = dataset.dropped,
            years = dataset.years.len(),
            "session.load"
        );

        let kept_years: Vec<i32> = self
            .query
            .years()
            .iter()
            .copied()
            .filter(|year| dataset.years.contains(year))
            .collect();
        self.query.set_years(kept_years);

        self.set_status(&format!(
            "Loaded {} file{}: {} song streams, {} episodes",
            dataset.file_count,
            plural(dataset.file_count),
            dataset.songs.len(),
            dataset.episodes.len()
        ));
        self.dataset = Arc::new(dataset);
        Ok(())
    }

    pub fn set_search(&mut self, value: &str) {
        self.query.set_search(value);
        self.dirty = true;
    }

    pub fn clear_search(&mut self) {
        self.query.clear_search();
        self.dirty = true;
    }

    pub fn set_column(&mut self, column: FilterColumn) {
        self.query.set_column(column);
        self.dirty = true;
    }

    pub fn cycle_column(&mut self) {
        let next = self.query.column().next();
        self.set_column(next);
        self.set_status(&format!("Filter column: {}", next.label()));
    }

    pub fn set_years<I>(&mut self, years: I)
    where
        I: IntoIterator<Item = i32>,
    {
        self.query.set_years(years);
        self.dirty = true;
    }

    pub fn toggle_year(&mut self, year: i32) {
        self.query.toggle_year(year);
        self.dirty = true;
    }

    pub fn clear_years(&mut self) {
        self.query.clear_years();
        self.dirty = true;
    }

    pub fn set_page(&mut self, page: usize) {
        self.query.set_page(page);
        self.dirty = true;
    }

    pub fn next_page(&mut self) {
        let last = self.view().page.page_count.max(1);
        let page = self.query.page().saturating_add(1).min(last);
        self.set_page(page);
    }

    pub fn prev_page(&mut self) {
        let page = self.query.page().saturating_sub(1).max(1);
        self.set_page(page);
    }

    pub fn first_page(&mut self) {
        self.set_page(1);
    }

    pub fn last_page(&mut self) {
        let last = self.view().page.page_count.max(1);
        self.set_page(last);
    }

    /// Year filter, then aggregation, then search and pagination, computed
    /// from scratch on every call.
    pub fn view(&self) -> SessionView {
        let dataset = &self.dataset;
        let rows = stats::aggregate_songs(stats::songs_in_years(
            &dataset.songs,
            self.query.years(),
        ));
        let page = query::run_query(&rows, &self.query);
        SessionView {
            file_count: dataset.file_count,
            song_streams: dataset.songs.len(),
            track_count: rows.len(),
            episode_count: dataset.episodes.len(),
            dropped: dataset.dropped,
            years: dataset.years.clone(),
            page,
        }
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.dirty = true;
    }
}

pub fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
