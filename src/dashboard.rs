use std::cmp::Reverse;

use crate::client::RecordClient;
use crate::model::logical::Record;

const TOP_HERSTELLER: usize = 3;

/// The dashboard's whole lifecycle: it enters `Loading`, completes one list
/// fetch, and is then either `Ready` or `Failed` until the next refresh.
#[derive(Debug)]
pub enum DashboardState {
    Loading,
    Ready(View),
    Failed(String),
}

/// Snapshot built from one successful fetch. Replaced wholesale on every
/// refresh, never mutated in place.
#[derive(Debug)]
pub struct View {
    pub records: Vec<Record>,
    pub stats: Stats,
}

#[derive(Debug)]
pub struct Stats {
    pub total: usize,
    pub top_hersteller: Vec<(String, usize)>,
}

pub struct Dashboard {
    state: DashboardState,
}

impl Dashboard {
    pub fn new() -> Self {
        Dashboard {
            state: DashboardState::Loading,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Re-enters `Loading`, completes the list call, and lands in `Ready`
    /// or `Failed`. Also the manual retry action.
    pub fn refresh(&mut self, client: &RecordClient) -> &DashboardState {
        self.state = DashboardState::Loading;
        self.state = match client.list() {
            Ok(records) => DashboardState::Ready(View::build(records)),
            Err(e) => DashboardState::Failed(e.to_string()),
        };
        &self.state
    }

    pub fn view(&self) -> Option<&View> {
        match &self.state {
            DashboardState::Ready(view) => Some(view),
            _ => None,
        }
    }

    /// Pure read of already-fetched data; no network call.
    pub fn record(&self, id: &str) -> Option<&Record> {
        self.view()?.records.iter().find(|r| r.record_id == id)
    }
}

impl View {
    fn build(mut records: Vec<Record>) -> Self {
        sort_newest_first(&mut records);
        let stats = Stats::compute(&records);
        View { records, stats }
    }
}

impl Stats {
    /// Total count and the top manufacturers by occurrence, descending,
    /// ties broken by first occurrence in the displayed order.
    fn compute(records: &[Record]) -> Self {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for record in records {
            let name = record.hersteller_or_unknown();
            match counts.iter_mut().find(|entry| entry.0 == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name.to_owned(), 1)),
            }
        }
        counts.sort_by_key(|&(_, count)| Reverse(count));
        counts.truncate(TOP_HERSTELLER);
        Stats {
            total: records.len(),
            top_hersteller: counts,
        }
    }
}

/// Stable descending sort by creation time; equal timestamps keep their
/// server order, unparseable ones go last.
fn sort_newest_first(records: &mut Vec<Record>) {
    records.sort_by(|a, b| b.created_sort_key().cmp(&a.created_sort_key()));
}
