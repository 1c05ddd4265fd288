use padpals_client::store::{EntrySource, EntryStore};
use padpals_client::{CycleEntry, CycleStatistics, DayState, Flow, MonthCalendar};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct EntryResult {
    pub start_date: String,
    pub end_date: String,
    pub flow: Flow,
}

impl From<&CycleEntry> for EntryResult {
    fn from(e: &CycleEntry) -> Self {
        Self {
            start_date: e.start_date.to_string(),
            end_date: e.end().to_string(),
            flow: e.flow,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct EntriesResult {
    /// "remote", "placeholder" or "local"
    pub source: String,
    pub entries: Vec<EntryResult>,
}

pub fn entries_result(store: &EntryStore) -> EntriesResult {
    EntriesResult {
        source: source_label(store.source()).to_string(),
        entries: store.entries().iter().map(EntryResult::from).collect(),
    }
}

pub fn source_label(source: EntrySource) -> &'static str {
    match source {
        EntrySource::Remote => "remote",
        EntrySource::Placeholder => "placeholder",
        EntrySource::Local => "local",
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct StatisticsResult {
    pub average_cycle_length: i64,
    pub average_flow_length: i64,
    pub predicted_next_start: Option<String>,
    pub predicted_end: Option<String>,
}

impl From<&CycleStatistics> for StatisticsResult {
    fn from(s: &CycleStatistics) -> Self {
        let window = s.predicted_window();
        Self {
            average_cycle_length: s.average_cycle_length,
            average_flow_length: s.average_flow_length,
            predicted_next_start: s.predicted_next_start.map(|d| d.to_string()),
            predicted_end: window.map(|(_, end)| end.to_string()),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DayResult {
    pub date: String,
    /// "logged", "predicted" or "none"
    pub state: String,
    pub flow: Option<Flow>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CalendarResult {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days: Vec<DayResult>,
    /// Sunday-first text grid; `*` marks logged days, `?` predicted ones.
    pub grid: String,
}

impl From<&MonthCalendar> for CalendarResult {
    fn from(cal: &MonthCalendar) -> Self {
        let days = cal
            .days
            .iter()
            .map(|d| {
                let (state, flow) = match d.state {
                    DayState::Logged { flow } => ("logged", Some(flow)),
                    DayState::Predicted => ("predicted", None),
                    DayState::None => ("none", None),
                };
                DayResult {
                    date: d.date.to_string(),
                    state: state.to_string(),
                    flow,
                }
            })
            .collect();
        Self {
            year: cal.year,
            month: cal.month,
            leading_blanks: cal.leading_blanks,
            days,
            grid: render_grid(cal),
        }
    }
}

/// Render a month as rows of seven 4-character cells.
pub fn render_grid(cal: &MonthCalendar) -> String {
    let mut out = String::from("Su  Mo  Tu  We  Th  Fr  Sa\n");
    let mut cells: Vec<String> = (0..cal.leading_blanks).map(|_| "    ".to_string()).collect();
    for (i, day) in cal.days.iter().enumerate() {
        let mark = match day.state {
            DayState::Logged { .. } => '*',
            DayState::Predicted => '?',
            DayState::None => ' ',
        };
        cells.push(format!("{:>2}{} ", i + 1, mark));
    }
    for week in cells.chunks(7) {
        out.push_str(week.concat().trim_end());
        out.push('\n');
    }
    out
}
