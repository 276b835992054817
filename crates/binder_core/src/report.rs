/// One failed item as recorded for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub url: String,
    pub reason: String,
}

impl FailedItem {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

const SKIPPED_HEADER: &str = "Skipped chapters:";
const INCOMPLETE_HEADER: &str = "Incomplete chapters:";
const EMPTY_SECTION: &str = "none";
const URL_MARKER: &str = "URL: ";

/// Failure report for one job: the skipped (blocked) items followed by the
/// incomplete (error) items. The serialized text is the sole contract for
/// the retry round-trip, so its layout must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub skipped: Vec<FailedItem>,
    pub incomplete: Vec<FailedItem>,
}

impl Report {
    pub fn new(skipped: Vec<FailedItem>, incomplete: Vec<FailedItem>) -> Self {
        Self {
            skipped,
            incomplete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty() && self.incomplete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.skipped.len() + self.incomplete.len()
    }

    /// Two labeled sections in fixed order, one `URL: <url> (Reason:
    /// <reason>)` line per item. An empty section emits a `none` sentinel
    /// line rather than being omitted.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        push_section(&mut out, SKIPPED_HEADER, &self.skipped);
        push_section(&mut out, INCOMPLETE_HEADER, &self.incomplete);
        out
    }

    /// Recover the retry URL list from a serialized report. Deliberately
    /// permissive: every line is scanned for the `URL: ` marker and the
    /// token up to the next whitespace run is taken; headers, reasons and
    /// unrecognized lines are ignored. Order and duplicates are preserved.
    pub fn parse_urls(text: &str) -> Vec<String> {
        text.lines()
            .filter_map(|line| {
                let start = line.find(URL_MARKER)? + URL_MARKER.len();
                line[start..]
                    .split_whitespace()
                    .next()
                    .map(|url| url.to_string())
            })
            .collect()
    }
}

fn push_section(out: &mut String, header: &str, items: &[FailedItem]) {
    out.push_str(header);
    out.push('\n');
    if items.is_empty() {
        out.push_str(EMPTY_SECTION);
        out.push('\n');
        return;
    }
    for item in items {
        out.push_str(&format!("URL: {} (Reason: {})\n", item.url, item.reason));
    }
}
