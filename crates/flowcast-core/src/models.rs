//! Domain models for Flowcast

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ========== Stream Models ==========

/// A provider that streams are attached to (exchange, employer, bank, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
}

/// Which way money moves for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Income,
    Outcome,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Outcome => "outcome",
        }
    }
}

impl std::str::FromStr for FlowDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" | "in" => Ok(Self::Income),
            "outcome" | "out" | "expense" => Ok(Self::Outcome),
            _ => Err(format!(
                "Unknown flow direction: {} (valid: income, outcome)",
                s
            )),
        }
    }
}

impl std::fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence schedule of a fixed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedPeriod {
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    Annually,
}

impl FixedPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::BiWeekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }

    /// Factor that converts one occurrence into a monthly equivalent
    pub fn monthly_multiplier(&self) -> f64 {
        match self {
            Self::Daily => 30.0,
            Self::Weekly => 4.33,
            Self::BiWeekly => 2.17,
            Self::Monthly => 1.0,
            Self::Quarterly => 0.33,
            Self::Annually => 0.083,
        }
    }
}

impl std::str::FromStr for FixedPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" | "bi-weekly" | "bi_weekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "annually" | "yearly" => Ok(Self::Annually),
            _ => Err(format!("Unknown fixed period: {}", s)),
        }
    }
}

impl std::fmt::Display for FixedPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dated, USD-normalized observation of a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stream_id: i64,
    pub date: NaiveDate,
    pub amount: f64,
    pub currency: String,
    pub usd_amount: f64,
    pub exchange_rate: f64,
    pub rate_source: Option<String>,
}

/// An income source or expense sink with its snapshot history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: i64,
    pub provider_id: Option<i64>,
    pub name: String,
    pub category: Option<String>,
    pub direction: FlowDirection,
    pub is_fixed: bool,
    pub fixed_period: Option<FixedPeriod>,
    /// Ordered by date ascending
    pub snapshots: Vec<Snapshot>,
}

impl Stream {
    /// Most recent snapshot, if any
    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.iter().max_by_key(|s| s.date)
    }

    /// Category label used for grouping
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("Uncategorized")
    }
}

/// A new stream to be written to the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStream {
    pub provider: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub direction: FlowDirection,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub fixed_period: Option<FixedPeriod>,
}

/// A new snapshot to be written to the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub usd_amount: f64,
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
    #[serde(default)]
    pub rate_source: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_exchange_rate() -> f64 {
    1.0
}

/// Filters accepted by the stream source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamQuery {
    pub direction: Option<FlowDirection>,
    pub provider_id: Option<i64>,
}

/// Filters applied by the engine on top of the fetched streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamFilter {
    pub direction: Option<FlowDirection>,
    pub provider_id: Option<i64>,
    pub stream_id: Option<i64>,
    pub category: Option<String>,
}

impl StreamFilter {
    pub fn direction(direction: FlowDirection) -> Self {
        Self {
            direction: Some(direction),
            ..Default::default()
        }
    }

    /// The part of this filter the stream source understands
    pub fn source_query(&self) -> StreamQuery {
        StreamQuery {
            direction: self.direction,
            provider_id: self.provider_id,
        }
    }

    /// Whether a stream passes every filter
    pub fn matches(&self, stream: &Stream) -> bool {
        if let Some(d) = self.direction {
            if stream.direction != d {
                return false;
            }
        }
        if let Some(p) = self.provider_id {
            if stream.provider_id != Some(p) {
                return false;
            }
        }
        if let Some(id) = self.stream_id {
            if stream.id != id {
                return false;
            }
        }
        if let Some(ref cat) = self.category {
            if !stream.category_label().eq_ignore_ascii_case(cat) {
                return false;
            }
        }
        true
    }
}

// ========== Report Parameter Models ==========

/// Report time granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Parse, falling back to monthly for unrecognized values
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Self::Monthly)
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "quarterly" | "quarter" => Ok(Self::Quarterly),
            "yearly" | "year" | "annually" => Ok(Self::Yearly),
            _ => Err(format!(
                "Unknown granularity: {} (valid: daily, weekly, monthly, quarterly, yearly)",
                s
            )),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which periods a comparison puts side by side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonType {
    /// Month over month
    #[serde(rename = "mom")]
    MoM,
    /// Week over week
    #[serde(rename = "wow")]
    WoW,
    /// Quarter over quarter
    #[serde(rename = "qoq")]
    QoQ,
    /// Year over year
    #[serde(rename = "yoy")]
    YoY,
}

impl ComparisonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoM => "mom",
            Self::WoW => "wow",
            Self::QoQ => "qoq",
            Self::YoY => "yoy",
        }
    }

    /// Parse, falling back to month-over-month for unrecognized values
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Self::MoM)
    }
}

impl std::str::FromStr for ComparisonType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mom" | "month" | "monthly" => Ok(Self::MoM),
            "wow" | "week" | "weekly" => Ok(Self::WoW),
            "qoq" | "quarter" | "quarterly" => Ok(Self::QoQ),
            "yoy" | "year" | "yearly" => Ok(Self::YoY),
            _ => Err(format!(
                "Unknown comparison type: {} (valid: mom, wow, qoq, yoy)",
                s
            )),
        }
    }
}

impl std::fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Grouping key for distribution reports and trend breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Category,
    Provider,
    Stream,
    Currency,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Provider => "provider",
            Self::Stream => "stream",
            Self::Currency => "currency",
        }
    }

    /// Parse, falling back to category for unrecognized values
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Self::Category)
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "category" => Ok(Self::Category),
            "provider" => Ok(Self::Provider),
            "stream" => Ok(Self::Stream),
            "currency" => Ok(Self::Currency),
            _ => Err(format!(
                "Unknown group-by key: {} (valid: category, provider, stream, currency)",
                s
            )),
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Number of calendar days in the window (0 when inverted)
    pub fn days(&self) -> i64 {
        ((self.to - self.from).num_days() + 1).max(0)
    }

    /// Build an optional window from `YYYY-MM-DD` bounds.
    ///
    /// A missing `to` defaults to `today`; a lone `to` is rejected.
    pub fn from_bounds(
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> crate::Result<Option<Self>> {
        let from = from.map(parse_day).transpose()?;
        let to = to.map(parse_day).transpose()?;
        match (from, to) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(crate::Error::InvalidParameter(
                "'to' requires 'from'".into(),
            )),
            (Some(from), to) => {
                let to = to.unwrap_or(today);
                if from > to {
                    return Err(crate::Error::InvalidParameter(format!(
                        "date range is inverted: {} > {}",
                        from, to
                    )));
                }
                Ok(Some(Self::new(from, to)))
            }
        }
    }
}

/// Parse a `YYYY-MM-DD` parameter
pub fn parse_day(s: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        crate::Error::InvalidParameter(format!("invalid date '{}' (use YYYY-MM-DD)", s))
    })
}

// ========== Listing Models ==========

/// One row of the stream listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub id: i64,
    pub name: String,
    pub provider: Option<String>,
    pub category: String,
    pub direction: FlowDirection,
    pub is_fixed: bool,
    pub fixed_period: Option<FixedPeriod>,
    pub snapshot_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub latest_usd: Option<f64>,
    pub total_usd: f64,
}

impl StreamSummary {
    pub fn from_stream(stream: &Stream, providers: &[Provider]) -> Self {
        let provider = stream
            .provider_id
            .and_then(|id| providers.iter().find(|p| p.id == id))
            .map(|p| p.name.clone());
        let latest = stream.latest_snapshot();
        Self {
            id: stream.id,
            name: stream.name.clone(),
            provider,
            category: stream.category_label().to_string(),
            direction: stream.direction,
            is_fixed: stream.is_fixed,
            fixed_period: stream.fixed_period,
            snapshot_count: stream.snapshots.len(),
            first_date: stream.snapshots.iter().map(|s| s.date).min(),
            last_date: latest.map(|s| s.date),
            latest_usd: latest.map(|s| s.usd_amount),
            total_usd: stream.snapshots.iter().map(|s| s.usd_amount).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(category: Option<&str>) -> Stream {
        Stream {
            id: 1,
            provider_id: Some(7),
            name: "Salary".to_string(),
            category: category.map(|c| c.to_string()),
            direction: FlowDirection::Income,
            is_fixed: true,
            fixed_period: Some(FixedPeriod::Monthly),
            snapshots: vec![],
        }
    }

    #[test]
    fn test_parameter_enums_parse_case_insensitively() {
        assert_eq!("Weekly".parse::<Granularity>().unwrap(), Granularity::Weekly);
        assert_eq!("YOY".parse::<ComparisonType>().unwrap(), ComparisonType::YoY);
        assert_eq!("Provider".parse::<GroupBy>().unwrap(), GroupBy::Provider);
        assert_eq!(
            "bi-weekly".parse::<FixedPeriod>().unwrap(),
            FixedPeriod::BiWeekly
        );
        assert!("fortnightly".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_lenient_parsing_falls_back_to_defaults() {
        assert_eq!(Granularity::parse_lenient("hourly"), Granularity::Monthly);
        assert_eq!(ComparisonType::parse_lenient("dod"), ComparisonType::MoM);
        assert_eq!(GroupBy::parse_lenient("colour"), GroupBy::Category);
        assert_eq!(Granularity::parse_lenient("daily"), Granularity::Daily);
    }

    #[test]
    fn test_filter_matches_category_case_insensitively() {
        let filter = StreamFilter {
            category: Some("salary".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&stream(Some("Salary"))));
        assert!(!filter.matches(&stream(Some("Dividends"))));

        let uncategorized = StreamFilter {
            category: Some("Uncategorized".to_string()),
            ..Default::default()
        };
        assert!(uncategorized.matches(&stream(None)));
        assert!(uncategorized.matches(&stream(Some("  "))));
    }

    #[test]
    fn test_filter_direction_and_provider() {
        let s = stream(None);
        assert!(StreamFilter::direction(FlowDirection::Income).matches(&s));
        assert!(!StreamFilter::direction(FlowDirection::Outcome).matches(&s));

        let by_provider = StreamFilter {
            provider_id: Some(8),
            ..Default::default()
        };
        assert!(!by_provider.matches(&s));
    }

    #[test]
    fn test_date_range_days() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
        );
        assert_eq!(range.days(), 30);
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
    }

    #[test]
    fn test_date_range_from_bounds() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        assert_eq!(DateRange::from_bounds(None, None, today).unwrap(), None);

        let open = DateRange::from_bounds(Some("2024-03-01"), None, today)
            .unwrap()
            .unwrap();
        assert_eq!(open.to, today);
        assert_eq!(open.days(), 10);

        assert!(DateRange::from_bounds(None, Some("2024-03-01"), today).is_err());
        assert!(DateRange::from_bounds(Some("2024-03-05"), Some("2024-03-01"), today).is_err());
        assert!(DateRange::from_bounds(Some("03/01/2024"), None, today).is_err());
    }

    #[test]
    fn test_stream_summary_resolves_provider_and_latest() {
        let mut s = stream(Some("Employment"));
        for (day, usd) in [(5, 100.0), (25, 300.0), (15, 200.0)] {
            s.snapshots.push(Snapshot {
                stream_id: 1,
                date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                amount: usd,
                currency: "USD".to_string(),
                usd_amount: usd,
                exchange_rate: 1.0,
                rate_source: None,
            });
        }
        let providers = vec![Provider {
            id: 7,
            name: "Acme".to_string(),
        }];

        let summary = StreamSummary::from_stream(&s, &providers);
        assert_eq!(summary.provider.as_deref(), Some("Acme"));
        assert_eq!(summary.snapshot_count, 3);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(summary.latest_usd, Some(300.0));
        assert_eq!(summary.total_usd, 600.0);
    }
}
