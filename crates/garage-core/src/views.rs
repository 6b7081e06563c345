//! # Derived Views
//!
//! Read-only projections over the job list. Nothing here is stored; every
//! call recomputes from the records it is given.
//!
//! ## Views
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  jobs ─┬─► customers()          one profile per mobile, newest job wins│
//! │        ├─► dashboard_stats()    counts/revenue in a DateRange          │
//! │        │                        + overdue over ALL jobs                │
//! │        ├─► customer_history()   visits ascending, spend, vehicles      │
//! │        ├─► visit_number()       1-based rank in the customer's visits  │
//! │        ├─► filter_jobs()        status + free-text search              │
//! │        └─► report()             date window, service, customer, text   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Date comparisons use canonical calendar dates and an explicit `today`.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, Job, JobStatus};

/// How many jobs the dashboard's "recent" panel shows.
pub const RECENT_JOBS_LIMIT: usize = 6;

// =============================================================================
// Customers
// =============================================================================

/// One customer per distinct mobile, taken from that mobile's most recent
/// job (by `dateIn`). Ties go to the job that comes first in `jobs`.
///
/// The result is ordered newest customer activity first.
///
/// ## Example
/// ```rust
/// use garage_core::views::customers;
///
/// assert!(customers(&[]).is_empty());
/// ```
pub fn customers(jobs: &[Job]) -> Vec<Customer> {
    let mut sorted: Vec<&Job> = jobs.iter().collect();
    // stable: equal dates keep input order
    sorted.sort_by(|a, b| b.date_in.cmp(&a.date_in));

    let mut seen: HashSet<&str> = HashSet::new();
    sorted
        .into_iter()
        .filter(|job| seen.insert(job.customer_mobile.as_str()))
        .map(|job| Customer {
            id: job.id.clone(),
            name: job.customer_name.clone(),
            mobile: job.customer_mobile.clone(),
            address: job.customer_address.clone(),
            created_at: job.date_in,
        })
        .collect()
}

/// Customers matching `term` by name (case-insensitive) or mobile,
/// ordered by name.
pub fn search_customers(customers: &[Customer], term: &str) -> Vec<Customer> {
    let term = term.trim().to_lowercase();
    let mut found: Vec<Customer> = customers
        .iter()
        .filter(|c| term.is_empty() || c.name.to_lowercase().contains(&term) || c.mobile.contains(&term))
        .cloned()
        .collect();
    found.sort_by_key(|c| c.name.to_lowercase());
    found
}

/// Visit count and spend shown on each customer card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VisitStats {
    pub count: usize,
    #[ts(type = "number")]
    pub spend: Money,
}

pub fn visit_stats(jobs: &[Job], mobile: &str) -> VisitStats {
    let related = jobs.iter().filter(|j| j.customer_mobile == mobile);
    let (count, spend) = related.fold((0, Money::zero()), |(n, total), j| (n + 1, total + j.charges));
    VisitStats { count, spend }
}

/// Full visit history of one customer.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerHistory {
    /// Visits, oldest first.
    pub jobs: Vec<Job>,
    pub job_count: usize,
    #[ts(type = "number")]
    pub total_spend: Money,
    #[ts(as = "Option<String>")]
    pub first_visit: Option<NaiveDate>,
    /// Distinct plate numbers seen for this customer.
    pub unique_vehicles: usize,
}

pub fn customer_history(jobs: &[Job], mobile: &str) -> CustomerHistory {
    let mut visits: Vec<Job> = jobs
        .iter()
        .filter(|j| j.customer_mobile == mobile)
        .cloned()
        .collect();
    visits.sort_by(|a, b| a.date_in.cmp(&b.date_in));

    let unique_vehicles = visits
        .iter()
        .map(|j| j.vehicle_number.as_str())
        .collect::<HashSet<_>>()
        .len();

    CustomerHistory {
        job_count: visits.len(),
        total_spend: visits.iter().map(|j| j.charges).sum(),
        first_visit: visits.first().map(|j| j.date_in),
        unique_vehicles,
        jobs: visits,
    }
}

/// 1-based position of a job among its customer's visits, oldest first.
///
/// Returns `None` for an unknown job id.
pub fn visit_number(jobs: &[Job], job_id: &str) -> Option<usize> {
    let job = jobs.iter().find(|j| j.id == job_id)?;
    customer_history(jobs, &job.customer_mobile)
        .jobs
        .iter()
        .position(|j| j.id == job_id)
        .map(|idx| idx + 1)
}

// =============================================================================
// Dashboard
// =============================================================================

/// Window over `dateIn` for the dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
#[ts(export)]
pub enum DateRange {
    Today,
    Yesterday,
    /// Jobs dated on or after `today - n days`.
    LastDays(u32),
    /// Jobs dated exactly on this day.
    Custom(#[ts(type = "string")] NaiveDate),
    AllTime,
}

impl DateRange {
    pub const LAST_7_DAYS: DateRange = DateRange::LastDays(7);
    pub const LAST_30_DAYS: DateRange = DateRange::LastDays(30);
    pub const LAST_3_MONTHS: DateRange = DateRange::LastDays(90);

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match *self {
            DateRange::Today => date == today,
            DateRange::Yesterday => today.checked_sub_days(Days::new(1)) == Some(date),
            DateRange::LastDays(n) => match today.checked_sub_days(Days::new(n as u64)) {
                Some(threshold) => date >= threshold,
                None => true,
            },
            DateRange::Custom(day) => date == day,
            DateRange::AllTime => true,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DateRange::Today => "Today".to_string(),
            DateRange::Yesterday => "Yesterday".to_string(),
            DateRange::LastDays(90) => "Last 3 Months".to_string(),
            DateRange::LastDays(n) => format!("Last {} Days", n),
            DateRange::Custom(day) => day.format("%b %-d, %Y").to_string(),
            DateRange::AllTime => "All Time".to_string(),
        }
    }
}

/// Dashboard counters.
///
/// Everything except the overdue list is restricted to the selected range.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub range: DateRange,
    pub total: usize,
    pub received: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub delivered: usize,
    /// Sum of charges in range.
    #[ts(type = "number")]
    pub revenue: Money,
    /// Open jobs past their delivery date, across all dates.
    pub overdue: Vec<Job>,
    /// Newest jobs in range, at most [`RECENT_JOBS_LIMIT`].
    pub recent: Vec<Job>,
}

impl DashboardStats {
    pub fn overdue_count(&self) -> usize {
        self.overdue.len()
    }
}

pub fn dashboard_stats(jobs: &[Job], range: DateRange, today: NaiveDate) -> DashboardStats {
    let in_range: Vec<&Job> = jobs
        .iter()
        .filter(|j| range.contains(j.date_in, today))
        .collect();

    let count = |status: JobStatus| in_range.iter().filter(|j| j.status == status).count();

    let mut recent: Vec<Job> = in_range.iter().map(|j| (*j).clone()).collect();
    recent.sort_by(|a, b| b.date_in.cmp(&a.date_in));
    recent.truncate(RECENT_JOBS_LIMIT);

    DashboardStats {
        range,
        total: in_range.len(),
        received: count(JobStatus::Received),
        in_progress: count(JobStatus::InProgress),
        completed: count(JobStatus::Completed),
        delivered: count(JobStatus::Delivered),
        revenue: in_range.iter().map(|j| j.charges).sum(),
        overdue: overdue_jobs(jobs, today),
        recent,
    }
}

/// Open jobs whose expected delivery date is strictly before `today`,
/// most overdue first.
pub fn overdue_jobs(jobs: &[Job], today: NaiveDate) -> Vec<Job> {
    let mut overdue: Vec<Job> = jobs.iter().filter(|j| j.is_overdue(today)).cloned().collect();
    overdue.sort_by(|a, b| a.expected_delivery_date.cmp(&b.expected_delivery_date));
    overdue
}

// =============================================================================
// Job List & Reports
// =============================================================================

/// Job list filter: optional status plus a search term matched against
/// name, mobile and plate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub search: String,
}

/// Jobs matching the filter, newest first.
pub fn filter_jobs(jobs: &[Job], filter: &JobFilter) -> Vec<Job> {
    let term = filter.search.trim().to_lowercase();
    let mut found: Vec<Job> = jobs
        .iter()
        .filter(|j| filter.status.map_or(true, |s| j.status == s))
        .filter(|j| {
            term.is_empty()
                || j.customer_name.to_lowercase().contains(&term)
                || j.customer_mobile.contains(&term)
                || j.vehicle_number.to_lowercase().contains(&term)
        })
        .cloned()
        .collect();
    found.sort_by(|a, b| b.date_in.cmp(&a.date_in));
    found
}

/// Services report filter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportFilter {
    #[ts(as = "String")]
    pub start: NaiveDate,
    /// Inclusive.
    #[ts(as = "String")]
    pub end: NaiveDate,
    /// Substring of the job's services text.
    #[serde(default)]
    pub service: Option<String>,
    /// Exact customer name.
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Case-insensitive match on name, plate or job id.
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Report {
    pub jobs: Vec<Job>,
    #[ts(type = "number")]
    pub total_amount: Money,
}

/// Jobs in the report window, in input order, with their charge total.
pub fn report(jobs: &[Job], filter: &ReportFilter) -> Report {
    let term = filter.search.trim().to_lowercase();
    let matched: Vec<Job> = jobs
        .iter()
        .filter(|j| j.date_in >= filter.start && j.date_in <= filter.end)
        .filter(|j| match &filter.service {
            Some(service) => j.services.as_deref().unwrap_or("").contains(service.as_str()),
            None => true,
        })
        .filter(|j| match &filter.customer_name {
            Some(name) => &j.customer_name == name,
            None => true,
        })
        .filter(|j| {
            term.is_empty()
                || j.customer_name.to_lowercase().contains(&term)
                || j.vehicle_number.to_lowercase().contains(&term)
                || j.id.to_lowercase().contains(&term)
        })
        .cloned()
        .collect();

    Report {
        total_amount: matched.iter().map(|j| j.charges).sum(),
        jobs: matched,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn job(id: &str, mobile: &str, name: &str, date_in: NaiveDate) -> Job {
        Job {
            id: id.into(),
            customer_name: name.into(),
            customer_mobile: mobile.into(),
            customer_address: None,
            vehicle_number: format!("KA01{}", id.to_uppercase()),
            brand: None,
            model: None,
            vehicle_type: None,
            color: None,
            services: None,
            date_in,
            expected_delivery_date: date_in,
            charges: Money::zero(),
            status: JobStatus::Received,
        }
    }

    #[test]
    fn test_customers_one_per_mobile_newest_wins() {
        let jobs = vec![
            job("a", "111", "Old Name", day(2024, 1, 1)),
            job("b", "222", "Bea", day(2024, 2, 1)),
            job("c", "111", "New Name", day(2024, 3, 1)),
        ];

        let found = customers(&jobs);
        assert_eq!(found.len(), 2);

        let first = found.iter().find(|c| c.mobile == "111").unwrap();
        assert_eq!(first.name, "New Name");
        assert_eq!(first.id, "c");
        assert_eq!(first.created_at, day(2024, 3, 1));
    }

    #[test]
    fn test_customers_tie_keeps_input_order() {
        let jobs = vec![
            job("a", "111", "First", day(2024, 3, 1)),
            job("b", "111", "Second", day(2024, 3, 1)),
        ];
        assert_eq!(customers(&jobs)[0].name, "First");
    }

    #[test]
    fn test_search_customers() {
        let jobs = vec![
            job("a", "9845012345", "Zara", day(2024, 1, 1)),
            job("b", "9000000000", "asha", day(2024, 1, 2)),
        ];
        let all = customers(&jobs);

        let by_name = search_customers(&all, "ASH");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "asha");

        let by_mobile = search_customers(&all, "98450");
        assert_eq!(by_mobile[0].name, "Zara");

        let sorted: Vec<String> = search_customers(&all, "").into_iter().map(|c| c.name).collect();
        assert_eq!(sorted, vec!["asha", "Zara"]);
    }

    #[test]
    fn test_overdue_ignores_range() {
        let today = day(2025, 6, 15);
        let mut late = job("late", "111", "Asha", day(2025, 1, 1));
        late.status = JobStatus::InProgress;
        late.expected_delivery_date = day(2025, 6, 14);

        let stats = dashboard_stats(std::slice::from_ref(&late), DateRange::Today, today);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.overdue_count(), 1);

        late.status = JobStatus::Delivered;
        let stats = dashboard_stats(&[late], DateRange::Today, today);
        assert_eq!(stats.overdue_count(), 0);
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        let today = day(2025, 6, 15);
        let mut due = job("due", "111", "Asha", today);
        due.expected_delivery_date = today;
        assert!(overdue_jobs(&[due], today).is_empty());
    }

    #[test]
    fn test_dashboard_counts_and_revenue() {
        let today = day(2025, 6, 15);
        let mut a = job("a", "1", "A", today);
        a.charges = Money::from_major(500.0);
        a.status = JobStatus::Completed;
        let mut b = job("b", "2", "B", day(2025, 6, 14));
        b.charges = Money::from_major(250.0);
        b.status = JobStatus::InProgress;
        let c = job("c", "3", "C", day(2025, 5, 1));
        let jobs = vec![a, b, c];

        let week = dashboard_stats(&jobs, DateRange::LAST_7_DAYS, today);
        assert_eq!(week.total, 2);
        assert_eq!(week.completed, 1);
        assert_eq!(week.in_progress, 1);
        assert_eq!(week.revenue, Money::from_major(750.0));
        assert_eq!(week.recent[0].id, "a");

        let yesterday = dashboard_stats(&jobs, DateRange::Yesterday, today);
        assert_eq!(yesterday.total, 1);

        let custom = dashboard_stats(&jobs, DateRange::Custom(day(2025, 5, 1)), today);
        assert_eq!(custom.received, 1);

        let all = dashboard_stats(&jobs, DateRange::AllTime, today);
        assert_eq!(all.total, 3);
    }

    #[test]
    fn test_last_days_includes_first_day() {
        let today = day(2025, 6, 15);
        let jobs = vec![
            job("edge", "1", "A", day(2025, 6, 8)),
            job("before", "2", "B", day(2025, 6, 7)),
        ];

        assert!(DateRange::LAST_7_DAYS.contains(day(2025, 6, 8), today));
        assert!(!DateRange::LAST_7_DAYS.contains(day(2025, 6, 7), today));

        let week = dashboard_stats(&jobs, DateRange::LAST_7_DAYS, today);
        assert_eq!(week.total, 1);
        assert_eq!(week.recent[0].id, "edge");
    }

    #[test]
    fn test_history_and_visit_numbers() {
        let mut jobs = vec![
            job("v3", "111", "Asha", day(2024, 5, 1)),
            job("v1", "111", "Asha", day(2024, 1, 1)),
            job("x", "222", "Bea", day(2024, 2, 1)),
            job("v2", "111", "Asha", day(2024, 3, 1)),
        ];
        jobs[0].charges = Money::from_major(100.0);
        jobs[1].charges = Money::from_major(50.0);
        jobs[3].vehicle_number = jobs[1].vehicle_number.clone();

        let history = customer_history(&jobs, "111");
        assert_eq!(history.job_count, 3);
        assert_eq!(history.total_spend, Money::from_major(150.0));
        assert_eq!(history.first_visit, Some(day(2024, 1, 1)));
        assert_eq!(history.unique_vehicles, 2);

        assert_eq!(visit_number(&jobs, "v1"), Some(1));
        assert_eq!(visit_number(&jobs, "v2"), Some(2));
        assert_eq!(visit_number(&jobs, "v3"), Some(3));
        assert_eq!(visit_number(&jobs, "missing"), None);

        let stats = visit_stats(&jobs, "111");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.spend, Money::from_major(150.0));
    }

    #[test]
    fn test_filter_jobs() {
        let mut a = job("a", "9845012345", "Asha", day(2024, 1, 1));
        a.status = JobStatus::Completed;
        let b = job("b", "9000000000", "Bea", day(2024, 2, 1));
        let jobs = vec![a, b];

        let done = filter_jobs(
            &jobs,
            &JobFilter {
                status: Some(JobStatus::Completed),
                search: String::new(),
            },
        );
        assert_eq!(done.len(), 1);

        let by_plate = filter_jobs(
            &jobs,
            &JobFilter {
                status: None,
                search: "ka01b".into(),
            },
        );
        assert_eq!(by_plate[0].id, "b");

        let newest_first = filter_jobs(&jobs, &JobFilter::default());
        assert_eq!(newest_first[0].id, "b");
    }

    #[test]
    fn test_report_window() {
        let mut a = job("a", "1", "Asha", day(2026, 1, 1));
        a.services = Some("Oil change, wash".into());
        a.charges = Money::from_major(800.0);
        let mut b = job("b", "2", "Bea", day(2026, 1, 6));
        b.services = Some("Brake pads".into());
        b.charges = Money::from_major(1200.0);
        let c = job("c", "3", "Cy", day(2026, 1, 7));
        let jobs = vec![a, b, c];

        let filter = ReportFilter {
            start: day(2026, 1, 1),
            end: day(2026, 1, 6),
            service: None,
            customer_name: None,
            search: String::new(),
        };
        let all = report(&jobs, &filter);
        assert_eq!(all.jobs.len(), 2);
        assert_eq!(all.total_amount, Money::from_major(2000.0));

        let oil = report(
            &jobs,
            &ReportFilter {
                service: Some("Oil".into()),
                ..filter.clone()
            },
        );
        assert_eq!(oil.jobs.len(), 1);
        assert_eq!(oil.jobs[0].id, "a");
    }

    #[test]
    fn test_range_labels() {
        assert_eq!(DateRange::LAST_3_MONTHS.label(), "Last 3 Months");
        assert_eq!(DateRange::LAST_30_DAYS.label(), "Last 30 Days");
        assert_eq!(DateRange::Custom(day(2025, 3, 5)).label(), "Mar 5, 2025");
    }
}
