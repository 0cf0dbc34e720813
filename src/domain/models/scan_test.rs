// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;

fn pages(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("https://example.com/page{}", i))
        .collect()
}

fn budget() -> Duration {
    Duration::hours(2)
}

#[test]
fn test_new_scan_is_pending() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None);

    assert_eq!(scan.status, ScanStatus::Pending);
    assert_eq!(scan.pages_total, 0);
    assert!(!scan.is_single_page());
}

#[test]
fn test_begin_counts_one_visit_per_engine() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Both, None)
        .begin(pages(3), budget())
        .unwrap();

    assert_eq!(scan.status, ScanStatus::InProgress);
    assert_eq!(scan.pages_total, 6);
    assert_eq!(scan.pages_per_pass(), 3);
    assert!(scan.started_at.is_some());
    assert!(scan.timeout_at.unwrap() > scan.started_at.unwrap());
}

#[test]
fn test_begin_rejects_empty_page_list() {
    let result = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None).begin(vec![], budget());

    assert!(matches!(result, Err(DomainError::ValidationError(_))));
}

#[test]
fn test_begin_twice_is_invalid() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None)
        .begin(pages(2), budget())
        .unwrap();

    assert!(matches!(
        scan.begin(pages(2), budget()),
        Err(DomainError::InvalidStateTransition {
            from: ScanStatus::InProgress,
            ..
        })
    ));
}

#[test]
fn test_record_page_never_exceeds_total() {
    let mut scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None)
        .begin(pages(2), budget())
        .unwrap();

    for _ in 0..5 {
        scan.record_page();
        assert!(scan.pages_scanned <= scan.pages_total);
    }
    assert_eq!(scan.pages_scanned, 2);
}

#[test]
fn test_pause_then_resume_from_index() {
    let mut scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None)
        .begin(pages(10), budget())
        .unwrap();
    scan.record_page();

    let paused = scan.pause("scan exceeded time budget").unwrap();
    assert_eq!(paused.status, ScanStatus::Paused);
    assert_eq!(paused.resume_index, 1);

    let resumed = paused.resume(1, budget()).unwrap();
    assert_eq!(resumed.status, ScanStatus::InProgress);
    assert_eq!(resumed.resume_index, 1);
    assert_eq!(resumed.pages_scanned, 1);
    assert!(resumed.error_message.is_none());
}

#[test]
fn test_resume_rejects_index_past_total() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None)
        .begin(pages(3), budget())
        .unwrap()
        .pause("timeout")
        .unwrap();

    assert!(matches!(
        scan.resume(4, budget()),
        Err(DomainError::ValidationError(_))
    ));
}

#[test]
fn test_resume_requires_paused() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None)
        .begin(pages(3), budget())
        .unwrap();

    assert!(scan.resume(0, budget()).is_err());
}

#[test]
fn test_restart_clears_progress() {
    let mut scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None)
        .begin(pages(3), budget())
        .unwrap();
    scan.record_page();
    let scan = scan
        .complete(ScanSummary {
            axe_score: Some(90),
            total_violations: 2,
            ..Default::default()
        })
        .unwrap();

    let restarted = scan.restart().unwrap();

    assert_eq!(restarted.status, ScanStatus::Pending);
    assert_eq!(restarted.pages_scanned, 0);
    assert_eq!(restarted.resume_index, 0);
    assert!(restarted.page_urls.is_empty());
    assert_eq!(restarted.axe_score, None);
    assert_eq!(restarted.total_violations_sum, 0);
}

#[test]
fn test_cancel_only_from_pending_or_in_progress() {
    let pending = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None);
    let cancelled = pending.cancel().unwrap();
    assert_eq!(cancelled.status, ScanStatus::Cancelled);

    assert!(cancelled.cancel().is_err());
}

#[test]
fn test_fail_records_message() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Lighthouse, None)
        .fail("sitemap returned no pages")
        .unwrap();

    assert_eq!(scan.status, ScanStatus::Failed);
    assert_eq!(scan.error_message.as_deref(), Some("sitemap returned no pages"));
    assert!(scan.completed_at.is_some());
}

#[test]
fn test_complete_applies_summary() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Axe, None)
        .begin(pages(3), budget())
        .unwrap()
        .complete(ScanSummary {
            axe_score: Some(88),
            lighthouse_score: None,
            total_violations: 7,
            worst_page_url: Some("https://example.com/page1".to_string()),
            worst_page_violation_count: Some(5),
        })
        .unwrap();

    assert_eq!(scan.status, ScanStatus::Completed);
    assert_eq!(scan.axe_score, Some(88));
    assert_eq!(scan.total_violations_sum, 7);
    assert_eq!(scan.worst_page_violation_count, Some(5));
}

#[test]
fn test_status_parsing_accepts_running_alias() {
    assert_eq!("running".parse::<ScanStatus>(), Ok(ScanStatus::InProgress));
    assert_eq!("paused".parse::<ScanStatus>(), Ok(ScanStatus::Paused));
    assert!("unknown".parse::<ScanStatus>().is_err());
}

#[test]
fn test_admission_cost_per_engine() {
    assert_eq!(ScanType::Axe.admission_cost(), 1);
    assert_eq!(ScanType::Lighthouse.admission_cost(), 1);
    assert_eq!(ScanType::Both.admission_cost(), 2);
}

#[test]
fn test_pass_offsets_lay_passes_end_to_end() {
    let scan = ScanJob::new(Uuid::new_v4(), ScanType::Both, None)
        .begin(
            vec!["https://a/1".into(), "https://a/2".into(), "https://a/3".into()],
            Duration::hours(2),
        )
        .unwrap();

    assert_eq!(scan.pass_offset(0), 0);
    assert_eq!(scan.pass_offset(1), 3);
    assert_eq!(scan.pages_total, 6);
}
