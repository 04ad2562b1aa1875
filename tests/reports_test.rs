mod common;

use terminus::reports::{self, Granularity, ReportError};

use common::{
    arrival, at, day_bounds, manual_arrival, record_visit, seed_route, span_bounds, test_pool,
    tracker_at,
};

#[tokio::test]
async fn test_hourly_zero_fill_on_empty_day() {
    let pool = test_pool().await;

    let (start, end) = day_bounds(2024, 3, 1);
    let report = reports::aggregate(&pool, start, end, Granularity::Hour)
        .await
        .unwrap();

    assert_eq!(report.buckets.len(), 24);
    assert_eq!(report.buckets[0].label, "00:00");
    assert_eq!(report.buckets[23].label, "23:00");
    for bucket in &report.buckets {
        assert_eq!(bucket.arrivals, 0);
        assert_eq!(bucket.departures, 0);
        assert_eq!(bucket.avg_dwell_minutes, None);
        assert_eq!(bucket.in_terminal, 0);
    }
    assert_eq!(report.summary.total_arrivals, 0);
    assert_eq!(report.summary.avg_dwell_minutes, None);
    // With nothing recorded the earliest bucket is still the peak.
    let peak = report.summary.peak.as_ref().unwrap();
    assert_eq!(peak.label, "00:00");
    assert_eq!(peak.arrivals, 0);
}

#[tokio::test]
async fn test_invalid_window_rejected() {
    let pool = test_pool().await;

    let err = reports::aggregate(
        &pool,
        at(2024, 3, 2, 0, 0),
        at(2024, 3, 1, 0, 0),
        Granularity::Day,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ReportError::InvalidWindow { .. }));

    let err = reports::route_breakdown(&pool, at(2024, 3, 2, 0, 0), at(2024, 3, 1, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::InvalidWindow { .. }));
}

#[tokio::test]
async fn test_monthly_buckets_cover_every_day() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 2, 1, 6, 0));

    record_visit(
        &tracker,
        &clock,
        arrival("WP-0001", route_id),
        at(2024, 2, 1, 6, 0),
        Some(at(2024, 2, 1, 6, 30)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0002", route_id),
        at(2024, 2, 15, 12, 0),
        Some(at(2024, 2, 15, 12, 20)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0003", route_id),
        at(2024, 2, 29, 18, 0),
        None,
    )
    .await;

    let (start, end) = span_bounds((2024, 2, 1), (2024, 2, 29));
    let report = reports::aggregate(&pool, start, end, Granularity::Month)
        .await
        .unwrap();

    // 2024 is a leap year.
    assert_eq!(report.buckets.len(), 29);
    assert_eq!(report.buckets[0].label, "2024-02-01");
    assert_eq!(report.buckets[28].label, "2024-02-29");
    assert_eq!(report.buckets[0].arrivals, 1);
    assert_eq!(report.buckets[14].arrivals, 1);
    assert_eq!(report.buckets[28].arrivals, 1);

    // The header total is the sum of the day buckets.
    let bucket_sum: i64 = report.buckets.iter().map(|b| b.arrivals).sum();
    assert_eq!(bucket_sum, 3);
    assert_eq!(report.summary.total_arrivals, 3);
    assert_eq!(report.summary.total_departures, 2);
}

#[tokio::test]
async fn test_weekly_windows_tile_to_month_total() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2021, 2, 1, 6, 0));

    // February 2021 starts on a Monday and is exactly four weeks long.
    let days = [(1, 2), (3, 1), (10, 2), (14, 1), (17, 3), (22, 1), (28, 2)];
    for (day, visits) in days {
        for v in 0..visits {
            record_visit(
                &tracker,
                &clock,
                arrival(&format!("WP-{day:02}{v:02}"), route_id),
                at(2021, 2, day, 8 + v, 0),
                Some(at(2021, 2, day, 9 + v, 0)),
            )
            .await;
        }
    }

    let (start, end) = span_bounds((2021, 2, 1), (2021, 2, 28));
    let monthly = reports::aggregate(&pool, start, end, Granularity::Month)
        .await
        .unwrap();

    let mut weekly_sum = 0;
    for week in 0..4 {
        let first = 1 + week * 7;
        let (start, end) = span_bounds((2021, 2, first), (2021, 2, first + 6));
        let report = reports::aggregate(&pool, start, end, Granularity::Week)
            .await
            .unwrap();
        assert_eq!(report.buckets.len(), 7);
        weekly_sum += report.summary.total_arrivals;
    }

    assert_eq!(monthly.summary.total_arrivals, 12);
    assert_eq!(weekly_sum, monthly.summary.total_arrivals);
}

#[tokio::test]
async fn test_yearly_rollup_consistency() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 1, 1, 6, 0));

    let months = [(1, 2), (3, 1), (7, 3), (12, 1)];
    for (month, visits) in months {
        for v in 0..visits {
            record_visit(
                &tracker,
                &clock,
                arrival(&format!("WP-{month:02}{v:02}"), route_id),
                at(2024, month, 10, 8 + v, 0),
                Some(at(2024, month, 10, 8 + v, 30)),
            )
            .await;
        }
    }

    let (start, end) = span_bounds((2024, 1, 1), (2024, 12, 31));
    let report = reports::aggregate(&pool, start, end, Granularity::Year)
        .await
        .unwrap();

    assert_eq!(report.buckets.len(), 12);
    assert_eq!(report.buckets[0].label, "2024-01");
    assert_eq!(report.buckets[0].arrivals, 2);
    assert_eq!(report.buckets[6].arrivals, 3);

    let month_sum: i64 = report.buckets.iter().map(|b| b.arrivals).sum();
    assert_eq!(month_sum, 7);
    assert_eq!(report.summary.total_arrivals, 7);

    let quarters = reports::quarterly_rollup(&report.buckets);
    assert_eq!(quarters.len(), 4);
    assert_eq!(quarters[0].arrivals, 3);
    assert_eq!(quarters[1].arrivals, 0);
    assert_eq!(quarters[2].arrivals, 3);
    assert_eq!(quarters[3].arrivals, 1);
    let quarter_sum: i64 = quarters.iter().map(|q| q.arrivals).sum();
    assert_eq!(quarter_sum, report.summary.total_arrivals);
}

#[tokio::test]
async fn test_running_occupancy_never_negative() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 3, 1, 23, 50));

    // Arrives before midnight, departs after: day two opens with a
    // departure and no arrival.
    record_visit(
        &tracker,
        &clock,
        arrival("WP-1234", route_id),
        at(2024, 3, 1, 23, 50),
        Some(at(2024, 3, 2, 0, 10)),
    )
    .await;

    let (start, end) = day_bounds(2024, 3, 2);
    let report = reports::aggregate(&pool, start, end, Granularity::Hour)
        .await
        .unwrap();

    assert_eq!(report.buckets[0].departures, 1);
    for bucket in &report.buckets {
        assert!(bucket.in_terminal >= 0);
    }
    assert_eq!(report.buckets[0].in_terminal, 0);
}

#[tokio::test]
async fn test_avg_dwell_is_straight_mean_not_mean_of_bucket_means() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 3, 1, 8, 0));

    record_visit(
        &tracker,
        &clock,
        arrival("WP-0001", route_id),
        at(2024, 3, 1, 8, 0),
        Some(at(2024, 3, 1, 8, 10)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0002", route_id),
        at(2024, 3, 1, 8, 20),
        Some(at(2024, 3, 1, 8, 30)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0003", route_id),
        at(2024, 3, 1, 9, 0),
        Some(at(2024, 3, 1, 9, 40)),
    )
    .await;

    let (start, end) = day_bounds(2024, 3, 1);
    let report = reports::aggregate(&pool, start, end, Granularity::Hour)
        .await
        .unwrap();

    assert_eq!(report.buckets[8].avg_dwell_minutes, Some(10.0));
    assert_eq!(report.buckets[9].avg_dwell_minutes, Some(40.0));
    // (10 + 10 + 40) / 3, not (10 + 40) / 2.
    assert_eq!(report.summary.avg_dwell_minutes, Some(20.0));
}

#[tokio::test]
async fn test_peak_hour_prefers_earliest_on_tie() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 3, 1, 8, 0));

    for (hour, v) in [(8, 0), (8, 1), (10, 0), (10, 1)] {
        record_visit(
            &tracker,
            &clock,
            arrival(&format!("WP-{hour:02}{v:02}"), route_id),
            at(2024, 3, 1, hour, 5 * (v as u32 + 1)),
            Some(at(2024, 3, 1, hour, 50)),
        )
        .await;
    }

    let (start, end) = day_bounds(2024, 3, 1);
    let report = reports::aggregate(&pool, start, end, Granularity::Hour)
        .await
        .unwrap();

    let peak = report.summary.peak.as_ref().unwrap();
    assert_eq!(peak.label, "08:00");
    assert_eq!(peak.arrivals, 2);
}

#[tokio::test]
async fn test_route_breakdown_orders_busiest_first() {
    let pool = test_pool().await;
    let route_a = seed_route(&pool, "1").await;
    let route_b = seed_route(&pool, "2").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 3, 1, 8, 0));

    record_visit(
        &tracker,
        &clock,
        arrival("WP-0001", route_b),
        at(2024, 3, 1, 8, 0),
        Some(at(2024, 3, 1, 8, 30)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0002", route_b),
        at(2024, 3, 1, 9, 0),
        Some(at(2024, 3, 1, 9, 10)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0003", route_a),
        at(2024, 3, 1, 10, 0),
        None,
    )
    .await;

    let (start, end) = day_bounds(2024, 3, 1);
    let breakdown = reports::route_breakdown(&pool, start, end).await.unwrap();

    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].route_number.as_deref(), Some("2"));
    assert_eq!(breakdown[0].arrivals, 2);
    assert_eq!(breakdown[0].avg_dwell_minutes, Some(20.0));
    assert_eq!(breakdown[1].route_number.as_deref(), Some("1"));
    assert_eq!(breakdown[1].arrivals, 1);
    // Still in terminal, no dwell samples yet.
    assert_eq!(breakdown[1].avg_dwell_minutes, None);
}

#[tokio::test]
async fn test_daily_movements_listing() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 3, 1, 8, 0));

    record_visit(
        &tracker,
        &clock,
        arrival("WP-0001", route_id),
        at(2024, 3, 1, 8, 0),
        Some(at(2024, 3, 1, 8, 45)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        manual_arrival("NC-777", route_id),
        at(2024, 3, 1, 9, 15),
        None,
    )
    .await;

    let (start, end) = day_bounds(2024, 3, 1);
    let movements = reports::movements(&pool, start, end).await.unwrap();

    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].bus_number, "WP-0001");
    assert_eq!(movements[0].dwell_minutes, Some(45));
    assert!(movements[0].departure_datetime.is_some());
    assert_eq!(movements[1].bus_number, "NC-777");
    assert_eq!(movements[1].dwell_minutes, None);
    assert!(movements[1].departure_datetime.is_none());
}

#[tokio::test]
async fn test_summary_entry_method_split() {
    let pool = test_pool().await;
    let route_id = seed_route(&pool, "1").await;
    let (tracker, clock) = tracker_at(&pool, at(2024, 3, 1, 8, 0));

    // Same bus visits twice across two days; one ad-hoc entry besides.
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0001", route_id),
        at(2024, 3, 1, 8, 0),
        Some(at(2024, 3, 1, 8, 30)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        arrival("WP-0001", route_id),
        at(2024, 3, 2, 8, 0),
        Some(at(2024, 3, 2, 8, 30)),
    )
    .await;
    record_visit(
        &tracker,
        &clock,
        manual_arrival("NC-777", route_id),
        at(2024, 3, 2, 9, 0),
        None,
    )
    .await;

    let (start, end) = span_bounds((2024, 3, 1), (2024, 3, 2));
    let report = reports::aggregate(&pool, start, end, Granularity::Day)
        .await
        .unwrap();

    assert_eq!(report.buckets.len(), 2);
    assert_eq!(report.summary.total_arrivals, 3);
    assert_eq!(report.summary.registered_entries, 2);
    assert_eq!(report.summary.manual_entries, 1);
    assert_eq!(report.summary.unique_buses, 2);
    assert_eq!(report.summary.active_days, 2);
}
