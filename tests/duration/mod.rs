use mirakle::output::{pretty_time, task_line, total_line};

#[test]
fn zero_is_zero_seconds() {
    assert_eq!(pretty_time(0), "0.0 secs");
}

#[test]
fn just_under_a_minute_keeps_fraction() {
    assert_eq!(pretty_time(59_999), "59.999 secs");
}

#[test]
fn exactly_one_minute_has_no_minute_clause() {
    assert_eq!(pretty_time(60_000), "0.0 secs");
}

#[test]
fn exactly_one_hour_has_no_hour_clause() {
    assert_eq!(pretty_time(3_600_000), "0 mins 0.0 secs");
    assert_eq!(pretty_time(3_600_001), "1 hrs 0 mins 0.001 secs");
}

#[test]
fn hours_minutes_and_seconds() {
    assert_eq!(pretty_time(3_661_000), "1 hrs 1 mins 1.0 secs");
    assert_eq!(pretty_time(61_000), "1 mins 1.0 secs");
    assert_eq!(pretty_time(12_500), "12.5 secs");
    assert_eq!(pretty_time(7_200_001), "2 hrs 0 mins 0.001 secs");
}

#[test]
fn report_lines() {
    assert_eq!(task_line("app:assemble", 1_500), "Task app:assemble took : 1.5 secs");
    assert_eq!(total_line(90_000), "Total time : 1 mins 30.0 secs");
}
