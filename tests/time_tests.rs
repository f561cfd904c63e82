use gtfs2gmns::{Time, TimeWindow};

#[test]
fn overnight_stamp_test() {
    // feeds keep counting hours past midnight for overnight trips
    assert_eq!(Time::from_hms("25:10:00").unwrap().as_minutes(), 1510);
    assert_eq!(Time::from_hms("24:00:00").unwrap().as_minutes(), 1440);
}

#[test]
fn window_covers_overnight_stamp_test() {
    let window: TimeWindow = "2500_2530".parse().unwrap();
    assert!(window.contains(Time::from_hms("25:10:00").unwrap()));
    assert!(!window.contains(Time::from_hms("07:10:00").unwrap()));
}

#[test]
fn same_day_window_excludes_overnight_stamp_test() {
    let window: TimeWindow = "0700_0800".parse().unwrap();
    assert!(!window.contains(Time::from_hms("25:10:00").unwrap()));
}

#[test]
fn midnight_window_test() {
    let window: TimeWindow = "0000_0059".parse().unwrap();
    assert!(window.contains(Time::from_hms("00:00:00").unwrap()));
    assert!(window.contains(Time::from_hms("00:59:59").unwrap()));
    assert!(!window.contains(Time::from_hms("01:00:00").unwrap()));
}
