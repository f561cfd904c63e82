mod common;

use gtfs2gmns::gtfs::Gtfs;
use gtfs2gmns::network::{LINK_HEADERS, NODE_HEADERS};
use gtfs2gmns::{Error, convert};
use std::fs;
use std::path::{Path, PathBuf};

fn temp_workspace(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gtfs2gmns_{tag}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("gtfs")).unwrap();
    fs::create_dir_all(dir.join("out")).unwrap();
    dir
}

fn write_two_stop_feed(dir: &Path) {
    // every file carries a UTF-8 BOM like many published feeds; the
    // tables whose first column is required (stop_id, route_id, trip_id)
    // only parse if the reader strips it
    fs::write(
        dir.join("agency.txt"),
        "\u{feff}agency_id,agency_name,agency_url,agency_timezone\n1,Metro Transit,https://transit.example,America/Phoenix\n",
    )
    .unwrap();
    fs::write(
        dir.join("stops.txt"),
        "\u{feff}stop_id,stop_name,stop_lat,stop_lon\nA,Stop A,0.0,0.0\nB,Stop B,0.001,0.0\n",
    )
    .unwrap();
    fs::write(
        dir.join("routes.txt"),
        "\u{feff}route_id,route_short_name,route_long_name,route_type\nR,10,Crosstown,3\n",
    )
    .unwrap();
    fs::write(
        dir.join("trips.txt"),
        "\u{feff}route_id,service_id,trip_id,direction_id\nR,WKD,T1,0\n",
    )
    .unwrap();
    fs::write(
        dir.join("stop_times.txt"),
        "\u{feff}trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,07:10:00,07:10:00,A,1\nT1,07:20:00,07:20:00,B,2\n",
    )
    .unwrap();
}

fn header_line(path: &Path) -> String {
    let content = fs::read_to_string(path).unwrap();
    content.lines().next().unwrap_or_default().to_string()
}

#[test]
fn convert_writes_canonical_tables_test() {
    let workspace = temp_workspace("roundtrip");
    write_two_stop_feed(&workspace.join("gtfs"));

    let source = Gtfs::new().from_directory(workspace.join("gtfs")).unwrap();
    let summary = convert(source, workspace.join("out"), common::window("0700_0800")).unwrap();

    assert_eq!(summary.node_count, 4);
    // 1 service link + 4 boarding links, no transfers
    assert_eq!(summary.link_count, 5);
    assert_eq!(header_line(&summary.node_path), NODE_HEADERS.join(","));
    assert_eq!(header_line(&summary.link_path), LINK_HEADERS.join(","));

    let node_rows = fs::read_to_string(&summary.node_path).unwrap().lines().count();
    assert_eq!(node_rows, 1 + 4);

    let _ = fs::remove_dir_all(&workspace);
}

#[test]
fn feed_without_bom_parses_identically_test() {
    let workspace = temp_workspace("nobom");
    let gtfs = workspace.join("gtfs");
    write_two_stop_feed(&gtfs);
    for name in [
        "agency.txt",
        "stops.txt",
        "routes.txt",
        "trips.txt",
        "stop_times.txt",
    ] {
        let path = gtfs.join(name);
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.trim_start_matches('\u{feff}')).unwrap();
    }

    let summary = convert(
        Gtfs::new().from_directory(&gtfs).unwrap(),
        workspace.join("out"),
        common::window("0700_0800"),
    )
    .unwrap();
    assert_eq!(summary.node_count, 4);
    assert_eq!(summary.link_count, 5);

    let _ = fs::remove_dir_all(&workspace);
}

#[test]
fn existing_outputs_get_suffixed_test() {
    let workspace = temp_workspace("suffix");
    write_two_stop_feed(&workspace.join("gtfs"));

    let first = convert(
        Gtfs::new().from_directory(workspace.join("gtfs")).unwrap(),
        workspace.join("out"),
        common::window("0700_0800"),
    )
    .unwrap();
    let second = convert(
        Gtfs::new().from_directory(workspace.join("gtfs")).unwrap(),
        workspace.join("out"),
        common::window("0700_0800"),
    )
    .unwrap();

    assert!(first.node_path.ends_with("node.csv"));
    assert!(second.node_path.ends_with("node_1.csv"));
    assert!(second.link_path.ends_with("link_1.csv"));

    // same input, same tables
    assert_eq!(
        fs::read_to_string(&first.node_path).unwrap(),
        fs::read_to_string(&second.node_path).unwrap()
    );
    assert_eq!(
        fs::read_to_string(&first.link_path).unwrap(),
        fs::read_to_string(&second.link_path).unwrap()
    );

    let _ = fs::remove_dir_all(&workspace);
}

#[test]
fn empty_window_writes_header_only_tables_test() {
    let workspace = temp_workspace("empty");
    write_two_stop_feed(&workspace.join("gtfs"));

    let summary = convert(
        Gtfs::new().from_directory(workspace.join("gtfs")).unwrap(),
        workspace.join("out"),
        common::window("0900_1000"),
    )
    .unwrap();
    assert_eq!(summary.node_count, 0);
    assert_eq!(summary.link_count, 0);

    let node_content = fs::read_to_string(&summary.node_path).unwrap();
    assert_eq!(node_content.lines().count(), 1);
    assert_eq!(header_line(&summary.node_path), NODE_HEADERS.join(","));

    let _ = fs::remove_dir_all(&workspace);
}

#[test]
fn missing_required_file_fails_test() {
    let workspace = temp_workspace("missing");
    write_two_stop_feed(&workspace.join("gtfs"));
    fs::remove_file(workspace.join("gtfs").join("stop_times.txt")).unwrap();

    let result = convert(
        Gtfs::new().from_directory(workspace.join("gtfs")).unwrap(),
        workspace.join("out"),
        common::window("0700_0800"),
    );
    match result {
        Err(Error::Gtfs(gtfs2gmns::gtfs::Error::MissingFile(name))) => {
            assert_eq!(name, "stop_times.txt")
        }
        other => panic!("expected MissingFile, got {other:?}"),
    }

    let _ = fs::remove_dir_all(&workspace);
}

#[test]
fn missing_input_folder_fails_test() {
    let result = Gtfs::new().from_directory("/definitely/not/a/real/folder");
    assert!(matches!(
        result,
        Err(gtfs2gmns::gtfs::Error::InputPath(_))
    ));
}

#[test]
fn missing_output_folder_fails_test() {
    let workspace = temp_workspace("noout");
    write_two_stop_feed(&workspace.join("gtfs"));

    let result = convert(
        Gtfs::new().from_directory(workspace.join("gtfs")).unwrap(),
        workspace.join("nowhere"),
        common::window("0700_0800"),
    );
    assert!(matches!(result, Err(Error::Write(_))));

    let _ = fs::remove_dir_all(&workspace);
}
