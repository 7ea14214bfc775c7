// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! GeoJSON to bag writing, read back through the extraction path.

mod common;

use std::io::Cursor;

use common::*;
use robomap::config::{ExtractConfig, WriteConfig};
use robomap::convert::inspect::summarize;
use robomap::convert::{extract_collection, write_collection};
use robomap::encoding::ros1::{
    encode_polygon_stamped, POLYGON_STAMPED_DEFINITION, POLYGON_STAMPED_MD5, POLYGON_STAMPED_TYPE,
};
use robomap::io::formats::bag::{OpCode, RecordKind, RecordReader};
use robomap::{bag_to_geojson, geojson_to_bag, BagWriter, ConvertError, FeatureCollection};

const EDITOR_DOCUMENT: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "lawn-1",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[18.06, 59.33], [18.07, 59.33], [18.07, 59.34], [18.06, 59.33]]]
      },
      "properties": {"name": "front lawn", "stamp": "2023-11-14T22:13:20Z"}
    },
    {
      "type": "Feature",
      "geometry": {"type": "Point", "coordinates": [18.065, 59.335]},
      "properties": {"name": "dock"}
    },
    {
      "type": "Feature",
      "geometry": {
        "type": "Polygon",
        "coordinates": [
          [[-3.25, 12.5, 0.0], [4.75, 12.5, 0.0], [4.75, 20.0, 0.0], [-3.25, 12.5, 0.0]],
          [[0.0, 14.0], [1.0, 14.0], [1.0, 15.0], [0.0, 14.0]]
        ]
      },
      "properties": null
    },
    {"type": "Feature", "geometry": null, "properties": {}}
  ]
}"#;

fn assert_rings_close(actual: &[[f64; 2]], expected: &[[f64; 2]]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a[0] - e[0]).abs() < 1e-4 && (a[1] - e[1]).abs() < 1e-4,
            "{a:?} vs {e:?}"
        );
    }
}

fn records_of(bytes: Vec<u8>) -> Vec<RecordKind> {
    let len = bytes.len() as u64;
    RecordReader::bag(Cursor::new(bytes), len)
        .unwrap()
        .map(|r| r.unwrap().kind)
        .collect()
}

fn op_of(kind: &RecordKind) -> OpCode {
    match kind {
        RecordKind::Connection(_) => OpCode::Connection,
        RecordKind::MessageData(_) => OpCode::MessageData,
        RecordKind::Other { op, .. } => *op,
    }
}

#[test]
fn test_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "map.geojson", EDITOR_DOCUMENT.as_bytes());
    let bag_path = dir.path().join("map.bag");
    let output = dir.path().join("again.geojson");

    let written = geojson_to_bag(&input, &bag_path, &WriteConfig::default()).unwrap();
    assert_eq!(written.features, 4);
    assert_eq!(written.messages, 2);
    assert_eq!(written.geometry_failures, 2);

    let read = bag_to_geojson(&bag_path, &output, &ExtractConfig::default()).unwrap();
    assert_eq!(read.messages, 2);
    assert_eq!(read.features, 2);

    let document = read_json(&output);
    let rings = rings(&document);
    assert_rings_close(
        &rings[0],
        &[[18.06, 59.33], [18.07, 59.33], [18.07, 59.34], [18.06, 59.33]],
    );
    assert_rings_close(
        &rings[1],
        &[[-3.25, 12.5], [4.75, 12.5], [4.75, 20.0], [-3.25, 12.5]],
    );

    let first = &document["features"][0]["properties"];
    assert_eq!(first["source"], "/xbot_monitoring/map");
    assert_eq!(first["field"], "polygon.points");
    assert_eq!(first["stamp"], "2023-11-14T22:13:20Z");
    // no stamp property, so the writer used the current time
    assert!(document["features"][1]["properties"]["stamp_source"].is_null());
}

#[test]
fn test_written_bag_layout() {
    let collection = FeatureCollection::from_json(EDITOR_DOCUMENT).unwrap();
    let (sink, _) =
        write_collection(&collection, Cursor::new(Vec::new()), &WriteConfig::default()).unwrap();
    let bytes = sink.into_inner();
    assert!(bytes.starts_with(b"#ROSBAG V2.0\n"));

    let ops: Vec<OpCode> = records_of(bytes).iter().map(op_of).collect();
    assert_eq!(
        ops,
        vec![
            OpCode::BagHeader,
            OpCode::Chunk,
            OpCode::IndexData,
            OpCode::Connection,
            OpCode::ChunkInfo,
        ]
    );
}

#[test]
fn test_written_connection_is_polygon_stamped() {
    let collection = FeatureCollection::from_json(EDITOR_DOCUMENT).unwrap();
    let config = WriteConfig {
        topic: "/mowing_area".to_string(),
        frame_id: "odom".to_string(),
    };
    let (sink, _) = write_collection(&collection, Cursor::new(Vec::new()), &config).unwrap();

    let connection = records_of(sink.into_inner())
        .into_iter()
        .find_map(|kind| match kind {
            RecordKind::Connection(c) => Some(c),
            _ => None,
        })
        .unwrap();
    assert_eq!(connection.topic, "/mowing_area");
    assert_eq!(connection.message_type, POLYGON_STAMPED_TYPE);
    assert_eq!(connection.md5sum, POLYGON_STAMPED_MD5);
    assert_eq!(connection.message_definition, POLYGON_STAMPED_DEFINITION);
}

#[test]
fn test_many_chunks_read_back_in_order() {
    let mut writer = BagWriter::new(Cursor::new(Vec::new()))
        .unwrap()
        .with_chunk_threshold(1);
    let conn = writer
        .add_connection(
            MAP_TOPIC,
            POLYGON_STAMPED_TYPE,
            POLYGON_STAMPED_MD5,
            POLYGON_STAMPED_DEFINITION,
        )
        .unwrap();
    for i in 0..5u32 {
        let x = i as f64;
        let ring = [[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 0.0]];
        let data = encode_polygon_stamped(i, (1_700_000_000 + i, 0), "map", &ring).unwrap();
        writer.write_message(conn, (1_700_000_000 + i, 0), &data).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();

    let len = bytes.len() as u64;
    let records = RecordReader::bag(Cursor::new(bytes), len).unwrap();
    let (collection, stats) = extract_collection(records, &ExtractConfig::default()).unwrap();
    assert_eq!(stats.chunks, 5);
    assert_eq!(stats.connections, 1);
    assert_eq!(collection.features.len(), 5);

    let stamps: Vec<&str> = collection
        .features
        .iter()
        .map(|f| f.property_str("stamp").unwrap())
        .collect();
    assert_eq!(stamps[0], "2023-11-14T22:13:20Z");
    assert_eq!(stamps[4], "2023-11-14T22:13:24Z");
    let rings = rings(&serde_json::to_value(&collection).unwrap());
    for (i, ring) in rings.iter().enumerate() {
        assert_eq!(ring[0], [i as f64, 0.0]);
    }
}

#[test]
fn test_summary_of_written_bag() {
    let collection = FeatureCollection::from_json(EDITOR_DOCUMENT).unwrap();
    let (sink, _) =
        write_collection(&collection, Cursor::new(Vec::new()), &WriteConfig::default()).unwrap();
    let bytes = sink.into_inner();
    let len = bytes.len() as u64;

    let summary = summarize(RecordReader::bag(Cursor::new(bytes), len).unwrap()).unwrap();
    assert_eq!(summary.topics.len(), 1);
    assert_eq!(summary.topics[0].topic, MAP_TOPIC);
    assert_eq!(summary.topics[0].messages, 2);
    assert_eq!(summary.stats.chunks, 1);
}

#[test]
fn test_unreadable_document_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "map.geojson", b"{\"type\": \"FeatureCollection\", ");
    let output = dir.path().join("map.bag");

    let err = geojson_to_bag(&input, &output, &WriteConfig::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Json { .. }));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = geojson_to_bag(
        &dir.path().join("absent.geojson"),
        &dir.path().join("map.bag"),
        &WriteConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::Io { .. }));
}
