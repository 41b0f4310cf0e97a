use crate::*;

fn poi(name: Option<&str>, lon: f64, lat: f64) -> Poi {
    Poi {
        name: name.map(|x| x.to_string()),
        lon,
        lat,
    }
}

#[test]
fn test_encode_single_point() {
    let bytes = encode(&[Route {
        points: vec![poi(Some("A"), 1.0, 2.0)],
    }])
    .unwrap();

    let mut expected = vec![1];
    for value in [36, 100_000, 200_000, 100_000, 200_000] {
        expected.extend_from_slice(&i32::to_le_bytes(value));
    }
    expected.push(2);
    for value in [15, 100_000, 200_000] {
        expected.extend_from_slice(&i32::to_le_bytes(value));
    }
    expected.extend_from_slice(b"A\0");
    assert_eq!(bytes, expected);
}

#[test]
fn test_skipper_covers_all_routes() {
    let bytes = encode(&[
        Route {
            points: vec![poi(Some("west"), -3.5, 10.0)],
        },
        Route {
            points: vec![poi(None, 4.25, -20.0), poi(Some("north"), 0.0, 50.0)],
        },
    ])
    .unwrap();

    assert_eq!(bytes[0], 1);
    assert_eq!(read_i32(&bytes, 1) as usize, bytes.len());
    assert_eq!(read_i32(&bytes, 5), 425_000);
    assert_eq!(read_i32(&bytes, 9), 5_000_000);
    assert_eq!(read_i32(&bytes, 13), -350_000);
    assert_eq!(read_i32(&bytes, 17), -2_000_000);
}

#[test]
fn test_no_points_is_empty() {
    assert!(encode(&[]).unwrap().is_empty());
    assert!(encode(&[Route::default()]).unwrap().is_empty());
}

#[test]
fn test_rounds_to_fixed_point() {
    let bytes = encode(&[Route {
        points: vec![poi(None, 0.000_004, -0.000_006)],
    }])
    .unwrap();
    let pois = decode(&bytes).unwrap();
    assert_eq!(pois, vec![poi(None, 0.0, -0.000_01)]);
}

#[test]
fn test_rejects_bad_points() {
    let bad = |pt| {
        encode(&[Route {
            points: vec![poi(Some("ok"), 1.0, 1.0), pt],
        }])
    };
    assert!(matches!(
        bad(poi(None, f64::NAN, 0.0)),
        Err(EncodeError::NonFinite { .. })
    ));
    assert!(matches!(
        bad(poi(Some("far"), 181.0, 0.0)),
        Err(EncodeError::OutOfRange { .. })
    ));
    assert!(matches!(
        bad(poi(None, 0.0, -90.5)),
        Err(EncodeError::OutOfRange { .. })
    ));
    assert!(matches!(
        bad(poi(Some("a\0b"), 0.0, 0.0)),
        Err(EncodeError::NameContainsNul { .. })
    ));
}

#[test]
fn test_decode_what_we_encode() {
    let points = vec![
        poi(Some("Café"), 13.404_95, 52.520_08),
        poi(None, -122.419_42, 37.774_93),
    ];
    let bytes = encode(&[Route {
        points: points.clone(),
    }])
    .unwrap();
    assert_eq!(decode(&bytes).unwrap(), points);
}

#[test]
fn test_decode_deleted_and_extended_records() {
    let mut bytes = vec![0];
    bytes.extend_from_slice(&i32::to_le_bytes(8));
    bytes.extend_from_slice(b"xyz");

    bytes.push(3);
    bytes.extend_from_slice(&i32::to_le_bytes(13 + 14));
    bytes.extend_from_slice(&i32::to_le_bytes(500_000));
    bytes.extend_from_slice(&i32::to_le_bytes(-100_000));
    bytes.extend_from_slice(b"Depot\0id7\0123\0");

    assert_eq!(decode(&bytes).unwrap(), vec![poi(Some("Depot"), 5.0, -1.0)]);
}

#[test]
fn test_decode_errors() {
    assert!(matches!(
        decode(&[2, 30, 0]),
        Err(DecodeError::Truncated { offset: 0 })
    ));
    assert!(matches!(
        decode(&[2, 30, 0, 0, 0, 1, 2]),
        Err(DecodeError::Truncated { offset: 0 })
    ));
    assert!(matches!(
        decode(&[0, 0, 0, 0, 0]),
        Err(DecodeError::BadLength { length: 0, .. })
    ));
    assert!(matches!(
        decode(&[9]),
        Err(DecodeError::UnknownRecordType { record_type: 9, .. })
    ));
}
